use super::lenient::{flag, lenient};
use super::locale::LocalizedText;
use crate::value::Operand;
use ahash::AHashMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// The declarative validation rules attached to a field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationRules {
    #[serde(deserialize_with = "lenient")]
    pub required: Option<bool>,
    #[serde(deserialize_with = "flag")]
    pub email: bool,
    #[serde(deserialize_with = "flag")]
    pub phone: bool,
    #[serde(deserialize_with = "lenient")]
    pub min: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub max: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub min_length: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub max_length: Option<f64>,
    #[serde(deserialize_with = "non_empty_string")]
    pub pattern: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub pattern_flags: Option<String>,
    #[serde(deserialize_with = "equal_to")]
    pub equal_to: Option<Operand>,
    #[serde(deserialize_with = "message_bag")]
    pub messages: MessageBag,
    #[serde(deserialize_with = "message_bag")]
    pub message: MessageBag,
}

impl ValidationRules {
    /// The bag messages are resolved from: `messages` when it carries anything, else `message`.
    pub fn message_bag(&self) -> &MessageBag {
        if self.messages.is_empty() {
            &self.message
        } else {
            &self.messages
        }
    }

    pub(crate) fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }
}

/// Localized error messages: one flat message plus optional per-rule overrides.
#[derive(Debug, Clone, Default)]
pub struct MessageBag {
    pub flat: Option<LocalizedText>,
    pub per_rule: AHashMap<String, LocalizedText>,
}

impl MessageBag {
    pub fn is_empty(&self) -> bool {
        self.flat.is_none() && self.per_rule.is_empty()
    }

    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(_) => MessageBag {
                flat: LocalizedText::from_value(value),
                per_rule: AHashMap::new(),
            },
            Value::Object(map) => {
                let flat = if map.contains_key("locale") {
                    LocalizedText::from_value(value)
                } else {
                    None
                };
                let per_rule = map
                    .iter()
                    .filter(|(key, bucket)| {
                        key.as_str() != "locale" && LocalizedText::is_localized(bucket)
                    })
                    .filter_map(|(key, bucket)| {
                        LocalizedText::from_value(bucket).map(|text| (key.clone(), text))
                    })
                    .collect();
                MessageBag { flat, per_rule }
            }
            _ => MessageBag::default(),
        }
    }

    /// Resolves the message for `rule`: its own bucket, else the flat message, else `fallback`.
    pub fn resolve(&self, rule: &str, locale: &str, fallback: &str) -> String {
        self.per_rule
            .get(rule)
            .and_then(|text| text.pick(locale))
            .or_else(|| self.flat.as_ref().and_then(|text| text.pick(locale)))
            .unwrap_or(fallback)
            .to_string()
    }
}

fn message_bag<'de, D>(deserializer: D) -> Result<MessageBag, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(MessageBag::from_value(&Value::deserialize(deserializer)?))
}

fn non_empty_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Ok(Some(s)),
        _ => Ok(None),
    }
}

fn equal_to<'de, D>(deserializer: D) -> Result<Option<Operand>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let present = match &value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    };
    Ok(present.then(|| Operand::parse(&value)))
}
