use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// The locale used when no other preference applies.
pub const DEFAULT_LOCALE: &str = "en";

/// Text that is either a plain string or a locale-keyed map.
///
/// Accepted shapes: `"text"`, `{ "locale": "text" }` and `{ "locale": { "en": .., "ar": .. } }`.
/// Locale order follows the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalizedText {
    Plain(String),
    Locales(Vec<(String, String)>),
}

impl LocalizedText {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(LocalizedText::Plain(s.clone())),
            Value::Object(map) => match map.get("locale") {
                Some(Value::String(s)) => Some(LocalizedText::Plain(s.clone())),
                Some(Value::Object(locales)) => Some(Self::collect(locales)),
                _ => None,
            },
            _ => None,
        }
    }

    /// True when the value has a `locale` key or is a plain string.
    pub(crate) fn is_localized(value: &Value) -> bool {
        match value {
            Value::String(_) => true,
            Value::Object(map) => map.contains_key("locale"),
            _ => false,
        }
    }

    fn collect(map: &serde_json::Map<String, Value>) -> Self {
        LocalizedText::Locales(
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect(),
        )
    }

    /// Picks the text for `locale`, falling back to `en` and then to the first locale.
    pub fn pick(&self, locale: &str) -> Option<&str> {
        match self {
            LocalizedText::Plain(s) => Some(s),
            LocalizedText::Locales(entries) => entries
                .iter()
                .find(|(k, _)| k == locale)
                .or_else(|| entries.iter().find(|(k, _)| k == DEFAULT_LOCALE))
                .or_else(|| entries.first())
                .map(|(_, text)| text.as_str()),
        }
    }

    pub fn pick_default(&self) -> Option<&str> {
        self.pick(DEFAULT_LOCALE)
    }
}

impl<'de> Deserialize<'de> for LocalizedText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        LocalizedText::from_value(&value)
            .ok_or_else(|| serde::de::Error::custom("expected a string or a locale map"))
    }
}
