use super::condition::Condition;
use super::lenient::{flag, lenient, lenient_seq};
use super::locale::LocalizedText;
use super::rules::ValidationRules;
use serde::Deserialize;
use serde_json::Value;

/// A node of a step's tree, discriminated by its `type` tag.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "RawNode")]
pub enum Node {
    Section(Section),
    Field(Field),
    TextLabel(TextLabel),
    Button(Button),
    /// A node type the engine does not interpret (e.g. `separator`). Never
    /// emitted as a field and never traversed for visibility.
    Unsupported(Unsupported),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Section,
    MediaSection,
    VideoSection,
}

/// A container node; the only node whose children participate in visibility.
#[derive(Debug, Clone)]
pub struct Section {
    pub kind: SectionKind,
    pub identifier: String,
    pub condition: Option<Condition>,
    pub mandatory: Option<bool>,
    pub required: Option<bool>,
    pub title: Option<LocalizedText>,
    pub childs: Vec<Node>,
}

impl Section {
    /// A section counts as mandatory through its own flag or `validation.required`.
    pub fn is_mandatory(&self) -> bool {
        self.mandatory == Some(true) || self.required == Some(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Input,
    ListCellOptions,
    Checkbox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputKind {
    #[default]
    Text,
    Email,
    Password,
    Number,
    Tel,
}

impl InputKind {
    fn parse(name: &str) -> Self {
        match name {
            "email" => InputKind::Email,
            "password" => InputKind::Password,
            "number" => InputKind::Number,
            "tel" => InputKind::Tel,
            _ => InputKind::Text,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InputConfig {
    /// `None` when the document names no subtype.
    pub kind: Option<InputKind>,
    pub placeholder: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChoiceOption {
    pub id: String,
    pub label: String,
}

/// Where a `listCellOptions` field gets its choices from.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OptionSource {
    #[serde(deserialize_with = "lenient")]
    pub source: Option<String>,
    #[serde(deserialize_with = "lenient_seq")]
    pub options: Vec<ChoiceOption>,
}

/// A value-bearing node: `input`, `listCellOptions` or `checkbox`.
#[derive(Debug, Clone)]
pub struct Field {
    pub kind: FieldKind,
    pub identifier: String,
    pub label: Option<LocalizedText>,
    pub helper: Option<LocalizedText>,
    pub condition: Option<Condition>,
    pub mandatory: Option<bool>,
    pub validation: ValidationRules,
    pub input: InputConfig,
    pub options: Option<OptionSource>,
    pub default_value: Option<Value>,
}

impl Field {
    pub fn label_text(&self, locale: &str) -> &str {
        self.label
            .as_ref()
            .and_then(|l| l.pick(locale))
            .unwrap_or(&self.identifier)
    }
}

/// Display-only text. Never holds a value and is never validated.
#[derive(Debug, Clone)]
pub struct TextLabel {
    pub identifier: String,
    pub condition: Option<Condition>,
    pub text: Option<LocalizedText>,
    pub html: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StepRole {
    #[serde(deserialize_with = "flag")]
    pub submit: bool,
    #[serde(deserialize_with = "flag")]
    pub reset: bool,
    #[serde(deserialize_with = "lenient_seq")]
    pub reset_list: Vec<String>,
}

/// A navigation trigger embedded in the tree.
#[derive(Debug, Clone)]
pub struct Button {
    pub identifier: String,
    pub condition: Option<Condition>,
    pub text: Option<LocalizedText>,
    pub role: StepRole,
}

#[derive(Debug, Clone)]
pub struct Unsupported {
    pub kind: String,
    pub identifier: String,
    pub condition: Option<Condition>,
    pub childs: Vec<Node>,
}

impl Node {
    pub fn identifier(&self) -> &str {
        match self {
            Node::Section(n) => &n.identifier,
            Node::Field(n) => &n.identifier,
            Node::TextLabel(n) => &n.identifier,
            Node::Button(n) => &n.identifier,
            Node::Unsupported(n) => &n.identifier,
        }
    }

    pub fn condition(&self) -> Option<&Condition> {
        match self {
            Node::Section(n) => n.condition.as_ref(),
            Node::Field(n) => n.condition.as_ref(),
            Node::TextLabel(n) => n.condition.as_ref(),
            Node::Button(n) => n.condition.as_ref(),
            Node::Unsupported(n) => n.condition.as_ref(),
        }
    }

    /// Children of any node that carries them, including unsupported ones.
    pub fn childs(&self) -> &[Node] {
        match self {
            Node::Section(n) => &n.childs,
            Node::Unsupported(n) => &n.childs,
            _ => &[],
        }
    }

    pub fn as_field(&self) -> Option<&Field> {
        match self {
            Node::Field(field) => Some(field),
            _ => None,
        }
    }
}

/// The permissive wire shape of a node before it is sorted into a variant.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawNode {
    #[serde(rename = "type", deserialize_with = "lenient")]
    kind: Option<String>,
    #[serde(deserialize_with = "lenient")]
    identifier: Option<String>,
    #[serde(deserialize_with = "lenient")]
    condition: Option<Condition>,
    #[serde(deserialize_with = "lenient")]
    mandatory: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    mandotory: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    label: Option<LocalizedText>,
    #[serde(deserialize_with = "lenient")]
    helper: Option<LocalizedText>,
    #[serde(deserialize_with = "lenient")]
    title: Option<LocalizedText>,
    #[serde(deserialize_with = "lenient")]
    text: Option<Value>,
    #[serde(deserialize_with = "lenient")]
    validation: Option<Value>,
    #[serde(deserialize_with = "lenient")]
    input: Option<Value>,
    #[serde(deserialize_with = "lenient")]
    values: Option<OptionSource>,
    #[serde(deserialize_with = "lenient")]
    default_value: Option<Value>,
    #[serde(deserialize_with = "lenient")]
    step_role: Option<StepRole>,
    #[serde(deserialize_with = "lenient_seq")]
    childs: Vec<Node>,
}

impl From<RawNode> for Node {
    fn from(raw: RawNode) -> Self {
        // `mandatory` wins over the legacy spelling when both are present.
        let mandatory = raw.mandatory.or(raw.mandotory);
        let identifier = raw.identifier.unwrap_or_default();
        let validation = raw
            .validation
            .map(ValidationRules::from_value)
            .unwrap_or_default();
        let kind = raw.kind.unwrap_or_default();

        let section_kind = match kind.as_str() {
            "section" => Some(SectionKind::Section),
            "mediaSection" => Some(SectionKind::MediaSection),
            "videoSection" => Some(SectionKind::VideoSection),
            _ => None,
        };
        if let Some(section_kind) = section_kind {
            return Node::Section(Section {
                kind: section_kind,
                identifier,
                condition: raw.condition,
                mandatory,
                required: validation.required,
                title: raw.title,
                childs: raw.childs,
            });
        }

        let field_kind = match kind.as_str() {
            "input" => Some(FieldKind::Input),
            "listCellOptions" => Some(FieldKind::ListCellOptions),
            "checkbox" => Some(FieldKind::Checkbox),
            _ => None,
        };
        if let Some(field_kind) = field_kind {
            let input = raw.input.map(input_config).unwrap_or_default();
            return Node::Field(Field {
                kind: field_kind,
                identifier,
                label: raw.label,
                helper: raw.helper,
                condition: raw.condition,
                mandatory,
                validation,
                input,
                options: raw.values,
                default_value: raw.default_value,
            });
        }

        match kind.as_str() {
            "textLabel" => {
                let text = raw.text.unwrap_or(Value::Null);
                Node::TextLabel(TextLabel {
                    identifier,
                    condition: raw.condition,
                    html: text.get("parse_as").and_then(Value::as_str) == Some("html"),
                    text: LocalizedText::from_value(&text),
                })
            }
            "button" => Node::Button(Button {
                identifier,
                condition: raw.condition,
                text: raw.text.as_ref().and_then(LocalizedText::from_value),
                role: raw.step_role.unwrap_or_default(),
            }),
            _ => Node::Unsupported(Unsupported {
                kind,
                identifier,
                condition: raw.condition,
                childs: raw.childs,
            }),
        }
    }
}

fn input_config(value: Value) -> InputConfig {
    InputConfig {
        kind: value.get("kind").and_then(Value::as_str).map(InputKind::parse),
        placeholder: value
            .get("placeholder")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}
