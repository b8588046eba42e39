use crate::value::Operand;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// The fixed comparator grammar of a visibility condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparator {
    Equal,
    NotEqual,
    In,
    NotIn,
    GreaterThan,
    GreaterThanOrEqual,
    SmallerThan,
    SmallerThanOrEqual,
    /// A comparator outside the grammar, kept verbatim for diagnostics.
    Unknown(String),
}

impl Comparator {
    pub fn parse(symbol: &str) -> Self {
        match symbol {
            "=" => Comparator::Equal,
            "!=" => Comparator::NotEqual,
            "in" => Comparator::In,
            "not_in" => Comparator::NotIn,
            ">" => Comparator::GreaterThan,
            ">=" => Comparator::GreaterThanOrEqual,
            "<" => Comparator::SmallerThan,
            "<=" => Comparator::SmallerThanOrEqual,
            other => Comparator::Unknown(other.to_string()),
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Comparator::Equal => "=",
            Comparator::NotEqual => "!=",
            Comparator::In => "in",
            Comparator::NotIn => "not_in",
            Comparator::GreaterThan => ">",
            Comparator::GreaterThanOrEqual => ">=",
            Comparator::SmallerThan => "<",
            Comparator::SmallerThanOrEqual => "<=",
            Comparator::Unknown(s) => s,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// How both operands are coerced before comparing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompareAs {
    #[default]
    String,
    Number,
    Boolean,
}

impl CompareAs {
    pub fn parse(name: &str) -> Self {
        match name {
            "number" => CompareAs::Number,
            "boolean" => CompareAs::Boolean,
            _ => CompareAs::String,
        }
    }
}

/// A declarative visibility rule: `valueA <comparator> valueB`.
///
/// Operands are parsed into literals or value-set paths once, at load time.
/// A missing operand is `None` and evaluates as undefined.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawCondition")]
pub struct Condition {
    pub value_a: Option<Operand>,
    pub value_b: Option<Operand>,
    pub comparator: Option<Comparator>,
    pub compare_as: CompareAs,
}

#[derive(Deserialize)]
struct RawCondition {
    #[serde(rename = "valueA", default, deserialize_with = "super::lenient::lenient")]
    value_a: Option<Value>,
    #[serde(rename = "valueB", default, deserialize_with = "super::lenient::lenient")]
    value_b: Option<Value>,
    #[serde(default, deserialize_with = "super::lenient::lenient")]
    comparator: Option<String>,
    #[serde(rename = "compareAs", default, deserialize_with = "super::lenient::lenient")]
    compare_as: Option<String>,
}

impl From<RawCondition> for Condition {
    fn from(raw: RawCondition) -> Self {
        Condition {
            value_a: raw.value_a.as_ref().map(Operand::parse),
            value_b: raw.value_b.as_ref().map(Operand::parse),
            comparator: raw.comparator.as_deref().map(Comparator::parse),
            compare_as: raw
                .compare_as
                .as_deref()
                .map(CompareAs::parse)
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |o: &Option<Operand>| o.as_ref().map_or("undefined".to_string(), |o| o.to_string());
        write!(
            f,
            "{} {} {}",
            side(&self.value_a),
            self.comparator.as_ref().map_or("?", Comparator::symbol),
            side(&self.value_b)
        )
    }
}
