//! The value set and the `{{values.<path>}}` template-token micro-language.
//!
//! A value set maps field identifiers to the current answers of one workflow
//! run. Conditions and `equalTo` rules reference it through template tokens,
//! which are parsed into an [`Operand`] and resolved against the set.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::LazyLock;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{\{\s*values\.([A-Za-z0-9_.\-]+)\s*\}\}$").unwrap());

/// The in-progress answers of a workflow run, keyed by field identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueSet(Map<String, Value>);

impl ValueSet {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn get(&self, identifier: &str) -> Option<&Value> {
        self.0.get(identifier)
    }

    pub fn set(&mut self, identifier: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(identifier.into(), value.into());
    }

    pub fn remove(&mut self, identifier: &str) -> Option<Value> {
        self.0.remove(identifier)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Overlays `other` on top of `self`; keys present in both take `other`'s value.
    pub fn merge(&mut self, other: ValueSet) {
        for (key, value) in other.0 {
            self.0.insert(key, value);
        }
    }

    /// Walks a dotted path into the set. `None` means the path is unresolvable.
    pub fn resolve_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.0.get(first.as_ref())?;
        for segment in rest {
            current = match current {
                Value::Object(map) => map.get(segment.as_ref())?,
                Value::Array(items) => items.get(segment.as_ref().parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for ValueSet {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<ValueSet> for Value {
    fn from(values: ValueSet) -> Self {
        Value::Object(values.0)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ValueSet {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// One side of a condition or an `equalTo` reference, after token parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Value),
    Path(Vec<String>),
}

impl Operand {
    /// Parses a raw schema value. Only strings matching the token grammar become paths.
    pub fn parse(raw: &Value) -> Self {
        match raw {
            Value::String(s) => match TOKEN_RE.captures(s) {
                Some(caps) => Operand::Path(caps[1].split('.').map(str::to_string).collect()),
                None => Operand::Literal(raw.clone()),
            },
            other => Operand::Literal(other.clone()),
        }
    }

    /// Resolves against the value set. `None` stands for an undefined value.
    pub fn resolve<'a>(&'a self, values: &'a ValueSet) -> Option<&'a Value> {
        match self {
            Operand::Literal(value) => Some(value),
            Operand::Path(path) => values.resolve_path(path),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(v) => write!(f, "{}", v),
            Operand::Path(path) => write!(f, "{{{{values.{}}}}}", path.join(".")),
        }
    }
}

/// True for undefined, null and whitespace-only strings.
pub fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// Renders a value the way form inputs display it: strings verbatim, whole
/// numbers without a fraction, sequences comma-joined, undefined as `undefined`.
pub fn stringify(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) => format_number(f),
            None => n.to_string(),
        },
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => stringify(Some(other)),
            })
            .collect::<Vec<_>>()
            .join(","),
        Some(Value::Object(_)) => "[object Object]".to_string(),
    }
}

/// Formats a float without a trailing `.0` for whole numbers.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Numeric reading of a value. Non-numeric input yields `NaN`.
pub fn to_number(value: Option<&Value>) -> f64 {
    match value {
        None => f64::NAN,
        Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => parse_number(s),
        Some(Value::Array(items)) => match items.as_slice() {
            [] => 0.0,
            [single] => to_number(Some(single)),
            _ => f64::NAN,
        },
        Some(Value::Object(_)) => f64::NAN,
    }
}

/// Parses numeric text. Empty or whitespace-only text is zero.
pub fn parse_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = trimmed.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix)
                .map(|n| n as f64)
                .unwrap_or(f64::NAN);
        }
    }
    // Reject the spellings Rust accepts but form input never means as numbers.
    if trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// Strict equality between two raw values, comparing numbers by magnitude.
pub fn same_value(a: Option<&Value>, b: &Value) -> bool {
    match (a, b) {
        (None, _) => false,
        (Some(Value::Number(x)), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Some(a), b) => a == b,
    }
}

/// Truthiness as form controls read it: `false`, `0`, `NaN`, `""`, null and
/// undefined are falsy, everything else (including empty sequences) is truthy.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}
