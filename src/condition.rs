//! Evaluation of visibility conditions against a value set.
//!
//! Evaluation is a pure function of the condition and the value set. It never
//! fails: anomalies such as an unknown comparator resolve to `true` so a
//! malformed document can only ever show too much, never crash a run.

use crate::schema::{CompareAs, Comparator, Condition};
use crate::value::{self, Operand, ValueSet};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use tracing::debug;

/// An operand after coercion by the condition's `compareAs`.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    Text(String),
    Number(f64),
    Flag(bool),
}

impl Coerced {
    pub fn coerce(raw: Option<&Value>, mode: CompareAs) -> Self {
        match mode {
            CompareAs::Boolean => Coerced::Flag(match raw {
                Some(Value::Bool(b)) => *b,
                Some(Value::String(s)) => s == "true",
                _ => false,
            }),
            CompareAs::Number => Coerced::Number(value::to_number(raw)),
            CompareAs::String => Coerced::Text(value::stringify(raw)),
        }
    }

    /// Orders two coerced operands of the same kind. `None` when either side is NaN.
    fn compare(&self, other: &Coerced) -> Option<Ordering> {
        match (self, other) {
            (Coerced::Text(a), Coerced::Text(b)) => Some(a.cmp(b)),
            (Coerced::Number(a), Coerced::Number(b)) => a.partial_cmp(b),
            (Coerced::Flag(a), Coerced::Flag(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Coerced {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coerced::Text(s) => f.write_str(s),
            Coerced::Number(n) => f.write_str(&value::format_number(*n)),
            Coerced::Flag(b) => write!(f, "{}", b),
        }
    }
}

// Expands to a check of the ordering against the accepted outcomes.
macro_rules! ordered {
    ($ord:expr, $($accept:pat_param)|+) => {
        matches!($ord, Some($($accept)|+))
    };
}

/// Evaluates a condition. An absent condition is always true.
pub fn evaluate(condition: Option<&Condition>, values: &ValueSet) -> bool {
    let Some(condition) = condition else {
        return true;
    };

    let a_raw = resolve_operand(condition.value_a.as_ref(), values);
    let b_raw = resolve_operand(condition.value_b.as_ref(), values);

    let comparator = match &condition.comparator {
        Some(comparator) => comparator,
        None => {
            debug!(%condition, "condition has no comparator, treating as visible");
            return true;
        }
    };

    let a = Coerced::coerce(a_raw, condition.compare_as);
    let b = Coerced::coerce(b_raw, condition.compare_as);
    let ord = a.compare(&b);

    match comparator {
        Comparator::Equal => ordered!(ord, Ordering::Equal),
        Comparator::NotEqual => !ordered!(ord, Ordering::Equal),
        Comparator::In => is_member(a_raw, b_raw, &a, &b),
        Comparator::NotIn => !is_member(a_raw, b_raw, &a, &b),
        Comparator::GreaterThan => ordered!(ord, Ordering::Greater),
        Comparator::GreaterThanOrEqual => ordered!(ord, Ordering::Greater | Ordering::Equal),
        Comparator::SmallerThan => ordered!(ord, Ordering::Less),
        Comparator::SmallerThanOrEqual => ordered!(ord, Ordering::Less | Ordering::Equal),
        Comparator::Unknown(symbol) => {
            debug!(comparator = %symbol, %condition, "unknown comparator, treating as visible");
            true
        }
    }
}

fn resolve_operand<'a>(operand: Option<&'a Operand>, values: &'a ValueSet) -> Option<&'a Value> {
    let operand = operand?;
    if let Operand::Literal(Value::String(text)) = operand {
        if text.trim_start().starts_with("{{") {
            debug!(token = %text, "template token did not parse, using it as a literal");
        }
    }
    operand.resolve(values)
}

/// Membership for `in` / `not_in`.
///
/// An actual sequence on the right is searched for the raw left value.
/// Anything else is read as a comma-joined list of coerced strings.
fn is_member(a_raw: Option<&Value>, b_raw: Option<&Value>, a: &Coerced, b: &Coerced) -> bool {
    match b_raw {
        Some(Value::Array(items)) => items.iter().any(|item| value::same_value(a_raw, item)),
        _ => {
            let needle = a.to_string();
            b.to_string().split(',').any(|candidate| candidate == needle)
        }
    }
}
