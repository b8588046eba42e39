//! The field validation engine.
//!
//! Rules run in a fixed order and the first failing rule wins:
//! required, format (email, phone, number with min/max), length, pattern and
//! finally `equalTo`. A value that is empty and not required skips every rule.
//! Validation never fails as an operation; a malformed `pattern` passes.

use crate::schema::{DEFAULT_LOCALE, Field, FieldKind, InputKind, ValidationRules};
use crate::value::{self, ValueSet};
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\+?[0-9]{7,15}$").unwrap());

/// The rule that rejected a value. Its name doubles as the message bucket key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    Email,
    Phone,
    Number,
    Min,
    Max,
    MinLength,
    MaxLength,
    Pattern,
    EqualTo,
}

impl Rule {
    pub fn name(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::Email => "email",
            Rule::Phone => "phone",
            Rule::Number => "number",
            Rule::Min => "min",
            Rule::Max => "max",
            Rule::MinLength => "minLength",
            Rule::MaxLength => "maxLength",
            Rule::Pattern => "pattern",
            Rule::EqualTo => "equalTo",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A failed rule together with its resolved message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub rule: Rule,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.rule)
    }
}

/// Whether a field must hold a value: its mandatory flag or `validation.required`.
pub fn is_required(field: &Field) -> bool {
    field.mandatory == Some(true) || field.validation.required == Some(true)
}

/// Emptiness as seen by the required rule. An unchecked checkbox is empty.
pub fn is_blank(field: &Field, value: Option<&Value>) -> bool {
    match field.kind {
        FieldKind::Checkbox => !matches!(value, Some(Value::Bool(true))),
        _ => value::is_empty(value),
    }
}

/// Validates with English messages.
pub fn validate(values: &ValueSet, field: &Field, value: Option<&Value>) -> Option<String> {
    Validator::default()
        .check(values, field, value)
        .map(|violation| violation.message)
}

/// Runs field rules and resolves messages for one preferred locale.
#[derive(Debug, Clone)]
pub struct Validator {
    locale: String,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(DEFAULT_LOCALE)
    }
}

impl Validator {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn validate(&self, values: &ValueSet, field: &Field, value: Option<&Value>) -> Option<String> {
        self.check(values, field, value).map(|v| v.message)
    }

    /// Returns the first rule the value violates, if any.
    pub fn check(&self, values: &ValueSet, field: &Field, value: Option<&Value>) -> Option<Violation> {
        let rules = &field.validation;
        let fail = |rule: Rule, fallback: &str| {
            Some(Violation {
                rule,
                message: rules
                    .message_bag()
                    .resolve(rule.name(), &self.locale, fallback),
            })
        };

        if is_blank(field, value) {
            return if is_required(field) {
                fail(Rule::Required, "This field is required")
            } else {
                None
            };
        }

        let text = value::stringify(value);
        let kind = field.input.kind;

        if (kind == Some(InputKind::Email) || rules.email) && !EMAIL_RE.is_match(&text) {
            return fail(Rule::Email, "Please enter a valid email");
        }

        if (kind == Some(InputKind::Tel) || rules.phone) && !PHONE_RE.is_match(&text) {
            return fail(Rule::Phone, "Please enter a valid phone number");
        }

        if kind == Some(InputKind::Number) || rules.min.is_some() || rules.max.is_some() {
            let number = value::to_number(value);
            if number.is_nan() {
                return fail(Rule::Number, "Must be a number");
            }
            if let Some(min) = rules.min.filter(|min| number < *min) {
                return fail(Rule::Min, &format!("Must be ≥ {}", value::format_number(min)));
            }
            if let Some(max) = rules.max.filter(|max| number > *max) {
                return fail(Rule::Max, &format!("Must be ≤ {}", value::format_number(max)));
            }
        }

        // Lengths count UTF-16 code units, as browser inputs do.
        let length = text.encode_utf16().count() as f64;
        if let Some(min) = rules.min_length.filter(|min| length < *min) {
            return fail(
                Rule::MinLength,
                &format!("Must be at least {} characters", value::format_number(min)),
            );
        }
        if let Some(max) = rules.max_length.filter(|max| length > *max) {
            return fail(
                Rule::MaxLength,
                &format!("Must be at most {} characters", value::format_number(max)),
            );
        }

        if let Some(re) = compile_pattern(rules) {
            match re.is_match(&text) {
                Ok(true) => {}
                Ok(false) => return fail(Rule::Pattern, "Invalid format"),
                Err(err) => debug!(error = %err, "pattern match gave up, rule skipped"),
            }
        }

        if let Some(target) = &rules.equal_to {
            let other = value::stringify(target.resolve(values));
            if text != other {
                return fail(Rule::EqualTo, "Values do not match");
            }
        }

        None
    }
}

/// Builds the user-supplied pattern. `None` means the rule is absent or
/// does not compile, and either way it passes.
///
/// Patterns are written for browser engines, so look-around and
/// back-references are supported and the `\d`, `\w` and `\b` classes only
/// match ASCII, with or without the `u` flag.
fn compile_pattern(rules: &ValidationRules) -> Option<fancy_regex::Regex> {
    let pattern = rules.pattern.as_deref()?;
    let flags = rules.pattern_flags.as_deref().unwrap_or("");

    let mut seen = String::new();
    let mut inline = String::new();
    let mut sticky = false;
    for flag in flags.chars() {
        if seen.contains(flag) {
            debug!(pattern, flags, "duplicate pattern flag, rule skipped");
            return None;
        }
        seen.push(flag);
        match flag {
            'i' | 'm' | 's' => inline.push(flag),
            'y' => sticky = true,
            'g' | 'u' | 'v' | 'd' => {}
            _ => {
                debug!(pattern, flags, "unknown pattern flag, rule skipped");
                return None;
            }
        }
    }

    let body = ascii_classes(pattern);
    let mut source = String::new();
    if !inline.is_empty() {
        source.push_str(&format!("(?{})", inline));
    }
    if sticky {
        source.push_str(&format!(r"\A(?:{})", body));
    } else {
        source.push_str(&body);
    }

    match fancy_regex::Regex::new(&source) {
        Ok(re) => Some(re),
        Err(err) => {
            debug!(pattern, error = %err, "pattern does not compile, rule skipped");
            None
        }
    }
}

const WORD_RANGES: &str = "A-Za-z0-9_";
const WORD: &str = "[A-Za-z0-9_]";

/// Rewrites the shorthand classes to their ASCII meaning.
///
/// Inside a character class a `\b` is a backspace and a bare `[` is a literal.
/// The negated `\D` and `\W` are left alone there.
fn ascii_classes(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut in_class = false;
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('d') if in_class => out.push_str("0-9"),
                Some('w') if in_class => out.push_str(WORD_RANGES),
                Some('d') => out.push_str("[0-9]"),
                Some('D') if !in_class => out.push_str("[^0-9]"),
                Some('w') => out.push_str(WORD),
                Some('W') if !in_class => out.push_str("[^A-Za-z0-9_]"),
                Some('b') if in_class => out.push_str(r"\x08"),
                Some('b') => out.push_str(&format!(
                    "(?:(?<={w})(?!{w})|(?<!{w})(?={w}))",
                    w = WORD
                )),
                Some('B') if !in_class => out.push_str(&format!(
                    "(?:(?<={w})(?={w})|(?<!{w})(?!{w}))",
                    w = WORD
                )),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            },
            '[' if in_class => out.push_str(r"\["),
            '[' => {
                in_class = true;
                out.push(c);
            }
            ']' if in_class => {
                in_class = false;
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}
