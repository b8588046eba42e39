//! The typed shape of a workflow document.
//!
//! A workflow is an ordered array of steps; each step owns a tree of nodes.
//! Loading is structurally tolerant: unknown keys are ignored, wrongly-typed
//! optional keys read as absent and unknown node types are kept as
//! [`Node::Unsupported`]. Only a non-array root or undecodable bytes fail.

mod condition;
mod lenient;
mod locale;
mod node;
mod rules;

pub use condition::{CompareAs, Comparator, Condition};
pub use locale::{DEFAULT_LOCALE, LocalizedText};
pub use node::{
    Button, ChoiceOption, Field, FieldKind, InputConfig, InputKind, Node, OptionSource, Section,
    SectionKind, StepRole, TextLabel, Unsupported,
};
pub use rules::{MessageBag, ValidationRules};

use crate::error::{SchemaError, json_type_name};
use ahash::AHashMap;
use itertools::Itertools;
use lenient::{lenient, lenient_seq, reference};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepKind {
    #[default]
    NormalStep,
    PreviewStep,
}

/// One page of the wizard.
#[derive(Debug, Clone)]
pub struct Step {
    pub identifier: String,
    pub kind: StepKind,
    pub title: Option<LocalizedText>,
    pub childs: Vec<Node>,
    pub submit: Option<LocalizedText>,
    pub next_step: Option<String>,
    pub prev_step: Option<String>,
    pub mandatory: Option<bool>,
    pub required: Option<bool>,
}

impl Step {
    pub fn title_text(&self, locale: &str) -> &str {
        self.title
            .as_ref()
            .and_then(|t| t.pick(locale))
            .unwrap_or(&self.identifier)
    }

    pub fn is_terminal(&self) -> bool {
        self.next_step.is_none()
    }
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawStep {
    #[serde(rename = "type", deserialize_with = "lenient")]
    kind: Option<String>,
    #[serde(deserialize_with = "lenient")]
    identifier: Option<String>,
    #[serde(deserialize_with = "lenient")]
    title: Option<LocalizedText>,
    #[serde(deserialize_with = "lenient_seq")]
    childs: Vec<Node>,
    #[serde(deserialize_with = "lenient")]
    submit: Option<LocalizedText>,
    #[serde(deserialize_with = "reference")]
    next_step: Option<String>,
    #[serde(deserialize_with = "reference")]
    prev_step: Option<String>,
    #[serde(deserialize_with = "lenient")]
    mandatory: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    mandotory: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    validation: Option<Value>,
}

impl RawStep {
    fn into_step(self, position: usize) -> Step {
        let required = self
            .validation
            .and_then(|v| v.get("required").and_then(Value::as_bool));
        Step {
            identifier: self
                .identifier
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| default_step_identifier(position)),
            kind: match self.kind.as_deref() {
                Some("previewStep") => StepKind::PreviewStep,
                _ => StepKind::NormalStep,
            },
            title: self.title,
            childs: self.childs,
            submit: self.submit,
            next_step: self.next_step,
            prev_step: self.prev_step,
            mandatory: self.mandatory.or(self.mandotory),
            required,
        }
    }
}

fn default_step_identifier(position: usize) -> String {
    format!("step_{}", position + 1)
}

/// Assigns `step_<n>` to every step whose identifier is missing or empty.
///
/// Runs on the raw document so stores can hand back normalized JSON. Steps that
/// already carry an identifier are left untouched, which makes this idempotent.
pub fn normalize_identifiers(document: &mut Value) -> Result<(), SchemaError> {
    let steps = match document {
        Value::Array(steps) => steps,
        other => {
            return Err(SchemaError::NotASequence {
                found: json_type_name(other),
            });
        }
    };
    for (position, step) in steps.iter_mut().enumerate() {
        if let Value::Object(map) = step {
            let missing = match map.get("identifier") {
                None | Some(Value::Null) | Some(Value::Bool(false)) => true,
                Some(Value::String(s)) => s.is_empty(),
                Some(Value::Number(n)) => n.as_f64() == Some(0.0),
                Some(_) => false,
            };
            if missing {
                map.insert(
                    "identifier".to_string(),
                    Value::String(default_step_identifier(position)),
                );
            }
        }
    }
    Ok(())
}

/// A loaded, normalized workflow. Immutable for the lifetime of a run.
#[derive(Debug, Clone)]
pub struct Workflow {
    steps: Vec<Step>,
    index: AHashMap<String, usize>,
}

impl Workflow {
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        Self::from_value(serde_json::from_str(json)?)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, SchemaError> {
        Self::from_value(serde_json::from_slice(bytes)?)
    }

    pub fn from_value(mut document: Value) -> Result<Self, SchemaError> {
        normalize_identifiers(&mut document)?;
        let items = match document {
            Value::Array(items) => items,
            other => {
                return Err(SchemaError::NotASequence {
                    found: json_type_name(&other),
                });
            }
        };
        let steps: Vec<Step> = items
            .into_iter()
            .enumerate()
            .map(|(position, item)| {
                // A step that is not an object loads empty and keeps its position.
                let raw = serde_json::from_value::<RawStep>(item).unwrap_or_else(|e| {
                    debug!(position, error = %e, "step is not an object, loading it empty");
                    RawStep::default()
                });
                raw.into_step(position)
            })
            .collect();
        Ok(Self::from_steps(steps))
    }

    pub fn from_steps(steps: Vec<Step>) -> Self {
        let mut index = AHashMap::with_capacity(steps.len());
        for (position, step) in steps.iter().enumerate() {
            // First occurrence wins for duplicated identifiers.
            index.entry(step.identifier.clone()).or_insert(position);
        }
        Self { steps, index }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, position: usize) -> Option<&Step> {
        self.steps.get(position)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn index_of(&self, identifier: &str) -> Option<usize> {
        self.index.get(identifier).copied()
    }

    /// Lists structural problems that the engine tolerates at run time.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut found = Vec::new();
        for (identifier, positions) in &self
            .steps
            .iter()
            .enumerate()
            .map(|(position, step)| (step.identifier.as_str(), position))
            .into_group_map()
        {
            if positions.len() > 1 {
                found.push(Diagnostic::DuplicateStep {
                    identifier: identifier.to_string(),
                    positions: positions.clone(),
                });
            }
        }
        for step in &self.steps {
            for (link, target) in [("nextStep", &step.next_step), ("prevStep", &step.prev_step)] {
                if let Some(target) = target {
                    if self.index_of(target).is_none() {
                        found.push(Diagnostic::DanglingReference {
                            step: step.identifier.clone(),
                            link,
                            target: target.clone(),
                        });
                    }
                }
            }
        }
        found.sort_by_key(|d| d.to_string());
        found
    }
}

/// A non-fatal structural finding about a workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    DuplicateStep {
        identifier: String,
        positions: Vec<usize>,
    },
    DanglingReference {
        step: String,
        link: &'static str,
        target: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::DuplicateStep {
                identifier,
                positions,
            } => write!(
                f,
                "step identifier '{}' is used at positions {}",
                identifier,
                positions.iter().join(", ")
            ),
            Diagnostic::DanglingReference { step, link, target } => write!(
                f,
                "step '{}' has {} '{}' which matches no step",
                step, link, target
            ),
        }
    }
}
