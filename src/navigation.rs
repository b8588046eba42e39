//! The step navigation state machine.
//!
//! A [`Navigator`] owns one workflow run: the current step index, the value
//! set and the `force_show_errors` flag. Step validity is recomputed from the
//! value set on every query and never cached. Every mutation is written
//! through to the [`SessionStore`]; a failed write is logged and the run
//! carries on. Completing a run writes the submission blob and resets the
//! values and step to a fresh start.

use crate::schema::{DEFAULT_LOCALE, Field, FieldKind, Node, Step, Workflow};
use crate::session::{DEFAULT_SESSION_KEY, SessionKeys, SessionSnapshot, SessionStore};
use crate::validation::{self, Validator, Violation};
use crate::value::{self, ValueSet};
use crate::visibility;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// The outcome of a step-validity check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepValidity {
    pub valid: bool,
    /// The field to focus when the step is invalid, if there is one.
    pub first_error: Option<String>,
}

impl StepValidity {
    fn valid() -> Self {
        Self {
            valid: true,
            first_error: None,
        }
    }

    fn invalid(first_error: Option<String>) -> Self {
        Self {
            valid: false,
            first_error,
        }
    }
}

/// What an advance or retreat did.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Moved to another step.
    Moved { from: usize, to: usize },
    /// The step is invalid; errors are now forced visible.
    Blocked { first_error: Option<String> },
    /// Nothing to move to: no link, or a link that matches no step.
    Stayed,
    /// Advanced past a terminal step. Carries the submission snapshot; the
    /// navigator itself is back at the first step with the defaults.
    Completed(ValueSet),
}

pub struct NavigatorBuilder<S: SessionStore> {
    workflow: Arc<Workflow>,
    store: S,
    session_key: String,
    locale: String,
}

impl<S: SessionStore> NavigatorBuilder<S> {
    pub fn new(workflow: impl Into<Arc<Workflow>>, store: S) -> Self {
        Self {
            workflow: workflow.into(),
            store,
            session_key: DEFAULT_SESSION_KEY.to_string(),
            locale: DEFAULT_LOCALE.to_string(),
        }
    }

    pub fn with_session_key(mut self, session_key: impl Into<String>) -> Self {
        self.session_key = session_key.into();
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Starts the run: defaults, overlaid by any persisted values, at the
    /// persisted step when it still exists.
    pub fn build(self) -> Navigator<S> {
        let defaults = default_values(&self.workflow);
        let snapshot = match SessionSnapshot::load(&self.store, &self.session_key) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(session = %self.session_key, error = %e, "could not read persisted session, starting fresh");
                SessionSnapshot::default()
            }
        };

        let mut values = defaults.clone();
        if let Some(saved) = snapshot.values {
            values.merge(saved);
        }
        let index = snapshot
            .step
            .filter(|&step| step < self.workflow.len())
            .unwrap_or(0);

        let navigator = Navigator {
            workflow: self.workflow,
            keys: SessionKeys::new(&self.session_key),
            session_key: self.session_key,
            store: self.store,
            validator: Validator::new(self.locale),
            defaults,
            index,
            values,
            force_show_errors: false,
        };
        debug!(session = %navigator.session_key, step = index, "run started");
        navigator.persist();
        navigator
    }
}

/// One workflow run.
pub struct Navigator<S: SessionStore> {
    workflow: Arc<Workflow>,
    store: S,
    session_key: String,
    keys: SessionKeys,
    validator: Validator,
    defaults: ValueSet,
    index: usize,
    values: ValueSet,
    force_show_errors: bool,
}

impl<S: SessionStore> Navigator<S> {
    pub fn builder(workflow: impl Into<Arc<Workflow>>, store: S) -> NavigatorBuilder<S> {
        NavigatorBuilder::new(workflow, store)
    }

    // --- State ---

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    pub fn locale(&self) -> &str {
        self.validator.locale()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// `None` only for an empty workflow.
    pub fn current_step(&self) -> Option<&Step> {
        self.workflow.step(self.index)
    }

    pub fn values(&self) -> &ValueSet {
        &self.values
    }

    pub fn force_show_errors(&self) -> bool {
        self.force_show_errors
    }

    /// Records an answer and persists the value set.
    pub fn set_value(&mut self, identifier: impl Into<String>, value: impl Into<Value>) {
        let identifier = identifier.into();
        debug!(field = %identifier, "value changed");
        self.values.set(identifier, value);
        self.persist();
    }

    pub fn clear_value(&mut self, identifier: &str) {
        if self.values.remove(identifier).is_some() {
            self.persist();
        }
    }

    // --- Derived state ---

    pub fn visible_fields(&self) -> Vec<&Field> {
        match self.current_step() {
            Some(step) => visibility::collect_visible_fields(&step.childs, &self.values),
            None => Vec::new(),
        }
    }

    /// The value a field is validated against. Checkboxes read as booleans.
    pub fn field_value(&self, field: &Field) -> Option<Value> {
        let raw = self.values.get(&field.identifier);
        match field.kind {
            FieldKind::Checkbox => Some(Value::Bool(value::is_truthy(raw))),
            _ => raw.cloned(),
        }
    }

    /// The violation of a field regardless of `force_show_errors`.
    pub fn check_field(&self, field: &Field) -> Option<Violation> {
        let value = self.field_value(field);
        self.validator.check(&self.values, field, value.as_ref())
    }

    /// The message to display for a visible field of the current step. Errors
    /// only surface after a blocked advance.
    pub fn field_error(&self, identifier: &str) -> Option<String> {
        if !self.force_show_errors {
            return None;
        }
        self.visible_fields()
            .into_iter()
            .find(|field| field.identifier == identifier)
            .and_then(|field| self.check_field(field))
            .map(|violation| violation.message)
    }

    pub fn validity(&self) -> StepValidity {
        let Some(step) = self.current_step() else {
            return StepValidity::valid();
        };
        let fields = visibility::collect_visible_fields(&step.childs, &self.values);

        if let Some(field) = fields.iter().find(|field| self.check_field(field).is_some()) {
            return StepValidity::invalid(Some(field.identifier.clone()));
        }

        if !visibility::step_is_mandatory(step) {
            return StepValidity::valid();
        }
        // A mandatory step must have at least one answered field.
        if fields.is_empty() {
            return StepValidity::invalid(None);
        }
        let answered = fields.iter().any(|field| {
            let value = self.field_value(field);
            !validation::is_blank(field, value.as_ref())
        });
        if answered {
            StepValidity::valid()
        } else {
            StepValidity::invalid(Some(fields[0].identifier.clone()))
        }
    }

    pub fn is_step_valid(&self) -> bool {
        self.validity().valid
    }

    // --- Transitions ---

    pub fn advance(&mut self) -> Transition {
        let validity = self.validity();
        if !validity.valid {
            self.force_show_errors = true;
            debug!(step = self.index, first_error = ?validity.first_error, "advance blocked");
            return Transition::Blocked {
                first_error: validity.first_error,
            };
        }
        self.force_show_errors = false;

        let Some(step) = self.current_step() else {
            return Transition::Stayed;
        };
        match step.next_step.clone() {
            None => {
                match serde_json::to_string(&self.values) {
                    Ok(blob) => {
                        if let Err(e) = self.store.set(&self.keys.submission, &blob) {
                            warn!(session = %self.session_key, error = %e, "could not persist submission");
                        }
                    }
                    Err(e) => warn!(error = %e, "could not serialize submission"),
                }
                debug!(step = self.index, "run completed");
                // The finished run is discarded; only the submission blob survives.
                let submission = std::mem::replace(&mut self.values, self.defaults.clone());
                self.index = 0;
                self.persist();
                Transition::Completed(submission)
            }
            Some(target) => self.move_to(&target, "nextStep"),
        }
    }

    pub fn retreat(&mut self) -> Transition {
        self.force_show_errors = false;
        match self.current_step().and_then(|step| step.prev_step.clone()) {
            Some(target) => self.move_to(&target, "prevStep"),
            None => Transition::Stayed,
        }
    }

    /// Discards the persisted session and starts over from the defaults.
    pub fn restart(&mut self) {
        if let Err(e) = SessionSnapshot::clear(&self.store, &self.session_key) {
            warn!(session = %self.session_key, error = %e, "could not clear session");
        }
        self.values = self.defaults.clone();
        self.index = 0;
        self.force_show_errors = false;
        debug!(session = %self.session_key, "run restarted");
        self.persist();
    }

    fn move_to(&mut self, target: &str, link: &str) -> Transition {
        match self.workflow.index_of(target) {
            Some(to) => {
                let from = self.index;
                self.index = to;
                debug!(from, to, link, "moved");
                self.persist();
                Transition::Moved { from, to }
            }
            None => {
                debug!(step = self.index, link, target, "step link matches no step, staying");
                Transition::Stayed
            }
        }
    }

    // --- Presentation ---

    /// `round((index + 1) / max(1, total) * 100)`.
    pub fn progress(&self) -> u32 {
        let total = self.workflow.len().max(1) as f64;
        (((self.index + 1) as f64 / total) * 100.0).round() as u32
    }

    pub fn step_labels(&self) -> Vec<&str> {
        self.workflow
            .steps()
            .iter()
            .map(|step| step.title_text(self.locale()))
            .collect()
    }

    /// Label of the advance control: the step's submit text or `Continue`, and
    /// `Finish` on a terminal step.
    pub fn advance_label(&self) -> &str {
        match self.current_step() {
            Some(step) if step.next_step.is_some() => step
                .submit
                .as_ref()
                .and_then(|submit| submit.pick(self.locale()))
                .unwrap_or("Continue"),
            _ => "Finish",
        }
    }

    pub fn can_retreat(&self) -> bool {
        self.current_step()
            .is_some_and(|step| step.prev_step.is_some())
    }

    fn persist(&self) {
        match serde_json::to_string(&self.values) {
            Ok(blob) => {
                if let Err(e) = self.store.set(&self.keys.values, &blob) {
                    warn!(session = %self.session_key, error = %e, "could not persist values");
                }
            }
            Err(e) => warn!(error = %e, "could not serialize values"),
        }
        if let Err(e) = self.store.set(&self.keys.step, &self.index.to_string()) {
            warn!(session = %self.session_key, error = %e, "could not persist step");
        }
    }
}

/// Collects `defaultValue`s of fields. Nodes with a condition are skipped
/// along with everything below them.
pub fn default_values(workflow: &Workflow) -> ValueSet {
    let mut out = ValueSet::new();
    for step in workflow.steps() {
        collect_defaults(&step.childs, &mut out);
    }
    out
}

fn collect_defaults(nodes: &[Node], out: &mut ValueSet) {
    for node in nodes {
        if node.condition().is_some() {
            continue;
        }
        match node {
            Node::Field(field) => {
                if let Some(default) = &field.default_value {
                    if !field.identifier.is_empty() {
                        out.set(field.identifier.clone(), default.clone());
                    }
                }
            }
            other => collect_defaults(other.childs(), out),
        }
    }
}
