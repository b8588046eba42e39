//! Common test utilities for building workflow fixtures and value sets.
use formflow::prelude::*;
use formflow::schema::Section;
use serde_json::{Value, json};

/// Parses a single node from JSON.
#[allow(dead_code)]
pub fn node(raw: Value) -> Node {
    serde_json::from_value(raw).expect("node fixture should deserialize")
}

/// Parses a field node from JSON, panicking if it is not a field.
#[allow(dead_code)]
pub fn field(raw: Value) -> Field {
    match node(raw) {
        Node::Field(field) => field,
        other => panic!("expected a field, got {:?}", other),
    }
}

/// Parses a section node from JSON.
#[allow(dead_code)]
pub fn section(raw: Value) -> Section {
    match node(raw) {
        Node::Section(section) => section,
        other => panic!("expected a section, got {:?}", other),
    }
}

#[allow(dead_code)]
pub fn condition(raw: Value) -> Condition {
    serde_json::from_value(raw).expect("condition fixture should deserialize")
}

/// Builds a value set from a JSON object literal.
#[allow(dead_code)]
pub fn values(raw: Value) -> ValueSet {
    serde_json::from_value(raw).expect("values fixture should be an object")
}

#[allow(dead_code)]
pub fn workflow(raw: Value) -> Workflow {
    Workflow::from_value(raw).expect("workflow fixture should load")
}

#[allow(dead_code)]
pub fn register_workflow() -> Workflow {
    Workflow::from_json(formflow::store::REGISTER_WORKFLOW).expect("bundled register workflow")
}

#[allow(dead_code)]
pub fn login_workflow() -> Workflow {
    Workflow::from_json(formflow::store::LOGIN_WORKFLOW).expect("bundled login workflow")
}

/// Starts a run over a fresh in-memory session.
#[allow(dead_code)]
pub fn navigator(workflow: Workflow) -> Navigator<MemorySessionStore> {
    Navigator::builder(workflow, MemorySessionStore::new()).build()
}

/// A one-step workflow around the given step children.
///
/// The step is terminal unless `next_step` is given.
#[allow(dead_code)]
pub fn single_step(childs: Value, next_step: Option<&str>) -> Workflow {
    workflow(json!([{
        "type": "normalStep",
        "identifier": "only",
        "childs": childs,
        "nextStep": next_step,
    }]))
}

/// Two plain steps linked both ways, with one optional text input each.
#[allow(dead_code)]
pub fn two_step_workflow() -> Workflow {
    workflow(json!([
        {
            "type": "normalStep",
            "identifier": "first",
            "title": { "locale": { "en": "First", "ar": "الأول" } },
            "childs": [{
                "type": "section",
                "identifier": "first_section",
                "childs": [{ "type": "input", "identifier": "note", "input": { "kind": "text" } }]
            }],
            "submit": { "locale": { "en": "Next", "ar": "التالي" } },
            "nextStep": "second"
        },
        {
            "type": "normalStep",
            "identifier": "second",
            "childs": [{
                "type": "section",
                "identifier": "second_section",
                "childs": [{ "type": "input", "identifier": "comment" }]
            }],
            "prevStep": "first",
            "nextStep": null
        }
    ]))
}

/// A mandatory text input that accepts anything non-empty.
#[allow(dead_code)]
pub fn required_text(identifier: &str) -> Value {
    json!({
        "type": "input",
        "identifier": identifier,
        "mandatory": true,
        "input": { "kind": "text" }
    })
}
