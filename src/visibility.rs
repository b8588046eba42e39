//! Visibility and gating over a step's node tree.

use crate::condition;
use crate::schema::{Field, Node, Step};
use crate::value::ValueSet;

/// Collects the visible fields of a tree in depth-first document order.
///
/// A node whose condition is false is pruned together with its subtree, so a
/// hidden section hides every descendant. Only sections are traversed; text
/// labels, buttons and unsupported nodes are never emitted.
pub fn collect_visible_fields<'a>(nodes: &'a [Node], values: &ValueSet) -> Vec<&'a Field> {
    let mut out = Vec::new();
    visit(nodes, values, &mut out);
    out
}

fn visit<'a>(nodes: &'a [Node], values: &ValueSet, out: &mut Vec<&'a Field>) {
    for node in nodes {
        if !condition::evaluate(node.condition(), values) {
            continue;
        }
        match node {
            Node::Section(section) => visit(&section.childs, values, out),
            Node::Field(field) => out.push(field),
            _ => {}
        }
    }
}

/// True when the node's mandatory flag or `validation.required` is set.
pub fn is_gating(node: &Node) -> bool {
    match node {
        Node::Field(field) => crate::validation::is_required(field),
        Node::Section(section) => section.is_mandatory(),
        _ => false,
    }
}

/// A step is mandatory through its own flags or through any section below it.
///
/// The walk ignores conditions: a hidden mandatory section still marks the step.
pub fn step_is_mandatory(step: &Step) -> bool {
    step.mandatory == Some(true) || step.required == Some(true) || has_mandatory_section(&step.childs)
}

fn has_mandatory_section(nodes: &[Node]) -> bool {
    nodes.iter().any(|node| match node {
        Node::Section(section) if section.is_mandatory() => true,
        other => has_mandatory_section(other.childs()),
    })
}
