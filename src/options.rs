//! Choice lists for `listCellOptions` fields.

use crate::schema::{ChoiceOption, OptionSource};

const BOOLEAN_YES_NO: &[(&str, &str)] = &[("yes", "Yes"), ("no", "No")];
const LICENSE_TYPES: &[(&str, &str)] = &[("a", "A"), ("b", "B"), ("c", "C")];
const LOGIN_METHODS: &[(&str, &str)] = &[
    ("email", "Email"),
    ("phone", "Phone"),
    ("username", "Username"),
];

/// Looks up a built-in catalog by name.
pub fn catalog(source: &str) -> Option<Vec<ChoiceOption>> {
    let entries = match source {
        "boolean_yes_no" => BOOLEAN_YES_NO,
        "license_types" => LICENSE_TYPES,
        "login_methods" => LOGIN_METHODS,
        _ => return None,
    };
    Some(
        entries
            .iter()
            .map(|(id, label)| ChoiceOption {
                id: id.to_string(),
                label: label.to_string(),
            })
            .collect(),
    )
}

/// Inline options win when there are any; otherwise the named catalog; otherwise nothing.
pub fn resolve_options(source: Option<&OptionSource>) -> Vec<ChoiceOption> {
    let Some(source) = source else {
        return Vec::new();
    };
    if !source.options.is_empty() {
        return source.options.clone();
    }
    source
        .source
        .as_deref()
        .and_then(catalog)
        .unwrap_or_default()
}
