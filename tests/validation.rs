//! Validation engine tests: rule order, fallbacks and message resolution.
mod common;
use common::*;
use formflow::prelude::{Field, Node, Workflow};
use formflow::validation::{Rule, Validator, is_required, validate};
use serde_json::{Value, json};

fn check(field_json: Value, value: Value) -> Option<String> {
    let f = field(field_json);
    let value = if value.is_null() { None } else { Some(value) };
    validate(&values(json!({})), &f, value.as_ref())
}

#[cfg(test)]
mod required_tests {
    use super::*;

    #[test]
    fn test_required_rejects_every_empty_shape() {
        let f = field(required_text("name"));
        let v = values(json!({}));
        for empty in [None, Some(json!(null)), Some(json!("")), Some(json!("   "))] {
            assert_eq!(
                validate(&v, &f, empty.as_ref()),
                Some("This field is required".to_string()),
                "{:?} should be rejected",
                empty
            );
        }
        assert_eq!(validate(&v, &f, Some(&json!("Ada"))), None);
    }

    #[test]
    fn test_validation_required_flag_alone_is_enough() {
        let f = field(json!({
            "type": "input",
            "identifier": "name",
            "validation": { "required": true }
        }));
        assert!(is_required(&f));
        assert!(validate(&values(json!({})), &f, None).is_some());
    }

    #[test]
    fn test_legacy_spelling_is_accepted() {
        let f = field(json!({ "type": "input", "identifier": "name", "mandotory": true }));
        assert!(is_required(&f));
    }

    #[test]
    fn test_mandatory_wins_over_legacy_spelling() {
        let f = field(json!({
            "type": "input",
            "identifier": "name",
            "mandatory": false,
            "mandotory": true
        }));
        assert!(!is_required(&f));
        assert_eq!(validate(&values(json!({})), &f, None), None);
    }

    #[test]
    fn test_empty_optional_value_skips_all_rules() {
        let result = check(
            json!({
                "type": "input",
                "identifier": "email",
                "input": { "kind": "email" },
                "validation": { "minLength": 5, "pattern": "^x$" }
            }),
            json!(""),
        );
        assert_eq!(result, None);
    }

    #[test]
    fn test_unchecked_checkbox_counts_as_empty() {
        let f = field(json!({ "type": "checkbox", "identifier": "terms", "mandatory": true }));
        let v = values(json!({}));
        assert!(validate(&v, &f, Some(&json!(false))).is_some());
        assert!(validate(&v, &f, None).is_some());
        assert_eq!(validate(&v, &f, Some(&json!(true))), None);
    }
}

#[cfg(test)]
mod format_tests {
    use super::*;

    #[test]
    fn test_email_by_input_kind_and_by_flag() {
        let by_kind = json!({ "type": "input", "identifier": "e", "input": { "kind": "email" } });
        let by_flag = json!({ "type": "input", "identifier": "e", "validation": { "email": true } });
        for f in [by_kind, by_flag] {
            assert_eq!(
                check(f.clone(), json!("not-an-email")),
                Some("Please enter a valid email".to_string())
            );
            assert_eq!(check(f, json!("you@example.com")), None);
        }
    }

    #[test]
    fn test_phone_format() {
        let f = json!({ "type": "input", "identifier": "p", "input": { "kind": "tel" } });
        assert_eq!(check(f.clone(), json!("+962791234567")), None);
        assert_eq!(check(f.clone(), json!("0791234567")), None);
        assert_eq!(
            check(f.clone(), json!("12ab")),
            Some("Please enter a valid phone number".to_string())
        );
        assert!(check(f, json!("123456")).is_some());
    }

    #[test]
    fn test_number_bounds() {
        let f = json!({
            "type": "input",
            "identifier": "age",
            "input": { "kind": "number" },
            "validation": { "min": 18, "max": 99 }
        });
        assert_eq!(check(f.clone(), json!("abc")), Some("Must be a number".to_string()));
        assert_eq!(check(f.clone(), json!("12")), Some("Must be ≥ 18".to_string()));
        assert_eq!(check(f.clone(), json!(120)), Some("Must be ≤ 99".to_string()));
        assert_eq!(check(f.clone(), json!(20)), None);
        assert_eq!(check(f, json!("18")), None);
    }

    #[test]
    fn test_min_alone_enables_number_check() {
        let f = json!({ "type": "input", "identifier": "qty", "validation": { "min": 1.5 } });
        assert_eq!(check(f.clone(), json!("1")), Some("Must be ≥ 1.5".to_string()));
        assert_eq!(check(f, json!("many")), Some("Must be a number".to_string()));
    }

    #[test]
    fn test_length_bounds() {
        let f = json!({
            "type": "input",
            "identifier": "name",
            "validation": { "minLength": 3, "maxLength": 5 }
        });
        assert_eq!(
            check(f.clone(), json!("ab")),
            Some("Must be at least 3 characters".to_string())
        );
        assert_eq!(
            check(f.clone(), json!("abcdef")),
            Some("Must be at most 5 characters".to_string())
        );
        assert_eq!(check(f, json!("abcd")), None);
    }

    #[test]
    fn test_length_counts_utf16_units() {
        let f = json!({ "type": "input", "identifier": "emoji", "validation": { "maxLength": 3 } });
        // Each emoji is two UTF-16 code units.
        assert!(check(f.clone(), json!("😀😀")).is_some());
        assert_eq!(check(f, json!("😀a")), None);
    }
}

#[cfg(test)]
mod pattern_tests {
    use super::*;

    #[test]
    fn test_pattern_mismatch() {
        let f = json!({ "type": "input", "identifier": "code", "validation": { "pattern": "^[A-Z]{3}$" } });
        assert_eq!(check(f.clone(), json!("abc")), Some("Invalid format".to_string()));
        assert_eq!(check(f, json!("ABC")), None);
    }

    #[test]
    fn test_pattern_flags() {
        let f = json!({
            "type": "input",
            "identifier": "code",
            "validation": { "pattern": "^abc$", "patternFlags": "i" }
        });
        assert_eq!(check(f, json!("ABC")), None);
    }

    #[test]
    fn test_invalid_pattern_always_passes() {
        let f = json!({ "type": "input", "identifier": "code", "validation": { "pattern": "([" } });
        for value in ["anything", "", "([", "123"] {
            assert_eq!(check(f.clone(), json!(value)), None);
        }
    }

    #[test]
    fn test_lookahead_pattern_is_enforced() {
        let f = json!({
            "type": "input",
            "identifier": "code",
            "validation": { "pattern": "^(?=.*[A-Za-z])(?=.*\\d).{4,}$" }
        });
        assert_eq!(check(f.clone(), json!("abcd")), Some("Invalid format".to_string()));
        assert_eq!(check(f.clone(), json!("1234")), Some("Invalid format".to_string()));
        assert_eq!(check(f, json!("ab12")), None);
    }

    #[test]
    fn test_back_reference_pattern_is_enforced() {
        let f = json!({
            "type": "input",
            "identifier": "code",
            "validation": { "pattern": "^(\\w)\\1$" }
        });
        assert_eq!(check(f.clone(), json!("aa")), None);
        assert_eq!(check(f, json!("ab")), Some("Invalid format".to_string()));
    }

    #[test]
    fn test_shorthand_classes_are_ascii() {
        for flags in ["", "u"] {
            let digits = json!({
                "type": "input",
                "identifier": "code",
                "validation": { "pattern": "^\\+9627\\d{8}$", "patternFlags": flags }
            });
            assert_eq!(
                check(digits.clone(), json!("+9627١٢٣٤٥٦٧٨")),
                Some("Invalid format".to_string()),
                "flags {:?}",
                flags
            );
            assert_eq!(check(digits, json!("+962791234567")), None);

            let word = json!({
                "type": "input",
                "identifier": "code",
                "validation": { "pattern": "^\\w+\\b$", "patternFlags": flags }
            });
            assert_eq!(check(word.clone(), json!("hello_1")), None);
            assert!(check(word, json!("héllo")).is_some(), "flags {:?}", flags);
        }
    }

    #[test]
    fn test_shorthand_inside_class() {
        let f = json!({
            "type": "input",
            "identifier": "code",
            "validation": { "pattern": "^[\\d.]+$" }
        });
        assert_eq!(check(f.clone(), json!("1.25")), None);
        assert!(check(f.clone(), json!("١.٢")).is_some());
        assert!(check(f, json!("1,25")).is_some());
    }

    #[test]
    fn test_unknown_or_repeated_flags_skip_the_rule() {
        for flags in ["q", "ii"] {
            let f = json!({
                "type": "input",
                "identifier": "code",
                "validation": { "pattern": "^x$", "patternFlags": flags }
            });
            assert_eq!(check(f, json!("y")), None, "flags {:?}", flags);
        }
    }

    #[test]
    fn test_sticky_flag_anchors_at_start() {
        let f = json!({
            "type": "input",
            "identifier": "code",
            "validation": { "pattern": "b", "patternFlags": "y" }
        });
        assert_eq!(check(f.clone(), json!("bc")), None);
        assert!(check(f, json!("ab")).is_some());
    }

    #[test]
    fn test_equal_to_compares_with_referenced_value() {
        let f = field(json!({
            "type": "input",
            "identifier": "confirm",
            "validation": { "equalTo": "{{values.password}}" }
        }));
        let v = values(json!({ "password": "secret1" }));
        assert_eq!(
            validate(&v, &f, Some(&json!("secret2"))),
            Some("Values do not match".to_string())
        );
        assert_eq!(validate(&v, &f, Some(&json!("secret1"))), None);
        // A missing reference never matches.
        assert!(validate(&values(json!({})), &f, Some(&json!("secret1"))).is_some());
    }

    #[test]
    fn test_first_failing_rule_wins() {
        let f = field(json!({
            "type": "input",
            "identifier": "e",
            "input": { "kind": "email" },
            "validation": { "minLength": 50 }
        }));
        let violation = Validator::default()
            .check(&values(json!({})), &f, Some(&json!("bad")))
            .expect("should fail");
        assert_eq!(violation.rule, Rule::Email);
    }
}

#[cfg(test)]
mod message_tests {
    use super::*;

    fn localized_field() -> formflow::prelude::Field {
        field(json!({
            "type": "input",
            "identifier": "name",
            "mandatory": true,
            "validation": {
                "minLength": 3,
                "messages": {
                    "required": { "locale": { "en": "Name is needed", "ar": "الاسم مطلوب" } },
                    "locale": { "en": "Name is invalid" }
                }
            }
        }))
    }

    #[test]
    fn test_per_rule_message_wins() {
        let f = localized_field();
        assert_eq!(
            validate(&values(json!({})), &f, None),
            Some("Name is needed".to_string())
        );
    }

    #[test]
    fn test_flat_message_covers_other_rules() {
        let f = localized_field();
        assert_eq!(
            validate(&values(json!({})), &f, Some(&json!("ab"))),
            Some("Name is invalid".to_string())
        );
    }

    #[test]
    fn test_preferred_locale_with_english_fallback() {
        let f = localized_field();
        let arabic = Validator::new("ar");
        assert_eq!(
            arabic.validate(&values(json!({})), &f, None),
            Some("الاسم مطلوب".to_string())
        );
        // No Arabic flat message, so English is used.
        assert_eq!(
            arabic.validate(&values(json!({})), &f, Some(&json!("ab"))),
            Some("Name is invalid".to_string())
        );
    }

    #[test]
    fn test_first_locale_when_english_is_missing() {
        let f = field(json!({
            "type": "input",
            "identifier": "name",
            "mandatory": true,
            "validation": { "message": { "locale": { "fr": "Obligatoire", "de": "Pflichtfeld" } } }
        }));
        assert_eq!(
            validate(&values(json!({})), &f, None),
            Some("Obligatoire".to_string())
        );
    }

    #[test]
    fn test_plain_string_message() {
        let f = field(json!({
            "type": "input",
            "identifier": "name",
            "mandatory": true,
            "validation": { "message": "Please fill this in" }
        }));
        assert_eq!(
            validate(&values(json!({})), &f, None),
            Some("Please fill this in".to_string())
        );
    }

    #[test]
    fn test_bundled_register_messages() {
        let wf = register_workflow();
        let step = wf.step(0).expect("first step");
        let fields = formflow::visibility::collect_visible_fields(
            &step.childs,
            &values(json!({ "method": "phone" })),
        );
        let phone = fields
            .iter()
            .find(|f| f.identifier == "phone")
            .expect("phone is visible for the phone method");
        assert_eq!(
            validate(&values(json!({})), phone, Some(&json!("+962791234567"))),
            None
        );
        assert_eq!(
            validate(&values(json!({})), phone, Some(&json!("+12025550100"))),
            Some("Enter a valid Jordanian phone (+9627XXXXXXXX)".to_string())
        );
    }
}

/// Finds a field anywhere in a workflow's step trees.
fn bundled_field(workflow: &Workflow, identifier: &str) -> Field {
    fn search(nodes: &[Node], identifier: &str) -> Option<Field> {
        nodes.iter().find_map(|node| match node.as_field() {
            Some(field) if field.identifier == identifier => Some(field.clone()),
            _ => search(node.childs(), identifier),
        })
    }
    workflow
        .steps()
        .iter()
        .find_map(|step| search(&step.childs, identifier))
        .unwrap_or_else(|| panic!("bundled field {} not found", identifier))
}

fn check_bundled(field: &Field, value: &str) -> Option<String> {
    validate(&values(json!({})), field, Some(&json!(value)))
}

#[cfg(test)]
mod bundled_pattern_tests {
    use super::*;

    #[test]
    fn test_password_needs_letters_and_digits() {
        for workflow in [login_workflow(), register_workflow()] {
            let password = bundled_field(&workflow, "password");
            let message = Some("At least 8 chars, with letters & numbers".to_string());
            assert_eq!(check_bundled(&password, "abcdefgh"), message);
            assert_eq!(check_bundled(&password, "12345678"), message);
            assert_eq!(check_bundled(&password, "abcdefg1"), None);
        }
    }

    #[test]
    fn test_login_username_pattern() {
        let username = bundled_field(&login_workflow(), "username");
        assert_eq!(check_bundled(&username, "john_doe.1"), None);
        assert_eq!(
            check_bundled(&username, "john doe"),
            Some("3–32 letters, digits, _ or .".to_string())
        );
    }

    #[test]
    fn test_jordanian_phone_pattern() {
        for workflow in [login_workflow(), register_workflow()] {
            let phone = bundled_field(&workflow, "phone");
            let message = Some("Enter a valid Jordanian phone (+9627XXXXXXXX)".to_string());
            assert_eq!(check_bundled(&phone, "+962791234567"), None);
            assert_eq!(check_bundled(&phone, "+962691234567"), message);
            assert_eq!(check_bundled(&phone, "+9627١٢٣٤٥٦٧٨"), message);
        }
    }

    #[test]
    fn test_register_first_name_pattern() {
        let first_name = bundled_field(&register_workflow(), "firstName");
        assert_eq!(check_bundled(&first_name, "John"), None);
        assert_eq!(check_bundled(&first_name, "Élodie O’Neil"), None);
        assert_eq!(check_bundled(&first_name, "محمد"), None);
        assert_eq!(
            check_bundled(&first_name, "J0hn"),
            Some("Enter a valid name".to_string())
        );
    }

    #[test]
    fn test_login_blocks_on_weak_password() {
        let mut nav = navigator(login_workflow());
        nav.set_value("method", "username");
        nav.set_value("username", "john_doe");
        nav.set_value("password", "abcdefgh");
        assert_eq!(
            nav.advance(),
            formflow::Transition::Blocked {
                first_error: Some("password".to_string())
            }
        );
    }
}
