//! Condition evaluation tests: token resolution, coercion and comparators.
mod common;
use common::*;
use formflow::condition::evaluate;
use formflow::value::Operand;
use serde_json::json;

#[cfg(test)]
mod token_tests {
    use super::*;

    #[test]
    fn test_token_resolves_nested_path() {
        let v = values(json!({ "a": { "b": 3 } }));
        let operand = Operand::parse(&json!("{{values.a.b}}"));
        assert_eq!(operand, Operand::Path(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(operand.resolve(&v), Some(&json!(3)));
    }

    #[test]
    fn test_token_allows_inner_whitespace() {
        let v = values(json!({ "method": "email" }));
        let operand = Operand::parse(&json!("{{  values.method }}"));
        assert_eq!(operand.resolve(&v), Some(&json!("email")));
    }

    #[test]
    fn test_token_walks_into_arrays_by_index() {
        let v = values(json!({ "list": ["x", "y"] }));
        let operand = Operand::parse(&json!("{{values.list.1}}"));
        assert_eq!(operand.resolve(&v), Some(&json!("y")));
    }

    #[test]
    fn test_unresolvable_path_is_undefined() {
        let v = values(json!({ "a": 1 }));
        assert_eq!(Operand::parse(&json!("{{values.a.b.c}}")).resolve(&v), None);
        assert_eq!(Operand::parse(&json!("{{values.missing}}")).resolve(&v), None);
    }

    #[test]
    fn test_non_token_strings_are_literal() {
        let v = values(json!({ "method": "email" }));
        for raw in ["method", "{{method}}", "values.method", "{{values.method}} extra"] {
            let operand = Operand::parse(&json!(raw));
            assert_eq!(operand, Operand::Literal(json!(raw)), "{} should be literal", raw);
        }
        assert_eq!(Operand::parse(&json!(42)).resolve(&v), Some(&json!(42)));
    }
}

#[cfg(test)]
mod comparator_tests {
    use super::*;

    #[test]
    fn test_absent_condition_is_visible() {
        assert!(evaluate(None, &values(json!({}))));
    }

    #[test]
    fn test_equality_against_token() {
        let c = condition(json!({
            "valueA": "email",
            "valueB": "{{values.method}}",
            "comparator": "="
        }));
        assert!(evaluate(Some(&c), &values(json!({ "method": "email" }))));
        assert!(!evaluate(Some(&c), &values(json!({ "method": "phone" }))));
    }

    #[test]
    fn test_not_equal() {
        let c = condition(json!({
            "valueA": "{{values.method}}",
            "valueB": "email",
            "comparator": "!="
        }));
        assert!(evaluate(Some(&c), &values(json!({ "method": "phone" }))));
        assert!(!evaluate(Some(&c), &values(json!({ "method": "email" }))));
    }

    #[test]
    fn test_in_splits_literal_list() {
        let c = condition(json!({
            "valueA": "{{values.method}}",
            "valueB": "email,phone,username",
            "comparator": "in",
            "compareAs": "string"
        }));
        assert!(evaluate(Some(&c), &values(json!({ "method": "phone" }))));
        assert!(!evaluate(Some(&c), &values(json!({ "method": "sms" }))));
    }

    #[test]
    fn test_not_in_splits_literal_list() {
        let c = condition(json!({
            "valueA": "{{values.method}}",
            "valueB": "email,phone",
            "comparator": "not_in"
        }));
        assert!(evaluate(Some(&c), &values(json!({ "method": "username" }))));
        assert!(!evaluate(Some(&c), &values(json!({ "method": "email" }))));
    }

    #[test]
    fn test_in_uses_membership_for_real_sequences() {
        let c = condition(json!({
            "valueA": "b",
            "valueB": "{{values.tags}}",
            "comparator": "in"
        }));
        assert!(evaluate(Some(&c), &values(json!({ "tags": ["a", "b"] }))));
        assert!(!evaluate(Some(&c), &values(json!({ "tags": ["a", "c"] }))));

        // Membership compares raw values, so a number is not its string form.
        let numeric = condition(json!({
            "valueA": 2,
            "valueB": "{{values.ids}}",
            "comparator": "in"
        }));
        assert!(evaluate(Some(&numeric), &values(json!({ "ids": [1, 2] }))));
        assert!(!evaluate(Some(&numeric), &values(json!({ "ids": ["1", "2"] }))));
    }

    #[test]
    fn test_numeric_ordering() {
        let c = condition(json!({
            "valueA": "{{values.age}}",
            "valueB": "18",
            "comparator": ">=",
            "compareAs": "number"
        }));
        assert!(evaluate(Some(&c), &values(json!({ "age": "21" }))));
        assert!(evaluate(Some(&c), &values(json!({ "age": 18 }))));
        assert!(!evaluate(Some(&c), &values(json!({ "age": 17 }))));
    }

    #[test]
    fn test_numeric_equality_ignores_spelling() {
        let c = condition(json!({
            "valueA": "{{values.n}}",
            "valueB": 3,
            "comparator": "=",
            "compareAs": "number"
        }));
        assert!(evaluate(Some(&c), &values(json!({ "n": "3.0" }))));
        assert!(evaluate(Some(&c), &values(json!({ "n": " 3 " }))));
    }

    #[test]
    fn test_nan_comparisons_are_false_except_not_equal() {
        let v = values(json!({ "age": "abc" }));
        for comparator in ["=", ">", ">=", "<", "<="] {
            let c = condition(json!({
                "valueA": "{{values.age}}",
                "valueB": "18",
                "comparator": comparator,
                "compareAs": "number"
            }));
            assert!(!evaluate(Some(&c), &v), "{} against NaN should be false", comparator);
        }
        let c = condition(json!({
            "valueA": "{{values.age}}",
            "valueB": "18",
            "comparator": "!=",
            "compareAs": "number"
        }));
        assert!(evaluate(Some(&c), &v));
    }

    #[test]
    fn test_boolean_coercion_accepts_only_true() {
        let c = condition(json!({
            "valueA": "{{values.agree}}",
            "valueB": true,
            "comparator": "=",
            "compareAs": "boolean"
        }));
        assert!(evaluate(Some(&c), &values(json!({ "agree": true }))));
        assert!(evaluate(Some(&c), &values(json!({ "agree": "true" }))));
        assert!(!evaluate(Some(&c), &values(json!({ "agree": "yes" }))));
        assert!(!evaluate(Some(&c), &values(json!({ "agree": 1 }))));
        assert!(!evaluate(Some(&c), &values(json!({}))));
    }

    #[test]
    fn test_string_ordering_is_lexicographic() {
        let c = condition(json!({
            "valueA": "{{values.v}}",
            "valueB": "9",
            "comparator": ">"
        }));
        // "10" < "9" as strings.
        assert!(!evaluate(Some(&c), &values(json!({ "v": "10" }))));
        assert!(evaluate(Some(&c), &values(json!({ "v": "a" }))));
    }

    #[test]
    fn test_string_coercion_renders_numbers_plainly() {
        let c = condition(json!({
            "valueA": "{{values.count}}",
            "valueB": "3",
            "comparator": "="
        }));
        assert!(evaluate(Some(&c), &values(json!({ "count": 3 }))));
    }

    #[test]
    fn test_missing_or_unknown_comparator_is_visible() {
        let v = values(json!({ "method": "phone" }));
        let missing = condition(json!({ "valueA": "email", "valueB": "{{values.method}}" }));
        let unknown = condition(json!({
            "valueA": "email",
            "valueB": "{{values.method}}",
            "comparator": "~="
        }));
        let mistyped = condition(json!({
            "valueA": "email",
            "valueB": "{{values.method}}",
            "comparator": 5
        }));
        assert!(evaluate(Some(&missing), &v));
        assert!(evaluate(Some(&unknown), &v));
        assert!(evaluate(Some(&mistyped), &v));
    }

    #[test]
    fn test_unresolved_operand_compares_as_undefined() {
        let c = condition(json!({
            "valueA": "{{values.nothing}}",
            "valueB": "email",
            "comparator": "="
        }));
        assert!(!evaluate(Some(&c), &values(json!({}))));
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let c = condition(json!({
            "valueA": "{{values.method}}",
            "valueB": "email,phone",
            "comparator": "in"
        }));
        let v = values(json!({ "method": "email" }));
        let first = evaluate(Some(&c), &v);
        for _ in 0..10 {
            assert_eq!(evaluate(Some(&c), &v), first);
        }
    }
}
