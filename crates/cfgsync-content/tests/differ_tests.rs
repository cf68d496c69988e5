//! Property tests for ConfigDiffer

use cfgsync_content::{ConfigDiffer, SemanticDiff};
use proptest::prelude::*;
use serde_json::{Value, json};

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| json!(n)),
        "[a-z]{0,6}".prop_map(Value::String),
    ]
}

fn config_value() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z_]{1,5}", inner, 0..4)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

fn item() -> impl Strategy<Value = Value> {
    prop::collection::btree_map("[a-z_]{1,5}", config_value(), 0..5)
        .prop_map(|map| Value::Object(map.into_iter().collect()))
}

proptest! {
    #[test]
    fn same_is_reflexive(a in item()) {
        prop_assert!(ConfigDiffer::default().same(&a, &a));
        prop_assert!(ConfigDiffer::strict().same(&a, &a));
    }

    #[test]
    fn same_is_symmetric(a in item(), b in item()) {
        let differ = ConfigDiffer::default();
        prop_assert_eq!(differ.same(&a, &b), differ.same(&b, &a));
    }

    #[test]
    fn same_agrees_with_normalized_equality(a in item(), b in item()) {
        let differ = ConfigDiffer::default();
        prop_assert_eq!(
            differ.same(&a, &b),
            differ.normalize(&a) == differ.normalize(&b)
        );
    }

    #[test]
    fn semantic_diff_is_empty_exactly_when_equal(a in item(), b in item()) {
        let diff = SemanticDiff::compute(&a, &b);
        prop_assert_eq!(diff.is_equivalent, a == b);
    }
}

#[test]
fn identity_change_alone_is_not_a_difference() {
    let differ = ConfigDiffer::default();
    assert!(differ.same(
        &json!({"uuid": "a", "id": "frontpage"}),
        &json!({"uuid": "b", "id": "frontpage"})
    ));
}
