//! Integration test: running mappings over JSON-shaped records

use dataconv_mapping::{
    Direction, Error, Mapping, MappingRuntime, Setting, TransferKind, ValueTransform, convert_item,
    segment,
};
use dataconv_record::Value;
use serde_json::json;

fn record(value: serde_json::Value) -> Value {
    serde_json::from_value(value).unwrap()
}

fn json_of(value: &Value) -> serde_json::Value {
    serde_json::to_value(value).unwrap()
}

fn run(mapping: &Mapping, side_a: serde_json::Value, side_b: serde_json::Value) -> serde_json::Value {
    let mut side_a = record(side_a);
    let mut side_b = record(side_b);
    MappingRuntime::new()
        .execute(mapping, &mut side_a, &mut side_b, Direction::AToB)
        .unwrap();
    json_of(&side_b)
}

#[test]
fn test_item_direct_copy_keeps_other_keys() {
    let from = record(json!({"a": 5}));
    let mut to = record(json!({"b": 3}));
    convert_item("a", &from, "b", &mut to, None).unwrap();
    assert_eq!(json_of(&to), json!({"b": 5}));

    let mut to = record(json!({"b": 3}));
    convert_item("a", &from, "c", &mut to, None).unwrap();
    assert_eq!(json_of(&to), json!({"b": 3, "c": 5}));
}

#[test]
fn test_item_nested_destination_is_created() {
    let from = record(json!({"a": 5}));
    let mut to = record(json!({"b": 3}));
    convert_item("a", &from, "c.d", &mut to, None).unwrap();
    assert_eq!(json_of(&to), json!({"b": 3, "c": {"d": 5}}));
}

#[test]
fn test_item_one_to_many() {
    let from = record(json!({"a": 5}));
    let mut to = record(json!({"b": [{}, {}]}));
    convert_item("a", &from, "b..c", &mut to, None).unwrap();
    assert_eq!(json_of(&to), json!({"b": [{"c": 5}, {"c": 5}]}));
}

#[test]
fn test_item_one_to_one() {
    let from = record(json!({"a": [{"b": 5}, {"b": 6}]}));
    let mut to = record(json!({"c": [{"d": 3}, {"d": 4}]}));
    convert_item("a..b", &from, "c..d", &mut to, None).unwrap();
    assert_eq!(json_of(&to), json!({"c": [{"d": 5}, {"d": 6}]}));
}

#[test]
fn test_item_transform_sees_whole_subtree() {
    let product = ValueTransform::new(|value| {
        let Some(Value::Map(fields)) = value else {
            return Err(Error::Transform("expected a map".to_string()));
        };
        match (fields.get("b"), fields.get("c")) {
            (Some(Value::Integer(b)), Some(Value::Integer(c))) => Ok(Some(Value::Integer(b * c))),
            _ => Err(Error::Transform("missing factors".to_string())),
        }
    });

    let from = record(json!({"a": {"b": 5, "c": 6}}));
    let mut to = record(json!({"d": 1}));
    convert_item("a", &from, "d", &mut to, Some(&product)).unwrap();
    assert_eq!(json_of(&to), json!({"d": 30}));
}

#[test]
fn test_item_parity_error_leaves_destination_untouched() {
    let from = record(json!({"a": [{"b": 5}, {"b": 6}]}));
    let mut to = record(json!({}));
    let err = convert_item("a..b", &from, "c..d..e", &mut to, None).unwrap_err();
    assert_eq!(err, Error::parity("a..b", "c..d..e", 1, 2));
    assert_eq!(json_of(&to), json!({}));
}

#[test]
fn test_transfer_kinds() {
    let kind = |from: &str, to: &str| TransferKind::classify(&segment(from), &segment(to));
    assert_eq!(kind("a", "b").unwrap(), TransferKind::Direct);
    assert_eq!(kind("a", "b..c").unwrap(), TransferKind::OneToMany);
    assert_eq!(kind("a..b", "c..d").unwrap(), TransferKind::OneToOne);
    assert!(kind("a..b", "c").is_err());
}

#[test]
fn test_driver_both_directions() {
    let mapping = Mapping::new("greeting")
        .with_setting(Setting::new("a", "A"))
        .with_setting(
            Setting::new("b", "B")
                .with_a_to_b(ValueTransform::map(|v| {
                    Value::from(v.as_string().unwrap_or_default().to_uppercase())
                }))
                .with_b_to_a(ValueTransform::map(|v| {
                    Value::from(v.as_string().unwrap_or_default().to_lowercase())
                })),
        );
    let runtime = MappingRuntime::new();

    let mut side_a = record(json!({"a": "Hello", "b": "world"}));
    let mut side_b = record(json!({"A": "World", "B": "HELLO"}));
    runtime
        .execute(&mapping, &mut side_a, &mut side_b, Direction::AToB)
        .unwrap();
    assert_eq!(json_of(&side_b), json!({"A": "Hello", "B": "WORLD"}));

    let mut side_a = record(json!({"a": "Hello", "b": "world"}));
    let mut side_b = record(json!({"A": "World", "B": "HELLO"}));
    runtime
        .execute(&mapping, &mut side_a, &mut side_b, Direction::BToA)
        .unwrap();
    assert_eq!(json_of(&side_a), json!({"a": "World", "b": "hello"}));
}

#[test]
fn test_driver_same_record_on_both_sides() {
    let mapping = Mapping::new("own").with_setting(Setting::new("a", "A"));
    let mut values = record(json!({"a": "a", "A": "A"}));
    MappingRuntime::new()
        .execute_in_place(&mapping, &mut values, Direction::AToB)
        .unwrap();
    assert_eq!(json_of(&values), json!({"a": "a", "A": "a"}));
}

#[test]
fn test_driver_assign_scalar_to_every_element() {
    let mapping = Mapping::new("assign").with_setting(Setting::new("a", "A..B"));
    let result = run(
        &mapping,
        json!({"a": "id"}),
        json!({"A": [{"child": "A"}, {"child": "B"}]}),
    );
    assert_eq!(
        result,
        json!({"A": [{"child": "A", "B": "id"}, {"child": "B", "B": "id"}]})
    );
}

#[test]
fn test_driver_builds_sequence_from_empty_destination() {
    let mapping = Mapping::new("simple").with_setting(Setting::new("a..a", "A..A"));
    let result = run(
        &mapping,
        json!({"a": [{"a": "Hello"}, {"a": "World"}]}),
        json!({}),
    );
    assert_eq!(result, json!({"A": [{"A": "Hello"}, {"A": "World"}]}));
}

#[test]
fn test_driver_nested_sequences_pair_by_position() {
    let mapping = Mapping::new("nested").with_setting(Setting::new("a....a", "A..IN...A"));
    let inner = json!([[{"a": "Hello"}, {"a": "World"}], [{"a": "Hello"}, {"a": "World"}]]);
    let old = json!([[{"A": "Hi"}, {"A": "Nick"}], [{"A": "Hi"}, {"A": "Nick"}]]);
    let new = json!([[{"A": "Hello"}, {"A": "World"}], [{"A": "Hello"}, {"A": "World"}]]);

    let result = run(
        &mapping,
        json!({"a": [inner.clone(), inner]}),
        json!({"A": [{"IN": old.clone()}, {"IN": old}]}),
    );
    assert_eq!(result, json!({"A": [{"IN": new.clone()}, {"IN": new}]}));
}

#[test]
fn test_driver_round_trip_restores_source_shape() {
    let mapping = Mapping::new("round")
        .with_setting(Setting::new("id", "header.id"))
        .with_setting(Setting::new("lines..sku", "items..code"))
        .with_setting(Setting::new("lines..qty", "items..count"));
    let original = json!({
        "id": "PO-1",
        "lines": [{"sku": "x1", "qty": 2}, {"sku": "y2", "qty": 5}]
    });
    let runtime = MappingRuntime::new();

    let mut side_a = record(original.clone());
    let mut side_b = record(json!({}));
    runtime
        .execute(&mapping, &mut side_a, &mut side_b, Direction::AToB)
        .unwrap();
    assert_eq!(
        json_of(&side_b),
        json!({
            "header": {"id": "PO-1"},
            "items": [{"code": "x1", "count": 2}, {"code": "y2", "count": 5}]
        })
    );

    let mut restored = record(json!({}));
    runtime
        .execute(&mapping, &mut restored, &mut side_b, Direction::BToA)
        .unwrap();
    assert_eq!(json_of(&restored), original);
}

#[test]
fn test_driver_absent_source_clears_destination() {
    let mapping = Mapping::new("clear").with_setting(Setting::new("missing", "kept.target"));
    let result = run(&mapping, json!({}), json!({"kept": {"target": 1, "other": 2}}));
    assert_eq!(result, json!({"kept": {"other": 2}}));
}

#[test]
fn test_driver_collects_failures_and_keeps_going() {
    let mapping = Mapping::new("mixed")
        .with_setting(Setting::new("a..b", "c..d..e"))
        .with_setting(Setting::new("ok", "done"));
    let mut side_a = record(json!({"a": [{"b": 1}], "ok": true}));
    let mut side_b = record(json!({}));

    let failure = MappingRuntime::new()
        .execute(&mapping, &mut side_a, &mut side_b, Direction::AToB)
        .unwrap_err();

    assert_eq!(failure.failures().len(), 1);
    assert_eq!(failure.failures()[0].index, 0);
    assert!(failure.to_string().contains("mixed"));
    assert_eq!(json_of(&side_b), json!({"done": true}));
}

#[test]
fn test_driver_reports_oversized_index_as_setting_failure() {
    let mapping = Mapping::new("oversized")
        .with_setting(Setting::new("a", "list.4000000000"))
        .with_setting(Setting::new("a", "copy"));
    let mut side_a = record(json!({"a": 1}));
    let mut side_b = record(json!({"list": []}));

    let failure = MappingRuntime::new()
        .execute(&mapping, &mut side_a, &mut side_b, Direction::AToB)
        .unwrap_err();

    assert_eq!(failure.failures().len(), 1);
    assert!(matches!(
        failure.failures()[0].error,
        Error::Record(dataconv_record::Error::IndexTooLarge { index: 4_000_000_000, .. })
    ));
    assert_eq!(json_of(&side_b), json!({"list": [], "copy": 1}));
}
