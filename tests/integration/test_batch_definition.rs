// Copyright © 2024 Pathway

use std::collections::HashSet;

use assert_matches::assert_matches;
use serde_json::json;

use batch_sorter::engine::{BatchDefinition, DataError, Error, IdDict, Value};

use super::helpers::batch_definition;

#[test]
fn test_id_dict_structure() -> eyre::Result<()> {
    let dict = IdDict::from_json(json!({
        "a0": 1,
        "a1": {
            "b0": "2",
            "b1": ["c0", ["d0", {"e0": 3, "e1": 4.5}]],
            "b2": null,
        },
    }))?;

    assert_matches!(dict.get("a0"), Some(Value::Int(1)));
    let nested = dict.get("a1").expect("a1 should be present").as_dict()?;
    assert_matches!(nested.get("b0"), Some(Value::String(s)) if s.as_str() == "2");
    assert_matches!(nested.get("b2"), Some(Value::None));

    let list = nested.get("b1").expect("b1 should be present").as_tuple()?;
    assert_eq!(list[0], Value::from("c0"));
    let inner = list[1].as_tuple()?;
    let innermost = inner[1].as_dict()?;
    assert_eq!(innermost.get("e0"), Some(&Value::Int(3)));
    assert_eq!(innermost.get("e1"), Some(&Value::from(4.5)));
    Ok(())
}

#[test]
fn test_id_dict_from_non_object() {
    let error = IdDict::from_json(json!(["a", "b"])).expect_err("arrays are not dictionaries");
    assert_matches!(
        error,
        Error::Data(DataError::TypeMismatch {
            expected: "dictionary",
            ..
        })
    );
}

#[test]
fn test_id_dict_is_hashable() -> eyre::Result<()> {
    let dictionaries: HashSet<IdDict> = [
        json!({"a0": 1, "a1": {"b0": "2", "b1": ["c0", ["d0", {"e0": 3}]]}}),
        json!({"a0": 0, "a1": 1}),
        json!({"b0": 2, "b1": 3}),
        json!({"c0": "4", "c1": "5"}),
        json!({"a1": 1, "a0": 0}),
    ]
    .into_iter()
    .map(IdDict::from_json)
    .collect::<Result<_, _>>()?;
    assert_eq!(dictionaries.len(), 4);
    Ok(())
}

#[test]
fn test_id_dict_ignores_insertion_order() {
    let forward: IdDict = [("y", 2020_i64), ("m", 1)].into_iter().collect();
    let backward: IdDict = [("m", 1_i64), ("y", 2020)].into_iter().collect();
    assert_eq!(forward, backward);
    assert_eq!(forward.cmp(&backward), std::cmp::Ordering::Equal);
    assert_eq!(
        forward.keys().map(|key| key.as_str()).collect::<Vec<_>>(),
        vec!["y", "m"]
    );
}

#[test]
fn test_batch_definition_id() {
    let a = batch_definition("aaa", json!({"id": "A"}));
    let b = batch_definition("bbb", json!({"id": "B"}));
    assert_ne!(a.id(), b.id());
    assert_eq!(a.id(), a.clone().id());
    assert!(a.id().to_string().starts_with('^'));
}

#[test]
fn test_batch_definition_id_ignores_identifier_order() {
    let a = batch_definition("aaa", json!({"x": 1, "y": 2}));
    let b = batch_definition("aaa", json!({"y": 2, "x": 1}));
    assert_eq!(a.id(), b.id());
}

#[test]
fn test_equal_numbers_share_id_and_hash() {
    let int = batch_definition("aaa", json!({"x": 2}));
    let float = batch_definition("aaa", json!({"x": 2.0}));
    assert_eq!(int, float);
    assert_eq!(int.id(), float.id());
    assert_eq!(HashSet::from([int, float]).len(), 1);

    let half = batch_definition("aaa", json!({"x": 2.5}));
    assert_ne!(batch_definition("aaa", json!({"x": 2})).id(), half.id());
}

#[test]
fn test_batch_definition_equality() {
    let a = BatchDefinition::new("A", "a", "aaa", [("id", "A")].into_iter().collect());
    let b = BatchDefinition::new("B", "b", "bbb", [("id", "B")].into_iter().collect());
    assert_ne!(a, b);

    let a2 = BatchDefinition::new("A", "a", "aaa", [("id", "A")].into_iter().collect());
    assert_eq!(a, a2);
}

#[test]
fn test_batch_definition_display() {
    let batch_definition = BatchDefinition::new(
        "my_datasource",
        "my_data_connector",
        "my_data_asset_name",
        IdDict::new(),
    );
    assert_eq!(
        batch_definition.to_string(),
        r#"{
  "datasource_name": "my_datasource",
  "data_connector_name": "my_data_connector",
  "data_asset_name": "my_data_asset_name",
  "batch_identifiers": {}
}"#
    );
}

#[test]
fn test_batch_definition_display_keeps_identifier_order() {
    let mut identifiers = IdDict::new();
    identifiers.insert("year", 2020_i64);
    identifiers.insert("month", "01");
    let batch_definition = BatchDefinition::new("ds", "dc", "asset", identifiers);
    assert_eq!(
        batch_definition.to_json()["batch_identifiers"],
        json!({"year": 2020, "month": "01"})
    );
    assert!(batch_definition
        .to_string()
        .contains("\"year\": 2020,\n    \"month\": \"01\""));
}
