use std::sync::Arc;

use anyhow::Result;
use serde_json::{Value, json};

use joinplan::expression::variable::bigint;
use joinplan::plan::{JoinDistributionType, JoinType, PlanError, PlanNode, codec};
use joinplan::{DataType, RowExpression, SourceLocation, VariableReference};

#[path = "../common/mod.rs"]
mod common;

use common::{clause, equi_join};

fn scan_json(id: &str, table: &str, columns: &[&str]) -> Value {
    json!({
        "tableScan": {
            "id": id,
            "table": table,
            "outputVariables": columns
                .iter()
                .map(|c| json!({ "name": c, "type": "bigint" }))
                .collect::<Vec<_>>(),
        }
    })
}

fn variable_json(name: &str) -> Value {
    json!({ "name": name, "type": "bigint" })
}

// Property bag for INNER JOIN orders(a, b) / customer(c, d) ON a = c
fn join_json() -> Value {
    json!({
        "join": {
            "id": "2",
            "type": "INNER",
            "left": scan_json("0", "orders", &["a", "b"]),
            "right": scan_json("1", "customer", &["c", "d"]),
            "criteria": [{ "left": variable_json("a"), "right": variable_json("c") }],
            "outputVariables": [variable_json("a"), variable_json("b"), variable_json("d")],
            "dynamicFilters": {},
        }
    })
}

// Same join written out by hand; `json!` would sort the filter ids
const JOIN_TEXT: &str = r#"{
  "join": {
    "id": "2",
    "type": "INNER",
    "left": { "tableScan": { "id": "0", "table": "orders",
      "outputVariables": [{ "name": "a", "type": "bigint" }, { "name": "b", "type": "bigint" }] } },
    "right": { "tableScan": { "id": "1", "table": "customer",
      "outputVariables": [{ "name": "c", "type": "bigint" }, { "name": "d", "type": "bigint" }] } },
    "criteria": [{ "left": { "name": "a", "type": "bigint" }, "right": { "name": "c", "type": "bigint" } }],
    "outputVariables": [{ "name": "a", "type": "bigint" }, { "name": "b", "type": "bigint" }, { "name": "d", "type": "bigint" }],
    "dynamicFilters": {
      "df_9": { "name": "d", "type": "bigint" },
      "df_1": { "name": "c", "type": "bigint" },
      "df_5": { "name": "c", "type": "bigint" }
    }
  }
}"#;

fn join_fields(value: &mut Value) -> &mut serde_json::Map<String, Value> {
    value["join"].as_object_mut().expect("join object")
}

#[test]
fn test_decode_property_bag() -> Result<()> {
    let plan = codec::from_json(JOIN_TEXT)?;
    let join = plan.as_join().expect("root is a join");

    assert_eq!(join.join_type(), JoinType::Inner);
    assert_eq!(join.criteria(), &[clause("a", "c")]);
    assert_eq!(join.output_variables(), &[bigint("a"), bigint("b"), bigint("d")]);
    assert!(join.filter().is_none());
    assert!(join.left_hash_variable().is_none());
    assert!(join.distribution_type().is_none());
    let filter_ids: Vec<&String> = join.dynamic_filters().keys().collect();
    assert_eq!(filter_ids, vec!["df_9", "df_1", "df_5"]);
    Ok(())
}

#[test]
fn test_repeated_filter_id_keeps_first_position() -> Result<()> {
    let text = JOIN_TEXT.replace("\"df_5\"", "\"df_9\"");
    let plan = codec::from_json(&text)?;
    let join = plan.as_join().expect("root is a join");

    let filters: Vec<(&String, &VariableReference)> = join.dynamic_filters().iter().collect();
    assert_eq!(filters.len(), 2);
    assert_eq!(filters[0], (&"df_9".to_string(), &bigint("c")));
    assert_eq!(filters[1], (&"df_1".to_string(), &bigint("c")));
    Ok(())
}

#[test]
fn test_type_aliases_are_accepted() -> Result<()> {
    let text = JOIN_TEXT.replace("{ \"name\": \"b\", \"type\": \"bigint\" }", "{ \"name\": \"b\", \"type\": \"INT\" }");
    let plan = codec::from_json(&text)?;

    assert_eq!(plan.output_variables()[1].data_type(), DataType::Bigint);
    let value: Value = serde_json::from_str(&codec::to_json(&plan)?)?;
    assert_eq!(value["join"]["outputVariables"][1]["type"], "bigint");
    Ok(())
}

#[test]
fn test_encode_uses_property_names() -> Result<()> {
    let node = equi_join(&["a", "d"])
        .filter(Some(RowExpression::comparison("less_than", bigint("b").into(), bigint("d").into())))
        .left_hash_variable(Some(bigint("a")))
        .right_hash_variable(Some(bigint("c")))
        .distribution_type(Some(JoinDistributionType::Partitioned))
        .source_location(Some(SourceLocation::new(1, 8)))
        .build()?;
    let value: Value = serde_json::from_str(&codec::to_json(&PlanNode::Join(node))?)?;
    let fields = &value["join"];

    for name in [
        "type",
        "left",
        "right",
        "criteria",
        "outputVariables",
        "filter",
        "leftHashVariable",
        "rightHashVariable",
        "distributionType",
        "dynamicFilters",
    ] {
        assert!(fields.get(name).is_some(), "missing property {}", name);
    }
    assert_eq!(fields["type"], "INNER");
    assert_eq!(fields["distributionType"], "PARTITIONED");
    assert_eq!(fields["leftHashVariable"]["name"], "a");
    assert_eq!(fields["sourceLocation"]["line"], 1);
    Ok(())
}

#[test]
fn test_json_round_trip_preserves_node() -> Result<()> {
    let plan = PlanNode::Join(
        equi_join(&["a", "b", "d"])
            .join_type(JoinType::Left)
            .distribution_type(Some(JoinDistributionType::Replicated))
            .dynamic_filter("df_2", bigint("d"))
            .dynamic_filter("df_1", bigint("c"))
            .build()?,
    );

    let decoded = codec::from_json(&codec::to_json(&plan)?)?;
    assert_eq!(decoded, plan);
    Ok(())
}

#[test]
fn test_wire_round_trip_preserves_node() -> Result<()> {
    let plan = PlanNode::Join(
        equi_join(&["a", "b"])
            .filter(Some(RowExpression::comparison("less_than", bigint("b").into(), bigint("d").into())))
            .dynamic_filter("df_1", bigint("c"))
            .build()?,
    );

    let decoded = codec::decode(&codec::encode(&plan)?)?;
    assert_eq!(decoded, plan);
    Ok(())
}

#[test]
fn test_stats_handle_is_not_serialized() -> Result<()> {
    let node = equi_join(&["a"]).build()?;
    let plan = PlanNode::Join(node.clone());
    let with_stats = plan.assign_stats_equivalent_plan_node(Some(Arc::new(plan.clone())));

    let decoded = codec::from_json(&codec::to_json(&with_stats)?)?;
    assert!(decoded.stats_equivalent_plan_node().is_none());
    assert_eq!(decoded, plan);
    Ok(())
}

#[test]
fn test_missing_required_field_is_an_error() {
    for name in ["id", "type", "left", "right", "criteria", "outputVariables", "dynamicFilters"] {
        let mut value = join_json();
        join_fields(&mut value).remove(name);

        assert_eq!(
            codec::from_json(&value.to_string()),
            Err(PlanError::NullRequiredField(name)),
            "missing {}",
            name
        );
    }
}

#[test]
fn test_nested_join_reports_typed_error() {
    let mut join = join_json();
    join_fields(&mut join).remove("criteria");
    let filter = json!({
        "filter": {
            "id": "3",
            "sourceLocation": { "line": 4, "column": 2 },
            "source": join,
            "predicate": RowExpression::variable(bigint("b")),
        }
    });

    let text = filter.to_string();
    assert_eq!(codec::from_json(&text), Err(PlanError::NullRequiredField("criteria")));
}

#[test]
fn test_filter_source_location_is_decoded() -> Result<()> {
    let filter = json!({
        "filter": {
            "id": "3",
            "sourceLocation": { "line": 4, "column": 2 },
            "source": join_json(),
            "predicate": RowExpression::comparison("less_than", bigint("b").into(), bigint("d").into()),
        }
    });

    let plan = codec::from_json(&filter.to_string())?;
    assert_eq!(plan.source_location(), Some(SourceLocation::new(4, 2)));
    assert_eq!(codec::decode(&codec::encode(&plan)?)?, plan);
    Ok(())
}

#[test]
fn test_null_required_field_is_an_error() {
    let mut value = join_json();
    join_fields(&mut value).insert("criteria".to_string(), Value::Null);

    assert_eq!(
        codec::from_json(&value.to_string()),
        Err(PlanError::NullRequiredField("criteria"))
    );
}

#[test]
fn test_optional_fields_may_be_null() -> Result<()> {
    let mut value = join_json();
    let fields = join_fields(&mut value);
    fields.insert("filter".to_string(), Value::Null);
    fields.insert("distributionType".to_string(), Value::Null);

    let plan = codec::from_json(&value.to_string())?;
    assert!(plan.as_join().expect("join").distribution_type().is_none());
    Ok(())
}

#[test]
fn test_unknown_field_is_an_error() {
    let mut value = join_json();
    join_fields(&mut value).insert("joinHint".to_string(), json!("broadcast"));

    assert!(matches!(codec::from_json(&value.to_string()), Err(PlanError::Codec(_))));
}

#[test]
fn test_invalid_property_bag_is_rejected_by_invariants() {
    let mut value = join_json();
    join_fields(&mut value).insert(
        "outputVariables".to_string(),
        json!([variable_json("d"), variable_json("a")]),
    );

    assert!(matches!(
        codec::from_json(&value.to_string()),
        Err(PlanError::OutputOrderingViolation { .. })
    ));

    let mut value = join_json();
    let fields = join_fields(&mut value);
    fields.insert("type".to_string(), json!("FULL"));
    fields.insert("distributionType".to_string(), json!("REPLICATED"));
    match codec::from_json(&value.to_string()) {
        Err(e @ PlanError::IncompatibleDistributionType { .. }) => {
            assert!(e.to_string().starts_with("FULL join does not work with REPLICATED"), "{}", e)
        }
        other => panic!("Expected distribution error, got {:?}", other),
    }
}

#[test]
fn test_unknown_join_type_is_an_error() {
    let mut value = join_json();
    join_fields(&mut value).insert("type".to_string(), json!("SEMI"));

    assert!(matches!(codec::from_json(&value.to_string()), Err(PlanError::Codec(_))));
}
