use anyhow::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use joinplan::expression::variable::bigint;
use joinplan::plan::{JoinDistributionType, JoinType, PlanError};
use joinplan::{DataType, RowExpression, VariableReference};

#[path = "../common/mod.rs"]
mod common;

use common::{clause, equi_join, join_builder, left_scan, right_scan, vars};

fn less_than(left: &str, right: &str) -> RowExpression {
    RowExpression::comparison("less_than", bigint(left).into(), bigint(right).into())
}

#[test]
fn test_equi_join_with_pruned_right_side() -> Result<()> {
    let node = equi_join(&["a", "b", "d"]).build()?;

    assert_eq!(node.join_type(), JoinType::Inner);
    assert_eq!(node.criteria(), &[clause("a", "c")]);
    assert_eq!(node.output_variables(), vars(&["a", "b", "d"]).as_slice());
    assert!(!node.is_cross_join());
    assert!(node.dynamic_filters().is_empty());
    assert!(node.distribution_type().is_none());
    Ok(())
}

#[test]
fn test_right_column_before_left_columns_is_rejected() {
    let result = equi_join(&["d", "a", "b"]).build();
    assert!(matches!(result, Err(PlanError::OutputOrderingViolation { .. })));
}

#[test]
fn test_full_join_cannot_be_replicated() {
    let result = equi_join(&["a", "c"])
        .join_type(JoinType::Full)
        .distribution_type(Some(JoinDistributionType::Replicated))
        .build();

    match result {
        Err(PlanError::IncompatibleDistributionType { join_type, distribution_type, .. }) => {
            assert_eq!(join_type, "FULL");
            assert_eq!(distribution_type, "REPLICATED");
        }
        other => panic!("Expected IncompatibleDistributionType, got {:?}", other),
    }
}

#[test]
fn test_full_join_can_be_partitioned() -> Result<()> {
    let node = equi_join(&["a", "c"])
        .join_type(JoinType::Full)
        .distribution_type(Some(JoinDistributionType::Partitioned))
        .build()?;
    assert_eq!(node.distribution_type(), Some(JoinDistributionType::Partitioned));
    Ok(())
}

#[test]
fn test_cross_join_cannot_be_partitioned() {
    let result = join_builder(JoinType::Inner)
        .output_variables(vars(&["a", "b", "c", "d"]))
        .distribution_type(Some(JoinDistributionType::Partitioned))
        .build();
    assert!(matches!(result, Err(PlanError::IncompatibleDistributionType { .. })));
}

#[test]
fn test_cross_join_can_be_replicated() -> Result<()> {
    let node = join_builder(JoinType::Inner)
        .output_variables(vars(&["a", "b", "c", "d"]))
        .distribution_type(Some(JoinDistributionType::Replicated))
        .build()?;
    assert!(node.is_cross_join());
    Ok(())
}

#[test]
fn test_cross_join_rejects_pruned_outputs() {
    let result = join_builder(JoinType::Inner)
        .output_variables(vars(&["a", "c", "d"]))
        .build();
    assert!(matches!(result, Err(PlanError::InvalidCrossJoinProjection { .. })));
}

#[test]
fn test_cross_join_full_union_must_keep_sides_grouped() -> Result<()> {
    // Reordering within a side is fine, interleaving the sides is not
    join_builder(JoinType::Inner)
        .output_variables(vars(&["b", "a", "d", "c"]))
        .build()?;

    let interleaved = join_builder(JoinType::Inner)
        .output_variables(vars(&["c", "d", "a", "b"]))
        .build();
    assert!(matches!(interleaved, Err(PlanError::OutputOrderingViolation { .. })));
    Ok(())
}

#[test]
fn test_join_with_filter_only_may_prune() -> Result<()> {
    let node = join_builder(JoinType::Inner)
        .filter(Some(less_than("a", "c")))
        .output_variables(vars(&["a"]))
        .build()?;

    assert!(!node.is_cross_join());
    assert_eq!(node.filter(), Some(&less_than("a", "c")));
    Ok(())
}

#[test]
fn test_left_join_without_criteria_is_not_a_cross_join() -> Result<()> {
    let node = join_builder(JoinType::Left).output_variables(vars(&["b"])).build()?;
    assert!(!node.is_cross_join());
    Ok(())
}

#[test]
fn test_output_from_neither_side_is_rejected() {
    let stranger = VariableReference::new("a", DataType::Varchar);
    let result = equi_join(&["a"]).output_variables(vec![bigint("a"), stranger]).build();

    assert!(matches!(result, Err(PlanError::OutputNotContainedInInputs { .. })));
}

#[test]
fn test_containment_is_checked_before_cross_join_purity() {
    let result = join_builder(JoinType::Inner)
        .output_variables(vars(&["a", "b", "c", "z"]))
        .build();
    assert!(matches!(result, Err(PlanError::OutputNotContainedInInputs { .. })));
}

#[test]
fn test_left_hash_variable_without_criteria_is_rejected() {
    let result = join_builder(JoinType::Left)
        .output_variables(vars(&["a"]))
        .left_hash_variable(Some(bigint("a")))
        .build();

    assert!(matches!(
        result,
        Err(PlanError::InvalidHashVariableWithoutCriteria { side: "Left", .. })
    ));
}

#[test]
fn test_dynamic_filter_must_target_build_side() -> Result<()> {
    let node = equi_join(&["a", "b"])
        .dynamic_filter("df_2", bigint("d"))
        .dynamic_filter("df_1", bigint("c"))
        .build()?;
    let ids: Vec<&String> = node.dynamic_filters().keys().collect();
    assert_eq!(ids, vec!["df_2", "df_1"]);

    let probe_side = equi_join(&["a", "b"]).dynamic_filter("df_1", bigint("b")).build();
    assert!(matches!(probe_side, Err(PlanError::InvalidDynamicFilterTarget { .. })));
    Ok(())
}

#[test]
fn test_repeated_dynamic_filter_keeps_first_position() -> Result<()> {
    let node = equi_join(&["a", "b"])
        .dynamic_filter("df_1", bigint("c"))
        .dynamic_filter("df_2", bigint("d"))
        .dynamic_filter("df_1", bigint("d"))
        .build()?;

    let ids: Vec<&String> = node.dynamic_filters().keys().collect();
    assert_eq!(ids, vec!["df_1", "df_2"]);
    assert_eq!(node.dynamic_filters().get("df_1"), Some(&bigint("d")));
    Ok(())
}

#[test]
fn test_probe_and_build_are_left_and_right() -> Result<()> {
    let node = equi_join(&["a"]).build()?;

    assert_eq!(node.probe().output_variables(), left_scan().output_variables());
    assert_eq!(node.build().output_variables(), right_scan().output_variables());
    Ok(())
}

#[test]
fn test_error_messages_name_offending_values() {
    let err = equi_join(&["a", "c"])
        .join_type(JoinType::Full)
        .distribution_type(Some(JoinDistributionType::Replicated))
        .build()
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("FULL"), "message was: {}", message);
    assert!(message.contains("REPLICATED"), "message was: {}", message);

    let err = equi_join(&["a"]).dynamic_filter("df_7", bigint("a")).build().unwrap_err();
    let message = err.to_string();
    assert!(message.contains("df_7"), "message was: {}", message);
    assert!(message.contains("c, d"), "message was: {}", message);
}

// Any subset of the inputs in any order: the node is accepted exactly when
// no left column follows a right column, and then every output is an input.
#[test]
fn test_random_projections_respect_containment_and_ordering() -> Result<()> {
    let left = ["a", "b"];
    let right = ["c", "d"];
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..500 {
        let mut outputs: Vec<&str> = left
            .iter()
            .chain(right.iter())
            .copied()
            .filter(|_| rng.gen_bool(0.7))
            .collect();
        outputs.shuffle(&mut rng);

        let first_right = outputs.iter().position(|o| right.contains(o));
        let last_left = outputs.iter().rposition(|o| left.contains(o));
        let grouped = match (first_right, last_left) {
            (Some(r), Some(l)) => r > l,
            _ => true,
        };

        let result = equi_join(&outputs).build();
        assert_eq!(result.is_ok(), grouped, "outputs: {:?}", outputs);

        match result {
            Ok(node) => {
                let outputs = node.output_variables();
                for variable in outputs {
                    assert!(left_scan().output_variables().contains(variable) || right_scan().output_variables().contains(variable));
                }
                for (i, later) in outputs.iter().enumerate() {
                    for earlier in &outputs[..i] {
                        let later_is_left = left_scan().output_variables().contains(later);
                        let earlier_is_right = right_scan().output_variables().contains(earlier);
                        assert!(!(later_is_left && earlier_is_right), "outputs: {:?}", outputs);
                    }
                }
            }
            Err(e) => assert!(matches!(e, PlanError::OutputOrderingViolation { .. })),
        }
    }
    Ok(())
}
