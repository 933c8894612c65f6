//! # Built-in Optimization Rules
//!
//! The default rule set for the Cascades search.
//!
//! ## Transformation Rules (Logical -> Logical)
//!
//! - **`JoinCommutativityRule`**: Swaps the inputs of inner and cross joins.
//!
//! ## Implementation Rules (Logical -> Physical)
//!
//! - **`ImplSeqScanRule`**: Scan as a sequential table scan.
//! - **`ImplStarScanRule`**: Star scan as the infinitely priced placeholder; it can
//!   only be displaced, never chosen.
//! - **`ImplHashJoinRule`**: Join as a hash join, building on either side.
//! - **`ImplNestedLoopJoinRule`**: Join as a nested loop join (always applicable).
//! - **`ImplFilterRule`**, **`ImplProjectRule`**: One-to-one physical mappings.
//!
//! Source-specific rules, such as materialized-view substitution over star tables,
//! are registered on the returned registry with `add_source_rule_set()`.

pub mod impl_filter_project;
pub mod impl_join;
pub mod impl_scan;
pub mod join_commutativity;

use optx_core::rule::RuleRegistry;

/// A registry holding every built-in rule.
pub fn default_rule_registry() -> RuleRegistry {
    let mut registry = RuleRegistry::new();

    registry.add_rule(Box::new(join_commutativity::JoinCommutativityRule));

    registry.add_rule(Box::new(impl_scan::ImplSeqScanRule));
    registry.add_rule(Box::new(impl_scan::ImplStarScanRule));
    registry.add_rule(Box::new(impl_join::ImplHashJoinRule));
    registry.add_rule(Box::new(impl_join::ImplNestedLoopJoinRule));
    registry.add_rule(Box::new(impl_filter_project::ImplFilterRule));
    registry.add_rule(Box::new(impl_filter_project::ImplProjectRule));

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_contents() {
        let registry = default_rule_registry();
        let names: Vec<_> = registry
            .transformation_rules(None)
            .iter()
            .map(|r| r.name().to_string())
            .collect();
        assert_eq!(names, vec!["JoinCommutativity"]);
        assert_eq!(registry.implementation_rules(None).len(), 6);
    }
}
