//! # Cost Model
//!
//! This module defines the cost abstraction and the default cost model.
//!
//! ## The Cost Type
//!
//! A [`Cost`] is either a finite, non-negative weighted total or the reserved
//! [`Cost::Infinite`] sentinel. The sentinel is a separate variant rather than a
//! large float, and the derived total order puts it above every finite cost. The
//! search records a winner only when a candidate is strictly cheaper than the
//! current best, which starts at the sentinel, so an infinitely priced operator can
//! never become part of a final plan.
//!
//! ## Weights
//!
//! `DefaultCostModel` collapses CPU and memory estimates into one number:
//!
//! ```text
//! total_cost = cpu_weight * cpu_cost + memory_weight * memory_cost
//! ```
//!
//! Costs are additive: a plan's cost is its operator's local cost plus its
//! children's costs. Adding anything to an infinite cost stays infinite.
//!
//! ## Star Scans
//!
//! A star scan reads a virtual relation with no storage. It is priced at
//! [`CostModel::infinite_cost`] regardless of statistics or children, which keeps
//! it out of every finished plan unless a substitution rule rewrites it first.

use crate::expr::*;
use crate::stats::Statistics;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Add;

/// Estimated expense of a plan. Lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cost {
    Finite(OrderedFloat<f64>),
    /// Unbounded cost. Loses to every finite alternative.
    Infinite,
}

impl Cost {
    pub fn zero() -> Self {
        Cost::Finite(OrderedFloat(0.0))
    }

    /// A finite cost. NaN and +inf inputs map to [`Cost::Infinite`].
    pub fn new(total: f64) -> Self {
        if total.is_nan() || total == f64::INFINITY {
            Cost::Infinite
        } else {
            Cost::Finite(OrderedFloat(total))
        }
    }

    pub fn infinite() -> Self {
        Cost::Infinite
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, Cost::Infinite)
    }

    /// The weighted total, or `None` for the infinite sentinel.
    pub fn total(&self) -> Option<f64> {
        match self {
            Cost::Finite(v) => Some(v.0),
            Cost::Infinite => None,
        }
    }
}

impl Ord for Cost {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Cost::Finite(a), Cost::Finite(b)) => a.cmp(b),
            (Cost::Finite(_), Cost::Infinite) => Ordering::Less,
            (Cost::Infinite, Cost::Finite(_)) => Ordering::Greater,
            (Cost::Infinite, Cost::Infinite) => Ordering::Equal,
        }
    }
}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add for Cost {
    type Output = Cost;

    fn add(self, rhs: Cost) -> Cost {
        match (self, rhs) {
            (Cost::Finite(a), Cost::Finite(b)) => Cost::new(a.0 + b.0),
            _ => Cost::Infinite,
        }
    }
}

impl std::iter::Sum for Cost {
    fn sum<I: Iterator<Item = Cost>>(iter: I) -> Cost {
        iter.fold(Cost::zero(), Add::add)
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cost::Finite(v) => write!(f, "{:.1}", v.0),
            Cost::Infinite => write!(f, "inf"),
        }
    }
}

/// Trait for pluggable cost models.
pub trait CostModel: Send + Sync {
    /// Cost of `op` including `children_costs`.
    fn compute_cost(
        &self,
        op: &PhysicalOp,
        input_stats: &[&Statistics],
        children_costs: &[Cost],
    ) -> Cost;

    /// The sentinel used for operators that must never be chosen.
    fn infinite_cost(&self) -> Cost {
        Cost::infinite()
    }
}

/// Weighted CPU/memory cost model.
pub struct DefaultCostModel {
    /// Weight for per-row work (scanning, hashing, probing).
    pub cpu_weight: f64,
    /// Weight for bytes held in memory (hash tables).
    pub memory_weight: f64,
}

impl Default for DefaultCostModel {
    fn default() -> Self {
        Self {
            cpu_weight: 1.0,
            memory_weight: 1.0,
        }
    }
}

/// Row count assumed when an input has no statistics.
const DEFAULT_ROWS: f64 = 1000.0;

impl CostModel for DefaultCostModel {
    fn compute_cost(
        &self,
        op: &PhysicalOp,
        input_stats: &[&Statistics],
        children_costs: &[Cost],
    ) -> Cost {
        let children_total: Cost = children_costs.iter().copied().sum();
        let first_rows = || {
            input_stats
                .first()
                .map(|s| s.row_count)
                .unwrap_or(DEFAULT_ROWS)
        };

        let local_cost = match op {
            // Virtual relation: nothing to execute.
            PhysicalOp::StarScan { .. } => return self.infinite_cost(),
            PhysicalOp::SeqScan { .. } => self.cpu_weight * first_rows(),
            PhysicalOp::Filter { .. } | PhysicalOp::Project { .. } => {
                self.cpu_weight * first_rows()
            }
            // Hash the build side into memory, then one probe per row of the other side.
            PhysicalOp::HashJoin { build_side, .. } => {
                if input_stats.len() < 2 {
                    return children_total + Cost::new(DEFAULT_ROWS);
                }
                let (build, probe) = match build_side {
                    BuildSide::Left => (input_stats[0], input_stats[1]),
                    BuildSide::Right => (input_stats[1], input_stats[0]),
                };
                self.cpu_weight * build.row_count
                    + self.memory_weight * build.total_size_bytes
                    + self.cpu_weight * probe.row_count
            }
            PhysicalOp::NestedLoopJoin { .. } => {
                if input_stats.len() < 2 {
                    return children_total + Cost::new(DEFAULT_ROWS);
                }
                self.cpu_weight * input_stats[0].row_count * input_stats[1].row_count
            }
        };

        children_total + Cost::new(local_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn star_scan() -> PhysicalOp {
        PhysicalOp::StarScan {
            table: TableRef::new("mv", "star"),
            columns: vec![],
        }
    }

    #[test]
    fn test_infinite_is_above_every_finite_cost() {
        assert!(Cost::new(f64::MAX) < Cost::infinite());
        assert!(Cost::zero() < Cost::new(1.0));
        assert_eq!(Cost::new(f64::INFINITY), Cost::infinite());
        assert_eq!(Cost::new(f64::NAN), Cost::infinite());
        assert_eq!(
            [Cost::infinite(), Cost::new(5.0), Cost::new(2.0)].iter().min(),
            Some(&Cost::new(2.0))
        );
    }

    #[test]
    fn test_addition_saturates_at_infinite() {
        assert_eq!(Cost::new(1.5) + Cost::new(2.5), Cost::new(4.0));
        assert!((Cost::new(1.0) + Cost::infinite()).is_infinite());
        assert_eq!(Cost::infinite().total(), None);
        assert_eq!(Cost::infinite().to_string(), "inf");
    }

    #[test]
    fn test_star_scan_is_infinite_regardless_of_stats() {
        let model = DefaultCostModel::default();
        let tiny = Statistics::new(1.0, 8.0);
        let huge = Statistics::new(1e12, 1e14);
        assert!(model.compute_cost(&star_scan(), &[], &[]).is_infinite());
        assert!(model.compute_cost(&star_scan(), &[&tiny], &[Cost::zero()]).is_infinite());
        assert!(model.compute_cost(&star_scan(), &[&huge], &[]).is_infinite());

        let cheap = DefaultCostModel {
            cpu_weight: 0.0,
            memory_weight: 0.0,
        };
        assert_eq!(cheap.compute_cost(&star_scan(), &[], &[]), cheap.infinite_cost());
    }

    #[test]
    fn test_hash_join_prefers_small_build_side() {
        let model = DefaultCostModel::default();
        let small = Statistics::new(100.0, 10000.0);
        let large = Statistics::new(1_000_000.0, 100_000_000.0);
        let join = |build_side| PhysicalOp::HashJoin {
            join_type: JoinType::Inner,
            build_side,
            condition: Expr::Literal(ScalarValue::Bool(true)),
        };

        let zero = [Cost::zero(), Cost::zero()];
        let build_small = model.compute_cost(&join(BuildSide::Left), &[&small, &large], &zero);
        let build_large = model.compute_cost(&join(BuildSide::Right), &[&small, &large], &zero);
        assert!(build_small < build_large);
    }

    #[test]
    fn test_infinite_child_makes_parent_infinite() {
        let model = DefaultCostModel::default();
        let stats = Statistics::new(10.0, 100.0);
        let filter = PhysicalOp::Filter {
            predicate: Expr::Literal(ScalarValue::Bool(true)),
        };
        let cost = model.compute_cost(&filter, &[&stats], &[Cost::infinite()]);
        assert!(cost.is_infinite());
    }
}
