//! # Cascades Search Algorithm
//!
//! Top-down, memoized search over the groups of a [`Memo`]. Each group goes through
//! two phases:
//!
//! 1. **Explore** (`explore_group`): apply transformation rules so every logically
//!    equivalent expression (for example both orders of a join) lives in the group.
//! 2. **Implement** (`implement_group`): apply implementation rules, optimize the
//!    child groups of each physical alternative, cost it, and keep the cheapest one
//!    as the group's winner.
//!
//! ## Winners and the Infinite Sentinel
//!
//! Every group starts with a best cost of [`Cost::Infinite`], and a physical
//! alternative only replaces the best when it is *strictly* cheaper. A star scan is
//! priced at the sentinel, so it can never be recorded as a winner: a group whose
//! only physical alternatives are star scans ends up with no winner, and every
//! parent that needs it is infeasible. If another alternative exists (for example
//! the join the star table stands for) the search picks that one.
//!
//! ## Limits
//!
//! [`SearchConfig::max_iterations`] caps the number of rule applications and
//! [`SearchConfig::max_memo_groups`] refuses to work on an oversized memo. Hitting a
//! limit stops the search; whatever winners exist by then are kept.

use crate::catalog::Catalog;
use crate::cost::{Cost, CostModel};
use crate::expr::*;
use crate::memo::{ExprId, GroupId, Memo, PlanNode, Winner};
use crate::pattern::matches;
use crate::rule::{OptContext, RuleRegistry, RuleType};
use crate::stats::{self, Statistics};
use std::sync::Arc;
use tracing::{debug, trace};

/// Selectivity assumed for range comparisons.
const RANGE_SELECTIVITY: f64 = 0.33;

/// Configuration knobs for the search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// The search refuses to run on a memo with more groups than this.
    pub max_memo_groups: usize,
    /// Upper bound on rule applications (transformation plus implementation).
    pub max_iterations: usize,
    /// Selects an additional per-source rule set from the registry.
    pub source_type: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_memo_groups: 100_000,
            max_iterations: 1_000_000,
            source_type: None,
        }
    }
}

/// The Cascades search engine. Owns the memo for the duration of one optimization.
pub struct CascadesSearch {
    pub memo: Memo,
    pub rule_registry: Arc<RuleRegistry>,
    pub cost_model: Arc<dyn CostModel>,
    pub catalog: Arc<dyn Catalog>,
    pub config: SearchConfig,
    iterations: usize,
}

impl CascadesSearch {
    pub fn new(
        memo: Memo,
        rule_registry: Arc<RuleRegistry>,
        cost_model: Arc<dyn CostModel>,
        catalog: Arc<dyn Catalog>,
        config: SearchConfig,
    ) -> Self {
        Self {
            memo,
            rule_registry,
            cost_model,
            catalog,
            config,
            iterations: 0,
        }
    }

    /// Rule applications performed so far.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Optimize `root_group` and extract its cheapest plan.
    ///
    /// Returns `None` when no finite-cost plan exists, for example when the root
    /// can only be produced by a star scan.
    pub fn optimize(&mut self, root_group: GroupId) -> Option<PlanNode> {
        debug!(
            "Starting Cascades optimization: root_group={}, groups={}, exprs={}",
            root_group,
            self.memo.num_groups(),
            self.memo.num_exprs()
        );

        self.optimize_group(root_group);

        let plan = self.memo.extract_best_plan(root_group);
        match &plan {
            Some(p) => debug!(
                "Optimization complete: cost={}, iterations={}",
                p.cost, self.iterations
            ),
            None => debug!("Optimization failed: no finite-cost plan for group {}", root_group),
        }
        plan
    }

    fn budget_exhausted(&self) -> bool {
        if self.iterations >= self.config.max_iterations {
            debug!("Hit iteration limit ({})", self.config.max_iterations);
            return true;
        }
        if self.memo.num_groups() > self.config.max_memo_groups {
            debug!(
                "Memo has {} groups, limit is {}",
                self.memo.num_groups(),
                self.config.max_memo_groups
            );
            return true;
        }
        false
    }

    fn optimize_group(&mut self, group_id: GroupId) {
        if self.memo.group(group_id).implemented || self.budget_exhausted() {
            return;
        }
        self.explore_group(group_id);
        self.implement_group(group_id);
    }

    /// Apply transformation rules to the group, then to its children.
    fn explore_group(&mut self, group_id: GroupId) {
        if self.memo.group(group_id).explored {
            return;
        }
        self.memo.group_mut(group_id).explored = true;

        // Rules may append to this group while we iterate.
        let logical_exprs = self.memo.group(group_id).logical_exprs.clone();
        for expr_id in logical_exprs {
            for (new_op, new_children) in self.fire_rules(expr_id, RuleType::Transformation) {
                let new_expr_id = self.memo.add_expr_to_group(group_id, new_op, new_children);
                trace!("  Created new expr {} in group {}", new_expr_id, group_id);
            }

            let children = self.memo.expr(expr_id).children.clone();
            for child_gid in children {
                self.explore_group(child_gid);
            }
        }
    }

    /// Apply implementation rules, cost every physical alternative and record the
    /// group's winner.
    fn implement_group(&mut self, group_id: GroupId) {
        self.memo.group_mut(group_id).implemented = true;
        self.derive_group_stats(group_id);

        let mut best_cost = Cost::infinite();
        let logical_exprs = self.memo.group(group_id).logical_exprs.clone();

        for expr_id in logical_exprs {
            for (phys_op, phys_children) in self.fire_rules(expr_id, RuleType::Implementation) {
                let phys_expr_id =
                    self.memo
                        .add_expr_to_group(group_id, phys_op, phys_children.clone());

                let Some(cost) = self.cost_expr(group_id, phys_expr_id, &phys_children) else {
                    continue;
                };

                if cost < best_cost {
                    best_cost = cost;
                    self.memo.group_mut(group_id).best_plan = Some(Winner {
                        expr_id: phys_expr_id,
                        cost,
                    });
                    trace!("  New best for group {}: cost={}", group_id, cost);
                } else if cost.is_infinite() {
                    trace!("  Expr {} in group {} has infinite cost", phys_expr_id, group_id);
                }
            }
        }
    }

    /// Optimize the children of a physical expression and cost it. `None` when a
    /// child has no winner. Leaves are costed against their own group's statistics.
    fn cost_expr(
        &mut self,
        group_id: GroupId,
        expr_id: ExprId,
        children: &[GroupId],
    ) -> Option<Cost> {
        let mut child_costs = Vec::with_capacity(children.len());
        let mut child_stats = Vec::with_capacity(children.len());
        if children.is_empty() {
            child_stats.extend(self.memo.group(group_id).stats.clone());
        }
        for &child_gid in children {
            self.optimize_group(child_gid);
            let group = self.memo.group(child_gid);
            let winner = group.best_plan?;
            child_costs.push(winner.cost);
            child_stats.push(group.stats.clone().unwrap_or_else(default_stats));
        }

        let Operator::Physical(op) = &self.memo.expr(expr_id).op else {
            return None;
        };
        let stats_refs: Vec<&Statistics> = child_stats.iter().collect();
        Some(self.cost_model.compute_cost(op, &stats_refs, &child_costs))
    }

    /// Fire every not-yet-applied rule of `rule_type` whose pattern matches
    /// `expr_id`, collecting the alternatives they produce.
    fn fire_rules(
        &mut self,
        expr_id: ExprId,
        rule_type: RuleType,
    ) -> Vec<(Operator, Vec<GroupId>)> {
        let registry = Arc::clone(&self.rule_registry);
        let catalog = Arc::clone(&self.catalog);
        let ctx = OptContext {
            catalog: catalog.as_ref(),
        };

        let mut produced = Vec::new();
        for rule in registry.rules_of_type(rule_type, self.config.source_type.as_deref()) {
            let rule_hash = rule.rule_hash();
            if self.memo.rule_applied(expr_id, rule_hash)
                || !matches(&self.memo, expr_id, &rule.pattern())
            {
                continue;
            }
            if self.budget_exhausted() {
                break;
            }
            self.iterations += 1;

            trace!("Applying rule '{}' to expr {}", rule.name(), expr_id);
            produced.extend(rule.apply(self.memo.expr(expr_id), &self.memo, &ctx));
            self.memo.mark_rule_applied(expr_id, rule_hash);
        }
        produced
    }

    /// Derive and cache statistics for a group from its first logical expression.
    fn derive_group_stats(&mut self, group_id: GroupId) {
        if self.memo.group(group_id).stats.is_some() {
            return;
        }
        if let Some(&expr_id) = self.memo.group(group_id).logical_exprs.first() {
            let stats = self.derive_expr_stats(expr_id);
            self.memo.group_mut(group_id).stats = Some(stats);
        }
    }

    fn child_stats(&mut self, child_gid: GroupId) -> Statistics {
        self.derive_group_stats(child_gid);
        self.memo
            .group(child_gid)
            .stats
            .clone()
            .unwrap_or_else(default_stats)
    }

    fn derive_expr_stats(&mut self, expr_id: ExprId) -> Statistics {
        let expr = self.memo.expr(expr_id);
        let op = expr.op.clone();
        let children = expr.children.clone();

        match &op {
            // A star table is registered with the stats of the join it denotes, if known.
            Operator::Logical(LogicalOp::Scan { table, .. })
            | Operator::Logical(LogicalOp::StarScan { table, .. }) => self
                .catalog
                .get_table_stats(table)
                .unwrap_or_else(default_stats),
            Operator::Logical(LogicalOp::Filter { predicate }) => match children.first() {
                Some(&child_gid) => {
                    let input = self.child_stats(child_gid);
                    let selectivity = estimate_selectivity(predicate, &input);
                    stats::derive_filter_stats(&input, selectivity)
                }
                None => default_stats(),
            },
            Operator::Logical(LogicalOp::Join { condition, .. }) => match children.as_slice() {
                [left, right] => {
                    let left = self.child_stats(*left);
                    let right = self.child_stats(*right);
                    stats::derive_join_stats(&left, &right, &equi_join_columns(condition))
                }
                _ => default_stats(),
            },
            Operator::Logical(LogicalOp::Project { .. }) => match children.first() {
                Some(&child_gid) => self.child_stats(child_gid),
                None => default_stats(),
            },
            Operator::Physical(_) => default_stats(),
        }
    }
}

fn default_stats() -> Statistics {
    Statistics::new(1000.0, 100_000.0)
}

/// Fraction of rows passing `expr`: `1/NDV` for equality, a fixed guess for ranges,
/// product for AND (independence), inclusion-exclusion for OR.
fn estimate_selectivity(expr: &Expr, stats: &Statistics) -> f64 {
    match expr {
        Expr::BinaryOp {
            op: BinaryOp::Eq,
            left,
            right,
        } => match (left.as_ref(), right.as_ref()) {
            (Expr::Column(c), _) | (_, Expr::Column(c)) => stats::equality_selectivity(stats, &c.name),
            _ => stats::DEFAULT_FILTER_SELECTIVITY,
        },
        Expr::BinaryOp {
            op: BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq,
            ..
        } => RANGE_SELECTIVITY,
        Expr::And(conjuncts) => conjuncts
            .iter()
            .map(|c| estimate_selectivity(c, stats))
            .product(),
        Expr::Or(disjuncts) => {
            let miss: f64 = disjuncts
                .iter()
                .map(|d| 1.0 - estimate_selectivity(d, stats))
                .product();
            1.0 - miss
        }
        _ => stats::DEFAULT_FILTER_SELECTIVITY,
    }
}

/// `(left, right)` column-name pairs of the equalities in a join condition.
fn equi_join_columns(condition: &Expr) -> Vec<(String, String)> {
    condition
        .conjuncts()
        .into_iter()
        .filter_map(|c| match c {
            Expr::BinaryOp {
                op: BinaryOp::Eq,
                left,
                right,
            } => match (left.as_ref(), right.as_ref()) {
                (Expr::Column(l), Expr::Column(r)) => Some((l.name.clone(), r.name.clone())),
                _ => None,
            },
            _ => None,
        })
        .collect()
}
