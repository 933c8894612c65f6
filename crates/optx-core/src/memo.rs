//! # Memo
//!
//! The memo holds the whole search space compactly. Expressions that compute the
//! same result live in one **group**; an expression's children are group ids, not
//! concrete subplans, so every alternative of a child is implicitly available to
//! every parent.
//!
//! ## Deduplication
//!
//! Expressions are interned by `(operator, children)`. Inserting an expression that
//! already exists returns the existing id, which is what keeps transformation rules
//! such as join commutativity from growing the memo without bound.
//!
//! ## Winners
//!
//! After the implement phase each group may hold a [`Winner`]: the cheapest
//! physical expression found for it. A group whose only physical alternatives are
//! infinitely priced (star scans) has no winner, and any parent that depends on it
//! is infeasible.

use crate::cost::Cost;
use crate::expr::Operator;
use crate::stats::Statistics;
use std::collections::{HashMap, HashSet};
use std::fmt::Write;

pub type GroupId = u32;
pub type ExprId = u32;

/// An operator plus the groups that feed it.
#[derive(Debug, Clone)]
pub struct MemoExpr {
    pub op: Operator,
    pub children: Vec<GroupId>,
    pub group: GroupId,
}

/// Cheapest physical expression found for a group.
#[derive(Debug, Clone, Copy)]
pub struct Winner {
    pub expr_id: ExprId,
    pub cost: Cost,
}

/// A set of logically equivalent expressions.
#[derive(Debug, Clone)]
pub struct Group {
    pub id: GroupId,
    pub logical_exprs: Vec<ExprId>,
    pub physical_exprs: Vec<ExprId>,
    /// Set once transformation rules have been applied to this group.
    pub explored: bool,
    /// Set once implementation rules have been applied and a winner (if any) chosen.
    pub implemented: bool,
    pub best_plan: Option<Winner>,
    pub stats: Option<Statistics>,
}

impl Group {
    fn new(id: GroupId) -> Self {
        Self {
            id,
            logical_exprs: Vec::new(),
            physical_exprs: Vec::new(),
            explored: false,
            implemented: false,
            best_plan: None,
            stats: None,
        }
    }
}

/// An extracted physical plan.
#[derive(Debug, Clone)]
pub struct PlanNode {
    pub op: Operator,
    pub children: Vec<PlanNode>,
    /// Cost of this subtree.
    pub cost: Cost,
}

impl PlanNode {
    /// Indented, one operator per line.
    pub fn display(&self, indent: usize) -> String {
        let mut out = String::new();
        self.write_to(&mut out, indent);
        out
    }

    fn write_to(&self, out: &mut String, indent: usize) {
        let _ = writeln!(out, "{}{} (cost={})", "  ".repeat(indent), self.op, self.cost);
        for child in &self.children {
            child.write_to(out, indent + 1);
        }
    }

    /// Whether any node in this plan satisfies `pred`.
    pub fn any(&self, pred: &impl Fn(&Operator) -> bool) -> bool {
        pred(&self.op) || self.children.iter().any(|c| c.any(pred))
    }
}

/// The memo table.
#[derive(Debug, Default)]
pub struct Memo {
    groups: Vec<Group>,
    exprs: Vec<MemoExpr>,
    index: HashMap<(Operator, Vec<GroupId>), ExprId>,
    applied_rules: HashSet<(ExprId, u64)>,
}

impl Memo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    pub fn num_exprs(&self) -> usize {
        self.exprs.len()
    }

    /// # Panics
    /// Panics if `id` was not issued by this memo.
    pub fn group(&self, id: GroupId) -> &Group {
        &self.groups[id as usize]
    }

    pub fn group_mut(&mut self, id: GroupId) -> &mut Group {
        &mut self.groups[id as usize]
    }

    pub fn expr(&self, id: ExprId) -> &MemoExpr {
        &self.exprs[id as usize]
    }

    /// Insert an expression into a new group, or return the existing one.
    pub fn add_expr(&mut self, op: Operator, children: Vec<GroupId>) -> (GroupId, ExprId) {
        if let Some(&expr_id) = self.index.get(&(op.clone(), children.clone())) {
            return (self.exprs[expr_id as usize].group, expr_id);
        }
        let group_id = self.groups.len() as GroupId;
        self.groups.push(Group::new(group_id));
        let expr_id = self.insert(group_id, op, children);
        (group_id, expr_id)
    }

    /// Insert an expression into `group_id`. A duplicate returns the existing id,
    /// even if it lives in another group.
    pub fn add_expr_to_group(
        &mut self,
        group_id: GroupId,
        op: Operator,
        children: Vec<GroupId>,
    ) -> ExprId {
        if let Some(&expr_id) = self.index.get(&(op.clone(), children.clone())) {
            return expr_id;
        }
        self.insert(group_id, op, children)
    }

    fn insert(&mut self, group_id: GroupId, op: Operator, children: Vec<GroupId>) -> ExprId {
        let expr_id = self.exprs.len() as ExprId;
        let logical = op.is_logical();
        self.index.insert((op.clone(), children.clone()), expr_id);
        self.exprs.push(MemoExpr {
            op,
            children,
            group: group_id,
        });
        let group = self.group_mut(group_id);
        if logical {
            group.logical_exprs.push(expr_id);
        } else {
            group.physical_exprs.push(expr_id);
        }
        expr_id
    }

    pub fn rule_applied(&self, expr_id: ExprId, rule_hash: u64) -> bool {
        self.applied_rules.contains(&(expr_id, rule_hash))
    }

    pub fn mark_rule_applied(&mut self, expr_id: ExprId, rule_hash: u64) {
        self.applied_rules.insert((expr_id, rule_hash));
    }

    /// Materialize the winning plan rooted at `group_id`.
    pub fn extract_best_plan(&self, group_id: GroupId) -> Option<PlanNode> {
        let winner = self.group(group_id).best_plan?;
        let expr = self.expr(winner.expr_id);
        let children = expr
            .children
            .iter()
            .map(|&child| self.extract_best_plan(child))
            .collect::<Option<Vec<_>>>()?;
        Some(PlanNode {
            op: expr.op.clone(),
            children,
            cost: winner.cost,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::*;

    fn scan(name: &str) -> Operator {
        Operator::Logical(LogicalOp::Scan {
            table: TableRef::new("s", name),
            columns: vec![],
            predicate: None,
        })
    }

    #[test]
    fn test_add_expr_deduplicates() {
        let mut memo = Memo::new();
        let (g1, e1) = memo.add_expr(scan("a"), vec![]);
        let (g2, e2) = memo.add_expr(scan("a"), vec![]);
        assert_eq!((g1, e1), (g2, e2));
        assert_eq!(memo.num_groups(), 1);

        let (g3, _) = memo.add_expr(scan("b"), vec![]);
        assert_ne!(g1, g3);
        assert_eq!(memo.group(g1).logical_exprs, vec![e1]);
    }

    #[test]
    fn test_physical_exprs_are_tracked_separately() {
        let mut memo = Memo::new();
        let (g, _) = memo.add_expr(scan("a"), vec![]);
        let phys = Operator::Physical(PhysicalOp::SeqScan {
            table: TableRef::new("s", "a"),
            columns: vec![],
            predicate: None,
        });
        let e = memo.add_expr_to_group(g, phys.clone(), vec![]);
        assert_eq!(memo.group(g).physical_exprs, vec![e]);
        assert_eq!(memo.add_expr_to_group(g, phys, vec![]), e);
        assert_eq!(memo.num_exprs(), 2);
    }

    #[test]
    fn test_extract_requires_winners_all_the_way_down() {
        let mut memo = Memo::new();
        let (leaf, _) = memo.add_expr(scan("a"), vec![]);
        let filter = Operator::Logical(LogicalOp::Filter {
            predicate: Expr::Literal(ScalarValue::Bool(true)),
        });
        let (root, _) = memo.add_expr(filter, vec![leaf]);
        let phys = memo.add_expr_to_group(
            root,
            Operator::Physical(PhysicalOp::Filter {
                predicate: Expr::Literal(ScalarValue::Bool(true)),
            }),
            vec![leaf],
        );
        memo.group_mut(root).best_plan = Some(Winner {
            expr_id: phys,
            cost: Cost::new(10.0),
        });
        assert!(memo.extract_best_plan(root).is_none());

        let seq = memo.add_expr_to_group(
            leaf,
            Operator::Physical(PhysicalOp::SeqScan {
                table: TableRef::new("s", "a"),
                columns: vec![],
                predicate: None,
            }),
            vec![],
        );
        memo.group_mut(leaf).best_plan = Some(Winner {
            expr_id: seq,
            cost: Cost::new(5.0),
        });
        let plan = memo.extract_best_plan(root).unwrap();
        assert_eq!(plan.children.len(), 1);
        assert_eq!(plan.display(0), "FilterExec (cost=10.0)\n  SeqScan(s.a) (cost=5.0)\n");
    }
}
