//! # Join Implementation Rules
//!
//! ## Hash Join (`ImplHashJoinRule`)
//!
//! Builds a hash table on one input and probes it with the other. Two alternatives
//! are produced per join (build-left and build-right) so the cost model can put
//! the smaller input on the build side. Needs at least one column-to-column
//! equality, except for cross joins.
//!
//! ## Nested Loop Join (`ImplNestedLoopJoinRule`)
//!
//! Compares every pair of rows. Accepts any condition, so it is the fallback when
//! no equi-join predicate exists; its `O(left * right)` cost keeps it out of plans
//! where a hash join applies.

use optx_core::expr::*;
use optx_core::memo::{GroupId, Memo, MemoExpr};
use optx_core::pattern::Pattern;
use optx_core::rule::{OptContext, Rule, RuleType};

/// Implement a logical join as a hash join, in both build orientations.
pub struct ImplHashJoinRule;

impl Rule for ImplHashJoinRule {
    fn name(&self) -> &str {
        "ImplHashJoin"
    }

    fn rule_type(&self) -> RuleType {
        RuleType::Implementation
    }

    fn pattern(&self) -> Pattern {
        Pattern::join()
    }

    fn apply(
        &self,
        expr: &MemoExpr,
        _memo: &Memo,
        _ctx: &OptContext,
    ) -> Vec<(Operator, Vec<GroupId>)> {
        let Operator::Logical(LogicalOp::Join {
            join_type,
            condition,
        }) = &expr.op
        else {
            return vec![];
        };

        if expr.children.len() != 2 {
            return vec![];
        }
        if !has_equi_predicate(condition) && *join_type != JoinType::Cross {
            return vec![];
        }

        [BuildSide::Right, BuildSide::Left]
            .into_iter()
            .map(|build_side| {
                (
                    Operator::Physical(PhysicalOp::HashJoin {
                        join_type: *join_type,
                        build_side,
                        condition: condition.clone(),
                    }),
                    expr.children.clone(),
                )
            })
            .collect()
    }
}

/// Implement a logical join as a nested loop join.
pub struct ImplNestedLoopJoinRule;

impl Rule for ImplNestedLoopJoinRule {
    fn name(&self) -> &str {
        "ImplNestedLoopJoin"
    }

    fn rule_type(&self) -> RuleType {
        RuleType::Implementation
    }

    fn pattern(&self) -> Pattern {
        Pattern::join()
    }

    fn apply(
        &self,
        expr: &MemoExpr,
        _memo: &Memo,
        _ctx: &OptContext,
    ) -> Vec<(Operator, Vec<GroupId>)> {
        let Operator::Logical(LogicalOp::Join {
            join_type,
            condition,
        }) = &expr.op
        else {
            return vec![];
        };

        vec![(
            Operator::Physical(PhysicalOp::NestedLoopJoin {
                join_type: *join_type,
                condition: condition.clone(),
            }),
            expr.children.clone(),
        )]
    }
}

/// Whether some conjunct of `expr` is a column-to-column equality.
fn has_equi_predicate(expr: &Expr) -> bool {
    expr.conjuncts().into_iter().any(|c| {
        matches!(
            c,
            Expr::BinaryOp {
                op: BinaryOp::Eq,
                left,
                right,
            } if matches!((left.as_ref(), right.as_ref()), (Expr::Column(_), Expr::Column(_)))
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use optx_core::catalog::InMemoryCatalog;

    fn col(table: &str, name: &str) -> Box<Expr> {
        Box::new(Expr::Column(ColumnRef {
            table: Some(table.into()),
            name: name.into(),
            index: 0,
        }))
    }

    fn scan(name: &str) -> Operator {
        Operator::Logical(LogicalOp::Scan {
            table: TableRef::new("s", name),
            columns: vec![],
            predicate: None,
        })
    }

    #[test]
    fn test_has_equi_predicate() {
        let equi = Expr::BinaryOp {
            op: BinaryOp::Eq,
            left: col("a", "x"),
            right: col("b", "y"),
        };
        let range = Expr::BinaryOp {
            op: BinaryOp::Lt,
            left: col("a", "x"),
            right: Box::new(Expr::Literal(ScalarValue::Int64(10))),
        };
        assert!(has_equi_predicate(&equi));
        assert!(!has_equi_predicate(&range));
        assert!(has_equi_predicate(&Expr::And(vec![range.clone(), equi])));
        assert!(!has_equi_predicate(&Expr::And(vec![range])));
    }

    #[test]
    fn test_hash_join_needs_equi_predicate() {
        let mut memo = Memo::new();
        let (a, _) = memo.add_expr(scan("a"), vec![]);
        let (b, _) = memo.add_expr(scan("b"), vec![]);
        let join = |condition| {
            Operator::Logical(LogicalOp::Join {
                join_type: JoinType::Inner,
                condition,
            })
        };
        let (_, theta) = memo.add_expr(
            join(Expr::BinaryOp {
                op: BinaryOp::Lt,
                left: col("a", "x"),
                right: col("b", "y"),
            }),
            vec![a, b],
        );
        let (_, equi) = memo.add_expr(
            join(Expr::BinaryOp {
                op: BinaryOp::Eq,
                left: col("a", "x"),
                right: col("b", "y"),
            }),
            vec![a, b],
        );
        let catalog = InMemoryCatalog::new();
        let ctx = OptContext { catalog: &catalog };

        assert!(ImplHashJoinRule.apply(memo.expr(theta), &memo, &ctx).is_empty());
        assert_eq!(ImplNestedLoopJoinRule.apply(memo.expr(theta), &memo, &ctx).len(), 1);

        let hash = ImplHashJoinRule.apply(memo.expr(equi), &memo, &ctx);
        assert_eq!(hash.len(), 2);
        assert!(hash.iter().all(|(_, children)| children == &vec![a, b]));
    }
}
