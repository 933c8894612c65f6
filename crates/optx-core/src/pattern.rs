//! # Declarative Pattern Matching for Optimization Rules
//!
//! Each rule declares the shape it applies to as a [`Pattern`]. The search checks
//! the pattern before calling `apply`, so rules only see expressions they can
//! handle.
//!
//! - `Pattern::Operator(matcher, children)` matches an operator kind and, for every
//!   non-`Any` child pattern, requires at least one expression in the child group
//!   to match (all expressions in a group are equivalent).
//! - `Pattern::Any` matches any group.
//! - `Pattern::Leaf` matches expressions without children.

use crate::expr::{LogicalOpKind, Operator, PhysicalOpKind};
use crate::memo::{ExprId, Memo};

#[derive(Debug, Clone)]
pub enum Pattern {
    Operator(OpMatcher, Vec<Pattern>),
    Any,
    Leaf,
}

/// Matcher on operator kind only.
#[derive(Debug, Clone)]
pub enum OpMatcher {
    LogicalOp(LogicalOpKind),
    PhysicalOp(PhysicalOpKind),
    AnyLogical,
    AnyPhysical,
}

impl Pattern {
    /// Logical join over two arbitrary inputs.
    pub fn join() -> Self {
        Pattern::Operator(
            OpMatcher::LogicalOp(LogicalOpKind::Join),
            vec![Pattern::Any, Pattern::Any],
        )
    }

    pub fn scan() -> Self {
        Pattern::Operator(OpMatcher::LogicalOp(LogicalOpKind::Scan), vec![])
    }

    pub fn star_scan() -> Self {
        Pattern::Operator(OpMatcher::LogicalOp(LogicalOpKind::StarScan), vec![])
    }

    pub fn filter() -> Self {
        Pattern::Operator(
            OpMatcher::LogicalOp(LogicalOpKind::Filter),
            vec![Pattern::Any],
        )
    }

    pub fn project() -> Self {
        Pattern::Operator(
            OpMatcher::LogicalOp(LogicalOpKind::Project),
            vec![Pattern::Any],
        )
    }

    /// Logical join with a star scan directly on one of its inputs.
    pub fn join_over_star_scan() -> Self {
        Pattern::Operator(
            OpMatcher::LogicalOp(LogicalOpKind::Join),
            vec![Pattern::star_scan(), Pattern::Any],
        )
    }
}

/// Check whether the memo expression `expr_id` matches `pattern`.
pub fn matches(memo: &Memo, expr_id: ExprId, pattern: &Pattern) -> bool {
    let expr = memo.expr(expr_id);
    match pattern {
        Pattern::Any => true,
        Pattern::Leaf => expr.children.is_empty(),
        Pattern::Operator(matcher, child_patterns) => {
            let op_matches = match (&expr.op, matcher) {
                (Operator::Logical(l), OpMatcher::LogicalOp(kind)) => l.kind() == *kind,
                (Operator::Physical(p), OpMatcher::PhysicalOp(kind)) => p.kind() == *kind,
                (Operator::Logical(_), OpMatcher::AnyLogical) => true,
                (Operator::Physical(_), OpMatcher::AnyPhysical) => true,
                _ => false,
            };
            if !op_matches || expr.children.len() != child_patterns.len() {
                return false;
            }

            expr.children
                .iter()
                .zip(child_patterns)
                .all(|(&child_gid, child_pattern)| match child_pattern {
                    Pattern::Any => true,
                    _ => {
                        let group = memo.group(child_gid);
                        group
                            .logical_exprs
                            .iter()
                            .chain(group.physical_exprs.iter())
                            .any(|&eid| matches(memo, eid, child_pattern))
                    }
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::*;

    #[test]
    fn test_join_over_star_scan() {
        let mut memo = Memo::new();
        let (star, _) = memo.add_expr(
            Operator::Logical(LogicalOp::StarScan {
                table: TableRef::new("mv", "star"),
                columns: vec![],
            }),
            vec![],
        );
        let (dim, _) = memo.add_expr(
            Operator::Logical(LogicalOp::Scan {
                table: TableRef::new("s", "dim"),
                columns: vec![],
                predicate: None,
            }),
            vec![],
        );
        let join = |join_type| {
            Operator::Logical(LogicalOp::Join {
                join_type,
                condition: Expr::Literal(ScalarValue::Bool(true)),
            })
        };
        let (_, star_first) = memo.add_expr(join(JoinType::Inner), vec![star, dim]);
        let (_, dim_first) = memo.add_expr(join(JoinType::Inner), vec![dim, star]);

        assert!(matches(&memo, star_first, &Pattern::join_over_star_scan()));
        assert!(!matches(&memo, dim_first, &Pattern::join_over_star_scan()));
        assert!(matches(&memo, dim_first, &Pattern::join()));
        assert!(!matches(&memo, star_first, &Pattern::filter()));
    }

    #[test]
    fn test_leaf_and_kind_matchers() {
        let mut memo = Memo::new();
        let (_, e) = memo.add_expr(
            Operator::Logical(LogicalOp::StarScan {
                table: TableRef::new("mv", "star"),
                columns: vec![],
            }),
            vec![],
        );
        assert!(matches(&memo, e, &Pattern::Leaf));
        assert!(matches(&memo, e, &Pattern::star_scan()));
        assert!(!matches(&memo, e, &Pattern::scan()));
        assert!(matches(
            &memo,
            e,
            &Pattern::Operator(OpMatcher::AnyLogical, vec![])
        ));
    }
}
