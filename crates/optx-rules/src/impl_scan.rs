//! # Scan Implementation Rules
//!
//! - [`ImplSeqScanRule`] maps a logical `Scan` to a physical `SeqScan`.
//! - [`ImplStarScanRule`] maps a logical `StarScan` to the physical `StarScan`
//!   placeholder.
//!
//! A physical star scan is not executable: the cost model prices it at the infinite
//! sentinel, so it only appears in the memo as a marker that a star table was
//! referenced directly. If a substitution rule rewrote the star table onto a
//! materialization or back into its join, that alternative wins instead; otherwise
//! the group has no plan.

use optx_core::expr::*;
use optx_core::memo::{GroupId, Memo, MemoExpr};
use optx_core::pattern::Pattern;
use optx_core::rule::{OptContext, Rule, RuleType};
use tracing::trace;

/// Implement a logical scan as a sequential (full) table scan.
pub struct ImplSeqScanRule;

impl Rule for ImplSeqScanRule {
    fn name(&self) -> &str {
        "ImplSeqScan"
    }

    fn rule_type(&self) -> RuleType {
        RuleType::Implementation
    }

    fn pattern(&self) -> Pattern {
        Pattern::scan()
    }

    fn apply(
        &self,
        expr: &MemoExpr,
        _memo: &Memo,
        _ctx: &OptContext,
    ) -> Vec<(Operator, Vec<GroupId>)> {
        let Operator::Logical(LogicalOp::Scan {
            table,
            columns,
            predicate,
        }) = &expr.op
        else {
            return vec![];
        };

        vec![(
            Operator::Physical(PhysicalOp::SeqScan {
                table: table.clone(),
                columns: columns.clone(),
                predicate: predicate.clone(),
            }),
            vec![],
        )]
    }
}

/// Implement a logical star scan as the infinitely priced physical placeholder.
pub struct ImplStarScanRule;

impl Rule for ImplStarScanRule {
    fn name(&self) -> &str {
        "ImplStarScan"
    }

    fn rule_type(&self) -> RuleType {
        RuleType::Implementation
    }

    fn pattern(&self) -> Pattern {
        Pattern::star_scan()
    }

    fn apply(
        &self,
        expr: &MemoExpr,
        _memo: &Memo,
        _ctx: &OptContext,
    ) -> Vec<(Operator, Vec<GroupId>)> {
        let Operator::Logical(LogicalOp::StarScan { table, columns }) = &expr.op else {
            return vec![];
        };
        trace!("Star table {} referenced directly in group {}", table, expr.group);

        vec![(
            Operator::Physical(PhysicalOp::StarScan {
                table: table.clone(),
                columns: columns.clone(),
            }),
            vec![],
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optx_core::catalog::InMemoryCatalog;

    #[test]
    fn test_star_scan_keeps_table_and_columns() {
        let columns = vec![ColumnRef {
            table: None,
            name: "id".into(),
            index: 0,
        }];
        let mut memo = Memo::new();
        let (_, expr_id) = memo.add_expr(
            Operator::Logical(LogicalOp::StarScan {
                table: TableRef::new("mv", "star"),
                columns: columns.clone(),
            }),
            vec![],
        );
        let catalog = InMemoryCatalog::new();
        let ctx = OptContext { catalog: &catalog };

        let out = ImplStarScanRule.apply(memo.expr(expr_id), &memo, &ctx);
        assert_eq!(out.len(), 1);
        assert_eq!(
            out[0].0,
            Operator::Physical(PhysicalOp::StarScan {
                table: TableRef::new("mv", "star"),
                columns,
            })
        );
        assert!(out[0].1.is_empty());

        // A star scan is not a base table scan.
        assert!(ImplSeqScanRule.apply(memo.expr(expr_id), &memo, &ctx).is_empty());
    }
}
