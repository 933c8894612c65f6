//! # Filter and Project Implementation Rules
//!
//! One-to-one mappings: a logical `Filter` becomes a streaming `FilterExec` and a
//! logical `Project` becomes a `ProjectExec` over the same input group. A filter or
//! projection over a star scan inherits the star scan's infinite cost, so it is
//! never chosen either.

use optx_core::expr::*;
use optx_core::memo::{GroupId, Memo, MemoExpr};
use optx_core::pattern::Pattern;
use optx_core::rule::{OptContext, Rule, RuleType};

pub struct ImplFilterRule;

impl Rule for ImplFilterRule {
    fn name(&self) -> &str {
        "ImplFilter"
    }

    fn rule_type(&self) -> RuleType {
        RuleType::Implementation
    }

    fn pattern(&self) -> Pattern {
        Pattern::filter()
    }

    fn apply(
        &self,
        expr: &MemoExpr,
        _memo: &Memo,
        _ctx: &OptContext,
    ) -> Vec<(Operator, Vec<GroupId>)> {
        let Operator::Logical(LogicalOp::Filter { predicate }) = &expr.op else {
            return vec![];
        };
        vec![(
            Operator::Physical(PhysicalOp::Filter {
                predicate: predicate.clone(),
            }),
            expr.children.clone(),
        )]
    }
}

pub struct ImplProjectRule;

impl Rule for ImplProjectRule {
    fn name(&self) -> &str {
        "ImplProject"
    }

    fn rule_type(&self) -> RuleType {
        RuleType::Implementation
    }

    fn pattern(&self) -> Pattern {
        Pattern::project()
    }

    fn apply(
        &self,
        expr: &MemoExpr,
        _memo: &Memo,
        _ctx: &OptContext,
    ) -> Vec<(Operator, Vec<GroupId>)> {
        let Operator::Logical(LogicalOp::Project { exprs, aliases }) = &expr.op else {
            return vec![];
        };
        vec![(
            Operator::Physical(PhysicalOp::Project {
                exprs: exprs.clone(),
                aliases: aliases.clone(),
            }),
            expr.children.clone(),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optx_core::catalog::InMemoryCatalog;

    #[test]
    fn test_filter_and_project_keep_their_input() {
        let mut memo = Memo::new();
        let (input, _) = memo.add_expr(
            Operator::Logical(LogicalOp::Scan {
                table: TableRef::new("s", "t"),
                columns: vec![],
                predicate: None,
            }),
            vec![],
        );
        let predicate = Expr::Literal(ScalarValue::Bool(true));
        let (_, filter) = memo.add_expr(
            Operator::Logical(LogicalOp::Filter {
                predicate: predicate.clone(),
            }),
            vec![input],
        );
        let (_, project) = memo.add_expr(
            Operator::Logical(LogicalOp::Project {
                exprs: vec![predicate.clone()],
                aliases: vec!["flag".into()],
            }),
            vec![input],
        );
        let catalog = InMemoryCatalog::new();
        let ctx = OptContext { catalog: &catalog };

        let out = ImplFilterRule.apply(memo.expr(filter), &memo, &ctx);
        assert_eq!(
            out,
            vec![(Operator::Physical(PhysicalOp::Filter { predicate }), vec![input])]
        );
        let out = ImplProjectRule.apply(memo.expr(project), &memo, &ctx);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].1, vec![input]);
        assert!(ImplFilterRule.apply(memo.expr(project), &memo, &ctx).is_empty());
    }
}
