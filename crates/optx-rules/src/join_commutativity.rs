//! # Join Commutativity Rule
//!
//! `A JOIN B = B JOIN A` for inner and cross joins. Both orientations end up in the
//! same memo group, so the implementation rules see each input on each side and the
//! cost model can pick the cheaper arrangement. Outer, semi and anti joins have a
//! preserved side and are left alone.
//!
//! Equalities in the condition are mirrored along with the inputs, so `A.x = B.y`
//! becomes `B.y = A.x` and the left operand keeps referring to the left input.

use optx_core::expr::*;
use optx_core::memo::{GroupId, Memo, MemoExpr};
use optx_core::pattern::Pattern;
use optx_core::rule::{OptContext, Rule, RuleType};

/// Join commutativity: `A JOIN B -> B JOIN A`.
pub struct JoinCommutativityRule;

impl Rule for JoinCommutativityRule {
    fn name(&self) -> &str {
        "JoinCommutativity"
    }

    fn rule_type(&self) -> RuleType {
        RuleType::Transformation
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

        if !matches!(join_type, JoinType::Inner | JoinType::Cross) {
            return vec![];
        }
        let &[left, right] = expr.children.as_slice() else {
            return vec![];
        };

        let swapped = Operator::Logical(LogicalOp::Join {
            join_type: *join_type,
            condition: mirror_equalities(condition),
        });
        vec![(swapped, vec![right, left])]
    }
}

fn mirror_equalities(expr: &Expr) -> Expr {
    match expr {
        Expr::BinaryOp {
            op: BinaryOp::Eq,
            left,
            right,
        } => Expr::BinaryOp {
            op: BinaryOp::Eq,
            left: right.clone(),
            right: left.clone(),
        },
        Expr::And(conjuncts) => Expr::And(conjuncts.iter().map(mirror_equalities).collect()),
        other => other.clone(),
    }
}
