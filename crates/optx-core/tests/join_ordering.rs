//! Join ordering over a star schema (one fact table, several dimensions).
//!
//! This is the join shape a star table stands for. The plans are written left-deep
//! in query-text order and the search must find a finite plan, explore both input
//! orders of every join and put the small side of each hash join on the build side.

use optx_core::catalog::InMemoryCatalog;
use optx_core::cost::DefaultCostModel;
use optx_core::expr::*;
use optx_core::memo::{Memo, PlanNode};
use optx_core::search::{CascadesSearch, SearchConfig};
use optx_core::stats::{ColumnStatistics, Statistics};
use std::sync::Arc;

fn equi(lt: &str, lc: &str, rt: &str, rc: &str) -> Expr {
    let col = |table: &str, name: &str| {
        Box::new(Expr::Column(ColumnRef {
            table: Some(table.into()),
            name: name.into(),
            index: 0,
        }))
    };
    Expr::BinaryOp {
        op: BinaryOp::Eq,
        left: col(lt, lc),
        right: col(rt, rc),
    }
}

fn scan(name: &str) -> Operator {
    Operator::Logical(LogicalOp::Scan {
        table: TableRef::new("tpcds", name),
        columns: vec![],
        predicate: None,
    })
}

fn join(condition: Expr) -> Operator {
    Operator::Logical(LogicalOp::Join {
        join_type: JoinType::Inner,
        condition,
    })
}

fn add_table(catalog: &mut InMemoryCatalog, name: &str, rows: f64, cols: &[(&str, f64)]) {
    let columns = cols
        .iter()
        .enumerate()
        .map(|(i, (col, _))| ColumnRef {
            table: Some(name.into()),
            name: (*col).into(),
            index: i as u32,
        })
        .collect();
    let stats = cols.iter().fold(Statistics::new(rows, rows * 100.0), |s, (col, ndv)| {
        s.with_column(*col, ColumnStatistics::new(*ndv, 0.0))
    });
    catalog.add_table(&TableRef::new("tpcds", name), columns, stats);
}

fn star_schema_catalog() -> InMemoryCatalog {
    let mut c = InMemoryCatalog::new();
    add_table(&mut c, "store_sales", 2_880_404.0, &[
        ("ss_sold_date_sk", 1823.0),
        ("ss_item_sk", 18_000.0),
        ("ss_store_sk", 12.0),
    ]);
    add_table(&mut c, "date_dim", 73_049.0, &[("d_date_sk", 73_049.0)]);
    add_table(&mut c, "item", 18_000.0, &[("i_item_sk", 18_000.0)]);
    add_table(&mut c, "store", 12.0, &[("s_store_sk", 12.0)]);
    c
}

/// store_sales ⋈ date_dim ⋈ item ⋈ store, left-deep.
fn build_star_join(memo: &mut Memo) -> u32 {
    let (ss, _) = memo.add_expr(scan("store_sales"), vec![]);
    let (d, _) = memo.add_expr(scan("date_dim"), vec![]);
    let (i, _) = memo.add_expr(scan("item"), vec![]);
    let (s, _) = memo.add_expr(scan("store"), vec![]);

    let (g1, _) = memo.add_expr(
        join(equi("store_sales", "ss_sold_date_sk", "date_dim", "d_date_sk")),
        vec![ss, d],
    );
    let (g2, _) = memo.add_expr(
        join(equi("store_sales", "ss_item_sk", "item", "i_item_sk")),
        vec![g1, i],
    );
    let (g3, _) = memo.add_expr(
        join(equi("store_sales", "ss_store_sk", "store", "s_store_sk")),
        vec![g2, s],
    );
    g3
}

fn search(memo: Memo) -> CascadesSearch {
    CascadesSearch::new(
        memo,
        Arc::new(optx_rules::default_rule_registry()),
        Arc::new(DefaultCostModel::default()),
        Arc::new(star_schema_catalog()),
        SearchConfig::default(),
    )
}

fn collect_ops<'a>(plan: &'a PlanNode, out: &mut Vec<&'a Operator>) {
    out.push(&plan.op);
    for child in &plan.children {
        collect_ops(child, out);
    }
}

#[test]
fn test_star_join_finds_plan() {
    let mut memo = Memo::new();
    let root = build_star_join(&mut memo);
    let mut search = search(memo);

    let plan = search.optimize(root).expect("star join has a plan");
    println!("{}", plan.display(0));

    assert!(!plan.cost.is_infinite());
    let mut ops = Vec::new();
    collect_ops(&plan, &mut ops);
    let joins = ops
        .iter()
        .filter(|op| matches!(op, Operator::Physical(PhysicalOp::HashJoin { .. })))
        .count();
    assert_eq!(joins, 3, "every equi-join should be a hash join");
    assert!(search.iterations() > 0);
}

#[test]
fn test_commutativity_explores_both_orders() {
    let mut memo = Memo::new();
    let root = build_star_join(&mut memo);
    let groups_before = memo.num_groups();
    let mut search = search(memo);
    search.optimize(root).unwrap();

    // Commutativity adds to existing groups and never creates new ones.
    assert_eq!(search.memo.num_groups(), groups_before);
    assert_eq!(search.memo.group(root).logical_exprs.len(), 2);
    assert!(search.memo.group(root).explored);
    assert!(search.memo.group(root).implemented);
}

#[test]
fn test_hash_join_builds_on_small_dimension() {
    let mut memo = Memo::new();
    let (ss, _) = memo.add_expr(scan("store_sales"), vec![]);
    let (s, _) = memo.add_expr(scan("store"), vec![]);
    let (root, _) = memo.add_expr(
        join(equi("store_sales", "ss_store_sk", "store", "s_store_sk")),
        vec![ss, s],
    );
    let mut search = search(memo);
    let plan = search.optimize(root).unwrap();

    let Operator::Physical(PhysicalOp::HashJoin { build_side, .. }) = &plan.op else {
        panic!("expected a hash join, got {}", plan.op);
    };
    // The build side must be the child whose scan reads `store`.
    let build_child = match build_side {
        BuildSide::Left => &plan.children[0],
        BuildSide::Right => &plan.children[1],
    };
    assert!(
        matches!(&build_child.op, Operator::Physical(PhysicalOp::SeqScan { table, .. }) if table.name == "store"),
        "{}",
        plan.display(0)
    );
}
