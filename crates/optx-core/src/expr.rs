//! # Expression and Operator Types
//!
//! This module defines the plan representation the optimizer works on. It is
//! organized into three layers:
//!
//! ## Scalar Expressions (`Expr`)
//! Column references, literals, comparisons, boolean logic and function calls. They
//! appear inside predicates, projections and join conditions.
//!
//! ## Logical Operators (`LogicalOp`)
//! Logical operators describe *what* to compute. Transformation rules rewrite them
//! into equivalent alternatives and implementation rules map them to physical
//! operators. `StarScan` is the logical leaf produced by a star table; it reads a
//! virtual relation that only exists during planning.
//!
//! ## Physical Operators (`PhysicalOp`)
//! Physical operators describe *how* to execute. Each one is costed by the cost
//! model. `PhysicalOp::StarScan` is a placeholder with no execution strategy; the
//! cost model always prices it at the infinite sentinel, so it never wins a group.
//!
//! ## Unified `Operator` Enum
//! The memo stores logical and physical operators uniformly through `Operator`;
//! `OpKind` strips the payload for pattern matching.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Qualified name of a table (or star table) registered in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// Reference to a column, optionally qualified by its table.
///
/// `index` is the ordinal of the column in the row type of the relation that
/// produces it. For a star scan this is the offset into the concatenated row type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub name: String,
    pub index: u32,
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(t) => write!(f, "{}.{}", t, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Constant value appearing in an expression.
///
/// Floats are wrapped in `OrderedFloat` so that expressions can be hashed and
/// compared for memo deduplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int64(i64),
    Float64(OrderedFloat<f64>),
    Utf8(String),
    /// Days since 1970-01-01.
    Date(i32),
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int64(a), Self::Int64(b)) => a == b,
            (Self::Float64(a), Self::Float64(b)) => a == b,
            (Self::Utf8(a), Self::Utf8(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ScalarValue {}

impl Hash for ScalarValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(v) => v.hash(state),
            Self::Int64(v) => v.hash(state),
            Self::Float64(v) => v.hash(state),
            Self::Utf8(v) => v.hash(state),
            Self::Date(v) => v.hash(state),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{}", v.0),
            Self::Utf8(v) => write!(f, "'{v}'"),
            Self::Date(v) => write!(f, "DATE({v})"),
        }
    }
}

/// Scalar expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expr {
    Column(ColumnRef),
    Literal(ScalarValue),
    BinaryOp {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Function {
        name: String,
        args: Vec<Expr>,
    },
    /// Flat conjunction; kept flat so predicates decompose without walking
    /// nested binary ANDs.
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

impl Expr {
    /// Flatten nested ANDs into a list of conjuncts.
    pub fn conjuncts(&self) -> Vec<&Expr> {
        match self {
            Expr::And(exprs) => exprs.iter().flat_map(|e| e.conjuncts()).collect(),
            other => vec![other],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
    IsNull,
    IsNotNull,
}

/// SQL join types. Only `Inner` and `Cross` are commutative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    Semi,
    Anti,
    Cross,
}

/// Which input of a hash join is materialized into the hash table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildSide {
    Left,
    Right,
}

/// Logical operators. Children live in the memo and are referenced by group id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOp {
    /// Scan of a base table. Always a leaf.
    Scan {
        table: TableRef,
        columns: Vec<ColumnRef>,
        predicate: Option<Expr>,
    },
    /// Direct scan of a star table registered under `table`. Always a leaf.
    ///
    /// `columns` is the concatenated, uniquified row type of the star table; a
    /// constituent's columns start at its column offset.
    StarScan {
        table: TableRef,
        columns: Vec<ColumnRef>,
    },
    Filter {
        predicate: Expr,
    },
    Project {
        exprs: Vec<Expr>,
        aliases: Vec<String>,
    },
    Join {
        join_type: JoinType,
        condition: Expr,
    },
}

/// Physical operators. Each has a cost formula in the cost model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhysicalOp {
    /// Full table scan, O(rows).
    SeqScan {
        table: TableRef,
        columns: Vec<ColumnRef>,
        predicate: Option<Expr>,
    },
    /// Placeholder for a star table that was not rewritten onto a materialization.
    /// Not executable; priced at `Cost::infinite()`.
    StarScan {
        table: TableRef,
        columns: Vec<ColumnRef>,
    },
    /// Row-by-row predicate evaluation, O(rows).
    Filter {
        predicate: Expr,
    },
    /// Row-by-row expression evaluation, O(rows).
    Project {
        exprs: Vec<Expr>,
        aliases: Vec<String>,
    },
    /// Build a hash table on `build_side`, probe with the other input.
    /// Needs an equi-join predicate (or a cross join).
    HashJoin {
        join_type: JoinType,
        build_side: BuildSide,
        condition: Expr,
    },
    /// O(left * right) fallback that accepts any condition.
    NestedLoopJoin {
        join_type: JoinType,
        condition: Expr,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Logical(LogicalOp),
    Physical(PhysicalOp),
}

impl Operator {
    pub fn is_logical(&self) -> bool {
        matches!(self, Operator::Logical(_))
    }

    pub fn is_physical(&self) -> bool {
        matches!(self, Operator::Physical(_))
    }

    pub fn kind(&self) -> OpKind {
        match self {
            Operator::Logical(l) => OpKind::Logical(l.kind()),
            Operator::Physical(p) => OpKind::Physical(p.kind()),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Logical(LogicalOp::Scan { table, .. }) => write!(f, "Scan({table})"),
            Operator::Logical(LogicalOp::StarScan { table, columns }) => {
                write!(f, "StarScan({table}, {} columns)", columns.len())
            }
            Operator::Logical(LogicalOp::Filter { .. }) => write!(f, "Filter"),
            Operator::Logical(LogicalOp::Project { aliases, .. }) => {
                write!(f, "Project[{}]", aliases.join(", "))
            }
            Operator::Logical(LogicalOp::Join { join_type, .. }) => write!(f, "Join({join_type:?})"),
            Operator::Physical(PhysicalOp::SeqScan { table, .. }) => write!(f, "SeqScan({table})"),
            Operator::Physical(PhysicalOp::StarScan { table, .. }) => {
                write!(f, "StarTableScan({table})")
            }
            Operator::Physical(PhysicalOp::Filter { .. }) => write!(f, "FilterExec"),
            Operator::Physical(PhysicalOp::Project { aliases, .. }) => {
                write!(f, "ProjectExec[{}]", aliases.join(", "))
            }
            Operator::Physical(PhysicalOp::HashJoin {
                join_type,
                build_side,
                ..
            }) => write!(f, "HashJoin({join_type:?}, build={build_side:?})"),
            Operator::Physical(PhysicalOp::NestedLoopJoin { join_type, .. }) => {
                write!(f, "NestedLoopJoin({join_type:?})")
            }
        }
    }
}

/// Operator discriminant without payload, used by the pattern matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Logical(LogicalOpKind),
    Physical(PhysicalOpKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOpKind {
    Scan,
    StarScan,
    Filter,
    Project,
    Join,
}

impl LogicalOp {
    pub fn kind(&self) -> LogicalOpKind {
        match self {
            LogicalOp::Scan { .. } => LogicalOpKind::Scan,
            LogicalOp::StarScan { .. } => LogicalOpKind::StarScan,
            LogicalOp::Filter { .. } => LogicalOpKind::Filter,
            LogicalOp::Project { .. } => LogicalOpKind::Project,
            LogicalOp::Join { .. } => LogicalOpKind::Join,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhysicalOpKind {
    SeqScan,
    StarScan,
    Filter,
    Project,
    HashJoin,
    NestedLoopJoin,
}

impl PhysicalOp {
    pub fn kind(&self) -> PhysicalOpKind {
        match self {
            PhysicalOp::SeqScan { .. } => PhysicalOpKind::SeqScan,
            PhysicalOp::StarScan { .. } => PhysicalOpKind::StarScan,
            PhysicalOp::Filter { .. } => PhysicalOpKind::Filter,
            PhysicalOp::Project { .. } => PhysicalOpKind::Project,
            PhysicalOp::HashJoin { .. } => PhysicalOpKind::HashJoin,
            PhysicalOp::NestedLoopJoin { .. } => PhysicalOpKind::NestedLoopJoin,
        }
    }
}
