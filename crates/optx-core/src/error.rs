//! # Optimizer Errors
//!
//! Errors raised while building planning-time metadata: row types, star tables and
//! catalog lookups. The Cascades search itself is infallible (an unplannable group
//! simply has no winner), so these errors surface at the edges where the optimizer
//! assembles its inputs.
//!
//! Failures reported by a constituent table or by the type factory are passed
//! through unchanged; nothing here attempts local recovery.

use crate::expr::TableRef;

/// Errors produced by the optimizer core.
#[derive(Debug, thiserror::Error)]
pub enum OptError {
    /// A star table must have at least one constituent.
    #[error("star table must contain at least one table")]
    EmptyStarTable,

    /// The same table handle was supplied twice to one star table.
    #[error("star table {star} already contains table {table}")]
    DuplicateConstituent { star: String, table: String },

    /// `column_offset` was asked about a table that is not a direct constituent.
    #[error("star table {star} does not contain table {table}")]
    NotAConstituent { star: String, table: String },

    /// A constituent's row type no longer has the field count recorded when the
    /// star table was built.
    #[error("table {table} has {actual} fields, star table recorded {expected}")]
    FieldCountMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },

    /// The type factory rejected a row type.
    #[error("invalid row type: {0}")]
    InvalidRowType(String),

    /// A table reference could not be resolved in the catalog.
    #[error("unknown table {0}")]
    UnknownTable(TableRef),
}

pub type Result<T> = std::result::Result<T, OptError>;
