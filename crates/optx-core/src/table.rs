//! # Tables and Table Handles
//!
//! A [`Table`] is anything that can report a row type. The optimizer never looks
//! inside a table; it only asks for its row type under the session's
//! [`TypeFactory`].
//!
//! ## Identity
//!
//! Tables are compared by *handle*, not by value. [`TableHandle::new`] assigns a
//! fresh [`TableId`] from a process-wide counter; clones of a handle share the id.
//! Two tables with identical schemas wrapped in two handles are two different
//! tables, which is what star-table membership relies on.
//!
//! ## Translation
//!
//! Tables that know how to appear in a plan implement [`TranslatableTable`]: given
//! a [`ToRelContext`] and the name the table is registered under, they produce the
//! logical leaf operator that reads them.

use crate::error::Result;
use crate::expr::{ColumnRef, LogicalOp, Operator, TableRef};
use crate::types::{DataType, RowType, TypeFactory};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_TABLE_ID: AtomicU64 = AtomicU64::new(1);

fn next_table_id() -> TableId {
    TableId(NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed))
}

/// A relation the optimizer can ask for a row type.
pub trait Table: fmt::Debug + Send + Sync {
    /// Human-readable name, used in diagnostics.
    fn name(&self) -> &str;

    /// Row type of this table. Must be deterministic for a fixed factory.
    fn row_type(&self, type_factory: &dyn TypeFactory) -> Result<RowType>;
}

/// Context handed to [`TranslatableTable::to_rel`].
pub struct ToRelContext<'a> {
    pub type_factory: &'a dyn TypeFactory,
}

/// A table that can produce its own plan leaf.
pub trait TranslatableTable {
    /// Build the logical operator that reads this table, registered as `table`.
    fn to_rel(&self, ctx: &ToRelContext<'_>, table: &TableRef) -> Result<Operator>;
}

/// Stable identity of a table handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableId(pub u64);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shared, identity-carrying reference to a table.
#[derive(Debug, Clone)]
pub struct TableHandle {
    id: TableId,
    table: Arc<dyn Table>,
}

impl TableHandle {
    /// Wrap `table` under a new identity.
    pub fn new(table: impl Table + 'static) -> Self {
        Self::from_arc(Arc::new(table))
    }

    pub fn from_arc(table: Arc<dyn Table>) -> Self {
        Self {
            id: next_table_id(),
            table,
        }
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn table(&self) -> &dyn Table {
        self.table.as_ref()
    }

    pub fn name(&self) -> &str {
        self.table.name()
    }

    pub fn row_type(&self, type_factory: &dyn TypeFactory) -> Result<RowType> {
        self.table.row_type(type_factory)
    }
}

impl PartialEq for TableHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TableHandle {}

impl Hash for TableHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.table.name(), self.id)
    }
}

/// Base table with a fixed schema, held in memory.
#[derive(Debug, Clone)]
pub struct MemoryTable {
    name: String,
    fields: Vec<(String, DataType)>,
}

impl MemoryTable {
    pub fn new<I, S>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (S, DataType)>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            fields: fields.into_iter().map(|(n, t)| (n.into(), t)).collect(),
        }
    }
}

impl Table for MemoryTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn row_type(&self, type_factory: &dyn TypeFactory) -> Result<RowType> {
        let (names, types): (Vec<String>, Vec<DataType>) = self.fields.iter().cloned().unzip();
        type_factory.create_struct_type(types, names)
    }
}

impl TranslatableTable for MemoryTable {
    fn to_rel(&self, ctx: &ToRelContext<'_>, table: &TableRef) -> Result<Operator> {
        let row_type = self.row_type(ctx.type_factory)?;
        Ok(Operator::Logical(LogicalOp::Scan {
            table: table.clone(),
            columns: columns_of(&row_type, Some(&table.name)),
            predicate: None,
        }))
    }
}

/// Column references for every field of `row_type`, in order.
pub fn columns_of(row_type: &RowType, table: Option<&str>) -> Vec<ColumnRef> {
    row_type
        .fields()
        .iter()
        .map(|f| ColumnRef {
            table: table.map(str::to_string),
            name: f.name.clone(),
            index: f.index as u32,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DefaultTypeFactory;

    fn orders() -> MemoryTable {
        MemoryTable::new("orders", [("id", DataType::Int64), ("total", DataType::Float64)])
    }

    #[test]
    fn test_handles_compare_by_identity() {
        let a = TableHandle::new(orders());
        let b = TableHandle::new(orders());
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert!(a.id() < b.id());
    }

    #[test]
    fn test_memory_table_row_type() {
        let factory = DefaultTypeFactory::new();
        let rt = orders().row_type(&factory).unwrap();
        assert_eq!(rt.field_names(), vec!["id", "total"]);
    }

    #[test]
    fn test_memory_table_to_rel_is_scan() {
        let factory = DefaultTypeFactory::new();
        let ctx = ToRelContext {
            type_factory: &factory,
        };
        let op = orders()
            .to_rel(&ctx, &TableRef::new("sales", "orders"))
            .unwrap();
        let Operator::Logical(LogicalOp::Scan { columns, .. }) = op else {
            panic!("expected a scan");
        };
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[1].index, 1);
        assert_eq!(columns[1].table.as_deref(), Some("orders"));
    }
}
