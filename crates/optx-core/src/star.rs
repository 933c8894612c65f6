//! # Star Tables
//!
//! A star table is a virtual relation whose columns are the concatenation of the
//! columns of several constituent tables. Star tables never appear in user queries.
//! The optimizer introduces them while matching queries against materializations:
//! a materialization defined over a join is expressed as a query over a star table,
//! and candidate queries are mapped onto the same star table so the two can be
//! compared column by column.
//!
//! ## Layout
//!
//! ```text
//! constituents:  A [id, name]   B [id, amount]   C [tag]
//! field counts:  2              2                1
//! offsets:       0              2                4
//! row type:      id, name, id_2, amount, tag
//! ```
//!
//! The column offset of constituent *i* is the sum of the field counts before it.
//! Field names are passed through [`uniquify`] so the concatenated row type never
//! has two fields with the same name.
//!
//! ## Immutability
//!
//! Field counts are read once, when a constituent is added, and never change.
//! Constituents form a persistent list: [`StarTable::add`] allocates one node that
//! points at the existing prefix, so star shapes explored on different branches of
//! the search share their common prefix and cannot disturb each other. A star table
//! is `Send + Sync` and cheap to clone.
//!
//! ## Planning
//!
//! [`StarTable::to_rel`] produces a `StarScan` leaf. Its physical counterpart is
//! priced at the infinite cost sentinel, so a plan can only get rid of the star
//! scan by having a substitution rule rewrite it onto a real materialization.

use crate::error::{OptError, Result};
use crate::expr::{LogicalOp, Operator, TableRef};
use crate::table::{columns_of, TableHandle, TableId, ToRelContext, TranslatableTable};
use crate::types::{RowType, TypeFactory};
use crate::uniquify::uniquify;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// One link of the persistent constituent list.
#[derive(Debug)]
struct Constituent {
    table: TableHandle,
    field_count: usize,
    /// Column offset of this constituent's first field.
    offset: usize,
    /// Zero-based position in the star table.
    position: usize,
    prev: Option<Arc<Constituent>>,
}

/// Virtual table composed of two or more tables joined together.
#[derive(Debug, Clone)]
pub struct StarTable {
    last: Arc<Constituent>,
    offsets: Arc<HashMap<TableId, usize>>,
}

impl StarTable {
    /// Build a star table over `tables`, in order.
    ///
    /// Each table's row type is read once under `type_factory` to record its field
    /// count. Fails on an empty list and on a handle that appears twice.
    pub fn new<I>(tables: I, type_factory: &dyn TypeFactory) -> Result<Self>
    where
        I: IntoIterator<Item = TableHandle>,
    {
        let mut last: Option<Arc<Constituent>> = None;
        let mut offsets = HashMap::new();
        for table in tables {
            last = Some(link(last, &mut offsets, table, type_factory)?);
        }
        let last = last.ok_or(OptError::EmptyStarTable)?;
        let star = Self {
            last,
            offsets: Arc::new(offsets),
        };
        debug!(
            "Created {} with {} tables, {} fields",
            star,
            star.len(),
            star.field_count()
        );
        Ok(star)
    }

    /// Return a new star table with `table` appended. `self` is left unchanged.
    pub fn add(&self, table: TableHandle, type_factory: &dyn TypeFactory) -> Result<Self> {
        let mut offsets = HashMap::clone(&self.offsets);
        let last = link(Some(Arc::clone(&self.last)), &mut offsets, table, type_factory)?;
        let star = Self {
            last,
            offsets: Arc::new(offsets),
        };
        debug!("Extended star table to {}", star);
        Ok(star)
    }

    /// Number of constituent tables.
    pub fn len(&self) -> usize {
        self.last.position + 1
    }

    /// Always false; a star table has at least one constituent.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Constituent tables in column order.
    pub fn tables(&self) -> Vec<TableHandle> {
        self.chain().into_iter().map(|c| c.table.clone()).collect()
    }

    /// Field count of each constituent, in column order.
    pub fn field_counts(&self) -> Vec<usize> {
        self.chain().into_iter().map(|c| c.field_count).collect()
    }

    /// Total number of fields in the concatenated row type.
    pub fn field_count(&self) -> usize {
        self.last.offset + self.last.field_count
    }

    pub fn contains(&self, table: &TableHandle) -> bool {
        self.offsets.contains_key(&table.id())
    }

    /// Column offset of the first column of `table` in this star table's row type.
    ///
    /// Membership is by handle identity: a different handle over an identical
    /// schema is not a constituent.
    pub fn column_offset(&self, table: &TableHandle) -> Result<usize> {
        self.offsets
            .get(&table.id())
            .copied()
            .ok_or_else(|| OptError::NotAConstituent {
                star: self.to_string(),
                table: table.to_string(),
            })
    }

    /// Concatenated row type, with duplicate names made unique.
    ///
    /// Recomputed on every call. A constituent whose field count differs from the
    /// one recorded at construction is reported as [`OptError::FieldCountMismatch`].
    pub fn row_type(&self, type_factory: &dyn TypeFactory) -> Result<RowType> {
        let mut types = Vec::with_capacity(self.field_count());
        let mut names = Vec::with_capacity(self.field_count());
        for constituent in self.chain() {
            let row_type = constituent.table.row_type(type_factory)?;
            if row_type.field_count() != constituent.field_count {
                return Err(OptError::FieldCountMismatch {
                    table: constituent.table.to_string(),
                    expected: constituent.field_count,
                    actual: row_type.field_count(),
                });
            }
            types.extend(row_type.field_types());
            names.extend(row_type.field_names());
        }
        let names = uniquify(&names);
        trace!("Row type of {}: {:?}", self, names);
        type_factory.create_struct_type(types, names)
    }

    /// Constituents from first to last.
    fn chain(&self) -> Vec<&Constituent> {
        let mut out = Vec::with_capacity(self.len());
        let mut cur = Some(self.last.as_ref());
        while let Some(c) = cur {
            out.push(c);
            cur = c.prev.as_deref();
        }
        out.reverse();
        out
    }
}

impl TranslatableTable for StarTable {
    /// Produce the star scan leaf for this star table, registered as `table`.
    fn to_rel(&self, ctx: &ToRelContext<'_>, table: &TableRef) -> Result<Operator> {
        let row_type = self.row_type(ctx.type_factory)?;
        Ok(Operator::Logical(LogicalOp::StarScan {
            table: table.clone(),
            columns: columns_of(&row_type, Some(&table.name)),
        }))
    }
}

impl fmt::Display for StarTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_chain(f, Some(self.last.as_ref()))
    }
}

fn write_chain(f: &mut fmt::Formatter<'_>, last: Option<&Constituent>) -> fmt::Result {
    let mut tables = Vec::new();
    let mut cur = last;
    while let Some(c) = cur {
        tables.push(c.table.to_string());
        cur = c.prev.as_deref();
    }
    tables.reverse();
    write!(f, "StarTable({})", tables.join(", "))
}

/// Append `table` after `prev`, recording its offset in `offsets`.
fn link(
    prev: Option<Arc<Constituent>>,
    offsets: &mut HashMap<TableId, usize>,
    table: TableHandle,
    type_factory: &dyn TypeFactory,
) -> Result<Arc<Constituent>> {
    if offsets.contains_key(&table.id()) {
        let star = DisplayChain(prev.as_deref()).to_string();
        return Err(OptError::DuplicateConstituent {
            star,
            table: table.to_string(),
        });
    }
    let field_count = table.row_type(type_factory)?.field_count();
    let (offset, position) = match &prev {
        Some(p) => (p.offset + p.field_count, p.position + 1),
        None => (0, 0),
    };
    offsets.insert(table.id(), offset);
    Ok(Arc::new(Constituent {
        table,
        field_count,
        offset,
        position,
        prev,
    }))
}

struct DisplayChain<'a>(Option<&'a Constituent>);

impl fmt::Display for DisplayChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_chain(f, self.0)
    }
}
