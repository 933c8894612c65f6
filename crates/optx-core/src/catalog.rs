//! # Catalog Interface
//!
//! The catalog gives the optimizer table metadata: column definitions and
//! statistics for base tables, and the star tables that materialized-view analysis
//! has registered for the current planning session.
//!
//! Tables are identified by [`TableRef`] (schema + name). Lookups return `None` for
//! unknown tables; the search falls back to default statistics in that case.
//!
//! Star tables are registered with [`InMemoryCatalog::add_star_table`], which reads
//! the star table's row type once so that `get_table_columns` can answer for the
//! star table like for any other relation. A registered star table is immutable;
//! registering an extended shape means registering the new value under a new name.

use crate::error::Result;
use crate::expr::{ColumnRef, TableRef};
use crate::star::StarTable;
use crate::stats::Statistics;
use crate::table::columns_of;
use crate::types::TypeFactory;
use std::collections::HashMap;
use tracing::debug;

/// Catalog provides schema and statistics information.
pub trait Catalog: Send + Sync {
    fn get_table_stats(&self, table: &TableRef) -> Option<Statistics>;
    fn get_table_columns(&self, table: &TableRef) -> Option<Vec<ColumnRef>>;

    /// Star table registered under `table`, if any.
    fn get_star_table(&self, _table: &TableRef) -> Option<StarTable> {
        None
    }
}

/// HashMap-backed catalog, populated programmatically.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    /// Table-level statistics keyed by "schema.table".
    pub table_stats: HashMap<String, Statistics>,
    /// Column definitions keyed by "schema.table".
    pub table_columns: HashMap<String, Vec<ColumnRef>>,
    /// Star tables keyed by "schema.table".
    pub star_tables: HashMap<String, StarTable>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(&mut self, table: &TableRef, columns: Vec<ColumnRef>, stats: Statistics) {
        let key = table.to_string();
        self.table_columns.insert(key.clone(), columns);
        self.table_stats.insert(key, stats);
    }

    /// Register `star` under `table`. Statistics are optional: the star scan is
    /// never costed on them, but parents of a rewritten scan may be.
    pub fn add_star_table(
        &mut self,
        table: &TableRef,
        star: StarTable,
        stats: Option<Statistics>,
        type_factory: &dyn TypeFactory,
    ) -> Result<()> {
        let row_type = star.row_type(type_factory)?;
        let key = table.to_string();
        debug!("Registering {} as {} ({} fields)", star, key, row_type.field_count());
        self.table_columns
            .insert(key.clone(), columns_of(&row_type, Some(&table.name)));
        if let Some(stats) = stats {
            self.table_stats.insert(key.clone(), stats);
        }
        self.star_tables.insert(key, star);
        Ok(())
    }
}

impl Catalog for InMemoryCatalog {
    fn get_table_stats(&self, table: &TableRef) -> Option<Statistics> {
        self.table_stats.get(&table.to_string()).cloned()
    }

    fn get_table_columns(&self, table: &TableRef) -> Option<Vec<ColumnRef>> {
        self.table_columns.get(&table.to_string()).cloned()
    }

    fn get_star_table(&self, table: &TableRef) -> Option<StarTable> {
        self.star_tables.get(&table.to_string()).cloned()
    }
}
