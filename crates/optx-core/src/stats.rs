//! # Statistics for Cost-Based Optimization
//!
//! Row counts, sizes and per-column NDVs feed the cost model. Base-table
//! statistics come from the catalog; statistics for intermediate groups are derived
//! bottom-up by the search:
//!
//! - **Filter**: `rows * selectivity`, with column NDVs scaled by the same ratio.
//! - **Join**: `|left| * |right| / max(NDV_left_key, NDV_right_key)` per equi-join
//!   column pair (uniform distribution and containment assumptions).
//!
//! Equality selectivity is `1 / NDV`; anything without a better estimate uses
//! [`DEFAULT_FILTER_SELECTIVITY`].

use crate::expr::ScalarValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Selectivity used when nothing better is known.
pub const DEFAULT_FILTER_SELECTIVITY: f64 = 0.1;

/// Row width assumed for an empty input.
const DEFAULT_ROW_WIDTH: f64 = 100.0;

/// Statistics for a relation or a memo group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statistics {
    pub row_count: f64,
    pub total_size_bytes: f64,
    pub column_stats: HashMap<String, ColumnStatistics>,
}

impl Statistics {
    pub fn new(row_count: f64, total_size_bytes: f64) -> Self {
        Self {
            row_count,
            total_size_bytes,
            column_stats: HashMap::new(),
        }
    }

    pub fn with_column(mut self, name: impl Into<String>, stats: ColumnStatistics) -> Self {
        self.column_stats.insert(name.into(), stats);
        self
    }

    /// Average bytes per row.
    pub fn row_width(&self) -> f64 {
        if self.row_count > 0.0 {
            self.total_size_bytes / self.row_count
        } else {
            DEFAULT_ROW_WIDTH
        }
    }

    fn ndv(&self, column: &str) -> f64 {
        self.column_stats
            .get(column)
            .map(|s| s.distinct_count)
            .unwrap_or(self.row_count)
    }
}

/// Per-column statistics, as gathered by ANALYZE.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnStatistics {
    /// Number of distinct values.
    pub distinct_count: f64,
    /// Fraction of NULLs in `[0, 1]`.
    pub null_fraction: f64,
    pub min_value: Option<ScalarValue>,
    pub max_value: Option<ScalarValue>,
    /// Average bytes per value.
    pub avg_row_size: f64,
}

impl ColumnStatistics {
    pub fn new(distinct_count: f64, null_fraction: f64) -> Self {
        Self {
            distinct_count,
            null_fraction,
            min_value: None,
            max_value: None,
            avg_row_size: 8.0,
        }
    }
}

/// Output statistics of an equi-join on `join_columns` (`(left, right)` pairs).
///
/// Each pair divides the cross product by the larger of the two NDVs; a column
/// without statistics is assumed to be unique. The result has at least one row.
pub fn derive_join_stats(
    left: &Statistics,
    right: &Statistics,
    join_columns: &[(String, String)],
) -> Statistics {
    let selectivity: f64 = join_columns
        .iter()
        .map(|(l, r)| 1.0 / left.ndv(l).max(right.ndv(r)).max(1.0))
        .product();

    let row_count = (left.row_count * right.row_count * selectivity).max(1.0);
    let total_size_bytes = row_count * (left.row_width() + right.row_width());

    // NDV cannot exceed the output row count.
    let column_stats = left
        .column_stats
        .iter()
        .chain(right.column_stats.iter())
        .map(|(name, stats)| {
            let mut cs = stats.clone();
            cs.distinct_count = cs.distinct_count.min(row_count);
            (name.clone(), cs)
        })
        .collect();

    Statistics {
        row_count,
        total_size_bytes,
        column_stats,
    }
}

/// Output statistics of a filter with the given selectivity.
pub fn derive_filter_stats(input: &Statistics, selectivity: f64) -> Statistics {
    let row_count = (input.row_count * selectivity).max(1.0);
    let ratio = if input.row_count > 0.0 {
        row_count / input.row_count
    } else {
        1.0
    };

    let column_stats = input
        .column_stats
        .iter()
        .map(|(name, stats)| {
            let mut cs = stats.clone();
            cs.distinct_count = (cs.distinct_count * ratio).max(1.0).min(row_count);
            (name.clone(), cs)
        })
        .collect();

    Statistics {
        row_count,
        total_size_bytes: input.total_size_bytes * ratio,
        column_stats,
    }
}

/// `1 / NDV(column)`, or the default selectivity when the column is unknown.
pub fn equality_selectivity(stats: &Statistics, column: &str) -> f64 {
    stats
        .column_stats
        .get(column)
        .map(|cs| 1.0 / cs.distinct_count.max(1.0))
        .unwrap_or(DEFAULT_FILTER_SELECTIVITY)
}
