//! # optx-core: Cascades Optimizer Core with Star Tables
//!
//! Core data structures and algorithms for a Cascades-style cost-based optimizer,
//! plus the star-table abstraction used while planning materialized-view rewrites.
//!
//! ## Module Overview
//!
//! - **`star`**: [`StarTable`](star::StarTable), a virtual relation concatenating the
//!   columns of several base tables, with structurally shared extension.
//! - **`table`**: The `Table` / `TranslatableTable` traits, identity handles and an
//!   in-memory table.
//! - **`types`**: Row types and the type factory that builds them.
//! - **`uniquify`**: Deterministic renaming of duplicate field names.
//! - **`memo`**: Groups and expressions of the search space.
//! - **`expr`**: Logical, physical and scalar operator definitions.
//! - **`search`**: The explore/implement search with memoization.
//! - **`rule`**: The `Rule` trait and `RuleRegistry`.
//! - **`pattern`**: Declarative pattern matching for rule applicability.
//! - **`cost`**: The `Cost` type (finite or infinite) and the cost model.
//! - **`stats`**: Statistics and cardinality derivation.
//! - **`catalog`**: Table metadata, statistics and star-table lookup.
//! - **`error`**: `OptError` and the crate `Result` alias.

pub mod catalog;
pub mod cost;
pub mod error;
pub mod expr;
pub mod memo;
pub mod pattern;
pub mod rule;
pub mod search;
pub mod star;
pub mod stats;
pub mod table;
pub mod types;
pub mod uniquify;

pub use error::{OptError, Result};
