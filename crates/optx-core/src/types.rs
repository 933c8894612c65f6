//! # Row Types
//!
//! A row type is the ordered list of named, typed fields a relation produces.
//! Tables report their row type through a [`TypeFactory`], which is the
//! type-construction context for one planning session: it decides nullability and
//! validates the shape of the struct types it builds.
//!
//! Field order is significant. Column ordinals in [`crate::expr::ColumnRef`] index
//! into a row type, and a star table's column offsets are sums of constituent
//! field counts.

use crate::error::{OptError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// SQL data types understood by the optimizer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    Int32,
    Int64,
    Float64,
    Decimal { precision: u8, scale: i8 },
    Utf8,
    Date,
    Timestamp,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Boolean => write!(f, "BOOLEAN"),
            DataType::Int32 => write!(f, "INTEGER"),
            DataType::Int64 => write!(f, "BIGINT"),
            DataType::Float64 => write!(f, "DOUBLE"),
            DataType::Decimal { precision, scale } => write!(f, "DECIMAL({precision}, {scale})"),
            DataType::Utf8 => write!(f, "VARCHAR"),
            DataType::Date => write!(f, "DATE"),
            DataType::Timestamp => write!(f, "TIMESTAMP"),
        }
    }
}

/// One field of a row type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelField {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    /// Ordinal of this field within its row type.
    pub index: usize,
}

/// Ordered list of fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowType {
    fields: Vec<RelField>,
}

impl RowType {
    pub fn fields(&self) -> &[RelField] {
        &self.fields
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    pub fn field_types(&self) -> Vec<DataType> {
        self.fields.iter().map(|f| f.data_type.clone()).collect()
    }

    /// Look up a field by exact name.
    pub fn field(&self, name: &str) -> Option<&RelField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl fmt::Display for RowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordType(")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} {}", field.data_type, field.name)?;
        }
        write!(f, ")")
    }
}

/// Builds row types for one planning session.
pub trait TypeFactory: Send + Sync {
    /// Create a struct type from parallel lists of field types and names.
    fn create_struct_type(&self, types: Vec<DataType>, names: Vec<String>) -> Result<RowType>;
}

/// Type factory used by tests and by the in-memory catalog.
///
/// Rejects mismatched type/name lists and empty field names; it does not check for
/// duplicate names (callers that concatenate row types uniquify first).
#[derive(Debug, Clone)]
pub struct DefaultTypeFactory {
    pub nullable_by_default: bool,
}

impl Default for DefaultTypeFactory {
    fn default() -> Self {
        Self {
            nullable_by_default: true,
        }
    }
}

impl DefaultTypeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience for building a row type from `(name, type)` pairs.
    pub fn row_type<I, S>(&self, fields: I) -> Result<RowType>
    where
        I: IntoIterator<Item = (S, DataType)>,
        S: Into<String>,
    {
        let (names, types): (Vec<String>, Vec<DataType>) =
            fields.into_iter().map(|(n, t)| (n.into(), t)).unzip();
        self.create_struct_type(types, names)
    }
}

impl TypeFactory for DefaultTypeFactory {
    fn create_struct_type(&self, types: Vec<DataType>, names: Vec<String>) -> Result<RowType> {
        if types.len() != names.len() {
            return Err(OptError::InvalidRowType(format!(
                "{} types but {} names",
                types.len(),
                names.len()
            )));
        }
        if let Some(pos) = names.iter().position(|n| n.is_empty()) {
            return Err(OptError::InvalidRowType(format!(
                "field {pos} has an empty name"
            )));
        }
        let fields = names
            .into_iter()
            .zip(types)
            .enumerate()
            .map(|(index, (name, data_type))| RelField {
                name,
                data_type,
                nullable: self.nullable_by_default,
                index,
            })
            .collect();
        Ok(RowType { fields })
    }
}
