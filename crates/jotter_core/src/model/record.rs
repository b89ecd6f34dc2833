//! Declarative field schemas and record values.
//!
//! # Responsibility
//! - Describe a storage table as a fixed, ordered list of typed fields.
//! - Carry one row's worth of field values plus optional store identity.
//!
//! # Invariants
//! - Field order is declaration order and drives column layout.
//! - `rowid` is absent until the record is first persisted.
//! - A record is an independent value; instances share nothing.

use crate::model::field::{FieldType, FieldValue};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One declared field: a unique name plus an optional semantic type tag.
///
/// A field without a tag is declared as a bare column (no type affinity)
/// and its values pass through coercion untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub field_type: Option<FieldType>,
}

/// Ordered field layout for one record kind, fixed at compile time.
#[derive(Debug, PartialEq, Eq)]
pub struct Schema {
    pub table: &'static str,
    pub fields: &'static [FieldDef],
}

impl Schema {
    /// Position of a field in declaration order, if declared.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }
}

/// A field name was supplied that the schema does not declare.
#[derive(Debug)]
pub struct SchemaError {
    pub table: &'static str,
    pub field: String,
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "no field `{}` on table `{}`", self.field, self.table)
    }
}

impl Error for SchemaError {}

/// One row's typed field values plus an optional store-assigned identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: &'static Schema,
    rowid: Option<i64>,
    values: Vec<FieldValue>,
}

impl Record {
    /// Creates an unpersisted record with every field set to null.
    pub fn new(schema: &'static Schema) -> Self {
        Self {
            schema,
            rowid: None,
            values: vec![FieldValue::Null; schema.fields.len()],
        }
    }

    pub(crate) fn from_parts(
        schema: &'static Schema,
        rowid: Option<i64>,
        values: Vec<FieldValue>,
    ) -> Self {
        Self {
            schema,
            rowid,
            values,
        }
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    /// Store identity; `None` distinguishes a new record from a persisted one.
    pub fn rowid(&self) -> Option<i64> {
        self.rowid
    }

    pub(crate) fn set_rowid(&mut self, rowid: i64) {
        self.rowid = Some(rowid);
    }

    /// Sets one field value, failing fast on names outside the schema.
    pub fn set(&mut self, field: &str, value: FieldValue) -> Result<(), SchemaError> {
        match self.schema.field_index(field) {
            Some(index) => {
                self.values[index] = value;
                Ok(())
            }
            None => Err(SchemaError {
                table: self.schema.table,
                field: field.to_string(),
            }),
        }
    }

    /// Returns one field value, or `None` for names outside the schema.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.schema.field_index(field).map(|index| &self.values[index])
    }

    /// All field values in declaration order.
    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }
}
