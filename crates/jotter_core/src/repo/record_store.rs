//! Schema-driven record store backed by a full-text-search virtual table.
//!
//! # Responsibility
//! - Generate DDL and DML from a declarative schema via the SQL builder.
//! - Map raw rows back into typed records through field coercion.
//!
//! # Invariants
//! - Columns appear in schema declaration order in every statement.
//! - `insert` assigns the store-generated rowid back onto the record.
//! - `update` requires an identity and reports a checked error without one.

use crate::db::DbError;
use crate::model::field::{coerce, CoerceError, FieldValue};
use crate::model::record::{Record, Schema, SchemaError};
use crate::sql::{Fragment, SqlBuilder};
use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::{Connection, Row, Rows, Statement};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence and row-mapping error for record store operations.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Coerce(CoerceError),
    Schema(SchemaError),
    /// `update` was called on a record that has never been persisted.
    MissingRowid { table: &'static str },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Coerce(err) => write!(f, "{err}"),
            Self::Schema(err) => write!(f, "{err}"),
            Self::MissingRowid { table } => {
                write!(f, "cannot update unpersisted record on table `{table}`")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Coerce(err) => Some(err),
            Self::Schema(err) => Some(err),
            Self::MissingRowid { .. } => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<CoerceError> for StoreError {
    fn from(value: CoerceError) -> Self {
        Self::Coerce(value)
    }
}

impl From<SchemaError> for StoreError {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// SQLite-backed store for one record schema.
pub struct SqliteRecordStore<'conn> {
    conn: &'conn Connection,
    schema: &'static Schema,
}

impl<'conn> SqliteRecordStore<'conn> {
    pub fn new(conn: &'conn Connection, schema: &'static Schema) -> Self {
        Self { conn, schema }
    }

    /// Idempotently creates the backing FTS4 virtual table.
    ///
    /// Fields with a type tag declare `"name" TYPE`; untyped fields declare
    /// a bare quoted identifier, FTS-index style.
    pub fn create_table(&self) -> StoreResult<()> {
        let columns = self
            .schema
            .fields
            .iter()
            .map(|field| match field.field_type {
                Some(tag) => Fragment::concat(vec![
                    Fragment::identifier(field.name),
                    Fragment::raw(format!(" {}", tag.storage_type())),
                ]),
                None => Fragment::identifier(field.name),
            })
            .collect();

        SqlBuilder::with("CREATE VIRTUAL TABLE IF NOT EXISTS ")
            .identifier(self.schema.table)
            .sql(" USING fts4 ")
            .fragment(&Fragment::list(columns))
            .execute(self.conn)?;

        info!(
            "event=table_create module=repo status=ok table={}",
            self.schema.table
        );
        Ok(())
    }

    /// Inserts the record, then assigns the store-generated rowid onto it.
    ///
    /// Values bind as-is, in declaration order; no coercion on the way in.
    pub fn insert(&self, record: &mut Record) -> StoreResult<()> {
        let columns = self.column_identifiers();
        let values = record
            .values()
            .iter()
            .map(|value| Fragment::Literal(value.to_storage()))
            .collect();

        SqlBuilder::with("INSERT INTO ")
            .identifier(self.schema.table)
            .sql(" ")
            .fragment(&Fragment::list(columns))
            .sql(" VALUES ")
            .fragment(&Fragment::list(values))
            .execute(self.conn)?;

        record.set_rowid(self.conn.last_insert_rowid());
        debug!(
            "event=record_insert module=repo status=ok table={} rowid={:?}",
            self.schema.table,
            record.rowid()
        );
        Ok(())
    }

    /// Rebinds every field of an already-persisted record by rowid.
    pub fn update(&self, record: &Record) -> StoreResult<()> {
        let rowid = record.rowid().ok_or(StoreError::MissingRowid {
            table: self.schema.table,
        })?;

        let assignments = self
            .schema
            .fields
            .iter()
            .zip(record.values())
            .map(|(field, value)| {
                Fragment::concat(vec![
                    Fragment::identifier(field.name),
                    Fragment::raw(" = "),
                    Fragment::Literal(value.to_storage()),
                ])
            })
            .collect();

        SqlBuilder::with("UPDATE ")
            .identifier(self.schema.table)
            .sql(" SET ")
            .fragment(&Fragment::joined(assignments))
            .sql(" WHERE rowid = ")
            .literal(rowid)
            .execute(self.conn)?;

        debug!(
            "event=record_update module=repo status=ok table={} rowid={}",
            self.schema.table, rowid
        );
        Ok(())
    }

    /// Persists the record: update when it carries an identity, else insert.
    pub fn save(&self, record: &mut Record) -> StoreResult<()> {
        if record.rowid().is_some() {
            self.update(record)
        } else {
            self.insert(record)
        }
    }

    /// Prepares a lazy, single-pass query over every row of the table.
    pub fn query(&self) -> StoreResult<RecordQuery<'conn>> {
        let mut columns = vec![Fragment::raw("rowid")];
        columns.extend(self.column_identifiers());

        let (sql, params) = SqlBuilder::with("SELECT ")
            .fragment(&Fragment::joined(columns))
            .sql(" FROM ")
            .identifier(self.schema.table)
            .build();
        debug_assert!(params.is_empty());

        let stmt = self.conn.prepare(&sql)?;
        Ok(RecordQuery {
            stmt,
            schema: self.schema,
        })
    }

    /// Eagerly collects every row into records, in storage order.
    pub fn query_all(&self) -> StoreResult<Vec<Record>> {
        let mut query = self.query()?;
        let mut rows = query.rows()?;
        let mut records = Vec::new();
        while let Some(record) = rows.next()? {
            records.push(record);
        }
        Ok(records)
    }

    fn column_identifiers(&self) -> Vec<Fragment> {
        self.schema
            .fields
            .iter()
            .map(|field| Fragment::identifier(field.name))
            .collect()
    }
}

/// A prepared full-table query, consumed once via [`RecordQuery::rows`].
pub struct RecordQuery<'conn> {
    stmt: Statement<'conn>,
    schema: &'static Schema,
}

impl RecordQuery<'_> {
    /// Starts row iteration. Single pass; there is no rewind.
    pub fn rows(&mut self) -> StoreResult<RecordRows<'_>> {
        let rows = self.stmt.query([])?;
        Ok(RecordRows {
            rows,
            schema: self.schema,
        })
    }
}

/// Streaming cursor yielding one coerced [`Record`] per stored row.
pub struct RecordRows<'stmt> {
    rows: Rows<'stmt>,
    schema: &'static Schema,
}

impl RecordRows<'_> {
    /// Advances to the next row, or `None` once the query is exhausted.
    pub fn next(&mut self) -> StoreResult<Option<Record>> {
        match self.rows.next()? {
            Some(row) => Ok(Some(parse_record_row(self.schema, row)?)),
            None => Ok(None),
        }
    }
}

fn parse_record_row(schema: &'static Schema, row: &Row<'_>) -> StoreResult<Record> {
    // rowid carries through uncoerced; declared fields follow in order.
    let rowid: i64 = row.get(0)?;
    let mut values = Vec::with_capacity(schema.fields.len());
    for (index, field) in schema.fields.iter().enumerate() {
        let raw: Value = row.get(index + 1)?;
        let value = match field.field_type {
            Some(tag) => coerce(raw, tag)?,
            None => FieldValue::from(raw),
        };
        values.push(value);
    }
    Ok(Record::from_parts(schema, Some(rowid), values))
}
