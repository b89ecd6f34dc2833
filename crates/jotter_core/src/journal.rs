//! Journal schema and entry lifecycle.
//!
//! # Responsibility
//! - Declare the journal record schema.
//! - Split raw entry text into title and body and persist entries.
//!
//! # Invariants
//! - Field declaration order is fixed; it drives column layout.
//! - Titles are capped at [`MAX_TITLE_LEN`] characters, with a trailing
//!   ellipsis marking truncation.

use crate::model::field::{FieldType, FieldValue};
use crate::model::record::{FieldDef, Record, Schema, SchemaError};
use crate::repo::record_store::{SqliteRecordStore, StoreResult};
use chrono::{DateTime, Utc};
use log::info;
use rusqlite::Connection;

/// Maximum title length in characters before truncation.
pub const MAX_TITLE_LEN: usize = 80;

/// Journal entry schema: three timestamps plus author, title and body.
pub static JOURNAL: Schema = Schema {
    table: "journal",
    fields: &[
        FieldDef {
            name: "created_at",
            field_type: Some(FieldType::DateTime),
        },
        FieldDef {
            name: "finished_at",
            field_type: Some(FieldType::DateTime),
        },
        FieldDef {
            name: "happened_at",
            field_type: Some(FieldType::DateTime),
        },
        FieldDef {
            name: "author",
            field_type: Some(FieldType::Text),
        },
        FieldDef {
            name: "title",
            field_type: Some(FieldType::Text),
        },
        FieldDef {
            name: "body",
            field_type: Some(FieldType::Text),
        },
    ],
};

/// Splits raw entry text into `(title, body)`.
///
/// The title is the first line, capped at [`MAX_TITLE_LEN`] characters with
/// `…` appended when cut short; the body is everything after the consumed
/// title text, trimmed.
pub fn split_entry(entry: &str) -> (String, String) {
    let entry = entry.trim_start();
    let mut title = String::new();
    let mut consumed = 0;
    let mut chars = 0;
    for ch in entry.chars() {
        if ch == '\n' || ch == '\r' {
            break;
        }
        title.push(ch);
        consumed += ch.len_utf8();
        chars += 1;
        if chars >= MAX_TITLE_LEN {
            title.push('\u{2026}');
            break;
        }
    }
    let body = entry[consumed..].trim().to_string();
    (title, body)
}

/// Builds an unpersisted journal record from entry parts.
pub fn new_entry(
    author: Option<&str>,
    created_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    happened_at: Option<DateTime<Utc>>,
    text: &str,
) -> Result<Record, SchemaError> {
    let (title, body) = split_entry(text);
    let mut record = Record::new(&JOURNAL);
    record.set("created_at", FieldValue::DateTime(created_at))?;
    record.set("finished_at", FieldValue::DateTime(finished_at))?;
    record.set(
        "happened_at",
        happened_at.map_or(FieldValue::Null, FieldValue::DateTime),
    )?;
    record.set(
        "author",
        author.map_or(FieldValue::Null, |a| FieldValue::Text(a.to_string())),
    )?;
    record.set("title", FieldValue::Text(title))?;
    record.set("body", FieldValue::Text(body))?;
    Ok(record)
}

/// Journal entry use cases over one connection.
pub struct JournalService<'conn> {
    store: SqliteRecordStore<'conn>,
}

impl<'conn> JournalService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            store: SqliteRecordStore::new(conn, &JOURNAL),
        }
    }

    /// Creates the journal table when absent. Safe to call repeatedly.
    pub fn init(&self) -> StoreResult<()> {
        self.store.create_table()
    }

    /// Splits, records and saves one entry; returns the persisted record.
    pub fn add_entry(
        &self,
        author: Option<&str>,
        happened_at: Option<DateTime<Utc>>,
        text: &str,
    ) -> StoreResult<Record> {
        let now = Utc::now();
        let mut record = new_entry(author, now, now, happened_at, text)?;
        self.store.save(&mut record)?;
        info!(
            "event=entry_add module=journal status=ok rowid={:?}",
            record.rowid()
        );
        Ok(record)
    }

    /// All journal entries in storage order, timestamps typed.
    pub fn entries(&self) -> StoreResult<Vec<Record>> {
        self.store.query_all()
    }

    /// Direct access to the underlying record store.
    pub fn store(&self) -> &SqliteRecordStore<'conn> {
        &self.store
    }
}
