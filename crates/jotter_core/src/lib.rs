//! Core journal storage for jotter.
//! This crate owns SQL composition, type coercion and the record lifecycle.

pub mod config;
pub mod db;
pub mod journal;
pub mod logging;
pub mod model;
pub mod repo;
pub mod sql;

pub use config::{ConfigError, JotterConfig};
pub use db::{Database, DbError, DbResult};
pub use journal::{new_entry, split_entry, JournalService, JOURNAL, MAX_TITLE_LEN};
pub use logging::{default_log_level, init_logging};
pub use model::field::{coerce, CoerceError, CoerceResult, FieldType, FieldValue};
pub use model::record::{FieldDef, Record, Schema, SchemaError};
pub use repo::record_store::{
    RecordQuery, RecordRows, SqliteRecordStore, StoreError, StoreResult,
};
pub use sql::{quote_identifier, Fragment, SqlBuilder};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
