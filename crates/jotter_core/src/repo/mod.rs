//! Record persistence over a schema-driven SQLite store.
//!
//! # Responsibility
//! - Provide table creation, query, insert, update and save for one schema.
//! - Keep every statement composed through the SQL builder.
//!
//! # Invariants
//! - Statements never interpolate untrusted data as text; values bind as
//!   parameters, names render as quoted identifiers.
//! - `save` is the public write entry point; insert/update are primitives.

pub mod record_store;
