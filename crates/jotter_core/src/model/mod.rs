//! Typed domain layer between raw storage scalars and record values.
//!
//! # Responsibility
//! - Define semantic field types and their coercion rules.
//! - Define declarative schemas and the records they shape.
//!
//! # Invariants
//! - Schemas are fixed, ordered declarations; no runtime reflection.
//! - Coercion is total over the declared type tags.

pub mod field;
pub mod record;
