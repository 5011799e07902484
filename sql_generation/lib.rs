//! Schema-aware generation of PostgreSQL `SELECT` and `ALTER TABLE`
//! statements for differential fuzzing.
//!
//! Every generated statement travels as a [`model::query::Query`] together
//! with the error substrings it may legitimately raise.

pub mod errors;
pub mod generation;
pub mod model;

pub use errors::{Error, Result};
