//! Database schema, migrations, and query builders.

pub mod flashcards;
pub mod migrations;
pub mod tables;
pub mod users;

// Re-export tables for convenience
pub use tables::*;

/// A built statement: SQL text plus its bound values.
pub type Built = (String, sea_query::Values);
