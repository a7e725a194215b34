//! Tabflow Storage Layer
//!
//! SQLite-backed key-value persistence for extension state.
//! Every value is stored as a single record under its key.

mod database;
mod error;
mod migrations;

pub use database::Database;
pub use error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;
