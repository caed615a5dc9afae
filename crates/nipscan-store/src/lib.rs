//! Nipscan Store - persisted set of confirmed results.
//!
//! The journal is a single JSON array on disk. It is the source of truth on
//! startup; the in-memory set is rebuilt from it and every accepted result
//! rewrites the whole array atomically.

pub mod error;
pub mod journal;

pub use error::{Result, StoreError};
pub use journal::{load_journal, ResultStore};
