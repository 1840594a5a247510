//! Engex Journal - JSONL transaction persistence
//!
//! This crate persists committed credit transactions to JSONL files.
//! The journal is the durable record; in-memory projections are disposable
//! and rebuilt from it on startup.

pub mod error;
pub mod reader;
pub mod store;

pub use error::JournalError;
pub use reader::JournalReader;
pub use store::JournalStore;
