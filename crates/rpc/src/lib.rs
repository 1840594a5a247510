//! Engex RPC - orchestrator
//!
//! Wires the credit ledger, journal, post board, and engagement lifecycle
//! together behind `AppContext`, and exposes the CLI command layer.

pub mod commands;
pub mod context;

pub use context::{AppContext, ContextError};
