//! Engex Core - Domain types
//!
//! This crate contains the fundamental types used across Engex:
//! - `Credits`: Signed integer amount for the internal credit currency
//! - `UserId`, `PostId`, `EngagementId`: Typed identifiers
//! - `EngagementKind`: The action types a post can request

pub mod credits;
pub mod id;
pub mod kind;

pub use credits::{Credits, CreditsError};
pub use id::{EngagementId, IdError, PostId, UserId};
pub use kind::EngagementKind;
