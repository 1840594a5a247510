//! Engex Posts - Post rows and capacity accounting
//!
//! # Key Types
//! - `Post`: A paid request for up to `max_engagements` engagements
//! - `PostBoard`: Atomic create-with-debit and conditional slot reservation
//! - `SlotReservation`: Proof that one capacity slot was claimed

pub mod board;
pub mod error;
pub mod post;

pub use board::{PostBoard, SlotReservation};
pub use error::PostError;
pub use post::{Post, PostStatus};
