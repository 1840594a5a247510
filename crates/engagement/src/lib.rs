//! Engagement lifecycle for Engex
//!
//! Claim validation, capacity reservation, settlement through the credit
//! ledger, daily caps, and the expiry reaper.

pub mod config;
pub mod daily_cap;
pub mod engagement;
pub mod error;
pub mod lifecycle;
pub mod reaper;

pub use config::EngagementConfig;
pub use daily_cap::DailyCapTracker;
pub use engagement::{Engagement, EngagementOutcome, EngagementStatus};
pub use error::{EngagementError, ValidationError};
pub use lifecycle::{EngagementLifecycle, SettlementOutcome};
pub use reaper::{ExpiryReaper, SweepReport};
