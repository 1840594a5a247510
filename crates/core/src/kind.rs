//! Engagement kinds - the action types a post can request

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// The social action a post requests and a performer executes.
///
/// A post requests exactly one kind; an engagement must match its post.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EngagementKind {
    Like,
    Follow,
    Comment,
    Share,
    Subscribe,
}
