//! Vote value objects.

use crate::{CommentId, NestlineError, PostId};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The value of a vote.
///
/// Neutral is a real stored state, not an absence: setting a vote to
/// neutral keeps the row but removes it from both tallies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "i8", into = "i8")]
#[repr(i8)]
pub enum VoteValue {
    /// Counts toward the dislike tally.
    Dislike = -1,
    /// Counts toward neither tally.
    #[default]
    Neutral = 0,
    /// Counts toward the like tally.
    Like = 1,
}

impl VoteValue {
    /// Returns the stored integer form.
    #[must_use]
    pub const fn as_i8(self) -> i8 {
        self as i8
    }

    /// Returns true when this vote counts toward neither tally.
    #[must_use]
    pub const fn is_neutral(self) -> bool {
        matches!(self, Self::Neutral)
    }
}

impl TryFrom<i8> for VoteValue {
    type Error = NestlineError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Dislike),
            0 => Ok(Self::Neutral),
            1 => Ok(Self::Like),
            other => Err(NestlineError::validation(format!(
                "vote value must be -1, 0, or 1, got {}",
                other
            ))),
        }
    }
}

impl From<VoteValue> for i8 {
    fn from(value: VoteValue) -> Self {
        value.as_i8()
    }
}

impl fmt::Display for VoteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i8())
    }
}

/// The kind of entity a vote applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// A forum post.
    Post,
    /// A comment on a post.
    Comment,
}

impl TargetKind {
    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Comment => "comment",
        }
    }

    /// Parses the stored string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "post" => Some(Self::Post),
            "comment" => Some(Self::Comment),
            _ => None,
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identifies the entity a vote applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoteTarget {
    /// The kind of target.
    pub kind: TargetKind,
    /// The target's id.
    pub id: Uuid,
}

impl VoteTarget {
    /// Creates a target from a kind and raw id.
    #[must_use]
    pub const fn new(kind: TargetKind, id: Uuid) -> Self {
        Self { kind, id }
    }

    /// Creates a target for a post.
    #[must_use]
    pub const fn post(id: PostId) -> Self {
        Self::new(TargetKind::Post, id.into_inner())
    }

    /// Creates a target for a comment.
    #[must_use]
    pub const fn comment(id: CommentId) -> Self {
        Self::new(TargetKind::Comment, id.into_inner())
    }
}

impl fmt::Display for VoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Aggregated vote tallies for one target.
///
/// Always produced by counting vote rows; the denormalized counters on
/// posts and comments are refreshed from values of this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VoteCounts {
    /// Number of votes with value +1.
    pub like_count: u64,
    /// Number of votes with value -1.
    pub dislike_count: u64,
}

impl VoteCounts {
    /// Creates tallies from raw counts.
    #[must_use]
    pub const fn new(like_count: u64, dislike_count: u64) -> Self {
        Self {
            like_count,
            dislike_count,
        }
    }

    /// Likes minus dislikes.
    #[must_use]
    pub const fn net_score(&self) -> i64 {
        self.like_count as i64 - self.dislike_count as i64
    }

    /// Returns true when both tallies are zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.like_count == 0 && self.dislike_count == 0
    }
}
