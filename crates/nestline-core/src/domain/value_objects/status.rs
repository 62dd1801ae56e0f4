//! Post and comment status value objects.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Moderation status of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    /// Post is live.
    #[default]
    Active,
    /// Post was reported and awaits moderator review. Still visible.
    Flagged,
    /// Post was removed from public view by a moderator.
    Hidden,
    /// Post is soft-deleted. Excluded from every default read path.
    Deleted,
}

impl PostStatus {
    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Flagged => "flagged",
            Self::Hidden => "hidden",
            Self::Deleted => "deleted",
        }
    }

    /// Parses the stored string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "flagged" => Some(Self::Flagged),
            "hidden" => Some(Self::Hidden),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }

    /// Returns true when posts with this status appear in public feeds.
    #[must_use]
    pub const fn is_public(self) -> bool {
        matches!(self, Self::Active | Self::Flagged)
    }

    /// Returns true for the soft-delete marker.
    #[must_use]
    pub const fn is_deleted(self) -> bool {
        matches!(self, Self::Deleted)
    }

    /// All statuses.
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::Active, Self::Flagged, Self::Hidden, Self::Deleted]
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Moderation status of a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CommentStatus {
    /// Comment is live.
    #[default]
    Active,
    /// Comment was removed from public view by a moderator.
    Hidden,
    /// Comment is soft-deleted. Excluded from every default read path.
    Deleted,
}

impl CommentStatus {
    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Hidden => "hidden",
            Self::Deleted => "deleted",
        }
    }

    /// Parses the stored string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "hidden" => Some(Self::Hidden),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }

    /// Returns true for the soft-delete marker.
    #[must_use]
    pub const fn is_deleted(self) -> bool {
        matches!(self, Self::Deleted)
    }
}

impl fmt::Display for CommentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
