//! Comment entity.

use crate::{time, CommentId, CommentStatus, CursorPosition, PostId, UserId, VoteCounts};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A comment on a forum post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// Unique identifier for the comment.
    pub id: CommentId,

    /// The post this comment replies to.
    pub post_id: PostId,

    /// The user who authored the comment.
    pub author_id: UserId,

    /// Comment body text.
    pub body: String,

    /// Moderation status.
    pub status: CommentStatus,

    /// Denormalized like tally, refreshed from aggregation.
    pub like_count: i64,

    /// Denormalized dislike tally, refreshed from aggregation.
    pub dislike_count: i64,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    /// Creates a new active comment.
    #[must_use]
    pub fn new(post_id: PostId, author_id: UserId, body: impl Into<String>) -> Self {
        let now = time::now();
        Self {
            id: CommentId::new(),
            post_id,
            author_id,
            body: body.into(),
            status: CommentStatus::Active,
            like_count: 0,
            dislike_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites the denormalized vote tallies from an aggregation.
    pub fn refresh_vote_counts(&mut self, counts: VoteCounts) {
        self.like_count = counts.like_count as i64;
        self.dislike_count = counts.dislike_count as i64;
    }

    /// The sort-key position of this comment in conversation order.
    #[must_use]
    pub fn cursor_position(&self) -> CursorPosition {
        CursorPosition::new(self.created_at, self.id.into_inner())
    }
}
