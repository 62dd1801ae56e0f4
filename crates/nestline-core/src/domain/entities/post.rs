//! Forum post entity.

use crate::{time, CursorPosition, PostCategory, PostId, PostStatus, UserId, VoteCounts};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A forum post.
///
/// `like_count`, `dislike_count`, and `comment_count` are display
/// caches: they are only ever written from a fresh aggregation over the
/// vote and comment rows, never incremented in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Unique identifier for the post.
    pub id: PostId,

    /// The user who authored the post.
    pub author_id: UserId,

    /// Post title.
    pub title: String,

    /// Post body text.
    pub body: String,

    /// Discussion category.
    pub category: PostCategory,

    /// Moderation status.
    pub status: PostStatus,

    /// Whether a moderator pinned the post to the top of listings.
    pub pinned: bool,

    /// Whether a moderator locked the post against new comments.
    pub locked: bool,

    /// Denormalized like tally, refreshed from aggregation.
    pub like_count: i64,

    /// Denormalized dislike tally, refreshed from aggregation.
    pub dislike_count: i64,

    /// Denormalized comment tally, refreshed from aggregation.
    pub comment_count: i64,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Creates a new active post.
    #[must_use]
    pub fn new(
        author_id: UserId,
        title: impl Into<String>,
        body: impl Into<String>,
        category: PostCategory,
    ) -> Self {
        let now = time::now();
        Self {
            id: PostId::new(),
            author_id,
            title: title.into(),
            body: body.into(),
            category,
            status: PostStatus::Active,
            pinned: false,
            locked: false,
            like_count: 0,
            dislike_count: 0,
            comment_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies an edit, touching the update timestamp.
    pub fn apply_update(
        &mut self,
        title: Option<String>,
        body: Option<String>,
        category: Option<PostCategory>,
    ) {
        if let Some(title) = title {
            self.title = title;
        }
        if let Some(body) = body {
            self.body = body;
        }
        if let Some(category) = category {
            self.category = category;
        }
        self.updated_at = time::now();
    }

    /// Overwrites the denormalized vote tallies from an aggregation.
    pub fn refresh_vote_counts(&mut self, counts: VoteCounts) {
        self.like_count = counts.like_count as i64;
        self.dislike_count = counts.dislike_count as i64;
    }

    /// Likes minus dislikes, per the denormalized tallies.
    #[must_use]
    pub const fn net_score(&self) -> i64 {
        self.like_count - self.dislike_count
    }

    /// Returns true when the post accepts new comments.
    #[must_use]
    pub const fn accepts_comments(&self) -> bool {
        !self.locked && self.status.is_public()
    }

    /// The sort-key position of this post in newest-first feeds.
    #[must_use]
    pub fn cursor_position(&self) -> CursorPosition {
        CursorPosition::new(self.created_at, self.id.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> Post {
        Post::new(
            UserId::new(),
            "First IEP meeting next week",
            "What should I bring and what should I push for?",
            PostCategory::Education,
        )
    }

    #[test]
    fn test_new_post_defaults() {
        let p = post();
        assert_eq!(p.status, PostStatus::Active);
        assert!(!p.pinned);
        assert!(!p.locked);
        assert_eq!(p.like_count, 0);
        assert_eq!(p.comment_count, 0);
        assert_eq!(p.created_at, p.updated_at);
    }

    #[test]
    fn test_apply_update_touches_timestamp() {
        let mut p = post();
        let before = p.updated_at;
        p.apply_update(Some("Updated title".to_string()), None, None);
        assert_eq!(p.title, "Updated title");
        assert_eq!(p.category, PostCategory::Education);
        assert!(p.updated_at >= before);
    }

    #[test]
    fn test_refresh_vote_counts() {
        let mut p = post();
        p.refresh_vote_counts(VoteCounts::new(7, 2));
        assert_eq!(p.like_count, 7);
        assert_eq!(p.dislike_count, 2);
        assert_eq!(p.net_score(), 5);
    }

    #[test]
    fn test_accepts_comments() {
        let mut p = post();
        assert!(p.accepts_comments());
        p.locked = true;
        assert!(!p.accepts_comments());
        p.locked = false;
        p.status = PostStatus::Hidden;
        assert!(!p.accepts_comments());
    }

    #[test]
    fn test_cursor_position_matches_sort_key() {
        let p = post();
        let position = p.cursor_position();
        assert_eq!(position.created_at, p.created_at);
        assert_eq!(position.id, p.id.into_inner());
    }
}
