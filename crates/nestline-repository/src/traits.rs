//! Store traits for the forum content domain.
//!
//! Services depend on these interfaces, never on a concrete backend. The
//! MySQL implementations live in [`crate::mysql`]; tests substitute
//! in-memory implementations.

use async_trait::async_trait;
use nestline_core::{
    Comment, CommentId, CommentStatus, CursorPage, CursorPageRequest, Interface, NestlineResult,
    OffsetPage, OffsetPageRequest, Post, PostFilter, PostId, PostStatus, SessionRecord,
    SessionRecordId, TargetKind, UserId, Vote, VoteCounts, VoteTarget,
};
use std::collections::HashMap;
use uuid::Uuid;

/// Store interface for forum posts.
#[async_trait]
pub trait PostStore: Interface + Send + Sync {
    /// Finds a post by id, including soft-deleted rows.
    async fn find_by_id(&self, id: PostId) -> NestlineResult<Option<Post>>;

    /// Lists posts matching the filter with offset pagination.
    ///
    /// The total count is taken under the same predicate as the page.
    async fn list(
        &self,
        filter: &PostFilter,
        page: OffsetPageRequest,
    ) -> NestlineResult<OffsetPage<Post>>;

    /// Walks posts matching the filter with keyset pagination, newest first.
    async fn feed(
        &self,
        filter: &PostFilter,
        page: CursorPageRequest,
    ) -> NestlineResult<CursorPage<Post>>;

    /// Returns active posts ordered by net vote score, recency as tiebreak.
    async fn trending(&self, limit: u32) -> NestlineResult<Vec<Post>>;

    /// Inserts a new post and returns the stored row.
    async fn insert(&self, post: &Post) -> NestlineResult<Post>;

    /// Updates an existing post and returns the stored row.
    async fn update(&self, post: &Post) -> NestlineResult<Post>;

    /// Sets the moderation status. Returns false if no row matched.
    async fn set_status(&self, id: PostId, status: PostStatus) -> NestlineResult<bool>;

    /// Pins or unpins the post. Returns false if no row matched.
    async fn set_pinned(&self, id: PostId, pinned: bool) -> NestlineResult<bool>;

    /// Locks or unlocks the post. Returns false if no row matched.
    async fn set_locked(&self, id: PostId, locked: bool) -> NestlineResult<bool>;

    /// Overwrites the denormalized vote tallies from an aggregation.
    async fn refresh_vote_counts(&self, id: PostId, counts: &VoteCounts) -> NestlineResult<bool>;

    /// Overwrites the denormalized comment tally from an aggregation.
    async fn refresh_comment_count(&self, id: PostId, count: u64) -> NestlineResult<bool>;

    /// Counts posts matching the filter.
    async fn count(&self, filter: &PostFilter) -> NestlineResult<u64>;
}

/// Store interface for comments.
#[async_trait]
pub trait CommentStore: Interface + Send + Sync {
    /// Finds a comment by id.
    async fn find_by_id(&self, id: CommentId) -> NestlineResult<Option<Comment>>;

    /// Walks a post's comments with keyset pagination, oldest first.
    async fn list_by_post(
        &self,
        post_id: PostId,
        page: CursorPageRequest,
    ) -> NestlineResult<CursorPage<Comment>>;

    /// Inserts a new comment and returns the stored row.
    async fn insert(&self, comment: &Comment) -> NestlineResult<Comment>;

    /// Sets the moderation status. Returns false if no row matched.
    async fn set_status(&self, id: CommentId, status: CommentStatus) -> NestlineResult<bool>;

    /// Overwrites the denormalized vote tallies from an aggregation.
    async fn refresh_vote_counts(&self, id: CommentId, counts: &VoteCounts)
        -> NestlineResult<bool>;

    /// Counts visible comments under a post.
    async fn count_by_post(&self, post_id: PostId) -> NestlineResult<u64>;
}

/// Store interface for votes.
///
/// A vote is keyed by `(user_id, target_kind, target_id)`; the store's
/// unique index is the only mutual exclusion in the layer. Tallies always
/// come from aggregation over the stored rows, never from counters.
#[async_trait]
pub trait VoteStore: Interface + Send + Sync {
    /// Inserts the vote or updates the value of an existing one.
    async fn upsert(&self, vote: &Vote) -> NestlineResult<()>;

    /// Returns the user's current vote on the target, neutral rows included.
    async fn find(&self, user_id: UserId, target: VoteTarget) -> NestlineResult<Option<Vote>>;

    /// Aggregates like and dislike tallies for a single target.
    async fn counts_for(&self, target: VoteTarget) -> NestlineResult<VoteCounts>;

    /// Aggregates tallies for many targets of one kind in a single query.
    ///
    /// Targets with no votes are absent from the returned map.
    async fn counts_for_many(
        &self,
        kind: TargetKind,
        ids: &[Uuid],
    ) -> NestlineResult<HashMap<Uuid, VoteCounts>>;
}

/// Store interface for session records.
///
/// Every query carries the owner id in its predicate; the store cannot
/// distinguish "absent" from "not yours". Sensitive columns hold ciphertext
/// envelopes; this layer never sees plaintext.
#[async_trait]
pub trait SessionRecordStore: Interface + Send + Sync {
    /// Inserts a new record and returns the stored row.
    async fn insert(&self, record: &SessionRecord) -> NestlineResult<SessionRecord>;

    /// Finds a record by id, scoped to its owner.
    async fn find_owned(
        &self,
        id: SessionRecordId,
        owner_id: UserId,
    ) -> NestlineResult<Option<SessionRecord>>;

    /// Lists an owner's records with offset pagination, newest session first.
    async fn list_owned(
        &self,
        owner_id: UserId,
        page: OffsetPageRequest,
    ) -> NestlineResult<OffsetPage<SessionRecord>>;

    /// Updates a record, scoped to its owner. Returns the stored row, or
    /// `None` when no owned row matched.
    async fn update_owned(&self, record: &SessionRecord) -> NestlineResult<Option<SessionRecord>>;

    /// Deletes a record, scoped to its owner. Returns false if no owned row
    /// matched.
    async fn delete_owned(&self, id: SessionRecordId, owner_id: UserId) -> NestlineResult<bool>;
}
