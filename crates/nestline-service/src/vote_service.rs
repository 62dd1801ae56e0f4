//! Vote service: vote intake and tally aggregation for posts and comments.

use crate::cache::{cache_keys, CacheAside, CacheNamespace, CacheStore};
use async_trait::async_trait;
use nestline_core::{
    CommentId, Interface, NestlineError, NestlineResult, PostId, TargetKind, UserId, Vote,
    VoteCounts, VoteTarget, VoteValue,
};
use nestline_repository::{CommentStore, PostStore, VoteStore};
use shaku::Component;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Vote service trait.
#[async_trait]
pub trait VoteService: Interface + Send + Sync {
    /// Records or replaces a user's vote and returns the fresh tallies.
    ///
    /// A neutral value retracts the vote while keeping the row.
    async fn record_vote(
        &self,
        user_id: UserId,
        target: VoteTarget,
        value: VoteValue,
    ) -> NestlineResult<VoteCounts>;

    /// Returns the user's current vote on the target, if any.
    async fn get_vote(&self, user_id: UserId, target: VoteTarget) -> NestlineResult<Option<Vote>>;

    /// Aggregates tallies for many targets of one kind in a single query.
    /// Targets with no votes read as zero.
    async fn get_counts(
        &self,
        kind: TargetKind,
        ids: &[Uuid],
    ) -> NestlineResult<HashMap<Uuid, VoteCounts>>;
}

/// Concrete vote service component for Shaku DI.
#[derive(Component)]
#[shaku(interface = VoteService)]
pub struct VoteServiceComponent {
    #[shaku(inject)]
    votes: Arc<dyn VoteStore>,
    #[shaku(inject)]
    posts: Arc<dyn PostStore>,
    #[shaku(inject)]
    comments: Arc<dyn CommentStore>,
    #[shaku(inject)]
    cache: Arc<dyn CacheStore>,
}

impl VoteServiceComponent {
    /// Creates a vote service.
    #[must_use]
    pub fn new(
        votes: Arc<dyn VoteStore>,
        posts: Arc<dyn PostStore>,
        comments: Arc<dyn CommentStore>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            votes,
            posts,
            comments,
            cache,
        }
    }

    /// Confirms the target still exists before a vote lands on it.
    async fn ensure_target_exists(&self, target: VoteTarget) -> NestlineResult<()> {
        match target.kind {
            TargetKind::Post => self
                .posts
                .find_by_id(PostId::from_uuid(target.id))
                .await?
                .filter(|post| !post.status.is_deleted())
                .map(|_| ())
                .ok_or_else(|| NestlineError::not_found("Post", target.id)),
            TargetKind::Comment => self
                .comments
                .find_by_id(CommentId::from_uuid(target.id))
                .await?
                .filter(|comment| !comment.status.is_deleted())
                .map(|_| ())
                .ok_or_else(|| NestlineError::not_found("Comment", target.id)),
        }
    }

    /// Writes freshly aggregated tallies onto the target row.
    async fn push_counts(&self, target: VoteTarget, counts: &VoteCounts) -> NestlineResult<()> {
        match target.kind {
            TargetKind::Post => {
                let _ = self
                    .posts
                    .refresh_vote_counts(PostId::from_uuid(target.id), counts)
                    .await?;
            }
            TargetKind::Comment => {
                let _ = self
                    .comments
                    .refresh_vote_counts(CommentId::from_uuid(target.id), counts)
                    .await?;
            }
        }
        Ok(())
    }

    /// Drops cache entries that embed the target's tallies.
    async fn invalidate_target(&self, target: VoteTarget) {
        match target.kind {
            TargetKind::Post => {
                let post_id = PostId::from_uuid(target.id);
                self.cache.invalidate(&cache_keys::post_by_id(post_id)).await;
                self.cache
                    .invalidate_namespace(CacheNamespace::PostList)
                    .await;
                self.cache
                    .invalidate_namespace(CacheNamespace::PostTrending)
                    .await;
            }
            TargetKind::Comment => {
                self.cache
                    .invalidate_namespace(CacheNamespace::CommentList)
                    .await;
            }
        }
    }
}

#[async_trait]
impl VoteService for VoteServiceComponent {
    async fn record_vote(
        &self,
        user_id: UserId,
        target: VoteTarget,
        value: VoteValue,
    ) -> NestlineResult<VoteCounts> {
        debug!("Recording vote: user {} on {:?} -> {:?}", user_id, target, value);

        self.ensure_target_exists(target).await?;

        let vote = Vote::new(user_id, target, value);
        self.votes.upsert(&vote).await?;

        // Tallies always come from re-aggregation over the vote rows,
        // never from arithmetic on the previous tally.
        let counts = self.votes.counts_for(target).await?;
        self.push_counts(target, &counts).await?;
        self.invalidate_target(target).await;

        info!(
            "Vote recorded: user {} on {:?} -> {:?}, tallies {}/{}",
            user_id, target, value, counts.like_count, counts.dislike_count
        );
        Ok(counts)
    }

    async fn get_vote(&self, user_id: UserId, target: VoteTarget) -> NestlineResult<Option<Vote>> {
        debug!("Getting vote: user {} on {:?}", user_id, target);

        self.votes.find(user_id, target).await
    }

    async fn get_counts(
        &self,
        kind: TargetKind,
        ids: &[Uuid],
    ) -> NestlineResult<HashMap<Uuid, VoteCounts>> {
        debug!("Aggregating vote tallies for {} targets", ids.len());

        let mut counts = self.votes.counts_for_many(kind, ids).await?;
        for id in ids {
            counts.entry(*id).or_default();
        }
        Ok(counts)
    }
}

impl std::fmt::Debug for VoteServiceComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoteServiceComponent").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheStore;
    use crate::test_support::{MockCommentStore, MockPostStore, MockVoteStore};
    use nestline_core::{Comment, Post, PostCategory, PostStatus};

    struct Fixture {
        votes: Arc<MockVoteStore>,
        posts: Arc<MockPostStore>,
        comments: Arc<MockCommentStore>,
        service: VoteServiceComponent,
    }

    fn fixture() -> Fixture {
        let votes = Arc::new(MockVoteStore::default());
        let posts = Arc::new(MockPostStore::new());
        let comments = Arc::new(MockCommentStore::default());
        let cache = Arc::new(MemoryCacheStore::new(64));
        let service = VoteServiceComponent::new(
            Arc::clone(&votes) as Arc<dyn VoteStore>,
            Arc::clone(&posts) as Arc<dyn PostStore>,
            Arc::clone(&comments) as Arc<dyn CommentStore>,
            cache,
        );
        Fixture {
            votes,
            posts,
            comments,
            service,
        }
    }

    fn test_post() -> Post {
        Post::new(
            UserId::new(),
            "Insurance appeal template that worked",
            "Sharing the letter structure we used.",
            PostCategory::Resources,
        )
    }

    #[tokio::test]
    async fn test_vote_sequence_ends_neutral() {
        let fixture = fixture();
        let post = test_post();
        let target = VoteTarget::post(post.id);
        fixture.posts.add_post(post);
        let user = UserId::new();

        let after_like = fixture
            .service
            .record_vote(user, target, VoteValue::Like)
            .await
            .unwrap();
        assert_eq!(after_like, VoteCounts::new(1, 0));

        // Repeating the same value changes nothing.
        let repeated = fixture
            .service
            .record_vote(user, target, VoteValue::Like)
            .await
            .unwrap();
        assert_eq!(repeated, VoteCounts::new(1, 0));

        let after_dislike = fixture
            .service
            .record_vote(user, target, VoteValue::Dislike)
            .await
            .unwrap();
        assert_eq!(after_dislike, VoteCounts::new(0, 1));

        let after_retract = fixture
            .service
            .record_vote(user, target, VoteValue::Neutral)
            .await
            .unwrap();
        assert_eq!(after_retract, VoteCounts::new(0, 0));

        // The row survives retraction with a neutral value.
        let vote = fixture.service.get_vote(user, target).await.unwrap().unwrap();
        assert!(vote.is_neutral());
    }

    #[tokio::test]
    async fn test_votes_tally_across_users() {
        let fixture = fixture();
        let post = test_post();
        let target = VoteTarget::post(post.id);
        fixture.posts.add_post(post.clone());

        for _ in 0..3 {
            fixture
                .service
                .record_vote(UserId::new(), target, VoteValue::Like)
                .await
                .unwrap();
        }
        let counts = fixture
            .service
            .record_vote(UserId::new(), target, VoteValue::Dislike)
            .await
            .unwrap();

        assert_eq!(counts, VoteCounts::new(3, 1));
        let stored = fixture.posts.stored(post.id).unwrap();
        assert_eq!(stored.like_count, 3);
        assert_eq!(stored.dislike_count, 1);
        assert_eq!(stored.net_score(), 2);
    }

    #[tokio::test]
    async fn test_vote_on_comment_pushes_tallies() {
        let fixture = fixture();
        let comment = Comment::new(PostId::new(), UserId::new(), "This worked for us too.");
        let target = VoteTarget::comment(comment.id);
        fixture.comments.add_comment(comment.clone());

        let counts = fixture
            .service
            .record_vote(UserId::new(), target, VoteValue::Like)
            .await
            .unwrap();

        assert_eq!(counts, VoteCounts::new(1, 0));
        let stored = fixture.comments.comments.lock().get(&comment.id).cloned().unwrap();
        assert_eq!(stored.like_count, 1);
    }

    #[tokio::test]
    async fn test_vote_on_missing_target() {
        let fixture = fixture();

        let result = fixture
            .service
            .record_vote(UserId::new(), VoteTarget::post(PostId::new()), VoteValue::Like)
            .await;
        assert!(matches!(
            result.unwrap_err(),
            NestlineError::NotFound { resource_type: "Post", .. }
        ));

        let result = fixture
            .service
            .record_vote(
                UserId::new(),
                VoteTarget::comment(CommentId::new()),
                VoteValue::Like,
            )
            .await;
        assert!(matches!(
            result.unwrap_err(),
            NestlineError::NotFound { resource_type: "Comment", .. }
        ));
    }

    #[tokio::test]
    async fn test_vote_on_deleted_post() {
        let fixture = fixture();
        let mut post = test_post();
        post.status = PostStatus::Deleted;
        let target = VoteTarget::post(post.id);
        fixture.posts.add_post(post);

        assert!(fixture
            .service
            .record_vote(UserId::new(), target, VoteValue::Like)
            .await
            .is_err());
        assert!(fixture.votes.rows.lock().is_empty());
    }

    #[tokio::test]
    async fn test_get_counts_zero_fills_absent_targets() {
        let fixture = fixture();
        let voted = test_post();
        let unvoted = test_post();
        fixture.posts.add_post(voted.clone());
        fixture.posts.add_post(unvoted.clone());
        fixture
            .service
            .record_vote(UserId::new(), VoteTarget::post(voted.id), VoteValue::Like)
            .await
            .unwrap();

        let ids = [voted.id.into_inner(), unvoted.id.into_inner()];
        let counts = fixture
            .service
            .get_counts(TargetKind::Post, &ids)
            .await
            .unwrap();

        assert_eq!(counts.len(), 2);
        assert_eq!(counts[&voted.id.into_inner()], VoteCounts::new(1, 0));
        assert_eq!(counts[&unvoted.id.into_inner()], VoteCounts::new(0, 0));
    }

    #[tokio::test]
    async fn test_get_vote_for_user_without_vote() {
        let fixture = fixture();
        let post = test_post();
        fixture.posts.add_post(post.clone());

        let vote = fixture
            .service
            .get_vote(UserId::new(), VoteTarget::post(post.id))
            .await
            .unwrap();
        assert!(vote.is_none());
    }
}
