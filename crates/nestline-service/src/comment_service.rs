//! Comment service: thread listings, comment intake, and moderation.

use crate::cache::{cache_keys, CacheAside, CacheNamespace, CachePolicy, CacheStore, DEFAULT_TTL};
use crate::dto::CreateCommentRequest;
use async_trait::async_trait;
use nestline_core::{
    Comment, CommentId, CommentStatus, CursorPage, CursorPageRequest, Interface, NestlineError,
    NestlineResult, PostId, ValidateExt,
};
use nestline_repository::{CommentStore, PostStore};
use shaku::Component;
use std::sync::Arc;
use tracing::{debug, info};

/// Comment service trait.
#[async_trait]
pub trait CommentService: Interface + Send + Sync {
    /// Walks a post's visible comments in conversation order.
    async fn list_for_post(
        &self,
        post_id: PostId,
        page: CursorPageRequest,
    ) -> NestlineResult<CursorPage<Comment>>;

    /// Adds a comment to a post that accepts them.
    async fn create(&self, request: CreateCommentRequest) -> NestlineResult<Comment>;

    /// Hides a comment from listings.
    async fn hide(&self, id: CommentId) -> NestlineResult<()>;

    /// Soft-deletes a comment.
    async fn delete(&self, id: CommentId) -> NestlineResult<()>;
}

/// Concrete comment service component for Shaku DI.
#[derive(Component)]
#[shaku(interface = CommentService)]
pub struct CommentServiceComponent {
    #[shaku(inject)]
    comments: Arc<dyn CommentStore>,
    #[shaku(inject)]
    posts: Arc<dyn PostStore>,
    #[shaku(inject)]
    cache: Arc<dyn CacheStore>,
    #[shaku(default = CachePolicy::new(DEFAULT_TTL))]
    cache_policy: CachePolicy,
}

impl CommentServiceComponent {
    /// Creates a service with the default cache policy.
    #[must_use]
    pub fn new(
        comments: Arc<dyn CommentStore>,
        posts: Arc<dyn PostStore>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            comments,
            posts,
            cache,
            cache_policy: CachePolicy::new(DEFAULT_TTL),
        }
    }

    /// Applies a moderation status and keeps the thread's tallies current.
    async fn moderate(&self, id: CommentId, status: CommentStatus) -> NestlineResult<()> {
        let comment = self
            .comments
            .find_by_id(id)
            .await?
            .ok_or_else(|| NestlineError::not_found("Comment", id))?;

        let matched = self.comments.set_status(id, status).await?;
        if !matched {
            return Err(NestlineError::not_found("Comment", id));
        }

        self.refresh_thread(comment.post_id).await?;
        self.invalidate_thread(comment.post_id).await;
        Ok(())
    }

    /// Re-counts visible comments and writes the tally onto the post.
    async fn refresh_thread(&self, post_id: PostId) -> NestlineResult<()> {
        let count = self.comments.count_by_post(post_id).await?;
        let _ = self.posts.refresh_comment_count(post_id, count).await?;
        Ok(())
    }

    /// Drops the cached comment pages and the parent post's entries.
    async fn invalidate_thread(&self, post_id: PostId) {
        self.cache
            .invalidate_namespace(CacheNamespace::CommentList)
            .await;
        self.cache.invalidate(&cache_keys::post_by_id(post_id)).await;
        self.cache
            .invalidate_namespace(CacheNamespace::PostList)
            .await;
    }
}

#[async_trait]
impl CommentService for CommentServiceComponent {
    async fn list_for_post(
        &self,
        post_id: PostId,
        page: CursorPageRequest,
    ) -> NestlineResult<CursorPage<Comment>> {
        debug!("Listing comments for post: {}, limit: {}", post_id, page.limit);

        // Only the entry page is worth caching; continuation pages are
        // position-addressed.
        if page.cursor.is_some() {
            return self.comments.list_by_post(post_id, page).await;
        }

        let cache_key = cache_keys::comment_first_page(post_id, page.limit);
        let comments = Arc::clone(&self.comments);
        self.cache
            .get_or_load(&cache_key, self.cache_policy, move || async move {
                comments.list_by_post(post_id, page).await
            })
            .await
    }

    async fn create(&self, request: CreateCommentRequest) -> NestlineResult<Comment> {
        debug!("Creating comment on post: {}", request.post_id);

        request.validate_request()?;

        let post = self
            .posts
            .find_by_id(request.post_id)
            .await?
            .filter(|post| !post.status.is_deleted())
            .ok_or_else(|| NestlineError::not_found("Post", request.post_id))?;
        if !post.accepts_comments() {
            return Err(NestlineError::conflict(format!(
                "Post {} does not accept new comments",
                post.id
            )));
        }

        let comment = Comment::new(request.post_id, request.author_id, request.body);
        let created = self.comments.insert(&comment).await?;

        self.refresh_thread(request.post_id).await?;
        self.invalidate_thread(request.post_id).await;

        info!("Comment created: {} on post {}", created.id, request.post_id);
        Ok(created)
    }

    async fn hide(&self, id: CommentId) -> NestlineResult<()> {
        debug!("Hiding comment: {}", id);

        self.moderate(id, CommentStatus::Hidden).await?;

        info!("Comment hidden: {}", id);
        Ok(())
    }

    async fn delete(&self, id: CommentId) -> NestlineResult<()> {
        debug!("Deleting comment: {}", id);

        self.moderate(id, CommentStatus::Deleted).await?;

        info!("Comment deleted: {}", id);
        Ok(())
    }
}

impl std::fmt::Debug for CommentServiceComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommentServiceComponent").finish_non_exhaustive()
    }
}
