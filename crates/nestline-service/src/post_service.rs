//! Post service: cached reads and write-through invalidation for posts.

use crate::cache::{
    cache_keys, CacheAside, CacheNamespace, CachePolicy, CacheStore, DEFAULT_TTL, SHORT_TTL,
};
use crate::dto::{CreatePostRequest, UpdatePostRequest};
use async_trait::async_trait;
use nestline_core::{
    CursorPage, CursorPageRequest, Interface, NestlineError, NestlineResult, OffsetPage,
    OffsetPageRequest, Post, PostFilter, PostId, PostStatus, ValidateExt,
};
use nestline_repository::PostStore;
use shaku::Component;
use std::sync::Arc;
use tracing::{debug, info};

/// Post service trait.
#[async_trait]
pub trait PostService: Interface + Send + Sync {
    /// Gets a post by id. Soft-deleted posts are not served.
    async fn get(&self, id: PostId) -> NestlineResult<Post>;

    /// Lists posts matching the filter, one offset page at a time.
    async fn list(
        &self,
        filter: &PostFilter,
        page: OffsetPageRequest,
    ) -> NestlineResult<OffsetPage<Post>>;

    /// Walks posts matching the filter newest-first from an opaque cursor.
    async fn feed(
        &self,
        filter: &PostFilter,
        page: CursorPageRequest,
    ) -> NestlineResult<CursorPage<Post>>;

    /// Returns the top posts by net vote score.
    async fn trending(&self, limit: u32) -> NestlineResult<Vec<Post>>;

    /// Creates a new post.
    async fn create(&self, request: CreatePostRequest) -> NestlineResult<Post>;

    /// Edits a post's title, body, or category.
    async fn update(&self, id: PostId, request: UpdatePostRequest) -> NestlineResult<Post>;

    /// Sets the moderation status.
    async fn set_status(&self, id: PostId, status: PostStatus) -> NestlineResult<()>;

    /// Pins or unpins the post in listings.
    async fn set_pinned(&self, id: PostId, pinned: bool) -> NestlineResult<()>;

    /// Locks or unlocks the post against new comments.
    async fn set_locked(&self, id: PostId, locked: bool) -> NestlineResult<()>;

    /// Soft-deletes the post.
    async fn delete(&self, id: PostId) -> NestlineResult<()>;
}

/// Concrete post service component for Shaku DI.
#[derive(Component)]
#[shaku(interface = PostService)]
pub struct PostServiceComponent {
    #[shaku(inject)]
    posts: Arc<dyn PostStore>,
    #[shaku(inject)]
    cache: Arc<dyn CacheStore>,
    #[shaku(default = CachePolicy::new(DEFAULT_TTL))]
    cache_policy: CachePolicy,
    #[shaku(default = CachePolicy::new(SHORT_TTL))]
    trending_policy: CachePolicy,
}

impl PostServiceComponent {
    /// Creates a service with the default cache policies.
    #[must_use]
    pub fn new(posts: Arc<dyn PostStore>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            posts,
            cache,
            cache_policy: CachePolicy::new(DEFAULT_TTL),
            trending_policy: CachePolicy::new(SHORT_TTL),
        }
    }

    /// Loads a post that is visible to readers.
    async fn require_post(&self, id: PostId) -> NestlineResult<Post> {
        self.posts
            .find_by_id(id)
            .await?
            .filter(|post| !post.status.is_deleted())
            .ok_or_else(|| NestlineError::not_found("Post", id))
    }

    /// Drops every cache entry a post write could have staled.
    async fn invalidate_post(&self, id: PostId) {
        self.cache.invalidate(&cache_keys::post_by_id(id)).await;
        self.cache
            .invalidate_namespace(CacheNamespace::PostList)
            .await;
        self.cache
            .invalidate_namespace(CacheNamespace::PostTrending)
            .await;
    }
}

#[async_trait]
impl PostService for PostServiceComponent {
    async fn get(&self, id: PostId) -> NestlineResult<Post> {
        debug!("Getting post: {}", id);

        let cache_key = cache_keys::post_by_id(id);
        let posts = Arc::clone(&self.posts);
        self.cache
            .get_or_load(&cache_key, self.cache_policy, move || async move {
                posts
                    .find_by_id(id)
                    .await?
                    .filter(|post| !post.status.is_deleted())
                    .ok_or_else(|| NestlineError::not_found("Post", id))
            })
            .await
    }

    async fn list(
        &self,
        filter: &PostFilter,
        page: OffsetPageRequest,
    ) -> NestlineResult<OffsetPage<Post>> {
        debug!("Listing posts, limit: {}, offset: {}", page.limit, page.offset);

        let cache_key = cache_keys::post_list(filter, page);
        let posts = Arc::clone(&self.posts);
        let filter = filter.clone();
        self.cache
            .get_or_load(&cache_key, self.cache_policy, move || async move {
                posts.list(&filter, page).await
            })
            .await
    }

    async fn feed(
        &self,
        filter: &PostFilter,
        page: CursorPageRequest,
    ) -> NestlineResult<CursorPage<Post>> {
        debug!("Walking post feed, limit: {}", page.limit);

        // Cursor pages are position-addressed and served straight from
        // the store.
        self.posts.feed(filter, page).await
    }

    async fn trending(&self, limit: u32) -> NestlineResult<Vec<Post>> {
        debug!("Getting trending posts, limit: {}", limit);

        let cache_key = cache_keys::post_trending(limit);
        let posts = Arc::clone(&self.posts);
        self.cache
            .get_or_load(&cache_key, self.trending_policy, move || async move {
                posts.trending(limit).await
            })
            .await
    }

    async fn create(&self, request: CreatePostRequest) -> NestlineResult<Post> {
        debug!("Creating post by author: {}", request.author_id);

        request.validate_request()?;

        let post = Post::new(
            request.author_id,
            request.title,
            request.body,
            request.category,
        );
        let created = self.posts.insert(&post).await?;

        self.invalidate_post(created.id).await;

        info!("Post created: {}", created.id);
        Ok(created)
    }

    async fn update(&self, id: PostId, request: UpdatePostRequest) -> NestlineResult<Post> {
        debug!("Updating post: {}", id);

        request.validate_request()?;

        let mut post = self.require_post(id).await?;
        post.apply_update(request.title, request.body, request.category);
        let updated = self.posts.update(&post).await?;

        self.invalidate_post(id).await;

        info!("Post updated: {}", id);
        Ok(updated)
    }

    async fn set_status(&self, id: PostId, status: PostStatus) -> NestlineResult<()> {
        debug!("Setting post status: {} -> {:?}", id, status);

        let matched = self.posts.set_status(id, status).await?;
        if !matched {
            return Err(NestlineError::not_found("Post", id));
        }

        self.invalidate_post(id).await;

        info!("Post status set: {} -> {:?}", id, status);
        Ok(())
    }

    async fn set_pinned(&self, id: PostId, pinned: bool) -> NestlineResult<()> {
        debug!("Setting post pinned: {} -> {}", id, pinned);

        let matched = self.posts.set_pinned(id, pinned).await?;
        if !matched {
            return Err(NestlineError::not_found("Post", id));
        }

        self.invalidate_post(id).await;

        info!("Post pinned set: {} -> {}", id, pinned);
        Ok(())
    }

    async fn set_locked(&self, id: PostId, locked: bool) -> NestlineResult<()> {
        debug!("Setting post locked: {} -> {}", id, locked);

        let matched = self.posts.set_locked(id, locked).await?;
        if !matched {
            return Err(NestlineError::not_found("Post", id));
        }

        self.invalidate_post(id).await;

        info!("Post locked set: {} -> {}", id, locked);
        Ok(())
    }

    async fn delete(&self, id: PostId) -> NestlineResult<()> {
        debug!("Deleting post: {}", id);

        let matched = self.posts.set_status(id, PostStatus::Deleted).await?;
        if !matched {
            return Err(NestlineError::not_found("Post", id));
        }

        self.invalidate_post(id).await;

        info!("Post deleted: {}", id);
        Ok(())
    }
}

impl std::fmt::Debug for PostServiceComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostServiceComponent").finish_non_exhaustive()
    }
}
