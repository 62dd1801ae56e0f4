//! In-memory store fakes shared by the service unit tests.

use async_trait::async_trait;
use nestline_core::{
    Comment, CommentId, CommentStatus, CursorPage, CursorPageRequest, NestlineResult, OffsetPage,
    OffsetPageRequest, Post, PostFilter, PostId, PostStatus, SessionRecord, SessionRecordId,
    TargetKind, UserId, Vote, VoteCounts, VoteTarget,
};
use nestline_repository::{CommentStore, PostStore, SessionRecordStore, VoteStore};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

#[derive(Default)]
pub(crate) struct MockPostStore {
    pub(crate) posts: Mutex<HashMap<PostId, Post>>,
    pub(crate) find_calls: AtomicUsize,
    pub(crate) list_calls: AtomicUsize,
}

impl MockPostStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_post(post: Post) -> Self {
        let store = Self::new();
        store.add_post(post);
        store
    }

    pub(crate) fn add_post(&self, post: Post) {
        self.posts.lock().insert(post.id, post);
    }

    pub(crate) fn stored(&self, id: PostId) -> Option<Post> {
        self.posts.lock().get(&id).cloned()
    }
}

#[async_trait]
impl PostStore for MockPostStore {
    async fn find_by_id(&self, id: PostId) -> NestlineResult<Option<Post>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.posts.lock().get(&id).cloned())
    }

    async fn list(
        &self,
        filter: &PostFilter,
        page: OffsetPageRequest,
    ) -> NestlineResult<OffsetPage<Post>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let mut matching: Vec<Post> = self
            .posts
            .lock()
            .values()
            .filter(|post| filter.matches(post))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matching.len() as u64;
        let data: Vec<Post> = matching
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect();
        Ok(OffsetPage::new(data, total, page))
    }

    async fn feed(
        &self,
        filter: &PostFilter,
        page: CursorPageRequest,
    ) -> NestlineResult<CursorPage<Post>> {
        let position = page.position()?;
        let mut matching: Vec<Post> = self
            .posts
            .lock()
            .values()
            .filter(|post| filter.matches(post))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            (b.created_at, b.id.into_inner()).cmp(&(a.created_at, a.id.into_inner()))
        });
        if let Some(position) = position {
            matching.retain(|post| {
                (post.created_at, post.id.into_inner()) < (position.created_at, position.id)
            });
        }
        matching.truncate(page.fetch_size() as usize);
        Ok(CursorPage::from_rows(matching, page.limit, Post::cursor_position))
    }

    async fn trending(&self, limit: u32) -> NestlineResult<Vec<Post>> {
        let mut matching: Vec<Post> = self
            .posts
            .lock()
            .values()
            .filter(|post| post.status.is_public())
            .cloned()
            .collect();
        matching.sort_by_key(|post| std::cmp::Reverse(post.net_score()));
        matching.truncate(limit as usize);
        Ok(matching)
    }

    async fn insert(&self, post: &Post) -> NestlineResult<Post> {
        self.posts.lock().insert(post.id, post.clone());
        Ok(post.clone())
    }

    async fn update(&self, post: &Post) -> NestlineResult<Post> {
        self.posts.lock().insert(post.id, post.clone());
        Ok(post.clone())
    }

    async fn set_status(&self, id: PostId, status: PostStatus) -> NestlineResult<bool> {
        Ok(self
            .posts
            .lock()
            .get_mut(&id)
            .map(|post| post.status = status)
            .is_some())
    }

    async fn set_pinned(&self, id: PostId, pinned: bool) -> NestlineResult<bool> {
        Ok(self
            .posts
            .lock()
            .get_mut(&id)
            .map(|post| post.pinned = pinned)
            .is_some())
    }

    async fn set_locked(&self, id: PostId, locked: bool) -> NestlineResult<bool> {
        Ok(self
            .posts
            .lock()
            .get_mut(&id)
            .map(|post| post.locked = locked)
            .is_some())
    }

    async fn refresh_vote_counts(&self, id: PostId, counts: &VoteCounts) -> NestlineResult<bool> {
        Ok(self
            .posts
            .lock()
            .get_mut(&id)
            .map(|post| post.refresh_vote_counts(*counts))
            .is_some())
    }

    async fn refresh_comment_count(&self, id: PostId, count: u64) -> NestlineResult<bool> {
        Ok(self
            .posts
            .lock()
            .get_mut(&id)
            .map(|post| post.comment_count = count as i64)
            .is_some())
    }

    async fn count(&self, filter: &PostFilter) -> NestlineResult<u64> {
        Ok(self
            .posts
            .lock()
            .values()
            .filter(|post| filter.matches(post))
            .count() as u64)
    }
}

#[derive(Default)]
pub(crate) struct MockCommentStore {
    pub(crate) comments: Mutex<HashMap<CommentId, Comment>>,
    pub(crate) list_calls: AtomicUsize,
}

impl MockCommentStore {
    pub(crate) fn add_comment(&self, comment: Comment) {
        self.comments.lock().insert(comment.id, comment);
    }
}

#[async_trait]
impl CommentStore for MockCommentStore {
    async fn find_by_id(&self, id: CommentId) -> NestlineResult<Option<Comment>> {
        Ok(self.comments.lock().get(&id).cloned())
    }

    async fn list_by_post(
        &self,
        post_id: PostId,
        page: CursorPageRequest,
    ) -> NestlineResult<CursorPage<Comment>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let position = page.position()?;
        let mut matching: Vec<Comment> = self
            .comments
            .lock()
            .values()
            .filter(|comment| comment.post_id == post_id && comment.status == CommentStatus::Active)
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            (a.created_at, a.id.into_inner()).cmp(&(b.created_at, b.id.into_inner()))
        });
        if let Some(position) = position {
            matching.retain(|comment| {
                (comment.created_at, comment.id.into_inner()) > (position.created_at, position.id)
            });
        }
        matching.truncate(page.fetch_size() as usize);
        Ok(CursorPage::from_rows(
            matching,
            page.limit,
            Comment::cursor_position,
        ))
    }

    async fn insert(&self, comment: &Comment) -> NestlineResult<Comment> {
        self.comments.lock().insert(comment.id, comment.clone());
        Ok(comment.clone())
    }

    async fn set_status(&self, id: CommentId, status: CommentStatus) -> NestlineResult<bool> {
        Ok(self
            .comments
            .lock()
            .get_mut(&id)
            .map(|comment| comment.status = status)
            .is_some())
    }

    async fn refresh_vote_counts(
        &self,
        id: CommentId,
        counts: &VoteCounts,
    ) -> NestlineResult<bool> {
        Ok(self
            .comments
            .lock()
            .get_mut(&id)
            .map(|comment| comment.refresh_vote_counts(*counts))
            .is_some())
    }

    async fn count_by_post(&self, post_id: PostId) -> NestlineResult<u64> {
        Ok(self
            .comments
            .lock()
            .values()
            .filter(|comment| comment.post_id == post_id && comment.status == CommentStatus::Active)
            .count() as u64)
    }
}

#[derive(Default)]
pub(crate) struct MockVoteStore {
    pub(crate) rows: Mutex<HashMap<(UserId, VoteTarget), Vote>>,
}

#[async_trait]
impl VoteStore for MockVoteStore {
    async fn upsert(&self, vote: &Vote) -> NestlineResult<()> {
        let mut rows = self.rows.lock();
        match rows.get_mut(&(vote.user_id, vote.target)) {
            Some(existing) => existing.set_value(vote.value),
            None => {
                rows.insert((vote.user_id, vote.target), vote.clone());
            }
        }
        Ok(())
    }

    async fn find(&self, user_id: UserId, target: VoteTarget) -> NestlineResult<Option<Vote>> {
        Ok(self.rows.lock().get(&(user_id, target)).cloned())
    }

    async fn counts_for(&self, target: VoteTarget) -> NestlineResult<VoteCounts> {
        let rows = self.rows.lock();
        let mut counts = VoteCounts::default();
        for vote in rows.values().filter(|vote| vote.target == target) {
            match vote.value.as_i8() {
                1 => counts.like_count += 1,
                -1 => counts.dislike_count += 1,
                _ => {}
            }
        }
        Ok(counts)
    }

    async fn counts_for_many(
        &self,
        kind: TargetKind,
        ids: &[Uuid],
    ) -> NestlineResult<HashMap<Uuid, VoteCounts>> {
        let mut by_target: HashMap<Uuid, VoteCounts> = HashMap::new();
        let rows = self.rows.lock();
        for vote in rows.values() {
            if vote.target.kind != kind || !ids.contains(&vote.target.id) {
                continue;
            }
            let counts = by_target.entry(vote.target.id).or_default();
            match vote.value.as_i8() {
                1 => counts.like_count += 1,
                -1 => counts.dislike_count += 1,
                _ => {}
            }
        }
        // Voteless targets stay absent, as the real aggregation query
        // returns no row for them.
        by_target.retain(|_, counts| !counts.is_zero());
        Ok(by_target)
    }
}

#[derive(Default)]
pub(crate) struct MockSessionRecordStore {
    pub(crate) records: Mutex<HashMap<SessionRecordId, SessionRecord>>,
    pub(crate) owner_queries: Mutex<Vec<(SessionRecordId, UserId)>>,
}

impl MockSessionRecordStore {
    pub(crate) fn stored(&self, id: SessionRecordId) -> Option<SessionRecord> {
        self.records.lock().get(&id).cloned()
    }
}

#[async_trait]
impl SessionRecordStore for MockSessionRecordStore {
    async fn insert(&self, record: &SessionRecord) -> NestlineResult<SessionRecord> {
        self.records.lock().insert(record.id, record.clone());
        Ok(record.clone())
    }

    async fn find_owned(
        &self,
        id: SessionRecordId,
        owner_id: UserId,
    ) -> NestlineResult<Option<SessionRecord>> {
        self.owner_queries.lock().push((id, owner_id));
        Ok(self
            .records
            .lock()
            .get(&id)
            .filter(|record| record.owner_id == owner_id)
            .cloned())
    }

    async fn list_owned(
        &self,
        owner_id: UserId,
        page: OffsetPageRequest,
    ) -> NestlineResult<OffsetPage<SessionRecord>> {
        let mut matching: Vec<SessionRecord> = self
            .records
            .lock()
            .values()
            .filter(|record| record.owner_id == owner_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.session_date.cmp(&a.session_date));
        let total = matching.len() as u64;
        let data: Vec<SessionRecord> = matching
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect();
        Ok(OffsetPage::new(data, total, page))
    }

    async fn update_owned(&self, record: &SessionRecord) -> NestlineResult<Option<SessionRecord>> {
        self.owner_queries.lock().push((record.id, record.owner_id));
        let mut records = self.records.lock();
        match records.get(&record.id) {
            Some(existing) if existing.owner_id == record.owner_id => {
                records.insert(record.id, record.clone());
                Ok(Some(record.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_owned(&self, id: SessionRecordId, owner_id: UserId) -> NestlineResult<bool> {
        self.owner_queries.lock().push((id, owner_id));
        let mut records = self.records.lock();
        match records.get(&id) {
            Some(existing) if existing.owner_id == owner_id => {
                records.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
