//! MySQL post store implementation.

use crate::mysql::parse_uuid;
use crate::{traits::PostStore, DatabasePoolInterface};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nestline_core::{
    time, CursorPage, CursorPageRequest, NestlineError, NestlineResult, OffsetPage,
    OffsetPageRequest, Post, PostCategory, PostFilter, PostId, PostStatus, UserId, VoteCounts,
};
use shaku::Component;
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;

const POST_COLUMNS: &str = "id, author_id, title, body, category, status, pinned, locked, \
                            like_count, dislike_count, comment_count, created_at, updated_at";

/// MySQL post store implementation.
#[derive(Component, Clone)]
#[shaku(interface = PostStore)]
pub struct MySqlPostStore {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl MySqlPostStore {
    /// Creates a new MySQL post store.
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

/// Database row representation of a post.
#[derive(Debug, FromRow)]
struct PostRow {
    id: String, // MySQL stores UUID as CHAR(36)
    author_id: String,
    title: String,
    body: String,
    category: String,
    status: String,
    pinned: bool,
    locked: bool,
    like_count: i64,
    dislike_count: i64,
    comment_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PostRow> for Post {
    type Error = NestlineError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        let category = PostCategory::parse(&row.category).ok_or_else(|| {
            NestlineError::Internal(format!("Invalid post category in database: {}", row.category))
        })?;
        let status = PostStatus::parse(&row.status).ok_or_else(|| {
            NestlineError::Internal(format!("Invalid post status in database: {}", row.status))
        })?;

        Ok(Post {
            id: PostId::from_uuid(parse_uuid(&row.id)?),
            author_id: UserId::from_uuid(parse_uuid(&row.author_id)?),
            title: row.title,
            body: row.body,
            category,
            status,
            pinned: row.pinned,
            locked: row.locked,
            like_count: row.like_count,
            dislike_count: row.dislike_count,
            comment_count: row.comment_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Renders the filter as SQL clauses plus the values to bind, in order.
///
/// Mirrors [`PostFilter::matches`] clause for clause; an absent status
/// means "anything not deleted".
fn filter_sql(filter: &PostFilter) -> (String, Vec<String>) {
    let mut clauses = Vec::new();
    let mut binds = Vec::new();

    match filter.status {
        Some(status) => {
            clauses.push("status = ?".to_string());
            binds.push(status.as_str().to_string());
        }
        None => clauses.push("status != 'deleted'".to_string()),
    }
    if let Some(category) = filter.category {
        clauses.push("category = ?".to_string());
        binds.push(category.as_str().to_string());
    }
    if let Some(author_id) = filter.author_id {
        clauses.push("author_id = ?".to_string());
        binds.push(author_id.to_string());
    }
    if let Some(search) = &filter.search {
        clauses.push("(LOWER(title) LIKE ? OR LOWER(body) LIKE ?)".to_string());
        let pattern = like_pattern(search);
        binds.push(pattern.clone());
        binds.push(pattern);
    }

    (clauses.join(" AND "), binds)
}

/// Escapes LIKE wildcards in a user-supplied search term.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped.to_lowercase())
}

#[async_trait]
impl PostStore for MySqlPostStore {
    async fn find_by_id(&self, id: PostId) -> NestlineResult<Option<Post>> {
        debug!("Finding post by id: {}", id);

        let sql = format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS);
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(self.pool.inner())
            .await?;

        row.map(Post::try_from).transpose()
    }

    async fn list(
        &self,
        filter: &PostFilter,
        page: OffsetPageRequest,
    ) -> NestlineResult<OffsetPage<Post>> {
        debug!("Listing posts, limit: {}, offset: {}", page.limit, page.offset);

        let (where_sql, binds) = filter_sql(filter);

        let count_sql = format!("SELECT COUNT(*) FROM posts WHERE {}", where_sql);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for bind in &binds {
            count_query = count_query.bind(bind.as_str());
        }
        let total = count_query.fetch_one(self.pool.inner()).await?;

        let rows_sql = format!(
            "SELECT {} FROM posts WHERE {} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            POST_COLUMNS, where_sql
        );
        let mut rows_query = sqlx::query_as::<_, PostRow>(&rows_sql);
        for bind in &binds {
            rows_query = rows_query.bind(bind.as_str());
        }
        let rows = rows_query
            .bind(i64::from(page.limit))
            .bind(i64::try_from(page.offset).unwrap_or(i64::MAX))
            .fetch_all(self.pool.inner())
            .await?;

        let posts: Vec<Post> = rows
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(OffsetPage::new(posts, u64::try_from(total).unwrap_or(0), page))
    }

    async fn feed(
        &self,
        filter: &PostFilter,
        page: CursorPageRequest,
    ) -> NestlineResult<CursorPage<Post>> {
        debug!("Walking post feed, limit: {}", page.limit);

        let position = page.position()?;
        let (where_sql, binds) = filter_sql(filter);

        let mut sql = format!("SELECT {} FROM posts WHERE {}", POST_COLUMNS, where_sql);
        if position.is_some() {
            sql.push_str(" AND (created_at < ? OR (created_at = ? AND id < ?))");
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT ?");

        let mut query = sqlx::query_as::<_, PostRow>(&sql);
        for bind in &binds {
            query = query.bind(bind.as_str());
        }
        if let Some(position) = &position {
            query = query
                .bind(position.created_at)
                .bind(position.created_at)
                .bind(position.id.to_string());
        }
        let rows = query
            .bind(i64::from(page.fetch_size()))
            .fetch_all(self.pool.inner())
            .await?;

        let posts: Vec<Post> = rows
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CursorPage::from_rows(posts, page.limit, Post::cursor_position))
    }

    async fn trending(&self, limit: u32) -> NestlineResult<Vec<Post>> {
        debug!("Loading trending posts, limit: {}", limit);

        let sql = format!(
            "SELECT {} FROM posts WHERE status = 'active' \
             ORDER BY (like_count - dislike_count) DESC, created_at DESC LIMIT ?",
            POST_COLUMNS
        );
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(i64::from(limit))
            .fetch_all(self.pool.inner())
            .await?;

        rows.into_iter().map(Post::try_from).collect()
    }

    async fn insert(&self, post: &Post) -> NestlineResult<Post> {
        debug!("Inserting post: {}", post.id);

        sqlx::query(
            r#"
            INSERT INTO posts (id, author_id, title, body, category, status, pinned, locked,
                               like_count, dislike_count, comment_count, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(post.id.to_string())
        .bind(post.author_id.to_string())
        .bind(&post.title)
        .bind(&post.body)
        .bind(post.category.as_str())
        .bind(post.status.as_str())
        .bind(post.pinned)
        .bind(post.locked)
        .bind(post.like_count)
        .bind(post.dislike_count)
        .bind(post.comment_count)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(self.pool.inner())
        .await?;

        // MySQL doesn't support RETURNING, so insert then select
        self.find_by_id(post.id)
            .await?
            .ok_or_else(|| NestlineError::Internal("Failed to fetch inserted post".to_string()))
    }

    async fn update(&self, post: &Post) -> NestlineResult<Post> {
        debug!("Updating post: {}", post.id);

        // Counters are deliberately absent: they only move through the
        // refresh methods, fed from aggregation.
        sqlx::query(
            r#"
            UPDATE posts
            SET title = ?, body = ?, category = ?, status = ?, pinned = ?, locked = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&post.title)
        .bind(&post.body)
        .bind(post.category.as_str())
        .bind(post.status.as_str())
        .bind(post.pinned)
        .bind(post.locked)
        .bind(post.updated_at)
        .bind(post.id.to_string())
        .execute(self.pool.inner())
        .await?;

        self.find_by_id(post.id)
            .await?
            .ok_or_else(|| NestlineError::Internal("Failed to fetch updated post".to_string()))
    }

    async fn set_status(&self, id: PostId, status: PostStatus) -> NestlineResult<bool> {
        debug!("Setting post {} status to {}", id, status.as_str());

        let result = sqlx::query("UPDATE posts SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(time::now())
            .bind(id.to_string())
            .execute(self.pool.inner())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_pinned(&self, id: PostId, pinned: bool) -> NestlineResult<bool> {
        let result = sqlx::query("UPDATE posts SET pinned = ?, updated_at = ? WHERE id = ?")
            .bind(pinned)
            .bind(time::now())
            .bind(id.to_string())
            .execute(self.pool.inner())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_locked(&self, id: PostId, locked: bool) -> NestlineResult<bool> {
        let result = sqlx::query("UPDATE posts SET locked = ?, updated_at = ? WHERE id = ?")
            .bind(locked)
            .bind(time::now())
            .bind(id.to_string())
            .execute(self.pool.inner())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn refresh_vote_counts(&self, id: PostId, counts: &VoteCounts) -> NestlineResult<bool> {
        debug!("Refreshing vote counts for post {}", id);

        let result = sqlx::query("UPDATE posts SET like_count = ?, dislike_count = ? WHERE id = ?")
            .bind(counts.like_count as i64)
            .bind(counts.dislike_count as i64)
            .bind(id.to_string())
            .execute(self.pool.inner())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn refresh_comment_count(&self, id: PostId, count: u64) -> NestlineResult<bool> {
        debug!("Refreshing comment count for post {}", id);

        let result = sqlx::query("UPDATE posts SET comment_count = ? WHERE id = ?")
            .bind(count as i64)
            .bind(id.to_string())
            .execute(self.pool.inner())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self, filter: &PostFilter) -> NestlineResult<u64> {
        let (where_sql, binds) = filter_sql(filter);
        let sql = format!("SELECT COUNT(*) FROM posts WHERE {}", where_sql);

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for bind in &binds {
            query = query.bind(bind.as_str());
        }
        let count = query.fetch_one(self.pool.inner()).await?;

        Ok(u64::try_from(count).unwrap_or(0))
    }
}

impl std::fmt::Debug for MySqlPostStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlPostStore").finish_non_exhaustive()
    }
}
