//! MySQL comment store implementation.

use crate::mysql::parse_uuid;
use crate::{traits::CommentStore, DatabasePoolInterface};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nestline_core::{
    time, Comment, CommentId, CommentStatus, CursorPage, CursorPageRequest, NestlineError,
    NestlineResult, PostId, UserId, VoteCounts,
};
use shaku::Component;
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;

const COMMENT_COLUMNS: &str =
    "id, post_id, author_id, body, status, like_count, dislike_count, created_at, updated_at";

/// MySQL comment store implementation.
#[derive(Component, Clone)]
#[shaku(interface = CommentStore)]
pub struct MySqlCommentStore {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl MySqlCommentStore {
    /// Creates a new MySQL comment store.
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

/// Database row representation of a comment.
#[derive(Debug, FromRow)]
struct CommentRow {
    id: String, // MySQL stores UUID as CHAR(36)
    post_id: String,
    author_id: String,
    body: String,
    status: String,
    like_count: i64,
    dislike_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CommentRow> for Comment {
    type Error = NestlineError;

    fn try_from(row: CommentRow) -> Result<Self, Self::Error> {
        let status = CommentStatus::parse(&row.status).ok_or_else(|| {
            NestlineError::Internal(format!("Invalid comment status in database: {}", row.status))
        })?;

        Ok(Comment {
            id: CommentId::from_uuid(parse_uuid(&row.id)?),
            post_id: PostId::from_uuid(parse_uuid(&row.post_id)?),
            author_id: UserId::from_uuid(parse_uuid(&row.author_id)?),
            body: row.body,
            status,
            like_count: row.like_count,
            dislike_count: row.dislike_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl CommentStore for MySqlCommentStore {
    async fn find_by_id(&self, id: CommentId) -> NestlineResult<Option<Comment>> {
        debug!("Finding comment by id: {}", id);

        let sql = format!("SELECT {} FROM comments WHERE id = ?", COMMENT_COLUMNS);
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(self.pool.inner())
            .await?;

        row.map(Comment::try_from).transpose()
    }

    async fn list_by_post(
        &self,
        post_id: PostId,
        page: CursorPageRequest,
    ) -> NestlineResult<CursorPage<Comment>> {
        debug!("Listing comments for post {}, limit: {}", post_id, page.limit);

        let position = page.position()?;

        let mut sql = format!(
            "SELECT {} FROM comments WHERE post_id = ? AND status = 'active'",
            COMMENT_COLUMNS
        );
        if position.is_some() {
            sql.push_str(" AND (created_at > ? OR (created_at = ? AND id > ?))");
        }
        sql.push_str(" ORDER BY created_at ASC, id ASC LIMIT ?");

        let mut query = sqlx::query_as::<_, CommentRow>(&sql).bind(post_id.to_string());
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

        let comments: Vec<Comment> = rows
            .into_iter()
            .map(Comment::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CursorPage::from_rows(comments, page.limit, Comment::cursor_position))
    }

    async fn insert(&self, comment: &Comment) -> NestlineResult<Comment> {
        debug!("Inserting comment: {}", comment.id);

        sqlx::query(
            r#"
            INSERT INTO comments (id, post_id, author_id, body, status,
                                  like_count, dislike_count, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(comment.id.to_string())
        .bind(comment.post_id.to_string())
        .bind(comment.author_id.to_string())
        .bind(&comment.body)
        .bind(comment.status.as_str())
        .bind(comment.like_count)
        .bind(comment.dislike_count)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .execute(self.pool.inner())
        .await?;

        // MySQL doesn't support RETURNING, so insert then select
        self.find_by_id(comment.id)
            .await?
            .ok_or_else(|| NestlineError::Internal("Failed to fetch inserted comment".to_string()))
    }

    async fn set_status(&self, id: CommentId, status: CommentStatus) -> NestlineResult<bool> {
        debug!("Setting comment {} status to {}", id, status.as_str());

        let result = sqlx::query("UPDATE comments SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(time::now())
            .bind(id.to_string())
            .execute(self.pool.inner())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn refresh_vote_counts(
        &self,
        id: CommentId,
        counts: &VoteCounts,
    ) -> NestlineResult<bool> {
        debug!("Refreshing vote counts for comment {}", id);

        let result =
            sqlx::query("UPDATE comments SET like_count = ?, dislike_count = ? WHERE id = ?")
                .bind(counts.like_count as i64)
                .bind(counts.dislike_count as i64)
                .bind(id.to_string())
                .execute(self.pool.inner())
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_by_post(&self, post_id: PostId) -> NestlineResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM comments WHERE post_id = ? AND status = 'active'",
        )
        .bind(post_id.to_string())
        .fetch_one(self.pool.inner())
        .await?;

        Ok(u64::try_from(count).unwrap_or(0))
    }
}

impl std::fmt::Debug for MySqlCommentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlCommentStore").finish_non_exhaustive()
    }
}
