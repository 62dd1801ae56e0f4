//! MySQL session record store implementation.

use crate::mysql::parse_uuid;
use crate::{traits::SessionRecordStore, DatabasePoolInterface};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nestline_core::{
    NestlineResult, OffsetPage, OffsetPageRequest, SessionRecord, SessionRecordId, UserId,
};
use shaku::Component;
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;

const SESSION_RECORD_COLUMNS: &str = "id, owner_id, title, session_date, provider_name, \
                                      notes, concerns, created_at, updated_at";

/// MySQL session record store implementation.
///
/// Stores `notes` and `concerns` exactly as handed to it; the values
/// arriving here are already ciphertext envelopes.
#[derive(Component, Clone)]
#[shaku(interface = SessionRecordStore)]
pub struct MySqlSessionRecordStore {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl MySqlSessionRecordStore {
    /// Creates a new MySQL session record store.
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

/// Database row representation of a session record.
#[derive(Debug, FromRow)]
struct SessionRecordRow {
    id: String, // MySQL stores UUID as CHAR(36)
    owner_id: String,
    title: String,
    session_date: DateTime<Utc>,
    provider_name: Option<String>,
    notes: String,
    concerns: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SessionRecordRow> for SessionRecord {
    type Error = nestline_core::NestlineError;

    fn try_from(row: SessionRecordRow) -> Result<Self, Self::Error> {
        Ok(SessionRecord {
            id: SessionRecordId::from_uuid(parse_uuid(&row.id)?),
            owner_id: UserId::from_uuid(parse_uuid(&row.owner_id)?),
            title: row.title,
            session_date: row.session_date,
            provider_name: row.provider_name,
            notes: row.notes,
            concerns: row.concerns,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl SessionRecordStore for MySqlSessionRecordStore {
    async fn insert(&self, record: &SessionRecord) -> NestlineResult<SessionRecord> {
        debug!("Inserting session record: {}", record.id);

        sqlx::query(
            r#"
            INSERT INTO session_records (id, owner_id, title, session_date, provider_name,
                                         notes, concerns, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.to_string())
        .bind(record.owner_id.to_string())
        .bind(&record.title)
        .bind(record.session_date)
        .bind(&record.provider_name)
        .bind(&record.notes)
        .bind(&record.concerns)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(self.pool.inner())
        .await?;

        // MySQL doesn't support RETURNING, so insert then select
        self.find_owned(record.id, record.owner_id)
            .await?
            .ok_or_else(|| {
                nestline_core::NestlineError::Internal(
                    "Failed to fetch inserted session record".to_string(),
                )
            })
    }

    async fn find_owned(
        &self,
        id: SessionRecordId,
        owner_id: UserId,
    ) -> NestlineResult<Option<SessionRecord>> {
        debug!("Finding session record {} for owner", id);

        let sql = format!(
            "SELECT {} FROM session_records WHERE id = ? AND owner_id = ?",
            SESSION_RECORD_COLUMNS
        );
        let row = sqlx::query_as::<_, SessionRecordRow>(&sql)
            .bind(id.to_string())
            .bind(owner_id.to_string())
            .fetch_optional(self.pool.inner())
            .await?;

        row.map(SessionRecord::try_from).transpose()
    }

    async fn list_owned(
        &self,
        owner_id: UserId,
        page: OffsetPageRequest,
    ) -> NestlineResult<OffsetPage<SessionRecord>> {
        debug!("Listing session records, limit: {}, offset: {}", page.limit, page.offset);

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM session_records WHERE owner_id = ?",
        )
        .bind(owner_id.to_string())
        .fetch_one(self.pool.inner())
        .await?;

        let sql = format!(
            "SELECT {} FROM session_records WHERE owner_id = ? \
             ORDER BY session_date DESC, id DESC LIMIT ? OFFSET ?",
            SESSION_RECORD_COLUMNS
        );
        let rows = sqlx::query_as::<_, SessionRecordRow>(&sql)
            .bind(owner_id.to_string())
            .bind(i64::from(page.limit))
            .bind(i64::try_from(page.offset).unwrap_or(i64::MAX))
            .fetch_all(self.pool.inner())
            .await?;

        let records: Vec<SessionRecord> = rows
            .into_iter()
            .map(SessionRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(OffsetPage::new(records, u64::try_from(total).unwrap_or(0), page))
    }

    async fn update_owned(&self, record: &SessionRecord) -> NestlineResult<Option<SessionRecord>> {
        debug!("Updating session record: {}", record.id);

        sqlx::query(
            r#"
            UPDATE session_records
            SET title = ?, session_date = ?, provider_name = ?, notes = ?, concerns = ?,
                updated_at = ?
            WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(&record.title)
        .bind(record.session_date)
        .bind(&record.provider_name)
        .bind(&record.notes)
        .bind(&record.concerns)
        .bind(record.updated_at)
        .bind(record.id.to_string())
        .bind(record.owner_id.to_string())
        .execute(self.pool.inner())
        .await?;

        // Re-fetch rather than trusting rows_affected: with an unchanged
        // payload MySQL may report zero matched-or-changed rows.
        self.find_owned(record.id, record.owner_id).await
    }

    async fn delete_owned(&self, id: SessionRecordId, owner_id: UserId) -> NestlineResult<bool> {
        debug!("Deleting session record: {}", id);

        let result = sqlx::query("DELETE FROM session_records WHERE id = ? AND owner_id = ?")
            .bind(id.to_string())
            .bind(owner_id.to_string())
            .execute(self.pool.inner())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl std::fmt::Debug for MySqlSessionRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlSessionRecordStore").finish_non_exhaustive()
    }
}
