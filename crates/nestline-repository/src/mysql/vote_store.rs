//! MySQL vote store implementation.

use crate::mysql::parse_uuid;
use crate::{traits::VoteStore, DatabasePoolInterface};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nestline_core::{
    NestlineError, NestlineResult, TargetKind, UserId, Vote, VoteCounts, VoteTarget, VoteValue,
};
use shaku::Component;
use sqlx::FromRow;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

const VOTE_COLUMNS: &str = "user_id, target_kind, target_id, value, created_at, updated_at";

/// MySQL vote store implementation.
#[derive(Component, Clone)]
#[shaku(interface = VoteStore)]
pub struct MySqlVoteStore {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl MySqlVoteStore {
    /// Creates a new MySQL vote store.
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

/// Database row representation of a vote.
#[derive(Debug, FromRow)]
struct VoteRow {
    user_id: String, // MySQL stores UUID as CHAR(36)
    target_kind: String,
    target_id: String,
    value: i8,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<VoteRow> for Vote {
    type Error = NestlineError;

    fn try_from(row: VoteRow) -> Result<Self, Self::Error> {
        let kind = TargetKind::parse(&row.target_kind).ok_or_else(|| {
            NestlineError::Internal(format!(
                "Invalid vote target kind in database: {}",
                row.target_kind
            ))
        })?;
        let value = VoteValue::try_from(row.value).map_err(|_| {
            NestlineError::Internal(format!("Invalid vote value in database: {}", row.value))
        })?;

        Ok(Vote {
            user_id: UserId::from_uuid(parse_uuid(&row.user_id)?),
            target: VoteTarget::new(kind, parse_uuid(&row.target_id)?),
            value,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Aggregated tallies for a single target.
#[derive(Debug, FromRow)]
struct VoteCountRow {
    like_count: i64,
    dislike_count: i64,
}

/// Aggregated tallies keyed by target, for batch lookups.
#[derive(Debug, FromRow)]
struct VoteCountsByTargetRow {
    target_id: String,
    like_count: i64,
    dislike_count: i64,
}

#[async_trait]
impl VoteStore for MySqlVoteStore {
    async fn upsert(&self, vote: &Vote) -> NestlineResult<()> {
        debug!(
            "Upserting vote by {} on {} {}",
            vote.user_id,
            vote.target.kind.as_str(),
            vote.target.id
        );

        // One row per (user, target); a repeat vote overwrites the value
        // in place and keeps created_at.
        sqlx::query(
            r#"
            INSERT INTO votes (user_id, target_kind, target_id, value, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE value = VALUES(value), updated_at = VALUES(updated_at)
            "#,
        )
        .bind(vote.user_id.to_string())
        .bind(vote.target.kind.as_str())
        .bind(vote.target.id.to_string())
        .bind(vote.value.as_i8())
        .bind(vote.created_at)
        .bind(vote.updated_at)
        .execute(self.pool.inner())
        .await?;

        Ok(())
    }

    async fn find(&self, user_id: UserId, target: VoteTarget) -> NestlineResult<Option<Vote>> {
        debug!("Finding vote by {} on {} {}", user_id, target.kind.as_str(), target.id);

        let sql = format!(
            "SELECT {} FROM votes WHERE user_id = ? AND target_kind = ? AND target_id = ?",
            VOTE_COLUMNS
        );
        let row = sqlx::query_as::<_, VoteRow>(&sql)
            .bind(user_id.to_string())
            .bind(target.kind.as_str())
            .bind(target.id.to_string())
            .fetch_optional(self.pool.inner())
            .await?;

        row.map(Vote::try_from).transpose()
    }

    async fn counts_for(&self, target: VoteTarget) -> NestlineResult<VoteCounts> {
        debug!("Aggregating votes for {} {}", target.kind.as_str(), target.id);

        let row = sqlx::query_as::<_, VoteCountRow>(
            r#"
            SELECT COUNT(CASE WHEN value = 1 THEN 1 END) AS like_count,
                   COUNT(CASE WHEN value = -1 THEN 1 END) AS dislike_count
            FROM votes
            WHERE target_kind = ? AND target_id = ?
            "#,
        )
        .bind(target.kind.as_str())
        .bind(target.id.to_string())
        .fetch_one(self.pool.inner())
        .await?;

        Ok(VoteCounts::new(
            u64::try_from(row.like_count).unwrap_or(0),
            u64::try_from(row.dislike_count).unwrap_or(0),
        ))
    }

    async fn counts_for_many(
        &self,
        kind: TargetKind,
        ids: &[Uuid],
    ) -> NestlineResult<HashMap<Uuid, VoteCounts>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        debug!("Aggregating votes for {} {} targets", ids.len(), kind.as_str());

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            r#"
            SELECT target_id,
                   COUNT(CASE WHEN value = 1 THEN 1 END) AS like_count,
                   COUNT(CASE WHEN value = -1 THEN 1 END) AS dislike_count
            FROM votes
            WHERE target_kind = ? AND target_id IN ({})
            GROUP BY target_id
            "#,
            placeholders
        );

        let mut query = sqlx::query_as::<_, VoteCountsByTargetRow>(&sql).bind(kind.as_str());
        for id in ids {
            query = query.bind(id.to_string());
        }
        let rows = query.fetch_all(self.pool.inner()).await?;

        let mut counts = HashMap::with_capacity(rows.len());
        for row in rows {
            counts.insert(
                parse_uuid(&row.target_id)?,
                VoteCounts::new(
                    u64::try_from(row.like_count).unwrap_or(0),
                    u64::try_from(row.dislike_count).unwrap_or(0),
                ),
            );
        }

        Ok(counts)
    }
}

impl std::fmt::Debug for MySqlVoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlVoteStore").finish_non_exhaustive()
    }
}
