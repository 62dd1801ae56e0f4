//! Session record entity.

use crate::{time, SessionRecordId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A parent's private log of a care or therapy session.
///
/// `notes` and `concerns` are the sensitive pair: at rest they hold
/// ciphertext envelopes, and only the session-record service sees them
/// as plaintext. Every read and write of a record is scoped to its
/// owner; there is no shared or public view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Unique identifier for the record.
    pub id: SessionRecordId,

    /// The user the record belongs to.
    pub owner_id: UserId,

    /// Short label for the session.
    pub title: String,

    /// When the session took place.
    pub session_date: DateTime<Utc>,

    /// Provider or clinic name.
    pub provider_name: Option<String>,

    /// Session notes. Sensitive.
    pub notes: String,

    /// Concerns to follow up on. Sensitive.
    pub concerns: Option<String>,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Creates a new session record.
    #[must_use]
    pub fn new(
        owner_id: UserId,
        title: impl Into<String>,
        session_date: DateTime<Utc>,
        provider_name: Option<String>,
        notes: impl Into<String>,
        concerns: Option<String>,
    ) -> Self {
        let now = time::now();
        Self {
            id: SessionRecordId::new(),
            owner_id,
            title: title.into(),
            session_date,
            provider_name,
            notes: notes.into(),
            concerns,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies an edit, touching the update timestamp.
    pub fn apply_update(
        &mut self,
        title: Option<String>,
        session_date: Option<DateTime<Utc>>,
        provider_name: Option<Option<String>>,
        notes: Option<String>,
        concerns: Option<Option<String>>,
    ) {
        if let Some(title) = title {
            self.title = title;
        }
        if let Some(session_date) = session_date {
            self.session_date = session_date;
        }
        if let Some(provider_name) = provider_name {
            self.provider_name = provider_name;
        }
        if let Some(notes) = notes {
            self.notes = notes;
        }
        if let Some(concerns) = concerns {
            self.concerns = concerns;
        }
        self.updated_at = time::now();
    }
}
