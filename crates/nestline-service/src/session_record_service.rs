//! Session record service: owner-scoped access to encrypted therapy logs.
//!
//! Sensitive fields cross this boundary exactly once in each direction:
//! sealed before the store ever sees them, opened after the store returns
//! them. Plaintext is never cached and never leaves the owner's scope.

use crate::dto::{CreateSessionRecordRequest, UpdateSessionRecordRequest};
use async_trait::async_trait;
use nestline_core::{
    Interface, NestlineError, NestlineResult, OffsetPage, OffsetPageRequest, SessionRecord,
    SessionRecordId, UserId, ValidateExt,
};
use nestline_crypto::FieldCipherInterface;
use nestline_repository::SessionRecordStore;
use shaku::Component;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Session record service trait.
#[async_trait]
pub trait SessionRecordService: Interface + Send + Sync {
    /// Creates a record for its owner.
    async fn create_owned(
        &self,
        request: CreateSessionRecordRequest,
    ) -> NestlineResult<SessionRecord>;

    /// Gets one of the owner's records. A record belonging to anyone else
    /// reads as absent.
    async fn get_owned(
        &self,
        id: SessionRecordId,
        owner_id: UserId,
    ) -> NestlineResult<SessionRecord>;

    /// Lists the owner's records, newest session first.
    async fn list_owned(
        &self,
        owner_id: UserId,
        page: OffsetPageRequest,
    ) -> NestlineResult<OffsetPage<SessionRecord>>;

    /// Updates one of the owner's records.
    async fn update_owned(
        &self,
        id: SessionRecordId,
        owner_id: UserId,
        request: UpdateSessionRecordRequest,
    ) -> NestlineResult<SessionRecord>;

    /// Deletes one of the owner's records.
    async fn delete_owned(&self, id: SessionRecordId, owner_id: UserId) -> NestlineResult<()>;
}

/// Concrete session record service component for Shaku DI.
#[derive(Component)]
#[shaku(interface = SessionRecordService)]
pub struct SessionRecordServiceComponent {
    #[shaku(inject)]
    records: Arc<dyn SessionRecordStore>,
    #[shaku(inject)]
    cipher: Arc<dyn FieldCipherInterface>,
}

impl SessionRecordServiceComponent {
    /// Creates a session record service.
    #[must_use]
    pub fn new(records: Arc<dyn SessionRecordStore>, cipher: Arc<dyn FieldCipherInterface>) -> Self {
        Self { records, cipher }
    }

    /// Seals the sensitive fields in place.
    fn seal_record(&self, record: &mut SessionRecord) -> NestlineResult<()> {
        record.notes = self.cipher.encrypt(&record.notes)?;
        if let Some(concerns) = record.concerns.take() {
            record.concerns = Some(self.cipher.encrypt(&concerns)?);
        }
        Ok(())
    }

    /// Opens the sensitive fields of a stored record.
    fn open_record(&self, mut record: SessionRecord) -> NestlineResult<SessionRecord> {
        record.notes = self.open_field(&record.notes, record.id)?;
        if let Some(concerns) = record.concerns.take() {
            record.concerns = Some(self.open_field(&concerns, record.id)?);
        }
        Ok(record)
    }

    /// Opens one stored field, stamping decryption failures with the
    /// record identity.
    fn open_field(&self, stored: &str, id: SessionRecordId) -> NestlineResult<String> {
        self.cipher.decrypt(stored).map_err(|error| match error {
            NestlineError::Decryption { reason, .. } => {
                warn!("Decryption failed for session record {}", id);
                NestlineError::decryption("SessionRecord", id, reason)
            }
            other => other,
        })
    }
}

#[async_trait]
impl SessionRecordService for SessionRecordServiceComponent {
    async fn create_owned(
        &self,
        request: CreateSessionRecordRequest,
    ) -> NestlineResult<SessionRecord> {
        debug!("Creating session record for owner: {}", request.owner_id);

        request.validate_request()?;

        let mut record = SessionRecord::new(
            request.owner_id,
            request.title,
            request.session_date,
            request.provider_name,
            request.notes,
            request.concerns,
        );
        self.seal_record(&mut record)?;
        let stored = self.records.insert(&record).await?;
        let record = self.open_record(stored)?;

        info!(
            "Session record created: {} for owner {}",
            record.id, record.owner_id
        );
        Ok(record)
    }

    async fn get_owned(
        &self,
        id: SessionRecordId,
        owner_id: UserId,
    ) -> NestlineResult<SessionRecord> {
        debug!("Getting session record: {} for owner {}", id, owner_id);

        let record = self
            .records
            .find_owned(id, owner_id)
            .await?
            .ok_or_else(|| NestlineError::not_found("SessionRecord", id))?;
        self.open_record(record)
    }

    async fn list_owned(
        &self,
        owner_id: UserId,
        page: OffsetPageRequest,
    ) -> NestlineResult<OffsetPage<SessionRecord>> {
        debug!(
            "Listing session records for owner: {}, limit: {}, offset: {}",
            owner_id, page.limit, page.offset
        );

        let stored = self.records.list_owned(owner_id, page).await?;
        let OffsetPage {
            data,
            total,
            limit,
            offset,
            has_more,
        } = stored;
        let mut opened = Vec::with_capacity(data.len());
        for record in data {
            opened.push(self.open_record(record)?);
        }
        Ok(OffsetPage {
            data: opened,
            total,
            limit,
            offset,
            has_more,
        })
    }

    async fn update_owned(
        &self,
        id: SessionRecordId,
        owner_id: UserId,
        request: UpdateSessionRecordRequest,
    ) -> NestlineResult<SessionRecord> {
        debug!("Updating session record: {} for owner {}", id, owner_id);

        request.validate_request()?;

        let stored = self
            .records
            .find_owned(id, owner_id)
            .await?
            .ok_or_else(|| NestlineError::not_found("SessionRecord", id))?;
        let mut record = self.open_record(stored)?;
        record.apply_update(
            request.title,
            request.session_date,
            request.provider_name,
            request.notes,
            request.concerns,
        );
        self.seal_record(&mut record)?;
        let stored = self
            .records
            .update_owned(&record)
            .await?
            .ok_or_else(|| NestlineError::not_found("SessionRecord", id))?;
        let record = self.open_record(stored)?;

        info!("Session record updated: {} for owner {}", id, owner_id);
        Ok(record)
    }

    async fn delete_owned(&self, id: SessionRecordId, owner_id: UserId) -> NestlineResult<()> {
        debug!("Deleting session record: {} for owner {}", id, owner_id);

        let deleted = self.records.delete_owned(id, owner_id).await?;
        if !deleted {
            return Err(NestlineError::not_found("SessionRecord", id));
        }

        info!("Session record deleted: {} for owner {}", id, owner_id);
        Ok(())
    }
}

impl std::fmt::Debug for SessionRecordServiceComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRecordServiceComponent")
            .finish_non_exhaustive()
    }
}
