//! MySQL store implementations.

mod comment_store;
mod post_store;
mod session_record_store;
mod vote_store;

pub use comment_store::MySqlCommentStore;
pub use post_store::MySqlPostStore;
pub use session_record_store::MySqlSessionRecordStore;
pub use vote_store::MySqlVoteStore;

use nestline_core::{NestlineError, NestlineResult};
use uuid::Uuid;

/// Parses a CHAR(36) column into a UUID.
pub(crate) fn parse_uuid(value: &str) -> NestlineResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| NestlineError::Internal(format!("Invalid UUID in database: {}", e)))
}
