//! Data Transfer Objects (DTOs).

mod comment_dto;
mod post_dto;
mod session_record_dto;

pub use comment_dto::*;
pub use post_dto::*;
pub use session_record_dto::*;
