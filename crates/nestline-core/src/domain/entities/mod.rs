//! Domain entities.

pub mod comment;
pub mod post;
pub mod session_record;
pub mod vote;

pub use comment::Comment;
pub use post::Post;
pub use session_record::SessionRecord;
pub use vote::Vote;
