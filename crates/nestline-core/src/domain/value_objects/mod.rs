//! Domain value objects.

pub mod category;
pub mod filter;
pub mod status;
pub mod vote_value;

pub use category::PostCategory;
pub use filter::PostFilter;
pub use status::{CommentStatus, PostStatus};
pub use vote_value::{TargetKind, VoteCounts, VoteTarget, VoteValue};
