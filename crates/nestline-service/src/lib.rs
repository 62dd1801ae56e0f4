//! # Nestline Service
//!
//! Business logic service layer for the Nestline forum. Services own the
//! read-through cache, the vote tallies and the session record encryption
//! boundary; stores and the cipher are injected through Shaku.

pub mod cache;
pub mod comment_service;
pub mod di;
pub mod dto;
pub mod post_service;
pub mod session_record_service;
pub mod vote_service;

#[cfg(test)]
mod test_support;

pub use cache::*;
pub use comment_service::*;
pub use di::*;
pub use dto::*;
pub use post_service::*;
pub use session_record_service::*;
pub use vote_service::*;
