//! # Nestline Repository
//!
//! Data access layer for the forum:
//!
//! ```text
//! Service
//!   ↓  Arc<dyn PostStore> / CommentStore / VoteStore / SessionRecordStore
//! MySqlPostStore etc.            (store impl, MySQL / SQLx)
//!   ↓  Arc<dyn DatabasePoolInterface>
//! MySQL
//! ```
//!
//! ## Structure
//!
//! ```text
//! src/
//!   traits.rs                    ← store traits
//!   pool.rs                      ← connection pool component
//!   mysql/
//!     post_store.rs              ← MySqlPostStore
//!     comment_store.rs           ← MySqlCommentStore
//!     vote_store.rs              ← MySqlVoteStore
//!     session_record_store.rs    ← MySqlSessionRecordStore
//! ```
//!
//! The stores return domain entities from `nestline-core` and never leak
//! SQLx types upward. Soft-deleted rows stay out of every default read
//! path; vote tallies are only ever produced by aggregation.

pub mod mysql;
pub mod pool;
pub mod traits;

pub use mysql::*;
pub use pool::*;
pub use traits::*;
