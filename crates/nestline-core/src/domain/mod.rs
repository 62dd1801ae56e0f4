//! # Nestline Domain
//!
//! Domain entities and value objects for the forum and session-record
//! data model.

pub mod entities;
pub mod value_objects;

pub use entities::*;
pub use value_objects::*;
