//! # Nestline Core
//!
//! Core types, errors, pagination, and domain model for the Nestline
//! data-access layer. This crate provides the foundational abstractions
//! used by the repository and service layers.

pub mod domain;
pub mod error;
pub mod id;
pub mod pagination;
pub mod result;
pub mod time;
pub mod validation;

pub use domain::*;
pub use error::*;
pub use id::*;
pub use pagination::*;
pub use result::*;
pub use validation::*;

// Re-export shaku for dependency injection
pub use shaku::Interface;
