//! # Nestline Crypto
//!
//! Field-level encryption for Nestline. Sensitive free-text attributes are
//! sealed with AES-256-GCM into a versioned envelope before they reach the
//! database and opened again on the way out. Values written before
//! encryption was introduced carry no envelope tag and pass through reads
//! unchanged.

pub mod envelope;
pub mod field_cipher;

pub use envelope::*;
pub use field_cipher::*;
