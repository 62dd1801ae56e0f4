//! Result type aliases for Nestline.

use crate::NestlineError;

/// A specialized `Result` type for Nestline operations.
pub type NestlineResult<T> = Result<T, NestlineError>;
