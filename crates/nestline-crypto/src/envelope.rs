//! Versioned envelope format for encrypted field values.
//!
//! An enveloped value is the tag `enc$v1$` followed by the standard-base64
//! encoding of `nonce || ciphertext`. Stored values without the tag are
//! legacy plaintext written before encryption was introduced.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Tag prefix identifying a version-1 encrypted envelope.
pub const ENVELOPE_PREFIX: &str = "enc$v1$";

/// Marker shared by every envelope version, current and future.
const VERSION_MARKER: &str = "enc$";

/// Returns true if the value carries the version-1 envelope tag.
#[must_use]
pub fn is_envelope(value: &str) -> bool {
    value.starts_with(ENVELOPE_PREFIX)
}

/// Returns true if the value claims to be an envelope of any version.
///
/// A value that carries the marker but not a recognized version tag must be
/// rejected rather than treated as legacy plaintext.
#[must_use]
pub(crate) fn has_version_marker(value: &str) -> bool {
    value.starts_with(VERSION_MARKER)
}

/// Wraps a raw `nonce || ciphertext` payload in a version-1 envelope.
#[must_use]
pub(crate) fn seal(payload: &[u8]) -> String {
    format!("{}{}", ENVELOPE_PREFIX, STANDARD.encode(payload))
}

/// Strips the version-1 tag, returning the base64 payload.
pub(crate) fn open(value: &str) -> Option<&str> {
    value.strip_prefix(ENVELOPE_PREFIX)
}
