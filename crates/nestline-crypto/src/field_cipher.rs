//! AES-256-GCM field cipher.

use crate::envelope;
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use nestline_core::{Interface, NestlineError, NestlineResult};
use shaku::Component;
use tracing::debug;
use zeroize::Zeroizing;

/// AES-GCM nonce length in bytes.
const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length in bytes.
const TAG_LEN: usize = 16;

/// Interface for field encryption operations.
///
/// This trait abstracts the field cipher for dependency injection.
pub trait FieldCipherInterface: Interface + Send + Sync {
    /// Seals a plaintext field value into an encrypted envelope.
    fn encrypt(&self, plaintext: &str) -> NestlineResult<String>;

    /// Opens a stored field value. Enveloped values are decrypted; legacy
    /// plaintext values are returned unchanged.
    fn decrypt(&self, stored: &str) -> NestlineResult<String>;

    /// Returns true if the stored value is an encrypted envelope.
    fn is_envelope(&self, stored: &str) -> bool;
}

/// A 256-bit field encryption key, zeroized on drop.
#[derive(Clone, Default)]
pub struct FieldKey(Zeroizing<[u8; 32]>);

impl FieldKey {
    /// Wraps raw key bytes.
    #[must_use]
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    fn as_slice(&self) -> &[u8] {
        &self.0[..]
    }
}

impl From<[u8; 32]> for FieldKey {
    fn from(bytes: [u8; 32]) -> Self {
        Self::new(bytes)
    }
}

impl std::fmt::Debug for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldKey").finish_non_exhaustive()
    }
}

/// Field cipher using AES-256-GCM with a random 96-bit nonce per value.
#[derive(Component)]
#[shaku(interface = FieldCipherInterface)]
pub struct AesGcmFieldCipher {
    key: FieldKey,
}

impl AesGcmFieldCipher {
    /// Creates a new field cipher from a 32-byte key.
    #[must_use]
    pub fn new(key: [u8; 32]) -> Self {
        Self {
            key: FieldKey::new(key),
        }
    }

    /// Returns a copy of the key.
    ///
    /// This is used for Shaku component parameter extraction.
    #[must_use]
    pub fn key(&self) -> FieldKey {
        self.key.clone()
    }

    fn cipher(&self) -> NestlineResult<Aes256Gcm> {
        Aes256Gcm::new_from_slice(self.key.as_slice())
            .map_err(|_| NestlineError::Internal("field encryption key must be 32 bytes".to_string()))
    }

    /// Seals a plaintext field value into an encrypted envelope.
    pub fn encrypt(&self, plaintext: &str) -> NestlineResult<String> {
        let cipher = self.cipher()?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| NestlineError::Internal("field encryption failed".to_string()))?;

        let mut payload = nonce.to_vec();
        payload.extend_from_slice(&ciphertext);

        debug!("Field value sealed into envelope");
        Ok(envelope::seal(&payload))
    }

    /// Opens a stored field value.
    ///
    /// Values without an envelope tag predate encryption and are returned
    /// unchanged. Enveloped values that fail to open produce a decryption
    /// error with a reason the caller can attach record identity to.
    pub fn decrypt(&self, stored: &str) -> NestlineResult<String> {
        let Some(encoded) = envelope::open(stored) else {
            if envelope::has_version_marker(stored) {
                return Err(decryption_failure("unrecognized envelope version"));
            }
            debug!("Stored value carries no envelope, passing through");
            return Ok(stored.to_string());
        };

        let payload = STANDARD
            .decode(encoded)
            .map_err(|_| decryption_failure("envelope payload is not valid base64"))?;

        if payload.len() < NONCE_LEN + TAG_LEN {
            return Err(decryption_failure("envelope payload is too short"));
        }

        let (nonce, ciphertext) = payload.split_at(NONCE_LEN);
        let cipher = self.cipher()?;

        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| decryption_failure("ciphertext failed authentication"))?;

        String::from_utf8(plaintext)
            .map_err(|_| decryption_failure("decrypted value is not valid UTF-8"))
    }

    /// Returns true if the stored value is an encrypted envelope.
    #[must_use]
    pub fn is_envelope(&self, stored: &str) -> bool {
        envelope::is_envelope(stored)
    }
}

impl Default for AesGcmFieldCipher {
    /// Creates a cipher using the all-zero development key.
    fn default() -> Self {
        Self {
            key: FieldKey::default(),
        }
    }
}

impl FieldCipherInterface for AesGcmFieldCipher {
    fn encrypt(&self, plaintext: &str) -> NestlineResult<String> {
        Self::encrypt(self, plaintext)
    }

    fn decrypt(&self, stored: &str) -> NestlineResult<String> {
        Self::decrypt(self, stored)
    }

    fn is_envelope(&self, stored: &str) -> bool {
        Self::is_envelope(self, stored)
    }
}

impl std::fmt::Debug for AesGcmFieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesGcmFieldCipher").finish_non_exhaustive()
    }
}

fn decryption_failure(reason: &str) -> NestlineError {
    NestlineError::decryption("field", "unknown", reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cipher() -> AesGcmFieldCipher {
        AesGcmFieldCipher::new([7u8; 32])
    }

    fn reason_of(error: NestlineError) -> String {
        match error {
            NestlineError::Decryption { reason, .. } => reason,
            other => panic!("expected decryption error, got {:?}", other),
        }
    }

    #[test]
    fn test_encrypt_then_decrypt_round_trip() {
        let cipher = test_cipher();
        let sealed = cipher.encrypt("session went well, discussed sleep").unwrap();
        let opened = cipher.decrypt(&sealed).unwrap();
        assert_eq!(opened, "session went well, discussed sleep");
    }

    #[test]
    fn test_encrypt_tags_envelope() {
        let cipher = test_cipher();
        let sealed = cipher.encrypt("notes").unwrap();
        assert!(sealed.starts_with(envelope::ENVELOPE_PREFIX));
        assert!(cipher.is_envelope(&sealed));
        assert!(!cipher.is_envelope("notes"));
    }

    #[test]
    fn test_encrypt_twice_produces_distinct_envelopes() {
        let cipher = test_cipher();
        let first = cipher.encrypt("same plaintext").unwrap();
        let second = cipher.encrypt("same plaintext").unwrap();

        // Fresh nonce per value, so identical plaintext never repeats.
        assert_ne!(first, second);
        assert_eq!(cipher.decrypt(&first).unwrap(), "same plaintext");
        assert_eq!(cipher.decrypt(&second).unwrap(), "same plaintext");
    }

    #[test]
    fn test_legacy_plaintext_passes_through() {
        let cipher = test_cipher();
        let opened = cipher.decrypt("written before encryption existed").unwrap();
        assert_eq!(opened, "written before encryption existed");
    }

    #[test]
    fn test_empty_plaintext_round_trip() {
        let cipher = test_cipher();
        let sealed = cipher.encrypt("").unwrap();
        assert!(cipher.is_envelope(&sealed));
        assert_eq!(cipher.decrypt(&sealed).unwrap(), "");
    }

    #[test]
    fn test_unicode_round_trip() {
        let cipher = test_cipher();
        let plaintext = "très difficile aujourd'hui 😔";
        let sealed = cipher.encrypt(plaintext).unwrap();
        assert_eq!(cipher.decrypt(&sealed).unwrap(), plaintext);
    }

    #[test]
    fn test_unrecognized_version_rejected() {
        let cipher = test_cipher();
        let reason = reason_of(cipher.decrypt("enc$v2$AAAA").unwrap_err());
        assert!(reason.contains("version"));
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let cipher = test_cipher();
        let reason = reason_of(cipher.decrypt("enc$v1$!!!not-base64!!!").unwrap_err());
        assert!(reason.contains("base64"));
    }

    #[test]
    fn test_short_payload_rejected() {
        let cipher = test_cipher();
        let sealed = envelope::seal(&[0u8; 8]);
        let reason = reason_of(cipher.decrypt(&sealed).unwrap_err());
        assert!(reason.contains("too short"));
    }

    #[test]
    fn test_tampered_ciphertext_rejected() {
        let cipher = test_cipher();
        let sealed = cipher.encrypt("original notes").unwrap();

        let encoded = envelope::open(&sealed).unwrap();
        let mut payload = STANDARD.decode(encoded).unwrap();
        let last = payload.len() - 1;
        payload[last] ^= 0x01;
        let tampered = envelope::seal(&payload);

        let reason = reason_of(cipher.decrypt(&tampered).unwrap_err());
        assert!(reason.contains("authentication"));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let sealed = AesGcmFieldCipher::new([1u8; 32]).encrypt("notes").unwrap();
        let other = AesGcmFieldCipher::new([2u8; 32]);
        let reason = reason_of(other.decrypt(&sealed).unwrap_err());
        assert!(reason.contains("authentication"));
    }

    #[test]
    fn test_default_cipher_uses_dev_key() {
        let sealed = AesGcmFieldCipher::default().encrypt("notes").unwrap();
        let opened = AesGcmFieldCipher::new([0u8; 32]).decrypt(&sealed).unwrap();
        assert_eq!(opened, "notes");
    }

    #[test]
    fn test_decryption_error_is_distinct_from_not_found() {
        let cipher = test_cipher();
        let error = cipher.decrypt("enc$v1$AAAA").unwrap_err();
        assert_eq!(error.error_code(), "DECRYPTION_ERROR");
        assert_ne!(error.error_code(), NestlineError::not_found("post", "x").error_code());
    }

    #[test]
    fn test_interface_round_trip() {
        let cipher = test_cipher();
        let sealed = FieldCipherInterface::encrypt(&cipher, "via interface").unwrap();
        assert!(FieldCipherInterface::is_envelope(&cipher, &sealed));
        assert_eq!(
            FieldCipherInterface::decrypt(&cipher, &sealed).unwrap(),
            "via interface"
        );
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let cipher = test_cipher();
        let debug_str = format!("{:?}", cipher);
        assert!(debug_str.contains("AesGcmFieldCipher"));
        assert!(!debug_str.contains('7'));
    }
}
