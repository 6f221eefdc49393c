// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Symmetric cipher adapter for persisted session values.
//!
//! ## Security Note
//!
//! The secret is a static string shipped with the client. Anyone holding the
//! client build holds the key, so this layer is **storage obfuscation**, not
//! confidentiality. It keeps tokens out of plain sight in the persistent
//! store; it does not protect them from a determined local reader.
//!
//! ## Format
//!
//! `base64(nonce || ciphertext || tag)` using XChaCha20-Poly1305 with a
//! 192-bit random nonce. The key is `SHA-256(secret)`.

use base64ct::{Base64, Encoding};
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use sha2::{Digest, Sha256};

/// XChaCha20 nonce length in bytes.
const NONCE_LEN: usize = 24;

/// Poly1305 tag length in bytes.
const TAG_LEN: usize = 16;

/// Failure to encrypt or recover a stored value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CipherError {
    /// Ciphertext is not valid base64
    #[error("ciphertext is not valid base64")]
    InvalidEncoding,
    /// Ciphertext is shorter than nonce + tag
    #[error("ciphertext is truncated")]
    Truncated,
    /// Tag check failed (foreign key or tampered value)
    #[error("ciphertext failed authentication")]
    Authentication,
    /// Decrypted bytes are not UTF-8
    #[error("decrypted value is not valid UTF-8")]
    InvalidUtf8,
    /// AEAD refused to encrypt the payload
    #[error("encryption failed")]
    Encrypt,
}

impl CipherError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            CipherError::InvalidEncoding => "invalid_encoding",
            CipherError::Truncated => "truncated",
            CipherError::Authentication => "authentication_failed",
            CipherError::InvalidUtf8 => "invalid_utf8",
            CipherError::Encrypt => "encrypt_failed",
        }
    }
}

/// Cipher bound to one secret.
///
/// Derives the key once so repeated store operations do not rehash the secret.
#[derive(Clone)]
pub struct StorageCipher {
    cipher: XChaCha20Poly1305,
}

impl StorageCipher {
    /// Create a cipher from the shared secret string.
    pub fn new(secret: &str) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        Self {
            cipher: XChaCha20Poly1305::new(Key::from_slice(digest.as_slice())),
        }
    }

    /// Encrypt a plaintext string.
    ///
    /// Output differs between calls for the same input (fresh nonce each time).
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
        let sealed = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::Encrypt)?;

        let mut framed = Vec::with_capacity(NONCE_LEN + sealed.len());
        framed.extend_from_slice(nonce.as_slice());
        framed.extend_from_slice(&sealed);
        Ok(Base64::encode_string(&framed))
    }

    /// Decrypt a value produced by [`StorageCipher::encrypt`] with the same secret.
    pub fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError> {
        let framed =
            Base64::decode_vec(ciphertext.trim()).map_err(|_| CipherError::InvalidEncoding)?;
        if framed.len() < NONCE_LEN + TAG_LEN {
            return Err(CipherError::Truncated);
        }

        let (nonce, sealed) = framed.split_at(NONCE_LEN);
        let opened = self
            .cipher
            .decrypt(XNonce::from_slice(nonce), sealed)
            .map_err(|_| CipherError::Authentication)?;

        String::from_utf8(opened).map_err(|_| CipherError::InvalidUtf8)
    }
}

impl std::fmt::Debug for StorageCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageCipher").finish_non_exhaustive()
    }
}

/// One-shot encrypt with `secret`.
pub fn encrypt(secret: &str, plaintext: &str) -> Result<String, CipherError> {
    StorageCipher::new(secret).encrypt(plaintext)
}

/// One-shot decrypt with `secret`.
pub fn decrypt(secret: &str, ciphertext: &str) -> Result<String, CipherError> {
    StorageCipher::new(secret).decrypt(ciphertext)
}
