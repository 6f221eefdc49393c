// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Storage errors.

use std::io;

use super::cipher::CipherError;

/// Error type for session storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error in the persistent backend
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Stored value could not be decrypted (foreign key or corrupted)
    #[error("Entry `{name}` could not be decrypted: {source}")]
    Decrypt {
        name: String,
        #[source]
        source: CipherError,
    },

    /// Value could not be encrypted
    #[error("Entry `{name}` could not be encrypted: {source}")]
    Encrypt {
        name: String,
        #[source]
        source: CipherError,
    },

    /// List-mode write found something that is not a JSON array
    #[error("Entry `{name}` does not hold a list")]
    NotASequence { name: String },

    /// Remove-by-id target carries no `id` field
    #[error("Record has no `id` field")]
    MissingId,
}

impl StorageError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            StorageError::Io(_) => "io",
            StorageError::Json(_) => "json",
            StorageError::Decrypt { .. } => "decrypt_failed",
            StorageError::Encrypt { .. } => "encrypt_failed",
            StorageError::NotASequence { .. } => "not_a_sequence",
            StorageError::MissingId => "missing_id",
        }
    }

    /// Whether this error means the stored value is unreadable rather than
    /// the store itself being unavailable.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            StorageError::Decrypt { .. } | StorageError::NotASequence { .. } | StorageError::Json(_)
        )
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decrypt_error_is_corruption() {
        let err = StorageError::Decrypt {
            name: "USER_TOKEN".to_string(),
            source: CipherError::Authentication,
        };
        assert!(err.is_corruption());
        assert_eq!(err.error_code(), "decrypt_failed");
        assert!(err.to_string().contains("USER_TOKEN"));
    }

    #[test]
    fn io_error_is_not_corruption() {
        let err = StorageError::from(io::Error::new(io::ErrorKind::PermissionDenied, "nope"));
        assert!(!err.is_corruption());
        assert_eq!(err.error_code(), "io");
    }
}
