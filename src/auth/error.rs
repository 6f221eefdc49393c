// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token decoding errors.

/// Failure to read claims from a bearer token.
///
/// Callers treat this as "claims unknown": it never blocks a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Not three base64url segments, or an unreadable header
    #[error("Token is malformed: {0}")]
    MalformedToken(String),
    /// Payload decoded but is not a JSON claims object
    #[error("Token claims are invalid: {0}")]
    InvalidClaims(String),
}

impl DecodeError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            DecodeError::MalformedToken(_) => "malformed_token",
            DecodeError::InvalidClaims(_) => "invalid_claims",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for DecodeError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::Json(_) => DecodeError::InvalidClaims(e.to_string()),
            _ => DecodeError::MalformedToken(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(
            DecodeError::MalformedToken("x".into()).error_code(),
            "malformed_token"
        );
        assert_eq!(
            DecodeError::InvalidClaims("x".into()).error_code(),
            "invalid_claims"
        );
    }
}
