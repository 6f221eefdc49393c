// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token inspector: reads bearer token claims **without verifying the signature**.
//!
//! ## Security
//!
//! Nothing decoded here may be used for an authorization decision. The client
//! reads `exp` only to time a proactive refresh; the backend remains the sole
//! trust boundary and rejects forged or expired tokens with 401.

use super::claims::TokenClaims;
use super::error::DecodeError;

/// Decode the claims of `token`.
///
/// Returns `Ok(None)` for an empty token and `Err` for anything that is not a
/// well-formed JWT.
pub fn decode(token: &str) -> Result<Option<TokenClaims>, DecodeError> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(None);
    }

    let token_data = jsonwebtoken::dangerous::insecure_decode::<TokenClaims>(token)?;
    Ok(Some(token_data.claims))
}

/// Decode `token`, collapsing every failure to `None`.
pub fn decode_lenient(token: &str) -> Option<TokenClaims> {
    match decode(token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!(error_code = e.error_code(), "Bearer token claims unreadable");
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod test_tokens {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    /// Build an unsigned JWT with the given JSON claims (for testing only).
    pub fn unsigned_jwt(claims: &serde_json::Value) -> String {
        let header = r#"{"alg":"HS256","typ":"JWT"}"#;
        let header_b64 = URL_SAFE_NO_PAD.encode(header.as_bytes());
        let claims_b64 = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
        format!("{header_b64}.{claims_b64}.fake_signature")
    }

    /// Unsigned JWT for `sub` expiring at `exp`.
    pub fn jwt_expiring_at(sub: &str, exp: i64) -> String {
        unsigned_jwt(&serde_json::json!({ "sub": sub, "iat": exp - 3600, "exp": exp }))
    }
}

#[cfg(test)]
mod tests {
    use super::test_tokens::{jwt_expiring_at, unsigned_jwt};
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use serde_json::json;

    #[test]
    fn empty_token_has_no_claims() {
        assert_eq!(decode("").unwrap(), None);
        assert_eq!(decode("   ").unwrap(), None);
    }

    #[test]
    fn decodes_claims_without_signature_check() {
        let token = jwt_expiring_at("admin_7", 9_999_999_999);
        let claims = decode(&token).unwrap().unwrap();
        assert_eq!(claims.sub.as_deref(), Some("admin_7"));
        assert_eq!(claims.exp, Some(9_999_999_999));
    }

    #[test]
    fn expired_token_still_decodes() {
        let token = jwt_expiring_at("admin_7", 1);
        let claims = decode(&token).unwrap().unwrap();
        assert!(claims.is_expired_at(2));
    }

    #[test]
    fn token_without_exp_decodes() {
        let token = unsigned_jwt(&json!({ "sub": "svc" }));
        let claims = decode(&token).unwrap().unwrap();
        assert_eq!(claims.exp, None);
    }

    #[test]
    fn non_token_string_is_decode_error() {
        let err = decode("definitely-not-a-jwt").unwrap_err();
        assert_eq!(err.error_code(), "malformed_token");
        assert!(decode_lenient("definitely-not-a-jwt").is_none());
    }

    #[test]
    fn non_json_payload_is_invalid_claims() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(b"not json");
        let token = format!("{header}.{payload}.sig");
        assert!(decode(&token).is_err());
        assert!(decode_lenient(&token).is_none());
    }
}
