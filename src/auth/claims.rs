// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token claims as read by the client.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Claims decoded from a bearer token payload.
///
/// Every field is optional: the backend decides what it puts in the token and
/// the client only reads what it needs for refresh timing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Expiration timestamp (Unix seconds)
    #[serde(
        default,
        deserialize_with = "numeric_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub exp: Option<i64>,

    /// Issued at timestamp (Unix seconds)
    #[serde(
        default,
        deserialize_with = "numeric_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub iat: Option<i64>,

    /// Not before timestamp (Unix seconds)
    #[serde(
        default,
        deserialize_with = "numeric_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub nbf: Option<i64>,

    /// Issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Anything else the backend put in the payload
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl TokenClaims {
    /// Expiry as a timestamp, if the token carries one.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    /// Seconds left until expiry at `now` (negative once expired).
    pub fn remaining_secs(&self, now: i64) -> Option<i64> {
        self.exp.map(|exp| exp.saturating_sub(now))
    }

    /// Whether the token is expired at `now`. Tokens without `exp` never expire here.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.remaining_secs(now).is_some_and(|remaining| remaining <= 0)
    }
}

/// NumericDate may carry a fractional part; sub-second precision is dropped.
fn numeric_date<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    Ok(number
        .as_i64()
        .or_else(|| number.as_f64().map(|secs| secs.trunc() as i64)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_standard_and_custom_claims() {
        let claims: TokenClaims = serde_json::from_value(json!({
            "sub": "admin_1",
            "exp": 1700003600,
            "iat": 1700000000,
            "role": "superadmin"
        }))
        .unwrap();

        assert_eq!(claims.sub.as_deref(), Some("admin_1"));
        assert_eq!(claims.exp, Some(1700003600));
        assert_eq!(claims.extra["role"], "superadmin");
    }

    #[test]
    fn remaining_and_expiry() {
        let claims = TokenClaims {
            exp: Some(1_000),
            ..Default::default()
        };
        assert_eq!(claims.remaining_secs(900), Some(100));
        assert!(!claims.is_expired_at(999));
        assert!(claims.is_expired_at(1_000));
        assert_eq!(claims.expires_at().map(|t| t.timestamp()), Some(1_000));
    }

    #[test]
    fn fractional_dates_are_truncated() {
        let claims: TokenClaims = serde_json::from_value(json!({
            "exp": 1700000000.5,
            "iat": 1699990000.9
        }))
        .unwrap();
        assert_eq!(claims.exp, Some(1_700_000_000));
        assert_eq!(claims.iat, Some(1_699_990_000));
    }

    #[test]
    fn extreme_exp_saturates() {
        let past = TokenClaims {
            exp: Some(i64::MIN),
            ..Default::default()
        };
        assert_eq!(past.remaining_secs(1_700_000_000), Some(i64::MIN));
        assert!(past.is_expired_at(1_700_000_000));

        let future = TokenClaims {
            exp: Some(i64::MAX),
            ..Default::default()
        };
        assert_eq!(future.remaining_secs(-1), Some(i64::MAX));
        assert!(future.expires_at().is_none());
    }

    #[test]
    fn missing_exp_never_expires() {
        let claims = TokenClaims::default();
        assert!(claims.remaining_secs(0).is_none());
        assert!(!claims.is_expired_at(i64::MAX));
    }
}
