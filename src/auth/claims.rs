// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and authenticated user representation.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Signed payload of every access and refresh token.
///
/// Access and refresh tokens share this shape; they differ only in TTL and
/// in how callers treat them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID). Defaults to empty so a missing subject is reported
    /// as empty claims rather than a malformed payload.
    #[serde(default)]
    pub sub: String,

    /// Issued at (Unix seconds)
    pub iat: i64,

    /// Expiration (Unix seconds)
    pub exp: i64,
}

impl Claims {
    /// Build claims valid from `now` for `ttl`.
    pub fn new(subject: impl Into<String>, now: i64, ttl: Duration) -> Self {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        Self {
            sub: subject.into(),
            iat: now,
            exp: now.saturating_add(ttl_secs),
        }
    }

    /// Seconds of validity left at `now`, or `None` once expired.
    pub fn remaining_secs(&self, now: i64) -> Option<u64> {
        let remaining = self.exp.checked_sub(now)?;
        u64::try_from(remaining).ok().filter(|secs| *secs > 0)
    }
}

/// Authenticated user information produced by a successful validation.
///
/// Carries the verified subject only. Resolving the subject to a full
/// principal is up to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Verified subject of the presented access token
    pub user_id: String,

    /// Raw access token, kept for logout (never serialized)
    #[serde(skip)]
    pub access_token: String,
}

impl AuthenticatedUser {
    pub fn new(user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: access_token.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_claims_expire_after_ttl() {
        let claims = Claims::new("user-42", 1_700_000_000, Duration::from_secs(900));
        assert_eq!(claims.sub, "user-42");
        assert_eq!(claims.iat, 1_700_000_000);
        assert_eq!(claims.exp, 1_700_000_900);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn remaining_secs_counts_down_to_none() {
        let claims = Claims::new("user-42", 100, Duration::from_secs(10));
        assert_eq!(claims.remaining_secs(100), Some(10));
        assert_eq!(claims.remaining_secs(109), Some(1));
        assert_eq!(claims.remaining_secs(110), None);
        assert_eq!(claims.remaining_secs(500), None);
    }

    #[test]
    fn missing_subject_deserializes_as_empty() {
        let claims: Claims = serde_json::from_str(r#"{"iat":1,"exp":2}"#).unwrap();
        assert!(claims.sub.is_empty());
    }

    #[test]
    fn access_token_is_not_serialized() {
        let user = AuthenticatedUser::new("user_123", "secret.token.value");
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["user_id"], "user_123");
        assert!(json.get("access_token").is_none());
    }
}
