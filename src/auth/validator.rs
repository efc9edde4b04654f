// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token validation.
//!
//! ## Decision Order
//!
//! 1. The credential must carry the exact `Bearer ` prefix; anything else is
//!    rejected without decoding.
//! 2. The revocation store is consulted for the raw token. A blacklist entry
//!    wins even over a token that would otherwise verify. A store failure is
//!    reported as [`InvalidReason::StoreUnavailable`], never as "not
//!    blacklisted".
//! 3. The codec verifies signature, shape, subject and expiry.
//!
//! Validation has no side effects and can be abandoned at any await point.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, warn};
use utoipa::ToSchema;

use super::codec::{DecodeError, TokenCodec};
use crate::storage::{RevocationClient, BLACKLIST_SENTINEL};

/// Credential prefix, case-sensitive with exactly one space.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Why a credential was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    /// Credential lacks the `Bearer ` prefix
    NotBearer,
    /// Token was explicitly revoked
    Blacklisted,
    /// Signature verification failed
    BadSignature,
    /// Token is not a well-formed JWS
    Malformed,
    /// Signature is valid but the token has expired
    Expired,
    /// Token uses an algorithm other than HS256
    Unsupported,
    /// Token or subject is empty
    EmptyClaims,
    /// Revocation store errored or timed out
    StoreUnavailable,
    /// Refresh token has no live registration for its subject
    UnknownRefreshToken,
}

impl InvalidReason {
    /// Stable machine-readable code.
    pub fn as_str(self) -> &'static str {
        match self {
            InvalidReason::NotBearer => "not_bearer",
            InvalidReason::Blacklisted => "blacklisted",
            InvalidReason::BadSignature => "bad_signature",
            InvalidReason::Malformed => "malformed",
            InvalidReason::Expired => "expired",
            InvalidReason::Unsupported => "unsupported",
            InvalidReason::EmptyClaims => "empty_claims",
            InvalidReason::StoreUnavailable => "store_unavailable",
            InvalidReason::UnknownRefreshToken => "unknown_refresh_token",
        }
    }

    /// Whether this is an authentication verdict.
    ///
    /// `StoreUnavailable` is a service fault: the credential was neither
    /// accepted nor refused and the request should be retried.
    pub fn is_verdict(self) -> bool {
        self != InvalidReason::StoreUnavailable
    }
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<DecodeError> for InvalidReason {
    fn from(e: DecodeError) -> Self {
        match e {
            DecodeError::BadSignature => InvalidReason::BadSignature,
            DecodeError::Malformed => InvalidReason::Malformed,
            DecodeError::Expired => InvalidReason::Expired,
            DecodeError::Unsupported => InvalidReason::Unsupported,
            DecodeError::EmptyClaims => InvalidReason::EmptyClaims,
        }
    }
}

/// Result of validating a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Verified subject
    Valid(String),
    Invalid(InvalidReason),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid(_))
    }

    pub fn into_result(self) -> Result<String, InvalidReason> {
        match self {
            ValidationOutcome::Valid(subject) => Ok(subject),
            ValidationOutcome::Invalid(reason) => Err(reason),
        }
    }
}

/// Strip the bearer prefix from a credential.
///
/// Returns `None` unless the value starts with exactly `Bearer `.
pub fn extract_bearer(credential: &str) -> Option<&str> {
    credential.strip_prefix(BEARER_PREFIX)
}

/// Validates presented tokens against the blacklist and the codec.
pub struct TokenValidator {
    codec: Arc<TokenCodec>,
    revocations: RevocationClient,
}

impl TokenValidator {
    pub fn new(codec: Arc<TokenCodec>, revocations: RevocationClient) -> Self {
        Self { codec, revocations }
    }

    /// Validate a full `Authorization` header value.
    pub async fn validate_header(&self, credential: &str) -> ValidationOutcome {
        match extract_bearer(credential) {
            Some(token) => self.validate_access_token(token).await,
            None => {
                warn!(reason = %InvalidReason::NotBearer, "Access token rejected");
                ValidationOutcome::Invalid(InvalidReason::NotBearer)
            }
        }
    }

    /// Validate a raw access token: blacklist first, then the codec.
    pub async fn validate_access_token(&self, token: &str) -> ValidationOutcome {
        match self.revocations.get(token).await {
            Ok(Some(value)) if value == BLACKLIST_SENTINEL => {
                warn!(reason = %InvalidReason::Blacklisted, "Access token rejected");
                return ValidationOutcome::Invalid(InvalidReason::Blacklisted);
            }
            Ok(_) => {}
            Err(e) => {
                error!(
                    error = %e,
                    backend = self.revocations.backend(),
                    "Blacklist lookup failed"
                );
                return ValidationOutcome::Invalid(InvalidReason::StoreUnavailable);
            }
        }

        self.decode(token, "Access token rejected")
    }

    /// Validate a raw refresh token structurally.
    ///
    /// Only the codec is consulted. Revocation of refresh tokens is enforced
    /// by the refresh flow, which requires a live store registration.
    pub fn validate_refresh_token(&self, token: &str) -> ValidationOutcome {
        self.decode(token, "Refresh token rejected")
    }

    fn decode(&self, token: &str, message: &'static str) -> ValidationOutcome {
        match self.codec.decode(token) {
            Ok(claims) => ValidationOutcome::Valid(claims.sub),
            Err(e) => {
                let reason = InvalidReason::from(e);
                warn!(reason = %reason, "{message}");
                ValidationOutcome::Invalid(reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::ManualClock;
    use crate::auth::issuer::TokenIssuer;
    use crate::auth::keys::SigningKey;
    use crate::storage::test_stores::{FailingStore, StalledStore};
    use crate::storage::{InMemoryRevocationStore, RevocationStore};
    use std::time::Duration;

    const NOW: i64 = 1_700_000_000;

    struct Fixture {
        validator: TokenValidator,
        issuer: TokenIssuer,
        store: Arc<InMemoryRevocationStore>,
        clock: Arc<ManualClock>,
    }

    fn fixture_with(store_override: Option<Arc<dyn RevocationStore>>) -> Fixture {
        let clock = Arc::new(ManualClock::new(NOW));
        let key = Arc::new(SigningKey::from_secret(b"validator-test-secret").unwrap());
        let codec = Arc::new(TokenCodec::new(key, clock.clone()));
        let store = Arc::new(InMemoryRevocationStore::new(clock.clone()));
        let backing: Arc<dyn RevocationStore> = match store_override {
            Some(custom) => custom,
            None => store.clone(),
        };
        let client = RevocationClient::new(backing, Duration::from_millis(50));

        Fixture {
            validator: TokenValidator::new(codec.clone(), client.clone()),
            issuer: TokenIssuer::new(
                codec,
                client,
                Duration::from_secs(900),
                Duration::from_secs(3600),
            ),
            store,
            clock,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(None)
    }

    #[test]
    fn extract_bearer_requires_exact_prefix() {
        assert_eq!(extract_bearer("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer("Bearer "), Some(""));
        assert_eq!(extract_bearer("bearer abc"), None);
        assert_eq!(extract_bearer("BEARER abc"), None);
        assert_eq!(extract_bearer("Bearer\tabc"), None);
        assert_eq!(extract_bearer("Basic dXNlcjpwYXNz"), None);
        assert_eq!(extract_bearer("abc"), None);
        assert_eq!(extract_bearer(""), None);
    }

    #[tokio::test]
    async fn prefix_is_enforced_before_decoding() {
        let f = fixture();
        let token = f.issuer.issue_access_token("user-42").unwrap();

        let lower = f.validator.validate_header(&format!("bearer {token}")).await;
        assert_eq!(lower, ValidationOutcome::Invalid(InvalidReason::NotBearer));

        let bare = f.validator.validate_header(&token).await;
        assert_eq!(bare, ValidationOutcome::Invalid(InvalidReason::NotBearer));
    }

    #[tokio::test]
    async fn empty_bearer_is_empty_claims() {
        let f = fixture();
        let outcome = f.validator.validate_header("Bearer ").await;
        assert_eq!(outcome, ValidationOutcome::Invalid(InvalidReason::EmptyClaims));
    }

    #[tokio::test]
    async fn access_token_lifecycle() {
        let f = fixture();
        let token = f.issuer.issue_access_token("user-42").unwrap();
        let header = format!("Bearer {token}");

        assert_eq!(
            f.validator.validate_header(&header).await,
            ValidationOutcome::Valid("user-42".to_string())
        );

        f.clock.advance(901);
        assert_eq!(
            f.validator.validate_header(&header).await,
            ValidationOutcome::Invalid(InvalidReason::Expired)
        );
    }

    #[tokio::test]
    async fn blacklisting_revokes_before_expiry() {
        let f = fixture();
        let token = f.issuer.issue_access_token("user-42").unwrap();

        f.store
            .set_with_expiry(&token, BLACKLIST_SENTINEL, 900)
            .await
            .unwrap();
        f.clock.advance(10);

        assert_eq!(
            f.validator.validate_access_token(&token).await,
            ValidationOutcome::Invalid(InvalidReason::Blacklisted)
        );
    }

    #[tokio::test]
    async fn blacklist_takes_precedence_over_decoding() {
        let f = fixture();
        // Not even a token: the blacklist still answers first.
        f.store
            .set_with_expiry("garbage", BLACKLIST_SENTINEL, 60)
            .await
            .unwrap();

        assert_eq!(
            f.validator.validate_access_token("garbage").await,
            ValidationOutcome::Invalid(InvalidReason::Blacklisted)
        );
    }

    #[tokio::test]
    async fn refresh_registration_is_not_a_blacklist() {
        let f = fixture();
        let token = f.issuer.issue_refresh_token("user-42").await.unwrap();

        // A store entry that maps to a subject does not block validation.
        assert_eq!(
            f.validator.validate_access_token(&token).await,
            ValidationOutcome::Valid("user-42".to_string())
        );
    }

    #[tokio::test]
    async fn store_failure_is_not_treated_as_clean() {
        let f = fixture_with(Some(Arc::new(FailingStore)));
        let token = f.issuer.issue_access_token("user-42").unwrap();

        let outcome = f.validator.validate_access_token(&token).await;
        assert_eq!(outcome, ValidationOutcome::Invalid(InvalidReason::StoreUnavailable));
        assert!(!InvalidReason::StoreUnavailable.is_verdict());
    }

    #[tokio::test]
    async fn store_timeout_is_store_unavailable() {
        let f = fixture_with(Some(Arc::new(StalledStore)));
        let token = f.issuer.issue_access_token("user-42").unwrap();

        let outcome = f.validator.validate_header(&format!("Bearer {token}")).await;
        assert_eq!(outcome, ValidationOutcome::Invalid(InvalidReason::StoreUnavailable));
    }

    #[tokio::test]
    async fn refresh_validation_skips_blacklist() {
        let f = fixture();
        let token = f.issuer.issue_refresh_token("user-42").await.unwrap();
        f.store
            .set_with_expiry(&token, BLACKLIST_SENTINEL, 3600)
            .await
            .unwrap();

        assert_eq!(
            f.validator.validate_refresh_token(&token),
            ValidationOutcome::Valid("user-42".to_string())
        );
    }

    #[tokio::test]
    async fn refresh_validation_reports_decode_errors() {
        let f = fixture();
        assert_eq!(
            f.validator.validate_refresh_token("nope"),
            ValidationOutcome::Invalid(InvalidReason::Malformed)
        );

        let token = f.issuer.issue_refresh_token("user-42").await.unwrap();
        f.clock.advance(3600);
        assert_eq!(
            f.validator.validate_refresh_token(&token),
            ValidationOutcome::Invalid(InvalidReason::Expired)
        );
    }

    #[test]
    fn decode_errors_map_one_to_one() {
        let pairs = [
            (DecodeError::BadSignature, InvalidReason::BadSignature),
            (DecodeError::Malformed, InvalidReason::Malformed),
            (DecodeError::Expired, InvalidReason::Expired),
            (DecodeError::Unsupported, InvalidReason::Unsupported),
            (DecodeError::EmptyClaims, InvalidReason::EmptyClaims),
        ];
        for (decode, reason) in pairs {
            assert_eq!(InvalidReason::from(decode), reason);
        }
    }

    #[test]
    fn outcome_into_result() {
        assert_eq!(
            ValidationOutcome::Valid("u".to_string()).into_result(),
            Ok("u".to_string())
        );
        assert_eq!(
            ValidationOutcome::Invalid(InvalidReason::Expired).into_result(),
            Err(InvalidReason::Expired)
        );
    }
}
