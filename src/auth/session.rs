// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Refresh and logout flows built on the issuer and validator.
//!
//! ## Refresh
//!
//! A refresh token is accepted only if it verifies *and* the store still
//! maps it to its own subject. A blacklisted registration is reported as
//! `Blacklisted`; a missing or mismatched one as `UnknownRefreshToken`.
//! The refresh token is not rotated.
//!
//! ## Logout
//!
//! Blacklists the supplied refresh token, then the presented access token,
//! each for exactly its remaining lifetime.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info};
use utoipa::ToSchema;

use super::claims::AuthenticatedUser;
use super::codec::TokenCodec;
use super::error::AuthError;
use super::issuer::TokenIssuer;
use super::validator::{InvalidReason, TokenValidator};
use crate::storage::{RevocationClient, BLACKLIST_SENTINEL};

/// Fresh access token handed out by a refresh.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AccessGrant {
    pub access_token: String,
    /// Always `Bearer`
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: u64,
}

/// Session-level operations over issued tokens.
pub struct SessionManager {
    issuer: Arc<TokenIssuer>,
    validator: Arc<TokenValidator>,
    codec: Arc<TokenCodec>,
    revocations: RevocationClient,
}

impl SessionManager {
    pub fn new(
        issuer: Arc<TokenIssuer>,
        validator: Arc<TokenValidator>,
        codec: Arc<TokenCodec>,
        revocations: RevocationClient,
    ) -> Self {
        Self {
            issuer,
            validator,
            codec,
            revocations,
        }
    }

    /// Exchange a registered refresh token for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AccessGrant, AuthError> {
        let subject = self
            .validator
            .validate_refresh_token(refresh_token)
            .into_result()?;

        match self.revocations.get(refresh_token).await {
            Ok(Some(value)) if value == BLACKLIST_SENTINEL => {
                info!(reason = %InvalidReason::Blacklisted, "Refresh rejected");
                return Err(InvalidReason::Blacklisted.into());
            }
            Ok(Some(value)) if value == subject => {}
            Ok(_) => {
                info!(reason = %InvalidReason::UnknownRefreshToken, "Refresh rejected");
                return Err(InvalidReason::UnknownRefreshToken.into());
            }
            Err(e) => {
                error!(
                    error = %e,
                    backend = self.revocations.backend(),
                    "Refresh registration lookup failed"
                );
                return Err(InvalidReason::StoreUnavailable.into());
            }
        }

        let access_token = self.issuer.issue_access_token(&subject)?;
        Ok(AccessGrant {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.issuer.access_token_ttl().as_secs(),
        })
    }

    /// Blacklist `token` for the rest of its lifetime.
    ///
    /// Returns `false` without writing when the token does not verify or has
    /// already expired; such a token is rejected anyway.
    pub async fn blacklist(&self, token: &str) -> Result<bool, AuthError> {
        let claims = match self.codec.decode(token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "Skipping blacklist of unusable token");
                return Ok(false);
            }
        };

        let Some(ttl_secs) = claims.remaining_secs(self.codec.clock().now()) else {
            return Ok(false);
        };

        self.revocations
            .set_with_expiry(token, BLACKLIST_SENTINEL, ttl_secs)
            .await
            .map_err(|e| {
                error!(
                    error = %e,
                    backend = self.revocations.backend(),
                    "Failed to write blacklist entry"
                );
                AuthError::Denied(InvalidReason::StoreUnavailable)
            })?;

        info!(ttl_secs, "Token blacklisted");
        Ok(true)
    }

    /// Revoke the caller's access token and, optionally, their refresh token.
    ///
    /// A refresh token belonging to another subject is refused. The refresh
    /// token is revoked before the access token; if the second write fails
    /// the error is returned with the refresh token already revoked.
    pub async fn logout(
        &self,
        user: &AuthenticatedUser,
        refresh_token: Option<&str>,
    ) -> Result<(), AuthError> {
        if let Some(refresh_token) = refresh_token {
            let owner = self
                .validator
                .validate_refresh_token(refresh_token)
                .into_result()?;
            if owner != user.user_id {
                return Err(InvalidReason::UnknownRefreshToken.into());
            }
        }

        // Longer-lived credential first: a failure after it leaves at most
        // the short-lived access token live, and a retry is idempotent.
        if let Some(refresh_token) = refresh_token {
            self.blacklist(refresh_token).await?;
        }
        self.blacklist(&user.access_token).await?;
        Ok(())
    }
}
