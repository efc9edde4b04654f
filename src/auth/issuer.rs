// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access and refresh token issuance.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error};
use utoipa::ToSchema;

use super::claims::Claims;
use super::codec::TokenCodec;
use crate::storage::{RevocationClient, StoreError, BLACKLIST_SENTINEL};

/// Errors raised while minting tokens.
///
/// Issuance never degrades: any of these aborts the operation and no token
/// is handed out.
#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    #[error("subject is blank or reserved")]
    InvalidSubject,

    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("revocation store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

/// Access and refresh tokens minted together at sign-in.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Always `Bearer`
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: u64,
}

/// Mints access and refresh tokens.
pub struct TokenIssuer {
    codec: Arc<TokenCodec>,
    revocations: RevocationClient,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(
        codec: Arc<TokenCodec>,
        revocations: RevocationClient,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            codec,
            revocations,
            access_ttl,
            refresh_ttl,
        }
    }

    /// Mint a stateless access token for `subject`.
    ///
    /// Access tokens are not stored and cannot be revoked individually
    /// except through the blacklist.
    pub fn issue_access_token(&self, subject: &str) -> Result<String, IssueError> {
        check_subject(subject)?;
        let claims = Claims::new(subject, self.codec.clock().now(), self.access_ttl);
        let token = self.codec.encode(&claims)?;
        debug!(exp = claims.exp, "Issued access token");
        Ok(token)
    }

    /// Mint a refresh token for `subject` and register it in the store.
    ///
    /// The token is returned only once the store write has succeeded, so a
    /// failed write, a timeout, or dropping this future before completion
    /// never leaves the caller holding an unregistered refresh token.
    pub async fn issue_refresh_token(&self, subject: &str) -> Result<String, IssueError> {
        check_subject(subject)?;
        let claims = Claims::new(subject, self.codec.clock().now(), self.refresh_ttl);
        let token = self.codec.encode(&claims)?;

        self.revocations
            .set_with_expiry(&token, subject, self.refresh_ttl.as_secs())
            .await
            .map_err(|e| {
                error!(
                    error = %e,
                    backend = self.revocations.backend(),
                    "Failed to register refresh token"
                );
                IssueError::StoreUnavailable(e)
            })?;

        debug!(exp = claims.exp, "Issued refresh token");
        Ok(token)
    }

    /// Mint an access token and a registered refresh token for `subject`.
    pub async fn issue_token_pair(&self, subject: &str) -> Result<TokenPair, IssueError> {
        let refresh_token = self.issue_refresh_token(subject).await?;
        let access_token = self.issue_access_token(subject)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_ttl.as_secs(),
        })
    }

    pub fn access_token_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_token_ttl(&self) -> Duration {
        self.refresh_ttl
    }
}

/// Reject subjects that could never be validated or that collide with the
/// blacklist sentinel.
fn check_subject(subject: &str) -> Result<(), IssueError> {
    if subject.trim().is_empty() || subject == BLACKLIST_SENTINEL {
        return Err(IssueError::InvalidSubject);
    }
    Ok(())
}
