// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{
    Clock, IssuerKey, SessionManager, SigningKey, TokenCodec, TokenIssuer, TokenValidator,
};
use crate::config::AuthSettings;
use crate::storage::{RevocationClient, RevocationStore};

/// Shared handles for request handlers.
///
/// Everything here is read-only after construction; the revocation store
/// provides its own per-key atomicity.
#[derive(Clone)]
pub struct AppState {
    pub issuer: Arc<TokenIssuer>,
    pub validator: Arc<TokenValidator>,
    pub sessions: Arc<SessionManager>,
    pub revocations: RevocationClient,
    /// Present when token pairs may be minted over HTTP.
    pub issuer_key: Option<IssuerKey>,
}

impl AppState {
    /// Wire the token core around `key` and `store`.
    pub fn new(
        key: SigningKey,
        settings: &AuthSettings,
        store: Arc<dyn RevocationStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let codec = Arc::new(TokenCodec::new(Arc::new(key), clock));
        let revocations = RevocationClient::new(store, settings.store_timeout);

        let issuer = Arc::new(TokenIssuer::new(
            codec.clone(),
            revocations.clone(),
            settings.access_ttl,
            settings.refresh_ttl,
        ));
        let validator = Arc::new(TokenValidator::new(codec.clone(), revocations.clone()));
        let sessions = Arc::new(SessionManager::new(
            issuer.clone(),
            validator.clone(),
            codec,
            revocations.clone(),
        ));

        let issuer_key = settings
            .issuer_api_key
            .as_deref()
            .and_then(|key| IssuerKey::new(key).ok());

        Self {
            issuer,
            validator,
            sessions,
            revocations,
            issuer_key,
        }
    }
}
