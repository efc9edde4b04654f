// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session endpoints: issuance, refresh and logout.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::auth::{AccessGrant, Auth, AuthError, TokenPair};
use crate::state::AppState;

/// Header carrying the issuer key on POST /v1/auth/token.
pub const ISSUER_KEY_HEADER: &str = "x-issuer-key";

/// Request body for POST /v1/auth/token
#[derive(Debug, Deserialize, ToSchema)]
pub struct IssueTokenRequest {
    /// Identity already authenticated by the calling upstream
    pub subject: String,
}

/// Request body for POST /v1/auth/refresh
#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Request body for POST /v1/auth/logout
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LogoutRequest {
    /// Refresh token to revoke alongside the access token
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Mint an access/refresh token pair for an authenticated subject.
///
/// Reserved for a trusted upstream (the sign-in service) holding the
/// issuer key. Only mounted when `ISSUER_API_KEY` is configured.
#[utoipa::path(
    post,
    path = "/v1/auth/token",
    tag = "Auth",
    request_body = IssueTokenRequest,
    params(
        ("x-issuer-key" = String, Header, description = "Shared issuer key")
    ),
    responses(
        (status = 200, description = "Token pair issued", body = TokenPair),
        (status = 400, description = "Subject is blank or reserved"),
        (status = 401, description = "Issuer key missing or invalid"),
        (status = 503, description = "Revocation store unavailable"),
    )
)]
pub async fn issue_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<IssueTokenRequest>,
) -> Result<Json<TokenPair>, AuthError> {
    let issuer_key = state.issuer_key.as_ref().ok_or(AuthError::InvalidIssuerKey)?;
    let presented = headers
        .get(ISSUER_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::InvalidIssuerKey)?;
    if !issuer_key.matches(presented) {
        warn!("Token issuance rejected: issuer key mismatch");
        return Err(AuthError::InvalidIssuerKey);
    }

    let pair = state.issuer.issue_token_pair(&request.subject).await?;
    info!(expires_in = pair.expires_in, "Token pair issued");
    Ok(Json(pair))
}

/// Exchange a refresh token for a new access token.
#[utoipa::path(
    post,
    path = "/v1/auth/refresh",
    tag = "Auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = AccessGrant),
        (status = 401, description = "Refresh token rejected"),
        (status = 503, description = "Revocation store unavailable"),
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<AccessGrant>, AuthError> {
    let grant = state.sessions.refresh(&request.refresh_token).await?;
    Ok(Json(grant))
}

/// Revoke the presented access token and, optionally, a refresh token.
#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    tag = "Auth",
    security(("bearer" = [])),
    request_body = LogoutRequest,
    responses(
        (status = 204, description = "Tokens revoked"),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 503, description = "Revocation store unavailable"),
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    Auth(user): Auth,
    Json(request): Json<LogoutRequest>,
) -> Result<StatusCode, AuthError> {
    state
        .sessions
        .logout(&user, request.refresh_token.as_deref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
