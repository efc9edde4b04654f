// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated users.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::validator::{extract_bearer, TokenValidator};
use super::{AuthError, AuthenticatedUser};
use crate::state::AppState;

/// Extractor for authenticated users.
///
/// Reuses the user placed in the request extensions by
/// [`require_auth`](super::require_auth) when present; otherwise validates
/// the `Authorization` header itself.
///
/// # Example
///
/// ```rust,ignore
/// async fn whoami(Auth(user): Auth) -> Json<String> {
///     Json(user.user_id)
/// }
/// ```
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // First check if middleware already set the user
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(Auth(user));
        }

        let credential = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let user = authenticate(credential, &state.validator).await?;
        Ok(Auth(user))
    }
}

/// Validate a full credential and build the authenticated user.
pub(crate) async fn authenticate(
    credential: &str,
    validator: &TokenValidator,
) -> Result<AuthenticatedUser, AuthError> {
    let subject = validator.validate_header(credential).await.into_result()?;
    let token = extract_bearer(credential).unwrap_or_default();
    Ok(AuthenticatedUser::new(subject, token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::InvalidReason;
    use crate::state::test_support::context;
    use axum::http::Request;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/test");
        if let Some(value) = header {
            builder = builder.header("Authorization", value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn auth_extractor_requires_auth_header() {
        let ctx = context();
        let mut parts = parts_with(None);

        let result = Auth::from_request_parts(&mut parts, &ctx.state).await;
        assert!(matches!(result, Err(AuthError::MissingAuthHeader)));
    }

    #[tokio::test]
    async fn auth_extractor_succeeds_with_token() {
        let ctx = context();
        let token = ctx.state.issuer.issue_access_token("user_123").unwrap();
        let mut parts = parts_with(Some(&format!("Bearer {token}")));

        let Auth(user) = Auth::from_request_parts(&mut parts, &ctx.state)
            .await
            .unwrap();
        assert_eq!(user.user_id, "user_123");
        assert_eq!(user.access_token, token);
    }

    #[tokio::test]
    async fn auth_extractor_rejects_lowercase_scheme() {
        let ctx = context();
        let token = ctx.state.issuer.issue_access_token("user_123").unwrap();
        let mut parts = parts_with(Some(&format!("bearer {token}")));

        let result = Auth::from_request_parts(&mut parts, &ctx.state).await;
        assert!(matches!(
            result,
            Err(AuthError::Denied(InvalidReason::NotBearer))
        ));
    }

    #[tokio::test]
    async fn auth_extractor_prefers_extensions() {
        let ctx = context();
        let mut parts = parts_with(None);
        parts
            .extensions
            .insert(AuthenticatedUser::new("user_from_middleware", "t"));

        let Auth(user) = Auth::from_request_parts(&mut parts, &ctx.state)
            .await
            .unwrap();
        assert_eq!(user.user_id, "user_from_middleware");
    }
}
