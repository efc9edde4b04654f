// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Applies bearer validation to a whole router subtree. On success the
//! [`AuthenticatedUser`](super::AuthenticatedUser) is placed in the request
//! extensions, where the [`Auth`](super::Auth) extractor picks it up. On
//! failure the error response carries a [`ValidationFailure`] extension so
//! outer layers can record why the request was denied.
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/v1/users/me", get(get_current_user))
//!     .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_auth));
//! ```

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::extractor::authenticate;
use super::validator::InvalidReason;
use super::AuthError;
use crate::state::AppState;

/// Reason a request was denied, attached to the rejection response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationFailure(pub InvalidReason);

/// Authentication middleware function.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let credential = match request.headers().get(AUTHORIZATION) {
        Some(value) => match value.to_str() {
            Ok(credential) => credential,
            Err(_) => return reject(AuthError::InvalidAuthHeader),
        },
        None => return reject(AuthError::MissingAuthHeader),
    };

    match authenticate(credential, &state.validator).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => reject(e),
    }
}

fn reject(err: AuthError) -> Response {
    let reason = err.reason();
    let mut response = err.into_response();
    if let Some(reason) = reason {
        response.extensions_mut().insert(ValidationFailure(reason));
    }
    response
}
