// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::issuer::IssueError;
use super::validator::InvalidReason;

/// Authentication error type returned by extractors, middleware and the
/// session endpoints.
#[derive(Debug)]
pub enum AuthError {
    /// No authorization header present
    MissingAuthHeader,
    /// Authorization header is not valid visible ASCII
    InvalidAuthHeader,
    /// Credential was denied (or could not be checked) for this reason
    Denied(InvalidReason),
    /// Subject is blank or collides with the blacklist sentinel
    InvalidSubject,
    /// Issuance key missing or wrong
    InvalidIssuerKey,
    /// Internal error
    InternalError(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::Denied(reason) => reason.as_str(),
            AuthError::InvalidSubject => "invalid_subject",
            AuthError::InvalidIssuerKey => "invalid_issuer_key",
            AuthError::InternalError(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Denied(InvalidReason::StoreUnavailable) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::Denied(_)
            | AuthError::InvalidIssuerKey => StatusCode::UNAUTHORIZED,
            AuthError::InvalidSubject => StatusCode::BAD_REQUEST,
            AuthError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The denial reason, if this error came from validation.
    pub fn reason(&self) -> Option<InvalidReason> {
        match self {
            AuthError::Denied(reason) => Some(*reason),
            _ => None,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingAuthHeader => write!(f, "Authorization header is required"),
            AuthError::InvalidAuthHeader => write!(f, "Authorization header is not valid text"),
            AuthError::Denied(reason) => match reason {
                InvalidReason::NotBearer => {
                    write!(f, "Invalid authorization header format (expected 'Bearer <token>')")
                }
                InvalidReason::Blacklisted => write!(f, "Token has been revoked"),
                InvalidReason::BadSignature => write!(f, "Token signature is invalid"),
                InvalidReason::Malformed => write!(f, "Token is malformed"),
                InvalidReason::Expired => write!(f, "Token has expired"),
                InvalidReason::Unsupported => write!(f, "Token algorithm is not supported"),
                InvalidReason::EmptyClaims => write!(f, "Token carries no subject"),
                InvalidReason::StoreUnavailable => {
                    write!(f, "Token revocation status is temporarily unavailable")
                }
                InvalidReason::UnknownRefreshToken => {
                    write!(f, "Refresh token is not registered")
                }
            },
            AuthError::InvalidSubject => write!(f, "Subject is blank or reserved"),
            AuthError::InvalidIssuerKey => write!(f, "Issuer key is missing or invalid"),
            AuthError::InternalError(msg) => write!(f, "Internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<InvalidReason> for AuthError {
    fn from(reason: InvalidReason) -> Self {
        AuthError::Denied(reason)
    }
}

impl From<IssueError> for AuthError {
    fn from(e: IssueError) -> Self {
        match e {
            IssueError::InvalidSubject => AuthError::InvalidSubject,
            IssueError::StoreUnavailable(_) => AuthError::Denied(InvalidReason::StoreUnavailable),
            IssueError::Signing(e) => AuthError::InternalError(e.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoreError;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn missing_auth_returns_401() {
        let response = AuthError::MissingAuthHeader.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "missing_auth_header");
    }

    #[tokio::test]
    async fn denial_uses_reason_code() {
        let response = AuthError::from(InvalidReason::Blacklisted).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "blacklisted");
        assert_eq!(body["error"], "Token has been revoked");
    }

    #[test]
    fn store_unavailable_is_a_service_error() {
        let err = AuthError::from(InvalidReason::StoreUnavailable);
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let err = AuthError::from(IssueError::StoreUnavailable(StoreError::Backend(
            "down".to_string(),
        )));
        assert_eq!(err.reason(), Some(InvalidReason::StoreUnavailable));
    }

    #[test]
    fn issuance_errors_have_distinct_statuses() {
        assert_eq!(
            AuthError::from(IssueError::InvalidSubject).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::InvalidIssuerKey.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::InvalidIssuerKey.error_code(), "invalid_issuer_key");
    }

    #[test]
    fn every_verdict_is_unauthorized() {
        let verdicts = [
            InvalidReason::NotBearer,
            InvalidReason::Blacklisted,
            InvalidReason::BadSignature,
            InvalidReason::Malformed,
            InvalidReason::Expired,
            InvalidReason::Unsupported,
            InvalidReason::EmptyClaims,
            InvalidReason::UnknownRefreshToken,
        ];
        for reason in verdicts {
            assert!(reason.is_verdict());
            assert_eq!(AuthError::from(reason).status_code(), StatusCode::UNAUTHORIZED);
        }
    }
}
