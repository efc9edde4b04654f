// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Issues, validates and revokes HS256 session tokens.
//!
//! ## Token Flow
//!
//! 1. After sign-in, the caller mints a pair with [`TokenIssuer`] (directly,
//!    or through `POST /v1/auth/token` with the issuer key): a
//!    short-lived access token (stateless) and a long-lived refresh token
//!    registered in the revocation store as `token → subject`.
//! 2. Clients send `Authorization: Bearer <access token>`.
//! 3. [`TokenValidator`]:
//!    - rejects anything without the exact `Bearer ` prefix
//!    - rejects blacklisted tokens before touching the signature
//!    - verifies signature, shape, subject and expiry
//! 4. [`SessionManager`] exchanges a registered refresh token for a new
//!    access token, and blacklists tokens on logout.
//!
//! ## Security
//!
//! - One signing key per process, derived at startup, never rotated in place
//! - Expiry is only evaluated for correctly signed tokens
//! - A revocation store outage is a service error, never "not revoked"
//! - Raw tokens are never logged

pub mod claims;
pub mod clock;
pub mod codec;
pub mod error;
pub mod extractor;
pub mod issuer;
pub mod keys;
pub mod middleware;
pub mod session;
pub mod validator;

pub use claims::{AuthenticatedUser, Claims};
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{DecodeError, TokenCodec};
pub use error::AuthError;
pub use extractor::Auth;
pub use issuer::{IssueError, TokenIssuer, TokenPair};
pub use keys::{IssuerKey, KeyError, SigningKey};
pub use middleware::{require_auth, ValidationFailure};
pub use session::{AccessGrant, SessionManager};
pub use validator::{extract_bearer, InvalidReason, TokenValidator, ValidationOutcome, BEARER_PREFIX};
