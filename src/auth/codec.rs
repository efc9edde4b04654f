// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token encoding and verification.
//!
//! Tokens are compact JWS strings signed with HS256. Decoding checks, in
//! order: signature, payload shape, subject, expiry. Expiry is evaluated
//! against the injected [`Clock`] only after the signature has verified, so
//! a forged token never reveals whether its claimed window has passed.

use std::collections::HashSet;
use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, Header, Validation};

use super::claims::Claims;
use super::clock::Clock;
use super::keys::SigningKey;

/// The only algorithm accepted or produced.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Reasons a token fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("token signature is invalid")]
    BadSignature,
    #[error("token is malformed")]
    Malformed,
    #[error("token has expired")]
    Expired,
    #[error("token algorithm is not supported")]
    Unsupported,
    #[error("token claims are empty")]
    EmptyClaims,
}

impl DecodeError {
    fn from_jwt(token: &str, err: &jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => DecodeError::BadSignature,
            ErrorKind::ExpiredSignature => DecodeError::Expired,
            ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::MissingAlgorithm => DecodeError::Unsupported,
            kind => Self::from_segments(token, matches!(kind, ErrorKind::Base64(_))),
        }
    }

    /// Attribute a failure the library reports only as a decoding or
    /// parsing error by inspecting the raw segments.
    ///
    /// An `alg` other than HS256 (including `none` and names the library
    /// does not know) is `Unsupported`. A base64 failure with a sound header
    /// and payload can only come from the signature segment.
    fn from_segments(token: &str, base64_failure: bool) -> Self {
        let mut segments = token.split('.');
        let (Some(header), Some(payload), Some(_), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return DecodeError::Malformed;
        };

        let Some(header) = URL_SAFE_NO_PAD
            .decode(header)
            .ok()
            .and_then(|raw| serde_json::from_slice::<serde_json::Value>(&raw).ok())
        else {
            return DecodeError::Malformed;
        };

        if let Some(alg) = header.get("alg").and_then(|alg| alg.as_str()) {
            if alg.parse::<Algorithm>().ok() != Some(SIGNING_ALGORITHM) {
                return DecodeError::Unsupported;
            }
        }

        if base64_failure && URL_SAFE_NO_PAD.decode(payload).is_ok() {
            DecodeError::BadSignature
        } else {
            DecodeError::Malformed
        }
    }
}

/// Encodes and verifies signed claims with a single key.
pub struct TokenCodec {
    key: Arc<SigningKey>,
    clock: Arc<dyn Clock>,
    header: Header,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(key: Arc<SigningKey>, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        // Time checks run against the injected clock after verification.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims = HashSet::new();

        Self {
            key,
            clock,
            header: Header::new(SIGNING_ALGORITHM),
            validation,
        }
    }

    /// Sign `claims` into a compact token.
    ///
    /// Deterministic for identical claims. HS256 over plain claims does not
    /// fail in practice; the library result is surfaced for the caller to
    /// propagate.
    pub fn encode(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        jsonwebtoken::encode(&self.header, claims, self.key.encoding())
    }

    /// Verify `token` and return its claims.
    ///
    /// Never touches the revocation store.
    pub fn decode(&self, token: &str) -> Result<Claims, DecodeError> {
        if token.trim().is_empty() {
            return Err(DecodeError::EmptyClaims);
        }

        let data = jsonwebtoken::decode::<Claims>(token, self.key.decoding(), &self.validation)
            .map_err(|e| DecodeError::from_jwt(token, &e))?;
        let claims = data.claims;

        if claims.exp <= claims.iat {
            return Err(DecodeError::Malformed);
        }
        if claims.sub.trim().is_empty() {
            return Err(DecodeError::EmptyClaims);
        }
        if self.clock.now() >= claims.exp {
            return Err(DecodeError::Expired);
        }

        Ok(claims)
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}
