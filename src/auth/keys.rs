// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signing key material.
//!
//! The key is derived once from the configured secret at startup and shared
//! read-only for the lifetime of the process. There is no rotation: a new
//! secret requires a new process.

use std::fmt::Write as _;

use jsonwebtoken::{DecodingKey, EncodingKey};
use sha2::{Digest, Sha256};

/// Number of digest bytes shown in the key fingerprint.
const FINGERPRINT_BYTES: usize = 8;

/// Errors raised while deriving key material.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("signing secret is empty")]
    EmptySecret,
}

/// HS256 key pair derived from a shared secret.
#[derive(Clone)]
pub struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
    fingerprint: String,
}

impl SigningKey {
    /// Derive the signing key from raw secret bytes.
    ///
    /// # Errors
    /// Returns [`KeyError::EmptySecret`] if `raw` is empty.
    pub fn from_secret(raw: &[u8]) -> Result<Self, KeyError> {
        if raw.is_empty() {
            return Err(KeyError::EmptySecret);
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(raw),
            decoding: DecodingKey::from_secret(raw),
            fingerprint: fingerprint(raw),
        })
    }

    pub(crate) fn encoding(&self) -> &EncodingKey {
        &self.encoding
    }

    pub(crate) fn decoding(&self) -> &DecodingKey {
        &self.decoding
    }

    /// Short hex digest of the secret, safe to log.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("fingerprint", &self.fingerprint)
            .finish_non_exhaustive()
    }
}

/// Shared key a trusted upstream presents to mint token pairs.
///
/// Only the SHA-256 digest is kept; presented keys are compared digest to
/// digest so the comparison time does not depend on the stored key.
#[derive(Clone)]
pub struct IssuerKey {
    digest: [u8; 32],
}

impl IssuerKey {
    /// # Errors
    /// Returns [`KeyError::EmptySecret`] if `raw` is empty.
    pub fn new(raw: &str) -> Result<Self, KeyError> {
        if raw.is_empty() {
            return Err(KeyError::EmptySecret);
        }
        Ok(Self {
            digest: Sha256::digest(raw.as_bytes()).into(),
        })
    }

    /// Whether `presented` equals the configured key.
    pub fn matches(&self, presented: &str) -> bool {
        let presented: [u8; 32] = Sha256::digest(presented.as_bytes()).into();
        presented
            .iter()
            .zip(self.digest.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl std::fmt::Debug for IssuerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuerKey").finish_non_exhaustive()
    }
}

fn fingerprint(raw: &[u8]) -> String {
    let digest = Sha256::digest(raw);
    digest
        .iter()
        .take(FINGERPRINT_BYTES)
        .fold(String::with_capacity(FINGERPRINT_BYTES * 2), |mut out, b| {
            let _ = write!(out, "{b:02x}");
            out
        })
}
