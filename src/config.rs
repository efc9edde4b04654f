// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! once at startup; a missing or empty secret aborts startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `AUTH_SECRET` | HMAC signing secret | Required |
//! | `ACCESS_TOKEN_TTL_SECS` | Access token lifetime | `1800` |
//! | `REFRESH_TOKEN_TTL_SECS` | Refresh token lifetime | `1209600` (14 days) |
//! | `STORE_TIMEOUT_MS` | Bound on each revocation store call | `500` |
//! | `STORE_SWEEP_INTERVAL_SECS` | Expired record purge period | `60` |
//! | `ISSUER_API_KEY` | Shared key for `POST /v1/auth/token` | Issuance endpoint disabled |
//! | `DATA_DIR` | Directory of the persistent revocation store | In-memory store |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;
use std::time::Duration;

pub const AUTH_SECRET_ENV: &str = "AUTH_SECRET";
pub const ACCESS_TOKEN_TTL_ENV: &str = "ACCESS_TOKEN_TTL_SECS";
pub const REFRESH_TOKEN_TTL_ENV: &str = "REFRESH_TOKEN_TTL_SECS";
pub const STORE_TIMEOUT_ENV: &str = "STORE_TIMEOUT_MS";
pub const STORE_SWEEP_INTERVAL_ENV: &str = "STORE_SWEEP_INTERVAL_SECS";

/// Environment variable name for the key trusted upstreams present to mint
/// token pairs. When unset, issuance is only available as a library call.
pub const ISSUER_API_KEY_ENV: &str = "ISSUER_API_KEY";

/// Environment variable name for the revocation database directory.
///
/// When unset, revocation records live in process memory and are lost on
/// restart (refresh tokens then stop working and blacklist entries lapse).
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_ACCESS_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_REFRESH_TOKEN_TTL: Duration = Duration::from_secs(14 * 24 * 60 * 60);
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(500);
pub const DEFAULT_SWEEP_INTERVAL: Duration = crate::storage::sweeper::DEFAULT_SWEEP_INTERVAL;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Configuration errors. All of them abort startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("AUTH_SECRET must be set to a non-empty value")]
    MissingSecret,

    #[error("{var} must be a non-negative integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("LOG_FORMAT must be `json` or `pretty`, got {0:?}")]
    InvalidLogFormat(String),

    #[error("ACCESS_TOKEN_TTL_SECS ({access}) must be shorter than REFRESH_TOKEN_TTL_SECS ({refresh})")]
    TtlOrder { access: u64, refresh: u64 },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Settings consumed by the token core.
#[derive(Clone)]
pub struct AuthSettings {
    pub secret: Vec<u8>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub store_timeout: Duration,
    pub issuer_api_key: Option<String>,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("store_timeout", &self.store_timeout)
            .field(
                "issuer_api_key",
                &self.issuer_api_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Full process configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: Option<PathBuf>,
    pub sweep_interval: Duration,
    pub log_format: LogFormat,
    pub auth: AuthSettings,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup(AUTH_SECRET_ENV)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingSecret)?
            .into_bytes();

        let access_ttl = secs(&lookup, ACCESS_TOKEN_TTL_ENV, DEFAULT_ACCESS_TOKEN_TTL)?;
        let refresh_ttl = secs(&lookup, REFRESH_TOKEN_TTL_ENV, DEFAULT_REFRESH_TOKEN_TTL)?;
        if access_ttl >= refresh_ttl {
            return Err(ConfigError::TtlOrder {
                access: access_ttl.as_secs(),
                refresh: refresh_ttl.as_secs(),
            });
        }
        let sweep_interval = secs(&lookup, STORE_SWEEP_INTERVAL_ENV, DEFAULT_SWEEP_INTERVAL)?;
        let store_timeout = match number(&lookup, STORE_TIMEOUT_ENV)? {
            Some(0) => return Err(ConfigError::ZeroDuration(STORE_TIMEOUT_ENV)),
            Some(ms) => Duration::from_millis(ms),
            None => DEFAULT_STORE_TIMEOUT,
        };

        let port = match number(&lookup, PORT_ENV)? {
            Some(port) => u16::try_from(port).map_err(|_| ConfigError::InvalidNumber {
                var: PORT_ENV,
                value: port.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let log_format = match lookup(LOG_FORMAT_ENV).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => return Err(ConfigError::InvalidLogFormat(other.to_string())),
        };

        Ok(Self {
            host: lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            data_dir: lookup(DATA_DIR_ENV)
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from),
            sweep_interval,
            log_format,
            auth: AuthSettings {
                secret,
                access_ttl,
                refresh_ttl,
                store_timeout,
                issuer_api_key: lookup(ISSUER_API_KEY_ENV).filter(|key| !key.is_empty()),
            },
        })
    }
}

fn number<F>(lookup: &F, var: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { var, value }),
    }
}

fn secs<F>(lookup: &F, var: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match number(lookup, var)? {
        Some(0) => Err(ConfigError::ZeroDuration(var)),
        Some(secs) => Ok(Duration::from_secs(secs)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|var| map.get(var).cloned())
    }

    #[test]
    fn defaults_apply_with_only_secret() {
        let config = load(&[(AUTH_SECRET_ENV, "s3cret")]).unwrap();

        assert_eq!(config.auth.secret, b"s3cret");
        assert_eq!(config.auth.access_ttl, DEFAULT_ACCESS_TOKEN_TTL);
        assert_eq!(config.auth.refresh_ttl, DEFAULT_REFRESH_TOKEN_TTL);
        assert_eq!(config.auth.store_timeout, DEFAULT_STORE_TIMEOUT);
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.data_dir, None);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.auth.issuer_api_key, None);
    }

    #[test]
    fn missing_or_empty_secret_fails() {
        assert!(matches!(load(&[]), Err(ConfigError::MissingSecret)));
        assert!(matches!(
            load(&[(AUTH_SECRET_ENV, "")]),
            Err(ConfigError::MissingSecret)
        ));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            (AUTH_SECRET_ENV, "s3cret"),
            (ACCESS_TOKEN_TTL_ENV, "900"),
            (REFRESH_TOKEN_TTL_ENV, "86400"),
            (STORE_TIMEOUT_ENV, "250"),
            (DATA_DIR_ENV, "/var/lib/tokens"),
            (PORT_ENV, "9090"),
            (LOG_FORMAT_ENV, "json"),
        ])
        .unwrap();

        assert_eq!(config.auth.access_ttl, Duration::from_secs(900));
        assert_eq!(config.auth.refresh_ttl, Duration::from_secs(86400));
        assert_eq!(config.auth.store_timeout, Duration::from_millis(250));
        assert_eq!(config.data_dir, Some(PathBuf::from("/var/lib/tokens")));
        assert_eq!(config.port, 9090);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            load(&[(AUTH_SECRET_ENV, "s"), (ACCESS_TOKEN_TTL_ENV, "soon")]),
            Err(ConfigError::InvalidNumber { var: ACCESS_TOKEN_TTL_ENV, .. })
        ));
        assert!(matches!(
            load(&[(AUTH_SECRET_ENV, "s"), (REFRESH_TOKEN_TTL_ENV, "0")]),
            Err(ConfigError::ZeroDuration(REFRESH_TOKEN_TTL_ENV))
        ));
        assert!(matches!(
            load(&[(AUTH_SECRET_ENV, "s"), (PORT_ENV, "70000")]),
            Err(ConfigError::InvalidNumber { var: PORT_ENV, .. })
        ));
        assert!(matches!(
            load(&[(AUTH_SECRET_ENV, "s"), (LOG_FORMAT_ENV, "xml")]),
            Err(ConfigError::InvalidLogFormat(_))
        ));
    }

    #[test]
    fn access_ttl_must_be_shorter_than_refresh_ttl() {
        assert!(matches!(
            load(&[
                (AUTH_SECRET_ENV, "s"),
                (ACCESS_TOKEN_TTL_ENV, "3600"),
                (REFRESH_TOKEN_TTL_ENV, "3600"),
            ]),
            Err(ConfigError::TtlOrder {
                access: 3600,
                refresh: 3600
            })
        ));
        assert!(matches!(
            load(&[(AUTH_SECRET_ENV, "s"), (REFRESH_TOKEN_TTL_ENV, "60")]),
            Err(ConfigError::TtlOrder { .. })
        ));
        assert!(load(&[
            (AUTH_SECRET_ENV, "s"),
            (ACCESS_TOKEN_TTL_ENV, "3599"),
            (REFRESH_TOKEN_TTL_ENV, "3600"),
        ])
        .is_ok());
    }

    #[test]
    fn empty_issuer_key_disables_issuance() {
        let config = load(&[(AUTH_SECRET_ENV, "s"), (ISSUER_API_KEY_ENV, "")]).unwrap();
        assert_eq!(config.auth.issuer_api_key, None);

        let config = load(&[(AUTH_SECRET_ENV, "s"), (ISSUER_API_KEY_ENV, "upstream")]).unwrap();
        assert_eq!(config.auth.issuer_api_key.as_deref(), Some("upstream"));
    }

    #[test]
    fn debug_redacts_secret() {
        let config = load(&[
            (AUTH_SECRET_ENV, "hunter2"),
            (ISSUER_API_KEY_ENV, "upstream-key"),
        ])
        .unwrap();
        let rendered = format!("{:?}", config.auth);
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("upstream-key"));
    }
}
