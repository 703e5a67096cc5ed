// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `REALM` | Realm advertised in `WWW-Authenticate` | `GeoTrace` |
//! | `TOKEN_ISSUER` | Issuer stamped into and required from tokens (empty disables) | `com.xyzrd.geotrace` |
//! | `TOKEN_EXPIRE` | Token lifetime in seconds, `0` or `never` for no expiry | `1800` |
//! | `TOKEN_STAMP_IAT` | Stamp the creation time into tokens | `true` |
//! | `TOKEN_PARAM` | Query/form parameter carrying a token (empty disables) | `token` |
//! | `TOKEN_SIGNING_KEY` | Base64 HS256 key shared between instances | Random per process |
//! | `TLS_CERT` / `TLS_KEY` | PEM certificate chain and private key | Plain HTTP |
//! | `SEED_USERS` | `login:password:group[:name]` entries separated by `;` | None |
//! | `SEED_DEVICES` | Same format, for devices | None |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use base64ct::{Base64, Encoding};

use crate::auth::{authenticator::DEFAULT_TOKEN_PARAM, codec::MIN_KEY_LENGTH, Expiry, TokenConfig};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const REALM_ENV: &str = "REALM";
pub const TOKEN_ISSUER_ENV: &str = "TOKEN_ISSUER";
pub const TOKEN_EXPIRE_ENV: &str = "TOKEN_EXPIRE";
pub const TOKEN_STAMP_IAT_ENV: &str = "TOKEN_STAMP_IAT";
pub const TOKEN_PARAM_ENV: &str = "TOKEN_PARAM";
pub const TOKEN_SIGNING_KEY_ENV: &str = "TOKEN_SIGNING_KEY";
pub const TLS_CERT_ENV: &str = "TLS_CERT";
pub const TLS_KEY_ENV: &str = "TLS_KEY";
pub const SEED_USERS_ENV: &str = "SEED_USERS";
pub const SEED_DEVICES_ENV: &str = "SEED_DEVICES";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_REALM: &str = "GeoTrace";
pub const DEFAULT_ISSUER: &str = "com.xyzrd.geotrace";
pub const DEFAULT_TOKEN_EXPIRE_SECS: u64 = 30 * 60;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
    #[error("{0} and {1} must be set together")]
    Incomplete(&'static str, &'static str),
}

impl ConfigError {
    fn invalid(var: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            var,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Account created at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct SeedAccount {
    pub login: String,
    pub password: String,
    pub group: String,
    pub name: String,
}

impl std::fmt::Debug for SeedAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedAccount")
            .field("login", &self.login)
            .field("group", &self.group)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub realm: String,
    pub token: TokenConfig,
    pub token_param: String,
    pub signing_key: Option<Vec<u8>>,
    pub tls: Option<TlsPaths>,
    pub seed_users: Vec<SeedAccount>,
    pub seed_devices: Vec<SeedAccount>,
    pub log_format: LogFormat,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("realm", &self.realm)
            .field("token", &self.token)
            .field("token_param", &self.token_param)
            .field("signing_key", &self.signing_key.as_ref().map(|_| "<redacted>"))
            .field("tls", &self.tls)
            .field("seed_users", &self.seed_users)
            .field("seed_devices", &self.seed_devices)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup(PORT_ENV) {
            Some(port) => port
                .parse::<u16>()
                .map_err(|e| ConfigError::invalid(PORT_ENV, e.to_string()))?,
            None => DEFAULT_PORT,
        };
        let addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::invalid(HOST_ENV, e.to_string()))?;

        let realm = lookup(REALM_ENV)
            .filter(|realm| !realm.is_empty())
            .unwrap_or_else(|| DEFAULT_REALM.to_string());

        let issuer = match lookup(TOKEN_ISSUER_ENV) {
            Some(issuer) if issuer.is_empty() => None,
            Some(issuer) => Some(issuer),
            None => Some(DEFAULT_ISSUER.to_string()),
        };
        let expiry = match lookup(TOKEN_EXPIRE_ENV) {
            Some(value) => parse_expiry(&value)?,
            None => Expiry::from_secs(DEFAULT_TOKEN_EXPIRE_SECS),
        };
        let stamp_issued_at = match lookup(TOKEN_STAMP_IAT_ENV) {
            Some(value) => parse_bool(TOKEN_STAMP_IAT_ENV, &value)?,
            None => true,
        };

        let token_param =
            lookup(TOKEN_PARAM_ENV).unwrap_or_else(|| DEFAULT_TOKEN_PARAM.to_string());

        let signing_key = match lookup(TOKEN_SIGNING_KEY_ENV).filter(|key| !key.is_empty()) {
            Some(encoded) => {
                let key = Base64::decode_vec(encoded.trim())
                    .map_err(|e| ConfigError::invalid(TOKEN_SIGNING_KEY_ENV, e.to_string()))?;
                if key.len() < MIN_KEY_LENGTH {
                    return Err(ConfigError::invalid(
                        TOKEN_SIGNING_KEY_ENV,
                        format!("expected at least {MIN_KEY_LENGTH} bytes"),
                    ));
                }
                Some(key)
            }
            None => None,
        };

        let tls = match (lookup(TLS_CERT_ENV), lookup(TLS_KEY_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::Incomplete(TLS_CERT_ENV, TLS_KEY_ENV)),
        };

        let seed_users = match lookup(SEED_USERS_ENV) {
            Some(value) => parse_seed_accounts(SEED_USERS_ENV, &value)?,
            None => Vec::new(),
        };
        let seed_devices = match lookup(SEED_DEVICES_ENV) {
            Some(value) => parse_seed_accounts(SEED_DEVICES_ENV, &value)?,
            None => Vec::new(),
        };

        let log_format = match lookup(LOG_FORMAT_ENV).as_deref() {
            Some("json") => LogFormat::Json,
            Some("pretty") | Some("") | None => LogFormat::Pretty,
            Some(other) => {
                return Err(ConfigError::invalid(
                    LOG_FORMAT_ENV,
                    format!("unknown format {other:?}"),
                ))
            }
        };

        Ok(Self {
            addr,
            realm,
            token: TokenConfig {
                issuer,
                expiry,
                stamp_issued_at,
            },
            token_param,
            signing_key,
            tls,
            seed_users,
            seed_devices,
            log_format,
        })
    }
}

fn parse_expiry(value: &str) -> Result<Expiry, ConfigError> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("never") {
        return Ok(Expiry::Never);
    }
    value
        .parse::<u64>()
        .map(Expiry::from_secs)
        .map_err(|e| ConfigError::invalid(TOKEN_EXPIRE_ENV, e.to_string()))
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::invalid(var, format!("not a boolean: {other:?}"))),
    }
}

fn parse_seed_accounts(var: &'static str, value: &str) -> Result<Vec<SeedAccount>, ConfigError> {
    value
        .split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let mut parts = entry.splitn(4, ':');
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(login), Some(password), Some(group), name)
                    if !login.is_empty() && !group.is_empty() =>
                {
                    Ok(SeedAccount {
                        login: login.to_string(),
                        password: password.to_string(),
                        group: group.to_string(),
                        name: name.unwrap_or_default().to_string(),
                    })
                }
                _ => Err(ConfigError::invalid(
                    var,
                    "expected login:password:group[:name]",
                )),
            }
        })
        .collect()
}
