// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HS256 signing and verification of [`Claims`].
//!
//! ## Validation Order
//!
//! 1. Algorithm tag must be `HS256` (absent, `none` or foreign tags are rejected)
//! 2. HMAC signature, compared in constant time
//! 3. Claims schema (unknown principal kinds are rejected)
//! 4. Issuer, when one is configured
//! 5. `exp` presence, when an expiry policy is configured
//! 6. `exp` freshness, whenever `exp` is present
//!
//! Claims are never returned unless every check passes.
//!
//! The algorithm tag is read from the unverified header, so a token signed
//! with a foreign key under any other algorithm reports
//! [`TokenError::WrongAlgorithm`] rather than [`TokenError::BadSignature`].

use base64ct::{Base64UrlUnpadded, Encoding};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use ring::rand::{SecureRandom, SystemRandom};

use super::issuer::TokenConfig;
use super::Claims;

/// Length of a generated signing key in bytes.
pub const KEY_LENGTH: usize = 256;

/// Shortest accepted externally supplied key.
pub const MIN_KEY_LENGTH: usize = 32;

const ALGORITHM: Algorithm = Algorithm::HS256;
const ALGORITHM_TAG: &str = "HS256";

/// Reasons a token failed to encode or decode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token signature is invalid")]
    BadSignature,
    #[error("token is not signed with HS256")]
    WrongAlgorithm,
    #[error("token issuer is invalid")]
    WrongIssuer,
    #[error("token has no expiration")]
    MissingExpiry,
    #[error("token has expired")]
    Expired,
    #[error("token is malformed")]
    Malformed,
    #[error("signing key is unusable: {0}")]
    Key(String),
    #[error("claims could not be encoded: {0}")]
    Encoding(String),
}

impl TokenError {
    /// Stable identifier for logs.
    pub fn reason(&self) -> &'static str {
        match self {
            TokenError::BadSignature => "bad_signature",
            TokenError::WrongAlgorithm => "wrong_algorithm",
            TokenError::WrongIssuer => "wrong_issuer",
            TokenError::MissingExpiry => "missing_expiry",
            TokenError::Expired => "expired",
            TokenError::Malformed => "malformed",
            TokenError::Key(_) => "key",
            TokenError::Encoding(_) => "encoding",
        }
    }
}

/// Owns the signing key and the validation policy derived from [`TokenConfig`].
///
/// Read-only after construction; share it behind an `Arc`.
pub struct ClaimsCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: TokenConfig,
}

impl std::fmt::Debug for ClaimsCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimsCodec")
            .field("algorithm", &ALGORITHM)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ClaimsCodec {
    /// Create a codec with a fresh random key from the OS CSPRNG.
    pub fn generate(config: TokenConfig) -> Result<Self, TokenError> {
        let mut key = vec![0u8; KEY_LENGTH];
        SystemRandom::new()
            .fill(&mut key)
            .map_err(|_| TokenError::Key("system random generator failed".to_string()))?;
        Self::from_secret(&key, config)
    }

    /// Create a codec from an existing shared secret.
    pub fn from_secret(secret: &[u8], config: TokenConfig) -> Result<Self, TokenError> {
        if secret.len() < MIN_KEY_LENGTH {
            return Err(TokenError::Key(format!(
                "expected at least {MIN_KEY_LENGTH} bytes, got {}",
                secret.len()
            )));
        }

        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_aud = false;
        let mut required = Vec::with_capacity(2);
        if config.expiry.is_required() {
            required.push("exp");
        }
        if config.issuer.is_some() {
            required.push("iss");
        }
        validation.set_required_spec_claims(&required);
        if let Some(ref issuer) = config.issuer {
            validation.set_issuer(&[issuer]);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            config,
        })
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Sign `claims` into a compact JWT.
    pub fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(ALGORITHM), claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verify `token` and return its claims.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        match header_algorithm(token) {
            Some(alg) if alg == ALGORITHM_TAG => {}
            Some(_) => return Err(TokenError::WrongAlgorithm),
            None => return Err(TokenError::Malformed),
        }

        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidAlgorithmName
                | ErrorKind::MissingAlgorithm => TokenError::WrongAlgorithm,
                ErrorKind::InvalidIssuer => TokenError::WrongIssuer,
                ErrorKind::MissingRequiredClaim(claim) if claim == "iss" => {
                    TokenError::WrongIssuer
                }
                ErrorKind::MissingRequiredClaim(claim) if claim == "exp" => {
                    TokenError::MissingExpiry
                }
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })
    }
}

/// Raw `alg` tag of the token header.
///
/// `None` when the header is unreadable; `Some("")` when it parses but carries
/// no tag, which covers tokens `jsonwebtoken` itself would refuse to parse
/// (`alg: none` included).
fn header_algorithm(token: &str) -> Option<String> {
    let segment = token.split('.').next()?;
    let raw = Base64UrlUnpadded::decode_vec(segment).ok()?;
    let header: serde_json::Value = serde_json::from_slice(&raw).ok()?;
    let alg = header.as_object()?.get("alg").and_then(|alg| alg.as_str());
    Some(alg.unwrap_or_default().to_string())
}
