// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token issuance for verified principals.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use super::codec::{ClaimsCodec, TokenError};
use super::{Claims, Principal};

/// Token lifetime policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Tokens carry no `exp` and decoding does not require one.
    Never,
    /// Tokens expire after the duration and decoding requires `exp`.
    After(Duration),
}

impl Expiry {
    /// Zero seconds means `Never`.
    pub fn from_secs(secs: u64) -> Self {
        if secs == 0 {
            Expiry::Never
        } else {
            Expiry::After(Duration::from_secs(secs))
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, Expiry::After(_))
    }
}

/// Template applied to every issued token and enforced on every decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenConfig {
    /// Stamped as `iss` and required to match on decode
    pub issuer: Option<String>,
    pub expiry: Expiry,
    /// Stamp `iat` on issue
    pub stamp_issued_at: bool,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            issuer: Some("com.xyzrd.geotrace".to_string()),
            expiry: Expiry::After(Duration::from_secs(30 * 60)),
            stamp_issued_at: true,
        }
    }
}

/// Mints signed tokens for principals that passed credential verification.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    codec: Arc<ClaimsCodec>,
}

impl TokenIssuer {
    pub fn new(codec: Arc<ClaimsCodec>) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &Arc<ClaimsCodec> {
        &self.codec
    }

    /// Build the claims for `principal` as they will be signed.
    pub fn claims_for(&self, principal: &Principal) -> Claims {
        let config = self.codec.config();
        let now = Utc::now().timestamp();

        let mut claims = Claims::for_principal(principal);
        claims.issuer = config.issuer.clone();
        if config.stamp_issued_at {
            claims.issued_at = Some(now);
        }
        if let Expiry::After(ttl) = config.expiry {
            let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
            claims.expires_at = Some(now.saturating_add(ttl));
        }
        claims
    }

    /// Issue a signed token for `principal`.
    pub fn issue(&self, principal: &Principal) -> Result<String, TokenError> {
        let claims = self.claims_for(principal);
        let token = self.codec.encode(&claims)?;
        tracing::debug!(
            kind = %claims.kind,
            id = %claims.id,
            expires_at = ?claims.expires_at_utc(),
            "Token signed"
        );
        Ok(token)
    }
}
