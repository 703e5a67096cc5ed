// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token extraction and validation for inbound requests.
//!
//! Token sources, in order:
//!
//! 1. `Authorization: Bearer <token>` (scheme matched case-insensitively)
//! 2. The fallback parameter in the query string
//! 3. The fallback parameter in an `application/x-www-form-urlencoded` body
//!
//! An empty fallback parameter name disables sources 2 and 3.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderMap,
    },
};

use super::codec::ClaimsCodec;
use super::{AuthError, Claims};

/// Default name of the query/form parameter carrying a token.
pub const DEFAULT_TOKEN_PARAM: &str = "token";

/// Upper bound on a form body buffered while looking for a token.
pub const FORM_BODY_LIMIT: usize = 64 * 1024;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Recovers validated [`Claims`] from requests.
#[derive(Debug, Clone)]
pub struct RequestAuthenticator {
    codec: Arc<ClaimsCodec>,
    param_name: String,
    realm: String,
}

impl RequestAuthenticator {
    pub fn new(codec: Arc<ClaimsCodec>, realm: impl Into<String>) -> Self {
        Self {
            codec,
            param_name: DEFAULT_TOKEN_PARAM.to_string(),
            realm: realm.into(),
        }
    }

    /// Set the fallback parameter name; empty disables the fallback.
    pub fn with_param_name(mut self, name: impl Into<String>) -> Self {
        self.param_name = name.into();
        self
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Extract and validate the request token.
    ///
    /// A form body inspected for the fallback parameter is restored before
    /// returning, so downstream handlers can still read it.
    pub async fn authenticate(&self, request: &mut Request) -> Result<Claims, AuthError> {
        let token = self
            .extract_token(request)
            .await
            .ok_or_else(|| AuthError::CredentialMissing {
                realm: self.realm.clone(),
            })?;

        Ok(self.codec.decode(&token)?)
    }

    /// Find the raw token string, without validating it.
    pub async fn extract_token(&self, request: &mut Request) -> Option<String> {
        if let Some(token) = bearer_token(request.headers()) {
            return Some(token.to_string());
        }

        if self.param_name.is_empty() {
            return None;
        }

        if let Some(token) = request
            .uri()
            .query()
            .and_then(|query| find_param(query.as_bytes(), &self.param_name))
        {
            return Some(token);
        }

        if !is_form(request.headers()) {
            return None;
        }

        let body = std::mem::take(request.body_mut());
        match to_bytes(body, FORM_BODY_LIMIT).await {
            Ok(bytes) => {
                let token = find_param(&bytes, &self.param_name);
                *request.body_mut() = Body::from(bytes);
                token
            }
            Err(e) => {
                tracing::debug!(error = %e, "Unable to buffer form body for token lookup");
                None
            }
        }
    }
}

/// Token from an `Authorization: Bearer` header.
///
/// A header with another scheme (e.g. Basic) yields `None` so the fallback
/// sources are still consulted.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") {
        Some(token.trim())
    } else {
        None
    }
}

fn find_param(input: &[u8], name: &str) -> Option<String> {
    url::form_urlencoded::parse(input)
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with(FORM_CONTENT_TYPE))
}
