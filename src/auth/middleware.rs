// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! ## Bearer-protected routes
//!
//! ```rust,ignore
//! let guard = TokenGuard::new(authenticator);
//! let any_token = from_fn_with_state(guard.clone(), require_token);
//! let user_token = from_fn_with_state(guard.allow([PrincipalKind::User]), require_token);
//!
//! let app = Router::new()
//!     .route("/places", get(list_places).route_layer(any_token))
//!     .route("/places", post(create_place).route_layer(user_token));
//! ```
//!
//! ## Login routes
//!
//! [`basic_login`] exchanges HTTP Basic credentials for a signed token.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderMap, HeaderValue, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64ct::{Base64, Encoding};

use super::authenticator::RequestAuthenticator;
use super::extractor::AuthContext;
use super::verifier::CredentialVerifier;
use super::{AuthError, KindSet, PrincipalKind, TokenIssuer};

/// Media type of a raw signed token response.
pub const JWT_CONTENT_TYPE: &str = "application/jwt";

/// Per-route authentication policy.
#[derive(Debug, Clone)]
pub struct TokenGuard {
    authenticator: Arc<RequestAuthenticator>,
    allowed: KindSet,
}

impl TokenGuard {
    /// Guard accepting any valid token.
    pub fn new(authenticator: Arc<RequestAuthenticator>) -> Self {
        Self {
            authenticator,
            allowed: KindSet::any(),
        }
    }

    /// Copy of this guard restricted to `kinds`.
    pub fn allow(&self, kinds: impl IntoIterator<Item = PrincipalKind>) -> Self {
        Self {
            authenticator: self.authenticator.clone(),
            allowed: kinds.into_iter().collect(),
        }
    }

    /// Authenticate the request and check the principal kind.
    pub async fn check(&self, request: &mut Request) -> Result<AuthContext, AuthError> {
        let claims = self.authenticator.authenticate(request).await?;
        if !self.allowed.permits(claims.kind) {
            return Err(AuthError::KindRejected);
        }
        Ok(AuthContext::new(claims))
    }
}

/// Middleware gating the wrapped handler behind [`TokenGuard::check`].
///
/// On success the claims are attached to the request extensions, where the
/// [`Auth`](super::Auth) extractor reads them.
pub async fn require_token(
    State(guard): State<TokenGuard>,
    mut request: Request,
    next: Next,
) -> Response {
    match guard.check(&mut request).await {
        Ok(context) => {
            tracing::debug!(
                kind = %context.claims().kind,
                id = %context.claims().id,
                "Request authenticated"
            );
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        Err(e) => {
            log_rejection(&e, &request);
            e.into_response()
        }
    }
}

fn log_rejection(error: &AuthError, request: &Request) {
    let path = request.uri().path();
    match error {
        AuthError::CredentialMissing { .. } => {
            tracing::debug!(path, "Request without token");
        }
        AuthError::CredentialInvalid(reason) => {
            tracing::warn!(path, reason = reason.reason(), "Token rejected");
        }
        other => {
            tracing::warn!(path, error_code = other.error_code(), "Request rejected");
        }
    }
}

/// Username and password from an `Authorization: Basic` header.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub login: String,
    pub password: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Parse Basic credentials; `None` if absent or not decodable.
pub fn basic_credentials(headers: &HeaderMap) -> Option<BasicCredentials> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = Base64::decode_vec(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (login, password) = decoded.split_once(':')?;

    Some(BasicCredentials {
        login: login.to_string(),
        password: password.to_string(),
    })
}

/// A freshly signed token, rendered as an `application/jwt` body.
#[derive(Debug)]
pub struct IssuedToken(pub String);

impl IntoResponse for IssuedToken {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [(CONTENT_TYPE, HeaderValue::from_static(JWT_CONTENT_TYPE))],
            self.0,
        )
            .into_response()
    }
}

/// Exchange Basic credentials for a signed token.
///
/// A token is only produced after `verifier` accepts the credentials.
pub async fn basic_login<V: CredentialVerifier>(
    headers: &HeaderMap,
    realm: &str,
    verifier: &V,
    issuer: &TokenIssuer,
) -> Result<IssuedToken, AuthError> {
    let credentials = basic_credentials(headers).ok_or_else(|| AuthError::BasicMissing {
        realm: realm.to_string(),
    })?;

    let principal = match verifier
        .verify(&credentials.login, &credentials.password)
        .await
    {
        Ok(principal) => principal,
        Err(e) => {
            tracing::warn!(login = %credentials.login, error = %e, "Login rejected");
            return Err(e.into());
        }
    };

    let token = issuer.issue(&principal).map_err(|e| {
        tracing::error!(error = %e, "Failed to sign token");
        AuthError::IssueFailure(e)
    })?;

    tracing::info!(kind = %principal.kind, id = %principal.id, "Token issued");
    Ok(IssuedToken(token))
}
