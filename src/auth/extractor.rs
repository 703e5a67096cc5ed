// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the claims attached by [`require_token`](super::require_token).
//!
//! ```rust,ignore
//! async fn my_handler(Auth(claims): Auth) -> impl IntoResponse {
//!     // claims is the validated token payload
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{AuthError, Claims};

/// Request-scoped slot holding validated claims.
///
/// The type is only constructed by the auth middleware, so no other layer can
/// write to or collide with this extension slot.
#[derive(Debug, Clone)]
pub struct AuthContext {
    claims: Claims,
}

impl AuthContext {
    pub(super) fn new(claims: Claims) -> Self {
        Self { claims }
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }
}

/// Extractor for validated claims.
///
/// Only usable behind the token middleware; a missing context is a routing
/// bug and is reported as an internal error.
pub struct Auth(pub Claims);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<AuthContext>() {
            Some(context) => Ok(Auth(context.claims.clone())),
            None => {
                tracing::error!(
                    path = %parts.uri.path(),
                    "Handler reached without token middleware"
                );
                Err(AuthError::ClaimsUnavailable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::PrincipalKind;
    use axum::http::{Request, StatusCode};

    fn claims() -> Claims {
        Claims {
            kind: PrincipalKind::User,
            id: "user_from_middleware".to_string(),
            group: "g".to_string(),
            name: String::new(),
            issuer: None,
            issued_at: None,
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn auth_extractor_reads_context() {
        let mut parts = Request::builder().uri("/test").body(()).unwrap().into_parts().0;
        parts.extensions.insert(AuthContext::new(claims()));

        let Auth(found) = Auth::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(found.id, "user_from_middleware");
    }

    #[tokio::test]
    async fn auth_extractor_without_context_is_internal_error() {
        let mut parts = Request::builder().uri("/test").body(()).unwrap().into_parts().0;

        let result = Auth::from_request_parts(&mut parts, &()).await;
        let err = result.err().unwrap();
        assert!(matches!(err, AuthError::ClaimsUnavailable));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn raw_claims_in_extensions_are_not_trusted() {
        let mut parts = Request::builder().uri("/test").body(()).unwrap().into_parts().0;
        parts.extensions.insert(claims());

        assert!(Auth::from_request_parts(&mut parts, &()).await.is_err());
    }
}
