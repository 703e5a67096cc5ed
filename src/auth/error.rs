// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::codec::TokenError;
use super::verifier::VerifyError;

/// Authentication error type.
///
/// Detailed reasons (the inner [`TokenError`], verifier messages) are kept for
/// logging only; responses carry the coarse message and code.
#[derive(Debug)]
pub enum AuthError {
    /// No bearer token in header, query or form
    CredentialMissing { realm: String },
    /// Token failed decoding or validation
    CredentialInvalid(TokenError),
    /// Token is valid but its kind is not allowed on this route
    KindRejected,
    /// Token has no group but the operation is group-scoped
    GroupRequired,
    /// Login request without usable Basic credentials
    BasicMissing { realm: String },
    /// Unknown login or wrong password
    BadCredentials,
    /// Credential store failed
    VerifierFailure(String),
    /// Handler ran without claims attached (routing bug)
    ClaimsUnavailable,
    /// Token could not be minted
    IssueFailure(TokenError),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::CredentialMissing { .. } => "credential_missing",
            AuthError::CredentialInvalid(_) => "credential_invalid",
            AuthError::KindRejected => "kind_rejected",
            AuthError::GroupRequired => "group_required",
            AuthError::BasicMissing { .. } => "basic_credentials_missing",
            AuthError::BadCredentials => "bad_credentials",
            AuthError::VerifierFailure(_) => "verifier_failure",
            AuthError::ClaimsUnavailable => "claims_unavailable",
            AuthError::IssueFailure(_) => "issue_failure",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::CredentialMissing { .. } | AuthError::BasicMissing { .. } => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::CredentialInvalid(_)
            | AuthError::KindRejected
            | AuthError::GroupRequired
            | AuthError::BadCredentials => StatusCode::FORBIDDEN,
            AuthError::VerifierFailure(_)
            | AuthError::ClaimsUnavailable
            | AuthError::IssueFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// `WWW-Authenticate` challenge for 401 responses.
    pub fn challenge(&self) -> Option<String> {
        match self {
            AuthError::CredentialMissing { realm } => Some(format!("Bearer realm={realm:?}")),
            AuthError::BasicMissing { realm } => Some(format!("Basic realm={realm:?}")),
            _ => None,
        }
    }

    /// Client-facing message. Never includes validation sub-reasons.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::CredentialMissing { .. } => "Authorization token is required",
            AuthError::CredentialInvalid(_) => "Invalid token",
            AuthError::KindRejected => "unauthorized token subject",
            AuthError::GroupRequired => "Token is not bound to a group",
            AuthError::BasicMissing { .. } => "Basic credentials are required",
            AuthError::BadCredentials => "Invalid login or password",
            AuthError::VerifierFailure(_)
            | AuthError::ClaimsUnavailable
            | AuthError::IssueFailure(_) => "Internal authentication error",
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::CredentialInvalid(reason) => write!(f, "Invalid token: {reason}"),
            AuthError::VerifierFailure(msg) => write!(f, "Credential verification failed: {msg}"),
            AuthError::IssueFailure(reason) => write!(f, "Token issue failed: {reason}"),
            other => f.write_str(other.public_message()),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        AuthError::CredentialInvalid(err)
    }
}

impl From<VerifyError> for AuthError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::NotFound | VerifyError::BadPassword => AuthError::BadCredentials,
            VerifyError::Internal(msg) => AuthError::VerifierFailure(msg),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let challenge = self
            .challenge()
            .and_then(|value| HeaderValue::from_str(&value).ok());
        let body = Json(AuthErrorBody {
            error: self.public_message().to_string(),
            error_code: self.error_code().to_string(),
        });

        let mut response = (status, body).into_response();
        if let Some(value) = challenge {
            response.headers_mut().insert(WWW_AUTHENTICATE, value);
        }
        response
    }
}
