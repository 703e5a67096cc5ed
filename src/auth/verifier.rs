// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential verification contract used by the login flow.

use std::future::Future;

use super::Principal;

/// Outcome of a failed credential check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("principal not found")]
    NotFound,
    #[error("bad password")]
    BadPassword,
    /// Any other store failure; reported as an internal error.
    #[error("credential store failure: {0}")]
    Internal(String),
}

/// Resolves a login and password to a [`Principal`].
pub trait CredentialVerifier {
    fn verify(
        &self,
        login: &str,
        password: &str,
    ) -> impl Future<Output = Result<Principal, VerifyError>> + Send;
}
