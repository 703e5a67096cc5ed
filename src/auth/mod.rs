// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Signed bearer tokens for the GeoTrace API.
//!
//! ## Auth Flow
//!
//! 1. A user or device logs in with HTTP Basic credentials at
//!    `GET /api/v1/user` or `GET /api/v1/device`
//! 2. The credential store verifies the password and resolves a [`Principal`]
//! 3. [`TokenIssuer`] mints an HS256 JWT (`application/jwt` response body)
//! 4. Clients send `Authorization: Bearer <token>` (or the `token` parameter)
//! 5. [`require_token`] validates the token, enforces the route's allowed
//!    [`PrincipalKind`]s and attaches the [`Claims`] for the [`Auth`] extractor
//!
//! ## Security
//!
//! - The signing key is 256 random bytes generated at startup unless a shared
//!   key is configured; restarting invalidates every token
//! - Only HS256 is accepted; `none` and other algorithms are rejected
//! - Tokens are stateless; there is no revocation list
//! - Validation failure details are logged, never returned to clients

pub mod authenticator;
pub mod claims;
pub mod codec;
pub mod error;
pub mod extractor;
pub mod issuer;
pub mod kinds;
pub mod middleware;
pub mod verifier;

pub use authenticator::RequestAuthenticator;
pub use claims::{Claims, Principal};
pub use codec::{ClaimsCodec, TokenError};
pub use error::AuthError;
pub use extractor::{Auth, AuthContext};
pub use issuer::{Expiry, TokenConfig, TokenIssuer};
pub use kinds::{KindSet, PrincipalKind};
pub use middleware::{basic_login, require_token, IssuedToken, TokenGuard};
pub use verifier::{CredentialVerifier, VerifyError};
