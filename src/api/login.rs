// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::HeaderMap};

use crate::{
    auth::{basic_login, AuthError, IssuedToken, PrincipalKind},
    state::AppState,
};

/// Exchange user Basic credentials for a signed token.
#[utoipa::path(
    get,
    path = "/api/v1/user",
    tag = "Auth",
    security(("basic_auth" = [])),
    responses(
        (status = 200, description = "Signed token", body = String, content_type = "application/jwt"),
        (status = 401, description = "Basic credentials missing"),
        (status = 403, description = "Unknown login or wrong password")
    )
)]
pub async fn login_user(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<IssuedToken, AuthError> {
    let verifier = state.verifier(PrincipalKind::User);
    basic_login(&headers, state.realm(), &verifier, &state.issuer).await
}

/// Exchange device Basic credentials for a signed token.
#[utoipa::path(
    get,
    path = "/api/v1/device",
    tag = "Auth",
    security(("basic_auth" = [])),
    responses(
        (status = 200, description = "Signed token", body = String, content_type = "application/jwt"),
        (status = 401, description = "Basic credentials missing"),
        (status = 403, description = "Unknown device or wrong password")
    )
)]
pub async fn login_device(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<IssuedToken, AuthError> {
    let verifier = state.verifier(PrincipalKind::Device);
    basic_login(&headers, state.realm(), &verifier, &state.issuer).await
}
