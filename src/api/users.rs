// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{auth::Auth, error::ApiError, models::User, state::AppState};

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = [User]),
        (status = 401, description = "Token missing"),
        (status = 403, description = "Token invalid or without group")
    )
)]
pub async fn list_users(
    Auth(claims): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, ApiError> {
    let group_id = claims.require_group()?;
    let store = state.store.read().await;
    Ok(Json(store.list_users(group_id)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    params(
        ("user_id" = String, Path, description = "Login of the user")
    ),
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = User),
        (status = 404, description = "No such user in the caller's group")
    )
)]
pub async fn get_user(
    Auth(claims): Auth,
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<User>, ApiError> {
    let group_id = claims.require_group()?;
    let store = state.store.read().await;
    Ok(Json(store.get_user(group_id, &user_id)?))
}
