// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::Auth,
    error::ApiError,
    models::{Place, PlaceRequest},
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/api/v1/places",
    tag = "Places",
    security(("bearer_auth" = [])),
    responses((status = 200, body = [Place]))
)]
pub async fn list_places(
    Auth(claims): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Place>>, ApiError> {
    let group_id = claims.require_group()?;
    let store = state.store.read().await;
    Ok(Json(store.list_places(group_id)))
}

#[utoipa::path(
    post,
    path = "/api/v1/places",
    request_body = PlaceRequest,
    tag = "Places",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, body = Place),
        (status = 400, description = "Invalid shape or name"),
        (status = 403, description = "Not a user token")
    )
)]
pub async fn create_place(
    Auth(claims): Auth,
    State(state): State<AppState>,
    Json(request): Json<PlaceRequest>,
) -> Result<(StatusCode, Json<Place>), ApiError> {
    let group_id = claims.require_group()?;
    let mut store = state.store.write().await;
    let place = store.create_place(group_id, request)?;
    Ok((StatusCode::CREATED, Json(place)))
}

#[utoipa::path(
    get,
    path = "/api/v1/places/{place_id}",
    params(
        ("place_id" = String, Path, description = "Identifier of the place")
    ),
    tag = "Places",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = Place),
        (status = 404, description = "No such place in the caller's group")
    )
)]
pub async fn get_place(
    Auth(claims): Auth,
    Path(place_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Place>, ApiError> {
    let group_id = claims.require_group()?;
    let store = state.store.read().await;
    Ok(Json(store.get_place(group_id, &place_id)?))
}

#[utoipa::path(
    put,
    path = "/api/v1/places/{place_id}",
    params(
        ("place_id" = String, Path, description = "Identifier of the place to replace")
    ),
    request_body = PlaceRequest,
    tag = "Places",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = Place),
        (status = 400, description = "Invalid shape or name"),
        (status = 404, description = "No such place in the caller's group")
    )
)]
pub async fn replace_place(
    Auth(claims): Auth,
    Path(place_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<PlaceRequest>,
) -> Result<Json<Place>, ApiError> {
    let group_id = claims.require_group()?;
    let mut store = state.store.write().await;
    Ok(Json(store.replace_place(group_id, &place_id, request)?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/places/{place_id}",
    params(
        ("place_id" = String, Path, description = "Identifier of the place to delete")
    ),
    tag = "Places",
    security(("bearer_auth" = [])),
    responses((status = 204))
)]
pub async fn delete_place(
    Auth(claims): Auth,
    Path(place_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let group_id = claims.require_group()?;
    let mut store = state.store.write().await;
    store.delete_place(group_id, &place_id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Claims, Principal, PrincipalKind};
    use crate::models::{Circle, Point};
    use crate::store::InMemoryStore;

    fn claims(group: &str) -> Claims {
        Claims::for_principal(&Principal {
            kind: PrincipalKind::User,
            id: "alice".to_string(),
            group: group.to_string(),
            name: String::new(),
        })
    }

    fn home() -> PlaceRequest {
        PlaceRequest {
            name: "Home".to_string(),
            circle: Some(Circle {
                center: Point { lon: 37.6, lat: 55.7 },
                radius: 100.0,
            }),
            polygon: None,
        }
    }

    #[tokio::test]
    async fn create_and_fetch_place() {
        let state = AppState::for_tests(InMemoryStore::new());

        let (status, Json(place)) =
            create_place(Auth(claims("g1")), State(state.clone()), Json(home()))
                .await
                .expect("place creation succeeds");
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(place.group_id, "g1");

        let Json(fetched) = get_place(Auth(claims("g1")), Path(place.id.clone()), State(state))
            .await
            .expect("place is visible to its group");
        assert_eq!(fetched, place);
    }

    #[tokio::test]
    async fn invalid_place_is_bad_request() {
        let state = AppState::for_tests(InMemoryStore::new());
        let mut request = home();
        request.circle = None;

        let err = create_place(Auth(claims("g1")), State(state), Json(request))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn replace_and_delete_respect_group() {
        let state = AppState::for_tests(InMemoryStore::new());
        let place = state.store.write().await.create_place("g1", home()).unwrap();

        let mut office = home();
        office.name = "Office".to_string();
        let err = replace_place(
            Auth(claims("g2")),
            Path(place.id.clone()),
            State(state.clone()),
            Json(office.clone()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let Json(replaced) = replace_place(
            Auth(claims("g1")),
            Path(place.id.clone()),
            State(state.clone()),
            Json(office),
        )
        .await
        .expect("owner can replace");
        assert_eq!(replaced.name, "Office");

        let status = delete_place(Auth(claims("g1")), Path(place.id), State(state.clone()))
            .await
            .expect("owner can delete");
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.store.read().await.list_places("g1").is_empty());
    }
}
