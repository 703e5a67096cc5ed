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
    models::{CreateDeviceRequest, Device, UpdateDeviceRequest},
    state::AppState,
    store::HashedPassword,
};

#[utoipa::path(
    get,
    path = "/api/v1/devices",
    tag = "Devices",
    security(("bearer_auth" = [])),
    responses((status = 200, body = [Device]))
)]
pub async fn list_devices(
    Auth(claims): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Device>>, ApiError> {
    let group_id = claims.require_group()?;
    let store = state.store.read().await;
    Ok(Json(store.list_devices(group_id)))
}

/// Register a device in the caller's group. User tokens only.
#[utoipa::path(
    post,
    path = "/api/v1/devices",
    request_body = CreateDeviceRequest,
    tag = "Devices",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, body = Device),
        (status = 400, description = "Missing password or blank id"),
        (status = 403, description = "Not a user token"),
        (status = 409, description = "Device id already taken")
    )
)]
pub async fn create_device(
    Auth(claims): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateDeviceRequest>,
) -> Result<(StatusCode, Json<Device>), ApiError> {
    let group_id = claims.require_group()?;
    let password = HashedPassword::spawn(request.password.clone()).await?;
    let mut store = state.store.write().await;
    let device = store.create_device(group_id, request, password)?;
    tracing::info!(device_id = %device.id, registered_by = %claims.id, "Device registered");
    Ok((StatusCode::CREATED, Json(device)))
}

#[utoipa::path(
    get,
    path = "/api/v1/devices/{device_id}",
    params(
        ("device_id" = String, Path, description = "Identifier of the device")
    ),
    tag = "Devices",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = Device),
        (status = 404, description = "No such device in the caller's group")
    )
)]
pub async fn get_device(
    Auth(claims): Auth,
    Path(device_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Device>, ApiError> {
    let group_id = claims.require_group()?;
    let store = state.store.read().await;
    Ok(Json(store.get_device(group_id, &device_id)?))
}

#[utoipa::path(
    put,
    path = "/api/v1/devices/{device_id}",
    params(
        ("device_id" = String, Path, description = "Identifier of the device to change")
    ),
    request_body = UpdateDeviceRequest,
    tag = "Devices",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = Device),
        (status = 404, description = "No such device in the caller's group")
    )
)]
pub async fn update_device(
    Auth(claims): Auth,
    Path(device_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<UpdateDeviceRequest>,
) -> Result<Json<Device>, ApiError> {
    let group_id = claims.require_group()?;
    let password = match request.password.clone() {
        Some(password) => Some(HashedPassword::spawn(password).await?),
        None => None,
    };
    let mut store = state.store.write().await;
    Ok(Json(store.update_device(group_id, &device_id, request, password)?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/devices/{device_id}",
    params(
        ("device_id" = String, Path, description = "Identifier of the device to delete")
    ),
    tag = "Devices",
    security(("bearer_auth" = [])),
    responses((status = 204))
)]
pub async fn delete_device(
    Auth(claims): Auth,
    Path(device_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let group_id = claims.require_group()?;
    let mut store = state.store.write().await;
    store.delete_device(group_id, &device_id)?;
    tracing::info!(device_id = %device_id, removed_by = %claims.id, "Device removed");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Claims, CredentialVerifier, Principal, PrincipalKind};
    use crate::store::InMemoryStore;

    fn user_claims(group: &str) -> Claims {
        Claims::for_principal(&Principal {
            kind: PrincipalKind::User,
            id: "alice".to_string(),
            group: group.to_string(),
            name: String::new(),
        })
    }

    fn hashed(password: &str) -> HashedPassword {
        HashedPassword::new(password).unwrap()
    }

    fn register(id: &str) -> CreateDeviceRequest {
        CreateDeviceRequest {
            id: Some(id.to_string()),
            name: "Tracker".to_string(),
            device_type: Some("gps".to_string()),
            password: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn create_device_success() {
        let state = AppState::for_tests(InMemoryStore::new());

        let (status, Json(device)) = create_device(
            Auth(user_claims("g1")),
            State(state.clone()),
            Json(register("tracker-1")),
        )
        .await
        .expect("device creation succeeds");

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(device.id, "tracker-1");
        assert_eq!(device.group_id, "g1");

        let stored = state.store.read().await.list_devices("g1");
        assert_eq!(stored, vec![device]);
    }

    #[tokio::test]
    async fn update_then_delete_device() {
        let state = AppState::for_tests(InMemoryStore::new());
        state
            .store
            .write()
            .await
            .create_device("g1", register("tracker-1"), hashed("secret"))
            .unwrap();

        let Json(updated) = update_device(
            Auth(user_claims("g1")),
            Path("tracker-1".to_string()),
            State(state.clone()),
            Json(UpdateDeviceRequest {
                name: Some("Van".to_string()),
                ..Default::default()
            }),
        )
        .await
        .expect("update succeeds");
        assert_eq!(updated.name, "Van");
        assert_eq!(updated.device_type.as_deref(), Some("gps"));

        let status = delete_device(
            Auth(user_claims("g1")),
            Path("tracker-1".to_string()),
            State(state.clone()),
        )
        .await
        .expect("delete succeeds");
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.store.read().await.list_devices("g1").is_empty());
    }

    #[tokio::test]
    async fn device_of_other_group_is_hidden() {
        let state = AppState::for_tests(InMemoryStore::new());
        state
            .store
            .write()
            .await
            .create_device("g2", register("tracker-9"), hashed("secret"))
            .unwrap();

        let err = get_device(
            Auth(user_claims("g1")),
            Path("tracker-9".to_string()),
            State(state.clone()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err = delete_device(
            Auth(user_claims("g1")),
            Path("tracker-9".to_string()),
            State(state),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn password_change_is_hashed_before_storing() {
        let state = AppState::for_tests(InMemoryStore::new());
        create_device(
            Auth(user_claims("g1")),
            State(state.clone()),
            Json(register("tracker-1")),
        )
        .await
        .expect("device creation succeeds");

        update_device(
            Auth(user_claims("g1")),
            Path("tracker-1".to_string()),
            State(state.clone()),
            Json(UpdateDeviceRequest {
                password: Some("rotated".to_string()),
                ..Default::default()
            }),
        )
        .await
        .expect("update succeeds");

        let verifier = state.verifier(PrincipalKind::Device);
        assert!(verifier.verify("tracker-1", "rotated").await.is_ok());
        assert!(verifier.verify("tracker-1", "secret").await.is_err());
    }

    #[tokio::test]
    async fn empty_password_is_bad_request() {
        let state = AppState::for_tests(InMemoryStore::new());
        let mut request = register("tracker-1");
        request.password = String::new();

        let err = create_device(Auth(user_claims("g1")), State(state.clone()), Json(request))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(state.store.read().await.list_devices("g1").is_empty());
    }
}
