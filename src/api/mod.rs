// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Body,
    extract::{MatchedPath, Request},
    middleware::from_fn_with_state,
    routing::{get, post, put, MethodRouter},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info_span, Span};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{require_token, Claims, PrincipalKind, TokenGuard},
    models::{
        Circle, CreateDeviceRequest, Device, Place, PlaceRequest, Point, UpdateDeviceRequest, User,
    },
    state::AppState,
};

pub mod devices;
pub mod health;
pub mod login;
pub mod places;
pub mod users;

pub fn router(state: AppState) -> Router {
    let any_token = state.token_guard();
    let user_token = any_token.allow([PrincipalKind::User]);

    let v1_routes = Router::new()
        .route("/user", get(login::login_user))
        .route("/device", get(login::login_device))
        .route("/users", guarded(get(users::list_users), &any_token))
        .route("/users/{user_id}", guarded(get(users::get_user), &any_token))
        .route(
            "/devices",
            guarded(get(devices::list_devices), &any_token)
                .merge(guarded(post(devices::create_device), &user_token)),
        )
        .route(
            "/devices/{device_id}",
            guarded(get(devices::get_device), &any_token).merge(guarded(
                put(devices::update_device).delete(devices::delete_device),
                &user_token,
            )),
        )
        .route(
            "/places",
            guarded(get(places::list_places), &any_token)
                .merge(guarded(post(places::create_place), &user_token)),
        )
        .route(
            "/places/{place_id}",
            guarded(get(places::get_place), &any_token).merge(guarded(
                put(places::replace_place).delete(places::delete_place),
                &user_token,
            )),
        );

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .nest("/api/v1", v1_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(CorsLayer::permissive()),
        )
}

/// Wrap every method of `route` in the token middleware for `guard`.
fn guarded(route: MethodRouter<AppState>, guard: &TokenGuard) -> MethodRouter<AppState> {
    route.route_layer(from_fn_with_state(guard.clone(), require_token))
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        components.add_security_scheme(
            "basic_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Basic)),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        login::login_user,
        login::login_device,
        users::list_users,
        users::get_user,
        devices::list_devices,
        devices::create_device,
        devices::get_device,
        devices::update_device,
        devices::delete_device,
        places::list_places,
        places::create_place,
        places::get_place,
        places::replace_place,
        places::delete_place
    ),
    components(
        schemas(
            Claims,
            User,
            Device,
            CreateDeviceRequest,
            UpdateDeviceRequest,
            Point,
            Circle,
            Place,
            PlaceRequest,
            health::HealthResponse,
            health::LivenessResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Basic login, returns a signed token"),
        (name = "Users", description = "Users of the caller's group"),
        (name = "Devices", description = "Device registration and management"),
        (name = "Places", description = "Geofences"),
        (name = "Health", description = "Liveness probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Principal, TokenIssuer};
    use crate::models::CreateDeviceRequest;
    use crate::store::{HashedPassword, InMemoryStore};
    use axum::{
        body::to_bytes,
        http::{
            header::{AUTHORIZATION, CONTENT_TYPE, WWW_AUTHENTICATE},
            Method, Request, StatusCode,
        },
        response::Response,
    };
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde_json::Value;
    use tower::ServiceExt;

    fn hashed(password: &str) -> HashedPassword {
        HashedPassword::new(password).unwrap()
    }

    fn seeded_state() -> AppState {
        let mut store = InMemoryStore::new();
        store.add_user("test", hashed("test"), "group-1", "Test User").unwrap();
        store
            .create_device(
                "group-1",
                CreateDeviceRequest {
                    id: Some("tracker-1".to_string()),
                    name: "Tracker".to_string(),
                    device_type: None,
                    password: "secret".to_string(),
                },
                hashed("secret"),
            )
            .unwrap();
        AppState::for_tests(store)
    }

    fn token_for(issuer: &TokenIssuer, kind: PrincipalKind, id: &str) -> String {
        issuer
            .issue(&Principal {
                kind,
                id: id.to_string(),
                group: "group-1".to_string(),
                name: String::new(),
            })
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> Response {
        app.oneshot(request).await.unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn basic(login: &str, password: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{login}:{password}")))
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let app = router(seeded_state());
        let _ = app.into_make_service();
    }

    #[tokio::test]
    async fn missing_token_is_challenged() {
        let app = router(seeded_state());
        let response = send(
            app,
            Request::builder()
                .uri("/api/v1/places")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers()[WWW_AUTHENTICATE],
            r#"Bearer realm="GeoTrace""#
        );
    }

    #[tokio::test]
    async fn basic_login_returns_user_token() {
        let state = seeded_state();
        let app = router(state.clone());
        let response = send(
            app,
            Request::builder()
                .uri("/api/v1/user")
                .header(AUTHORIZATION, basic("test", "test"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/jwt");

        let token = body_string(response).await;
        let claims = state.issuer.codec().decode(&token).unwrap();
        assert_eq!(claims.kind, PrincipalKind::User);
        assert_eq!(claims.id, "test");
    }

    #[tokio::test]
    async fn wrong_password_yields_no_token() {
        let app = router(seeded_state());
        let response = send(
            app,
            Request::builder()
                .uri("/api/v1/user")
                .header(AUTHORIZATION, basic("test", "nope"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_string(response).await;
        assert!(!body.contains("eyJ"));
    }

    #[tokio::test]
    async fn device_token_cannot_create_places() {
        let state = seeded_state();
        let token = token_for(&state.issuer, PrincipalKind::Device, "tracker-1");
        let app = router(state);

        let response = send(
            app,
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/places")
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"name":"Home","circle":{"center":{"lon":1.0,"lat":2.0},"radius":10.0}}"#,
                ))
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["error"], "unauthorized token subject");
    }

    #[tokio::test]
    async fn device_token_can_read_places() {
        let state = seeded_state();
        let token = token_for(&state.issuer, PrincipalKind::Device, "tracker-1");
        let app = router(state);

        let response = send(
            app,
            Request::builder()
                .uri("/api/v1/places")
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "[]");
    }

    #[tokio::test]
    async fn user_token_creates_place_via_query_parameter() {
        let state = seeded_state();
        let token = token_for(&state.issuer, PrincipalKind::User, "test");
        let app = router(state.clone());

        let response = send(
            app,
            Request::builder()
                .method(Method::POST)
                .uri(format!("/api/v1/places?token={token}"))
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"name":"Home","circle":{"center":{"lon":1.0,"lat":2.0},"radius":10.0}}"#,
                ))
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(state.store.read().await.list_places("group-1").len(), 1);
    }

    #[tokio::test]
    async fn forged_token_is_forbidden() {
        let app = router(seeded_state());
        let response = send(
            app,
            Request::builder()
                .uri("/api/v1/devices")
                .header(AUTHORIZATION, "Bearer not.a.token")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn request_id_is_propagated() {
        let app = router(seeded_state());
        let response = send(
            app,
            Request::builder()
                .uri("/health/live")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[test]
    fn openapi_declares_security_schemes() {
        let doc = ApiDoc::openapi();
        let schemes = &doc.components.expect("components").security_schemes;
        assert!(schemes.contains_key("bearer_auth"));
        assert!(schemes.contains_key("basic_auth"));
    }
}
