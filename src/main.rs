// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, process, sync::Arc, time::Duration};

use axum_server::Handle;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use geotrace_server::{
    api::router,
    auth::{ClaimsCodec, PrincipalKind, RequestAuthenticator},
    config::{Config, LogFormat, SeedAccount, DEFAULT_LOG_FILTER},
    error::ApiError,
    models::CreateDeviceRequest,
    state::AppState,
    store::{HashedPassword, InMemoryStore},
    tls::load_rustls_config,
};

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            process::exit(1);
        }
    };

    init_tracing(config.log_format);

    if let Err(e) = rustls::crypto::ring::default_provider().install_default() {
        tracing::error!(?e, "Failed to install rustls crypto provider");
        process::exit(1);
    }

    let codec = match &config.signing_key {
        Some(key) => ClaimsCodec::from_secret(key, config.token.clone()),
        None => {
            tracing::info!(
                "No shared signing key configured; tokens are valid for this process only"
            );
            ClaimsCodec::generate(config.token.clone())
        }
    };
    let codec = match codec {
        Ok(codec) => Arc::new(codec),
        Err(e) => {
            tracing::error!(error = %e, "Failed to set up token signing");
            process::exit(1);
        }
    };

    let store = match seeded_store(&config) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e.message, "Failed to seed accounts");
            process::exit(1);
        }
    };

    let authenticator = RequestAuthenticator::new(codec.clone(), config.realm.clone())
        .with_param_name(config.token_param.clone());
    let state = AppState::new(store, codec, authenticator);
    let app = router(state);

    let handle = Handle::new();
    tokio::spawn(shutdown_on_ctrl_c(handle.clone()));

    let served = match &config.tls {
        Some(paths) => {
            let tls_config = match load_rustls_config(paths).await {
                Ok(tls_config) => tls_config,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to load TLS credentials");
                    process::exit(1);
                }
            };
            tracing::info!(
                addr = %config.addr,
                "GeoTrace server listening on https (docs at /docs)"
            );
            axum_server::bind_rustls(config.addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
        }
        None => {
            tracing::info!(
                addr = %config.addr,
                "GeoTrace server listening on http (docs at /docs)"
            );
            axum_server::bind(config.addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await
        }
    };

    if let Err(e) = served {
        tracing::error!(error = %e, "Server failed");
        process::exit(1);
    }
}

fn init_tracing(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer().with_target(false)).init(),
    }
}

async fn shutdown_on_ctrl_c(handle: Handle<SocketAddr>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Gracefully shutting down");
    handle.graceful_shutdown(Some(Duration::from_secs(10)));
}

fn seeded_store(config: &Config) -> Result<InMemoryStore, ApiError> {
    let mut store = InMemoryStore::new();
    for SeedAccount {
        login,
        password,
        group,
        name,
    } in &config.seed_users
    {
        let password = HashedPassword::new(password)?;
        store.add_user(login.as_str(), password, group.as_str(), name.as_str())?;
        tracing::info!(
            kind = %PrincipalKind::User,
            login = %login,
            group = %group,
            "Seeded account"
        );
    }
    for SeedAccount {
        login,
        password,
        group,
        name,
    } in &config.seed_devices
    {
        store.create_device(
            group,
            CreateDeviceRequest {
                id: Some(login.clone()),
                name: name.clone(),
                device_type: None,
                password: password.clone(),
            },
            HashedPassword::new(password)?,
        )?;
        tracing::info!(
            kind = %PrincipalKind::Device,
            login = %login,
            group = %group,
            "Seeded account"
        );
    }
    Ok(store)
}
