// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTPS credentials loaded from PEM files.

use axum_server::tls_rustls::RustlsConfig;

use crate::config::TlsPaths;

#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("failed to load TLS credentials from {cert} / {key}: {source}")]
    Load {
        cert: String,
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// Build the rustls server configuration from a certificate chain and key.
///
/// The ring crypto provider must already be installed.
pub async fn load_rustls_config(paths: &TlsPaths) -> Result<RustlsConfig, TlsError> {
    RustlsConfig::from_pem_file(&paths.cert, &paths.key)
        .await
        .map_err(|source| TlsError::Load {
            cert: paths.cert.display().to_string(),
            key: paths.key.display().to_string(),
            source,
        })
}
