// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::auth::{ClaimsCodec, PrincipalKind, RequestAuthenticator, TokenGuard, TokenIssuer};
use crate::store::{InMemoryStore, StoreVerifier};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<InMemoryStore>>,
    pub issuer: Arc<TokenIssuer>,
    pub authenticator: Arc<RequestAuthenticator>,
}

impl AppState {
    pub fn new(
        store: InMemoryStore,
        codec: Arc<ClaimsCodec>,
        authenticator: RequestAuthenticator,
    ) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            issuer: Arc::new(TokenIssuer::new(codec)),
            authenticator: Arc::new(authenticator),
        }
    }

    pub fn realm(&self) -> &str {
        self.authenticator.realm()
    }

    /// Guard accepting any valid token.
    pub fn token_guard(&self) -> TokenGuard {
        TokenGuard::new(self.authenticator.clone())
    }

    pub fn verifier(&self, kind: PrincipalKind) -> StoreVerifier {
        StoreVerifier::new(self.store.clone(), kind)
    }
}

#[cfg(test)]
impl AppState {
    /// State with a fixed key and default token settings.
    pub fn for_tests(store: InMemoryStore) -> Self {
        use crate::auth::TokenConfig;

        let codec = Arc::new(
            ClaimsCodec::from_secret(&[11u8; 64], TokenConfig::default())
                .expect("test key is long enough"),
        );
        let authenticator = RequestAuthenticator::new(codec.clone(), crate::config::DEFAULT_REALM);
        Self::new(store, codec, authenticator)
    }
}
