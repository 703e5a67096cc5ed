// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory document store for users, devices and places.
//!
//! Every lookup is scoped by group: a resource from another group is reported
//! as not found. Passwords are kept as Argon2id PHC strings. Hashing and
//! verification run on the blocking pool, never under the store lock.

use std::collections::HashMap;
use std::sync::Arc;

use argon2::{
    password_hash::{self, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use rand::rngs::OsRng;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::{CredentialVerifier, Principal, PrincipalKind, VerifyError};
use crate::error::ApiError;
use crate::models::{CreateDeviceRequest, Device, Place, PlaceRequest, UpdateDeviceRequest, User};

/// Verified against when a login is unknown, so both outcomes cost one hash.
/// Parameters match `Argon2::default()`.
const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$G4pQR6P6lqw0yTGlzVNVpA$N2U4dnt/oubCw5/VXPLKBJ4z7ZuGj1WUHu/u1Syc0Bs";

/// Argon2id PHC string of a non-empty password.
#[derive(Clone)]
pub struct HashedPassword(String);

impl std::fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("HashedPassword(<redacted>)")
    }
}

impl HashedPassword {
    /// Hash on the current thread. Only for startup seeding and tests.
    pub fn new(password: &str) -> Result<Self, ApiError> {
        if password.is_empty() {
            return Err(ApiError::bad_request("Password must not be empty"));
        }
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| Self(hash.to_string()))
            .map_err(|e| {
                tracing::error!(error = %e, "Password hashing failed");
                ApiError::internal("Password hashing failed")
            })
    }

    /// Hash on the blocking pool.
    pub async fn spawn(password: String) -> Result<Self, ApiError> {
        tokio::task::spawn_blocking(move || Self::new(&password))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Password hashing task failed");
                ApiError::internal("Password hashing failed")
            })?
    }
}

struct Account<T> {
    record: T,
    password_hash: String,
}

#[derive(Default)]
pub struct InMemoryStore {
    users: HashMap<String, Account<User>>,
    devices: HashMap<String, Account<Device>>,
    places: HashMap<String, Place>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------------

    pub fn add_user(
        &mut self,
        login: impl Into<String>,
        password: HashedPassword,
        group_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<User, ApiError> {
        let login = login.into();
        if self.users.contains_key(&login) {
            return Err(ApiError::conflict(format!("User {login} already exists")));
        }

        let user = User {
            login: login.clone(),
            group_id: group_id.into(),
            name: name.into(),
        };
        self.users.insert(
            login,
            Account {
                record: user.clone(),
                password_hash: password.0,
            },
        );
        Ok(user)
    }

    pub fn list_users(&self, group_id: &str) -> Vec<User> {
        let mut users: Vec<User> = self
            .users
            .values()
            .map(|account| &account.record)
            .filter(|user| user.group_id == group_id)
            .cloned()
            .collect();
        users.sort_by(|a, b| a.login.cmp(&b.login));
        users
    }

    pub fn get_user(&self, group_id: &str, login: &str) -> Result<User, ApiError> {
        self.users
            .get(login)
            .map(|account| &account.record)
            .filter(|user| user.group_id == group_id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("User not found"))
    }

    // -------------------------------------------------------------------------
    // Devices
    // -------------------------------------------------------------------------

    pub fn list_devices(&self, group_id: &str) -> Vec<Device> {
        let mut devices: Vec<Device> = self
            .devices
            .values()
            .map(|account| &account.record)
            .filter(|device| device.group_id == group_id)
            .cloned()
            .collect();
        devices.sort_by(|a, b| a.id.cmp(&b.id));
        devices
    }

    /// Register a device. `password` is the hash of `request.password`.
    pub fn create_device(
        &mut self,
        group_id: &str,
        request: CreateDeviceRequest,
        password: HashedPassword,
    ) -> Result<Device, ApiError> {
        let id = match request.id {
            Some(id) if id.trim().is_empty() => {
                return Err(ApiError::bad_request("Device id must not be blank"))
            }
            Some(id) => id,
            None => Uuid::new_v4().to_string(),
        };
        if self.devices.contains_key(&id) {
            return Err(ApiError::conflict(format!("Device {id} already exists")));
        }

        let device = Device {
            id: id.clone(),
            group_id: group_id.to_string(),
            name: request.name,
            device_type: request.device_type,
        };
        self.devices.insert(
            id,
            Account {
                record: device.clone(),
                password_hash: password.0,
            },
        );
        Ok(device)
    }

    pub fn get_device(&self, group_id: &str, device_id: &str) -> Result<Device, ApiError> {
        self.device_account(group_id, device_id)
            .map(|account| account.record.clone())
    }

    /// Apply `request` to a device. `password` replaces the stored hash when
    /// given; `request.password` itself is ignored.
    pub fn update_device(
        &mut self,
        group_id: &str,
        device_id: &str,
        request: UpdateDeviceRequest,
        password: Option<HashedPassword>,
    ) -> Result<Device, ApiError> {
        let account = self
            .devices
            .get_mut(device_id)
            .filter(|account| account.record.group_id == group_id)
            .ok_or_else(|| ApiError::not_found("Device not found"))?;

        if let Some(name) = request.name {
            account.record.name = name;
        }
        if let Some(device_type) = request.device_type {
            account.record.device_type = Some(device_type).filter(|t| !t.is_empty());
        }
        if let Some(password) = password {
            account.password_hash = password.0;
        }
        Ok(account.record.clone())
    }

    pub fn delete_device(&mut self, group_id: &str, device_id: &str) -> Result<(), ApiError> {
        self.device_account(group_id, device_id)?;
        self.devices.remove(device_id);
        Ok(())
    }

    fn device_account(
        &self,
        group_id: &str,
        device_id: &str,
    ) -> Result<&Account<Device>, ApiError> {
        self.devices
            .get(device_id)
            .filter(|account| account.record.group_id == group_id)
            .ok_or_else(|| ApiError::not_found("Device not found"))
    }

    // -------------------------------------------------------------------------
    // Places
    // -------------------------------------------------------------------------

    pub fn list_places(&self, group_id: &str) -> Vec<Place> {
        let mut places: Vec<Place> = self
            .places
            .values()
            .filter(|place| place.group_id == group_id)
            .cloned()
            .collect();
        places.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        places
    }

    pub fn create_place(
        &mut self,
        group_id: &str,
        request: PlaceRequest,
    ) -> Result<Place, ApiError> {
        request.validate().map_err(ApiError::bad_request)?;

        let id = Uuid::new_v4().to_string();
        let place = Place {
            id: id.clone(),
            group_id: group_id.to_string(),
            name: request.name,
            circle: request.circle,
            polygon: request.polygon,
        };
        self.places.insert(id, place.clone());
        Ok(place)
    }

    pub fn get_place(&self, group_id: &str, place_id: &str) -> Result<Place, ApiError> {
        self.places
            .get(place_id)
            .filter(|place| place.group_id == group_id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("Place not found"))
    }

    pub fn replace_place(
        &mut self,
        group_id: &str,
        place_id: &str,
        request: PlaceRequest,
    ) -> Result<Place, ApiError> {
        request.validate().map_err(ApiError::bad_request)?;

        let place = self
            .places
            .get_mut(place_id)
            .filter(|place| place.group_id == group_id)
            .ok_or_else(|| ApiError::not_found("Place not found"))?;

        place.name = request.name;
        place.circle = request.circle;
        place.polygon = request.polygon;
        Ok(place.clone())
    }

    pub fn delete_place(&mut self, group_id: &str, place_id: &str) -> Result<(), ApiError> {
        self.get_place(group_id, place_id)?;
        self.places.remove(place_id);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Credentials
    // -------------------------------------------------------------------------

    /// Principal and stored PHC string for a login of the given kind.
    fn credentials(&self, kind: PrincipalKind, login: &str) -> Option<(Principal, String)> {
        match kind {
            PrincipalKind::User => self.users.get(login).map(|account| {
                let principal = Principal {
                    kind,
                    id: account.record.login.clone(),
                    group: account.record.group_id.clone(),
                    name: account.record.name.clone(),
                };
                (principal, account.password_hash.clone())
            }),
            PrincipalKind::Device => self.devices.get(login).map(|account| {
                let principal = Principal {
                    kind,
                    id: account.record.id.clone(),
                    group: account.record.group_id.clone(),
                    name: account.record.name.clone(),
                };
                (principal, account.password_hash.clone())
            }),
        }
    }
}

fn verify_password(password_hash: &str, password: &str) -> Result<(), VerifyError> {
    let parsed =
        PasswordHash::new(password_hash).map_err(|e| VerifyError::Internal(e.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(()),
        Err(password_hash::Error::Password) => Err(VerifyError::BadPassword),
        Err(e) => Err(VerifyError::Internal(e.to_string())),
    }
}

/// [`CredentialVerifier`] backed by the shared store for one principal kind.
#[derive(Clone)]
pub struct StoreVerifier {
    store: Arc<RwLock<InMemoryStore>>,
    kind: PrincipalKind,
}

impl StoreVerifier {
    pub fn new(store: Arc<RwLock<InMemoryStore>>, kind: PrincipalKind) -> Self {
        Self { store, kind }
    }
}

impl CredentialVerifier for StoreVerifier {
    async fn verify(&self, login: &str, password: &str) -> Result<Principal, VerifyError> {
        let found = self.store.read().await.credentials(self.kind, login);
        let (principal, password_hash) = match found {
            Some((principal, hash)) => (Some(principal), hash),
            None => (None, DUMMY_PASSWORD_HASH.to_string()),
        };

        let password = password.to_string();
        let outcome =
            tokio::task::spawn_blocking(move || verify_password(&password_hash, &password))
                .await
                .map_err(|e| VerifyError::Internal(e.to_string()))?;

        match principal {
            Some(principal) => outcome.map(|()| principal),
            None => Err(VerifyError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Circle, Point};
    use axum::http::StatusCode;

    fn place_request(name: &str) -> PlaceRequest {
        PlaceRequest {
            name: name.to_string(),
            circle: Some(Circle {
                center: Point { lon: 30.3, lat: 59.9 },
                radius: 200.0,
            }),
            polygon: None,
        }
    }

    fn device_request(id: &str, password: &str) -> CreateDeviceRequest {
        CreateDeviceRequest {
            id: Some(id.to_string()),
            name: "Tracker".to_string(),
            device_type: Some("gps".to_string()),
            password: password.to_string(),
        }
    }

    fn hashed(password: &str) -> HashedPassword {
        HashedPassword::new(password).unwrap()
    }

    fn add_device(store: &mut InMemoryStore, group_id: &str, id: &str, password: &str) -> Device {
        store
            .create_device(group_id, device_request(id, password), hashed(password))
            .unwrap()
    }

    fn verifier(
        store: InMemoryStore,
        kind: PrincipalKind,
    ) -> (StoreVerifier, Arc<RwLock<InMemoryStore>>) {
        let shared = Arc::new(RwLock::new(store));
        (StoreVerifier::new(shared.clone(), kind), shared)
    }

    #[tokio::test]
    async fn user_credentials_verify() {
        let mut store = InMemoryStore::new();
        store.add_user("test", hashed("test"), "group-1", "Tester").unwrap();
        let (verifier, _) = verifier(store, PrincipalKind::User);

        let principal = verifier.verify("test", "test").await.unwrap();
        assert_eq!(principal.kind, PrincipalKind::User);
        assert_eq!(principal.id, "test");
        assert_eq!(principal.group, "group-1");
        assert_eq!(principal.name, "Tester");

        assert_eq!(
            verifier.verify("test", "wrong").await,
            Err(VerifyError::BadPassword)
        );
        assert_eq!(
            verifier.verify("nobody", "test").await,
            Err(VerifyError::NotFound)
        );
    }

    #[tokio::test]
    async fn user_login_is_not_a_device_login() {
        let mut store = InMemoryStore::new();
        store.add_user("test", hashed("test"), "group-1", "").unwrap();
        let (verifier, _) = verifier(store, PrincipalKind::Device);
        assert_eq!(
            verifier.verify("test", "test").await,
            Err(VerifyError::NotFound)
        );
    }

    #[test]
    fn dummy_hash_costs_the_same_as_real_hashes() {
        let parsed = PasswordHash::new(DUMMY_PASSWORD_HASH).unwrap();
        assert_eq!(parsed.algorithm.as_str(), "argon2id");

        let params = argon2::Params::try_from(&parsed).unwrap();
        let defaults = argon2::Params::default();
        assert_eq!(params.m_cost(), defaults.m_cost());
        assert_eq!(params.t_cost(), defaults.t_cost());
        assert_eq!(params.p_cost(), defaults.p_cost());

        assert_eq!(
            verify_password(DUMMY_PASSWORD_HASH, "anything"),
            Err(VerifyError::BadPassword)
        );
    }

    #[tokio::test]
    async fn verification_does_not_hold_the_store_lock() {
        let mut store = InMemoryStore::new();
        store.add_user("test", hashed("test"), "g1", "").unwrap();
        let (verifier, shared) = verifier(store, PrincipalKind::User);

        let login = tokio::spawn(async move { verifier.verify("test", "test").await });
        let mut store = shared.write().await;
        store.add_user("other", hashed("pw"), "g1", "").unwrap();
        drop(store);

        assert!(login.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn spawned_hash_rejects_empty_password() {
        let err = HashedPassword::spawn(String::new()).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let hash = HashedPassword::spawn("secret".to_string()).await.unwrap();
        assert!(verify_password(&hash.0, "secret").is_ok());
        assert!(!format!("{hash:?}").contains("argon2"));
    }

    #[test]
    fn duplicate_user_is_conflict() {
        let mut store = InMemoryStore::new();
        store.add_user("test", hashed("a"), "g", "").unwrap();
        let err = store.add_user("test", hashed("b"), "g", "").unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[test]
    fn users_are_listed_per_group() {
        let mut store = InMemoryStore::new();
        store.add_user("bob", hashed("x"), "g1", "").unwrap();
        store.add_user("alice", hashed("x"), "g1", "").unwrap();
        store.add_user("eve", hashed("x"), "g2", "").unwrap();

        let logins: Vec<String> = store
            .list_users("g1")
            .into_iter()
            .map(|u| u.login)
            .collect();
        assert_eq!(logins, vec!["alice", "bob"]);
        assert!(store.get_user("g1", "eve").is_err());
        assert!(store.get_user("g2", "eve").is_ok());
    }

    #[tokio::test]
    async fn device_lifecycle() {
        let mut store = InMemoryStore::new();
        let device = add_device(&mut store, "g1", "d1", "secret");
        assert_eq!(device.group_id, "g1");
        let (verifier, shared) = verifier(store, PrincipalKind::Device);

        let principal = verifier.verify("d1", "secret").await.unwrap();
        assert_eq!(principal.kind, PrincipalKind::Device);
        assert_eq!(principal.group, "g1");

        let updated = shared
            .write()
            .await
            .update_device(
                "g1",
                "d1",
                UpdateDeviceRequest {
                    name: Some("Renamed".to_string()),
                    ..Default::default()
                },
                Some(hashed("new-secret")),
            )
            .unwrap();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.device_type.as_deref(), Some("gps"));
        assert_eq!(
            verifier.verify("d1", "secret").await,
            Err(VerifyError::BadPassword)
        );
        assert!(verifier.verify("d1", "new-secret").await.is_ok());

        let mut store = shared.write().await;
        store.delete_device("g1", "d1").unwrap();
        assert!(store.get_device("g1", "d1").is_err());
    }

    #[test]
    fn device_without_id_gets_generated_one() {
        let mut store = InMemoryStore::new();
        let mut request = device_request("", "secret");
        request.id = None;
        let device = store
            .create_device("g1", request, hashed("secret"))
            .unwrap();
        assert!(!device.id.is_empty());
    }

    #[test]
    fn device_requests_are_validated() {
        let err = HashedPassword::new("").unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let mut store = InMemoryStore::new();
        let err = store
            .create_device("g1", device_request(" ", "x"), hashed("x"))
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        add_device(&mut store, "g1", "d1", "x");
        let err = store
            .create_device("g2", device_request("d1", "y"), hashed("y"))
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[test]
    fn devices_of_other_groups_are_hidden() {
        let mut store = InMemoryStore::new();
        add_device(&mut store, "g1", "d1", "x");

        assert!(store.get_device("g2", "d1").is_err());
        assert!(store.delete_device("g2", "d1").is_err());
        assert!(store
            .update_device("g2", "d1", UpdateDeviceRequest::default(), None)
            .is_err());
        assert!(store.list_devices("g2").is_empty());
        assert_eq!(store.list_devices("g1").len(), 1);
    }

    #[test]
    fn place_lifecycle() {
        let mut store = InMemoryStore::new();
        let place = store.create_place("g1", place_request("Home")).unwrap();
        assert_eq!(store.get_place("g1", &place.id).unwrap(), place);

        let replaced = store
            .replace_place("g1", &place.id, place_request("Office"))
            .unwrap();
        assert_eq!(replaced.id, place.id);
        assert_eq!(replaced.name, "Office");

        store.delete_place("g1", &place.id).unwrap();
        assert!(store.get_place("g1", &place.id).is_err());
    }

    #[test]
    fn places_are_scoped_and_sorted() {
        let mut store = InMemoryStore::new();
        store.create_place("g1", place_request("Work")).unwrap();
        store.create_place("g1", place_request("Gym")).unwrap();
        let foreign = store.create_place("g2", place_request("Elsewhere")).unwrap();

        let names: Vec<String> = store
            .list_places("g1")
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Gym", "Work"]);
        assert!(store.get_place("g1", &foreign.id).is_err());
        assert!(store.delete_place("g1", &foreign.id).is_err());
    }

    #[test]
    fn invalid_place_is_bad_request() {
        let mut store = InMemoryStore::new();
        let mut request = place_request("Home");
        request.circle = None;
        let err = store.create_place("g1", request).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
