// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! GeoTrace - Location Tracking Service
//!
//! REST backend for users, devices and geofenced places. Users and devices
//! log in with HTTP Basic credentials and receive an HS256 bearer token that
//! gates every resource route.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token issuance, validation and route guards
//! - `store` - In-memory users, devices and places
//! - `tls` - HTTPS credentials

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod store;
pub mod tls;
