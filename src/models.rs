// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response structures for the REST API. All types derive
//! `Serialize`, `Deserialize`, and `ToSchema` for JSON handling and OpenAPI
//! documentation.
//!
//! Every resource belongs to a group; handlers only expose resources of the
//! caller's group (the `group` token claim).
//!
//! ## Model Categories
//!
//! - **Users**: Human accounts, read-only through the API
//! - **Devices**: Trackers registered by users of a group
//! - **Places**: Named geofences (circle or polygon)

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
// Users
// =============================================================================

/// A human account. Password hashes never leave the store.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct User {
    /// Login name, unique across the service.
    pub login: String,
    /// Group the user belongs to.
    pub group_id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

// =============================================================================
// Devices
// =============================================================================

/// A registered tracking device.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Device {
    /// Device identifier, also its login.
    pub id: String,
    /// Group the device belongs to.
    pub group_id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Free-form hardware type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
}

/// Request body for registering a device.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateDeviceRequest {
    /// Desired identifier; generated when omitted.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub device_type: Option<String>,
    /// Password the device uses to log in.
    pub password: String,
}

/// Request body for changing a device. Omitted fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateDeviceRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

// =============================================================================
// Places
// =============================================================================

/// Geographic coordinate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Point {
    pub lon: f64,
    pub lat: f64,
}

/// Circular geofence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Circle {
    pub center: Point,
    /// Radius in meters.
    pub radius: f64,
}

/// A named geofence.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Place {
    /// Unique identifier for this place.
    pub id: String,
    /// Group the place belongs to.
    pub group_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circle: Option<Circle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon: Option<Vec<Point>>,
}

/// Request body for creating or replacing a place.
///
/// Exactly one of `circle` or `polygon` must be given.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct PlaceRequest {
    pub name: String,
    #[serde(default)]
    pub circle: Option<Circle>,
    #[serde(default)]
    pub polygon: Option<Vec<Point>>,
}

impl PlaceRequest {
    /// Check the request describes exactly one usable shape.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Place name is required".to_string());
        }
        match (&self.circle, &self.polygon) {
            (Some(circle), None) => {
                if circle.radius.is_finite() && circle.radius > 0.0 {
                    Ok(())
                } else {
                    Err("Circle radius must be positive".to_string())
                }
            }
            (None, Some(polygon)) => {
                if polygon.len() >= 3 {
                    Ok(())
                } else {
                    Err("Polygon needs at least 3 points".to_string())
                }
            }
            (Some(_), Some(_)) => Err("Place must have either a circle or a polygon".to_string()),
            (None, None) => Err("Place shape is required".to_string()),
        }
    }
}
