// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and the principal they are minted from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{AuthError, PrincipalKind};

/// An identity resolved by a credential verifier at login time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub kind: PrincipalKind,
    /// Login for users, device id for devices
    pub id: String,
    pub group: String,
    pub name: String,
}

/// Payload carried inside every signed token.
///
/// The schema is closed: unknown fields are ignored on decode and never
/// produced on encode. Empty `group` and `name` are omitted from the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// Principal kind (`sub` on the wire)
    #[serde(rename = "sub")]
    pub kind: PrincipalKind,

    /// Principal identifier
    pub id: String,

    /// Tenant group of the principal
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,

    /// Display name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Token issuer
    #[serde(rename = "iss", default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,

    /// Issued at (Unix timestamp)
    #[serde(rename = "iat", default, skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<i64>,

    /// Expiration (Unix timestamp)
    #[serde(rename = "exp", default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl Claims {
    /// Claims for `principal` without any registered fields stamped.
    pub fn for_principal(principal: &Principal) -> Self {
        Self {
            kind: principal.kind,
            id: principal.id.clone(),
            group: principal.group.clone(),
            name: principal.name.clone(),
            issuer: None,
            issued_at: None,
            expires_at: None,
        }
    }

    /// Group for tenant-scoped operations.
    ///
    /// A token without a group may authenticate, but it cannot read or
    /// modify group-owned resources.
    pub fn require_group(&self) -> Result<&str, AuthError> {
        if self.group.is_empty() {
            Err(AuthError::GroupRequired)
        } else {
            Ok(&self.group)
        }
    }

    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        self.expires_at.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }
}
