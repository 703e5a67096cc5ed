// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Principal kinds for route authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Category of an authenticated principal.
///
/// Carried in the token `sub` claim. Deserialization of any other value fails,
/// so a token can never silently fall back to a default kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    /// Human account, logs in at `GET /api/v1/user`
    User,
    /// Tracking device, logs in at `GET /api/v1/device`
    Device,
}

impl PrincipalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalKind::User => "user",
            PrincipalKind::Device => "device",
        }
    }

    fn bit(self) -> u8 {
        match self {
            PrincipalKind::User => 0b01,
            PrincipalKind::Device => 0b10,
        }
    }
}

impl std::fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of principal kinds a route accepts.
///
/// An empty set accepts every kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindSet(u8);

impl KindSet {
    /// Accepts any kind.
    pub const fn any() -> Self {
        KindSet(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn with(self, kind: PrincipalKind) -> Self {
        KindSet(self.0 | kind.bit())
    }

    pub fn contains(&self, kind: PrincipalKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Check whether a token of `kind` passes this set.
    pub fn permits(&self, kind: PrincipalKind) -> bool {
        self.is_empty() || self.contains(kind)
    }
}

impl FromIterator<PrincipalKind> for KindSet {
    fn from_iter<I: IntoIterator<Item = PrincipalKind>>(iter: I) -> Self {
        iter.into_iter().fold(KindSet::any(), KindSet::with)
    }
}
