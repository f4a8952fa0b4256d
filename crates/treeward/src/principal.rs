// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Security principals
//!
//! A [`Principal`] identifies a security subject: an authenticated user, a
//! group the user belongs to, or the universal [`everyone`](Principal::everyone)
//! pseudo-principal that is present in every session's principal set.
//!
//! Equality and hashing are by name only: two principals with the same name
//! are the same subject regardless of how they were discovered.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

/// Name of the universal pseudo-principal carried by every session.
pub const EVERYONE_NAME: &str = "EVERYONE";

/// Kind of security subject a principal identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrincipalKind {
    /// An authenticated user identity.
    User,
    /// A group membership discovered for the request.
    Group,
    /// The universal pseudo-principal present in all sessions.
    Everyone,
}

/// Immutable identity of a security subject.
///
/// # Equality
///
/// Principals compare and hash by name alone, so principal sets cannot hold
/// two subjects with the same name even if their kinds differ.
#[derive(Debug, Clone, Eq)]
pub struct Principal {
    name: String,
    kind: PrincipalKind,
}

impl Principal {
    /// Create a user principal.
    pub fn user<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            kind: PrincipalKind::User,
        }
    }

    /// Create a group principal.
    pub fn group<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            kind: PrincipalKind::Group,
        }
    }

    /// The process-wide Everyone pseudo-principal.
    ///
    /// Created once and shared by reference; it carries no
    /// credential-specific state.
    pub fn everyone() -> &'static Principal {
        static EVERYONE: OnceLock<Principal> = OnceLock::new();
        EVERYONE.get_or_init(|| Principal {
            name: EVERYONE_NAME.to_string(),
            kind: PrincipalKind::Everyone,
        })
    }

    /// Principal name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Principal kind.
    pub fn kind(&self) -> PrincipalKind {
        self.kind
    }
}

impl PartialEq for Principal {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Hash for Principal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
