// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Session resolution
//!
//! Builds a per-request [`SessionContext`] from container-authenticated
//! credentials and the configured principal-discovery sources.
//!
//! # Resolution paths
//!
//! ```text
//! Credentials
//!    |
//!    |  container reports admin role?
//!    +------------------------------> SessionContext { is_admin: true }
//!    |                                (PEP bypassed entirely by callers)
//!    |
//!    |  container reports user role?
//!    +------------------------------> discover group principals,
//!    |                                all = {EVERYONE, user} + groups
//!    |
//!    |  otherwise
//!    +------------------------------> anonymous: all = {EVERYONE}
//! ```
//!
//! The resolved context is immutable and is the only channel by which the
//! enforcement point learns who the caller is.

use std::collections::HashSet;
use std::fmt;

use crate::principal::Principal;
use crate::AccessError;

/// Concrete principal-discovery sources.
pub mod sources;

/// Container role naming administrators. Holders bypass the enforcement
/// point entirely.
pub const CONTAINER_ADMIN_ROLE: &str = "repositoryAdmin";

/// Container role naming ordinary authenticated users.
pub const CONTAINER_USER_ROLE: &str = "repositoryUser";

/// Caller-supplied request credentials (SPI).
///
/// Owned by the caller of [`SessionResolver::resolve`]; read-only to this
/// crate. The transport layer implements this over whatever it
/// authenticated (servlet request, RPC metadata, test fixture).
pub trait Credentials {
    /// Name of the container-authenticated identity, if any.
    fn user_identity(&self) -> Option<&str>;

    /// Whether the container reports the identity as holding `role`.
    fn has_container_role(&self, role: &str) -> bool;

    /// Raw principal-discovery input keyed by attribute name (e.g. a
    /// delimited group header). `None` if the attribute is absent.
    fn discovery_attribute(&self, name: &str) -> Option<&str>;
}

/// Principal discovery SPI.
///
/// Given request credentials, a source contributes zero or more additional
/// principals (typically group memberships from a directory service).
pub trait PrincipalSource: Send + Sync {
    /// Short name identifying this source in logs.
    fn name(&self) -> &str;

    /// Principals discovered for these credentials.
    ///
    /// # Errors
    ///
    /// A failing source is isolated by the resolver: the error is logged
    /// and the source contributes nothing, but resolution of the other
    /// sources continues.
    fn principals(&self, credentials: &dyn Credentials)
        -> Result<HashSet<Principal>, AccessError>;
}

/// Immutable per-request security context.
///
/// Created once by [`SessionResolver::resolve`], threaded by value through
/// every enforcement call, discarded at end of request.
///
/// Invariant: `all_principals` always contains the Everyone
/// pseudo-principal, exactly once.
#[derive(Debug, Clone)]
pub struct SessionContext {
    authenticated: Option<Principal>,
    groups: HashSet<Principal>,
    all_principals: HashSet<Principal>,
    is_admin: bool,
}

impl SessionContext {
    /// Context for a request with no authenticated identity.
    pub fn anonymous() -> Self {
        Self {
            authenticated: None,
            groups: HashSet::new(),
            all_principals: everyone_set(),
            is_admin: false,
        }
    }

    /// Context for a container-reported administrator.
    ///
    /// The principal set is irrelevant under the admin bypass and is left
    /// at `{EVERYONE}`; callers must never hand an admin context to the
    /// enforcement point.
    pub fn admin(principal: Principal) -> Self {
        Self {
            authenticated: Some(principal),
            groups: HashSet::new(),
            all_principals: everyone_set(),
            is_admin: true,
        }
    }

    /// Context for an ordinary authenticated user with discovered groups.
    pub fn authenticated(principal: Principal, groups: HashSet<Principal>) -> Self {
        let mut all_principals = HashSet::with_capacity(groups.len() + 2);
        all_principals.insert(Principal::everyone().clone());
        all_principals.insert(principal.clone());
        all_principals.extend(groups.iter().cloned());
        Self {
            authenticated: Some(principal),
            groups,
            all_principals,
            is_admin: false,
        }
    }

    /// The authenticated principal, if the container reported one with the
    /// ordinary-user role.
    pub fn authenticated_principal(&self) -> Option<&Principal> {
        self.authenticated.as_ref()
    }

    /// Principals discovered by the configured sources.
    pub fn group_principals(&self) -> &HashSet<Principal> {
        &self.groups
    }

    /// The full principal set: Everyone, the authenticated principal and
    /// all discovered groups.
    pub fn all_principals(&self) -> &HashSet<Principal> {
        &self.all_principals
    }

    /// Whether the caller holds the container-level administrative role.
    ///
    /// Callers must check this before invoking any enforcement-point
    /// method; the enforcement point itself performs no admin check.
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }
}

impl fmt::Display for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.authenticated, self.is_admin) {
            (Some(p), true) => write!(f, "admin session for {}", p),
            (Some(p), false) => write!(f, "user session for {}", p),
            (None, _) => f.write_str("anonymous session"),
        }
    }
}

fn everyone_set() -> HashSet<Principal> {
    let mut set = HashSet::with_capacity(1);
    set.insert(Principal::everyone().clone());
    set
}

/// Builds session contexts from request credentials.
///
/// Holds the configured [`PrincipalSource`]s; no other state. Safe to share
/// across threads handling independent requests.
pub struct SessionResolver {
    sources: Vec<std::sync::Arc<dyn PrincipalSource>>,
}

impl SessionResolver {
    /// Create a resolver over the configured discovery sources.
    pub fn new(sources: Vec<std::sync::Arc<dyn PrincipalSource>>) -> Self {
        Self { sources }
    }

    /// Resolve a session context for these credentials.
    ///
    /// The admin fast path short-circuits before any principal discovery.
    /// An identity holding neither container role resolves like an
    /// anonymous request.
    pub fn resolve(&self, credentials: &dyn Credentials) -> SessionContext {
        let identity = match credentials.user_identity() {
            Some(id) => id,
            None => return SessionContext::anonymous(),
        };

        if credentials.has_container_role(CONTAINER_ADMIN_ROLE) {
            log::debug!("[access] admin bypass for {}", identity);
            return SessionContext::admin(Principal::user(identity));
        }

        if !credentials.has_container_role(CONTAINER_USER_ROLE) {
            return SessionContext::anonymous();
        }

        let groups = self.discover(credentials);
        log::debug!(
            "[access] resolved session for {} with {} group principal(s)",
            identity,
            groups.len()
        );
        SessionContext::authenticated(Principal::user(identity), groups)
    }

    /// Run every configured source, isolating per-source failures: a
    /// failing source contributes nothing and the others still run.
    fn discover(&self, credentials: &dyn Credentials) -> HashSet<Principal> {
        let mut groups = HashSet::new();
        for source in &self.sources {
            match source.principals(credentials) {
                Ok(found) => groups.extend(found),
                Err(e) => {
                    log::warn!(
                        "[access] principal source '{}' failed, contributing nothing: {}",
                        source.name(),
                        e
                    );
                }
            }
        }
        groups
    }
}
