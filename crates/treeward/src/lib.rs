// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # Treeward - access control for hierarchical resource repositories
//!
//! Decides, per request, which security principals apply and whether those
//! principals may perform an action on a path in a tree-structured resource
//! store. Provides:
//!
//! - **Session resolution** -- principal assembly from a container-
//!   authenticated identity plus pluggable discovery sources, with an
//!   administrator fast path
//! - **Policy enforcement** -- per-path ACL resolution into effective roles
//!   and allow/deny decisions through a pluggable policy
//! - **Recursive removal precondition** -- "can I delete this whole
//!   subtree" checked fail-fast over every descendant
//! - **Read filtering** -- lazy, order-preserving permission filter over
//!   path listings
//! - **Audit** -- hash-chained trail of resolutions and decisions
//!
//! # Architecture
//!
//! ```text
//! AccessControlSuite
//! +-- SessionResolver          (credentials -> SessionContext)
//! |     +-- PrincipalSource*   (pluggable group discovery)
//! +-- PolicyEnforcementPoint   (path + actions + session -> allow/deny)
//! |     +-- AclProvider        (per-path ACLs, inherited by the store)
//! |     +-- PermissionDecision (pluggable role -> action policy)
//! |     +-- TreeStoreFactory   (internal read handles)
//! +-- AuditLog                 (hash-chained event trail)
//! ```
//!
//! The suite owns configuration only; every piece of per-request state
//! (session context, traversal stack, filter position) lives in the call
//! that created it, so the suite is safe to share across request threads.
//!
//! # Usage
//!
//! ```ignore
//! use treeward::{AccessConfig, AccessControlSuite};
//!
//! let suite = AccessControlSuite::new(
//!     AccessConfig::builder()
//!         .acl_provider(acl_provider)
//!         .decision(policy)
//!         .store_factory(store_factory)
//!         .enable_audit_log(true)
//!         .build()?,
//! )?;
//!
//! let session = suite.resolve_session(&credentials);
//! if suite.authorize("/records/2024", &["remove"], &session)? {
//!     // perform the removal
//! }
//! ```
//!
//! Deletion semantics: a `remove` grant is provisional until every node in
//! the subtree passes its own `remove` check; `remove_child_nodes` is
//! always granted because child deletion is authorized on the child itself.

/// ACL types, role resolution and the ACL lookup SPI.
pub mod acl;
/// Hash-chained audit trail for access events.
pub mod audit;
/// Credentials SPI, principal discovery and session resolution.
pub mod auth;
/// Builder and configuration for the suite.
pub mod config;
/// Pluggable permission decision SPI and action names.
pub mod decision;
/// Policy enforcement point, removal checker and read filter.
pub mod pep;
/// Security principals.
pub mod principal;
/// Tree storage SPI.
pub mod store;

pub use config::{AccessConfig, AccessConfigBuilder};

use std::sync::{Arc, Mutex};

use crate::audit::{unix_now, AccessEvent, AuditLog};
use crate::auth::{Credentials, SessionContext, SessionResolver};
use crate::pep::{FilteredPaths, PolicyEnforcementPoint};

/// Access-control suite
///
/// Owns the session resolver, the policy enforcement point and the audit
/// log, all wired from one [`AccessConfig`].
///
/// # Lifecycle
///
/// 1. Created via [`AccessControlSuite::new`]
/// 2. Shared by the transport layer across request threads
/// 3. Consulted per request: resolve a session, then authorize operations
pub struct AccessControlSuite {
    /// Session resolution (admin fast path + principal discovery).
    resolver: SessionResolver,

    /// Policy enforcement point (per-path allow/deny, removal check,
    /// read filtering).
    pep: PolicyEnforcementPoint,

    /// Audit log, serialized behind a mutex for concurrent recording.
    audit: Option<Arc<Mutex<AuditLog>>>,

    /// Configuration (collaborators and audit options).
    config: AccessConfig,
}

impl AccessControlSuite {
    /// Create a new access-control suite.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::AuditLog`] if the configured audit log file
    /// cannot be opened.
    pub fn new(config: AccessConfig) -> Result<Self, AccessError> {
        let audit = if config.enable_audit_log {
            let log = match &config.audit_log_path {
                Some(path) => AuditLog::with_file(path)?,
                None => AuditLog::new(),
            };
            Some(Arc::new(Mutex::new(log)))
        } else {
            None
        };

        let resolver = SessionResolver::new(config.principal_sources.clone());
        let pep = PolicyEnforcementPoint::new(
            Arc::clone(&config.acl_provider),
            Arc::clone(&config.decision),
            Arc::clone(&config.store_factory),
            audit.clone(),
        );

        Ok(Self {
            resolver,
            pep,
            audit,
            config,
        })
    }

    /// Resolve a session context for request credentials.
    ///
    /// Administrators are signalled by [`SessionContext::is_admin`]; for
    /// them no principal discovery runs and the enforcement point must not
    /// be consulted.
    pub fn resolve_session(&self, credentials: &dyn Credentials) -> SessionContext {
        let session = self.resolver.resolve(credentials);
        self.record(AccessEvent::SessionResolved {
            principal: session
                .authenticated_principal()
                .map(|p| p.name().to_string()),
            admin: session.is_admin(),
            timestamp: unix_now(),
        });
        session
    }

    /// Whether `session` may perform `actions` on the node at `path`.
    ///
    /// Applies the total admin bypass, opens an internal storage handle and
    /// delegates to the enforcement point.
    ///
    /// # Errors
    ///
    /// [`AccessError::StorageUnavailable`] if the handle cannot be opened
    /// or a lookup fails mid-check. Denials are `Ok(false)`.
    pub fn authorize(
        &self,
        path: &str,
        actions: &[&str],
        session: &SessionContext,
    ) -> Result<bool, AccessError> {
        if session.is_admin() {
            log::debug!("[access] admin bypass grants {:?} at {}", actions, path);
            return Ok(true);
        }
        let store = self.config.store_factory.open_internal()?;
        self.pep.has_permission(store.as_ref(), path, actions, session)
    }

    /// Wrap an upstream path sequence in a lazy read-permission filter.
    ///
    /// The admin fast path does not apply to read filtering; the session's
    /// own principals are used for every element.
    ///
    /// # Errors
    ///
    /// [`AccessError::StorageUnavailable`] if the internal handle cannot
    /// be opened.
    pub fn filter_readable<'a, I>(
        &'a self,
        paths: I,
        session: &'a SessionContext,
    ) -> Result<FilteredPaths<'a, I>, AccessError>
    where
        I: Iterator<Item = String>,
    {
        self.pep.filter_readable(paths, session)
    }

    /// Get a reference to the policy enforcement point.
    pub fn pep(&self) -> &PolicyEnforcementPoint {
        &self.pep
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &AccessConfig {
        &self.config
    }

    /// Check if the audit trail is enabled.
    pub fn is_audit_log_enabled(&self) -> bool {
        self.audit.is_some()
    }

    /// Record an access event (thread-safe).
    ///
    /// Returns `Ok(())` if auditing is disabled or the event was recorded.
    ///
    /// # Errors
    ///
    /// [`AccessError::AuditLog`] if the audit backend fails or its mutex
    /// is poisoned.
    pub fn log_event(&self, event: &AccessEvent) -> Result<(), AccessError> {
        if let Some(audit) = &self.audit {
            let mut guard = audit
                .lock()
                .map_err(|_| AccessError::AuditLog("audit log mutex poisoned".to_string()))?;
            guard.log_event(event)?;
        }
        Ok(())
    }

    /// Record without surfacing audit failures; used for best-effort
    /// events attached to resolution.
    fn record(&self, event: AccessEvent) {
        if let Err(e) = self.log_event(&event) {
            log::warn!("[access] failed to record audit event: {}", e);
        }
    }
}

impl std::fmt::Debug for AccessControlSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessControlSuite")
            .field(
                "principal_sources",
                &self.config.principal_sources.len(),
            )
            .field("audit", &self.audit.as_ref().map(|_| "Mutex<AuditLog>"))
            .field("enable_audit_log", &self.config.enable_audit_log)
            .field("audit_log_path", &self.config.audit_log_path)
            .finish()
    }
}

/// Access-control error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// Suite built without a required collaborator
    Config(String),

    /// A storage or ACL lookup failed; never converted to allow or deny
    StorageUnavailable(String),

    /// Audit trail backend failure
    AuditLog(String),
}

impl std::fmt::Display for AccessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Access configuration error: {}", msg),
            Self::StorageUnavailable(msg) => write!(f, "Storage unavailable: {}", msg),
            Self::AuditLog(msg) => write!(f, "Audit log error: {}", msg),
        }
    }
}

impl std::error::Error for AccessError {}
