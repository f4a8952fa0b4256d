// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Access-control configuration
//!
//! Provides the builder API for wiring the suite's collaborators. All
//! configuration is injected here, at construction; nothing is looked up
//! ambiently at check time.

use std::path::PathBuf;
use std::sync::Arc;

use crate::acl::AclProvider;
use crate::auth::PrincipalSource;
use crate::decision::PermissionDecision;
use crate::store::TreeStoreFactory;
use crate::AccessError;

/// Configuration for an access-control suite.
///
/// Holds the collaborators the core consumes but never implements:
/// principal-discovery sources, the ACL provider, the permission decision,
/// and the storage-handle factory, plus audit-trail options.
///
/// # Thread Safety
///
/// `AccessConfig` is `Clone` to support sharing across request handlers.
/// All fields are immutable after construction (enforced by the builder).
///
/// # Example
///
/// ```ignore
/// use treeward::AccessConfig;
///
/// let config = AccessConfig::builder()
///     .acl_provider(provider)
///     .decision(policy)
///     .store_factory(factory)
///     .principal_source(Arc::new(DelimitedAttributeSource::new("x-groups", ',')))
///     .enable_audit_log(true)
///     .audit_log_path("/var/log/treeward_audit.log")
///     .build()?;
/// ```
#[derive(Clone)]
pub struct AccessConfig {
    /// Principal-discovery sources consulted for ordinary-user sessions.
    pub principal_sources: Vec<Arc<dyn PrincipalSource>>,

    /// ACL lookup capability (effective and explicit per-path ACLs).
    pub acl_provider: Arc<dyn AclProvider>,

    /// Pluggable allow/deny decision over (path, actions, roles).
    pub decision: Arc<dyn PermissionDecision>,

    /// Factory for internal storage handles.
    pub store_factory: Arc<dyn TreeStoreFactory>,

    /// Enable the hash-chained audit trail.
    pub enable_audit_log: bool,

    /// Path to the audit log file (if audit logging is enabled).
    ///
    /// If not set and audit logging is enabled, the chain is kept in
    /// memory only.
    pub audit_log_path: Option<PathBuf>,
}

impl AccessConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AccessConfigBuilder {
        AccessConfigBuilder::default()
    }
}

/// Fluent builder for [`AccessConfig`] with validation.
///
/// # Required Fields
///
/// - [`acl_provider`](AccessConfigBuilder::acl_provider)
/// - [`decision`](AccessConfigBuilder::decision)
/// - [`store_factory`](AccessConfigBuilder::store_factory)
///
/// # Optional Fields
///
/// - [`principal_source`](AccessConfigBuilder::principal_source) (zero or
///   more; a suite with none discovers no group principals)
/// - [`enable_audit_log`](AccessConfigBuilder::enable_audit_log)
///   (default: false)
/// - [`audit_log_path`](AccessConfigBuilder::audit_log_path)
///
/// `build()` returns [`AccessError::Config`] if a required collaborator is
/// missing; a suite must never discover a missing collaborator per call.
#[derive(Default)]
pub struct AccessConfigBuilder {
    principal_sources: Vec<Arc<dyn PrincipalSource>>,
    acl_provider: Option<Arc<dyn AclProvider>>,
    decision: Option<Arc<dyn PermissionDecision>>,
    store_factory: Option<Arc<dyn TreeStoreFactory>>,
    enable_audit_log: bool,
    audit_log_path: Option<PathBuf>,
}

impl AccessConfigBuilder {
    /// Register a principal-discovery source. May be called repeatedly;
    /// sources are consulted in registration order.
    pub fn principal_source(mut self, source: Arc<dyn PrincipalSource>) -> Self {
        self.principal_sources.push(source);
        self
    }

    /// Set the ACL lookup capability (required).
    pub fn acl_provider(mut self, provider: Arc<dyn AclProvider>) -> Self {
        self.acl_provider = Some(provider);
        self
    }

    /// Set the permission decision (required).
    pub fn decision(mut self, decision: Arc<dyn PermissionDecision>) -> Self {
        self.decision = Some(decision);
        self
    }

    /// Set the storage-handle factory (required).
    pub fn store_factory(mut self, factory: Arc<dyn TreeStoreFactory>) -> Self {
        self.store_factory = Some(factory);
        self
    }

    /// Enable the audit trail (default: false).
    pub fn enable_audit_log(mut self, enabled: bool) -> Self {
        self.enable_audit_log = enabled;
        self
    }

    /// Set the audit log file path.
    pub fn audit_log_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.audit_log_path = Some(path.into());
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Config`] if the ACL provider, the decision or
    /// the store factory is missing.
    pub fn build(self) -> Result<AccessConfig, AccessError> {
        let acl_provider = self
            .acl_provider
            .ok_or_else(|| AccessError::Config("no ACL provider configured".to_string()))?;

        let decision = self
            .decision
            .ok_or_else(|| AccessError::Config("no permission decision configured".to_string()))?;

        let store_factory = self
            .store_factory
            .ok_or_else(|| AccessError::Config("no store factory configured".to_string()))?;

        Ok(AccessConfig {
            principal_sources: self.principal_sources,
            acl_provider,
            decision,
            store_factory,
            enable_audit_log: self.enable_audit_log,
            audit_log_path: self.audit_log_path,
        })
    }
}
