// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Policy Enforcement Point
//!
//! Answers allow/deny for a path + action set against the caller's session,
//! and builds lazily-filtered read listings.
//!
//! # Decision pipeline
//!
//! ```text
//! has_permission(store, path, actions, session)
//!    |
//!    |  1. no authenticated principal?          -> false (fail closed)
//!    |  2. effective ACL at path -> roles       (lookup failure is fatal)
//!    |  3. actions == [remove_child_nodes]?     -> true  (see decision SPI)
//!    |  4. PermissionDecision denies?           -> false
//!    |  5. actions == [remove]?                 -> recursive subtree check
//!    |  otherwise                               -> true
//! ```
//!
//! Lookup failures (ACL provider, child enumeration, handle opening) are
//! never converted into an allow or a deny; they abort the call as
//! [`AccessError::StorageUnavailable`].

use std::sync::{Arc, Mutex};

use crate::acl::{resolve_roles, AclProvider};
use crate::audit::{unix_now, AccessEvent, AccessOutcome, AuditLog};
use crate::auth::SessionContext;
use crate::decision::{PermissionDecision, ACTION_REMOVE, ACTION_REMOVE_CHILD_NODES};
use crate::store::{TreeStore, TreeStoreFactory};
use crate::AccessError;

mod filter;
mod removal;

pub use filter::FilteredPaths;

/// Policy Enforcement Point over the configured collaborators.
///
/// Holds only configuration injected at construction; no per-call state, no
/// locking of its own. Safe to invoke concurrently from threads handling
/// independent requests.
pub struct PolicyEnforcementPoint {
    acl_provider: Arc<dyn AclProvider>,
    decision: Arc<dyn PermissionDecision>,
    store_factory: Arc<dyn TreeStoreFactory>,
    audit: Option<Arc<Mutex<AuditLog>>>,
}

impl PolicyEnforcementPoint {
    pub(crate) fn new(
        acl_provider: Arc<dyn AclProvider>,
        decision: Arc<dyn PermissionDecision>,
        store_factory: Arc<dyn TreeStoreFactory>,
        audit: Option<Arc<Mutex<AuditLog>>>,
    ) -> Self {
        Self {
            acl_provider,
            decision,
            store_factory,
            audit,
        }
    }

    /// Whether `session` may perform `actions` on the node at `path`.
    ///
    /// Callable only for non-admin sessions; callers must check
    /// [`SessionContext::is_admin`] first, this method performs no admin
    /// check. A session without an authenticated principal is denied every
    /// action here; anonymous-read semantics route through the Everyone
    /// principal inside a populated session.
    ///
    /// # Errors
    ///
    /// [`AccessError::StorageUnavailable`] if the ACL provider or the store
    /// cannot be reached. Denials are `Ok(false)`, never errors.
    pub fn has_permission(
        &self,
        store: &dyn TreeStore,
        path: &str,
        actions: &[&str],
        session: &SessionContext,
    ) -> Result<bool, AccessError> {
        if session.authenticated_principal().is_none() {
            return Ok(false);
        }

        let acl = self.acl_provider.effective_acl(store, path)?;
        let roles = resolve_roles(&acl, session.all_principals());
        log::debug!("[access] {:?}\t{:?}\t{}", roles, actions, path);

        if actions.len() == 1 && actions[0] == ACTION_REMOVE_CHILD_NODES {
            // Conferred by the "remove" check on the child node itself.
            self.audit_decision(path, actions, AccessOutcome::Allowed);
            return Ok(true);
        }

        if !self.decision.allows(path, actions, &roles) {
            log::debug!("[access] decision denied {:?} at {}", actions, path);
            self.audit_decision(path, actions, AccessOutcome::Denied);
            return Ok(false);
        }

        if actions.len() == 1 && actions[0] == ACTION_REMOVE {
            // The grant is provisional: every node in the subtree must be
            // removable as well.
            let allowed = removal::can_remove_subtree(self, store, path, session, &roles)?;
            let outcome = if allowed {
                AccessOutcome::Allowed
            } else {
                AccessOutcome::Denied
            };
            self.audit_decision(path, actions, outcome);
            return Ok(allowed);
        }

        self.audit_decision(path, actions, AccessOutcome::Allowed);
        Ok(true)
    }

    /// Wrap an upstream path sequence in a lazy read-permission filter.
    ///
    /// Opens an internal storage handle for the lifetime of the returned
    /// iterator; failure to open is fatal and not retried. Elements denied
    /// `read` are silently skipped; lookup failures while advancing surface
    /// as `Err` items.
    pub fn filter_readable<'a, I>(
        &'a self,
        paths: I,
        session: &'a SessionContext,
    ) -> Result<FilteredPaths<'a, I>, AccessError>
    where
        I: Iterator<Item = String>,
    {
        let store = self.store_factory.open_internal()?;
        Ok(FilteredPaths::new(self, store, paths, session))
    }

    pub(crate) fn acl_provider(&self) -> &dyn AclProvider {
        self.acl_provider.as_ref()
    }

    pub(crate) fn decision(&self) -> &dyn PermissionDecision {
        self.decision.as_ref()
    }

    fn audit_decision(&self, path: &str, actions: &[&str], outcome: AccessOutcome) {
        self.record(AccessEvent::Decision {
            path: path.to_string(),
            actions: actions.iter().map(|a| a.to_string()).collect(),
            outcome,
            timestamp: unix_now(),
        });
    }

    /// Record an audit event if a log is configured.
    ///
    /// Audit failures must not flip a permission decision; they are logged
    /// and the decision stands.
    pub(crate) fn record(&self, event: AccessEvent) {
        let Some(audit) = &self.audit else {
            return;
        };
        let result = match audit.lock() {
            Ok(mut log) => log.log_event(&event),
            Err(_) => Err(AccessError::AuditLog("audit log mutex poisoned".to_string())),
        };
        if let Err(e) = result {
            log::warn!("[access] failed to record audit event: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "pep_tests.rs"]
mod tests;
