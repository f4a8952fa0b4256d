// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Access control lists and role resolution
//!
//! An [`Acl`] maps principal names to the role names granted at one path.
//! ACLs are stored and inherited by the embedding repository: the
//! [`AclProvider`] capability returns the ACL effective at a path (nearest
//! ancestor-or-self carrying one, else the root default). The core only
//! resolves principals against whatever ACL it receives.

use std::collections::{HashMap, HashSet};

use crate::principal::Principal;
use crate::store::TreeStore;
use crate::AccessError;

/// Per-path mapping from principal name to the ordered role names granted
/// to that principal.
pub type Acl = HashMap<String, Vec<String>>;

/// ACL lookup SPI.
///
/// Implemented by the embedding repository's ACL storage layer. Inheritance
/// (walking up to the nearest ancestor with an explicit ACL) happens behind
/// this trait, not in the core.
pub trait AclProvider: Send + Sync {
    /// ACL effective at `path`: the nearest ancestor-or-self ACL, else the
    /// root default.
    fn effective_acl(&self, store: &dyn TreeStore, path: &str) -> Result<Acl, AccessError>;

    /// ACL attached at exactly `path`, if any. No inheritance is applied;
    /// `None` means the node inherits from its parent.
    fn explicit_acl(&self, store: &dyn TreeStore, path: &str)
        -> Result<Option<Acl>, AccessError>;
}

/// Resolve the effective role set for a principal set against an ACL.
///
/// The result is the union of the role lists of every ACL entry whose
/// principal name appears in `principals`. Derived per check, never
/// persisted.
pub fn resolve_roles(acl: &Acl, principals: &HashSet<Principal>) -> HashSet<String> {
    let mut roles = HashSet::new();
    for principal in principals {
        if let Some(matched) = acl.get(principal.name()) {
            if !matched.is_empty() {
                log::debug!(
                    "[access] request principal matched role assignment: {}",
                    principal.name()
                );
                roles.extend(matched.iter().cloned());
            }
        }
    }
    roles
}
