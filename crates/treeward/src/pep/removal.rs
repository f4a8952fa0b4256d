// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Recursive removal precondition
//!
//! Removing a node is allowed only if removing every node in its subtree
//! would also be allowed. The walk is pre-order and fail-fast: the first
//! denial anywhere ends the check, and nothing below or beside the denying
//! node is visited afterwards.
//!
//! Implemented with an explicit work stack rather than native recursion so
//! worst-case stack depth stays bounded on deep or adversarially shaped
//! trees.

use std::collections::HashSet;
use std::sync::Arc;

use crate::acl::resolve_roles;
use crate::audit::{unix_now, AccessEvent};
use crate::auth::SessionContext;
use crate::decision::ACTION_REMOVE;
use crate::pep::PolicyEnforcementPoint;
use crate::store::TreeStore;
use crate::AccessError;

/// Whether every node in the subtree under `root` passes the per-node
/// `remove` check.
///
/// `root_roles` are the roles already resolved at `root` by the caller;
/// descendants inherit them until a node carries an explicit ACL of its
/// own. Inheritance is by absence of an explicit ACL, not by tree depth.
///
/// # Errors
///
/// Any ACL or child-enumeration failure is fatal and propagates; it is
/// never converted into a deny.
pub(crate) fn can_remove_subtree(
    pep: &PolicyEnforcementPoint,
    store: &dyn TreeStore,
    root: &str,
    session: &SessionContext,
    root_roles: &HashSet<String>,
) -> Result<bool, AccessError> {
    log::debug!("[access] recursive remove check for {}", root);

    // Each frame is a node whose own check is still pending, paired with
    // the roles resolved at its parent. Children are pushed in reverse so
    // the walk pops them in enumeration order.
    let mut stack: Vec<(String, Arc<HashSet<String>>)> = Vec::new();
    seed_children(store, root, Arc::new(root_roles.clone()), &mut stack)?;

    while let Some((path, inherited)) = stack.pop() {
        let roles = match pep.acl_provider().explicit_acl(store, &path)? {
            Some(acl) => Arc::new(resolve_roles(&acl, session.all_principals())),
            None => inherited,
        };

        if !pep.decision().allows(&path, &[ACTION_REMOVE], &roles) {
            log::info!(
                "[access] remove permission denied at {} with roles {:?}",
                path,
                roles
            );
            let mut denied_roles: Vec<String> = roles.iter().cloned().collect();
            denied_roles.sort();
            pep.record(AccessEvent::RemovalDenied {
                path,
                roles: denied_roles,
                timestamp: unix_now(),
            });
            return Ok(false);
        }

        seed_children(store, &path, roles, &mut stack)?;
    }

    Ok(true)
}

/// Push the children of `path` onto the stack, reversed, carrying the roles
/// resolved at `path` as their inherited roles.
fn seed_children(
    store: &dyn TreeStore,
    path: &str,
    roles: Arc<HashSet<String>>,
    stack: &mut Vec<(String, Arc<HashSet<String>>)>,
) -> Result<(), AccessError> {
    let children = store.children(path)?;
    for child in children.into_iter().rev() {
        stack.push((child, Arc::clone(&roles)));
    }
    Ok(())
}
