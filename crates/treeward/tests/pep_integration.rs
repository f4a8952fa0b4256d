// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! End-to-end scenarios through the public suite API: session resolution,
//! admin bypass, the recursive removal precondition and read filtering.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use treeward::acl::{Acl, AclProvider};
use treeward::auth::sources::DelimitedAttributeSource;
use treeward::auth::{Credentials, CONTAINER_ADMIN_ROLE, CONTAINER_USER_ROLE};
use treeward::decision::PermissionDecision;
use treeward::principal::Principal;
use treeward::store::{TreeStore, TreeStoreFactory};
use treeward::{AccessConfig, AccessControlSuite, AccessError};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct Repo {
    children: HashMap<String, Vec<String>>,
    acls: HashMap<String, Acl>,
}

impl Repo {
    fn new() -> Self {
        Self {
            children: HashMap::new(),
            acls: HashMap::new(),
        }
    }

    fn child(mut self, parent: &str, child: &str) -> Self {
        self.children
            .entry(parent.to_string())
            .or_default()
            .push(child.to_string());
        self
    }

    fn acl(mut self, path: &str, principal: &str, roles: &[&str]) -> Self {
        self.acls
            .entry(path.to_string())
            .or_default()
            .insert(principal.to_string(), roles.iter().map(|r| r.to_string()).collect());
        self
    }
}

struct RepoStore {
    repo: Arc<Repo>,
}

impl TreeStore for RepoStore {
    fn children(&self, path: &str) -> Result<Vec<String>, AccessError> {
        Ok(self.repo.children.get(path).cloned().unwrap_or_default())
    }
}

struct RepoFactory {
    repo: Arc<Repo>,
    opened: Arc<AtomicUsize>,
}

impl TreeStoreFactory for RepoFactory {
    fn open_internal(&self) -> Result<Box<dyn TreeStore>, AccessError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(RepoStore {
            repo: Arc::clone(&self.repo),
        }))
    }
}

struct RepoAcls {
    repo: Arc<Repo>,
}

impl RepoAcls {
    fn parent(path: &str) -> Option<String> {
        let idx = path.rfind('/')?;
        if idx == 0 {
            return if path.len() > 1 { Some("/".to_string()) } else { None };
        }
        Some(path[..idx].to_string())
    }
}

impl AclProvider for RepoAcls {
    fn effective_acl(&self, _store: &dyn TreeStore, path: &str) -> Result<Acl, AccessError> {
        let mut current = path.to_string();
        loop {
            if let Some(acl) = self.repo.acls.get(&current) {
                return Ok(acl.clone());
            }
            match Self::parent(&current) {
                Some(up) => current = up,
                None => return Ok(Acl::new()),
            }
        }
    }

    fn explicit_acl(
        &self,
        _store: &dyn TreeStore,
        path: &str,
    ) -> Result<Option<Acl>, AccessError> {
        Ok(self.repo.acls.get(path).cloned())
    }
}

/// Policy used across these scenarios: `writer` may read/write/remove,
/// `reader` may only read.
struct RepoPolicy {
    consulted: Arc<AtomicUsize>,
}

impl PermissionDecision for RepoPolicy {
    fn allows(&self, _path: &str, actions: &[&str], roles: &HashSet<String>) -> bool {
        self.consulted.fetch_add(1, Ordering::SeqCst);
        actions.iter().all(|action| match *action {
            "read" => roles.contains("reader") || roles.contains("writer"),
            "write" | "remove" => roles.contains("writer"),
            _ => false,
        })
    }
}

struct RequestCredentials {
    identity: Option<&'static str>,
    roles: &'static [&'static str],
    groups_attribute: Option<&'static str>,
}

impl Credentials for RequestCredentials {
    fn user_identity(&self) -> Option<&str> {
        self.identity
    }

    fn has_container_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| *r == role)
    }

    fn discovery_attribute(&self, name: &str) -> Option<&str> {
        if name == "x-groups" {
            self.groups_attribute
        } else {
            None
        }
    }
}

struct Harness {
    suite: AccessControlSuite,
    decisions: Arc<AtomicUsize>,
    handles_opened: Arc<AtomicUsize>,
}

fn harness(repo: Repo) -> Harness {
    let repo = Arc::new(repo);
    let decisions = Arc::new(AtomicUsize::new(0));
    let handles_opened = Arc::new(AtomicUsize::new(0));
    let config = AccessConfig::builder()
        .acl_provider(Arc::new(RepoAcls {
            repo: Arc::clone(&repo),
        }))
        .decision(Arc::new(RepoPolicy {
            consulted: Arc::clone(&decisions),
        }))
        .store_factory(Arc::new(RepoFactory {
            repo,
            opened: Arc::clone(&handles_opened),
        }))
        .principal_source(Arc::new(DelimitedAttributeSource::new("x-groups", ',')))
        .build()
        .unwrap();
    Harness {
        suite: AccessControlSuite::new(config).unwrap(),
        decisions,
        handles_opened,
    }
}

fn alice() -> RequestCredentials {
    RequestCredentials {
        identity: Some("alice"),
        roles: &[CONTAINER_USER_ROLE],
        groups_attribute: None,
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn admin_bypass_is_total() {
    let h = harness(Repo::new().acl("/x", "nobody", &["reader"]));
    let session = h.suite.resolve_session(&RequestCredentials {
        identity: Some("root"),
        roles: &[CONTAINER_ADMIN_ROLE],
        groups_attribute: None,
    });

    assert!(session.is_admin());
    assert!(h.suite.authorize("/x", &["remove"], &session).unwrap());
    // Neither the decision nor the store was ever consulted.
    assert_eq!(h.decisions.load(Ordering::SeqCst), 0);
    assert_eq!(h.handles_opened.load(Ordering::SeqCst), 0);
}

#[test]
fn every_session_carries_everyone() {
    let h = harness(Repo::new());

    let anon = h.suite.resolve_session(&RequestCredentials {
        identity: None,
        roles: &[],
        groups_attribute: None,
    });
    assert!(anon.all_principals().contains(Principal::everyone()));

    let user = h.suite.resolve_session(&alice());
    assert!(user.all_principals().contains(Principal::everyone()));
}

#[test]
fn discovered_groups_reach_the_decision() {
    // staff is granted reader at /x; alice holds staff only through the
    // delimited discovery attribute.
    let h = harness(Repo::new().acl("/x", "staff", &["reader"]));
    let session = h.suite.resolve_session(&RequestCredentials {
        identity: Some("alice"),
        roles: &[CONTAINER_USER_ROLE],
        groups_attribute: Some("staff, interns"),
    });

    assert!(session.group_principals().contains(&Principal::group("staff")));
    assert!(h.suite.authorize("/x", &["read"], &session).unwrap());
}

#[test]
fn reader_cannot_remove_and_no_children_are_enumerated() {
    let h = harness(
        Repo::new()
            .acl("/x", "alice", &["reader"])
            .child("/x", "/x/a"),
    );
    let session = h.suite.resolve_session(&alice());

    assert!(h.suite.authorize("/x", &["read"], &session).unwrap());
    assert!(!h.suite.authorize("/x", &["remove"], &session).unwrap());
}

#[test]
fn remove_denied_by_descendant_acl() {
    // alice is writer at /x; /x/y inherits; /x/y/z grants her only reader.
    let h = harness(
        Repo::new()
            .acl("/x", "alice", &["writer"])
            .child("/x", "/x/y")
            .child("/x/y", "/x/y/z")
            .acl("/x/y/z", "alice", &["reader"]),
    );
    let session = h.suite.resolve_session(&alice());

    assert!(!h.suite.authorize("/x", &["remove"], &session).unwrap());
}

#[test]
fn remove_allowed_when_subtree_is_clean() {
    let h = harness(
        Repo::new()
            .acl("/x", "alice", &["writer"])
            .child("/x", "/x/y")
            .child("/x/y", "/x/y/z"),
    );
    let session = h.suite.resolve_session(&alice());

    assert!(h.suite.authorize("/x", &["remove"], &session).unwrap());
}

#[test]
fn remove_child_nodes_is_always_granted() {
    let h = harness(Repo::new());
    let session = h.suite.resolve_session(&alice());

    assert!(h
        .suite
        .authorize("/x", &["remove_child_nodes"], &session)
        .unwrap());
}

#[test]
fn filtered_listing_preserves_order_and_skips_denied() {
    let h = harness(
        Repo::new()
            .acl("/a", "alice", &["reader"])
            .acl("/b", "nobody", &["reader"])
            .acl("/c", "alice", &["reader"]),
    );
    let session = h.suite.resolve_session(&alice());

    let upstream = ["/a", "/b", "/c"].iter().map(|p| p.to_string());
    let listed: Vec<String> = h
        .suite
        .filter_readable(upstream, &session)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(listed, vec!["/a", "/c"]);
}

#[test]
fn filtering_ignores_admin_fast_path() {
    // Even an admin session is filtered on its own principals: the admin
    // bypass lives in authorize(), not in the read filter.
    let h = harness(Repo::new().acl("/a", "alice", &["reader"]));
    let session = h.suite.resolve_session(&RequestCredentials {
        identity: Some("root"),
        roles: &[CONTAINER_ADMIN_ROLE],
        groups_attribute: None,
    });

    let upstream = ["/a"].iter().map(|p| p.to_string());
    let listed: Vec<_> = h
        .suite
        .filter_readable(upstream, &session)
        .unwrap()
        .collect();

    assert!(listed.is_empty());
}

#[test]
fn audit_log_records_denials() {
    let dir = tempfile::tempdir().unwrap();
    let audit_path = dir.path().join("audit.log");

    let repo = Arc::new(
        Repo::new()
            .acl("/x", "alice", &["writer"])
            .child("/x", "/x/y")
            .acl("/x/y", "alice", &["reader"]),
    );
    let config = AccessConfig::builder()
        .acl_provider(Arc::new(RepoAcls {
            repo: Arc::clone(&repo),
        }))
        .decision(Arc::new(RepoPolicy {
            consulted: Arc::new(AtomicUsize::new(0)),
        }))
        .store_factory(Arc::new(RepoFactory {
            repo,
            opened: Arc::new(AtomicUsize::new(0)),
        }))
        .enable_audit_log(true)
        .audit_log_path(&audit_path)
        .build()
        .unwrap();
    let suite = AccessControlSuite::new(config).unwrap();
    assert!(suite.is_audit_log_enabled());

    let session = suite.resolve_session(&alice());
    assert!(!suite.authorize("/x", &["remove"], &session).unwrap());

    let contents = std::fs::read_to_string(&audit_path).unwrap();
    assert!(contents.contains("SessionResolved"));
    assert!(contents.contains("RemovalDenied"));
    assert!(contents.contains("/x/y"));
    assert!(contents.contains("reader"));
}

#[test]
fn storage_failure_is_an_error_not_a_deny() {
    struct DownFactory;

    impl TreeStoreFactory for DownFactory {
        fn open_internal(&self) -> Result<Box<dyn TreeStore>, AccessError> {
            Err(AccessError::StorageUnavailable("storage is down".to_string()))
        }
    }

    let repo = Arc::new(Repo::new());
    let config = AccessConfig::builder()
        .acl_provider(Arc::new(RepoAcls { repo }))
        .decision(Arc::new(RepoPolicy {
            consulted: Arc::new(AtomicUsize::new(0)),
        }))
        .store_factory(Arc::new(DownFactory))
        .build()
        .unwrap();
    let suite = AccessControlSuite::new(config).unwrap();

    let session = suite.resolve_session(&alice());
    let result = suite.authorize("/x", &["read"], &session);

    assert!(matches!(result, Err(AccessError::StorageUnavailable(_))));
}
