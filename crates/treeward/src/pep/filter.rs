// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Lazy read-permission filtering of path sequences
//!
//! Wraps an upstream path iterator and yields only the paths the session
//! may `read`. Work happens only on advancement: each call to `next` pulls
//! upstream elements until one passes the permission check, so a listing is
//! never eagerly drained. Denied paths are skipped silently; the caller
//! observes a gap, not an error. Lookup failures are fatal and surface as
//! `Err` items, identical in kind to a failed `has_permission` call.
//!
//! The sequence is finite, forward-only and not restartable; exhausting or
//! abandoning it requires building a new one from a fresh upstream.

use crate::auth::SessionContext;
use crate::decision::ACTION_READ;
use crate::pep::PolicyEnforcementPoint;
use crate::store::TreeStore;
use crate::AccessError;

/// Lazy read-filtered view over an upstream path sequence.
///
/// Created by [`PolicyEnforcementPoint::filter_readable`]; owns the internal
/// storage handle opened for it. Holds no lookahead beyond the element
/// currently being tested.
pub struct FilteredPaths<'a, I> {
    pep: &'a PolicyEnforcementPoint,
    store: Box<dyn TreeStore>,
    upstream: I,
    session: &'a SessionContext,
}

impl<'a, I> FilteredPaths<'a, I> {
    pub(crate) fn new(
        pep: &'a PolicyEnforcementPoint,
        store: Box<dyn TreeStore>,
        upstream: I,
        session: &'a SessionContext,
    ) -> Self {
        Self {
            pep,
            store,
            upstream,
            session,
        }
    }
}

impl<I> Iterator for FilteredPaths<'_, I>
where
    I: Iterator<Item = String>,
{
    type Item = Result<String, AccessError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let path = self.upstream.next()?;
            match self.pep.has_permission(
                self.store.as_ref(),
                &path,
                &[ACTION_READ],
                self.session,
            ) {
                Ok(true) => return Some(Ok(path)),
                Ok(false) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
