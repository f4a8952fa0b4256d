// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Built-in principal-discovery sources
//!
//! Transport layers that carry group membership inline (a proxy-injected
//! header, a gateway-asserted attribute) can wire [`DelimitedAttributeSource`]
//! instead of writing a custom source.

use std::collections::HashSet;

use crate::auth::{Credentials, PrincipalSource};
use crate::principal::Principal;
use crate::AccessError;

/// Discovers group principals from a delimited credential attribute.
///
/// Reads the configured discovery attribute and splits it on the configured
/// separator; each non-empty trimmed segment becomes a group principal. A
/// missing attribute contributes nothing.
///
/// # Example
///
/// ```ignore
/// // attribute "x-groups" = "staff; auditors"
/// let source = DelimitedAttributeSource::new("x-groups", ';');
/// // -> {Group("staff"), Group("auditors")}
/// ```
pub struct DelimitedAttributeSource {
    attribute: String,
    separator: char,
}

impl DelimitedAttributeSource {
    /// Create a source reading `attribute` and splitting on `separator`.
    pub fn new<S: Into<String>>(attribute: S, separator: char) -> Self {
        Self {
            attribute: attribute.into(),
            separator,
        }
    }
}

impl PrincipalSource for DelimitedAttributeSource {
    fn name(&self) -> &str {
        &self.attribute
    }

    fn principals(
        &self,
        credentials: &dyn Credentials,
    ) -> Result<HashSet<Principal>, AccessError> {
        let raw = match credentials.discovery_attribute(&self.attribute) {
            Some(raw) => raw,
            None => return Ok(HashSet::new()),
        };

        Ok(raw
            .split(self.separator)
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(Principal::group)
            .collect())
    }
}
