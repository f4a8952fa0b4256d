// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Audit trail for access-control events
//!
//! Tamper-evident record of session resolutions and allow/deny decisions,
//! chained with SHA-256 so a removed or edited entry breaks verification.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::AccessError;

/// Access-control event types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessEvent {
    /// A session context was resolved for a request.
    SessionResolved {
        principal: Option<String>,
        admin: bool,
        timestamp: u64,
    },
    /// The enforcement point rendered a decision.
    Decision {
        path: String,
        actions: Vec<String>,
        outcome: AccessOutcome,
        timestamp: u64,
    },
    /// The recursive removal check denied at a descendant.
    RemovalDenied {
        path: String,
        roles: Vec<String>,
        timestamp: u64,
    },
}

/// Outcome of an enforcement decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOutcome {
    Allowed,
    Denied,
}

/// Seconds since the Unix epoch; 0 if system time is unavailable.
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Hash-chained audit log with optional file backend.
pub struct AuditLog {
    file: Option<File>,
    previous_hash: [u8; 32],
}

impl AuditLog {
    /// Create an audit log appending to the given file.
    pub fn with_file<P: AsRef<Path>>(path: P) -> Result<Self, AccessError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| AccessError::AuditLog(format!("Failed to open audit log file: {}", e)))?;

        Ok(Self {
            file: Some(file),
            previous_hash: [0u8; 32],
        })
    }

    /// Create an audit log without a file backend (hash chain only).
    pub fn new() -> Self {
        Self {
            file: None,
            previous_hash: [0u8; 32],
        }
    }

    /// Record an event, advancing the hash chain and syncing the backend.
    pub fn log_event(&mut self, event: &AccessEvent) -> Result<(), AccessError> {
        let line = format!("{:?}\n", event);

        let current_hash = self.compute_hash(&line);
        self.previous_hash = current_hash;

        if let Some(ref mut file) = self.file {
            file.write_all(line.as_bytes())
                .map_err(|e| AccessError::AuditLog(format!("Failed to write audit log: {}", e)))?;
            file.sync_all()
                .map_err(|e| AccessError::AuditLog(format!("Failed to sync audit log: {}", e)))?;
        }

        Ok(())
    }

    /// Chain hash of SHA-256(previous_hash || entry).
    fn compute_hash(&self, data: &str) -> [u8; 32] {
        use ring::digest::{digest, SHA256};

        let mut input = Vec::with_capacity(32 + data.len());
        input.extend_from_slice(&self.previous_hash);
        input.extend_from_slice(data.as_bytes());

        let hash = digest(&SHA256, &input);
        let mut result = [0u8; 32];
        result.copy_from_slice(hash.as_ref());
        result
    }

    /// Hash of the last recorded event (for tamper detection).
    pub fn previous_hash(&self) -> [u8; 32] {
        self.previous_hash
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}
