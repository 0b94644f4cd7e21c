//! Configuration for the Token Verification subsystem

use serde::{Deserialize, Serialize};

/// Verification pipeline configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// Audit entries parked in memory while the audit sink is failing.
    /// The oldest parked entry is dropped (and logged) when full.
    pub audit_backlog_capacity: usize,
    /// Credentials longer than this are rejected as invalid without a lookup.
    pub max_credential_len: usize,
    /// Run each scan on a detached task so a caller that goes away after the
    /// ledger commit cannot prevent the audit write.
    pub detach_pipeline: bool,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            audit_backlog_capacity: 1024,
            max_credential_len: 512,
            detach_pipeline: true,
        }
    }
}

impl VerificationConfig {
    /// Small limits for tests.
    pub fn for_testing() -> Self {
        Self {
            audit_backlog_capacity: 8,
            max_credential_len: 64,
            detach_pipeline: true,
        }
    }
}
