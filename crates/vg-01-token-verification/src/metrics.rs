//! # Verification Metrics
//!
//! Per-service atomic counters, plus Prometheus export when the `metrics`
//! feature is enabled:
//! ```toml
//! vg-01-token-verification = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `verification_scans_total` - Counter of scans by outcome
//! - `verification_storage_errors_total` - Counter of scans aborted by store failures
//! - `verification_audit_failures_total` - Counter of failed audit appends
//! - `verification_audit_backlog` - Gauge of audit entries waiting to be flushed

use crate::domain::outcome::VerifyOutcome;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, register_int_gauge};
#[cfg(feature = "metrics")]
use prometheus::{IntCounter, IntCounterVec, IntGauge};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Scans completed, labeled by outcome
    pub static ref SCANS: IntCounterVec = register_int_counter_vec!(
        "verification_scans_total",
        "Total number of scans by outcome",
        &["outcome"]
    )
    .expect("Failed to create SCANS metric");

    /// Scans that ended in StorageUnavailable
    pub static ref STORAGE_ERRORS: IntCounter = register_int_counter!(
        "verification_storage_errors_total",
        "Total number of scans aborted by an unavailable store"
    )
    .expect("Failed to create STORAGE_ERRORS metric");

    /// Audit appends that failed and were parked
    pub static ref AUDIT_FAILURES: IntCounter = register_int_counter!(
        "verification_audit_failures_total",
        "Total number of failed audit appends"
    )
    .expect("Failed to create AUDIT_FAILURES metric");

    /// Audit entries parked in the backlog
    pub static ref AUDIT_BACKLOG: IntGauge = register_int_gauge!(
        "verification_audit_backlog",
        "Audit entries waiting to be flushed"
    )
    .expect("Failed to create AUDIT_BACKLOG metric");
}

// =============================================================================
// PROMETHEUS RECORDING FUNCTIONS
// =============================================================================

#[cfg(feature = "metrics")]
fn export_outcome(outcome: VerifyOutcome) {
    SCANS.with_label_values(&[outcome.as_str()]).inc();
}

#[cfg(feature = "metrics")]
fn export_storage_error() {
    STORAGE_ERRORS.inc();
}

#[cfg(feature = "metrics")]
fn export_audit_failure() {
    AUDIT_FAILURES.inc();
}

#[cfg(feature = "metrics")]
fn export_backlog(len: usize) {
    AUDIT_BACKLOG.set(len as i64);
}

#[cfg(not(feature = "metrics"))]
fn export_outcome(_outcome: VerifyOutcome) {}

#[cfg(not(feature = "metrics"))]
fn export_storage_error() {}

#[cfg(not(feature = "metrics"))]
fn export_audit_failure() {}

#[cfg(not(feature = "metrics"))]
fn export_backlog(_len: usize) {}

// =============================================================================
// SERVICE COUNTERS
// =============================================================================

/// Counters owned by one verification service.
#[derive(Debug, Default)]
pub struct VerificationMetrics {
    success: AtomicU64,
    invalid_token: AtomicU64,
    token_expired: AtomicU64,
    already_verified: AtomicU64,
    storage_errors: AtomicU64,
    audit_failures: AtomicU64,
    audit_backlog: AtomicU64,
}

/// Point-in-time copy of [`VerificationMetrics`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub success: u64,
    pub invalid_token: u64,
    pub token_expired: u64,
    pub already_verified: u64,
    pub storage_errors: u64,
    pub audit_failures: u64,
    pub audit_backlog: u64,
}

impl MetricsSnapshot {
    pub fn total_scans(&self) -> u64 {
        self.success + self.invalid_token + self.token_expired + self.already_verified
    }
}

impl VerificationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_outcome(&self, outcome: VerifyOutcome) {
        let counter = match outcome {
            VerifyOutcome::Success => &self.success,
            VerifyOutcome::InvalidToken => &self.invalid_token,
            VerifyOutcome::TokenExpired => &self.token_expired,
            VerifyOutcome::AlreadyVerified => &self.already_verified,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        export_outcome(outcome);
    }

    pub fn record_storage_error(&self) {
        self.storage_errors.fetch_add(1, Ordering::Relaxed);
        export_storage_error();
    }

    pub fn record_audit_failure(&self) {
        self.audit_failures.fetch_add(1, Ordering::Relaxed);
        export_audit_failure();
    }

    pub fn set_audit_backlog(&self, len: usize) {
        self.audit_backlog.store(len as u64, Ordering::Relaxed);
        export_backlog(len);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            success: self.success.load(Ordering::Relaxed),
            invalid_token: self.invalid_token.load(Ordering::Relaxed),
            token_expired: self.token_expired.load(Ordering::Relaxed),
            already_verified: self.already_verified.load(Ordering::Relaxed),
            storage_errors: self.storage_errors.load(Ordering::Relaxed),
            audit_failures: self.audit_failures.load(Ordering::Relaxed),
            audit_backlog: self.audit_backlog.load(Ordering::Relaxed),
        }
    }
}
