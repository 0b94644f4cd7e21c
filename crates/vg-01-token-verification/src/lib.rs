//! # VG-01: Token Verification Subsystem
//!
//! Verifies a voter's eligibility credential exactly once per election and
//! appends a hash-chained audit entry for every scan attempt.
//!
//! ## Architecture
//!
//! ```text
//! scan ──→ TokenResolver ──→ ExpiryGate ──→ VerificationLedger ──→ AuditRecorder
//!              │                  │          [unique insert]           │
//!              └── NOT_FOUND ─────┴── EXPIRED ─────────────────────────┘
//! ```
//!
//! - **Domain**: entities, value objects, expiry gate, audit chain, invariants
//! - **Ports**: inbound (`VerificationApi`) and outbound (`TokenDirectory`,
//!   `VerificationLedger`, `AuditSink`, `TimeSource`, `RegistryWriter`)
//! - **Application**: resolver, audit recorder, orchestrating service
//! - **Adapters**: in-memory stores, clocks, fault-injection wrappers
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Single Verification | At most one record per (voter, election) |
//! | 2 | Insert Only | Ledger records are never updated or deleted |
//! | 3 | Audit Completeness | Exactly one audit entry per scan attempt |
//! | 4 | Audit Chain | Each entry hashes its predecessor |
//!
//! ## Usage
//!
//! ```ignore
//! use vg_01_token_verification::{VerificationService, VerificationConfig};
//!
//! let service = VerificationService::new(ports, VerificationConfig::default());
//! let response = service.verify("T1", Some("10.0.0.7")).await?;
//! ```

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod ports;

pub use application::service::{ServicePorts, VerificationService};
pub use config::VerificationConfig;
pub use domain::entities::*;
pub use domain::errors::{StoreError, VerificationError};
pub use domain::outcome::{RejectReason, VerifyOutcome, VerifyResponse};
pub use domain::value_objects::*;
pub use metrics::{MetricsSnapshot, VerificationMetrics};
pub use ports::inbound::VerificationApi;
pub use ports::outbound::{
    AuditSink, LedgerDecision, RegistryWriter, TimeSource, TokenDirectory, VerificationLedger,
};
