//! # Integration Tests
//!
//! Drive `VerificationService` through its public API only, then check the
//! ledger and audit trail the way a reconciliation reader would.

pub mod harness;

mod audit_trail;
mod concurrency;
#[cfg(feature = "rocksdb")]
mod durable;
