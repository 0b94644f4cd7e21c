//! Adapters for Token Verification
//!
//! In-memory stores and clocks. The RocksDB-backed store lives in the node
//! runtime crate.

pub mod fault;
pub mod memory;
pub mod time;

pub use fault::{FlakyAuditSink, FlakyDirectory, FlakyLedger};
pub use memory::{InMemoryAuditLog, InMemoryLedger, InMemoryRegistry};
pub use time::{ManualClock, SystemTimeSource};
