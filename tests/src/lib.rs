//! # Voter-Gate Test Suite
//!
//! Unified test crate for cross-crate behaviour.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── harness.rs       # In-memory booth with a manual clock
//!     ├── scenarios.rs     # End-to-end outcomes for single scans
//!     ├── concurrency.rs   # Same-pair races and caller cancellation
//!     ├── audit_trail.rs   # Completeness, chain integrity, outages
//!     ├── node.rs          # booth-node wiring and scan loop
//!     └── durable.rs       # RocksDB-backed runs (feature `rocksdb`)
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p vg-tests
//!
//! # Durable store suites
//! cargo test -p vg-tests --features rocksdb
//!
//! # Benchmarks
//! cargo bench -p vg-tests
//! ```

#![allow(dead_code)]

pub mod integration;
