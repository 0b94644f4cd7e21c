//! # Production Storage Adapters
//!
//! Enable the `rocksdb` feature to use the durable store:
//!
//! ```toml
//! booth-node = { path = "...", features = ["rocksdb"] }
//! ```

#[cfg(feature = "rocksdb")]
pub mod rocksdb_adapter;

#[cfg(feature = "rocksdb")]
pub use rocksdb_adapter::{
    RocksDbConfig, RocksDbVerificationStore, CF_AUDIT, CF_ELECTIONS, CF_TOKENS, CF_VERIFICATIONS,
    CF_VOTERS, COLUMN_FAMILIES,
};

// In-memory adapters live in `vg_01_token_verification::adapters`.
