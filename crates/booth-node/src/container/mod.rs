//! # Booth Container
//!
//! Composition root: opens the configured stores and wires them into the
//! verification service. Nothing here is process-global; the container owns
//! the store handles and dropping it closes them.

pub mod config;
pub mod stores;

pub use config::{ConfigError, LoggingConfig, NodeConfig, StorageBackend, StorageConfig};
pub use stores::{BoothContainer, Stores};
