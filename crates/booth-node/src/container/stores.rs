//! # Store Wiring
//!
//! ```text
//! StorageConfig ──→ Stores { directory, registry, ledger, audit }
//!                        │
//!                        └──→ ServicePorts ──→ VerificationService
//! ```

use std::sync::Arc;

use tracing::info;
use vg_01_token_verification::adapters::{InMemoryAuditLog, InMemoryLedger, InMemoryRegistry, SystemTimeSource};
use vg_01_token_verification::{
    AuditSink, RegistryWriter, ServicePorts, StoreError, TimeSource, TokenDirectory,
    VerificationLedger, VerificationService,
};

use crate::container::config::{NodeConfig, StorageBackend, StorageConfig};

/// Store handles for every outbound port.
#[derive(Clone)]
pub struct Stores {
    pub directory: Arc<dyn TokenDirectory>,
    pub registry: Arc<dyn RegistryWriter>,
    pub ledger: Arc<dyn VerificationLedger>,
    pub audit: Arc<dyn AuditSink>,
}

impl Stores {
    /// Fresh in-memory stores.
    pub fn in_memory() -> Self {
        let registry = Arc::new(InMemoryRegistry::new());
        Self {
            directory: registry.clone(),
            registry,
            ledger: Arc::new(InMemoryLedger::new()),
            audit: Arc::new(InMemoryAuditLog::new()),
        }
    }

    /// All ports backed by one RocksDB database.
    #[cfg(feature = "rocksdb")]
    pub fn rocksdb(config: crate::adapters::storage::RocksDbConfig) -> Result<Self, StoreError> {
        let store = crate::adapters::storage::RocksDbVerificationStore::open(config)?;
        Ok(Self {
            directory: Arc::new(store.clone()),
            registry: Arc::new(store.clone()),
            ledger: Arc::new(store.clone()),
            audit: Arc::new(store),
        })
    }

    /// Open the backend named by `config`.
    pub fn open(config: &StorageConfig) -> Result<Self, StoreError> {
        match config.backend {
            StorageBackend::Memory => {
                info!("Using in-memory stores; state is lost on exit");
                Ok(Self::in_memory())
            }
            #[cfg(feature = "rocksdb")]
            StorageBackend::RocksDb => Self::rocksdb(crate::adapters::storage::RocksDbConfig {
                path: config.data_dir.join("verification"),
                lock_timeout_ms: config.lock_timeout_ms,
                max_conflict_retries: config.max_conflict_retries,
                retry_backoff_ms: config.retry_backoff_ms,
                sync_writes: config.sync_writes,
            }),
            #[cfg(not(feature = "rocksdb"))]
            StorageBackend::RocksDb => Err(StoreError::Unavailable(
                "rocksdb backend not compiled in".to_string(),
            )),
        }
    }

    pub fn service_ports(&self, clock: Arc<dyn TimeSource>) -> ServicePorts {
        ServicePorts {
            directory: Arc::clone(&self.directory),
            ledger: Arc::clone(&self.ledger),
            audit: Arc::clone(&self.audit),
            clock,
        }
    }
}

/// Everything the booth needs at runtime.
pub struct BoothContainer {
    pub config: NodeConfig,
    pub stores: Stores,
    pub service: VerificationService,
}

impl BoothContainer {
    /// Open stores and build the service on the wall clock.
    pub fn new(config: NodeConfig) -> Result<Self, StoreError> {
        let stores = Stores::open(&config.storage)?;
        Ok(Self::with_stores(config, stores, Arc::new(SystemTimeSource)))
    }

    /// Build around stores and a clock supplied by the caller.
    pub fn with_stores(config: NodeConfig, stores: Stores, clock: Arc<dyn TimeSource>) -> Self {
        let service =
            VerificationService::new(stores.service_ports(clock), config.verification.clone());
        Self {
            config,
            stores,
            service,
        }
    }
}
