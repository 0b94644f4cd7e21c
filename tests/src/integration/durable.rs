//! # Durable Store
//!
//! The same guarantees as the in-memory suites, backed by RocksDB through the
//! booth-node container. Requires `--features rocksdb`.

#[cfg(test)]
mod tests {
    use booth_node::container::{BoothContainer, NodeConfig, StorageBackend, Stores};
    use booth_node::seed::{seed_demo, DEMO_QR_TOKEN, DEMO_RFID_TAG};
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;
    use vg_01_token_verification::adapters::ManualClock;
    use vg_01_token_verification::domain::audit_chain::verify_audit_chain;
    use vg_01_token_verification::domain::invariants::invariant_single_success;
    use vg_01_token_verification::{
        AuditSink, Credential, VerificationApi, VerificationLedger, VerifyOutcome,
    };

    const NOW: u64 = 1_704_067_200_000;

    fn durable_booth(dir: &Path) -> BoothContainer {
        let mut config = NodeConfig::default();
        config.storage.backend = StorageBackend::RocksDb;
        config.storage.data_dir = dir.to_path_buf();
        config.storage.sync_writes = false;
        config.storage.retry_backoff_ms = 1;
        config.storage.max_conflict_retries = 20;
        let stores = Stores::open(&config.storage).unwrap();
        BoothContainer::with_stores(config, stores, Arc::new(ManualClock::new(NOW)))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_fifty_booths_one_token_on_rocksdb() {
        let dir = TempDir::new().unwrap();
        let booth = durable_booth(dir.path());
        seed_demo(booth.stores.registry.as_ref(), NOW).await.unwrap();

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let service = booth.service.clone();
                tokio::spawn(async move { service.verify(DEMO_QR_TOKEN, None).await })
            })
            .collect();

        let mut success = 0;
        let mut already = 0;
        for handle in handles {
            match handle.await.unwrap().unwrap().outcome {
                VerifyOutcome::Success => success += 1,
                VerifyOutcome::AlreadyVerified => already += 1,
                other => panic!("unexpected outcome {other}"),
            }
        }
        assert_eq!(success, 1);
        assert_eq!(already, 49);
        assert_eq!(booth.stores.ledger.count().await.unwrap(), 1);

        let entries = booth.stores.audit.read_from(1, 100).await.unwrap();
        assert_eq!(entries.len(), 50);
        assert!(invariant_single_success(&entries));
        assert_eq!(verify_audit_chain(&entries), Ok(()));
    }

    #[tokio::test]
    async fn test_verification_survives_restart() {
        let dir = TempDir::new().unwrap();
        {
            let booth = durable_booth(dir.path());
            seed_demo(booth.stores.registry.as_ref(), NOW).await.unwrap();
            let response = booth.service.verify(DEMO_QR_TOKEN, Some("10.0.0.7")).await.unwrap();
            assert!(response.is_success());
        }

        let booth = durable_booth(dir.path());
        let fixture = seed_demo(booth.stores.registry.as_ref(), NOW).await.unwrap();
        assert_eq!(fixture.already_present, 2);

        let response = booth
            .service
            .verify_credential(Credential::rfid(DEMO_RFID_TAG), Some("10.0.0.8"))
            .await
            .unwrap();
        assert_eq!(response.outcome, VerifyOutcome::AlreadyVerified);
        assert_eq!(response.verified_at, Some(NOW));

        let entries = booth.stores.audit.read_from(1, 10).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(verify_audit_chain(&entries), Ok(()));
    }
}
