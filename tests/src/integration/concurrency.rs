//! # Concurrency
//!
//! Same-pair races across booths, and callers that walk away mid-scan.
//!
//! ```text
//! booth-1 ─┐
//! booth-2 ─┼──→ VerificationService ──→ ledger [unique insert] ──→ 1 SUCCESS
//!   ...    │                                                  └──→ N-1 ALREADY_VERIFIED
//! booth-N ─┘
//! ```

#[cfg(test)]
mod tests {
    use crate::integration::harness::{Harness, HOUR_MS};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;
    use vg_01_token_verification::domain::invariants::{
        invariant_single_success, invariant_single_verification,
    };
    use vg_01_token_verification::{
        AuditAction, Credential, ElectionId, LedgerDecision, LedgerKey, StoreError,
        VerificationApi, VerificationConfig, VerificationLedger, VerificationRecord,
        VerifyOutcome, VoterId,
    };

    /// Ledger that stalls before every insert.
    struct SlowLedger {
        inner: Arc<dyn VerificationLedger>,
        delay: Duration,
    }

    #[async_trait]
    impl VerificationLedger for SlowLedger {
        async fn try_insert(
            &self,
            record: VerificationRecord,
        ) -> Result<LedgerDecision, StoreError> {
            tokio::time::sleep(self.delay).await;
            self.inner.try_insert(record).await
        }

        async fn find(&self, key: &LedgerKey) -> Result<Option<VerificationRecord>, StoreError> {
            self.inner.find(key).await
        }

        async fn count(&self) -> Result<usize, StoreError> {
            self.inner.count().await
        }
    }

    // =============================================================================
    // SAME-PAIR RACES
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_fifty_booths_one_token() {
        let booth = Harness::new();
        booth.standard_fixture().await.unwrap();

        let handles: Vec<_> = (0..50)
            .map(|i| {
                let service = booth.service.clone();
                tokio::spawn(async move {
                    let ip = format!("10.0.1.{}", i);
                    service.verify("T1", Some(ip.as_str())).await
                })
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

        let records = booth.ledger.snapshot();
        assert_eq!(records.len(), 1);
        assert!(invariant_single_verification(&records));

        let entries = booth.audit.entries();
        assert_eq!(entries.len(), 50);
        assert!(invariant_single_success(&entries));
        assert_eq!(
            entries
                .iter()
                .filter(|e| e.action == AuditAction::AlreadyVerified)
                .count(),
            49
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_qr_and_rfid_race_for_one_voter() {
        let booth = Harness::new();
        booth.standard_fixture().await.unwrap();
        booth
            .token(
                Credential::rfid("834D4CC5"),
                &VoterId::new("V1"),
                &ElectionId::new("E1"),
                booth.now() + HOUR_MS,
            )
            .await
            .unwrap();

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let service = booth.service.clone();
                let credential = if i % 2 == 0 {
                    Credential::qr_token("T1")
                } else {
                    Credential::rfid("834D4CC5")
                };
                tokio::spawn(async move { service.verify_credential(credential, None).await })
            })
            .collect();

        let mut success = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().is_success() {
                success += 1;
            }
        }
        assert_eq!(success, 1);
        assert_eq!(booth.ledger.snapshot().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_distinct_voters_do_not_block_each_other() {
        let booth = Harness::new();
        let election = booth.election("E1", true).await.unwrap();
        for i in 0..32 {
            let voter = booth
                .voter(&format!("V{}", i), &format!("Voter {}", i))
                .await
                .unwrap();
            booth
                .token(
                    Credential::qr_token(format!("T{}", i)),
                    &voter,
                    &election,
                    booth.now() + HOUR_MS,
                )
                .await
                .unwrap();
        }

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let service = booth.service.clone();
                tokio::spawn(async move { service.verify(&format!("T{}", i), None).await })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().unwrap().is_success());
        }
        assert_eq!(booth.ledger.snapshot().len(), 32);
        assert_eq!(booth.service.metrics().success, 32);
    }

    // =============================================================================
    // CALLER CANCELLATION
    // =============================================================================

    #[tokio::test]
    async fn test_abandoned_scan_still_commits_and_audits() {
        let booth = Harness::new();
        booth.standard_fixture().await.unwrap();
        let slow: Arc<dyn VerificationLedger> = Arc::new(SlowLedger {
            inner: booth.ledger.clone(),
            delay: Duration::from_millis(50),
        });
        let service =
            booth.service_with(None, Some(slow), None, VerificationConfig::for_testing());

        let caller = {
            let service = service.clone();
            tokio::spawn(async move { service.verify("T1", Some("10.0.0.7")).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        caller.abort();
        assert!(caller.await.unwrap_err().is_cancelled());

        // The detached pipeline finishes on its own.
        let mut entries = Vec::new();
        for _ in 0..50 {
            entries = booth.audit.entries();
            if !entries.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::VerifySuccess);
        assert_eq!(booth.ledger.snapshot().len(), 1);

        let retry = service.verify("T1", Some("10.0.0.7")).await.unwrap();
        assert_eq!(retry.outcome, VerifyOutcome::AlreadyVerified);
    }

    #[tokio::test]
    async fn test_inline_scan_abandoned_before_commit_leaves_nothing() {
        let booth = Harness::new();
        booth.standard_fixture().await.unwrap();
        let slow: Arc<dyn VerificationLedger> = Arc::new(SlowLedger {
            inner: booth.ledger.clone(),
            delay: Duration::from_millis(200),
        });
        let config = VerificationConfig {
            detach_pipeline: false,
            ..VerificationConfig::for_testing()
        };
        let service = booth.service_with(None, Some(slow), None, config);

        let caller = {
            let service = service.clone();
            tokio::spawn(async move { service.verify("T1", None).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        caller.abort();
        assert!(caller.await.unwrap_err().is_cancelled());

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(booth.ledger.snapshot().is_empty());

        let response = service.verify("T1", None).await.unwrap();
        assert_eq!(response.outcome, VerifyOutcome::Success);
    }
}
