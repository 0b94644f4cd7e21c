//! # Audit Trail
//!
//! Every scan leaves exactly one entry, the chain verifies end to end, and
//! store outages are surfaced without bending the verification decision.

#[cfg(test)]
mod tests {
    use crate::integration::harness::Harness;
    use std::sync::Arc;
    use vg_01_token_verification::adapters::{FlakyAuditSink, FlakyDirectory, FlakyLedger};
    use vg_01_token_verification::domain::audit_chain::{verify_audit_chain, ChainViolation};
    use vg_01_token_verification::domain::invariants::invariant_success_backed_by_ledger;
    use vg_01_token_verification::domain::pipeline::ScanStage;
    use vg_01_token_verification::{
        AuditAction, AuditSink, TokenDirectory, VerificationApi, VerificationConfig,
        VerificationError, VerificationLedger, VerifyOutcome,
    };

    // =============================================================================
    // COMPLETENESS AND INTEGRITY
    // =============================================================================

    #[tokio::test]
    async fn test_one_entry_per_scan() {
        let booth = Harness::new();
        booth.standard_fixture().await.unwrap();

        let scans = ["T1", "T1", "UNKNOWN", "T2", "", "T1"];
        for (i, token) in scans.iter().enumerate() {
            booth.service.verify(token, None).await.unwrap();
            assert_eq!(booth.audit.entries().len(), i + 1);
        }

        let entries = booth.audit.entries();
        let sequences: Vec<u64> = entries.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(verify_audit_chain(&entries), Ok(()));
        assert!(invariant_success_backed_by_ledger(
            &entries,
            &booth.ledger.snapshot()
        ));
        assert_eq!(booth.service.metrics().total_scans(), 6);
    }

    #[tokio::test]
    async fn test_rewritten_entry_breaks_the_chain() {
        let booth = Harness::new();
        booth.standard_fixture().await.unwrap();
        booth.service.verify("T1", Some("10.0.0.7")).await.unwrap();
        booth.service.verify("T1", Some("10.0.0.7")).await.unwrap();
        booth.service.verify("UNKNOWN", None).await.unwrap();

        let mut entries = booth.audit.entries();
        entries[1].action = AuditAction::VerifySuccess;
        assert_eq!(
            verify_audit_chain(&entries),
            Err(ChainViolation::HashMismatch { sequence: 2 })
        );

        let mut entries = booth.audit.entries();
        entries.remove(1);
        assert!(verify_audit_chain(&entries).is_err());
    }

    #[tokio::test]
    async fn test_entries_carry_subject_and_source() {
        let booth = Harness::new();
        booth.standard_fixture().await.unwrap();

        booth.service.verify("T1", Some("10.0.0.7")).await.unwrap();
        booth.service.verify("UNKNOWN", Some("10.0.0.8")).await.unwrap();

        let entries = booth.audit.entries();
        assert_eq!(entries[0].subject_ref.as_deref(), Some("V1"));
        assert_eq!(entries[0].source_ip.as_deref(), Some("10.0.0.7"));
        assert_eq!(entries[0].reason(), "verified");
        assert_eq!(entries[1].subject_ref, None);
        assert_eq!(entries[1].source_ip.as_deref(), Some("10.0.0.8"));
    }

    #[tokio::test]
    async fn test_reconciliation_reads() {
        let booth = Harness::new();
        booth.standard_fixture().await.unwrap();
        for _ in 0..4 {
            booth.service.verify("UNKNOWN", None).await.unwrap();
        }
        booth.service.verify("T1", None).await.unwrap();

        let since = booth.service.read_audit_since(3, 10).await.unwrap();
        let sequences: Vec<u64> = since.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![3, 4, 5]);

        let recent = booth.service.recent_audit(1).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].action, AuditAction::VerifySuccess);
    }

    // =============================================================================
    // STORE OUTAGES
    // =============================================================================

    #[tokio::test]
    async fn test_audit_outage_keeps_verification() {
        let booth = Harness::new();
        booth.standard_fixture().await.unwrap();
        let flaky = Arc::new(FlakyAuditSink::new(booth.audit.clone()));
        let sink: Arc<dyn AuditSink> = flaky.clone();
        let service =
            booth.service_with(None, None, Some(sink), VerificationConfig::for_testing());

        flaky.fail();
        let response = service.verify("T1", Some("10.0.0.7")).await.unwrap();
        assert_eq!(response.outcome, VerifyOutcome::Success);
        let response = service.verify("UNKNOWN", None).await.unwrap();
        assert_eq!(response.outcome, VerifyOutcome::InvalidToken);

        assert_eq!(booth.ledger.snapshot().len(), 1);
        assert!(booth.audit.entries().is_empty());
        assert_eq!(service.audit_backlog(), 2);
        assert_eq!(service.metrics().audit_failures, 2);

        flaky.recover();
        assert_eq!(service.flush_audit().await, 0);

        let entries = booth.audit.entries();
        let actions: Vec<AuditAction> = entries.iter().map(|e| e.action).collect();
        assert_eq!(
            actions,
            vec![AuditAction::VerifySuccess, AuditAction::VerifyFail]
        );
        assert_eq!(verify_audit_chain(&entries), Ok(()));
        assert!(invariant_success_backed_by_ledger(
            &entries,
            &booth.ledger.snapshot()
        ));
    }

    #[tokio::test]
    async fn test_ledger_outage_is_not_an_outcome() {
        let booth = Harness::new();
        booth.standard_fixture().await.unwrap();
        let flaky = Arc::new(FlakyLedger::new(booth.ledger.clone()));
        let ledger: Arc<dyn VerificationLedger> = flaky.clone();
        let service =
            booth.service_with(None, Some(ledger), None, VerificationConfig::for_testing());

        flaky.fail();
        let err = service.verify("T1", None).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(
            err,
            VerificationError::StorageUnavailable {
                stage: ScanStage::ExpiryChecked,
                ..
            }
        ));

        let entries = booth.audit.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::VerifyFail);
        assert_eq!(entries[0].reason(), "storage unavailable");
        assert_eq!(service.metrics().storage_errors, 1);
        assert_eq!(service.metrics().total_scans(), 0);

        flaky.recover();
        let response = service.verify("T1", None).await.unwrap();
        assert_eq!(response.outcome, VerifyOutcome::Success);
    }

    #[tokio::test]
    async fn test_directory_outage_fails_before_resolution() {
        let booth = Harness::new();
        booth.standard_fixture().await.unwrap();
        let flaky = Arc::new(FlakyDirectory::new(booth.registry.clone()));
        let directory: Arc<dyn TokenDirectory> = flaky.clone();
        let service =
            booth.service_with(Some(directory), None, None, VerificationConfig::for_testing());

        flaky.fail();
        let err = service.verify("T1", None).await.unwrap_err();
        assert!(matches!(
            err,
            VerificationError::StorageUnavailable {
                stage: ScanStage::Start,
                ..
            }
        ));
        assert!(booth.ledger.snapshot().is_empty());
        assert_eq!(booth.audit.entries().len(), 1);
        assert!(flaky.rejected_calls() >= 1);
    }
}
