//! Token Verification Service
//!
//! Main service implementing VerificationApi.
//!
//! Orchestrates one scan:
//! 1. Resolve the credential to a voter and election
//! 2. Check the token's expiry against a single `now`
//! 3. Conditionally insert into the verification ledger
//! 4. Record exactly one audit entry, whatever the exit path
//!
//! The pipeline runs on its own task. If the caller goes away after the
//! ledger commit, the task still writes the audit entry.

use super::recorder::AuditRecorder;
use super::resolver::{Resolution, TokenResolver};
use crate::config::VerificationConfig;
use crate::domain::entities::{AuditAction, AuditDetail, AuditEntry, AuditRecord, VerificationRecord};
use crate::domain::errors::{StoreError, VerificationError};
use crate::domain::expiry::{check_expiry, ExpiryStatus};
use crate::domain::outcome::{RejectReason, VerifyResponse};
use crate::domain::pipeline::{ScanProgress, ScanStage};
use crate::domain::value_objects::{Credential, Timestamp, VoterId};
use crate::metrics::{MetricsSnapshot, VerificationMetrics};
use crate::ports::inbound::VerificationApi;
use crate::ports::outbound::{
    AuditSink, LedgerDecision, TimeSource, TokenDirectory, VerificationLedger,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Outbound adapters the service is wired to.
#[derive(Clone)]
pub struct ServicePorts {
    pub directory: Arc<dyn TokenDirectory>,
    pub ledger: Arc<dyn VerificationLedger>,
    pub audit: Arc<dyn AuditSink>,
    pub clock: Arc<dyn TimeSource>,
}

struct ServiceInner {
    resolver: TokenResolver,
    ledger: Arc<dyn VerificationLedger>,
    recorder: AuditRecorder,
    clock: Arc<dyn TimeSource>,
    metrics: Arc<VerificationMetrics>,
}

/// Token verification service. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct VerificationService {
    inner: Arc<ServiceInner>,
    detach_pipeline: bool,
}

impl VerificationService {
    pub fn new(ports: ServicePorts, config: VerificationConfig) -> Self {
        let metrics = Arc::new(VerificationMetrics::new());
        let inner = ServiceInner {
            resolver: TokenResolver::new(ports.directory, config.max_credential_len),
            ledger: ports.ledger,
            recorder: AuditRecorder::new(
                ports.audit,
                config.audit_backlog_capacity,
                Arc::clone(&metrics),
            ),
            clock: ports.clock,
            metrics,
        };
        Self {
            inner: Arc::new(inner),
            detach_pipeline: config.detach_pipeline,
        }
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    /// Audit entries parked after sink failures.
    pub fn audit_backlog(&self) -> usize {
        self.inner.recorder.backlog_len()
    }

    /// Retry parked audit entries. Returns how many remain parked.
    pub async fn flush_audit(&self) -> usize {
        self.inner.recorder.flush().await
    }

    /// Audit entries with `sequence >= start`, for reconciliation readers.
    pub async fn read_audit_since(
        &self,
        start: u64,
        limit: usize,
    ) -> Result<Vec<AuditEntry>, VerificationError> {
        self.inner
            .recorder
            .sink()
            .read_from(start, limit)
            .await
            .map_err(|e| VerificationError::storage(ScanStage::Audited, e))
    }
}

impl ServiceInner {
    async fn run(
        &self,
        credential: Credential,
        source_ip: Option<String>,
    ) -> Result<VerifyResponse, VerificationError> {
        let now = self.clock.now();
        let mut progress = ScanProgress::new();

        // 1. Resolve
        let grant = match self.resolver.resolve(&credential).await {
            Ok(Resolution::Found(grant)) => grant,
            Ok(Resolution::Rejected {
                reason,
                detail,
                subject,
            }) => {
                return Ok(self
                    .reject(&mut progress, reason, detail, subject, source_ip, now)
                    .await);
            }
            Err(e) => {
                return Err(self
                    .storage_failure(&mut progress, e, None, source_ip, now)
                    .await);
            }
        };
        progress.advance(ScanStage::TokenResolved);
        debug!(voter_id = %grant.voter_id, election_id = %grant.election_id, "Credential resolved");

        // 2. Expiry gate
        if check_expiry(grant.expires_at, now) == ExpiryStatus::Expired {
            let detail = AuditDetail::TokenExpired {
                voter_id: grant.voter_id.clone(),
                election_id: grant.election_id.clone(),
                expires_at: grant.expires_at,
            };
            return Ok(self
                .reject(
                    &mut progress,
                    RejectReason::TokenExpired,
                    detail,
                    Some(grant.voter_id),
                    source_ip,
                    now,
                )
                .await);
        }
        progress.advance(ScanStage::ExpiryChecked);

        // 3. Ledger
        let record = VerificationRecord::new(
            grant.voter_id.clone(),
            grant.election_id.clone(),
            now,
            source_ip.clone(),
        );
        let decision = match self.ledger.try_insert(record).await {
            Ok(decision) => decision,
            Err(e) => {
                return Err(self
                    .storage_failure(&mut progress, e, Some(grant.voter_id), source_ip, now)
                    .await);
            }
        };
        progress.advance(ScanStage::LedgerDecided);

        // 4. Audit
        let (action, detail, response) = match decision {
            LedgerDecision::Committed(record) => (
                AuditAction::VerifySuccess,
                AuditDetail::Verified {
                    voter_id: record.voter_id,
                    election_id: record.election_id,
                    record_id: record.id,
                },
                VerifyResponse::success(grant.voter_display_name, record.verified_at),
            ),
            LedgerDecision::AlreadyVerified(existing) => (
                AuditAction::AlreadyVerified,
                AuditDetail::AlreadyVerified {
                    voter_id: existing.voter_id,
                    election_id: existing.election_id,
                    first_verified_at: existing.verified_at,
                },
                VerifyResponse::already_verified(existing.verified_at),
            ),
        };
        self.audit(
            &mut progress,
            AuditRecord::new(
                action,
                Some(grant.voter_id.to_string()),
                detail,
                source_ip,
                now,
            ),
        )
        .await;

        self.metrics.record_outcome(response.outcome);
        info!(outcome = %response.outcome, voter_id = %grant.voter_id, "Scan complete");
        Ok(response)
    }

    async fn reject(
        &self,
        progress: &mut ScanProgress,
        reason: RejectReason,
        detail: AuditDetail,
        subject: Option<VoterId>,
        source_ip: Option<String>,
        now: Timestamp,
    ) -> VerifyResponse {
        info!(reason = reason.message(), stage = %progress.stage(), "Scan rejected");
        self.audit(
            progress,
            AuditRecord::new(
                AuditAction::VerifyFail,
                subject.map(|v| v.to_string()),
                detail,
                source_ip,
                now,
            ),
        )
        .await;

        let response = VerifyResponse::rejected(reason);
        self.metrics.record_outcome(response.outcome);
        response
    }

    async fn storage_failure(
        &self,
        progress: &mut ScanProgress,
        err: StoreError,
        subject: Option<VoterId>,
        source_ip: Option<String>,
        now: Timestamp,
    ) -> VerificationError {
        let stage = progress.stage();
        warn!(stage = %stage, error = %err, "Store unavailable, no decision made");
        self.audit(
            progress,
            AuditRecord::new(
                AuditAction::VerifyFail,
                subject.map(|v| v.to_string()),
                AuditDetail::StorageUnavailable {
                    message: err.to_string(),
                },
                source_ip,
                now,
            ),
        )
        .await;

        self.metrics.record_storage_error();
        VerificationError::storage(stage, err)
    }

    async fn audit(&self, progress: &mut ScanProgress, record: AuditRecord) {
        self.recorder.record(record).await;
        progress.advance(ScanStage::Audited);
        progress.advance(ScanStage::End);
    }
}

#[async_trait]
impl VerificationApi for VerificationService {
    async fn verify(
        &self,
        token: &str,
        source_ip: Option<&str>,
    ) -> Result<VerifyResponse, VerificationError> {
        self.verify_credential(Credential::qr_token(token), source_ip)
            .await
    }

    async fn verify_credential(
        &self,
        credential: Credential,
        source_ip: Option<&str>,
    ) -> Result<VerifyResponse, VerificationError> {
        let span = info_span!(
            "scan",
            scan_id = %Uuid::new_v4(),
            credential = %credential,
            source_ip = source_ip.unwrap_or("-"),
        );
        let source_ip = source_ip.map(str::to_owned);

        if !self.detach_pipeline {
            return self.inner.run(credential, source_ip).instrument(span).await;
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.run(credential, source_ip).await }.instrument(span))
            .await
            .map_err(|e| VerificationError::TaskAborted(e.to_string()))?
    }

    async fn recent_audit(&self, limit: usize) -> Result<Vec<AuditEntry>, VerificationError> {
        self.inner
            .recorder
            .sink()
            .tail(limit)
            .await
            .map_err(|e| VerificationError::storage(ScanStage::Audited, e))
    }
}
