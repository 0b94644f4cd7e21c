//! In-memory booth with a manual clock, shared by the integration suites and
//! the benchmarks.

use std::sync::Arc;

use vg_01_token_verification::adapters::{
    InMemoryAuditLog, InMemoryLedger, InMemoryRegistry, ManualClock,
};
use vg_01_token_verification::{
    AuditSink, Credential, Election, ElectionId, RegistryWriter, ServicePorts, StoreError,
    Timestamp, Token, TokenDirectory, VerificationConfig, VerificationLedger,
    VerificationService, Voter, VoterId, MILLIS_PER_SEC,
};

/// Clock start for every harness: 2024-01-01T00:00:00Z.
pub const HARNESS_EPOCH: Timestamp = 1_704_067_200_000;

pub const HOUR_MS: u64 = 3_600 * MILLIS_PER_SEC;

pub struct Harness {
    pub registry: Arc<InMemoryRegistry>,
    pub ledger: Arc<InMemoryLedger>,
    pub audit: Arc<InMemoryAuditLog>,
    pub clock: Arc<ManualClock>,
    pub service: VerificationService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(VerificationConfig::for_testing())
    }

    pub fn with_config(config: VerificationConfig) -> Self {
        let registry = Arc::new(InMemoryRegistry::new());
        let ledger = Arc::new(InMemoryLedger::new());
        let audit = Arc::new(InMemoryAuditLog::new());
        let clock = Arc::new(ManualClock::new(HARNESS_EPOCH));
        let service = VerificationService::new(
            ServicePorts {
                directory: registry.clone(),
                ledger: ledger.clone(),
                audit: audit.clone(),
                clock: clock.clone(),
            },
            config,
        );
        Self {
            registry,
            ledger,
            audit,
            clock,
            service,
        }
    }

    /// Build a service over the harness stores with some ports swapped out.
    pub fn service_with(
        &self,
        directory: Option<Arc<dyn TokenDirectory>>,
        ledger: Option<Arc<dyn VerificationLedger>>,
        audit: Option<Arc<dyn AuditSink>>,
        config: VerificationConfig,
    ) -> VerificationService {
        VerificationService::new(
            ServicePorts {
                directory: directory
                    .unwrap_or_else(|| self.registry.clone() as Arc<dyn TokenDirectory>),
                ledger: ledger
                    .unwrap_or_else(|| self.ledger.clone() as Arc<dyn VerificationLedger>),
                audit: audit
                    .unwrap_or_else(|| self.audit.clone() as Arc<dyn AuditSink>),
                clock: self.clock.clone(),
            },
            config,
        )
    }

    pub fn now(&self) -> Timestamp {
        vg_01_token_verification::TimeSource::now(self.clock.as_ref())
    }

    pub async fn voter(&self, id: &str, name: &str) -> Result<VoterId, StoreError> {
        let voter_id = VoterId::new(id);
        self.registry
            .register_voter(Voter::new(voter_id.clone(), name))
            .await?;
        Ok(voter_id)
    }

    pub async fn election(&self, id: &str, active: bool) -> Result<ElectionId, StoreError> {
        let election_id = ElectionId::new(id);
        self.registry
            .register_election(Election::new(election_id.clone(), id, active))
            .await?;
        Ok(election_id)
    }

    pub async fn token(
        &self,
        credential: Credential,
        voter_id: &VoterId,
        election_id: &ElectionId,
        expires_at: Timestamp,
    ) -> Result<(), StoreError> {
        self.registry
            .issue_token(Token {
                credential,
                voter_id: voter_id.clone(),
                election_id: election_id.clone(),
                expires_at,
                issued_at: self.now(),
            })
            .await
    }

    /// `T1 → V1/E1` valid for an hour, `T2 → V2/E1` expired a minute ago.
    pub async fn standard_fixture(&self) -> Result<(), StoreError> {
        let v1 = self.voter("V1", "Ada Lovelace").await?;
        let v2 = self.voter("V2", "Grace Hopper").await?;
        let e1 = self.election("E1", true).await?;
        let now = self.now();
        self.token(Credential::qr_token("T1"), &v1, &e1, now + HOUR_MS)
            .await?;
        self.token(Credential::qr_token("T2"), &v2, &e1, now - 60 * MILLIS_PER_SEC)
            .await?;
        Ok(())
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
