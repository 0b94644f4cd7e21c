//! Switchable fault injection around real stores.
//!
//! Each wrapper delegates to its inner store until `fail()` is called, then
//! answers every call with `StoreError::Unavailable` until `recover()`.

use crate::domain::entities::{AuditEntry, AuditRecord, Election, Token, VerificationRecord, Voter};
use crate::domain::errors::StoreError;
use crate::domain::value_objects::{Credential, ElectionId, LedgerKey, VoterId};
use crate::ports::outbound::{AuditSink, LedgerDecision, TokenDirectory, VerificationLedger};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct FaultSwitch {
    failing: AtomicBool,
    rejected: AtomicU64,
}

impl FaultSwitch {
    fn check(&self, what: &str) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            self.rejected.fetch_add(1, Ordering::SeqCst);
            return Err(StoreError::Unavailable(format!("{what} offline")));
        }
        Ok(())
    }
}

macro_rules! fault_controls {
    ($name:ident) => {
        impl $name {
            pub fn fail(&self) {
                self.switch.failing.store(true, Ordering::SeqCst);
            }

            pub fn recover(&self) {
                self.switch.failing.store(false, Ordering::SeqCst);
            }

            /// Calls refused while failing.
            pub fn rejected_calls(&self) -> u64 {
                self.switch.rejected.load(Ordering::SeqCst)
            }
        }
    };
}

/// Audit sink that can be taken offline.
pub struct FlakyAuditSink {
    inner: Arc<dyn AuditSink>,
    switch: FaultSwitch,
}

impl FlakyAuditSink {
    pub fn new(inner: Arc<dyn AuditSink>) -> Self {
        Self {
            inner,
            switch: FaultSwitch::default(),
        }
    }
}

fault_controls!(FlakyAuditSink);

#[async_trait]
impl AuditSink for FlakyAuditSink {
    async fn append(&self, record: AuditRecord) -> Result<AuditEntry, StoreError> {
        self.switch.check("audit sink")?;
        self.inner.append(record).await
    }

    async fn read_from(&self, start: u64, limit: usize) -> Result<Vec<AuditEntry>, StoreError> {
        self.switch.check("audit sink")?;
        self.inner.read_from(start, limit).await
    }

    async fn tail(&self, limit: usize) -> Result<Vec<AuditEntry>, StoreError> {
        self.switch.check("audit sink")?;
        self.inner.tail(limit).await
    }

    async fn len(&self) -> Result<u64, StoreError> {
        self.switch.check("audit sink")?;
        self.inner.len().await
    }
}

/// Ledger that can be taken offline.
pub struct FlakyLedger {
    inner: Arc<dyn VerificationLedger>,
    switch: FaultSwitch,
}

impl FlakyLedger {
    pub fn new(inner: Arc<dyn VerificationLedger>) -> Self {
        Self {
            inner,
            switch: FaultSwitch::default(),
        }
    }
}

fault_controls!(FlakyLedger);

#[async_trait]
impl VerificationLedger for FlakyLedger {
    async fn try_insert(&self, record: VerificationRecord) -> Result<LedgerDecision, StoreError> {
        self.switch.check("ledger")?;
        self.inner.try_insert(record).await
    }

    async fn find(&self, key: &LedgerKey) -> Result<Option<VerificationRecord>, StoreError> {
        self.switch.check("ledger")?;
        self.inner.find(key).await
    }

    async fn count(&self) -> Result<usize, StoreError> {
        self.switch.check("ledger")?;
        self.inner.count().await
    }
}

/// Token directory that can be taken offline.
pub struct FlakyDirectory {
    inner: Arc<dyn TokenDirectory>,
    switch: FaultSwitch,
}

impl FlakyDirectory {
    pub fn new(inner: Arc<dyn TokenDirectory>) -> Self {
        Self {
            inner,
            switch: FaultSwitch::default(),
        }
    }
}

fault_controls!(FlakyDirectory);

#[async_trait]
impl TokenDirectory for FlakyDirectory {
    async fn find_token(&self, credential: &Credential) -> Result<Option<Token>, StoreError> {
        self.switch.check("directory")?;
        self.inner.find_token(credential).await
    }

    async fn find_voter(&self, id: &VoterId) -> Result<Option<Voter>, StoreError> {
        self.switch.check("directory")?;
        self.inner.find_voter(id).await
    }

    async fn find_election(&self, id: &ElectionId) -> Result<Option<Election>, StoreError> {
        self.switch.check("directory")?;
        self.inner.find_election(id).await
    }
}
