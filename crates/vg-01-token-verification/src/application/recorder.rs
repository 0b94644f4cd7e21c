//! Audit Recorder
//!
//! Appends one entry per scan attempt. A failed append never fails the scan:
//! the record is parked in a bounded backlog and flushed, in original order,
//! ahead of the next append.

use crate::domain::entities::{AuditEntry, AuditRecord};
use crate::domain::errors::StoreError;
use crate::metrics::VerificationMetrics;
use crate::ports::outbound::AuditSink;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
    backlog: Mutex<VecDeque<AuditRecord>>,
    /// Mirrors `backlog.len()` so the common path skips the lock.
    parked: AtomicUsize,
    capacity: usize,
    metrics: Arc<VerificationMetrics>,
}

impl AuditRecorder {
    pub fn new(sink: Arc<dyn AuditSink>, capacity: usize, metrics: Arc<VerificationMetrics>) -> Self {
        Self {
            sink,
            backlog: Mutex::new(VecDeque::new()),
            parked: AtomicUsize::new(0),
            capacity: capacity.max(1),
            metrics,
        }
    }

    pub fn sink(&self) -> &Arc<dyn AuditSink> {
        &self.sink
    }

    /// Entries waiting to be written.
    pub fn backlog_len(&self) -> usize {
        self.parked.load(Ordering::SeqCst)
    }

    /// Record one scan attempt. Returns the sealed entry, or `None` if the
    /// record was parked.
    pub async fn record(&self, record: AuditRecord) -> Option<AuditEntry> {
        if self.parked.load(Ordering::SeqCst) == 0 {
            match self.sink.append(record.clone()).await {
                Ok(entry) => return Some(entry),
                Err(e) => {
                    self.report_failure(&record, &e);
                    let mut backlog = self.backlog.lock().await;
                    self.park(&mut backlog, record);
                    return None;
                }
            }
        }

        let mut backlog = self.backlog.lock().await;
        self.drain(&mut backlog).await;
        if !backlog.is_empty() {
            self.park(&mut backlog, record);
            return None;
        }

        match self.sink.append(record.clone()).await {
            Ok(entry) => Some(entry),
            Err(e) => {
                self.report_failure(&record, &e);
                self.park(&mut backlog, record);
                None
            }
        }
    }

    /// Write out as much of the backlog as the sink accepts. Returns the
    /// number of entries still parked.
    pub async fn flush(&self) -> usize {
        let mut backlog = self.backlog.lock().await;
        self.drain(&mut backlog).await;
        backlog.len()
    }

    async fn drain(&self, backlog: &mut VecDeque<AuditRecord>) {
        let mut written = 0usize;
        while let Some(front) = backlog.front() {
            match self.sink.append(front.clone()).await {
                Ok(_) => {
                    backlog.pop_front();
                    written += 1;
                }
                Err(e) => {
                    self.metrics.record_audit_failure();
                    warn!(
                        target: "audit",
                        error = %e,
                        parked = backlog.len(),
                        "Audit sink still unavailable"
                    );
                    break;
                }
            }
        }
        if written > 0 {
            debug!(target: "audit", written, remaining = backlog.len(), "Flushed audit backlog");
        }
        self.sync_len(backlog);
    }

    fn report_failure(&self, record: &AuditRecord, err: &StoreError) {
        self.metrics.record_audit_failure();
        error!(
            target: "audit",
            action = %record.action,
            reason = record.detail.reason(),
            subject = record.subject_ref.as_deref().unwrap_or("-"),
            error = %err,
            "Audit append failed, parking entry"
        );
    }

    fn park(&self, backlog: &mut VecDeque<AuditRecord>, record: AuditRecord) {
        if backlog.len() >= self.capacity {
            if let Some(dropped) = backlog.pop_front() {
                error!(
                    target: "audit",
                    action = %dropped.action,
                    reason = dropped.detail.reason(),
                    recorded_at = dropped.recorded_at,
                    capacity = self.capacity,
                    "Audit backlog full, dropping oldest entry"
                );
            }
        }
        backlog.push_back(record);
        self.sync_len(backlog);
    }

    fn sync_len(&self, backlog: &VecDeque<AuditRecord>) {
        self.parked.store(backlog.len(), Ordering::SeqCst);
        self.metrics.set_audit_backlog(backlog.len());
    }
}
