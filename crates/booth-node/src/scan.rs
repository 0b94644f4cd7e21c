//! # Scan Loop
//!
//! Reads one scan per line and writes one JSON response per line.
//!
//! ```text
//! T1                    QR token, no source address
//! T1 10.0.0.7           QR token scanned by booth 10.0.0.7
//! rfid:834D4CC5 10.0.0.7
//! qr:T1
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.
//!
//! A leading `qr:` or `rfid:` is always read as the credential kind, so a
//! QR payload that itself starts with one of those prefixes must be sent
//! with an explicit `qr:` in front (`qr:rfid:X` looks up the QR token
//! `rfid:X`). Any other colon is part of the token.

use std::future::Future;

use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};
use vg_01_token_verification::{
    Credential, CredentialKind, VerificationApi, VerificationError, VerifyResponse,
};

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub credential: Credential,
    pub source_ip: Option<String>,
}

/// Parse a scan line. `None` for blank and comment lines.
pub fn parse_scan_line(line: &str) -> Option<ScanRequest> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let mut parts = line.split_whitespace();
    let raw = parts.next()?;
    let source_ip = parts.next().map(str::to_owned);

    let credential = match raw.split_once(':') {
        Some((prefix, value)) => match CredentialKind::parse(prefix) {
            Some(kind) => Credential::new(kind, value),
            None => Credential::qr_token(raw),
        },
        None => Credential::qr_token(raw),
    };

    Some(ScanRequest {
        credential,
        source_ip,
    })
}

/// Line written for a scan that could not be decided.
#[derive(Debug, Serialize)]
struct ScanFailure {
    error: &'static str,
    message: String,
    retryable: bool,
}

impl From<&VerificationError> for ScanFailure {
    fn from(err: &VerificationError) -> Self {
        let error = match err {
            VerificationError::StorageUnavailable { .. } => "storage_unavailable",
            VerificationError::TaskAborted(_) => "aborted",
        };
        Self {
            error,
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ScanOutput {
    Response(VerifyResponse),
    Failure(ScanFailure),
}

/// Totals for one run of the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub scans: u64,
    pub failures: u64,
}

#[derive(Debug, Error)]
pub enum ScanLoopError {
    #[error("scan stream I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Feed scans from `reader` through `api` until EOF or `shutdown` resolves.
pub async fn run_scan_loop<R, W, S>(
    api: &dyn VerificationApi,
    reader: R,
    mut writer: W,
    shutdown: S,
) -> Result<ScanStats, ScanLoopError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    S: Future<Output = ()>,
{
    let mut lines = reader.lines();
    let mut stats = ScanStats::default();
    tokio::pin!(shutdown);

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = &mut shutdown => {
                info!("Shutdown requested, leaving scan loop");
                break;
            }
        };
        let Some(line) = line else {
            debug!("Scan input closed");
            break;
        };
        let Some(request) = parse_scan_line(&line) else {
            continue;
        };

        stats.scans += 1;
        let output = match api
            .verify_credential(request.credential, request.source_ip.as_deref())
            .await
        {
            Ok(response) => ScanOutput::Response(response),
            Err(err) => {
                stats.failures += 1;
                warn!(error = %err, retryable = err.is_retryable(), "Scan not decided");
                ScanOutput::Failure(ScanFailure::from(&err))
            }
        };

        let mut encoded = serde_json::to_vec(&output)?;
        encoded.push(b'\n');
        writer.write_all(&encoded).await?;
        writer.flush().await?;
    }

    Ok(stats)
}
