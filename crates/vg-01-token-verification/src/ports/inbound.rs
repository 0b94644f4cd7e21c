//! Inbound Ports (Driving Ports / API)

use crate::domain::entities::AuditEntry;
use crate::domain::errors::VerificationError;
use crate::domain::outcome::VerifyResponse;
use crate::domain::value_objects::Credential;
use async_trait::async_trait;

/// Primary Token Verification API
#[async_trait]
pub trait VerificationApi: Send + Sync {
    /// Verify a QR token string scanned at a booth.
    ///
    /// Rejections come back as `Ok` with the matching outcome. `Err` means no
    /// decision could be made and the scan may be retried.
    async fn verify(
        &self,
        token: &str,
        source_ip: Option<&str>,
    ) -> Result<VerifyResponse, VerificationError>;

    /// Verify any credential kind (QR token or RFID tag).
    async fn verify_credential(
        &self,
        credential: Credential,
        source_ip: Option<&str>,
    ) -> Result<VerifyResponse, VerificationError>;

    /// Most recent audit entries, oldest first.
    async fn recent_audit(&self, limit: usize) -> Result<Vec<AuditEntry>, VerificationError>;
}
