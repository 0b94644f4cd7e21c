//! Token Resolver
//!
//! Maps a presented credential to the voter and election it was issued for.
//! One resolver serves every credential kind; the kind is part of the lookup
//! key.

use crate::domain::entities::{AuditDetail, TokenGrant};
use crate::domain::errors::StoreError;
use crate::domain::outcome::RejectReason;
use crate::domain::value_objects::{Credential, VoterId};
use crate::ports::outbound::TokenDirectory;
use std::sync::Arc;
use tracing::debug;

/// Result of resolving a credential.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Found(TokenGrant),
    /// The credential does not grant a verification. Nothing past the
    /// resolver may run.
    Rejected {
        reason: RejectReason,
        detail: AuditDetail,
        /// Voter the credential pointed at, if it got that far.
        subject: Option<VoterId>,
    },
}

impl Resolution {
    fn rejected(reason: RejectReason, detail: AuditDetail, subject: Option<VoterId>) -> Self {
        Resolution::Rejected {
            reason,
            detail,
            subject,
        }
    }
}

pub struct TokenResolver {
    directory: Arc<dyn TokenDirectory>,
    max_credential_len: usize,
}

impl TokenResolver {
    pub fn new(directory: Arc<dyn TokenDirectory>, max_credential_len: usize) -> Self {
        Self {
            directory,
            max_credential_len,
        }
    }

    /// Exact-match lookup followed by scope validation.
    ///
    /// Store failures are returned as `Err`; every other failure is a
    /// `Rejected` resolution.
    pub async fn resolve(&self, credential: &Credential) -> Result<Resolution, StoreError> {
        if credential.is_empty() {
            return Ok(Resolution::rejected(
                RejectReason::EmptyToken,
                AuditDetail::EmptyToken,
                None,
            ));
        }

        if credential.value.len() > self.max_credential_len {
            return Ok(Resolution::rejected(
                RejectReason::MalformedToken,
                AuditDetail::MalformedToken {
                    kind: credential.kind,
                    length: credential.value.len(),
                },
                None,
            ));
        }

        let Some(token) = self.directory.find_token(credential).await? else {
            debug!(credential = %credential, "No token issued for credential");
            return Ok(Resolution::rejected(
                RejectReason::TokenNotFound,
                AuditDetail::TokenNotFound {
                    kind: credential.kind,
                    fingerprint: credential.fingerprint(),
                },
                None,
            ));
        };

        let election = self.directory.find_election(&token.election_id).await?;
        if !election.is_some_and(|e| e.active) {
            return Ok(Resolution::rejected(
                RejectReason::ElectionNotActive,
                AuditDetail::ElectionNotActive {
                    election_id: token.election_id,
                },
                Some(token.voter_id),
            ));
        }

        let Some(voter) = self.directory.find_voter(&token.voter_id).await? else {
            return Ok(Resolution::rejected(
                RejectReason::VoterNotRegistered,
                AuditDetail::VoterNotRegistered {
                    voter_id: token.voter_id.clone(),
                },
                Some(token.voter_id),
            ));
        };

        Ok(Resolution::Found(TokenGrant {
            voter_id: token.voter_id,
            election_id: token.election_id,
            expires_at: token.expires_at,
            voter_display_name: voter.display_name,
        }))
    }
}
