//! Demo fixture: one voter with a QR token and an RFID tag for one active
//! election. Re-seeding an existing store is a no-op.

use tracing::info;
use vg_01_token_verification::{
    Credential, Election, ElectionId, RegistryWriter, StoreError, Timestamp, Token, Voter,
    VoterId, MILLIS_PER_SEC,
};

pub const DEMO_VOTER_ID: &str = "voter_101";
pub const DEMO_VOTER_NAME: &str = "Demo Voter";
pub const DEMO_ELECTION_ID: &str = "election_demo";
pub const DEMO_QR_TOKEN: &str = "DEMO-QR-0001";
pub const DEMO_RFID_TAG: &str = "834D4CC5";

/// Demo tokens stay valid for a day from seeding.
pub const DEMO_TOKEN_TTL_MS: u64 = 24 * 60 * 60 * MILLIS_PER_SEC;

/// What was seeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoFixture {
    pub voter_id: VoterId,
    pub election_id: ElectionId,
    pub credentials: Vec<Credential>,
    /// Credentials that were already issued before this call.
    pub already_present: usize,
}

pub async fn seed_demo(
    registry: &dyn RegistryWriter,
    now: Timestamp,
) -> Result<DemoFixture, StoreError> {
    let voter_id = VoterId::new(DEMO_VOTER_ID);
    let election_id = ElectionId::new(DEMO_ELECTION_ID);

    registry
        .register_voter(Voter::new(voter_id.clone(), DEMO_VOTER_NAME))
        .await?;
    registry
        .register_election(Election::new(election_id.clone(), "Demo Election", true))
        .await?;

    let credentials = vec![
        Credential::qr_token(DEMO_QR_TOKEN),
        Credential::rfid(DEMO_RFID_TAG),
    ];
    let mut already_present = 0;
    for credential in &credentials {
        let token = Token {
            credential: credential.clone(),
            voter_id: voter_id.clone(),
            election_id: election_id.clone(),
            expires_at: now + DEMO_TOKEN_TTL_MS,
            issued_at: now,
        };
        match registry.issue_token(token).await {
            Ok(()) => {}
            Err(StoreError::DuplicateCredential(_)) => already_present += 1,
            Err(e) => return Err(e),
        }
    }

    info!(
        voter_id = %voter_id,
        election_id = %election_id,
        already_present,
        "Demo fixture ready"
    );

    Ok(DemoFixture {
        voter_id,
        election_id,
        credentials,
        already_present,
    })
}
