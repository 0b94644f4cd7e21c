//! # Booth Node
//!
//! Reads scans from stdin, one per line, and writes one JSON verdict per
//! line to stdout. Logs go to stderr.
//!
//! ```text
//! $ VG_SEED_DEMO=1 booth-node
//! DEMO-QR-0001 10.0.0.7
//! {"outcome":"SUCCESS","voter_display_name":"Demo Voter","verified_at":...}
//! rfid:834D4CC5
//! {"outcome":"ALREADY_VERIFIED","reason":"already_verified","verified_at":...}
//! ```

use anyhow::{Context, Result};
use tokio::io::BufReader;
use tracing::{info, warn};
use uuid::Uuid;

use booth_node::container::{BoothContainer, NodeConfig};
use booth_node::logging::init_logging;
use booth_node::scan::run_scan_loop;
use booth_node::seed::seed_demo;
use vg_01_token_verification::adapters::SystemTimeSource;
use vg_01_token_verification::TimeSource;

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::from_env().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;

    init_logging(&config.logging).context("failed to initialize logging")?;

    let boot_id = Uuid::new_v4();
    info!(
        %boot_id,
        backend = ?config.storage.backend,
        data_dir = %config.storage.data_dir.display(),
        "Starting booth node"
    );

    let container = BoothContainer::new(config).context("failed to open verification stores")?;

    if container.config.seed_demo {
        seed_demo(container.stores.registry.as_ref(), SystemTimeSource.now())
            .await
            .context("failed to seed demo fixture")?;
    }

    info!("Booth ready. Reading scans from stdin; Ctrl+C to stop.");
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };
    let stats = run_scan_loop(
        &container.service,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        shutdown,
    )
    .await
    .context("scan loop failed")?;

    let parked = container.service.flush_audit().await;
    if parked > 0 {
        warn!(parked, "Audit entries still parked at shutdown");
    }

    let metrics = container.service.metrics();
    info!(
        scans = stats.scans,
        failures = stats.failures,
        success = metrics.success,
        invalid_token = metrics.invalid_token,
        token_expired = metrics.token_expired,
        already_verified = metrics.already_verified,
        audit_failures = metrics.audit_failures,
        "Booth node stopped"
    );

    Ok(())
}
