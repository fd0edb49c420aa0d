use std::path::{Path, PathBuf};

use solana_sdk::signature::{Keypair, Signer};
use spl_associated_token_account::get_associated_token_address;
use tracing::info;

use crate::{
    broadcast::{broadcast_all, filter_completed, BatchOutcome},
    config::JobConfig,
    planner,
    recipients::load_recipients,
    rpc::LedgerConnection,
    store,
    tracker::{self, bitmap_size},
    tx_builder::build_batch,
    Result,
};

#[derive(Debug)]
pub struct JobSummary {
    pub job_dir: PathBuf,
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl JobSummary {
    fn from_outcomes(job_dir: PathBuf, outcomes: &[BatchOutcome], skipped: usize) -> Self {
        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        Self {
            job_dir,
            sent: outcomes.len() - failed,
            failed,
            skipped,
        }
    }
}

/// Fresh run: plan batches, create the idempotency map, persist every
/// batch to the job directory, then broadcast. Persistence strictly
/// precedes broadcast so a crash in between leaves a resumable checkpoint.
pub async fn prepare_and_send<C: LedgerConnection>(
    conn: &C,
    config: &JobConfig,
    recipients_path: &Path,
) -> Result<JobSummary> {
    let recipients = load_recipients(recipients_path)?;
    let batches = planner::plan(&recipients, config.group_size)?;
    info!(
        "Planned {} batches for {} recipients (group size {})",
        batches.len(),
        recipients.len(),
        config.group_size
    );

    let tracker_keypair = Keypair::new();
    let size = bitmap_size(recipients.len(), config.group_size) as u32;
    tracker::create_tracker(conn, &config.payer_keypair, &tracker_keypair, size).await?;

    let job_dir = store::create_job_dir(&config.job_root, &tracker_keypair.pubkey())?;
    store::write_tracker_keypair(&job_dir, &tracker_keypair)?;

    let payer = config.payer_pubkey();
    let sender_token = get_associated_token_address(&payer, &config.mint);
    let tracker_pubkey = tracker_keypair.pubkey();
    let pending = batches
        .iter()
        .map(|batch| build_batch(batch, &payer, &sender_token, &config.mint, &tracker_pubkey))
        .collect::<Result<Vec<_>>>()?;

    store::persist(&job_dir, &pending)?;

    let outcomes = broadcast_all(conn, &config.payer_keypair, &pending).await?;
    Ok(JobSummary::from_outcomes(job_dir, &outcomes, 0))
}

/// Resume run: reload the persisted batches, skip those whose bit is
/// already set on the ledger, re-broadcast the rest.
pub async fn resume<C: LedgerConnection>(
    conn: &C,
    config: &JobConfig,
    job_dir: &Path,
) -> Result<JobSummary> {
    let tracker_keypair = store::read_tracker_keypair(job_dir)?;
    let pending = store::load_pending(job_dir)?;
    let total = pending.len();
    info!("Loaded {} pending batches from {}", total, job_dir.display());

    let pending = filter_completed(conn, &tracker_keypair.pubkey(), pending).await?;
    let skipped = total - pending.len();

    let outcomes = broadcast_all(conn, &config.payer_keypair, &pending).await?;
    Ok(JobSummary::from_outcomes(
        job_dir.to_path_buf(),
        &outcomes,
        skipped,
    ))
}
