use futures::future::join_all;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use tracing::{info, warn};

use crate::{errors::RpcError, rpc::LedgerConnection, tracker::is_bit_set, tx_builder::PendingBatch, Result};

#[derive(Debug)]
pub struct BatchOutcome {
    pub index: u32,
    pub result: std::result::Result<Signature, RpcError>,
}

/// Signs and submits every pending batch concurrently. No batch waits on
/// another; the call returns once every submission has either been
/// accepted by the network or failed. This is attempted delivery, not
/// finality: recovery for dropped batches is a resume run, which skips
/// batches whose idempotency bit is already set.
pub async fn broadcast_all<C: LedgerConnection>(
    conn: &C,
    payer: &Keypair,
    pending: &[PendingBatch],
) -> Result<Vec<BatchOutcome>> {
    if pending.is_empty() {
        return Ok(Vec::new());
    }

    let blockhash = conn.get_latest_blockhash().await?;

    let sends = pending.iter().map(|batch| async move {
        let transaction = Transaction::new_signed_with_payer(
            &batch.instructions,
            Some(&payer.pubkey()),
            &[payer],
            blockhash,
        );
        BatchOutcome {
            index: batch.index,
            result: conn.send_transaction(&transaction).await,
        }
    });
    let outcomes = join_all(sends).await;

    for outcome in &outcomes {
        match &outcome.result {
            Ok(signature) => info!("Batch {} submitted: {}", outcome.index, signature),
            Err(e) => warn!("Batch {} submission failed: {}", outcome.index, e),
        }
    }
    Ok(outcomes)
}

/// Drops batches whose bit is already set in the on-chain bitmap, so a
/// batch that landed in a previous run is never paid twice. A missing
/// tracker account means no bit can be set; everything stays pending.
pub async fn filter_completed<C: LedgerConnection>(
    conn: &C,
    tracker: &Pubkey,
    pending: Vec<PendingBatch>,
) -> Result<Vec<PendingBatch>> {
    let Some(account) = conn.get_account(tracker).await? else {
        warn!("Idempotency map {} not found on ledger, resending all batches", tracker);
        return Ok(pending);
    };

    let bitmap = account.data;
    let mut remaining = Vec::with_capacity(pending.len());
    for batch in pending {
        if is_bit_set(&bitmap, batch.index) {
            info!("Batch {} already confirmed on ledger, skipping", batch.index);
        } else {
            remaining.push(batch);
        }
    }
    Ok(remaining)
}
