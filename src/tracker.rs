use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    system_program,
    transaction::Transaction,
};
use tracing::info;

use crate::{
    constants::{BITMAP_PROGRAM_ID, CREATE_MAP_DISCRIMINATOR, MARK_BIT_DISCRIMINATOR},
    errors::SetupError,
    planner::batch_count,
    rpc::LedgerConnection,
};

/// Bitmap account size in bytes: one bit per batch, rounded up.
pub fn bitmap_size(recipient_count: usize, group_size: usize) -> usize {
    batch_count(recipient_count, group_size).div_ceil(8)
}

/// Instruction creating a bitmap account of exactly `size_bytes` bytes,
/// owned by the bitmap program. Payer and the new account both sign.
pub fn create_tracker_instruction(
    payer: &Pubkey,
    tracker: &Pubkey,
    size_bytes: u32,
) -> Instruction {
    let mut data = Vec::with_capacity(12);
    data.extend_from_slice(&CREATE_MAP_DISCRIMINATOR);
    data.extend_from_slice(&size_bytes.to_le_bytes());

    Instruction {
        program_id: BITMAP_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new(*tracker, true),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data,
    }
}

/// Instruction setting bit `batch_index` in the tracker's bitmap. Returned,
/// not sent: it rides in the same transaction as the batch's transfers so
/// the bit and the transfers commit atomically.
pub fn mark_bit_instruction(payer: &Pubkey, tracker: &Pubkey, batch_index: u32) -> Instruction {
    let mut data = Vec::with_capacity(12);
    data.extend_from_slice(&MARK_BIT_DISCRIMINATOR);
    data.extend_from_slice(&batch_index.to_le_bytes());

    Instruction {
        program_id: BITMAP_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new(*tracker, false),
        ],
        data,
    }
}

/// Bit `i` lives in byte `i / 8`, LSB first within the byte. Out-of-range
/// indices read as unset.
pub fn is_bit_set(bitmap: &[u8], batch_index: u32) -> bool {
    let byte = (batch_index / 8) as usize;
    match bitmap.get(byte) {
        Some(b) => b & (1 << (batch_index % 8)) != 0,
        None => false,
    }
}

/// Creates the bitmap account on-chain and waits for confirmation. The job
/// must not proceed until this exists; failure here is fatal and leaves no
/// partial state since no transfers have been built yet.
pub async fn create_tracker<C: LedgerConnection>(
    conn: &C,
    payer: &Keypair,
    tracker: &Keypair,
    size_bytes: u32,
) -> Result<Signature, SetupError> {
    let instruction = create_tracker_instruction(&payer.pubkey(), &tracker.pubkey(), size_bytes);
    let blockhash = conn
        .get_latest_blockhash()
        .await
        .map_err(|e| SetupError::MapCreation {
            pubkey: tracker.pubkey(),
            error: e.to_string(),
        })?;
    let transaction = Transaction::new_signed_with_payer(
        &[instruction],
        Some(&payer.pubkey()),
        &[payer, tracker],
        blockhash,
    );
    let signature =
        conn.process_transaction(&transaction)
            .await
            .map_err(|e| SetupError::MapCreation {
                pubkey: tracker.pubkey(),
                error: e.to_string(),
            })?;
    info!(
        "Created idempotency map {} ({} bytes): {}",
        tracker.pubkey(),
        size_bytes,
        signature
    );
    Ok(signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitmap_size() {
        // 100 recipients in groups of 9 -> 12 batches -> 2 bytes
        assert_eq!(bitmap_size(100, 9), 2);
        // 20 recipients in groups of 9 -> 3 batches -> 1 byte
        assert_eq!(bitmap_size(20, 9), 1);
        assert_eq!(bitmap_size(64 * 9, 9), 8);
        assert_eq!(bitmap_size(64 * 9 + 1, 9), 9);
    }

    #[test]
    fn test_create_tracker_instruction_layout() {
        let payer = Pubkey::new_unique();
        let tracker = Pubkey::new_unique();
        let ix = create_tracker_instruction(&payer, &tracker, 0x0102);

        assert_eq!(ix.program_id, BITMAP_PROGRAM_ID);
        assert_eq!(&ix.data[..8], &CREATE_MAP_DISCRIMINATOR);
        assert_eq!(&ix.data[8..], &[0x02, 0x01, 0x00, 0x00]);
        assert!(ix.accounts[0].is_signer && ix.accounts[0].is_writable);
        assert!(ix.accounts[1].is_signer && ix.accounts[1].is_writable);
        assert_eq!(ix.accounts[2].pubkey, system_program::id());
        assert!(!ix.accounts[2].is_signer);
    }

    #[test]
    fn test_mark_bit_instruction_layout() {
        let payer = Pubkey::new_unique();
        let tracker = Pubkey::new_unique();
        let ix = mark_bit_instruction(&payer, &tracker, 300);

        assert_eq!(ix.program_id, BITMAP_PROGRAM_ID);
        assert_eq!(&ix.data[..8], &MARK_BIT_DISCRIMINATOR);
        assert_eq!(&ix.data[8..], &300u32.to_le_bytes());
        assert_eq!(ix.accounts.len(), 2);
        assert_eq!(ix.accounts[1].pubkey, tracker);
        // The tracker does not co-sign bit updates.
        assert!(!ix.accounts[1].is_signer);
        assert!(ix.accounts[1].is_writable);
    }

    #[test]
    fn test_is_bit_set() {
        let bitmap = [0b0000_0101u8, 0b1000_0000];
        assert!(is_bit_set(&bitmap, 0));
        assert!(!is_bit_set(&bitmap, 1));
        assert!(is_bit_set(&bitmap, 2));
        assert!(is_bit_set(&bitmap, 15));
        assert!(!is_bit_set(&bitmap, 14));
        // Past the end of the map reads as unset.
        assert!(!is_bit_set(&bitmap, 16));
        assert!(!is_bit_set(&bitmap, 1000));
    }
}
