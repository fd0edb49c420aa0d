use solana_sdk::{instruction::Instruction, pubkey::Pubkey};
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account_idempotent,
};

use crate::{planner::PlannedBatch, tracker::mark_bit_instruction, Result};

/// One batch's worth of instructions, ready to be persisted and later
/// signed into a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingBatch {
    pub index: u32,
    pub instructions: Vec<Instruction>,
}

/// Builds the instruction sequence for one batch: per recipient an
/// idempotent create-ATA followed by a transfer, then exactly one trailing
/// mark-bit instruction for the batch index. No network IO.
pub fn build_batch(
    batch: &PlannedBatch,
    payer: &Pubkey,
    sender_token: &Pubkey,
    mint: &Pubkey,
    tracker: &Pubkey,
) -> Result<PendingBatch> {
    let mut instructions = Vec::with_capacity(batch.recipients.len() * 2 + 1);

    for recipient in &batch.recipients {
        let recipient_token = get_associated_token_address(&recipient.address, mint);
        instructions.push(create_associated_token_account_idempotent(
            payer,
            &recipient.address,
            mint,
            &spl_token::id(),
        ));
        // transfer_checked would need the mint decimals; a plain transfer
        // keeps the builder free of network IO.
        #[allow(deprecated)]
        instructions.push(spl_token::instruction::transfer(
            &spl_token::id(),
            sender_token,
            &recipient_token,
            payer,
            &[],
            recipient.amount,
        )?);
    }

    instructions.push(mark_bit_instruction(payer, tracker, batch.index));

    Ok(PendingBatch {
        index: batch.index,
        instructions,
    })
}
