use crate::{errors::PlanError, recipients::Recipient};

/// A fixed-capacity group of recipients destined for one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedBatch {
    pub index: u32,
    pub recipients: Vec<Recipient>,
}

/// Partitions recipients into batches of `group_size`, preserving input
/// order. The last batch may be short. Indices are zero-based and
/// monotonic; they address bits in the idempotency bitmap.
pub fn plan(recipients: &[Recipient], group_size: usize) -> Result<Vec<PlannedBatch>, PlanError> {
    if group_size == 0 {
        return Err(PlanError::ZeroGroupSize);
    }
    Ok(recipients
        .chunks(group_size)
        .enumerate()
        .map(|(index, chunk)| PlannedBatch {
            index: index as u32,
            recipients: chunk.to_vec(),
        })
        .collect())
}

pub fn batch_count(recipient_count: usize, group_size: usize) -> usize {
    recipient_count.div_ceil(group_size)
}
