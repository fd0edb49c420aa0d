use std::{fs, path::Path, str::FromStr};

use serde_json::Value;
use solana_sdk::pubkey::Pubkey;

use crate::errors::PlanError;

/// One distribution target. Identity is the wallet address; the amount is
/// in base units of the mint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub address: Pubkey,
    pub amount: u64,
}

/// Reads a recipients file: a JSON object mapping wallet address to amount.
/// Entry order in the file is the batch planning order.
pub fn load_recipients(path: &Path) -> Result<Vec<Recipient>, PlanError> {
    let raw = fs::read_to_string(path).map_err(|e| PlanError::RecipientsFile {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;
    parse_recipients(&raw).map_err(|e| match e {
        PlanError::RecipientsParse { error, .. } => PlanError::RecipientsParse {
            path: path.display().to_string(),
            error,
        },
        other => other,
    })
}

pub fn parse_recipients(raw: &str) -> Result<Vec<Recipient>, PlanError> {
    let map: serde_json::Map<String, Value> =
        serde_json::from_str(raw).map_err(|e| PlanError::RecipientsParse {
            path: String::new(),
            error: e.to_string(),
        })?;

    let mut recipients = Vec::with_capacity(map.len());
    for (address, amount) in map {
        let parsed = Pubkey::from_str(&address).map_err(|e| PlanError::InvalidAddress {
            address: address.clone(),
            error: e.to_string(),
        })?;
        let amount = amount
            .as_u64()
            .ok_or(PlanError::InvalidAmount { address })?;
        recipients.push(Recipient {
            address: parsed,
            amount,
        });
    }

    if recipients.is_empty() {
        return Err(PlanError::NoRecipients);
    }
    Ok(recipients)
}
