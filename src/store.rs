use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::{ParsePubkeyError, Pubkey},
    signature::Keypair,
};
use tracing::debug;

use crate::{
    errors::{PersistError, SetupError},
    tx_builder::PendingBatch,
};

pub const KEY_FILE: &str = "key";
pub const BATCH_FILE_PREFIX: &str = "_";

/// On-disk batch schema. Account identifiers and the program id are
/// base58 strings; instruction payloads are raw bytes. Encoding is
/// serde_json; decode must reproduce the instruction sequence exactly.
#[derive(Debug, Serialize, Deserialize)]
struct StoredBatch {
    index: u32,
    instructions: Vec<StoredInstruction>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredInstruction {
    program_id: String,
    accounts: Vec<StoredAccountMeta>,
    data: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredAccountMeta {
    pubkey: String,
    is_signer: bool,
    is_writable: bool,
}

impl From<&Instruction> for StoredInstruction {
    fn from(ix: &Instruction) -> Self {
        Self {
            program_id: ix.program_id.to_string(),
            accounts: ix
                .accounts
                .iter()
                .map(|meta| StoredAccountMeta {
                    pubkey: meta.pubkey.to_string(),
                    is_signer: meta.is_signer,
                    is_writable: meta.is_writable,
                })
                .collect(),
            data: ix.data.clone(),
        }
    }
}

impl StoredInstruction {
    fn decode(&self) -> Result<Instruction, ParsePubkeyError> {
        Ok(Instruction {
            program_id: Pubkey::from_str(&self.program_id)?,
            accounts: self
                .accounts
                .iter()
                .map(|meta| {
                    Ok(AccountMeta {
                        pubkey: Pubkey::from_str(&meta.pubkey)?,
                        is_signer: meta.is_signer,
                        is_writable: meta.is_writable,
                    })
                })
                .collect::<Result<Vec<_>, ParsePubkeyError>>()?,
            data: self.data.clone(),
        })
    }
}

/// Job directory path for a tracker account under the job root.
pub fn job_dir(job_root: &Path, tracker: &Pubkey) -> PathBuf {
    job_root.join(tracker.to_string())
}

pub fn create_job_dir(job_root: &Path, tracker: &Pubkey) -> Result<PathBuf, PersistError> {
    let dir = job_dir(job_root, tracker);
    fs::create_dir_all(&dir).map_err(|e| PersistError::CreateDir {
        path: dir.display().to_string(),
        error: e.to_string(),
    })?;
    Ok(dir)
}

/// Writes the tracker's secret key material; resuming the job needs it to
/// retain authority over the bitmap account.
pub fn write_tracker_keypair(dir: &Path, keypair: &Keypair) -> Result<(), PersistError> {
    let path = dir.join(KEY_FILE);
    fs::write(&path, keypair.to_bytes()).map_err(|e| PersistError::Write {
        path: path.display().to_string(),
        error: e.to_string(),
    })
}

pub fn read_tracker_keypair(dir: &Path) -> Result<Keypair, SetupError> {
    let path = dir.join(KEY_FILE);
    let bytes = fs::read(&path)
        .map_err(|e| SetupError::InvalidKeypair(format!("{}: {}", path.display(), e)))?;
    Keypair::from_bytes(&bytes)
        .map_err(|e| SetupError::InvalidKeypair(format!("{}: {}", path.display(), e)))
}

/// Persists every batch to its own `_<index>` file. Must complete before
/// any broadcast is attempted: the files on disk are the checkpoint a
/// second run reconstructs intent from.
pub fn persist(dir: &Path, batches: &[PendingBatch]) -> Result<(), PersistError> {
    for batch in batches {
        let stored = StoredBatch {
            index: batch.index,
            instructions: batch.instructions.iter().map(StoredInstruction::from).collect(),
        };
        let path = dir.join(format!("{}{}", BATCH_FILE_PREFIX, batch.index));
        let encoded = serde_json::to_vec(&stored).map_err(|e| PersistError::Write {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        fs::write(&path, encoded).map_err(|e| PersistError::Write {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
    }
    debug!("Persisted {} batch files to {}", batches.len(), dir.display());
    Ok(())
}

/// Loads every pending batch file in directory-discovery order. Batches
/// are independent, so no re-sort by index is performed. A malformed file
/// fails the whole load; partially written checkpoints are not recovered.
pub fn load_pending(dir: &Path) -> Result<Vec<PendingBatch>, PersistError> {
    let entries = fs::read_dir(dir).map_err(|e| PersistError::Read {
        path: dir.display().to_string(),
        error: e.to_string(),
    })?;

    let mut pending = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PersistError::Read {
            path: dir.display().to_string(),
            error: e.to_string(),
        })?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.starts_with(BATCH_FILE_PREFIX) {
            continue;
        }

        let path = entry.path();
        let raw = fs::read(&path).map_err(|e| PersistError::Read {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        let stored: StoredBatch =
            serde_json::from_slice(&raw).map_err(|e| PersistError::Decode {
                path: path.display().to_string(),
                error: e.to_string(),
            })?;
        let instructions = stored
            .instructions
            .iter()
            .map(StoredInstruction::decode)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| PersistError::Decode {
                path: path.display().to_string(),
                error: e.to_string(),
            })?;
        pending.push(PendingBatch {
            index: stored.index,
            instructions,
        });
    }
    Ok(pending)
}

#[cfg(test)]
mod tests {
    use solana_sdk::signature::Signer;

    use crate::tracker::mark_bit_instruction;

    use super::*;

    fn temp_job_root() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("spray-store-{}", rand::random::<u64>()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample_batch(index: u32) -> PendingBatch {
        let payer = Pubkey::new_unique();
        let tracker = Pubkey::new_unique();
        PendingBatch {
            index,
            instructions: vec![
                Instruction {
                    program_id: Pubkey::new_unique(),
                    accounts: vec![
                        AccountMeta::new(Pubkey::new_unique(), true),
                        AccountMeta::new_readonly(Pubkey::new_unique(), false),
                    ],
                    data: vec![1, 2, 3, 255],
                },
                mark_bit_instruction(&payer, &tracker, index),
            ],
        }
    }

    #[test]
    fn test_persist_load_round_trip() {
        let root = temp_job_root();
        let tracker = Pubkey::new_unique();
        let dir = create_job_dir(&root, &tracker).unwrap();

        let batches = vec![sample_batch(0), sample_batch(1), sample_batch(2)];
        persist(&dir, &batches).unwrap();

        let mut loaded = load_pending(&dir).unwrap();
        loaded.sort_by_key(|b| b.index);
        assert_eq!(loaded, batches);

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_load_ignores_key_file() {
        let root = temp_job_root();
        let keypair = Keypair::new();
        let dir = create_job_dir(&root, &keypair.pubkey()).unwrap();

        write_tracker_keypair(&dir, &keypair).unwrap();
        persist(&dir, &[sample_batch(0)]).unwrap();

        let loaded = load_pending(&dir).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].index, 0);

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_load_is_idempotent() {
        let root = temp_job_root();
        let tracker = Pubkey::new_unique();
        let dir = create_job_dir(&root, &tracker).unwrap();
        persist(&dir, &[sample_batch(0), sample_batch(1)]).unwrap();

        let first = load_pending(&dir).unwrap();
        let second = load_pending(&dir).unwrap();
        assert_eq!(first, second);

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_malformed_batch_file_fails_load() {
        let root = temp_job_root();
        let tracker = Pubkey::new_unique();
        let dir = create_job_dir(&root, &tracker).unwrap();

        persist(&dir, &[sample_batch(0)]).unwrap();
        fs::write(dir.join("_1"), b"{ truncated").unwrap();

        assert!(matches!(
            load_pending(&dir),
            Err(PersistError::Decode { .. })
        ));

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_tracker_keypair_round_trip() {
        let root = temp_job_root();
        let keypair = Keypair::new();
        let dir = create_job_dir(&root, &keypair.pubkey()).unwrap();

        write_tracker_keypair(&dir, &keypair).unwrap();
        let restored = read_tracker_keypair(&dir).unwrap();
        assert_eq!(restored.to_bytes(), keypair.to_bytes());

        fs::remove_dir_all(&root).unwrap();
    }
}
