use std::{fs, path::PathBuf, str::FromStr};

use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};

use crate::{
    cli::{ResumeArgs, SendArgs},
    errors::ConfigError,
};

/// Everything a job run needs, passed explicitly into each component.
/// No process-wide connection or mint singletons.
#[derive(Debug)]
pub struct JobConfig {
    pub rpc_url: String,
    pub mint: Pubkey,
    pub payer_keypair: Keypair,
    pub group_size: usize,
    pub job_root: PathBuf,
}

impl Clone for JobConfig {
    fn clone(&self) -> Self {
        Self {
            rpc_url: self.rpc_url.clone(),
            mint: self.mint,
            payer_keypair: Keypair::from_bytes(&self.payer_keypair.to_bytes()).unwrap(),
            group_size: self.group_size,
            job_root: self.job_root.clone(),
        }
    }
}

impl JobConfig {
    pub fn from_send_args(args: &SendArgs) -> Result<Self, ConfigError> {
        Ok(Self {
            rpc_url: args.rpc_url.clone(),
            mint: parse_mint(&args.mint)?,
            payer_keypair: load_keypair(&args.payer)?,
            group_size: args.group_size,
            job_root: PathBuf::from(&args.job_root),
        })
    }

    pub fn from_resume_args(args: &ResumeArgs) -> Result<Self, ConfigError> {
        Ok(Self {
            rpc_url: args.rpc_url.clone(),
            mint: parse_mint(&args.mint)?,
            payer_keypair: load_keypair(&args.payer)?,
            group_size: crate::constants::DEFAULT_GROUP_SIZE,
            job_root: PathBuf::from(&args.job_root),
        })
    }

    pub fn payer_pubkey(&self) -> Pubkey {
        self.payer_keypair.pubkey()
    }
}

fn parse_mint(value: &str) -> Result<Pubkey, ConfigError> {
    Pubkey::from_str(value).map_err(|error| ConfigError::InvalidPubkey {
        field: "mint",
        error,
    })
}

/// Loads a keypair from a solana-cli style JSON byte array file.
pub fn load_keypair(path: &str) -> Result<Keypair, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|e| ConfigError::KeypairFile {
        path: path.to_string(),
        error: e.to_string(),
    })?;
    let bytes: Vec<u8> = serde_json::from_str(&raw).map_err(|e| ConfigError::InvalidKeypair {
        path: path.to_string(),
        error: e.to_string(),
    })?;
    Keypair::from_bytes(&bytes).map_err(|e| ConfigError::InvalidKeypair {
        path: path.to_string(),
        error: e.to_string(),
    })
}
