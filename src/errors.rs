use std::io;

use solana_client::client_error::ClientError;
use solana_program::program_error::ProgramError;
use solana_sdk::pubkey::{ParsePubkeyError, Pubkey};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SprayError {
    #[error("Setup error: {0}")]
    Setup(#[from] SetupError),

    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    #[error("Persist error: {0}")]
    Persist(#[from] PersistError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Program error: {0}")]
    Program(#[from] ProgramError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Failed to create idempotency map account {pubkey}: {error}")]
    MapCreation { pubkey: Pubkey, error: String },

    #[error("Invalid tracker keypair data: {0}")]
    InvalidKeypair(String),
}

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Group size must be greater than zero")]
    ZeroGroupSize,

    #[error("Recipient list is empty")]
    NoRecipients,

    #[error("Invalid recipient address {address}: {error}")]
    InvalidAddress { address: String, error: String },

    #[error("Invalid amount for recipient {address}: expected an unsigned integer")]
    InvalidAmount { address: String },

    #[error("Failed to read recipients file {path}: {error}")]
    RecipientsFile { path: String, error: String },

    #[error("Failed to parse recipients file {path}: {error}")]
    RecipientsParse { path: String, error: String },
}

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Failed to create job directory {path}: {error}")]
    CreateDir { path: String, error: String },

    #[error("Failed to write {path}: {error}")]
    Write { path: String, error: String },

    #[error("Failed to read {path}: {error}")]
    Read { path: String, error: String },

    #[error("Malformed batch file {path}: {error}")]
    Decode { path: String, error: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid keypair data in {path}: {error}")]
    InvalidKeypair { path: String, error: String },

    #[error("Failed to read keypair file {path}: {error}")]
    KeypairFile { path: String, error: String },

    #[error("Invalid pubkey: {field} - {error}")]
    InvalidPubkey {
        field: &'static str,
        error: ParsePubkeyError,
    },
}

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("ClientError: {0}")]
    ClientError(#[from] Box<ClientError>),

    #[error("IoError: {0}")]
    IoError(#[from] Box<io::Error>),

    #[error("Error: `{0}`")]
    CustomError(String),
}

impl From<ClientError> for RpcError {
    fn from(err: ClientError) -> Self {
        RpcError::ClientError(Box::new(err))
    }
}

impl From<io::Error> for RpcError {
    fn from(err: io::Error) -> Self {
        RpcError::IoError(Box::new(err))
    }
}
