use clap::{Parser, Subcommand};

use crate::constants::{DEFAULT_JOB_ROOT, DEFAULT_MINT, DEFAULT_RPC_URL};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Plan, persist and broadcast a fresh distribution run.
    Send(SendArgs),
    /// Re-broadcast the pending batches of an existing job directory.
    Resume(ResumeArgs),
}

#[derive(Parser, Clone, Debug)]
pub struct SendArgs {
    #[arg(long, env = "SPRAY_RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    #[arg(long, env = "SPRAY_MINT", default_value = DEFAULT_MINT)]
    pub mint: String,

    /// Path to the payer keypair (JSON byte array).
    #[arg(long, env = "SPRAY_PAYER", default_value = "sender.json")]
    pub payer: String,

    /// Path to the recipients file (JSON map of address to amount).
    #[arg(long, env = "SPRAY_RECIPIENTS", default_value = "recips.json")]
    pub recipients: String,

    #[arg(long, env = "SPRAY_GROUP_SIZE", default_value = "9")]
    pub group_size: usize,

    /// Directory under which per-run job directories are created.
    #[arg(long, env = "SPRAY_JOB_ROOT", default_value = DEFAULT_JOB_ROOT)]
    pub job_root: String,
}

#[derive(Parser, Clone, Debug)]
pub struct ResumeArgs {
    #[arg(long, env = "SPRAY_RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    #[arg(long, env = "SPRAY_MINT", default_value = DEFAULT_MINT)]
    pub mint: String,

    #[arg(long, env = "SPRAY_PAYER", default_value = "sender.json")]
    pub payer: String,

    /// Job directory of the run to resume.
    pub job_dir: String,

    #[arg(long, env = "SPRAY_JOB_ROOT", default_value = DEFAULT_JOB_ROOT)]
    pub job_root: String,
}
