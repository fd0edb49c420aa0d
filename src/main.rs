use std::path::Path;

use clap::Parser;
use spray::{
    cli::{Cli, Commands},
    operations,
    rpc::SolanaConnection,
    telemetry::setup_telemetry,
    JobConfig,
};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_telemetry();

    let cli = Cli::parse();
    match cli.command {
        Commands::Send(args) => {
            let config = JobConfig::from_send_args(&args)?;
            let conn = SolanaConnection::new(&config.rpc_url, None);
            let summary =
                operations::prepare_and_send(&conn, &config, Path::new(&args.recipients)).await?;
            info!(
                "Run complete: {} sent, {} failed, job dir {}",
                summary.sent,
                summary.failed,
                summary.job_dir.display()
            );
            if summary.failed > 0 {
                info!(
                    "Rerun with: spray resume {} to retry failed batches",
                    summary.job_dir.display()
                );
            }
        }
        Commands::Resume(args) => {
            let config = JobConfig::from_resume_args(&args)?;
            let conn = SolanaConnection::new(&config.rpc_url, None);
            let summary = operations::resume(&conn, &config, Path::new(&args.job_dir)).await?;
            info!(
                "Resume complete: {} sent, {} failed, {} already confirmed",
                summary.sent, summary.failed, summary.skipped
            );
        }
    }
    Ok(())
}
