use bulk_meta::cli::Cli;
use bulk_meta::utils::{init_tracing, BulkMetaError, ExitStatus, LoggingConfig};
use clap::Parser;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match try_main(cli).await {
        Ok(()) => ExitCode::from(ExitStatus::Success.code()),
        Err(err) => {
            tracing::error!("{:#}", err);
            let status = err
                .downcast_ref::<BulkMetaError>()
                .map(BulkMetaError::exit_status)
                .unwrap_or(ExitStatus::IoFailure);
            ExitCode::from(status.code())
        }
    }
}

async fn try_main(cli: Cli) -> anyhow::Result<()> {
    let config = cli.into_app_config();

    let logging = config
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    if let Err(e) = init_tracing(&logging) {
        let _ = init_tracing(&LoggingConfig::default());
        return Err(e.into());
    }
    tracing::info!("Logging configured...");

    let run_config = config?.into_run_config()?;
    tracing::debug!(config = ?run_config, "Resolved configuration");

    let summary = bulk_meta::run(&run_config).await?;
    if summary.stats.batches_failed > 0 {
        tracing::warn!(
            "{} batch(es) were rejected; see the log above. Outcomes are in {}",
            summary.stats.batches_failed,
            summary.processed_file.display()
        );
    }

    Ok(())
}
