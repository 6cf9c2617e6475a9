use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use devicegen::{
    cli::{Cli, Command},
    commands,
    config::Settings,
};

/// Exit status when the batch stopped short because the keyspace ran out
const EXIT_PARTIAL: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> devicegen::Result<ExitCode> {
    let settings = Settings::new()?;
    info!("Configuration loaded");

    match cli.command {
        Command::Generate(args) => {
            let options = args.resolve(&settings)?;
            let report = commands::generate(&options).await?;

            println!(
                "Generated {}/{} devices -> {}",
                report.generated,
                report.requested,
                options.fixture_path.display()
            );
            println!("Snapshot: {}", options.snapshot_path.display());

            if let Some(failure) = &report.failure {
                warn!(
                    "Batch incomplete ({} missing): {}",
                    report.requested - report.generated,
                    failure
                );
                return Ok(ExitCode::from(EXIT_PARTIAL));
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Stats { snapshot } => {
            let path = snapshot.unwrap_or_else(|| PathBuf::from(&settings.snapshot_path));
            let stats = commands::stats(&path)?;

            if !stats.exists {
                println!("No snapshot at {}", path.display());
                return Ok(ExitCode::SUCCESS);
            }
            println!("Snapshot: {}", path.display());
            println!("  Serial numbers: {}", stats.serial_numbers);
            println!("  MAC addresses:  {}", stats.mac_addresses);
            println!(
                "  Last updated:   {}",
                stats
                    .last_updated
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "unknown".to_string())
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}
