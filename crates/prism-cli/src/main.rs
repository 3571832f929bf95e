//! Prism CLI: run upload notifications through the channel-splitting pipeline.
//!
//! Configuration comes from the environment (or `.env`); see `PrismConfig`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use prism_cli::{build_processor, read_notification};
use prism_core::{PrismConfig, RecordOutcome, UploadRecord};
use prism_infra::{init_telemetry, shutdown_telemetry, LogFormat};
use prism_worker::{NotificationQueue, NotificationQueueConfig};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "prism", about = "Split uploaded images into red, green and blue channels")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deliver a storage notification file, redelivering failed records
    Process {
        /// Path to the notification JSON
        file: std::path::PathBuf,
    },
    /// Split a single object
    Split {
        /// Source bucket
        #[arg(long)]
        bucket: String,
        /// Object key in the source bucket
        #[arg(long)]
        key: String,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_telemetry(LogFormat::from_env())?;

    let cli = Cli::parse();
    let config = PrismConfig::from_env().context("Load configuration")?;
    let processor = build_processor(&config).await?;

    let result = match cli.command {
        Commands::Process { file } => {
            let notification = read_notification(&file)?;
            let queue =
                NotificationQueue::new(processor, NotificationQueueConfig::from(&config));
            let log = queue.deliver_notification(&notification).await;
            print_json(&log)?;

            match log.last_response() {
                Some(response) if !response.is_ok() => {
                    Err(anyhow::anyhow!("Notification rejected: {}", response.body))
                }
                _ if log.is_fully_delivered() => Ok(()),
                _ => Err(anyhow::anyhow!(
                    "{} record(s) still failing after {} redelivery attempt(s)",
                    log.undelivered().len(),
                    log.redeliveries()
                )),
            }
        }
        Commands::Split { bucket, key } => {
            let record = UploadRecord::new(bucket, key);
            let outcome = processor.process_one(&record).await;
            let failed = outcome.needs_redelivery();
            print_json(&RecordOutcome { record, outcome })?;

            if failed {
                Err(anyhow::anyhow!("Record was not fully processed"))
            } else {
                Ok(())
            }
        }
    };

    shutdown_telemetry().await;
    result
}
