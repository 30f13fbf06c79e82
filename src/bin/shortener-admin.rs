use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use shortener::config::Config;
use shortener::encoding;
use shortener::service::ShorteningService;
use shortener::storage::{self, Storage};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "shortener-admin")]
#[command(about = "URL shortener maintenance CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write short codes for records that were left without one
    Reconcile {
        /// Maximum number of records to repair in this pass
        #[arg(long, default_value_t = 1000)]
        limit: i64,
    },
    /// Show the stored mapping for a short code
    Show {
        code: String,
    },
    /// Print the short code derived from a record id
    Encode {
        id: u64,
    },
    /// Print the record id a short code was derived from
    Decode {
        code: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Encode { id } => {
            println!("{}", encoding::encode(id));
        }
        Commands::Decode { code } => match encoding::decode(&code) {
            Some(id) => println!("{id}"),
            None => bail!("'{code}' is not a valid short code"),
        },
        Commands::Reconcile { limit } => {
            let config = Config::from_env()?;
            let storage = open_storage(&config).await?;
            let service = ShorteningService::new(storage, config.duplicate_policy);

            let repaired = service
                .reconcile_missing_codes(limit)
                .await
                .context("reconciliation failed")?;

            if repaired == 0 {
                println!("No records without a short code.");
            } else {
                println!("✓ Repaired {repaired} record(s)");
            }
        }
        Commands::Show { code } => {
            let storage = open_storage(&Config::from_env()?).await?;

            match storage.get_by_code(&code).await? {
                Some(mapping) => {
                    let created_at = chrono::DateTime::from_timestamp(mapping.created_at, 0)
                        .map(|dt| dt.to_rfc3339())
                        .unwrap_or_else(|| mapping.created_at.to_string());

                    println!("{:<12} {}", "ID", mapping.id);
                    println!("{:<12} {}", "Code", mapping.short_code);
                    println!("{:<12} {}", "URL", mapping.original_url);
                    println!("{:<12} {}", "Clicks", mapping.click_count);
                    println!("{:<12} {}", "Created", created_at);
                }
                None => println!("⚠ No mapping found for '{code}'"),
            }
        }
    }

    Ok(())
}

async fn open_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    let storage = storage::connect(&config.database)
        .await
        .context("failed to connect to the database")?;

    // Ensure database is initialized
    storage.init().await?;
    Ok(storage)
}
