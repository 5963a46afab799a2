mod auth;
mod catalog;
mod config;
mod credentials;
mod errors;
mod firestore;
mod seed;
mod store;

use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::credentials::load_service_account;
use crate::errors::SeedError;
use crate::firestore::FirestoreClient;
use crate::seed::{seed_vibes, VIBES_COLLECTION};

#[tokio::main]
async fn main() -> ExitCode {
    // Config first so RUST_LOG from .env reaches the subscriber
    let config = Config::from_env();

    let rust_log = config.as_ref().map(|c| c.rust_log.as_str()).unwrap_or("info");
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = seed_from(config).await;

    // The final report bypasses the log filter.
    let report = report(&result);
    if report.status == 0 {
        println!("{}", report.message);
    } else {
        eprintln!("{}", report.message);
    }
    ExitCode::from(report.status)
}

/// What the process prints and exits with once the run is over.
#[derive(Debug)]
struct Report {
    status: u8,
    message: String,
}

fn report(result: &Result<usize>) -> Report {
    let e = match result {
        Ok(count) => {
            return Report {
                status: 0,
                message: format!("Seeded {count} vibes into Firestore."),
            }
        }
        Err(e) => e,
    };

    let mut message = format!("Failed to seed vibes\n{e:#}");
    match e.downcast_ref::<SeedError>() {
        Some(SeedError::CommitIndeterminate(_)) => {
            message.push_str("\nThe batch may or may not have been applied")
        }
        Some(seed_error) if seed_error.batch_not_applied() => {
            message.push_str("\nThe batch was not applied; no vibes were written")
        }
        Some(_) => message.push_str("\nNo vibes were written"),
        None => {}
    }
    error!("Seeding failed: {e}");

    Report { status: 1, message }
}

async fn seed_from(config: Result<Config, SeedError>) -> Result<usize> {
    match config {
        Ok(config) => run(config).await,
        Err(e) => Err(e.into()),
    }
}

async fn run(config: Config) -> Result<usize> {
    info!("Starting vibe seeder v{}", env!("CARGO_PKG_VERSION"));

    let vibes = catalog::builtin()?;
    let report = catalog::validate(&vibes)?;
    info!(
        "Catalog holds {} vibes ({} dangling related ids)",
        report.count,
        report.dangling.len()
    );
    for d in &report.dangling {
        warn!("Vibe '{}' relates to unknown vibe '{}'", d.from, d.to);
    }

    let key = load_service_account(&config.credentials_path).await?;

    let client = FirestoreClient::connect(&config, &key)
        .await
        .context("Failed to initialise Firestore")?;

    let written = seed_vibes(&client, VIBES_COLLECTION, &vibes, Utc::now()).await?;
    Ok(written)
}
