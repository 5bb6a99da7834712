mod access;
mod entities;
mod errors;
mod settings;
mod storage;
mod web;

use clap::Parser;
use migration::MigratorTrait;
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "portcullis",
    version,
    about = "Data access governance service"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    // load settings
    let settings = settings::Settings::load(&cli.config)?;
    tracing::info!(?settings, "Loaded configuration");

    // init storage (database) and apply schema
    let db = storage::init(&settings.database).await?;
    migration::Migrator::up(&db, None).await.into_diagnostic()?;

    if settings.server.seed_demo_data {
        ensure_demo_request(&db).await?;
    }

    // start web server
    web::serve(settings, db).await?;
    Ok(())
}

async fn ensure_demo_request(db: &sea_orm::DatabaseConnection) -> Result<()> {
    use crate::access::requests::{self, ListFilter};

    let existing = requests::list(db, &ListFilter::default())
        .await
        .into_diagnostic()?;
    if existing.is_empty() {
        requests::submit(
            db,
            "user@company.com",
            "bigquery://demo.retail.sales_daily_gold",
            "READER",
            "Need the dataset for analysis and reporting.",
        )
        .await
        .into_diagnostic()?;
        tracing::info!("Seeded demo access request");
    }
    Ok(())
}
