/// Remove stale ledger rows
/// Run periodically (e.g., via cron job: */15 * * * * /app/purge-stale)
///
/// Usage: purge-stale [--skip-votes] [--skip-complaints]
///   --skip-votes      : Leave unrostered vote rows alone
///   --skip-complaints : Leave stale complaints alone

use clap::Parser;
use sqlx::postgres::PgPoolOptions;

use messhall_api::services::complaints::ComplaintLedger;
use messhall_api::services::roster::RosterService;

#[derive(Parser)]
#[command(name = "purge-stale", about = "Remove unrostered votes and stale complaints")]
struct Args {
    /// Skip the unrostered-vote sweep
    #[arg(long)]
    skip_votes: bool,

    /// Skip the stale-complaint purge
    #[arg(long)]
    skip_complaints: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();

    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL environment variable not set");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Starting stale-data purge...");

    if !args.skip_votes {
        let swept = RosterService::sweep_unrostered_votes(&pool).await?;
        tracing::info!("Swept {} vote rows from unrostered students", swept);
    }

    if !args.skip_complaints {
        let today = chrono::Local::now().date_naive();
        let purged = ComplaintLedger::sweep_stale(&pool, today).await?;
        tracing::info!("Purged {} complaints not from {}", purged, today);
    }

    tracing::info!("Purge completed");

    Ok(())
}
