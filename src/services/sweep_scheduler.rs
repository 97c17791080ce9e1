use sqlx::PgPool;
use tracing::{info, warn};

use crate::services::roster::RosterService;

/// Spawn the background task that periodically drops votes left behind by
/// students who were removed from the roster between submissions.
pub fn start(pool: PgPool, interval_secs: u64) {
    tokio::spawn(async move {
        info!("Roster sweep scheduler started (every {interval_secs}s)");
        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(interval_secs)).await;

            if let Err(e) = RosterService::sweep_unrostered_votes(&pool).await {
                warn!("roster sweep failed: {e}");
            }
        }
    });
}
