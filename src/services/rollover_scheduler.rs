use chrono::Local;
use tracing::{info, warn};

use crate::services::menu_window::MenuWindowManager;
use crate::services::metrics::ROLLOVERS_COUNTER;

/// Spawn the background task that keeps the menu window anchored to the
/// local calendar. Each tick re-reads the clock, so the first tick after
/// midnight performs the rollover; the check itself is idempotent per day.
pub fn start(manager: MenuWindowManager, tick_secs: u64) {
    tokio::spawn(async move {
        info!("Menu rollover scheduler started (every {tick_secs}s)");
        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(tick_secs)).await;

            let today = Local::now().date_naive();
            match manager.rollover_if_needed(today).await {
                Ok(true) => {
                    ROLLOVERS_COUNTER.inc();
                    info!("menu window rolled over to {today}");
                }
                Ok(false) => {}
                // Leave the window as-is; the next tick retries.
                Err(e) => warn!("menu rollover check failed: {e}"),
            }
        }
    });
}
