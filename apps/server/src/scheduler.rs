//! Background scheduler for periodic market refresh.
//!
//! Each tick runs a full staleness-gated pass, so a short interval only costs
//! a few store reads while every dataset is fresh.

use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{info, warn};

use coinpulse_core::refresh::DatasetKind;

use crate::main_lib::AppState;

/// Initial delay before the first pass, to let the server finish starting.
const INITIAL_DELAY_SECS: u64 = 10;

/// Starts the background refresh scheduler.
pub fn start_refresh_scheduler(state: Arc<AppState>, every: Duration) {
    tokio::spawn(async move {
        info!("Refresh scheduler started ({}s interval)", every.as_secs());

        tokio::time::sleep(Duration::from_secs(INITIAL_DELAY_SECS)).await;

        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            run_scheduled_refresh(&state).await;
        }
    });
}

/// Runs a single scheduled refresh pass.
async fn run_scheduled_refresh(state: &Arc<AppState>) {
    let summary = state.coordinator.refresh_all().await;

    for kind in DatasetKind::ALL {
        let result = summary.get(kind);
        match (&result.error, result.updated) {
            (Some(error), _) => warn!(
                "Scheduled refresh of {} failed ({:?}): {}",
                kind,
                error,
                result.message.as_deref().unwrap_or_default()
            ),
            (None, true) => info!("Scheduled refresh updated {}", kind),
            (None, false) => {}
        }
    }
}
