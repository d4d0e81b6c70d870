//! Storage backend supervision.
//!
//! Connects the configured backend in the background, health-polls it and
//! reconnects with exponential backoff, toggling the shared degraded flag so
//! request handlers can answer 503 instead of hanging on a dead database.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::match_store::{MatchStore, StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Keep a store installed in the shared state, reconnecting as needed.
///
/// Never returns; run it as a background task.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn MatchStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        let store = match connect().await {
            Ok(store) => store,
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
                continue;
            }
        };

        state.install_store(store.clone()).await;
        info!("storage connection established; leaving degraded mode");
        delay = INITIAL_DELAY;

        // Poll until the store is lost for good, then fall through to a
        // fresh connection attempt.
        watch_health(&state, store).await;
        sleep(delay).await;
        delay = (delay * 2).min(MAX_DELAY);
    }
}

/// Health-poll an installed store. Returns once reconnect attempts are
/// exhausted and the store has been abandoned.
async fn watch_health(state: &SharedState, store: Arc<dyn MatchStore>) {
    loop {
        match store.health_check().await {
            Ok(()) => {
                if state.is_degraded() {
                    info!("storage healthy again; leaving degraded mode");
                    state.update_degraded(false);
                }
                sleep(HEALTH_POLL_INTERVAL).await;
            }
            Err(err) => {
                warn!(error = %err, "storage health check failed; entering degraded mode");
                state.update_degraded(true);

                if !attempt_reconnect(store.as_ref()).await {
                    warn!("exhausted storage reconnect attempts; dropping the store");
                    state.clear_store().await;
                    return;
                }

                state.update_degraded(false);
                info!("storage reconnection succeeded");
            }
        }
    }
}

/// Try a bounded number of reconnects with backoff.
async fn attempt_reconnect(store: &dyn MatchStore) -> bool {
    let mut delay = INITIAL_DELAY;
    for attempt in 0..MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => return true,
            Err(err) => {
                warn!(attempt, error = %err, "storage reconnect attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
    false
}
