//! Periodic match status advancement.
//!
//! One bulk conditional update per tick: every stored-scheduled match whose
//! kick-off has passed becomes ongoing. The first tick fires immediately at
//! startup so matches that started during downtime are caught up before the
//! regular cadence begins. Read paths derive the same correction in the
//! meantime, so the scheduler only has to keep the stored values honest.

use std::time::{Duration, SystemTime};

use tokio::{sync::watch, time::MissedTickBehavior};
use tracing::{info, warn};

use crate::{error::ServiceError, state::SharedState};

/// Upper bound on one tick, so a hung store call cannot starve the timer.
const TICK_TIMEOUT: Duration = Duration::from_secs(30);

/// One advancement pass. Returns the number of matches moved to ongoing.
pub async fn run_once(state: &SharedState) -> Result<u64, ServiceError> {
    let store = state.require_store().await?;
    let advanced = store.advance_started_matches(SystemTime::now()).await?;
    Ok(advanced)
}

/// Repeating status job. Stops when `shutdown` flips to `true` or its sender
/// is dropped.
pub async fn run(state: SharedState, period: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match tokio::time::timeout(TICK_TIMEOUT, run_once(&state)).await {
                    Ok(Ok(0)) => {}
                    Ok(Ok(advanced)) => info!(advanced, "matches kicked off"),
                    Ok(Err(err)) => {
                        warn!(error = %err, "status tick failed; retrying next tick");
                    }
                    Err(_) => warn!("status tick timed out"),
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("status scheduler stopping");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            match_store::{MatchStore, memory::MemoryMatchStore},
            models::{MatchEntity, MatchStatus},
        },
        services::notifier::LogOnlyGateway,
        state::AppState,
    };

    fn match_with(status: MatchStatus, starts_at: SystemTime) -> MatchEntity {
        let now = SystemTime::now();
        MatchEntity {
            id: Uuid::new_v4(),
            title: "Sunday five-a-side".into(),
            description: String::new(),
            location: "Riverside pitch".into(),
            sport: "football".into(),
            starts_at,
            max_players: 10,
            team_a_name: "Team A".into(),
            team_b_name: "Team B".into(),
            team_a_score: 0,
            team_b_score: 0,
            status,
            owner_id: Uuid::new_v4(),
            reminder_sent: false,
            created_at: now,
            updated_at: now,
        }
    }

    async fn test_state() -> (SharedState, MemoryMatchStore) {
        let store = MemoryMatchStore::new();
        let state = AppState::new(AppConfig::default(), Arc::new(LogOnlyGateway));
        state.install_store(Arc::new(store.clone())).await;
        (state, store)
    }

    #[tokio::test]
    async fn advances_every_past_due_match_in_one_pass() {
        let (state, store) = test_state().await;
        let now = SystemTime::now();

        let mut due_ids = Vec::new();
        for minutes in 1..=5u64 {
            let entity = match_with(
                MatchStatus::Scheduled,
                now - Duration::from_secs(minutes * 60),
            );
            due_ids.push(entity.id);
            store.seed_match(entity).await;
        }
        let future = match_with(MatchStatus::Scheduled, now + Duration::from_secs(3600));
        store.seed_match(future.clone()).await;

        assert_eq!(run_once(&state).await.unwrap(), 5);
        for id in due_ids {
            let stored = store.find_match(id).await.unwrap().unwrap();
            assert_eq!(stored.status, MatchStatus::Ongoing);
        }
        let stored = store.find_match(future.id).await.unwrap().unwrap();
        assert_eq!(stored.status, MatchStatus::Scheduled);
    }

    #[tokio::test]
    async fn pass_with_nothing_due_writes_nothing() {
        let (state, store) = test_state().await;
        let now = SystemTime::now();
        let ongoing = match_with(MatchStatus::Ongoing, now - Duration::from_secs(60));
        let finished = match_with(MatchStatus::Finished, now - Duration::from_secs(60));
        store.seed_match(ongoing.clone()).await;
        store.seed_match(finished.clone()).await;

        assert_eq!(run_once(&state).await.unwrap(), 0);
        let stored = store.find_match(finished.id).await.unwrap().unwrap();
        assert_eq!(stored.status, MatchStatus::Finished);
    }

    #[tokio::test]
    async fn second_pass_finds_nothing_left() {
        let (state, store) = test_state().await;
        let now = SystemTime::now();
        store
            .seed_match(match_with(
                MatchStatus::Scheduled,
                now - Duration::from_secs(60),
            ))
            .await;

        assert_eq!(run_once(&state).await.unwrap(), 1);
        assert_eq!(run_once(&state).await.unwrap(), 0);
    }
}
