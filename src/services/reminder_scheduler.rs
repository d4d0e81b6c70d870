//! Periodic reminder fan-out.
//!
//! One generic pass run as two instances: match reminders (one-hour notice)
//! and event reminders (two-hour notice). A pass finds entities entering the
//! notice window, persists one notification per participant and flips the
//! entity's `reminder_sent` flag in the same store commit — the flag flips
//! even for entities with zero participants, which is what makes the pass
//! idempotent. Push delivery happens after the commit, fire-and-forget.

use std::{sync::Arc, time::Duration, time::SystemTime};

use futures::future::BoxFuture;
use tokio::{sync::watch, time::MissedTickBehavior};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        match_store::{MatchStore, StorageResult},
        models::{NotificationEntity, ResourceKind},
    },
    error::ServiceError,
    services::notifier::PushMessage,
    state::SharedState,
};

/// Upper bound on one tick, so a hung store call cannot starve the timer.
const TICK_TIMEOUT: Duration = Duration::from_secs(30);

/// An entity eligible for a reminder in the current window.
#[derive(Debug, Clone)]
pub struct ReminderCandidate {
    /// Match or event id.
    pub id: Uuid,
    /// Display title, used in the notification body.
    pub title: String,
}

/// One feed of remindable entities (matches or events).
pub trait ReminderSource: Send + Sync {
    /// Tag used in logs.
    fn kind(&self) -> &'static str;

    /// Resource kind stamped on the produced notifications.
    fn resource_kind(&self) -> ResourceKind;

    /// Entities entering the window `(now, until]` that have not been
    /// reminded yet.
    fn due(
        &self,
        store: &Arc<dyn MatchStore>,
        now: SystemTime,
        until: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Vec<ReminderCandidate>>>;

    /// Users to notify for one entity.
    fn recipients(
        &self,
        store: &Arc<dyn MatchStore>,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<Uuid>>>;

    /// Persist the batch and flip the entity's reminder flag in one commit.
    fn commit(
        &self,
        store: &Arc<dyn MatchStore>,
        id: Uuid,
        notifications: Vec<NotificationEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;

    /// Title and body of the reminder for one entity.
    fn message(&self, candidate: &ReminderCandidate) -> (String, String);
}

/// Reminder feed over scheduled matches.
pub struct MatchReminders;

impl ReminderSource for MatchReminders {
    fn kind(&self) -> &'static str {
        "match"
    }

    fn resource_kind(&self) -> ResourceKind {
        ResourceKind::Match
    }

    fn due(
        &self,
        store: &Arc<dyn MatchStore>,
        now: SystemTime,
        until: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Vec<ReminderCandidate>>> {
        let fetch = store.find_matches_due_reminder(now, until);
        Box::pin(async move {
            Ok(fetch
                .await?
                .into_iter()
                .map(|entity| ReminderCandidate {
                    id: entity.id,
                    title: entity.title,
                })
                .collect())
        })
    }

    fn recipients(
        &self,
        store: &Arc<dyn MatchStore>,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<Uuid>>> {
        let fetch = store.list_match_subscriptions(id);
        Box::pin(async move {
            Ok(fetch
                .await?
                .into_iter()
                .map(|subscription| subscription.user_id)
                .collect())
        })
    }

    fn commit(
        &self,
        store: &Arc<dyn MatchStore>,
        id: Uuid,
        notifications: Vec<NotificationEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        store.commit_match_reminder(id, notifications)
    }

    fn message(&self, candidate: &ReminderCandidate) -> (String, String) {
        (
            "Match reminder".into(),
            format!("{} kicks off within the hour", candidate.title),
        )
    }
}

/// Reminder feed over upcoming platform events.
pub struct EventReminders;

impl ReminderSource for EventReminders {
    fn kind(&self) -> &'static str {
        "event"
    }

    fn resource_kind(&self) -> ResourceKind {
        ResourceKind::Event
    }

    fn due(
        &self,
        store: &Arc<dyn MatchStore>,
        now: SystemTime,
        until: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Vec<ReminderCandidate>>> {
        let fetch = store.find_events_due_reminder(now, until);
        Box::pin(async move {
            Ok(fetch
                .await?
                .into_iter()
                .map(|entity| ReminderCandidate {
                    id: entity.id,
                    title: entity.title,
                })
                .collect())
        })
    }

    fn recipients(
        &self,
        store: &Arc<dyn MatchStore>,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<Uuid>>> {
        store.list_event_attendees(id)
    }

    fn commit(
        &self,
        store: &Arc<dyn MatchStore>,
        id: Uuid,
        notifications: Vec<NotificationEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        store.commit_event_reminder(id, notifications)
    }

    fn message(&self, candidate: &ReminderCandidate) -> (String, String) {
        (
            "Event reminder".into(),
            format!("{} starts in the next two hours", candidate.title),
        )
    }
}

/// One reminder pass. Returns how many entities were processed.
///
/// An empty window is a silent no-op. Errors abort the remainder of the pass;
/// entities committed before the error keep their flag, the rest are picked
/// up again next tick.
pub async fn run_once(
    state: &SharedState,
    source: &dyn ReminderSource,
    window: Duration,
) -> Result<u64, ServiceError> {
    let store = state.require_store().await?;
    let now = SystemTime::now();
    let due = source.due(&store, now, now + window).await?;
    if due.is_empty() {
        return Ok(0);
    }

    let mut processed = 0;
    for candidate in due {
        let recipients = source.recipients(&store, candidate.id).await?;
        let (title, body) = source.message(&candidate);
        let created_at = SystemTime::now();
        let notifications: Vec<NotificationEntity> = recipients
            .into_iter()
            .map(|user_id| NotificationEntity {
                id: Uuid::new_v4(),
                user_id,
                title: title.clone(),
                body: body.clone(),
                resource_id: candidate.id,
                resource_kind: source.resource_kind(),
                created_at,
            })
            .collect();
        let batch: Vec<PushMessage> = notifications.iter().map(Into::into).collect();

        // Records first, flag in the same commit; only then push delivery,
        // which the flag decision must never wait on.
        source.commit(&store, candidate.id, notifications).await?;
        if !batch.is_empty() {
            let gateway = state.gateway();
            tokio::spawn(async move { gateway.deliver(batch).await });
        }
        processed += 1;
    }

    Ok(processed)
}

/// Repeating reminder job. Stops when `shutdown` flips to `true` or its
/// sender is dropped.
pub async fn run(
    state: SharedState,
    source: Arc<dyn ReminderSource>,
    window: Duration,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let tick = run_once(&state, source.as_ref(), window);
                match tokio::time::timeout(TICK_TIMEOUT, tick).await {
                    Ok(Ok(0)) => {}
                    Ok(Ok(processed)) => {
                        info!(kind = source.kind(), processed, "reminders dispatched");
                    }
                    Ok(Err(err)) => {
                        warn!(
                            kind = source.kind(),
                            error = %err,
                            "reminder tick failed; retrying next tick"
                        );
                    }
                    Err(_) => {
                        warn!(kind = source.kind(), "reminder tick timed out");
                    }
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!(kind = source.kind(), "reminder scheduler stopping");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            match_store::memory::MemoryMatchStore,
            models::{
                EventAttendanceEntity, EventEntity, EventStatus, MatchEntity, MatchStatus,
                SubscriptionEntity, TeamSide,
            },
        },
        services::notifier::LogOnlyGateway,
        state::AppState,
    };

    async fn test_state() -> (SharedState, MemoryMatchStore) {
        let store = MemoryMatchStore::new();
        let state = AppState::new(AppConfig::default(), Arc::new(LogOnlyGateway));
        state.install_store(Arc::new(store.clone())).await;
        (state, store)
    }

    fn match_starting_in(offset: Duration) -> MatchEntity {
        let now = SystemTime::now();
        MatchEntity {
            id: Uuid::new_v4(),
            title: "Sunday five-a-side".into(),
            description: String::new(),
            location: "Riverside pitch".into(),
            sport: "football".into(),
            starts_at: now + offset,
            max_players: 10,
            team_a_name: "Team A".into(),
            team_b_name: "Team B".into(),
            team_a_score: 0,
            team_b_score: 0,
            status: MatchStatus::Scheduled,
            owner_id: Uuid::new_v4(),
            reminder_sent: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn event_starting_in(offset: Duration) -> EventEntity {
        let now = SystemTime::now();
        EventEntity {
            id: Uuid::new_v4(),
            title: "Summer tournament draw".into(),
            location: "Clubhouse".into(),
            starts_at: now + offset,
            status: EventStatus::Upcoming,
            reminder_sent: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn second_pass_is_a_no_op() {
        let (state, store) = test_state().await;
        let entity = match_starting_in(Duration::from_secs(1800));
        store.seed_match(entity.clone()).await;
        for user_id in [Uuid::new_v4(), Uuid::new_v4()] {
            store
                .create_subscription(SubscriptionEntity {
                    id: Uuid::new_v4(),
                    match_id: entity.id,
                    user_id,
                    side: TeamSide::A,
                    created_at: SystemTime::now(),
                })
                .await
                .unwrap();
        }

        let window = Duration::from_secs(3600);
        let processed = run_once(&state, &MatchReminders, window).await.unwrap();
        assert_eq!(processed, 1);
        assert_eq!(store.notifications().await.len(), 2);
        let stored = store.find_match(entity.id).await.unwrap().unwrap();
        assert!(stored.reminder_sent);

        // Same store state again: the flag keeps the match out of the window.
        let processed = run_once(&state, &MatchReminders, window).await.unwrap();
        assert_eq!(processed, 0);
        assert_eq!(store.notifications().await.len(), 2);
    }

    #[tokio::test]
    async fn zero_attendee_event_is_flagged_without_notifications() {
        let (state, store) = test_state().await;
        let entity = event_starting_in(Duration::from_secs(90 * 60));
        store.seed_event(entity.clone()).await;

        let processed = run_once(&state, &EventReminders, Duration::from_secs(7200))
            .await
            .unwrap();
        assert_eq!(processed, 1);
        assert!(store.notifications().await.is_empty());
        assert!(store.event(entity.id).await.unwrap().reminder_sent);
    }

    #[tokio::test]
    async fn events_beyond_the_window_are_left_alone() {
        let (state, store) = test_state().await;
        let entity = event_starting_in(Duration::from_secs(3 * 3600));
        store.seed_event(entity.clone()).await;

        let processed = run_once(&state, &EventReminders, Duration::from_secs(7200))
            .await
            .unwrap();
        assert_eq!(processed, 0);
        assert!(!store.event(entity.id).await.unwrap().reminder_sent);
    }

    #[tokio::test]
    async fn attendees_each_get_one_notification() {
        let (state, store) = test_state().await;
        let entity = event_starting_in(Duration::from_secs(3600));
        store.seed_event(entity.clone()).await;
        let attendees = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        for user_id in attendees {
            store
                .seed_attendance(EventAttendanceEntity {
                    id: Uuid::new_v4(),
                    event_id: entity.id,
                    user_id,
                    created_at: SystemTime::now(),
                })
                .await;
        }

        run_once(&state, &EventReminders, Duration::from_secs(7200))
            .await
            .unwrap();

        let notifications = store.notifications().await;
        assert_eq!(notifications.len(), 3);
        for notification in &notifications {
            assert_eq!(notification.resource_id, entity.id);
            assert_eq!(notification.resource_kind, ResourceKind::Event);
            assert!(attendees.contains(&notification.user_id));
        }
    }

    #[tokio::test]
    async fn degraded_mode_fails_the_tick() {
        let state = AppState::new(AppConfig::default(), Arc::new(LogOnlyGateway));
        let err = run_once(&state, &MatchReminders, Duration::from_secs(3600))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));
    }
}
