//! In-memory [`MatchStore`] backend.
//!
//! Backs local development without a database and doubles as the test
//! substitute for the MongoDB backend. Every trait method takes the inner
//! write lock for its whole body, so each operation is atomic exactly like a
//! single-statement database write.

use std::{collections::HashMap, sync::Arc, time::SystemTime};

use futures::future::BoxFuture;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{MatchStore, StorageResult};
use crate::dao::models::{
    EventAttendanceEntity, EventEntity, EventStatus, MatchEntity, MatchStatus, MatchUpdate,
    NotificationEntity, SubscriptionEntity, TeamSide,
};

/// Process-local store keeping every record in plain maps.
#[derive(Clone, Default)]
pub struct MemoryMatchStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    matches: HashMap<Uuid, MatchEntity>,
    subscriptions: HashMap<Uuid, SubscriptionEntity>,
    events: HashMap<Uuid, EventEntity>,
    attendance: Vec<EventAttendanceEntity>,
    notifications: Vec<NotificationEntity>,
}

impl MemoryMatchStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a match directly, bypassing the owner auto-subscription.
    ///
    /// Seeding helper for tests and local tooling; production writes go
    /// through the trait.
    pub async fn seed_match(&self, entity: MatchEntity) {
        self.inner.write().await.matches.insert(entity.id, entity);
    }

    /// Insert an event directly. The platform layer that owns event CRUD is
    /// outside this engine, so the trait has no event-write operation.
    pub async fn seed_event(&self, entity: EventEntity) {
        self.inner.write().await.events.insert(entity.id, entity);
    }

    /// Insert an attendance record directly.
    pub async fn seed_attendance(&self, entity: EventAttendanceEntity) {
        self.inner.write().await.attendance.push(entity);
    }

    /// Snapshot of every notification record created so far.
    pub async fn notifications(&self) -> Vec<NotificationEntity> {
        self.inner.read().await.notifications.clone()
    }

    /// Fetch an event by id, for test assertions on the reminder flag.
    pub async fn event(&self, id: Uuid) -> Option<EventEntity> {
        self.inner.read().await.events.get(&id).cloned()
    }
}

impl MatchStore for MemoryMatchStore {
    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.read().await.matches.get(&id).cloned()) })
    }

    fn list_matches(&self) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let guard = store.inner.read().await;
            let mut matches: Vec<MatchEntity> = guard.matches.values().cloned().collect();
            matches.sort_by_key(|entity| entity.starts_at);
            Ok(matches)
        })
    }

    fn create_match_with_owner(
        &self,
        entity: MatchEntity,
        owner_subscription: SubscriptionEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let mut guard = store.inner.write().await;
            guard.matches.insert(entity.id, entity);
            guard
                .subscriptions
                .insert(owner_subscription.id, owner_subscription);
            Ok(())
        })
    }

    fn update_match(
        &self,
        id: Uuid,
        update: MatchUpdate,
        updated_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut guard = store.inner.write().await;
            let Some(entity) = guard.matches.get_mut(&id) else {
                return Ok(None);
            };
            update.apply(entity, updated_at);
            Ok(Some(entity.clone()))
        })
    }

    fn delete_match_cascading(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let mut guard = store.inner.write().await;
            let existed = guard.matches.remove(&id).is_some();
            guard
                .subscriptions
                .retain(|_, subscription| subscription.match_id != id);
            Ok(existed)
        })
    }

    fn find_subscription(
        &self,
        match_id: Uuid,
        user_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<SubscriptionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let guard = store.inner.read().await;
            Ok(guard
                .subscriptions
                .values()
                .find(|subscription| {
                    subscription.match_id == match_id && subscription.user_id == user_id
                })
                .cloned())
        })
    }

    fn count_team_members(
        &self,
        match_id: Uuid,
        side: TeamSide,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            let guard = store.inner.read().await;
            Ok(guard
                .subscriptions
                .values()
                .filter(|subscription| {
                    subscription.match_id == match_id && subscription.side == side
                })
                .count() as u64)
        })
    }

    fn list_match_subscriptions(
        &self,
        match_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<SubscriptionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let guard = store.inner.read().await;
            let mut subscriptions: Vec<SubscriptionEntity> = guard
                .subscriptions
                .values()
                .filter(|subscription| subscription.match_id == match_id)
                .cloned()
                .collect();
            subscriptions.sort_by_key(|subscription| subscription.created_at);
            Ok(subscriptions)
        })
    }

    fn create_subscription(
        &self,
        subscription: SubscriptionEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .inner
                .write()
                .await
                .subscriptions
                .insert(subscription.id, subscription);
            Ok(())
        })
    }

    fn update_subscription_team(
        &self,
        id: Uuid,
        side: TeamSide,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            if let Some(subscription) = store.inner.write().await.subscriptions.get_mut(&id) {
                subscription.side = side;
            }
            Ok(())
        })
    }

    fn delete_subscription(
        &self,
        match_id: Uuid,
        user_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let mut guard = store.inner.write().await;
            let before = guard.subscriptions.len();
            guard.subscriptions.retain(|_, subscription| {
                !(subscription.match_id == match_id && subscription.user_id == user_id)
            });
            Ok(guard.subscriptions.len() != before)
        })
    }

    fn find_matches_due_reminder(
        &self,
        now: SystemTime,
        until: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let guard = store.inner.read().await;
            Ok(guard
                .matches
                .values()
                .filter(|entity| {
                    entity.status == MatchStatus::Scheduled
                        && !entity.reminder_sent
                        && entity.starts_at > now
                        && entity.starts_at <= until
                })
                .cloned()
                .collect())
        })
    }

    fn find_events_due_reminder(
        &self,
        now: SystemTime,
        until: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Vec<EventEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let guard = store.inner.read().await;
            Ok(guard
                .events
                .values()
                .filter(|entity| {
                    entity.status == EventStatus::Upcoming
                        && !entity.reminder_sent
                        && entity.starts_at > now
                        && entity.starts_at <= until
                })
                .cloned()
                .collect())
        })
    }

    fn list_event_attendees(&self, event_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<Uuid>>> {
        let store = self.clone();
        Box::pin(async move {
            let guard = store.inner.read().await;
            Ok(guard
                .attendance
                .iter()
                .filter(|attendance| attendance.event_id == event_id)
                .map(|attendance| attendance.user_id)
                .collect())
        })
    }

    fn commit_match_reminder(
        &self,
        match_id: Uuid,
        notifications: Vec<NotificationEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let mut guard = store.inner.write().await;
            guard.notifications.extend(notifications);
            if let Some(entity) = guard.matches.get_mut(&match_id) {
                entity.reminder_sent = true;
            }
            Ok(())
        })
    }

    fn commit_event_reminder(
        &self,
        event_id: Uuid,
        notifications: Vec<NotificationEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let mut guard = store.inner.write().await;
            guard.notifications.extend(notifications);
            if let Some(entity) = guard.events.get_mut(&event_id) {
                entity.reminder_sent = true;
            }
            Ok(())
        })
    }

    fn advance_started_matches(
        &self,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            let mut guard = store.inner.write().await;
            let mut advanced = 0;
            for entity in guard.matches.values_mut() {
                if entity.status == MatchStatus::Scheduled && entity.starts_at <= now {
                    entity.status = MatchStatus::Ongoing;
                    advanced += 1;
                }
            }
            Ok(advanced)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::dao::models::MatchStatus;

    fn sample_match(starts_at: SystemTime) -> MatchEntity {
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
            status: MatchStatus::Scheduled,
            owner_id: Uuid::new_v4(),
            reminder_sent: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn subscription_for(entity: &MatchEntity, user_id: Uuid, side: TeamSide) -> SubscriptionEntity {
        SubscriptionEntity {
            id: Uuid::new_v4(),
            match_id: entity.id,
            user_id,
            side,
            created_at: SystemTime::now(),
        }
    }

    #[tokio::test]
    async fn delete_cascades_subscriptions() {
        let store = MemoryMatchStore::new();
        let entity = sample_match(SystemTime::now());
        let owner = subscription_for(&entity, entity.owner_id, TeamSide::A);
        store
            .create_match_with_owner(entity.clone(), owner)
            .await
            .unwrap();
        store
            .create_subscription(subscription_for(&entity, Uuid::new_v4(), TeamSide::B))
            .await
            .unwrap();

        assert!(store.delete_match_cascading(entity.id).await.unwrap());
        assert!(
            store
                .list_match_subscriptions(entity.id)
                .await
                .unwrap()
                .is_empty()
        );
        assert!(!store.delete_match_cascading(entity.id).await.unwrap());
    }

    #[tokio::test]
    async fn reminder_window_is_half_open() {
        let store = MemoryMatchStore::new();
        let now = SystemTime::now();
        let window = Duration::from_secs(3600);

        let at_now = sample_match(now);
        let inside = sample_match(now + Duration::from_secs(1800));
        let at_edge = sample_match(now + window);
        let beyond = sample_match(now + window + Duration::from_secs(1));
        for entity in [&at_now, &inside, &at_edge, &beyond] {
            store.seed_match(entity.clone()).await;
        }

        let due = store
            .find_matches_due_reminder(now, now + window)
            .await
            .unwrap();
        let due_ids: Vec<Uuid> = due.iter().map(|entity| entity.id).collect();
        assert!(due_ids.contains(&inside.id));
        assert!(due_ids.contains(&at_edge.id));
        assert!(!due_ids.contains(&at_now.id));
        assert!(!due_ids.contains(&beyond.id));
    }

    #[tokio::test]
    async fn advance_only_touches_past_due_scheduled() {
        let store = MemoryMatchStore::new();
        let now = SystemTime::now();
        let due = sample_match(now - Duration::from_secs(60));
        let future = sample_match(now + Duration::from_secs(60));
        let mut finished = sample_match(now - Duration::from_secs(60));
        finished.status = MatchStatus::Finished;
        for entity in [&due, &future, &finished] {
            store.seed_match(entity.clone()).await;
        }

        assert_eq!(store.advance_started_matches(now).await.unwrap(), 1);
        let stored = store.find_match(due.id).await.unwrap().unwrap();
        assert_eq!(stored.status, MatchStatus::Ongoing);
        let stored = store.find_match(future.id).await.unwrap().unwrap();
        assert_eq!(stored.status, MatchStatus::Scheduled);
        let stored = store.find_match(finished.id).await.unwrap().unwrap();
        assert_eq!(stored.status, MatchStatus::Finished);
    }
}
