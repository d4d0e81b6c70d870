use std::{sync::Arc, time::SystemTime};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{DateTime, doc},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoAttendanceDocument, MongoEventDocument, MongoMatchDocument,
        MongoNotificationDocument, MongoSubscriptionDocument, doc_id, uuid_as_binary,
    },
};
use crate::dao::{
    match_store::{MatchStore, StorageResult},
    models::{
        EventEntity, MatchEntity, MatchUpdate, NotificationEntity, SubscriptionEntity, TeamSide,
    },
};

const MATCH_COLLECTION: &str = "matches";
const SUBSCRIPTION_COLLECTION: &str = "subscriptions";
const EVENT_COLLECTION: &str = "events";
const ATTENDANCE_COLLECTION: &str = "event_attendance";
const NOTIFICATION_COLLECTION: &str = "notifications";

fn side_str(side: TeamSide) -> &'static str {
    match side {
        TeamSide::A => "A",
        TeamSide::B => "B",
    }
}

/// MongoDB-backed store holding the engine's five collections.
#[derive(Clone)]
pub struct MongoMatchStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoMatchStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        let subscriptions =
            database.collection::<MongoSubscriptionDocument>(SUBSCRIPTION_COLLECTION);
        let unique_membership = IndexModel::builder()
            .keys(doc! {"match_id": 1, "user_id": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("subscription_match_user_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();
        subscriptions
            .create_index(unique_membership)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: SUBSCRIPTION_COLLECTION,
                index: "match_id,user_id",
                source,
            })?;

        let matches = database.collection::<MongoMatchDocument>(MATCH_COLLECTION);
        let due_scan = IndexModel::builder()
            .keys(doc! {"status": 1, "starts_at": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("match_status_start_idx".to_owned()))
                    .build(),
            )
            .build();
        matches
            .create_index(due_scan)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: MATCH_COLLECTION,
                index: "status,starts_at",
                source,
            })?;

        let events = database.collection::<MongoEventDocument>(EVENT_COLLECTION);
        let event_scan = IndexModel::builder()
            .keys(doc! {"status": 1, "reminder_sent": 1, "starts_at": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("event_reminder_idx".to_owned()))
                    .build(),
            )
            .build();
        events
            .create_index(event_scan)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: EVENT_COLLECTION,
                index: "status,reminder_sent,starts_at",
                source,
            })?;

        let attendance = database.collection::<MongoAttendanceDocument>(ATTENDANCE_COLLECTION);
        let by_event = IndexModel::builder()
            .keys(doc! {"event_id": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("attendance_event_idx".to_owned()))
                    .build(),
            )
            .build();
        attendance
            .create_index(by_event)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: ATTENDANCE_COLLECTION,
                index: "event_id",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn matches(&self) -> Collection<MongoMatchDocument> {
        self.database().await.collection(MATCH_COLLECTION)
    }

    async fn subscriptions(&self) -> Collection<MongoSubscriptionDocument> {
        self.database().await.collection(SUBSCRIPTION_COLLECTION)
    }

    async fn events(&self) -> Collection<MongoEventDocument> {
        self.database().await.collection(EVENT_COLLECTION)
    }

    async fn attendance(&self) -> Collection<MongoAttendanceDocument> {
        self.database().await.collection(ATTENDANCE_COLLECTION)
    }

    async fn notifications(&self) -> Collection<MongoNotificationDocument> {
        self.database().await.collection(NOTIFICATION_COLLECTION)
    }

    async fn find_match(&self, id: Uuid) -> MongoResult<Option<MatchEntity>> {
        let document = self
            .matches()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::ReadMatch { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn list_matches(&self) -> MongoResult<Vec<MatchEntity>> {
        let documents: Vec<MongoMatchDocument> = self
            .matches()
            .await
            .find(doc! {})
            .sort(doc! {"starts_at": 1})
            .await
            .map_err(|source| MongoDaoError::ListMatches { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListMatches { source })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn create_match_with_owner(
        &self,
        entity: MatchEntity,
        owner_subscription: SubscriptionEntity,
    ) -> MongoResult<()> {
        let id = entity.id;
        let match_document: MongoMatchDocument = entity.into();
        self.matches()
            .await
            .insert_one(&match_document)
            .await
            .map_err(|source| MongoDaoError::WriteMatch { id, source })?;

        let subscription_document: MongoSubscriptionDocument = owner_subscription.into();
        self.subscriptions()
            .await
            .insert_one(&subscription_document)
            .await
            .map_err(|source| MongoDaoError::WriteSubscription {
                match_id: id,
                source,
            })?;
        Ok(())
    }

    async fn update_match(
        &self,
        id: Uuid,
        update: MatchUpdate,
        updated_at: SystemTime,
    ) -> MongoResult<Option<MatchEntity>> {
        let Some(mut entity) = self.find_match(id).await? else {
            return Ok(None);
        };
        update.apply(&mut entity, updated_at);

        let document: MongoMatchDocument = entity.clone().into();
        self.matches()
            .await
            .replace_one(doc_id(id), &document)
            .await
            .map_err(|source| MongoDaoError::WriteMatch { id, source })?;
        Ok(Some(entity))
    }

    async fn delete_match_cascading(&self, id: Uuid) -> MongoResult<bool> {
        let result = self
            .matches()
            .await
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::WriteMatch { id, source })?;

        self.subscriptions()
            .await
            .delete_many(doc! {"match_id": uuid_as_binary(id)})
            .await
            .map_err(|source| MongoDaoError::WriteSubscription {
                match_id: id,
                source,
            })?;

        Ok(result.deleted_count > 0)
    }

    async fn find_subscription(
        &self,
        match_id: Uuid,
        user_id: Uuid,
    ) -> MongoResult<Option<SubscriptionEntity>> {
        let document = self
            .subscriptions()
            .await
            .find_one(doc! {
                "match_id": uuid_as_binary(match_id),
                "user_id": uuid_as_binary(user_id),
            })
            .await
            .map_err(|source| MongoDaoError::ReadSubscription { match_id, source })?;
        Ok(document.map(Into::into))
    }

    async fn count_team_members(&self, match_id: Uuid, side: TeamSide) -> MongoResult<u64> {
        self.subscriptions()
            .await
            .count_documents(doc! {
                "match_id": uuid_as_binary(match_id),
                "side": side_str(side),
            })
            .await
            .map_err(|source| MongoDaoError::ReadSubscription { match_id, source })
    }

    async fn list_match_subscriptions(
        &self,
        match_id: Uuid,
    ) -> MongoResult<Vec<SubscriptionEntity>> {
        let documents: Vec<MongoSubscriptionDocument> = self
            .subscriptions()
            .await
            .find(doc! {"match_id": uuid_as_binary(match_id)})
            .sort(doc! {"created_at": 1})
            .await
            .map_err(|source| MongoDaoError::ReadSubscription { match_id, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ReadSubscription { match_id, source })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn create_subscription(&self, subscription: SubscriptionEntity) -> MongoResult<()> {
        let match_id = subscription.match_id;
        let document: MongoSubscriptionDocument = subscription.into();
        self.subscriptions()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::WriteSubscription { match_id, source })?;
        Ok(())
    }

    async fn update_subscription_team(&self, id: Uuid, side: TeamSide) -> MongoResult<()> {
        self.subscriptions()
            .await
            .update_one(doc_id(id), doc! {"$set": {"side": side_str(side)}})
            .await
            .map_err(|source| MongoDaoError::WriteSubscription {
                match_id: id,
                source,
            })?;
        Ok(())
    }

    async fn delete_subscription(&self, match_id: Uuid, user_id: Uuid) -> MongoResult<bool> {
        let result = self
            .subscriptions()
            .await
            .delete_one(doc! {
                "match_id": uuid_as_binary(match_id),
                "user_id": uuid_as_binary(user_id),
            })
            .await
            .map_err(|source| MongoDaoError::WriteSubscription { match_id, source })?;
        Ok(result.deleted_count > 0)
    }

    async fn find_matches_due_reminder(
        &self,
        now: SystemTime,
        until: SystemTime,
    ) -> MongoResult<Vec<MatchEntity>> {
        let documents: Vec<MongoMatchDocument> = self
            .matches()
            .await
            .find(doc! {
                "status": "scheduled",
                "reminder_sent": false,
                "starts_at": {
                    "$gt": DateTime::from_system_time(now),
                    "$lte": DateTime::from_system_time(until),
                },
            })
            .await
            .map_err(|source| MongoDaoError::FindDueReminder {
                kind: "match",
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::FindDueReminder {
                kind: "match",
                source,
            })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn find_events_due_reminder(
        &self,
        now: SystemTime,
        until: SystemTime,
    ) -> MongoResult<Vec<EventEntity>> {
        let documents: Vec<MongoEventDocument> = self
            .events()
            .await
            .find(doc! {
                "status": "upcoming",
                "reminder_sent": false,
                "starts_at": {
                    "$gt": DateTime::from_system_time(now),
                    "$lte": DateTime::from_system_time(until),
                },
            })
            .await
            .map_err(|source| MongoDaoError::FindDueReminder {
                kind: "event",
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::FindDueReminder {
                kind: "event",
                source,
            })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn list_event_attendees(&self, event_id: Uuid) -> MongoResult<Vec<Uuid>> {
        let documents: Vec<MongoAttendanceDocument> = self
            .attendance()
            .await
            .find(doc! {"event_id": uuid_as_binary(event_id)})
            .await
            .map_err(|source| MongoDaoError::ListAttendees { event_id, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListAttendees { event_id, source })?;
        Ok(documents
            .into_iter()
            .map(|attendance| attendance.user_id)
            .collect())
    }

    /// Shared reminder commit: insert the batch (when non-empty), then flip
    /// the flag. The flag write comes last so a crash in between redelivers
    /// rather than drops.
    async fn commit_reminder(
        &self,
        kind: &'static str,
        collection: &str,
        id: Uuid,
        notifications: Vec<NotificationEntity>,
    ) -> MongoResult<()> {
        if !notifications.is_empty() {
            let documents: Vec<MongoNotificationDocument> =
                notifications.into_iter().map(Into::into).collect();
            self.notifications()
                .await
                .insert_many(&documents)
                .await
                .map_err(|source| MongoDaoError::CommitReminder { kind, id, source })?;
        }

        self.database()
            .await
            .collection::<mongodb::bson::Document>(collection)
            .update_one(doc_id(id), doc! {"$set": {"reminder_sent": true}})
            .await
            .map_err(|source| MongoDaoError::CommitReminder { kind, id, source })?;
        Ok(())
    }

    async fn advance_started_matches(&self, now: SystemTime) -> MongoResult<u64> {
        let result = self
            .matches()
            .await
            .update_many(
                doc! {
                    "status": "scheduled",
                    "starts_at": {"$lte": DateTime::from_system_time(now)},
                },
                doc! {"$set": {"status": "ongoing"}},
            )
            .await
            .map_err(|source| MongoDaoError::AdvanceStatus { source })?;
        Ok(result.modified_count)
    }
}

impl MatchStore for MongoMatchStore {
    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_match(id).await.map_err(Into::into) })
    }

    fn list_matches(&self) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_matches().await.map_err(Into::into) })
    }

    fn create_match_with_owner(
        &self,
        entity: MatchEntity,
        owner_subscription: SubscriptionEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .create_match_with_owner(entity, owner_subscription)
                .await
                .map_err(Into::into)
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
            store
                .update_match(id, update, updated_at)
                .await
                .map_err(Into::into)
        })
    }

    fn delete_match_cascading(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_match_cascading(id).await.map_err(Into::into) })
    }

    fn find_subscription(
        &self,
        match_id: Uuid,
        user_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<SubscriptionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_subscription(match_id, user_id)
                .await
                .map_err(Into::into)
        })
    }

    fn count_team_members(
        &self,
        match_id: Uuid,
        side: TeamSide,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .count_team_members(match_id, side)
                .await
                .map_err(Into::into)
        })
    }

    fn list_match_subscriptions(
        &self,
        match_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<SubscriptionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_match_subscriptions(match_id)
                .await
                .map_err(Into::into)
        })
    }

    fn create_subscription(
        &self,
        subscription: SubscriptionEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .create_subscription(subscription)
                .await
                .map_err(Into::into)
        })
    }

    fn update_subscription_team(
        &self,
        id: Uuid,
        side: TeamSide,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_subscription_team(id, side)
                .await
                .map_err(Into::into)
        })
    }

    fn delete_subscription(
        &self,
        match_id: Uuid,
        user_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .delete_subscription(match_id, user_id)
                .await
                .map_err(Into::into)
        })
    }

    fn find_matches_due_reminder(
        &self,
        now: SystemTime,
        until: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_matches_due_reminder(now, until)
                .await
                .map_err(Into::into)
        })
    }

    fn find_events_due_reminder(
        &self,
        now: SystemTime,
        until: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Vec<EventEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_events_due_reminder(now, until)
                .await
                .map_err(Into::into)
        })
    }

    fn list_event_attendees(&self, event_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<Uuid>>> {
        let store = self.clone();
        Box::pin(async move { store.list_event_attendees(event_id).await.map_err(Into::into) })
    }

    fn commit_match_reminder(
        &self,
        match_id: Uuid,
        notifications: Vec<NotificationEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .commit_reminder("match", MATCH_COLLECTION, match_id, notifications)
                .await
                .map_err(Into::into)
        })
    }

    fn commit_event_reminder(
        &self,
        event_id: Uuid,
        notifications: Vec<NotificationEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .commit_reminder("event", EVENT_COLLECTION, event_id, notifications)
                .await
                .map_err(Into::into)
        })
    }

    fn advance_started_matches(
        &self,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move { store.advance_started_matches(now).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
