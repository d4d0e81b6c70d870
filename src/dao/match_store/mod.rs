//! Abstraction over the persistence layer for matches, subscriptions, events
//! and notification records.

pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use std::error::Error;
use std::time::SystemTime;

use futures::future::BoxFuture;
use thiserror::Error;
use uuid::Uuid;

use crate::dao::models::{
    EventEntity, MatchEntity, MatchUpdate, NotificationEntity, SubscriptionEntity, TeamSide,
};

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or the operation failed mid-flight.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Human-readable description of the failed operation.
        message: String,
        /// Backend-specific cause.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}

/// Persistence operations the engine requires.
///
/// Every method is individually atomic in the backend. Compound
/// read-count-then-write sequences are serialized above this trait by the
/// per-match gate in [`crate::state::AppState`], so backends do not need
/// multi-document transactions.
pub trait MatchStore: Send + Sync {
    /// Fetch a match by id.
    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>>;

    /// List all stored matches.
    fn list_matches(&self) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>>;

    /// Persist a new match together with its owner's team A subscription.
    fn create_match_with_owner(
        &self,
        entity: MatchEntity,
        owner_subscription: SubscriptionEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;

    /// Patch stored match fields, returning the updated entity when it exists.
    fn update_match(
        &self,
        id: Uuid,
        update: MatchUpdate,
        updated_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>>;

    /// Delete a match and every subscription attached to it. Returns whether
    /// the match existed.
    fn delete_match_cascading(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    /// Fetch the subscription of one user in one match, if any.
    fn find_subscription(
        &self,
        match_id: Uuid,
        user_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<SubscriptionEntity>>>;

    /// Count the players currently on one side of a match.
    fn count_team_members(
        &self,
        match_id: Uuid,
        side: TeamSide,
    ) -> BoxFuture<'static, StorageResult<u64>>;

    /// List every subscription of a match.
    fn list_match_subscriptions(
        &self,
        match_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<SubscriptionEntity>>>;

    /// Persist a new subscription.
    fn create_subscription(
        &self,
        subscription: SubscriptionEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;

    /// Move an existing subscription to the given side.
    fn update_subscription_team(
        &self,
        id: Uuid,
        side: TeamSide,
    ) -> BoxFuture<'static, StorageResult<()>>;

    /// Remove the subscription of one user in one match. Returns whether it
    /// existed.
    fn delete_subscription(
        &self,
        match_id: Uuid,
        user_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>>;

    /// Matches still scheduled, not yet reminded, starting in the half-open
    /// window `(now, until]`.
    fn find_matches_due_reminder(
        &self,
        now: SystemTime,
        until: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>>;

    /// Events still upcoming, not yet reminded, starting in the half-open
    /// window `(now, until]`.
    fn find_events_due_reminder(
        &self,
        now: SystemTime,
        until: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Vec<EventEntity>>>;

    /// Users attending an event.
    fn list_event_attendees(&self, event_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<Uuid>>>;

    /// Insert the reminder notifications for a match and flip its
    /// `reminder_sent` flag in one commit. The flag flips even when the batch
    /// is empty.
    fn commit_match_reminder(
        &self,
        match_id: Uuid,
        notifications: Vec<NotificationEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;

    /// Insert the reminder notifications for an event and flip its
    /// `reminder_sent` flag in one commit. The flag flips even when the batch
    /// is empty.
    fn commit_event_reminder(
        &self,
        event_id: Uuid,
        notifications: Vec<NotificationEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;

    /// Bulk-advance every scheduled match whose kick-off has passed to
    /// ongoing. Returns the number of matches advanced.
    fn advance_started_matches(&self, now: SystemTime)
    -> BoxFuture<'static, StorageResult<u64>>;

    /// Cheap connectivity probe used by the storage supervisor.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;

    /// Re-establish the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
