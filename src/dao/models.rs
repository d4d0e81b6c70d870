use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Side of a match a subscribed player belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum TeamSide {
    /// First team (the owner's team on creation).
    A,
    /// Second team.
    B,
}

impl TeamSide {
    /// The other side of the pitch.
    pub fn opposite(self) -> TeamSide {
        match self {
            TeamSide::A => TeamSide::B,
            TeamSide::B => TeamSide::A,
        }
    }
}

/// Persisted lifecycle status of a match.
///
/// `Ongoing` is also *derived* at read time for past-due `Scheduled` rows; see
/// [`crate::state::lifecycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Created, kick-off still in the future.
    Scheduled,
    /// Kick-off time has passed.
    Ongoing,
    /// Closed by the owner. Terminal.
    Finished,
}

/// Persisted lifecycle status of a platform event (events never go ongoing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Start time still ahead.
    Upcoming,
    /// Over. Terminal.
    Finished,
}

/// Aggregate match entity persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchEntity {
    /// Primary key of the match.
    pub id: Uuid,
    /// Short display title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Where the match takes place.
    pub location: String,
    /// Sport being played.
    pub sport: String,
    /// Scheduled kick-off time.
    pub starts_at: SystemTime,
    /// Total player count across both teams; always even and >= 2.
    pub max_players: u32,
    /// Display name of team A.
    pub team_a_name: String,
    /// Display name of team B.
    pub team_b_name: String,
    /// Current score of team A.
    pub team_a_score: i32,
    /// Current score of team B.
    pub team_b_score: i32,
    /// Persisted lifecycle status.
    pub status: MatchStatus,
    /// User who created the match and may edit, close or delete it.
    pub owner_id: Uuid,
    /// Set once the reminder pass has inspected this match.
    pub reminder_sent: bool,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time the match entity was updated.
    pub updated_at: SystemTime,
}

impl MatchEntity {
    /// Per-team capacity, `max_players / 2`. Both teams share the same cap.
    pub fn team_cap(&self) -> u32 {
        self.max_players / 2
    }
}

/// Field patch applied to a stored match.
///
/// `None` leaves the stored value untouched. `status` is only ever set by the
/// close operation; the owner edit path never populates it.
#[derive(Debug, Clone, Default)]
pub struct MatchUpdate {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New location.
    pub location: Option<String>,
    /// New sport.
    pub sport: Option<String>,
    /// New kick-off time.
    pub starts_at: Option<SystemTime>,
    /// New total player count.
    pub max_players: Option<u32>,
    /// New display name for team A.
    pub team_a_name: Option<String>,
    /// New display name for team B.
    pub team_b_name: Option<String>,
    /// New score for team A.
    pub team_a_score: Option<i32>,
    /// New score for team B.
    pub team_b_score: Option<i32>,
    /// New lifecycle status (close path only).
    pub status: Option<MatchStatus>,
}

impl MatchUpdate {
    /// Apply the patch to an entity, stamping `updated_at`.
    pub fn apply(self, entity: &mut MatchEntity, updated_at: SystemTime) {
        if let Some(title) = self.title {
            entity.title = title;
        }
        if let Some(description) = self.description {
            entity.description = description;
        }
        if let Some(location) = self.location {
            entity.location = location;
        }
        if let Some(sport) = self.sport {
            entity.sport = sport;
        }
        if let Some(starts_at) = self.starts_at {
            entity.starts_at = starts_at;
        }
        if let Some(max_players) = self.max_players {
            entity.max_players = max_players;
        }
        if let Some(name) = self.team_a_name {
            entity.team_a_name = name;
        }
        if let Some(name) = self.team_b_name {
            entity.team_b_name = name;
        }
        if let Some(score) = self.team_a_score {
            entity.team_a_score = score;
        }
        if let Some(score) = self.team_b_score {
            entity.team_b_score = score;
        }
        if let Some(status) = self.status {
            entity.status = status;
        }
        entity.updated_at = updated_at;
    }
}

/// Player membership in one match, at most one per (user, match) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubscriptionEntity {
    /// Primary key of the subscription.
    pub id: Uuid,
    /// Match the player is subscribed to.
    pub match_id: Uuid,
    /// Subscribed player.
    pub user_id: Uuid,
    /// Side the player currently plays on.
    pub side: TeamSide,
    /// When the player joined.
    pub created_at: SystemTime,
}

/// Platform event record, read by the reminder pass only.
///
/// Event CRUD lives in the platform layer outside this engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventEntity {
    /// Primary key of the event.
    pub id: Uuid,
    /// Short display title.
    pub title: String,
    /// Where the event takes place.
    pub location: String,
    /// Scheduled start time.
    pub starts_at: SystemTime,
    /// Persisted lifecycle status.
    pub status: EventStatus,
    /// Set once the reminder pass has inspected this event.
    pub reminder_sent: bool,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last update timestamp.
    pub updated_at: SystemTime,
}

/// Attendance record linking a user to an event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventAttendanceEntity {
    /// Primary key of the attendance record.
    pub id: Uuid,
    /// Attended event.
    pub event_id: Uuid,
    /// Attending user.
    pub user_id: Uuid,
    /// When the user signed up.
    pub created_at: SystemTime,
}

/// Kind of resource a notification points back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// A match reminder.
    Match,
    /// An event reminder.
    Event,
}

/// Notification record produced by the reminder pass and consumed by the
/// platform's feed/push layers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationEntity {
    /// Primary key of the notification.
    pub id: Uuid,
    /// Recipient.
    pub user_id: Uuid,
    /// Short headline.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Match or event the notification refers to.
    pub resource_id: Uuid,
    /// Whether `resource_id` names a match or an event.
    pub resource_kind: ResourceKind,
    /// Creation timestamp.
    pub created_at: SystemTime,
}
