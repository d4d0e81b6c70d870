use mongodb::bson::{Binary, DateTime, Document, doc, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{
    EventEntity, EventStatus, MatchEntity, MatchStatus, NotificationEntity, ResourceKind,
    SubscriptionEntity, TeamSide,
};

/// Match document as stored in the `matches` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMatchDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    title: String,
    description: String,
    location: String,
    sport: String,
    starts_at: DateTime,
    max_players: u32,
    team_a_name: String,
    team_b_name: String,
    team_a_score: i32,
    team_b_score: i32,
    status: MatchStatus,
    owner_id: Uuid,
    #[serde(default)]
    reminder_sent: bool,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<MatchEntity> for MongoMatchDocument {
    fn from(value: MatchEntity) -> Self {
        Self {
            id: value.id,
            title: value.title,
            description: value.description,
            location: value.location,
            sport: value.sport,
            starts_at: DateTime::from_system_time(value.starts_at),
            max_players: value.max_players,
            team_a_name: value.team_a_name,
            team_b_name: value.team_b_name,
            team_a_score: value.team_a_score,
            team_b_score: value.team_b_score,
            status: value.status,
            owner_id: value.owner_id,
            reminder_sent: value.reminder_sent,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoMatchDocument> for MatchEntity {
    fn from(value: MongoMatchDocument) -> Self {
        Self {
            id: value.id,
            title: value.title,
            description: value.description,
            location: value.location,
            sport: value.sport,
            starts_at: value.starts_at.to_system_time(),
            max_players: value.max_players,
            team_a_name: value.team_a_name,
            team_b_name: value.team_b_name,
            team_a_score: value.team_a_score,
            team_b_score: value.team_b_score,
            status: value.status,
            owner_id: value.owner_id,
            reminder_sent: value.reminder_sent,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

/// Subscription document as stored in the `subscriptions` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSubscriptionDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    match_id: Uuid,
    user_id: Uuid,
    side: TeamSide,
    created_at: DateTime,
}

impl From<SubscriptionEntity> for MongoSubscriptionDocument {
    fn from(value: SubscriptionEntity) -> Self {
        Self {
            id: value.id,
            match_id: value.match_id,
            user_id: value.user_id,
            side: value.side,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl From<MongoSubscriptionDocument> for SubscriptionEntity {
    fn from(value: MongoSubscriptionDocument) -> Self {
        Self {
            id: value.id,
            match_id: value.match_id,
            user_id: value.user_id,
            side: value.side,
            created_at: value.created_at.to_system_time(),
        }
    }
}

/// Event document as stored in the `events` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoEventDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    title: String,
    location: String,
    starts_at: DateTime,
    status: EventStatus,
    #[serde(default)]
    reminder_sent: bool,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<MongoEventDocument> for EventEntity {
    fn from(value: MongoEventDocument) -> Self {
        Self {
            id: value.id,
            title: value.title,
            location: value.location,
            starts_at: value.starts_at.to_system_time(),
            status: value.status,
            reminder_sent: value.reminder_sent,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

/// Attendance document as stored in the `event_attendance` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoAttendanceDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    /// Attended event.
    pub event_id: Uuid,
    /// Attending user.
    pub user_id: Uuid,
    created_at: DateTime,
}

/// Notification document as stored in the `notifications` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoNotificationDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    user_id: Uuid,
    title: String,
    body: String,
    resource_id: Uuid,
    resource_kind: ResourceKind,
    created_at: DateTime,
}

impl From<NotificationEntity> for MongoNotificationDocument {
    fn from(value: NotificationEntity) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            title: value.title,
            body: value.body,
            resource_id: value.resource_id,
            resource_kind: value.resource_kind,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

pub fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": uuid_as_binary(id)}
}
