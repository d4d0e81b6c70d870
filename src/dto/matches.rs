use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dao::models::{MatchEntity, MatchStatus, SubscriptionEntity, TeamSide},
    dto::{format_system_time, validation::validate_max_players},
    state::lifecycle::derived_status,
};

/// Payload used to schedule a new match.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMatchRequest {
    /// Display title.
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Where the match takes place.
    pub location: String,
    /// Sport being played.
    pub sport: String,
    /// Kick-off time, RFC 3339.
    pub starts_at: String,
    /// Total player count across both teams.
    pub max_players: u32,
    /// Display name for team A; defaults to "Team A".
    #[serde(default)]
    pub team_a_name: Option<String>,
    /// Display name for team B; defaults to "Team B".
    #[serde(default)]
    pub team_b_name: Option<String>,
}

impl Validate for CreateMatchRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_non_empty("title", &self.title) {
            errors.add("title", e);
        }
        if let Err(e) = validate_non_empty("location", &self.location) {
            errors.add("location", e);
        }
        if let Err(e) = validate_non_empty("sport", &self.sport) {
            errors.add("sport", e);
        }
        if let Err(e) = validate_max_players(self.max_players) {
            errors.add("max_players", e);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Owner patch for an existing match. Absent fields stay untouched.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateMatchRequest {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New location.
    pub location: Option<String>,
    /// New sport.
    pub sport: Option<String>,
    /// New kick-off time, RFC 3339.
    pub starts_at: Option<String>,
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
}

impl Validate for UpdateMatchRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(ref title) = self.title {
            if let Err(e) = validate_non_empty("title", title) {
                errors.add("title", e);
            }
        }
        if let Some(ref location) = self.location {
            if let Err(e) = validate_non_empty("location", location) {
                errors.add("location", e);
            }
        }
        if let Some(ref sport) = self.sport {
            if let Err(e) = validate_non_empty("sport", sport) {
                errors.add("sport", e);
            }
        }
        if let Some(max_players) = self.max_players {
            if let Err(e) = validate_max_players(max_players) {
                errors.add("max_players", e);
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

fn validate_non_empty(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("empty");
        err.message = Some(format!("{field} must not be empty").into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request() -> CreateMatchRequest {
        CreateMatchRequest {
            title: "Sunday five-a-side".into(),
            description: String::new(),
            location: "Riverside pitch".into(),
            sport: "football".into(),
            starts_at: "2030-06-01T10:00:00Z".into(),
            max_players: 10,
            team_a_name: None,
            team_b_name: None,
        }
    }

    #[test]
    fn well_formed_create_request_passes() {
        assert!(create_request().validate().is_ok());
    }

    #[test]
    fn blank_title_and_odd_player_count_are_rejected() {
        let mut request = create_request();
        request.title = "   ".into();
        request.max_players = 11;
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
        assert!(errors.field_errors().contains_key("max_players"));
    }

    #[test]
    fn patch_only_validates_present_fields() {
        assert!(UpdateMatchRequest::default().validate().is_ok());

        let request = UpdateMatchRequest {
            max_players: Some(3),
            ..UpdateMatchRequest::default()
        };
        assert!(request.validate().is_err());
    }
}

/// Owner request to close a match, optionally settling the final score.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CloseMatchRequest {
    /// Final score for team A.
    #[serde(default)]
    pub team_a_score: Option<i32>,
    /// Final score for team B.
    #[serde(default)]
    pub team_b_score: Option<i32>,
}

/// Public projection of a match.
///
/// `status` is the *derived* status: a scheduled match past kick-off is
/// already reported as ongoing here, whatever the store says.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchSummary {
    /// Match identifier.
    pub id: Uuid,
    /// Display title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Where the match takes place.
    pub location: String,
    /// Sport being played.
    pub sport: String,
    /// Kick-off time, RFC 3339.
    pub starts_at: String,
    /// Total player count across both teams.
    pub max_players: u32,
    /// Display name of team A.
    pub team_a_name: String,
    /// Display name of team B.
    pub team_b_name: String,
    /// Current score of team A.
    pub team_a_score: i32,
    /// Current score of team B.
    pub team_b_score: i32,
    /// Derived lifecycle status.
    pub status: MatchStatus,
    /// Owner of the match.
    pub owner_id: Uuid,
    /// Creation timestamp, RFC 3339.
    pub created_at: String,
    /// Last update timestamp, RFC 3339.
    pub updated_at: String,
}

impl MatchSummary {
    /// Project an entity, deriving the presented status at `now`.
    pub fn from_entity(entity: MatchEntity, now: SystemTime) -> Self {
        let status = derived_status(entity.status, entity.starts_at, now);
        Self {
            id: entity.id,
            title: entity.title,
            description: entity.description,
            location: entity.location,
            sport: entity.sport,
            starts_at: format_system_time(entity.starts_at),
            max_players: entity.max_players,
            team_a_name: entity.team_a_name,
            team_b_name: entity.team_b_name,
            team_a_score: entity.team_a_score,
            team_b_score: entity.team_b_score,
            status,
            owner_id: entity.owner_id,
            created_at: format_system_time(entity.created_at),
            updated_at: format_system_time(entity.updated_at),
        }
    }
}

/// One player on a match roster.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerSummary {
    /// Subscribed user.
    pub user_id: Uuid,
    /// When the player joined, RFC 3339.
    pub joined_at: String,
}

/// Full match view with both rosters.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchDetails {
    /// Match data with derived status.
    pub info: MatchSummary,
    /// Players on team A, in join order.
    pub team_a_players: Vec<PlayerSummary>,
    /// Players on team B, in join order.
    pub team_b_players: Vec<PlayerSummary>,
}

impl MatchDetails {
    /// Assemble the detail view from an entity and its subscriptions.
    pub fn from_parts(
        entity: MatchEntity,
        subscriptions: Vec<SubscriptionEntity>,
        now: SystemTime,
    ) -> Self {
        let mut team_a_players = Vec::new();
        let mut team_b_players = Vec::new();
        for subscription in subscriptions {
            let player = PlayerSummary {
                user_id: subscription.user_id,
                joined_at: format_system_time(subscription.created_at),
            };
            match subscription.side {
                TeamSide::A => team_a_players.push(player),
                TeamSide::B => team_b_players.push(player),
            }
        }

        Self {
            info: MatchSummary::from_entity(entity, now),
            team_a_players,
            team_b_players,
        }
    }
}

/// Outcome of a join or switch, telling the caller which side they are on.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionSummary {
    /// Match joined.
    pub match_id: Uuid,
    /// Subscribed user.
    pub user_id: Uuid,
    /// Side the player now plays on.
    pub side: TeamSide,
    /// When the player joined, RFC 3339.
    pub joined_at: String,
}

impl From<SubscriptionEntity> for SubscriptionSummary {
    fn from(value: SubscriptionEntity) -> Self {
        Self {
            match_id: value.match_id,
            user_id: value.user_id,
            side: value.side,
            joined_at: format_system_time(value.created_at),
        }
    }
}
