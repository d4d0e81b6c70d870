//! Match CRUD orchestration: creation with owner auto-subscription, reads
//! with derived status, owner-only edits, explicit close and cascading
//! delete.

use std::{sync::Arc, time::SystemTime};

use uuid::Uuid;

use crate::{
    dao::{
        match_store::MatchStore,
        models::{MatchEntity, MatchStatus, MatchUpdate, SubscriptionEntity, TeamSide},
    },
    dto::{
        matches::{
            CloseMatchRequest, CreateMatchRequest, MatchDetails, MatchSummary, UpdateMatchRequest,
        },
        parse_rfc3339,
    },
    error::ServiceError,
    state::{SharedState, lifecycle},
};

/// Schedule a new match. The creator becomes the owner and is auto-subscribed
/// to team A.
pub async fn create_match(
    state: &SharedState,
    owner_id: Uuid,
    request: CreateMatchRequest,
) -> Result<MatchSummary, ServiceError> {
    let store = state.require_store().await?;

    let starts_at = parse_start_time(&request.starts_at)?;
    let now = SystemTime::now();
    let entity = MatchEntity {
        id: Uuid::new_v4(),
        title: request.title,
        description: request.description,
        location: request.location,
        sport: request.sport,
        starts_at,
        max_players: request.max_players,
        team_a_name: request.team_a_name.unwrap_or_else(|| "Team A".into()),
        team_b_name: request.team_b_name.unwrap_or_else(|| "Team B".into()),
        team_a_score: 0,
        team_b_score: 0,
        status: MatchStatus::Scheduled,
        owner_id,
        reminder_sent: false,
        created_at: now,
        updated_at: now,
    };
    let owner_subscription = SubscriptionEntity {
        id: Uuid::new_v4(),
        match_id: entity.id,
        user_id: owner_id,
        side: TeamSide::A,
        created_at: now,
    };

    store
        .create_match_with_owner(entity.clone(), owner_subscription)
        .await?;

    Ok(MatchSummary::from_entity(entity, now))
}

/// Fetch one match with both rosters.
pub async fn get_match(state: &SharedState, id: Uuid) -> Result<MatchDetails, ServiceError> {
    let store = state.require_store().await?;
    let entity = fetch_match(&store, id).await?;
    let subscriptions = store.list_match_subscriptions(id).await?;
    Ok(MatchDetails::from_parts(
        entity,
        subscriptions,
        SystemTime::now(),
    ))
}

/// List every match, soonest kick-off first.
pub async fn list_matches(state: &SharedState) -> Result<Vec<MatchSummary>, ServiceError> {
    let store = state.require_store().await?;
    let now = SystemTime::now();
    let entities = store.list_matches().await?;
    Ok(entities
        .into_iter()
        .map(|entity| MatchSummary::from_entity(entity, now))
        .collect())
}

/// Apply an owner patch to a match.
pub async fn edit_match(
    state: &SharedState,
    id: Uuid,
    auth_user: Uuid,
    request: UpdateMatchRequest,
) -> Result<MatchSummary, ServiceError> {
    let store = state.require_store().await?;
    let entity = fetch_match(&store, id).await?;
    ensure_owner(&entity, auth_user)?;

    let starts_at = request.starts_at.as_deref().map(parse_start_time).transpose()?;
    let update = MatchUpdate {
        title: request.title,
        description: request.description,
        location: request.location,
        sport: request.sport,
        starts_at,
        max_players: request.max_players,
        team_a_name: request.team_a_name,
        team_b_name: request.team_b_name,
        team_a_score: request.team_a_score,
        team_b_score: request.team_b_score,
        status: None,
    };

    let now = SystemTime::now();
    let updated = store
        .update_match(id, update, now)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(MatchSummary::from_entity(updated, now))
}

/// Close a match, optionally settling the final score. Owner only; finished
/// is terminal.
pub async fn close_match(
    state: &SharedState,
    id: Uuid,
    auth_user: Uuid,
    request: CloseMatchRequest,
) -> Result<MatchSummary, ServiceError> {
    let store = state.require_store().await?;
    let entity = fetch_match(&store, id).await?;
    ensure_owner(&entity, auth_user)?;
    lifecycle::validate_transition(entity.status, MatchStatus::Finished)?;

    let update = MatchUpdate {
        team_a_score: request.team_a_score,
        team_b_score: request.team_b_score,
        status: Some(MatchStatus::Finished),
        ..MatchUpdate::default()
    };

    let now = SystemTime::now();
    let updated = store
        .update_match(id, update, now)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(MatchSummary::from_entity(updated, now))
}

/// Delete a match and all its subscriptions. Owner only.
pub async fn delete_match(
    state: &SharedState,
    id: Uuid,
    auth_user: Uuid,
) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    let entity = fetch_match(&store, id).await?;
    ensure_owner(&entity, auth_user)?;

    store.delete_match_cascading(id).await?;
    state.discard_match_gate(id);
    Ok(())
}

pub(crate) async fn fetch_match(
    store: &Arc<dyn MatchStore>,
    id: Uuid,
) -> Result<MatchEntity, ServiceError> {
    store.find_match(id).await?.ok_or_else(|| not_found(id))
}

fn not_found(id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("match `{id}` not found"))
}

fn ensure_owner(entity: &MatchEntity, auth_user: Uuid) -> Result<(), ServiceError> {
    if entity.owner_id != auth_user {
        return Err(ServiceError::Forbidden(
            "only the match owner may do this".into(),
        ));
    }
    Ok(())
}

fn parse_start_time(value: &str) -> Result<SystemTime, ServiceError> {
    parse_rfc3339(value).map_err(|_| {
        ServiceError::InvalidInput(format!("`{value}` is not a valid RFC 3339 timestamp"))
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::match_store::memory::MemoryMatchStore,
        services::notifier::LogOnlyGateway,
        state::AppState,
    };

    async fn test_state() -> (SharedState, MemoryMatchStore) {
        let store = MemoryMatchStore::new();
        let state = AppState::new(AppConfig::default(), Arc::new(LogOnlyGateway));
        state.install_store(Arc::new(store.clone())).await;
        (state, store)
    }

    fn create_request(starts_at: &str) -> CreateMatchRequest {
        CreateMatchRequest {
            title: "Sunday five-a-side".into(),
            description: "friendly".into(),
            location: "Riverside pitch".into(),
            sport: "football".into(),
            starts_at: starts_at.into(),
            max_players: 10,
            team_a_name: None,
            team_b_name: None,
        }
    }

    #[tokio::test]
    async fn creation_auto_subscribes_the_owner_to_team_a() {
        let (state, store) = test_state().await;
        let owner = Uuid::new_v4();

        let summary = create_match(&state, owner, create_request("2030-06-01T10:00:00Z"))
            .await
            .unwrap();

        let subscription = store
            .find_subscription(summary.id, owner)
            .await
            .unwrap()
            .expect("owner subscription");
        assert_eq!(subscription.side, TeamSide::A);
        assert_eq!(summary.status, MatchStatus::Scheduled);
        assert_eq!(summary.team_a_name, "Team A");
    }

    #[tokio::test]
    async fn bogus_start_time_is_invalid_input() {
        let (state, _store) = test_state().await;
        let err = create_match(&state, Uuid::new_v4(), create_request("soonish"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn fetch_derives_ongoing_for_past_kickoff() {
        let (state, store) = test_state().await;
        let owner = Uuid::new_v4();
        let summary = create_match(&state, owner, create_request("2030-06-01T10:00:00Z"))
            .await
            .unwrap();

        // Pull the kick-off into the past without touching the stored status.
        let update = MatchUpdate {
            starts_at: Some(SystemTime::now() - Duration::from_secs(600)),
            ..MatchUpdate::default()
        };
        store
            .update_match(summary.id, update, SystemTime::now())
            .await
            .unwrap();

        let details = get_match(&state, summary.id).await.unwrap();
        assert_eq!(details.info.status, MatchStatus::Ongoing);
    }

    #[tokio::test]
    async fn only_the_owner_may_edit_or_delete() {
        let (state, _store) = test_state().await;
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let summary = create_match(&state, owner, create_request("2030-06-01T10:00:00Z"))
            .await
            .unwrap();

        let err = edit_match(
            &state,
            summary.id,
            stranger,
            UpdateMatchRequest {
                title: Some("hijacked".into()),
                ..UpdateMatchRequest::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let err = delete_match(&state, summary.id, stranger).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn close_is_terminal() {
        let (state, _store) = test_state().await;
        let owner = Uuid::new_v4();
        let summary = create_match(&state, owner, create_request("2030-06-01T10:00:00Z"))
            .await
            .unwrap();

        let closed = close_match(
            &state,
            summary.id,
            owner,
            CloseMatchRequest {
                team_a_score: Some(3),
                team_b_score: Some(2),
            },
        )
        .await
        .unwrap();
        assert_eq!(closed.status, MatchStatus::Finished);
        assert_eq!(closed.team_a_score, 3);

        let err = close_match(&state, summary.id, owner, CloseMatchRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn delete_cascades_and_returns_not_found_afterwards() {
        let (state, store) = test_state().await;
        let owner = Uuid::new_v4();
        let summary = create_match(&state, owner, create_request("2030-06-01T10:00:00Z"))
            .await
            .unwrap();

        delete_match(&state, summary.id, owner).await.unwrap();
        assert!(
            store
                .list_match_subscriptions(summary.id)
                .await
                .unwrap()
                .is_empty()
        );
        let err = get_match(&state, summary.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
