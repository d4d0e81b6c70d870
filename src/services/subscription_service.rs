//! Join/switch/leave orchestration.
//!
//! Every operation re-reads the current team counts from the store while
//! holding the per-match gate, so two concurrent joins can never both claim
//! the last seat of a team.

use std::time::SystemTime;

use uuid::Uuid;

use crate::{
    dao::models::{SubscriptionEntity, TeamSide},
    dto::matches::SubscriptionSummary,
    error::ServiceError,
    services::{allocator, match_service::fetch_match},
    state::SharedState,
};

/// Subscribe a player to a match, letting the allocator pick the side.
pub async fn join_match(
    state: &SharedState,
    match_id: Uuid,
    user_id: Uuid,
) -> Result<SubscriptionSummary, ServiceError> {
    let store = state.require_store().await?;
    let gate = state.match_gate(match_id);
    let _guard = gate.lock().await;

    let entity = fetch_match(&store, match_id).await?;

    if store.find_subscription(match_id, user_id).await?.is_some() {
        return Err(ServiceError::Conflict(
            "already subscribed to this match".into(),
        ));
    }

    let team_cap = u64::from(entity.team_cap());
    let count_a = store.count_team_members(match_id, TeamSide::A).await?;
    let count_b = store.count_team_members(match_id, TeamSide::B).await?;
    let side = allocator::decide_join(count_a, count_b, team_cap)
        .map_err(|_| ServiceError::Full("both teams are full".into()))?;

    let subscription = SubscriptionEntity {
        id: Uuid::new_v4(),
        match_id,
        user_id,
        side,
        created_at: SystemTime::now(),
    };
    store.create_subscription(subscription.clone()).await?;

    Ok(subscription.into())
}

/// Move a player to the opposite team.
pub async fn switch_team(
    state: &SharedState,
    match_id: Uuid,
    user_id: Uuid,
) -> Result<SubscriptionSummary, ServiceError> {
    let store = state.require_store().await?;
    let gate = state.match_gate(match_id);
    let _guard = gate.lock().await;

    let entity = fetch_match(&store, match_id).await?;
    let Some(mut subscription) = store.find_subscription(match_id, user_id).await? else {
        return Err(ServiceError::NotFound(
            "not subscribed to this match".into(),
        ));
    };

    let team_cap = u64::from(entity.team_cap());
    let count_other = store
        .count_team_members(match_id, subscription.side.opposite())
        .await?;
    let destination = allocator::decide_switch(subscription.side, count_other, team_cap)
        .map_err(|_| ServiceError::Full("destination team is full".into()))?;

    store
        .update_subscription_team(subscription.id, destination)
        .await?;
    subscription.side = destination;

    Ok(subscription.into())
}

/// Unsubscribe a player from a match.
pub async fn leave_match(
    state: &SharedState,
    match_id: Uuid,
    user_id: Uuid,
) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    let gate = state.match_gate(match_id);
    let _guard = gate.lock().await;

    if !store.delete_subscription(match_id, user_id).await? {
        return Err(ServiceError::NotFound(
            "not subscribed to this match".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::match_store::memory::MemoryMatchStore,
        dto::matches::CreateMatchRequest,
        services::{match_service, notifier::LogOnlyGateway},
        state::AppState,
    };

    async fn state_with_match(max_players: u32) -> (SharedState, Uuid, Uuid) {
        let store = MemoryMatchStore::new();
        let state = AppState::new(AppConfig::default(), Arc::new(LogOnlyGateway));
        state.install_store(Arc::new(store)).await;

        let owner = Uuid::new_v4();
        let request = CreateMatchRequest {
            title: "Sunday five-a-side".into(),
            description: String::new(),
            location: "Riverside pitch".into(),
            sport: "football".into(),
            starts_at: "2030-06-01T10:00:00Z".into(),
            max_players,
            team_a_name: None,
            team_b_name: None,
        };
        let summary = match_service::create_match(&state, owner, request)
            .await
            .unwrap();
        (state, summary.id, owner)
    }

    #[tokio::test]
    async fn two_seat_match_fills_b_then_rejects() {
        // Team cap 1; the owner already holds team A.
        let (state, match_id, _owner) = state_with_match(2).await;

        let second = Uuid::new_v4();
        let joined = join_match(&state, match_id, second).await.unwrap();
        assert_eq!(joined.side, TeamSide::B);

        let third = Uuid::new_v4();
        let err = join_match(&state, match_id, third).await.unwrap_err();
        assert!(matches!(err, ServiceError::Full(_)));
    }

    #[tokio::test]
    async fn join_balances_toward_the_smaller_team() {
        // Team cap 2; owner on A, next joiner goes to B, the one after back
        // to A (tie), then B again.
        let (state, match_id, _owner) = state_with_match(4).await;

        let mut sides = Vec::new();
        for _ in 0..3 {
            let joined = join_match(&state, match_id, Uuid::new_v4()).await.unwrap();
            sides.push(joined.side);
        }
        assert_eq!(sides, vec![TeamSide::B, TeamSide::A, TeamSide::B]);
    }

    #[tokio::test]
    async fn duplicate_join_is_a_conflict() {
        let (state, match_id, owner) = state_with_match(10).await;
        let err = join_match(&state, match_id, owner).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn join_unknown_match_is_not_found() {
        let (state, _match_id, _owner) = state_with_match(10).await;
        let err = join_match(&state, Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn switch_moves_to_the_empty_opposite_side() {
        // Team cap 1, owner on A, B empty.
        let (state, match_id, owner) = state_with_match(2).await;

        let switched = switch_team(&state, match_id, owner).await.unwrap();
        assert_eq!(switched.side, TeamSide::B);
    }

    #[tokio::test]
    async fn switch_rejects_when_the_opposite_side_is_full() {
        let (state, match_id, owner) = state_with_match(2).await;
        let second = Uuid::new_v4();
        join_match(&state, match_id, second).await.unwrap();

        let err = switch_team(&state, match_id, owner).await.unwrap_err();
        assert!(matches!(err, ServiceError::Full(_)));
    }

    #[tokio::test]
    async fn switch_without_subscription_is_not_found() {
        let (state, match_id, _owner) = state_with_match(2).await;
        let err = switch_team(&state, match_id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn leave_frees_the_seat_for_the_next_joiner() {
        let (state, match_id, _owner) = state_with_match(2).await;
        let second = Uuid::new_v4();
        join_match(&state, match_id, second).await.unwrap();

        leave_match(&state, match_id, second).await.unwrap();
        let err = leave_match(&state, match_id, second).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let third = Uuid::new_v4();
        let joined = join_match(&state, match_id, third).await.unwrap();
        assert_eq!(joined.side, TeamSide::B);
    }

    #[tokio::test]
    async fn concurrent_joins_cannot_overfill_a_team() {
        // One seat left (team cap 1, owner on A). Two users race for it.
        let (state, match_id, _owner) = state_with_match(2).await;
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        let (left, right) = tokio::join!(
            join_match(&state, match_id, first),
            join_match(&state, match_id, second),
        );

        let successes = [left.is_ok(), right.is_ok()]
            .iter()
            .filter(|ok| **ok)
            .count();
        assert_eq!(successes, 1, "exactly one racer may take the last seat");
    }
}
