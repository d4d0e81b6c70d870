use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::matches::{
        CloseMatchRequest, CreateMatchRequest, MatchDetails, MatchSummary, SubscriptionSummary,
        UpdateMatchRequest,
    },
    error::AppError,
    routes::auth::AuthUser,
    services::{match_service, subscription_service},
    state::SharedState,
};

/// Routes handling match lifecycle and roster operations.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/matches", post(create_match).get(list_matches))
        .route(
            "/matches/{id}",
            get(get_match).patch(edit_match).delete(delete_match),
        )
        .route("/matches/{id}/close", post(close_match))
        .route("/matches/{id}/join", post(join_match))
        .route("/matches/{id}/switch", post(switch_team))
        .route("/matches/{id}/leave", post(leave_match))
}

/// Schedule a new match; the caller becomes its owner on team A.
#[utoipa::path(
    post,
    path = "/matches",
    tag = "matches",
    request_body = CreateMatchRequest,
    responses(
        (status = 200, description = "Match created", body = MatchSummary),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Missing caller identity")
    )
)]
pub async fn create_match(
    State(state): State<SharedState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateMatchRequest>,
) -> Result<Json<MatchSummary>, AppError> {
    payload.validate()?;
    let summary = match_service::create_match(&state, user_id, payload).await?;
    Ok(Json(summary))
}

/// List every match, soonest kick-off first, with derived statuses.
#[utoipa::path(
    get,
    path = "/matches",
    tag = "matches",
    responses((status = 200, description = "All matches", body = [MatchSummary]))
)]
pub async fn list_matches(
    State(state): State<SharedState>,
) -> Result<Json<Vec<MatchSummary>>, AppError> {
    let summaries = match_service::list_matches(&state).await?;
    Ok(Json(summaries))
}

/// Fetch one match with both rosters.
#[utoipa::path(
    get,
    path = "/matches/{id}",
    tag = "matches",
    params(("id" = Uuid, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Match detail", body = MatchDetails),
        (status = 404, description = "Unknown match")
    )
)]
pub async fn get_match(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MatchDetails>, AppError> {
    let details = match_service::get_match(&state, id).await?;
    Ok(Json(details))
}

/// Patch match fields. Owner only.
#[utoipa::path(
    patch,
    path = "/matches/{id}",
    tag = "matches",
    params(("id" = Uuid, Path, description = "Match identifier")),
    request_body = UpdateMatchRequest,
    responses(
        (status = 200, description = "Match updated", body = MatchSummary),
        (status = 403, description = "Caller does not own the match"),
        (status = 404, description = "Unknown match")
    )
)]
pub async fn edit_match(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateMatchRequest>,
) -> Result<Json<MatchSummary>, AppError> {
    payload.validate()?;
    let summary = match_service::edit_match(&state, id, user_id, payload).await?;
    Ok(Json(summary))
}

/// Delete a match and its subscriptions. Owner only.
#[utoipa::path(
    delete,
    path = "/matches/{id}",
    tag = "matches",
    params(("id" = Uuid, Path, description = "Match identifier")),
    responses(
        (status = 204, description = "Match deleted"),
        (status = 403, description = "Caller does not own the match"),
        (status = 404, description = "Unknown match")
    )
)]
pub async fn delete_match(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    AuthUser(user_id): AuthUser,
) -> Result<StatusCode, AppError> {
    match_service::delete_match(&state, id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Close a match, optionally settling the final score. Owner only.
#[utoipa::path(
    post,
    path = "/matches/{id}/close",
    tag = "matches",
    params(("id" = Uuid, Path, description = "Match identifier")),
    request_body = CloseMatchRequest,
    responses(
        (status = 200, description = "Match closed", body = MatchSummary),
        (status = 403, description = "Caller does not own the match"),
        (status = 409, description = "Match already finished")
    )
)]
pub async fn close_match(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CloseMatchRequest>,
) -> Result<Json<MatchSummary>, AppError> {
    let summary = match_service::close_match(&state, id, user_id, payload).await?;
    Ok(Json(summary))
}

/// Join a match; the engine picks the side.
#[utoipa::path(
    post,
    path = "/matches/{id}/join",
    tag = "matches",
    params(("id" = Uuid, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Joined", body = SubscriptionSummary),
        (status = 403, description = "Both teams are full"),
        (status = 404, description = "Unknown match"),
        (status = 409, description = "Already subscribed")
    )
)]
pub async fn join_match(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<SubscriptionSummary>, AppError> {
    let summary = subscription_service::join_match(&state, id, user_id).await?;
    Ok(Json(summary))
}

/// Move to the opposite team.
#[utoipa::path(
    post,
    path = "/matches/{id}/switch",
    tag = "matches",
    params(("id" = Uuid, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Switched", body = SubscriptionSummary),
        (status = 403, description = "Destination team is full"),
        (status = 404, description = "Not subscribed")
    )
)]
pub async fn switch_team(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<SubscriptionSummary>, AppError> {
    let summary = subscription_service::switch_team(&state, id, user_id).await?;
    Ok(Json(summary))
}

/// Leave a match.
#[utoipa::path(
    post,
    path = "/matches/{id}/leave",
    tag = "matches",
    params(("id" = Uuid, Path, description = "Match identifier")),
    responses(
        (status = 204, description = "Left"),
        (status = 404, description = "Not subscribed")
    )
)]
pub async fn leave_match(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    AuthUser(user_id): AuthUser,
) -> Result<StatusCode, AppError> {
    subscription_service::leave_match(&state, id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
