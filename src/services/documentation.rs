use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Matchday Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::matches::create_match,
        crate::routes::matches::list_matches,
        crate::routes::matches::get_match,
        crate::routes::matches::edit_match,
        crate::routes::matches::delete_match,
        crate::routes::matches::close_match,
        crate::routes::matches::join_match,
        crate::routes::matches::switch_team,
        crate::routes::matches::leave_match,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::matches::CreateMatchRequest,
            crate::dto::matches::UpdateMatchRequest,
            crate::dto::matches::CloseMatchRequest,
            crate::dto::matches::MatchSummary,
            crate::dto::matches::MatchDetails,
            crate::dto::matches::PlayerSummary,
            crate::dto::matches::SubscriptionSummary,
            crate::dao::models::MatchStatus,
            crate::dao::models::TeamSide,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "matches", description = "Match lifecycle and roster operations"),
    )
)]
pub struct ApiDoc;
