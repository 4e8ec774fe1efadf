use std::collections::BTreeMap;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::info;

use crate::{error::ApiError, middleware::auth::AuthenticatedPlayer, state::AppState};
use shared::models::club::{ClubSummary, ClubView, MemberManagementView, SearchFilters};
use shared::models::requests::CreateClubRequest;
use shared::models::responses::{CreateClubResponse, JoinClubResponse};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/clubs", post(create_club).get(search_clubs))
        .route("/clubs/mine", get(list_my_clubs))
        .route("/clubs/{id}", get(load_club).delete(delete_club))
        .route("/clubs/{id}/join", post(join_club))
        .route("/clubs/{id}/requests", get(load_join_requests))
        .route("/clubs/{id}/members/{member}/admit", post(admit_member))
        .route("/clubs/{id}/members/{member}/deny", post(deny_member))
        .route("/clubs/{id}/members/{member}", delete(kick_member))
}

async fn create_club(
    State(state): State<AppState>,
    player: AuthenticatedPlayer,
    payload: Result<Json<CreateClubRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateClubResponse>), ApiError> {
    let Json(request) = payload?;
    let club_id = state
        .club_service
        .create_club(
            &player.player_id,
            &request.name,
            &request.country,
            request.approval_required,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(CreateClubResponse { club_id })))
}

async fn search_clubs(
    State(state): State<AppState>,
    _player: AuthenticatedPlayer,
    filters: Result<Query<SearchFilters>, QueryRejection>,
) -> Result<Json<Vec<ClubSummary>>, ApiError> {
    let Query(filters) = filters?;
    Ok(Json(state.club_service.search_clubs(&filters).await?))
}

async fn list_my_clubs(
    State(state): State<AppState>,
    player: AuthenticatedPlayer,
) -> Result<Json<Vec<ClubSummary>>, ApiError> {
    Ok(Json(
        state.club_service.list_my_clubs(&player.player_id).await?,
    ))
}

async fn load_club(
    State(state): State<AppState>,
    player: AuthenticatedPlayer,
    Path(club_id): Path<String>,
) -> Result<Json<ClubView>, ApiError> {
    Ok(Json(
        state
            .club_service
            .load_club(&player.player_id, &club_id)
            .await?,
    ))
}

async fn delete_club(
    State(state): State<AppState>,
    player: AuthenticatedPlayer,
    Path(club_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .club_service
        .delete_club(&player.player_id, &club_id)
        .await?;
    info!("Club {} deleted via API", club_id);
    Ok(StatusCode::NO_CONTENT)
}

async fn join_club(
    State(state): State<AppState>,
    player: AuthenticatedPlayer,
    Path(club_id): Path<String>,
) -> Result<Json<JoinClubResponse>, ApiError> {
    let status = state
        .club_service
        .join_club(&player.player_id, &club_id)
        .await?;
    Ok(Json(JoinClubResponse { status }))
}

async fn load_join_requests(
    State(state): State<AppState>,
    player: AuthenticatedPlayer,
    Path(club_id): Path<String>,
) -> Result<Json<BTreeMap<String, String>>, ApiError> {
    Ok(Json(
        state
            .club_service
            .load_club_join_requests(&player.player_id, &club_id)
            .await?,
    ))
}

async fn admit_member(
    State(state): State<AppState>,
    player: AuthenticatedPlayer,
    Path((club_id, member_id)): Path<(String, String)>,
) -> Result<Json<MemberManagementView>, ApiError> {
    Ok(Json(
        state
            .club_service
            .admit_club_member(&player.player_id, &club_id, &member_id)
            .await?,
    ))
}

async fn deny_member(
    State(state): State<AppState>,
    player: AuthenticatedPlayer,
    Path((club_id, member_id)): Path<(String, String)>,
) -> Result<Json<MemberManagementView>, ApiError> {
    Ok(Json(
        state
            .club_service
            .deny_club_member(&player.player_id, &club_id, &member_id)
            .await?,
    ))
}

async fn kick_member(
    State(state): State<AppState>,
    player: AuthenticatedPlayer,
    Path((club_id, member_id)): Path<(String, String)>,
) -> Result<Json<MemberManagementView>, ApiError> {
    Ok(Json(
        state
            .club_service
            .kick_club_member(&player.player_id, &club_id, &member_id)
            .await?,
    ))
}
