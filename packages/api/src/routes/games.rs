use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::debug;

use crate::{error::ApiError, middleware::auth::AuthenticatedPlayer, state::AppState};
use shared::models::game_session::{HostedGame, JoinedSession, MoveResult, SessionView};
use shared::models::requests::{JoinGameRequest, MoveRequest};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/games", post(host_game))
        .route("/games/join", post(join_game))
        .route("/games/{id}", get(load_session))
        .route("/games/{id}/moves", post(make_move))
        .route("/games/{id}/resign", post(resign))
        .route("/games/{id}/clear", post(clear_board))
}

async fn host_game(
    State(state): State<AppState>,
    player: AuthenticatedPlayer,
) -> Result<(StatusCode, Json<HostedGame>), ApiError> {
    let hosted = state.game_session_service.host_game(&player.player_id).await?;
    Ok((StatusCode::CREATED, Json(hosted)))
}

async fn join_game(
    State(state): State<AppState>,
    player: AuthenticatedPlayer,
    payload: Result<Json<JoinGameRequest>, JsonRejection>,
) -> Result<Json<JoinedSession>, ApiError> {
    let Json(request) = payload?;
    debug!("Player {} joining with code {}", player.player_id, request.join_code);
    let joined = state
        .game_session_service
        .join_game(&player.player_id, &request.join_code)
        .await?;
    Ok(Json(joined))
}

async fn load_session(
    State(state): State<AppState>,
    player: AuthenticatedPlayer,
    Path(session_id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let view = state
        .game_session_service
        .load_session(&player.player_id, &session_id)
        .await?;
    Ok(Json(view))
}

async fn make_move(
    State(state): State<AppState>,
    player: AuthenticatedPlayer,
    Path(session_id): Path<String>,
    payload: Result<Json<MoveRequest>, JsonRejection>,
) -> Result<Json<MoveResult>, ApiError> {
    let Json(request) = payload?;
    debug!(
        "Player {} requests {}{} in {}",
        player.player_id, request.from, request.to, session_id
    );
    let result = state
        .game_session_service
        .make_move(
            &player.player_id,
            &session_id,
            &request.from,
            &request.to,
            request.promotion.as_deref(),
        )
        .await?;
    Ok(Json(result))
}

async fn resign(
    State(state): State<AppState>,
    player: AuthenticatedPlayer,
    Path(session_id): Path<String>,
) -> Result<Json<MoveResult>, ApiError> {
    let result = state
        .game_session_service
        .resign(&player.player_id, &session_id)
        .await?;
    Ok(Json(result))
}

async fn clear_board(
    State(state): State<AppState>,
    player: AuthenticatedPlayer,
    Path(session_id): Path<String>,
) -> Result<Json<MoveResult>, ApiError> {
    // Only a seated player may reset the board
    state
        .game_session_service
        .load_session(&player.player_id, &session_id)
        .await?;
    let result = state.game_session_service.clear_board(&session_id).await?;
    Ok(Json(result))
}
