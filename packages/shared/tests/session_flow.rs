//! End-to-end game session flows over the in-memory stores.

mod common;

use anyhow::Result;
use common::session_harness;
use shared::models::game_session::{fields, Color};
use shared::models::record::{FieldWrite, Partition, Precondition};
use shared::services::chess_service::ChessBoard;
use shared::services::errors::service_errors::ServiceError;

const AFTER_E4_E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";

#[tokio::test]
async fn test_move_out_of_turn_is_rejected_without_writing() -> Result<()> {
    let h = session_harness();
    let hosted = h.sessions.host_game("alice").await?;
    let joined = h.sessions.join_game("bob", &hosted.join_code).await?;
    assert!(!joined.is_white);

    let result = h
        .sessions
        .make_move("bob", &hosted.session_id, "e7", "e5", None)
        .await;

    assert_eq!(result, Err(ServiceError::NotActivePlayer));
    let view = h.sessions.load_session("alice", &hosted.session_id).await?;
    assert_eq!(view.board, joined.board);
    assert_eq!(view.active_color, Color::White);

    let moved = h
        .sessions
        .make_move("alice", &hosted.session_id, "e2", "e4", None)
        .await?;
    assert!(!moved.game_over);
    let view = h.sessions.load_session("bob", &hosted.session_id).await?;
    assert_eq!(view.active_color, Color::Black);
    Ok(())
}

#[tokio::test]
async fn test_sessions_do_not_share_state() -> Result<()> {
    let h = session_harness();
    let game_a = h.sessions.host_game("alice").await?;
    let game_b = h.sessions.host_game("carol").await?;
    h.sessions.join_game("bob", &game_a.join_code).await?;
    let joined_b = h.sessions.join_game("dave", &game_b.join_code).await?;

    h.sessions
        .make_move("alice", &game_a.session_id, "e2", "e4", None)
        .await?;

    let view_b = h.sessions.load_session("carol", &game_b.session_id).await?;
    assert_eq!(view_b.board, joined_b.board);
    let outsider = h
        .sessions
        .make_move("bob", &game_b.session_id, "e7", "e5", None)
        .await;
    assert!(matches!(outsider, Err(ServiceError::Unauthorized(_))));
    Ok(())
}

#[tokio::test]
async fn test_full_game_rejects_third_player() -> Result<()> {
    let h = session_harness();
    let hosted = h.sessions.host_game("alice").await?;
    h.sessions.join_game("bob", &hosted.join_code).await?;

    let result = h.sessions.join_game("carol", &hosted.join_code).await;

    assert!(matches!(result, Err(ServiceError::InvalidState(_))));
    Ok(())
}

#[tokio::test]
async fn test_concurrent_moves_commit_exactly_once() -> Result<()> {
    let h = session_harness();
    let hosted = h.sessions.host_game("alice").await?;
    h.sessions.join_game("bob", &hosted.join_code).await?;

    let (first, second) = tokio::join!(
        h.sessions
            .make_move("alice", &hosted.session_id, "e2", "e4", None),
        h.sessions
            .make_move("alice", &hosted.session_id, "d2", "d4", None),
    );

    let committed = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(committed, 1);
    assert!([first, second]
        .into_iter()
        .any(|r| r == Err(ServiceError::NotActivePlayer)));
    let view = h.sessions.load_session("bob", &hosted.session_id).await?;
    assert_eq!(view.active_color, Color::Black);
    Ok(())
}

#[tokio::test]
async fn test_stale_read_is_retried_against_latest_board() -> Result<()> {
    let h = session_harness();
    let hosted = h.sessions.host_game("alice").await?;
    h.sessions.join_game("bob", &hosted.join_code).await?;

    h.records.queue_rival_write(
        &hosted.session_id,
        vec![FieldWrite::new(
            Partition::Public,
            fields::BOARD,
            &AFTER_E4_E5,
            Precondition::Any,
        )?],
    );
    let attempts_before = h.records.attempts();

    let result = h
        .sessions
        .make_move("alice", &hosted.session_id, "d2", "d4", None)
        .await?;

    let mut expected = ChessBoard::from_fen(AFTER_E4_E5)?;
    expected.make_move("d2", "d4", None)?;
    assert_eq!(result.board, expected.to_fen());
    assert_eq!(h.records.attempts() - attempts_before, 2);
    Ok(())
}

#[tokio::test]
async fn test_persistent_conflict_gives_up() -> Result<()> {
    let h = session_harness();
    let hosted = h.sessions.host_game("alice").await?;
    let joined = h.sessions.join_game("bob", &hosted.join_code).await?;

    h.records.set_always_conflict(true);
    let attempts_before = h.records.attempts();
    let result = h
        .sessions
        .make_move("alice", &hosted.session_id, "e2", "e4", None)
        .await;
    h.records.set_always_conflict(false);

    assert!(matches!(result, Err(ServiceError::Conflict(_))));
    assert_eq!(h.records.attempts() - attempts_before, 8);
    let view = h.sessions.load_session("alice", &hosted.session_id).await?;
    assert_eq!(view.board, joined.board);
    Ok(())
}
