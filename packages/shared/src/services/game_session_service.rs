use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{error, info};

use crate::config::RetryPolicy;
use crate::models::game_session::{
    fields, Color, EndgameType, HostedGame, JoinedSession, MoveResult, SessionView,
};
use crate::models::lobby::Lobby;
use crate::models::notification::{BoardCleared, BoardUpdate, Notification};
use crate::models::rating::GameOutcome;
use crate::models::record::{FieldSet, FieldWrite, Partition, Precondition};
use crate::repositories::errors::lobby_repository_errors::LobbyRepositoryError;
use crate::repositories::lobby_repository::LobbyRepository;
use crate::repositories::record_store::RecordStore;
use crate::services::chess_service::ChessBoard;
use crate::services::concurrency::{retry_on_conflict, with_deadline};
use crate::services::errors::service_errors::ServiceError;
use crate::services::notification_service::NotificationService;
use crate::services::rating_service::RatingService;

const PLAYERS_PER_GAME: u32 = 2;

/// A session record as read, with the guards its next write must present.
struct StoredSession {
    board: String,
    board_guard: Precondition,
    white: Option<String>,
    white_guard: Precondition,
    black: Option<String>,
    black_guard: Precondition,
    game_over: bool,
    game_over_guard: Precondition,
    endgame_type: Option<EndgameType>,
    winner: Option<Color>,
}

impl StoredSession {
    fn from_fields(fields: &FieldSet) -> Result<Self, ServiceError> {
        let (board, board_guard) = fields.value_or_default::<String>(fields::BOARD)?;
        let (white, white_guard) = fields.value_or_default::<Option<String>>(fields::WHITE)?;
        let (black, black_guard) = fields.value_or_default::<Option<String>>(fields::BLACK)?;
        let (game_over, game_over_guard) = fields.value_or_default::<bool>(fields::GAME_OVER)?;
        let (endgame_type, _) =
            fields.value_or_default::<Option<EndgameType>>(fields::ENDGAME_TYPE)?;
        let (winner, _) = fields.value_or_default::<Option<Color>>(fields::WINNER)?;
        Ok(StoredSession {
            board,
            board_guard,
            white,
            white_guard,
            black,
            black_guard,
            game_over,
            game_over_guard,
            endgame_type,
            winner,
        })
    }

    fn exists(&self) -> bool {
        self.board_guard != Precondition::Absent
    }

    fn color_of(&self, player_id: &str) -> Option<Color> {
        if self.white.as_deref() == Some(player_id) {
            Some(Color::White)
        } else if self.black.as_deref() == Some(player_id) {
            Some(Color::Black)
        } else {
            None
        }
    }

    fn player(&self, color: Color) -> Option<&str> {
        match color {
            Color::White => self.white.as_deref(),
            Color::Black => self.black.as_deref(),
        }
    }
}

/// Owns game sessions: creation, joining, moves and their outcome.
///
/// A session record lives under the lobby id. The board field's version
/// token serialises moves: of two racing writers only one commits, and the
/// other re-reads and re-validates.
#[derive(Clone)]
pub struct GameSessionService {
    records: Arc<dyn RecordStore + Send + Sync>,
    lobbies: Arc<dyn LobbyRepository + Send + Sync>,
    ratings: RatingService,
    notifications: NotificationService,
    retry: RetryPolicy,
    deadline: Duration,
}

impl GameSessionService {
    pub fn new(
        records: Arc<dyn RecordStore + Send + Sync>,
        lobbies: Arc<dyn LobbyRepository + Send + Sync>,
        ratings: RatingService,
        notifications: NotificationService,
        retry: RetryPolicy,
        deadline: Duration,
    ) -> Self {
        Self {
            records,
            lobbies,
            ratings,
            notifications,
            retry,
            deadline,
        }
    }

    /// Opens a two-player lobby and a session in which the host plays white.
    pub async fn host_game(&self, host_id: &str) -> Result<HostedGame, ServiceError> {
        with_deadline(self.deadline, "host_game", async {
            let lobby = self.lobbies.create_lobby(host_id, PLAYERS_PER_GAME).await?;
            self.records
                .set_fields(
                    &lobby.lobby_id,
                    vec![
                        FieldWrite::new(
                            Partition::Public,
                            fields::BOARD,
                            &ChessBoard::new().to_fen(),
                            Precondition::Absent,
                        )?,
                        FieldWrite::new(
                            Partition::Public,
                            fields::WHITE,
                            &host_id,
                            Precondition::Absent,
                        )?,
                        FieldWrite::new(
                            Partition::Public,
                            fields::GAME_OVER,
                            &false,
                            Precondition::Absent,
                        )?,
                    ],
                )
                .await?;

            info!("Player {} hosted game {}", host_id, lobby.lobby_id);
            Ok(HostedGame {
                session_id: lobby.lobby_id,
                join_code: lobby.join_code,
            })
        })
        .await
    }

    /// Joins the game behind `join_code`. A player already seated gets the
    /// current session back instead of an error.
    pub async fn join_game(
        &self,
        player_id: &str,
        join_code: &str,
    ) -> Result<JoinedSession, ServiceError> {
        with_deadline(self.deadline, "join_game", async {
            match self.lobbies.join_lobby_by_code(player_id, join_code).await {
                Ok(lobby) => {
                    let joined = retry_on_conflict(&self.retry, "join_game", || {
                        self.finalize_session(&lobby, player_id)
                    })
                    .await?;
                    info!("Player {} joined game {}", player_id, lobby.lobby_id);

                    let for_opponent = JoinedSession {
                        session_id: joined.session_id.clone(),
                        board: joined.board.clone(),
                        opponent_id: player_id.to_string(),
                        is_white: !joined.is_white,
                    };
                    self.notifications
                        .notify(
                            &joined.opponent_id,
                            &Notification::OpponentJoined(for_opponent),
                        )
                        .await;
                    Ok(joined)
                }
                Err(LobbyRepositoryError::AlreadyMember) => self.rejoin(player_id, join_code).await,
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn rejoin(&self, player_id: &str, join_code: &str) -> Result<JoinedSession, ServiceError> {
        let lobby = self
            .lobbies
            .get_joined_lobbies(player_id)
            .await?
            .into_iter()
            .find(|lobby| lobby.join_code == join_code)
            .ok_or_else(|| ServiceError::NotFound("Game".to_string()))?;

        info!("Player {} rejoining game {}", player_id, lobby.lobby_id);
        retry_on_conflict(&self.retry, "rejoin_game", || {
            self.finalize_session(&lobby, player_id)
        })
        .await
    }

    /// Assigns colours and the starting board exactly once per session, in
    /// one write guarded by the fields being absent. Later calls only read.
    async fn finalize_session(
        &self,
        lobby: &Lobby,
        player_id: &str,
    ) -> Result<JoinedSession, ServiceError> {
        let opponent_id = lobby
            .opponent_of(player_id)
            .ok_or_else(|| ServiceError::InvalidState("Waiting for an opponent to join".to_string()))?
            .to_string();

        let read = self
            .records
            .get_fields(&lobby.lobby_id, Partition::Public, fields::ALL)
            .await?;
        let session = StoredSession::from_fields(&read)?;

        if let Some(color) = session.color_of(player_id) {
            if session.player(color.opposite()).is_some() {
                return Ok(JoinedSession {
                    session_id: lobby.lobby_id.clone(),
                    board: session.board,
                    opponent_id,
                    is_white: color == Color::White,
                });
            }
        }

        let player_is_white = match (session.white.as_deref(), session.black.as_deref()) {
            (Some(white), _) if white == opponent_id => false,
            (_, Some(black)) if black == opponent_id => true,
            (None, None) => rand::thread_rng().gen_bool(0.5),
            _ => {
                return Err(ServiceError::InvalidState(format!(
                    "Session {} is assigned to other players",
                    lobby.lobby_id
                )))
            }
        };
        let (white, black) = if player_is_white {
            (player_id, opponent_id.as_str())
        } else {
            (opponent_id.as_str(), player_id)
        };

        let board = if session.exists() {
            session.board.clone()
        } else {
            ChessBoard::new().to_fen()
        };

        let mut writes = Vec::new();
        if !session.exists() {
            writes.push(FieldWrite::new(
                Partition::Public,
                fields::BOARD,
                &board,
                Precondition::Absent,
            )?);
            writes.push(FieldWrite::new(
                Partition::Public,
                fields::GAME_OVER,
                &false,
                session.game_over_guard.clone(),
            )?);
        }
        if session.white.is_none() {
            writes.push(FieldWrite::new(
                Partition::Public,
                fields::WHITE,
                &white,
                session.white_guard.clone(),
            )?);
        }
        if session.black.is_none() {
            writes.push(FieldWrite::new(
                Partition::Public,
                fields::BLACK,
                &black,
                session.black_guard.clone(),
            )?);
        }
        self.records.set_fields(&lobby.lobby_id, writes).await?;

        info!(
            "Session {} finalized: white {}, black {}",
            lobby.lobby_id, white, black
        );
        Ok(JoinedSession {
            session_id: lobby.lobby_id.clone(),
            board,
            opponent_id,
            is_white: player_is_white,
        })
    }

    /// Validates and commits a move for the caller. Nothing is written unless
    /// every check passes.
    pub async fn make_move(
        &self,
        player_id: &str,
        session_id: &str,
        from: &str,
        to: &str,
        promotion: Option<&str>,
    ) -> Result<MoveResult, ServiceError> {
        let (result, color, opponent_id) = with_deadline(
            self.deadline,
            "make_move",
            retry_on_conflict(&self.retry, "make_move", || {
                self.try_make_move(player_id, session_id, from, to, promotion)
            }),
        )
        .await?;
        info!(
            "Player {} moved {}{} in session {}",
            player_id, from, to, session_id
        );

        // Committed: ratings and the push must not be cut short by the deadline
        self.conclude(session_id, player_id, color, &opponent_id, &result)
            .await;
        Ok(result)
    }

    async fn try_make_move(
        &self,
        player_id: &str,
        session_id: &str,
        from: &str,
        to: &str,
        promotion: Option<&str>,
    ) -> Result<(MoveResult, Color, String), ServiceError> {
        let session = self.load_for_mutation(session_id).await?;
        let (color, opponent_id) = Self::resolve_party(&session, player_id)?;

        let mut board = ChessBoard::from_fen(&session.board)?;
        if board.turn() != color {
            return Err(ServiceError::NotActivePlayer);
        }
        board.make_move(from, to, promotion)?;

        let result = match board.end_game() {
            Some(end) => MoveResult {
                board: board.to_fen(),
                game_over: true,
                endgame_type: Some(end.endgame_type),
                winner: end.winner,
            },
            None => MoveResult {
                board: board.to_fen(),
                game_over: false,
                endgame_type: None,
                winner: None,
            },
        };
        self.commit(session_id, &session, &result).await?;
        Ok((result, color, opponent_id))
    }

    /// Ends the game with the caller as loser.
    pub async fn resign(
        &self,
        player_id: &str,
        session_id: &str,
    ) -> Result<MoveResult, ServiceError> {
        let (result, color, opponent_id) = with_deadline(
            self.deadline,
            "resign",
            retry_on_conflict(&self.retry, "resign", || {
                self.try_resign(player_id, session_id)
            }),
        )
        .await?;
        info!("Player {} resigned session {}", player_id, session_id);

        self.conclude(session_id, player_id, color, &opponent_id, &result)
            .await;
        Ok(result)
    }

    async fn try_resign(
        &self,
        player_id: &str,
        session_id: &str,
    ) -> Result<(MoveResult, Color, String), ServiceError> {
        let session = self.load_for_mutation(session_id).await?;
        let (color, opponent_id) = Self::resolve_party(&session, player_id)?;

        let mut board = ChessBoard::from_fen(&session.board)?;
        board.resign(color);
        let end = board
            .end_game()
            .ok_or_else(|| ServiceError::InvalidState("Resignation did not end the game".to_string()))?;

        let result = MoveResult {
            board: board.to_fen(),
            game_over: true,
            endgame_type: Some(end.endgame_type),
            winner: end.winner,
        };
        self.commit(session_id, &session, &result).await?;
        Ok((result, color, opponent_id))
    }

    /// Resets the board to the starting position and tells every party.
    /// Recovery tooling, not part of normal play.
    pub async fn clear_board(&self, session_id: &str) -> Result<MoveResult, ServiceError> {
        let result = with_deadline(
            self.deadline,
            "clear_board",
            retry_on_conflict(&self.retry, "clear_board", || {
                self.try_clear_board(session_id)
            }),
        )
        .await?;
        info!("Session {} board cleared", session_id);

        let players = match self.lobbies.get_lobby(session_id).await {
            Ok(lobby) => lobby.players,
            Err(e) => {
                error!(
                    "Session {} cleared but its players could not be notified: {}",
                    session_id, e
                );
                Vec::new()
            }
        };
        let notification = Notification::ClearBoard(BoardCleared {
            session: session_id.to_string(),
        });
        for player_id in &players {
            self.notifications.notify(player_id, &notification).await;
        }
        Ok(result)
    }

    async fn try_clear_board(&self, session_id: &str) -> Result<MoveResult, ServiceError> {
        let read = self
            .records
            .get_fields(session_id, Partition::Public, fields::ALL)
            .await?;
        let session = StoredSession::from_fields(&read)?;
        if !session.exists() {
            return Err(ServiceError::NotFound("Session".to_string()));
        }

        let result = MoveResult {
            board: ChessBoard::new().to_fen(),
            game_over: false,
            endgame_type: None,
            winner: None,
        };
        self.commit(session_id, &session, &result).await?;
        Ok(result)
    }

    /// Full session state for one of its players.
    pub async fn load_session(
        &self,
        player_id: &str,
        session_id: &str,
    ) -> Result<SessionView, ServiceError> {
        with_deadline(self.deadline, "load_session", async {
            let read = self
                .records
                .get_fields(session_id, Partition::Public, fields::ALL)
                .await?;
            let session = StoredSession::from_fields(&read)?;
            if !session.exists() {
                return Err(ServiceError::NotFound("Session".to_string()));
            }
            if session.color_of(player_id).is_none() {
                return Err(ServiceError::Unauthorized(
                    "Player is not part of this session".to_string(),
                ));
            }

            let board = ChessBoard::from_fen(&session.board)?;
            Ok(SessionView {
                session_id: session_id.to_string(),
                board: session.board,
                white_id: session.white,
                black_id: session.black,
                active_color: board.turn(),
                game_over: session.game_over,
                endgame_type: session.endgame_type,
                winner: session.winner,
            })
        })
        .await
    }

    async fn load_for_mutation(&self, session_id: &str) -> Result<StoredSession, ServiceError> {
        let read = self
            .records
            .get_fields(session_id, Partition::Public, fields::ALL)
            .await?;
        let session = StoredSession::from_fields(&read)?;
        if !session.exists() {
            return Err(ServiceError::NotFound("Session".to_string()));
        }
        if session.game_over {
            return Err(ServiceError::InvalidState("Game is already over".to_string()));
        }
        Ok(session)
    }

    fn resolve_party(
        session: &StoredSession,
        player_id: &str,
    ) -> Result<(Color, String), ServiceError> {
        let color = session.color_of(player_id).ok_or_else(|| {
            ServiceError::Unauthorized("Player is not part of this session".to_string())
        })?;
        let opponent_id = session
            .player(color.opposite())
            .ok_or_else(|| ServiceError::InvalidState("Waiting for an opponent to join".to_string()))?;
        Ok((color, opponent_id.to_string()))
    }

    // Board and game-over are written against the tokens read; any racing
    // mutation of the session makes this write fail as a conflict.
    async fn commit(
        &self,
        session_id: &str,
        session: &StoredSession,
        result: &MoveResult,
    ) -> Result<(), ServiceError> {
        self.records
            .set_fields(
                session_id,
                vec![
                    FieldWrite::new(
                        Partition::Public,
                        fields::BOARD,
                        &result.board,
                        session.board_guard.clone(),
                    )?,
                    FieldWrite::new(
                        Partition::Public,
                        fields::GAME_OVER,
                        &result.game_over,
                        session.game_over_guard.clone(),
                    )?,
                    FieldWrite::new(
                        Partition::Public,
                        fields::ENDGAME_TYPE,
                        &result.endgame_type,
                        Precondition::Any,
                    )?,
                    FieldWrite::new(
                        Partition::Public,
                        fields::WINNER,
                        &result.winner,
                        Precondition::Any,
                    )?,
                ],
            )
            .await?;
        Ok(())
    }

    /// Post-commit side effects: ratings once per concluded game, then the
    /// push to the idle player.
    async fn conclude(
        &self,
        session_id: &str,
        player_id: &str,
        color: Color,
        opponent_id: &str,
        result: &MoveResult,
    ) {
        if result.game_over {
            let outcome = match result.winner {
                Some(winner) if winner == color => GameOutcome::Win,
                Some(_) => GameOutcome::Loss,
                None => GameOutcome::Draw,
            };
            if let Err(e) = self
                .ratings
                .update_ratings(player_id, opponent_id, outcome)
                .await
            {
                error!(
                    "Session {} concluded but ratings were not updated: {}",
                    session_id, e
                );
            }
        }

        let update = Notification::BoardUpdated(BoardUpdate {
            session: session_id.to_string(),
            board: result.board.clone(),
            game_over: result.game_over,
            endgame_type: result.endgame_type,
            winner: result.winner,
        });
        self.notifications.notify(opponent_id, &update).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rating::{DEFAULT_RATING, K_FACTOR};
    use crate::repositories::errors::leaderboard_repository_errors::LeaderboardRepositoryError;
    use crate::repositories::leaderboard_repository::{
        InMemoryLeaderboardRepository, LeaderboardRepository,
    };
    use crate::repositories::lobby_repository::InMemoryLobbyRepository;
    use crate::repositories::record_store::InMemoryRecordStore;
    use crate::repositories::websocket_repository::{
        InMemoryWebSocketRepository, WebSocketRepository,
    };

    struct Harness {
        service: GameSessionService,
        sockets: Arc<InMemoryWebSocketRepository>,
        leaderboard: Arc<InMemoryLeaderboardRepository>,
    }

    fn harness() -> Harness {
        let sockets = Arc::new(InMemoryWebSocketRepository::new());
        let leaderboard = Arc::new(InMemoryLeaderboardRepository::new());
        let service = GameSessionService::new(
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(InMemoryLobbyRepository::new()),
            RatingService::new(leaderboard.clone(), "EloRatings", K_FACTOR, DEFAULT_RATING),
            NotificationService::new(sockets.clone()),
            RetryPolicy::default(),
            Duration::from_secs(5),
        );
        Harness {
            service,
            sockets,
            leaderboard,
        }
    }

    #[tokio::test]
    async fn test_host_then_join_assigns_black_to_joiner() {
        let h = harness();
        h.sockets.store_connection("host", "conn-host").await.unwrap();

        let hosted = h.service.host_game("host").await.unwrap();
        let joined = h.service.join_game("guest", &hosted.join_code).await.unwrap();

        assert_eq!(joined.session_id, hosted.session_id);
        assert_eq!(joined.opponent_id, "host");
        assert!(!joined.is_white);
        assert_eq!(joined.board, ChessBoard::new().to_fen());

        let pushed = h.sockets.sent_to("conn-host");
        assert_eq!(pushed.len(), 1);
        let notification: Notification = serde_json::from_str(&pushed[0]).unwrap();
        assert_eq!(
            notification,
            Notification::OpponentJoined(JoinedSession {
                session_id: hosted.session_id.clone(),
                board: joined.board.clone(),
                opponent_id: "guest".to_string(),
                is_white: true,
            })
        );
    }

    #[tokio::test]
    async fn test_rejoin_returns_existing_session() {
        let h = harness();
        let hosted = h.service.host_game("host").await.unwrap();
        let first = h.service.join_game("guest", &hosted.join_code).await.unwrap();
        h.service
            .make_move("host", &hosted.session_id, "e2", "e4", None)
            .await
            .unwrap();

        let again = h.service.join_game("guest", &hosted.join_code).await.unwrap();

        assert_eq!(again.session_id, first.session_id);
        assert_eq!(again.is_white, first.is_white);
        assert_ne!(again.board, first.board);
    }

    #[tokio::test]
    async fn test_host_rejoin_before_opponent_waits() {
        let h = harness();
        let hosted = h.service.host_game("host").await.unwrap();

        let result = h.service.join_game("host", &hosted.join_code).await;

        assert!(matches!(result, Err(ServiceError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_move_notifies_opponent() {
        let h = harness();
        let hosted = h.service.host_game("host").await.unwrap();
        h.service.join_game("guest", &hosted.join_code).await.unwrap();
        h.sockets.store_connection("guest", "conn-guest").await.unwrap();

        let result = h
            .service
            .make_move("host", &hosted.session_id, "e2", "e4", None)
            .await
            .unwrap();

        assert!(!result.game_over);
        let pushed = h.sockets.sent_to("conn-guest");
        assert_eq!(pushed.len(), 1);
        assert!(pushed[0].contains("\"boardUpdated\""));
        assert!(pushed[0].contains(&result.board));
    }

    #[tokio::test]
    async fn test_outsider_cannot_move() {
        let h = harness();
        let hosted = h.service.host_game("host").await.unwrap();
        h.service.join_game("guest", &hosted.join_code).await.unwrap();

        let result = h
            .service
            .make_move("mallory", &hosted.session_id, "e2", "e4", None)
            .await;

        assert!(matches!(result, Err(ServiceError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_illegal_move_leaves_board() {
        let h = harness();
        let hosted = h.service.host_game("host").await.unwrap();
        h.service.join_game("guest", &hosted.join_code).await.unwrap();

        let result = h
            .service
            .make_move("host", &hosted.session_id, "e2", "e5", None)
            .await;

        assert_eq!(result, Err(ServiceError::IllegalMove("e2e5".to_string())));
        let view = h.service.load_session("host", &hosted.session_id).await.unwrap();
        assert_eq!(view.board, ChessBoard::new().to_fen());
    }

    #[tokio::test]
    async fn test_checkmate_rates_once_and_freezes_session() {
        let h = harness();
        let hosted = h.service.host_game("host").await.unwrap();
        h.service.join_game("guest", &hosted.join_code).await.unwrap();
        let id = hosted.session_id.as_str();

        for (player, from, to) in [
            ("host", "f2", "f3"),
            ("guest", "e7", "e5"),
            ("host", "g2", "g4"),
        ] {
            h.service.make_move(player, id, from, to, None).await.unwrap();
        }
        let mate = h.service.make_move("guest", id, "d8", "h4", None).await.unwrap();

        assert!(mate.game_over);
        assert_eq!(mate.endgame_type, Some(EndgameType::Checkmate));
        assert_eq!(mate.winner, Some(Color::Black));

        let scores = h
            .leaderboard
            .get_scores("EloRatings", &["host".to_string(), "guest".to_string()])
            .await
            .unwrap();
        assert_eq!(scores.get("guest"), Some(&1515.0));
        assert_eq!(scores.get("host"), Some(&1485.0));

        let after = h.service.make_move("host", id, "a2", "a3", None).await;
        assert!(matches!(after, Err(ServiceError::InvalidState(_))));
        let resign = h.service.resign("host", id).await;
        assert!(matches!(resign, Err(ServiceError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_resign_awards_opponent() {
        let h = harness();
        let hosted = h.service.host_game("host").await.unwrap();
        h.service.join_game("guest", &hosted.join_code).await.unwrap();

        let result = h.service.resign("guest", &hosted.session_id).await.unwrap();

        assert!(result.game_over);
        assert_eq!(result.endgame_type, Some(EndgameType::Resignation));
        assert_eq!(result.winner, Some(Color::White));
        let view = h.service.load_session("host", &hosted.session_id).await.unwrap();
        assert!(view.game_over);
        assert_eq!(view.winner, Some(Color::White));
    }

    #[tokio::test]
    async fn test_clear_board_resets_and_broadcasts() {
        let h = harness();
        let hosted = h.service.host_game("host").await.unwrap();
        h.service.join_game("guest", &hosted.join_code).await.unwrap();
        h.service.resign("guest", &hosted.session_id).await.unwrap();
        h.sockets.store_connection("host", "conn-host").await.unwrap();
        h.sockets.store_connection("guest", "conn-guest").await.unwrap();

        h.service.clear_board(&hosted.session_id).await.unwrap();

        let view = h.service.load_session("guest", &hosted.session_id).await.unwrap();
        assert!(!view.game_over);
        assert_eq!(view.board, ChessBoard::new().to_fen());
        assert_eq!(view.active_color, Color::White);
        for connection in ["conn-host", "conn-guest"] {
            let pushed = h.sockets.sent_to(connection);
            assert!(pushed.iter().any(|m| m.contains("\"clearBoard\"")));
        }
    }

    #[tokio::test]
    async fn test_load_session_is_party_only() {
        let h = harness();
        let hosted = h.service.host_game("host").await.unwrap();

        let result = h.service.load_session("guest", &hosted.session_id).await;

        assert!(matches!(result, Err(ServiceError::Unauthorized(_))));
    }

    /// Leaderboard whose writes take longer than the call deadline.
    struct SlowLeaderboard {
        inner: InMemoryLeaderboardRepository,
        delay: Duration,
    }

    #[async_trait::async_trait]
    impl LeaderboardRepository for SlowLeaderboard {
        async fn get_scores(
            &self,
            leaderboard_id: &str,
            player_ids: &[String],
        ) -> Result<std::collections::HashMap<String, f64>, LeaderboardRepositoryError> {
            self.inner.get_scores(leaderboard_id, player_ids).await
        }

        async fn set_score(
            &self,
            leaderboard_id: &str,
            player_id: &str,
            score: f64,
        ) -> Result<(), LeaderboardRepositoryError> {
            tokio::time::sleep(self.delay).await;
            self.inner.set_score(leaderboard_id, player_id, score).await
        }
    }

    #[tokio::test]
    async fn test_deadline_does_not_cut_off_ratings_after_commit() {
        let sockets = Arc::new(InMemoryWebSocketRepository::new());
        let leaderboard = Arc::new(SlowLeaderboard {
            inner: InMemoryLeaderboardRepository::new(),
            delay: Duration::from_millis(150),
        });
        let service = GameSessionService::new(
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(InMemoryLobbyRepository::new()),
            RatingService::new(leaderboard.clone(), "EloRatings", K_FACTOR, DEFAULT_RATING),
            NotificationService::new(sockets.clone()),
            RetryPolicy::default(),
            Duration::from_millis(200),
        );
        let hosted = service.host_game("host").await.unwrap();
        service.join_game("guest", &hosted.join_code).await.unwrap();
        sockets.store_connection("host", "conn-host").await.unwrap();

        let result = service.resign("guest", &hosted.session_id).await.unwrap();

        assert!(result.game_over);
        let scores = leaderboard
            .get_scores("EloRatings", &["host".to_string(), "guest".to_string()])
            .await
            .unwrap();
        assert_eq!(scores.get("host"), Some(&1515.0));
        assert_eq!(scores.get("guest"), Some(&1485.0));
        let pushed = sockets.sent_to("conn-host");
        assert!(pushed.iter().any(|m| m.contains("\"boardUpdated\"")));
    }
}
