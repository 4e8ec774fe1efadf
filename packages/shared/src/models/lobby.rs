use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const JOIN_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const JOIN_CODE_LENGTH: usize = 6;

/// Matchmaking entry pairing players under a join code. The lobby id doubles
/// as the id of the game session played in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lobby {
    pub lobby_id: String,
    pub join_code: String,
    pub host_id: String,
    pub players: Vec<String>,
    pub max_players: u32,
    pub created_at: DateTime<Utc>,
}

impl Lobby {
    pub fn new(host_id: &str, max_players: u32) -> Self {
        Lobby {
            lobby_id: Uuid::new_v4().to_string(),
            join_code: Self::generate_join_code(),
            host_id: host_id.to_string(),
            players: vec![host_id.to_string()],
            max_players,
            created_at: Utc::now(),
        }
    }

    pub fn generate_join_code() -> String {
        let mut rng = rand::thread_rng();
        (0..JOIN_CODE_LENGTH)
            .map(|_| JOIN_CODE_ALPHABET[rng.gen_range(0..JOIN_CODE_ALPHABET.len())] as char)
            .collect()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players as usize
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p == player_id)
    }

    /// The other player of a two-player lobby, if one has joined.
    pub fn opponent_of(&self, player_id: &str) -> Option<&str> {
        self.players
            .iter()
            .find(|p| p.as_str() != player_id)
            .map(String::as_str)
    }
}
