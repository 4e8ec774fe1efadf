//! Runtime configuration, read from the Lambda environment.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Missing(String),
    Invalid { name: String, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(name) => write!(f, "{} environment variable must be set", name),
            ConfigError::Invalid { name, value } => {
                write!(f, "{} has invalid value '{}'", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Bounded exponential backoff for optimistic-concurrency conflicts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (1-based), doubling each time up
    /// to `max_backoff`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(25),
            max_backoff: Duration::from_millis(400),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Tables
    pub records_table: String,
    pub lobbies_table: String,
    pub leaderboard_table: String,
    pub connections_table: String,
    pub users_table: String,

    /// Management endpoint of the websocket stage notifications are posted to
    pub websocket_endpoint: Option<String>,
    pub jwt_secret: String,

    // Coordination
    pub retry: RetryPolicy,
    pub call_deadline: Duration,

    // Ratings
    pub leaderboard_id: String,
    pub k_factor: f64,
    pub default_rating: f64,

    /// Lowercase substrings rejected in club names
    pub blocked_terms: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            records_table: "records".to_string(),
            lobbies_table: "lobbies".to_string(),
            leaderboard_table: "leaderboards".to_string(),
            connections_table: "player-connections".to_string(),
            users_table: "users".to_string(),
            websocket_endpoint: None,
            jwt_secret: String::new(),
            retry: RetryPolicy::default(),
            call_deadline: Duration::from_millis(10_000),
            leaderboard_id: "EloRatings".to_string(),
            k_factor: crate::models::rating::K_FACTOR,
            default_rating: crate::models::rating::DEFAULT_RATING,
            blocked_terms: vec!["banasco".to_string()],
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source. Unset variables
    /// keep their defaults; `JWT_SECRET` has none.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let string = |name: &str, default: String| lookup(name).unwrap_or(default);
        let number = |name: &str, default: u64| -> Result<u64, ConfigError> {
            match lookup(name) {
                Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
                    name: name.to_string(),
                    value,
                }),
                None => Ok(default),
            }
        };

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::Missing("JWT_SECRET".to_string()))?;

        let max_attempts = number(
            "CONFLICT_RETRY_ATTEMPTS",
            defaults.retry.max_attempts as u64,
        )?;
        if max_attempts == 0 || max_attempts > u32::MAX as u64 {
            return Err(ConfigError::Invalid {
                name: "CONFLICT_RETRY_ATTEMPTS".to_string(),
                value: max_attempts.to_string(),
            });
        }
        let retry = RetryPolicy {
            max_attempts: max_attempts as u32,
            initial_backoff: Duration::from_millis(number(
                "CONFLICT_RETRY_BACKOFF_MS",
                defaults.retry.initial_backoff.as_millis() as u64,
            )?),
            max_backoff: Duration::from_millis(number(
                "CONFLICT_RETRY_MAX_BACKOFF_MS",
                defaults.retry.max_backoff.as_millis() as u64,
            )?),
        };

        let blocked_terms = match lookup("CLUB_NAME_BLOCKLIST") {
            Some(list) => list
                .split(',')
                .map(|term| term.trim().to_lowercase())
                .filter(|term| !term.is_empty())
                .collect(),
            None => defaults.blocked_terms,
        };

        Ok(Config {
            records_table: string("RECORDS_TABLE", defaults.records_table),
            lobbies_table: string("LOBBIES_TABLE", defaults.lobbies_table),
            leaderboard_table: string("LEADERBOARD_TABLE", defaults.leaderboard_table),
            connections_table: string("PLAYER_CONNECTIONS_TABLE", defaults.connections_table),
            users_table: string("USERS_TABLE", defaults.users_table),
            websocket_endpoint: lookup("WEBSOCKET_API_ENDPOINT"),
            jwt_secret,
            retry,
            call_deadline: Duration::from_millis(number(
                "CALL_DEADLINE_MS",
                defaults.call_deadline.as_millis() as u64,
            )?),
            leaderboard_id: string("LEADERBOARD_ID", defaults.leaderboard_id),
            k_factor: defaults.k_factor,
            default_rating: defaults.default_rating,
            blocked_terms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_apply() {
        let config = Config::from_lookup(lookup(&[("JWT_SECRET", "secret")])).unwrap();

        assert_eq!(config.leaderboard_id, "EloRatings");
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.call_deadline, Duration::from_secs(10));
        assert_eq!(config.blocked_terms, vec!["banasco"]);
        assert_eq!(config.websocket_endpoint, None);
    }

    #[test]
    fn test_missing_jwt_secret() {
        let result = Config::from_lookup(lookup(&[]));
        assert_eq!(
            result.unwrap_err(),
            ConfigError::Missing("JWT_SECRET".to_string())
        );
    }

    #[test]
    fn test_malformed_number_is_error() {
        let result = Config::from_lookup(lookup(&[
            ("JWT_SECRET", "secret"),
            ("CONFLICT_RETRY_ATTEMPTS", "many"),
        ]));
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_blocklist_is_normalised() {
        let config = Config::from_lookup(lookup(&[
            ("JWT_SECRET", "secret"),
            ("CLUB_NAME_BLOCKLIST", " Foo, BAR ,,"),
        ]))
        .unwrap();

        assert_eq!(config.blocked_terms, vec!["foo", "bar"]);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.backoff_for(1), Duration::from_millis(25));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(50));
        assert_eq!(policy.backoff_for(4), Duration::from_millis(200));
        assert_eq!(policy.backoff_for(10), Duration::from_millis(400));
    }
}
