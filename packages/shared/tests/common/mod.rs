#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use shared::config::RetryPolicy;
use shared::models::rating::{DEFAULT_RATING, K_FACTOR};
use shared::models::record::{FieldFilter, FieldSet, FieldWrite, Partition, QueryRow};
use shared::repositories::errors::record_store_errors::RecordStoreError;
use shared::repositories::leaderboard_repository::InMemoryLeaderboardRepository;
use shared::repositories::lobby_repository::InMemoryLobbyRepository;
use shared::repositories::player_name_repository::InMemoryPlayerNameRepository;
use shared::repositories::record_store::{InMemoryRecordStore, RecordStore};
use shared::repositories::websocket_repository::InMemoryWebSocketRepository;
use shared::services::club_service::ClubService;
use shared::services::game_session_service::GameSessionService;
use shared::services::notification_service::NotificationService;
use shared::services::rating_service::RatingService;

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 8,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(4),
    }
}

/// Record store wrapper for steering conflicts from a test.
///
/// With `always_conflict` set every write is rejected as stale. A queued
/// rival write is applied unconditionally just before the next write to its
/// record, so the caller's guards no longer match. A write queued on a read
/// lands right after that read returns. Writes to a failing record are
/// rejected as an upstream error.
#[derive(Default)]
pub struct ContendedStore {
    inner: InMemoryRecordStore,
    always_conflict: AtomicBool,
    rival: Mutex<Option<(String, Vec<FieldWrite>)>>,
    after_read: Mutex<Option<(String, Partition, Vec<FieldWrite>)>>,
    failing_record: Mutex<Option<String>>,
    pub write_attempts: AtomicU32,
}

impl ContendedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_always_conflict(&self, enabled: bool) {
        self.always_conflict.store(enabled, Ordering::SeqCst);
    }

    pub fn queue_rival_write(&self, record_id: &str, writes: Vec<FieldWrite>) {
        *self.rival.lock() = Some((record_id.to_string(), writes));
    }

    pub fn queue_write_after_read(
        &self,
        record_id: &str,
        partition: Partition,
        writes: Vec<FieldWrite>,
    ) {
        *self.after_read.lock() = Some((record_id.to_string(), partition, writes));
    }

    pub fn fail_writes_to(&self, record_id: Option<&str>) {
        *self.failing_record.lock() = record_id.map(str::to_string);
    }

    pub fn attempts(&self) -> u32 {
        self.write_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for ContendedStore {
    async fn get_fields(
        &self,
        record_id: &str,
        partition: Partition,
        fields: &[&str],
    ) -> Result<FieldSet, RecordStoreError> {
        let read = self.inner.get_fields(record_id, partition, fields).await?;
        let queued = {
            let mut queued = self.after_read.lock();
            match queued.as_ref() {
                Some((id, p, _)) if id == record_id && *p == partition => queued.take(),
                _ => None,
            }
        };
        if let Some((id, _, writes)) = queued {
            self.inner.set_fields(&id, writes).await?;
        }
        Ok(read)
    }

    async fn set_fields(
        &self,
        record_id: &str,
        writes: Vec<FieldWrite>,
    ) -> Result<(), RecordStoreError> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        if self.always_conflict.load(Ordering::SeqCst) {
            return Err(RecordStoreError::Conflict(format!(
                "forced conflict on {}",
                record_id
            )));
        }
        if self.failing_record.lock().as_deref() == Some(record_id) {
            return Err(RecordStoreError::DynamoDb("throttled".to_string()));
        }

        let rival = {
            let mut queued = self.rival.lock();
            match queued.as_ref() {
                Some((id, _)) if id == record_id => queued.take(),
                _ => None,
            }
        };
        if let Some((id, rival_writes)) = rival {
            self.inner.set_fields(&id, rival_writes).await?;
        }
        self.inner.set_fields(record_id, writes).await
    }

    async fn delete_record(
        &self,
        record_id: &str,
        partition: Partition,
    ) -> Result<(), RecordStoreError> {
        self.inner.delete_record(record_id, partition).await
    }

    async fn query(
        &self,
        partition: Partition,
        filters: &[FieldFilter],
        fields: &[&str],
    ) -> Result<Vec<QueryRow>, RecordStoreError> {
        self.inner.query(partition, filters, fields).await
    }
}

pub struct SessionHarness {
    pub sessions: GameSessionService,
    pub records: Arc<ContendedStore>,
    pub sockets: Arc<InMemoryWebSocketRepository>,
    pub leaderboard: Arc<InMemoryLeaderboardRepository>,
}

pub fn session_harness() -> SessionHarness {
    let records = Arc::new(ContendedStore::new());
    let sockets = Arc::new(InMemoryWebSocketRepository::new());
    let leaderboard = Arc::new(InMemoryLeaderboardRepository::new());
    let sessions = GameSessionService::new(
        records.clone(),
        Arc::new(InMemoryLobbyRepository::new()),
        RatingService::new(leaderboard.clone(), "EloRatings", K_FACTOR, DEFAULT_RATING),
        NotificationService::new(sockets.clone()),
        fast_retry(),
        Duration::from_secs(5),
    );
    SessionHarness {
        sessions,
        records,
        sockets,
        leaderboard,
    }
}

pub struct ClubHarness {
    pub clubs: ClubService,
    pub records: Arc<ContendedStore>,
    pub names: Arc<InMemoryPlayerNameRepository>,
}

pub fn club_harness() -> ClubHarness {
    let records = Arc::new(ContendedStore::new());
    let names = Arc::new(InMemoryPlayerNameRepository::new());
    let clubs = ClubService::new(
        records.clone(),
        names.clone(),
        fast_retry(),
        Duration::from_secs(5),
        vec!["banasco".to_string()],
    );
    ClubHarness {
        clubs,
        records,
        names,
    }
}
