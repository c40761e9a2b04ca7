//! In-process store backend used by tests and offline operation.

use std::io;
use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicBool, Ordering},
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    models::{
        GameStatisticsRecord, NewSession, NewTeam, PuzzleAttemptRecord, SessionBlob,
        SessionRecord, TeamRecord, TeamUpdate,
    },
    storage::{StorageError, StorageResult},
    team_store::TeamStore,
};

use crate::state::state_machine::GamePhase;

#[derive(Default)]
struct Inner {
    teams: DashMap<Uuid, TeamRecord>,
    sessions: DashMap<Uuid, SessionRecord>,
    attempts: Mutex<Vec<PuzzleAttemptRecord>>,
    statistics: Mutex<Vec<GameStatisticsRecord>>,
    unavailable: AtomicBool,
}

/// [`TeamStore`] backed by in-process maps; cheap to clone and share.
#[derive(Clone, Default)]
pub struct MemoryTeamStore {
    inner: Arc<Inner>,
}

impl MemoryTeamStore {
    /// Fresh, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle simulated unavailability; while set, every operation fails
    /// the way an unreachable backend would.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Stored team record, if any.
    pub fn team(&self, id: Uuid) -> Option<TeamRecord> {
        self.inner.teams.get(&id).map(|entry| entry.clone())
    }

    /// Stored session record for a team, if any.
    pub fn session(&self, team_id: Uuid) -> Option<SessionRecord> {
        self.inner.sessions.get(&team_id).map(|entry| entry.clone())
    }

    /// Every recorded puzzle attempt, in insertion order.
    pub fn attempts(&self) -> Vec<PuzzleAttemptRecord> {
        self.inner
            .attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Every recorded completion summary, in insertion order.
    pub fn statistics(&self) -> Vec<GameStatisticsRecord> {
        self.inner
            .statistics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn check_available(&self) -> StorageResult<()> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::unavailable(
                "backend marked unavailable",
                io::Error::new(io::ErrorKind::ConnectionRefused, "simulated outage"),
            ));
        }
        Ok(())
    }
}

impl TeamStore for MemoryTeamStore {
    fn create_team(&self, team: NewTeam) -> BoxFuture<'static, StorageResult<TeamRecord>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_available()?;
            let record = TeamRecord {
                id: Uuid::new_v4(),
                team_name: team.team_name,
                player_names: team.player_names,
                difficulty: team.difficulty,
                game_state: team.game_state,
                start_time: team.start_time,
                current_stage: team.current_stage,
                hints_used: team.hints_used,
                total_time_seconds: 0,
                created_at: None,
            };
            store.inner.teams.insert(record.id, record.clone());
            Ok(record)
        })
    }

    fn update_team(
        &self,
        id: Uuid,
        update: TeamUpdate,
    ) -> BoxFuture<'static, StorageResult<TeamRecord>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_available()?;
            let mut entry = store
                .inner
                .teams
                .get_mut(&id)
                .ok_or_else(|| StorageError::rejected(format!("unknown team `{id}`")))?;
            if let Some(current_stage) = update.current_stage {
                entry.current_stage = current_stage;
            }
            if let Some(game_state) = update.game_state {
                entry.game_state = game_state;
            }
            if let Some(hints_used) = update.hints_used {
                entry.hints_used = hints_used;
            }
            if let Some(total_time_seconds) = update.total_time_seconds {
                entry.total_time_seconds = total_time_seconds;
            }
            Ok(entry.clone())
        })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamRecord>>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_available()?;
            Ok(store.team(id))
        })
    }

    fn list_active_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamRecord>>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_available()?;
            Ok(store
                .inner
                .teams
                .iter()
                .filter(|entry| {
                    matches!(entry.game_state, GamePhase::Playing | GamePhase::Paused)
                })
                .map(|entry| entry.clone())
                .collect())
        })
    }

    fn create_session(
        &self,
        session: NewSession,
    ) -> BoxFuture<'static, StorageResult<SessionRecord>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_available()?;
            let record = SessionRecord {
                id: Uuid::new_v4(),
                team_id: session.team_id,
                session_data: session.session_data,
            };
            store.inner.sessions.insert(record.team_id, record.clone());
            Ok(record)
        })
    }

    fn update_session(
        &self,
        team_id: Uuid,
        blob: SessionBlob,
    ) -> BoxFuture<'static, StorageResult<SessionRecord>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_available()?;
            let mut entry = store
                .inner
                .sessions
                .get_mut(&team_id)
                .ok_or_else(|| {
                    StorageError::rejected(format!("no session for team `{team_id}`"))
                })?;
            entry.session_data = blob;
            Ok(entry.clone())
        })
    }

    fn record_attempt(
        &self,
        attempt: PuzzleAttemptRecord,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_available()?;
            store
                .inner
                .attempts
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(attempt);
            Ok(())
        })
    }

    fn record_statistics(
        &self,
        stats: GameStatisticsRecord,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_available()?;
            store
                .inner
                .statistics
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(stats);
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.check_available() })
    }
}
