//! Background task pushing session progress to the remote store.
//!
//! The supervisor wakes on a fixed interval, snapshots the session, and
//! mirrors it to the remote team and session records. Pushes are best
//! effort: a failed push is logged, counted, and retried on the next tick
//! with no backoff. Shutdown is cooperative and never aborts a push that
//! is already in flight.

use std::time::Duration;

use tokio::{sync::watch, task::JoinHandle, time::sleep};
use tracing::{debug, info, warn};

use crate::dao::models::{SessionBlob, TeamUpdate};
use crate::error::ServiceError;
use crate::state::{epoch_ms, GamePhase, SharedState};

/// Interval between remote pushes.
pub const DEFAULT_PUSH_INTERVAL: Duration = Duration::from_secs(10);

/// Rolling counters describing what the supervisor has done so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Epoch milliseconds of the most recent push attempt.
    pub last_attempt: Option<u64>,
    /// Epoch milliseconds of the most recent successful push.
    pub last_success: Option<u64>,
    /// Epoch milliseconds of the most recent failed push.
    pub last_failure: Option<u64>,
    /// Number of pushes that reached the remote store.
    pub pushes_ok: u64,
    /// Number of pushes that failed.
    pub pushes_failed: u64,
}

/// Handle to a running supervisor: observe its reports, stop it, await it.
pub struct SyncHandle {
    shutdown: watch::Sender<bool>,
    reports: watch::Receiver<SyncReport>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Subscribe to report updates. The receiver sees a new value after
    /// every push attempt.
    pub fn reports(&self) -> watch::Receiver<SyncReport> {
        self.reports.clone()
    }

    /// Current report snapshot.
    pub fn report(&self) -> SyncReport {
        self.reports.borrow().clone()
    }

    /// Ask the supervisor to stop after any in-flight push completes.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Wait for the supervisor task to finish.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

/// Spawn the supervisor loop on the current runtime.
pub fn spawn(state: SharedState, interval: Duration) -> SyncHandle {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let (report_tx, report_rx) = watch::channel(SyncReport::default());

    let task = tokio::spawn(async move {
        info!(interval_secs = interval.as_secs(), "sync supervisor started");
        loop {
            tokio::select! {
                _ = sleep(interval) => {}
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                    continue;
                }
            }

            let now = epoch_ms();
            match push_once(&state).await {
                Ok(true) => {
                    debug!("pushed session progress to remote store");
                    report_tx.send_modify(|report| {
                        report.last_attempt = Some(now);
                        report.last_success = Some(now);
                        report.pushes_ok += 1;
                    });
                }
                Ok(false) => {
                    debug!("nothing to push this tick");
                }
                Err(err) => {
                    warn!(error = %err, "periodic remote push failed");
                    report_tx.send_modify(|report| {
                        report.last_attempt = Some(now);
                        report.last_failure = Some(now);
                        report.pushes_failed += 1;
                    });
                }
            }

            // A shutdown requested while a push was in flight lands here.
            if *shutdown_rx.borrow() {
                break;
            }
        }
        info!("sync supervisor stopped");
    });

    SyncHandle {
        shutdown: shutdown_tx,
        reports: report_rx,
        task,
    }
}

/// Push the current session to the remote store, once.
///
/// Returns `Ok(false)` when there is nothing to do: the game is not in the
/// playing phase, the session has no remote team id, or no store is
/// installed. The team row and the session blob are two independent
/// writes; the second is skipped when the first fails.
pub async fn push_once(state: &SharedState) -> Result<bool, ServiceError> {
    let session = state.session().await;
    if session.game_state != GamePhase::Playing {
        return Ok(false);
    }
    let Some(team_id) = session.team_id else {
        return Ok(false);
    };
    let Some(store) = state.team_store().await else {
        return Ok(false);
    };

    let now = epoch_ms();
    store
        .update_team(team_id, TeamUpdate::progress(&session, now))
        .await?;
    store
        .update_session(team_id, SessionBlob::from(&session))
        .await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::AppConfig;
    use crate::dao::local_cache::MemorySnapshotCache;
    use crate::dao::team_store::MemoryTeamStore;
    use crate::services::game_service;
    use crate::state::{AppState, Difficulty, TeamInfo};

    fn team_info() -> TeamInfo {
        TeamInfo {
            team_name: "Clock Tower Crew".into(),
            player_names: vec!["Jo".into()],
            difficulty: Difficulty::Hard,
        }
    }

    fn fresh_state() -> SharedState {
        AppState::new(
            AppConfig::default().into_catalog(),
            Arc::new(MemorySnapshotCache::new()),
        )
    }

    #[tokio::test]
    async fn push_once_is_a_no_op_before_the_game_starts() {
        let state = fresh_state();
        state
            .install_team_store(Arc::new(MemoryTeamStore::new()))
            .await;

        assert!(!push_once(&state).await.unwrap());
    }

    #[tokio::test]
    async fn push_once_is_a_no_op_without_a_team_id() {
        let state = fresh_state();
        game_service::start_game(&state, team_info()).await.unwrap();
        state
            .install_team_store(Arc::new(MemoryTeamStore::new()))
            .await;

        assert!(!push_once(&state).await.unwrap());
    }

    #[tokio::test]
    async fn push_once_mirrors_team_and_session_records() {
        let state = fresh_state();
        let store = MemoryTeamStore::new();
        state.install_team_store(Arc::new(store.clone())).await;
        let team_id = game_service::start_game(&state, team_info())
            .await
            .unwrap()
            .unwrap();
        let puzzle = state.catalog().stage(0).unwrap().puzzles[0].clone();
        game_service::submit_answer(&state, &puzzle.id, &puzzle.solution)
            .await
            .unwrap();

        assert!(push_once(&state).await.unwrap());

        let record = store.team(team_id).unwrap();
        assert_eq!(record.game_state, GamePhase::Playing);
        let session = store.session(team_id).unwrap();
        assert_eq!(session.session_data.puzzle_states.len(), 1);
    }

    #[tokio::test]
    async fn push_once_is_a_no_op_while_paused() {
        let state = fresh_state();
        let store = MemoryTeamStore::new();
        state.install_team_store(Arc::new(store)).await;
        game_service::start_game(&state, team_info()).await.unwrap();
        game_service::pause(&state).await.unwrap();

        assert!(!push_once(&state).await.unwrap());
    }

    #[tokio::test]
    async fn push_once_surfaces_store_failures() {
        let state = fresh_state();
        let store = MemoryTeamStore::new();
        state.install_team_store(Arc::new(store.clone())).await;
        game_service::start_game(&state, team_info()).await.unwrap();
        store.set_unavailable(true);

        assert!(push_once(&state).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn supervisor_pushes_on_the_interval_and_reports() {
        let state = fresh_state();
        let store = MemoryTeamStore::new();
        state.install_team_store(Arc::new(store.clone())).await;
        game_service::start_game(&state, team_info()).await.unwrap();

        let handle = spawn(state.clone(), Duration::from_secs(10));
        let mut reports = handle.reports();
        reports.changed().await.unwrap();

        let report = handle.report();
        assert!(report.pushes_ok >= 1);
        assert_eq!(report.pushes_failed, 0);
        assert!(report.last_success.is_some());
        let team_id = state.session().await.team_id.unwrap();
        assert_eq!(store.team(team_id).unwrap().game_state, GamePhase::Playing);

        handle.shutdown();
        handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn supervisor_counts_failed_pushes() {
        let state = fresh_state();
        let store = MemoryTeamStore::new();
        state.install_team_store(Arc::new(store.clone())).await;
        game_service::start_game(&state, team_info()).await.unwrap();
        store.set_unavailable(true);

        let handle = spawn(state, Duration::from_secs(10));
        let mut reports = handle.reports();
        reports.changed().await.unwrap();

        let report = handle.report();
        assert!(report.pushes_failed >= 1);
        assert_eq!(report.pushes_ok, 0);
        assert!(report.last_failure.is_some());

        handle.shutdown();
        handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_the_supervisor() {
        let state = fresh_state();
        let handle = spawn(state, Duration::from_secs(10));

        handle.shutdown();
        handle.join().await;
    }
}
