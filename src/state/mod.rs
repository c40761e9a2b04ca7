//! Shared application state: the session container and its dispatch entry point.

/// The team session entity and its derived queries.
pub mod session;
/// Events and the pure transition function.
pub mod state_machine;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};
use tracing::warn;

use crate::{
    catalog::PuzzleCatalog,
    dao::{
        local_cache::{SAVE_KEY, SnapshotCache},
        team_store::TeamStore,
    },
};

pub use self::session::{
    Difficulty, GameStats, PuzzleProgress, TeamInfo, TeamSession, epoch_ms, puzzle_key,
};
pub use self::state_machine::{DispatchError, EventKind, GameEvent, GamePhase};

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

/// Central application state owning the session, the catalog, and the two
/// persistence backends.
///
/// Dispatch is serialized through the session's write lock, so events apply
/// strictly in dispatch order and every local snapshot reflects a state at
/// least as new as the previous one.
pub struct AppState {
    catalog: PuzzleCatalog,
    session: RwLock<TeamSession>,
    team_store: RwLock<Option<Arc<dyn TeamStore>>>,
    cache: Arc<dyn SnapshotCache>,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned
    /// cheaply.
    ///
    /// The application starts in degraded (local-only) mode until a remote
    /// store is installed.
    pub fn new(catalog: PuzzleCatalog, cache: Arc<dyn SnapshotCache>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let session = TeamSession::initial(&catalog);
        Arc::new(Self {
            catalog,
            session: RwLock::new(session),
            team_store: RwLock::new(None),
            cache,
            degraded: degraded_tx,
        })
    }

    /// The immutable puzzle catalog.
    pub fn catalog(&self) -> &PuzzleCatalog {
        &self.catalog
    }

    /// The local snapshot cache.
    pub fn cache(&self) -> &Arc<dyn SnapshotCache> {
        &self.cache
    }

    /// Obtain a handle to the current remote store, if one is installed.
    pub async fn team_store(&self) -> Option<Arc<dyn TeamStore>> {
        let guard = self.team_store.read().await;
        guard.as_ref().cloned()
    }

    /// Install a remote store implementation and leave degraded mode.
    pub async fn install_team_store(&self, store: Arc<dyn TeamStore>) {
        {
            let mut guard = self.team_store.write().await;
            *guard = Some(store);
        }
        let _ = self.degraded.send(false);
    }

    /// Remove the current remote store and enter degraded mode.
    pub async fn clear_team_store(&self) {
        {
            let mut guard = self.team_store.write().await;
            guard.take();
        }
        let _ = self.degraded.send(true);
    }

    /// Whether the state is operating without a remote store.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.team_store.read().await;
        guard.is_none()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Replace the session wholesale; used when a new game starts.
    pub async fn install_session(&self, session: TeamSession) {
        let mut guard = self.session.write().await;
        *guard = session;
    }

    /// Record the remote-assigned team identifier on the session.
    pub async fn set_team_id(&self, team_id: uuid::Uuid) {
        let mut guard = self.session.write().await;
        guard.team_id = Some(team_id);
    }

    /// Clone of the current session for read-only consumers.
    pub async fn session(&self) -> TeamSession {
        self.session.read().await.clone()
    }

    /// Current phase of the play-through.
    pub async fn phase(&self) -> GamePhase {
        self.session.read().await.game_state
    }

    /// True iff every puzzle in the current stage is completed.
    pub async fn can_advance(&self) -> bool {
        self.session.read().await.can_advance(&self.catalog)
    }

    /// Whether the given puzzle in the current stage is completed.
    pub async fn is_puzzle_completed(&self, puzzle_id: &str) -> bool {
        self.session.read().await.is_puzzle_completed(puzzle_id)
    }

    /// Failed submission count for the given puzzle in the current stage.
    pub async fn incorrect_attempts(&self, puzzle_id: &str) -> u32 {
        self.session.read().await.incorrect_attempts_for(puzzle_id)
    }

    /// Hints remaining against the difficulty's budget.
    pub async fn available_hints(&self) -> u32 {
        self.session.read().await.available_hints()
    }

    /// Apply one event to the session and persist the local snapshot.
    ///
    /// The snapshot write happens under the same lock as the reducer, before
    /// the dispatch returns, whenever the resulting phase is playing or
    /// paused. A snapshot failure is logged and swallowed; gameplay never
    /// blocks on local persistence.
    pub async fn dispatch(&self, event: GameEvent) -> Result<GamePhase, DispatchError> {
        let mut guard = self.session.write().await;
        let phase = guard.apply(event, &self.catalog, epoch_ms())?;

        if matches!(phase, GamePhase::Playing | GamePhase::Paused) {
            guard.last_saved = Some(epoch_ms());
            match serde_json::to_string(&*guard) {
                Ok(raw) => {
                    if let Err(err) = self.cache.write(SAVE_KEY, &raw) {
                        warn!(error = %err, "failed to write local snapshot");
                    }
                }
                Err(err) => {
                    warn!(error = %err, "failed to serialize local snapshot");
                }
            }
        }

        Ok(phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, dao::local_cache::MemorySnapshotCache};

    fn shared_state() -> SharedState {
        AppState::new(
            AppConfig::default().into_catalog(),
            Arc::new(MemorySnapshotCache::new()),
        )
    }

    fn info() -> TeamInfo {
        TeamInfo {
            team_name: "The Night Shift".into(),
            player_names: vec!["Ada".into()],
            difficulty: Difficulty::Medium,
        }
    }

    #[tokio::test]
    async fn dispatch_writes_snapshot_while_playing() {
        let state = shared_state();
        state
            .install_session(TeamSession::new(info(), state.catalog()))
            .await;

        state.dispatch(GameEvent::StartGame).await.unwrap();
        let raw = state.cache().read(SAVE_KEY).unwrap().expect("snapshot");
        let saved: TeamSession = serde_json::from_str(&raw).unwrap();
        assert_eq!(saved.game_state, GamePhase::Playing);
        assert!(saved.last_saved.is_some());
    }

    #[tokio::test]
    async fn snapshot_not_written_in_setup() {
        let state = shared_state();
        // A rejected event leaves no snapshot behind.
        let _ = state.dispatch(GameEvent::UseHint).await.unwrap_err();
        assert!(state.cache().read(SAVE_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn snapshots_reflect_dispatch_order() {
        let state = shared_state();
        state
            .install_session(TeamSession::new(info(), state.catalog()))
            .await;
        state.dispatch(GameEvent::StartGame).await.unwrap();
        state.dispatch(GameEvent::UseHint).await.unwrap();
        state.dispatch(GameEvent::UseHint).await.unwrap();

        let raw = state.cache().read(SAVE_KEY).unwrap().unwrap();
        let saved: TeamSession = serde_json::from_str(&raw).unwrap();
        assert_eq!(saved.hints_used, 2);
    }

    #[tokio::test]
    async fn degraded_until_store_installed() {
        let state = shared_state();
        let watcher = state.degraded_watcher();
        assert!(state.is_degraded().await);
        assert!(*watcher.borrow());

        let store = Arc::new(crate::dao::team_store::MemoryTeamStore::new());
        state.install_team_store(store).await;
        assert!(!state.is_degraded().await);
        assert!(!*watcher.borrow());

        state.clear_team_store().await;
        assert!(state.is_degraded().await);
    }
}
