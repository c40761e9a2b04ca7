//! Reconciles a previously persisted snapshot at startup.
//!
//! A snapshot is only offered back to the player when it is recent enough
//! and actually contains progress. Anything else, including a snapshot that
//! fails to parse, is silently discarded so startup never blocks on bad
//! local data.

use tracing::{info, warn};

use crate::dao::local_cache::{SnapshotCache, SAVE_KEY};
use crate::error::ServiceError;
use crate::state::{epoch_ms, GameEvent, GamePhase, SharedState, TeamSession};

/// Snapshots older than this are ignored at startup.
pub const MAX_SNAPSHOT_AGE_MS: u64 = 24 * 60 * 60 * 1000;

/// Reads the local snapshot and returns it when it is worth resuming.
///
/// `None` means there is nothing to offer: no snapshot, a corrupt one, one
/// saved more than [`MAX_SNAPSHOT_AGE_MS`] ago, or one with no progress.
pub fn check_saved_game(cache: &dyn SnapshotCache, now_ms: u64) -> Option<TeamSession> {
    let raw = match cache.read(SAVE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            warn!(error = %err, "failed to read local snapshot");
            return None;
        }
    };

    let session: TeamSession = match serde_json::from_str(&raw) {
        Ok(session) => session,
        Err(err) => {
            warn!(error = %err, "discarding corrupt local snapshot");
            return None;
        }
    };

    let saved_at = session.last_saved?;
    if now_ms.saturating_sub(saved_at) > MAX_SNAPSHOT_AGE_MS {
        info!(saved_at, "ignoring stale local snapshot");
        return None;
    }

    let has_progress = session.current_stage > 0 || !session.puzzle_states.is_empty();
    if !has_progress {
        return None;
    }

    Some(session)
}

/// Convenience wrapper over [`check_saved_game`] for a running state.
pub fn offer_saved_game(state: &SharedState) -> Option<TeamSession> {
    check_saved_game(state.cache().as_ref(), epoch_ms())
}

/// Replaces the live session with the snapshot and resumes play.
pub async fn resume_saved_game(
    state: &SharedState,
    snapshot: TeamSession,
) -> Result<GamePhase, ServiceError> {
    info!(
        team_name = %snapshot.team_name,
        stage = snapshot.current_stage,
        "resuming saved game"
    );
    Ok(state
        .dispatch(GameEvent::LoadSavedGame(Box::new(snapshot)))
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::dao::local_cache::MemorySnapshotCache;
    use crate::state::{puzzle_key, Difficulty, PuzzleProgress, TeamInfo};

    const NOW: u64 = 1_700_000_000_000;

    fn saved_session(last_saved: u64) -> TeamSession {
        let mut session = TeamSession::new(
            TeamInfo {
                team_name: "Night Owls".into(),
                player_names: vec!["Mira".into()],
                difficulty: Difficulty::Easy,
            },
            &AppConfig::default().into_catalog(),
        );
        session.game_state = GamePhase::Playing;
        session.current_stage = 2;
        session.puzzle_states.insert(
            puzzle_key(0, "calendar-analysis"),
            PuzzleProgress {
                completed: true,
                solution: "BOARD MEETINGS".into(),
                completed_at: last_saved,
            },
        );
        session.last_saved = Some(last_saved);
        session
    }

    fn cache_with(session: &TeamSession) -> MemorySnapshotCache {
        let cache = MemorySnapshotCache::new();
        cache
            .write(SAVE_KEY, &serde_json::to_string(session).unwrap())
            .unwrap();
        cache
    }

    #[test]
    fn fresh_snapshot_with_progress_is_offered() {
        let cache = cache_with(&saved_session(NOW - 60_000));

        let offered = check_saved_game(&cache, NOW).unwrap();

        assert_eq!(offered.team_name, "Night Owls");
        assert_eq!(offered.current_stage, 2);
    }

    #[test]
    fn snapshot_at_the_age_boundary_is_still_offered() {
        let cache = cache_with(&saved_session(NOW - MAX_SNAPSHOT_AGE_MS));

        assert!(check_saved_game(&cache, NOW).is_some());
    }

    #[test]
    fn stale_snapshot_is_ignored() {
        let cache = cache_with(&saved_session(NOW - MAX_SNAPSHOT_AGE_MS - 1));

        assert!(check_saved_game(&cache, NOW).is_none());
    }

    #[test]
    fn snapshot_without_progress_is_ignored() {
        let mut session = saved_session(NOW - 60_000);
        session.current_stage = 0;
        session.puzzle_states.clear();
        let cache = cache_with(&session);

        assert!(check_saved_game(&cache, NOW).is_none());
    }

    #[test]
    fn corrupt_snapshot_is_discarded() {
        let cache = MemorySnapshotCache::new();
        cache.write(SAVE_KEY, "{not json").unwrap();

        assert!(check_saved_game(&cache, NOW).is_none());
    }

    #[test]
    fn missing_snapshot_yields_nothing() {
        let cache = MemorySnapshotCache::new();

        assert!(check_saved_game(&cache, NOW).is_none());
    }

    #[tokio::test]
    async fn resume_lands_in_playing_with_the_snapshot() {
        let state = crate::state::AppState::new(
            AppConfig::default().into_catalog(),
            std::sync::Arc::new(MemorySnapshotCache::new()),
        );
        let snapshot = saved_session(NOW - 60_000);

        let phase = resume_saved_game(&state, snapshot.clone()).await.unwrap();

        assert_eq!(phase, GamePhase::Playing);
        let live = state.session().await;
        assert_eq!(live.team_name, snapshot.team_name);
        assert_eq!(live.current_stage, 2);
    }
}
