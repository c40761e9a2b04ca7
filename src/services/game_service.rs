//! High-level game operations layered on the dispatcher.
//!
//! Every operation here mutates the session through [`AppState::dispatch`],
//! so the reducer's invariants and the local snapshot policy apply uniformly.
//! Remote writes other than team creation are best effort: a failure is
//! logged and the local game keeps going.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::dao::local_cache::SAVE_KEY;
use crate::dao::models::{
    GameStatisticsRecord, NewSession, NewTeam, PuzzleAttemptRecord, SessionBlob, TeamRecord,
    TeamUpdate,
};
use crate::dao::storage::StorageResult;
use crate::dao::team_store::TeamStore;
use crate::error::ServiceError;
use crate::state::{epoch_ms, GameEvent, GamePhase, GameStats, SharedState, TeamInfo, TeamSession};

/// Result of submitting an answer for the active stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// The answer matched the puzzle solution.
    Correct,
    /// The answer did not match; carries the updated attempt count.
    Incorrect {
        /// Incorrect attempts recorded so far for this puzzle.
        attempts: u32,
    },
}

/// Starts a fresh game for the given team.
///
/// Installs a new session, registers the team remotely when a store is
/// available, then transitions into `Playing`. When the remote registration
/// fails the game still starts, with no team id, and the remote side is
/// simply skipped for the rest of the run.
pub async fn start_game(
    state: &SharedState,
    info: TeamInfo,
) -> Result<Option<Uuid>, ServiceError> {
    info.validate()
        .map_err(|err| ServiceError::InvalidInput(format!("invalid team info: {err}")))?;

    state
        .install_session(TeamSession::new(info.clone(), state.catalog()))
        .await;

    let team_id = match state.team_store().await {
        Some(store) => match create_remote_records(&store, &info).await {
            Ok(id) => {
                info!(team_id = %id, team_name = %info.team_name, "registered team remotely");
                state.set_team_id(id).await;
                Some(id)
            }
            Err(err) => {
                warn!(error = %err, "remote team registration failed, continuing local-only");
                None
            }
        },
        None => None,
    };

    state.dispatch(GameEvent::StartGame).await?;
    Ok(team_id)
}

async fn create_remote_records(
    store: &Arc<dyn TeamStore>,
    info: &TeamInfo,
) -> StorageResult<Uuid> {
    let team = store.create_team(NewTeam::starting_now(info, epoch_ms())).await?;
    store
        .create_session(NewSession {
            team_id: team.id,
            session_data: SessionBlob::default(),
        })
        .await?;
    Ok(team.id)
}

/// Checks an answer against the current stage's puzzle and records the result.
///
/// A correct answer marks the puzzle completed (idempotently); an incorrect
/// one bumps the per-puzzle attempt counter. Either way the attempt is pushed
/// to the remote store when one is connected.
pub async fn submit_answer(
    state: &SharedState,
    puzzle_id: &str,
    answer: &str,
) -> Result<AnswerOutcome, ServiceError> {
    let stage_index = state.session().await.current_stage;
    let Some(puzzle) = state.catalog().puzzle(stage_index, puzzle_id) else {
        return Err(ServiceError::NotFound(format!(
            "no puzzle `{puzzle_id}` in stage {stage_index}"
        )));
    };

    let correct = puzzle.matches(answer);
    if correct {
        state
            .dispatch(GameEvent::CompletePuzzle {
                puzzle_id: puzzle_id.to_owned(),
                solution: answer.trim().to_owned(),
            })
            .await?;
    } else {
        state
            .dispatch(GameEvent::RecordIncorrectAttempt {
                puzzle_id: puzzle_id.to_owned(),
            })
            .await?;
    }

    record_attempt_remote(state, stage_index, puzzle_id, answer, correct).await;

    if correct {
        Ok(AnswerOutcome::Correct)
    } else {
        Ok(AnswerOutcome::Incorrect {
            attempts: state.incorrect_attempts(puzzle_id).await,
        })
    }
}

async fn record_attempt_remote(
    state: &SharedState,
    stage_index: usize,
    puzzle_id: &str,
    answer: &str,
    correct: bool,
) {
    let Some(store) = state.team_store().await else {
        return;
    };
    let session = state.session().await;
    let Some(team_id) = session.team_id else {
        return;
    };
    let attempt = PuzzleAttemptRecord {
        team_id,
        stage_index,
        puzzle_id: puzzle_id.to_owned(),
        attempt_answer: answer.to_owned(),
        is_correct: correct,
        time_spent_seconds: session.elapsed_seconds(epoch_ms()),
    };
    if let Err(err) = store.record_attempt(attempt).await {
        warn!(error = %err, %puzzle_id, "failed to record puzzle attempt remotely");
    }
}

/// Burns one hint and returns how many remain for the difficulty budget.
pub async fn use_hint(state: &SharedState) -> Result<u32, ServiceError> {
    state.dispatch(GameEvent::UseHint).await?;
    Ok(state.available_hints().await)
}

/// Pauses the running game.
pub async fn pause(state: &SharedState) -> Result<GamePhase, ServiceError> {
    Ok(state.dispatch(GameEvent::PauseGame).await?)
}

/// Resumes a paused game.
pub async fn resume(state: &SharedState) -> Result<GamePhase, ServiceError> {
    Ok(state.dispatch(GameEvent::ResumeGame).await?)
}

/// Moves to the next stage once every puzzle in the current one is solved.
///
/// Returns the new current stage index.
pub async fn advance_stage(state: &SharedState) -> Result<usize, ServiceError> {
    state.dispatch(GameEvent::AdvanceStage).await?;
    Ok(state.session().await.current_stage)
}

/// Jumps back to an already-reached stage.
pub async fn go_to_stage(state: &SharedState, stage_index: usize) -> Result<(), ServiceError> {
    state.dispatch(GameEvent::GoToStage { stage_index }).await?;
    Ok(())
}

/// Finishes the game and reports the final statistics remotely.
///
/// The remote team row and the statistics table are both updated best
/// effort; the returned stats come from the local session either way.
pub async fn complete_game(state: &SharedState) -> Result<GameStats, ServiceError> {
    state.dispatch(GameEvent::CompleteGame).await?;
    let session = state.session().await;

    // A finished game must never be offered for resume on the next startup.
    if let Err(err) = state.cache().delete(SAVE_KEY) {
        warn!(error = %err, "failed to clear local snapshot after completion");
    }

    if let Some(store) = state.team_store().await {
        if let Some(team_id) = session.team_id {
            let update = TeamUpdate {
                current_stage: Some(session.current_stage),
                game_state: Some(GamePhase::Completed),
                hints_used: Some(session.hints_used),
                total_time_seconds: Some(session.game_stats.total_time / 1000),
            };
            if let Err(err) = store.update_team(team_id, update).await {
                warn!(error = %err, %team_id, "failed to mark team completed remotely");
            }
            let stats = GameStatisticsRecord::from_completed(&session, team_id);
            if let Err(err) = store.record_statistics(stats).await {
                warn!(error = %err, %team_id, "failed to record final statistics remotely");
            }
        }
    }

    Ok(session.game_stats.clone())
}

/// Deletes the local snapshot so the next startup offers no resume.
pub fn abandon_save(state: &SharedState) -> Result<(), ServiceError> {
    state.cache().delete(SAVE_KEY)?;
    Ok(())
}

/// Lists teams currently playing or paused, from the remote store.
pub async fn list_active_teams(state: &SharedState) -> Result<Vec<TeamRecord>, ServiceError> {
    let store = state.team_store().await.ok_or(ServiceError::Degraded)?;
    Ok(store.list_active_teams().await?)
}
