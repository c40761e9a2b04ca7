//! Wire entities exchanged with the remote store.
//!
//! Field names match the remote columns (snake_case), while the session blob
//! carries the session's own JSON shape verbatim.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use crate::state::{
    session::{Difficulty, GameStats, PuzzleProgress, TeamInfo, TeamSession},
    state_machine::GamePhase,
};

/// Format an epoch-milliseconds timestamp as RFC 3339 for the remote wire.
pub fn rfc3339(epoch_ms: u64) -> Option<String> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(epoch_ms) * 1_000_000)
        .ok()?
        .format(&Rfc3339)
        .ok()
}

/// Payload for creating a team record; the store assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewTeam {
    /// Display name for the team.
    pub team_name: String,
    /// Ordered player names.
    pub player_names: Vec<String>,
    /// Chosen difficulty.
    pub difficulty: Difficulty,
    /// Phase at creation time; a freshly started game is already `playing`.
    pub game_state: GamePhase,
    /// RFC 3339 start timestamp.
    pub start_time: Option<String>,
    /// Stage index at creation, always zero for a fresh game.
    pub current_stage: usize,
    /// Hints consumed at creation, always zero for a fresh game.
    pub hints_used: u32,
}

impl NewTeam {
    /// Build the creation payload for a fresh game started now.
    pub fn starting_now(info: &TeamInfo, now_ms: u64) -> Self {
        Self {
            team_name: info.team_name.clone(),
            player_names: info.player_names.clone(),
            difficulty: info.difficulty,
            game_state: GamePhase::Playing,
            start_time: rfc3339(now_ms),
            current_stage: 0,
            hints_used: 0,
        }
    }
}

/// Team record as stored remotely.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamRecord {
    /// Identifier assigned by the remote store.
    pub id: Uuid,
    /// Display name for the team.
    pub team_name: String,
    /// Ordered player names.
    pub player_names: Vec<String>,
    /// Chosen difficulty.
    pub difficulty: Difficulty,
    /// Last pushed phase.
    pub game_state: GamePhase,
    /// RFC 3339 start timestamp.
    pub start_time: Option<String>,
    /// Last pushed stage index.
    pub current_stage: usize,
    /// Last pushed hint count.
    pub hints_used: u32,
    /// Last pushed elapsed play time in whole seconds.
    #[serde(default)]
    pub total_time_seconds: u64,
    /// Creation timestamp set by the store, if exposed.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Partial team update; absent fields are left untouched remotely.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TeamUpdate {
    /// New stage index.
    pub current_stage: Option<usize>,
    /// New phase.
    pub game_state: Option<GamePhase>,
    /// New hint count.
    pub hints_used: Option<u32>,
    /// New elapsed play time in whole seconds.
    pub total_time_seconds: Option<u64>,
}

impl TeamUpdate {
    /// The partial update shape the periodic push sends: current stage,
    /// phase, hints, and elapsed time.
    pub fn progress(session: &TeamSession, now_ms: u64) -> Self {
        Self {
            current_stage: Some(session.current_stage),
            game_state: Some(session.game_state),
            hints_used: Some(session.hints_used),
            total_time_seconds: Some(session.elapsed_seconds(now_ms)),
        }
    }
}

/// Progress blob mirrored to the remote session record on every push.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionBlob {
    /// Completed stage indices.
    pub stage_progress: Vec<usize>,
    /// Per-puzzle progress keyed by `"{stage}-{puzzleId}"`.
    pub puzzle_states: IndexMap<String, PuzzleProgress>,
    /// Failed submission counts keyed the same way.
    pub incorrect_attempts: IndexMap<String, u32>,
    /// Cached derived summary.
    pub game_stats: GameStats,
}

impl From<&TeamSession> for SessionBlob {
    fn from(session: &TeamSession) -> Self {
        Self {
            stage_progress: session.completed_stages.clone(),
            puzzle_states: session.puzzle_states.clone(),
            incorrect_attempts: session.incorrect_attempts.clone(),
            game_stats: session.game_stats.clone(),
        }
    }
}

/// Payload for creating the per-team session record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewSession {
    /// Owning team.
    pub team_id: Uuid,
    /// Initial progress blob, empty for a fresh game.
    pub session_data: SessionBlob,
}

/// Session record as stored remotely.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionRecord {
    /// Identifier assigned by the remote store.
    pub id: Uuid,
    /// Owning team.
    pub team_id: Uuid,
    /// Last pushed progress blob.
    pub session_data: SessionBlob,
}

/// One submitted answer, correct or not, recorded for the monitoring view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PuzzleAttemptRecord {
    /// Owning team.
    pub team_id: Uuid,
    /// Stage the puzzle belongs to.
    pub stage_index: usize,
    /// Puzzle identifier within the stage.
    pub puzzle_id: String,
    /// The submitted answer as typed.
    pub attempt_answer: String,
    /// Whether the submission matched the solution.
    pub is_correct: bool,
    /// Elapsed play time at submission, in whole seconds.
    pub time_spent_seconds: u64,
}

/// Final summary written once when a game completes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameStatisticsRecord {
    /// Owning team.
    pub team_id: Uuid,
    /// Total play time in whole seconds.
    pub total_time_seconds: u64,
    /// Hints consumed over the whole game.
    pub hints_used: u32,
    /// Puzzles solved over the whole game.
    pub puzzles_solved: u32,
}

impl GameStatisticsRecord {
    /// Build the completion summary for a finished session.
    pub fn from_completed(session: &TeamSession, team_id: Uuid) -> Self {
        Self {
            team_id,
            total_time_seconds: session.game_stats.total_time / 1000,
            hints_used: session.game_stats.hints_used,
            puzzles_solved: session.game_stats.puzzles_solved,
        }
    }
}
