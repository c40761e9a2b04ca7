//! The team session entity: the full progress record for one play-through.

use std::time::{SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{catalog::PuzzleCatalog, state::state_machine::GamePhase};

/// Milliseconds since the Unix epoch; the session timestamps wall-clock time
/// the same way the browser runtime it replaces did.
pub fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

/// Difficulty level chosen at session start; fixes the hint budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Five hints available.
    Easy,
    /// Three hints available.
    Medium,
    /// One hint available.
    Hard,
}

impl Difficulty {
    /// Maximum number of hints a team may use on this difficulty.
    pub fn hint_budget(self) -> u32 {
        match self {
            Difficulty::Easy => 5,
            Difficulty::Medium => 3,
            Difficulty::Hard => 1,
        }
    }
}

/// Immutable team metadata collected at session start.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TeamInfo {
    /// Display name for the team.
    #[validate(length(min = 1, max = 64))]
    pub team_name: String,
    /// Ordered player names, one to ten entries.
    #[validate(length(min = 1, max = 10))]
    pub player_names: Vec<String>,
    /// Chosen difficulty, immutable once set.
    pub difficulty: Difficulty,
}

/// Progress record for a single puzzle; write-once after completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleProgress {
    /// Whether the puzzle has been solved.
    pub completed: bool,
    /// Solution value the team submitted.
    pub solution: String,
    /// Wall-clock timestamp (epoch ms) of completion.
    pub completed_at: u64,
}

/// Cached summary recomputed from the session as play progresses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStats {
    /// Total play time in milliseconds, final value computed at completion.
    pub total_time: u64,
    /// Hints consumed so far.
    pub hints_used: u32,
    /// Puzzles solved so far.
    pub puzzles_solved: u32,
    /// Total puzzles in the catalog, fixed at session creation.
    pub total_puzzles: u32,
}

/// Key into the per-puzzle maps, scoping a puzzle id to its stage.
pub fn puzzle_key(stage_index: usize, puzzle_id: &str) -> String {
    format!("{stage_index}-{puzzle_id}")
}

/// Full progress record for one team across the game.
///
/// This is also the serialized local snapshot shape; every field round-trips
/// through JSON unchanged so a saved game reloads as an identical session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSession {
    /// Remote-store identifier; `None` until a remote create succeeds.
    pub team_id: Option<Uuid>,
    /// Display name for the team.
    pub team_name: String,
    /// Ordered player names.
    pub player_names: Vec<String>,
    /// Chosen difficulty.
    pub difficulty: Difficulty,
    /// Zero-based index into the catalog's stage sequence.
    pub current_stage: usize,
    /// Stage indices fully solved and exited via advancement; append-only.
    pub completed_stages: Vec<usize>,
    /// Per-puzzle progress keyed by [`puzzle_key`].
    pub puzzle_states: IndexMap<String, PuzzleProgress>,
    /// Failed submission counts keyed by [`puzzle_key`].
    pub incorrect_attempts: IndexMap<String, u32>,
    /// Hints consumed, bounded by the difficulty's budget.
    pub hints_used: u32,
    /// Current phase of the play-through.
    pub game_state: GamePhase,
    /// Wall-clock timestamp (epoch ms) of the transition into playing.
    pub start_time: Option<u64>,
    /// Cached derived summary.
    pub game_stats: GameStats,
    /// Timestamp of the most recent local snapshot write.
    pub last_saved: Option<u64>,
}

impl TeamSession {
    /// Build a fresh session in the setup phase for the given team.
    pub fn new(info: TeamInfo, catalog: &PuzzleCatalog) -> Self {
        Self {
            team_id: None,
            team_name: info.team_name,
            player_names: info.player_names,
            difficulty: info.difficulty,
            current_stage: 0,
            completed_stages: Vec::new(),
            puzzle_states: IndexMap::new(),
            incorrect_attempts: IndexMap::new(),
            hints_used: 0,
            game_state: GamePhase::Setup,
            start_time: None,
            game_stats: GameStats {
                total_puzzles: catalog.total_puzzles(),
                ..GameStats::default()
            },
            last_saved: None,
        }
    }

    /// Placeholder session held before any game is started: no team
    /// metadata, medium difficulty, setup phase.
    pub fn initial(catalog: &PuzzleCatalog) -> Self {
        Self::new(
            TeamInfo {
                team_name: String::new(),
                player_names: Vec::new(),
                difficulty: Difficulty::Medium,
            },
            catalog,
        )
    }

    /// True iff every puzzle in the current catalog stage is completed.
    ///
    /// Past the final stage there is no current stage, so nothing can advance.
    pub fn can_advance(&self, catalog: &PuzzleCatalog) -> bool {
        let Some(stage) = catalog.stage(self.current_stage) else {
            return false;
        };
        stage
            .puzzles
            .iter()
            .all(|puzzle| self.is_puzzle_completed(&puzzle.id))
    }

    /// First stage the team has not completed yet; one past the final index
    /// once every stage is done.
    pub fn frontier_stage(&self) -> usize {
        self.completed_stages
            .iter()
            .max()
            .map(|furthest| furthest + 1)
            .unwrap_or(0)
    }

    /// Whether the given puzzle in the current stage is completed.
    pub fn is_puzzle_completed(&self, puzzle_id: &str) -> bool {
        self.puzzle_states
            .get(&puzzle_key(self.current_stage, puzzle_id))
            .map(|progress| progress.completed)
            .unwrap_or(false)
    }

    /// Failed submission count for the given puzzle in the current stage.
    pub fn incorrect_attempts_for(&self, puzzle_id: &str) -> u32 {
        self.incorrect_attempts
            .get(&puzzle_key(self.current_stage, puzzle_id))
            .copied()
            .unwrap_or(0)
    }

    /// Hints remaining against the difficulty's budget.
    pub fn available_hints(&self) -> u32 {
        self.difficulty.hint_budget().saturating_sub(self.hints_used)
    }

    /// Milliseconds elapsed since the game started, zero before the first
    /// `StartGame`.
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        self.start_time
            .map(|started| now_ms.saturating_sub(started))
            .unwrap_or(0)
    }

    /// Elapsed play time expressed in whole seconds, as the remote store
    /// records it.
    pub fn elapsed_seconds(&self, now_ms: u64) -> u64 {
        self.elapsed_ms(now_ms) / 1000
    }
}
