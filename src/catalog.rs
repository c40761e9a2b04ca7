//! Static puzzle content: ordered stages, each holding ordered puzzles.
//!
//! The catalog is immutable at runtime. Progress never lives here; the
//! session only references stages by index and puzzles by their id.

/// Ordered sequence of stages making up one full play-through.
#[derive(Debug, Clone)]
pub struct PuzzleCatalog {
    /// Display title of the experience.
    pub title: String,
    /// Stages in play order; `current_stage` indexes into this list.
    pub stages: Vec<Stage>,
}

/// An ordered section of the game; every puzzle inside must be solved
/// before the team can advance past it.
#[derive(Debug, Clone)]
pub struct Stage {
    /// Human readable stage title.
    pub title: String,
    /// Puzzles belonging to this stage, in presentation order.
    pub puzzles: Vec<Puzzle>,
}

/// An individually solvable unit within a stage.
#[derive(Debug, Clone)]
pub struct Puzzle {
    /// Identifier unique within the owning stage (stable across runs).
    pub id: String,
    /// Human readable puzzle title.
    pub title: String,
    /// Expected solution value.
    pub solution: String,
    /// Ordered hint texts revealed against the hint budget.
    pub hints: Vec<String>,
}

impl PuzzleCatalog {
    /// Stage at `index`, or `None` when the index is past the final stage
    /// (which happens transiently while a finished game completes).
    pub fn stage(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    /// Number of stages in the catalog.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Total number of puzzles across every stage.
    pub fn total_puzzles(&self) -> u32 {
        self.stages
            .iter()
            .map(|stage| stage.puzzles.len() as u32)
            .sum()
    }

    /// Look up a puzzle by stage index and puzzle id.
    pub fn puzzle(&self, stage_index: usize, puzzle_id: &str) -> Option<&Puzzle> {
        self.stage(stage_index)
            .and_then(|stage| stage.puzzles.iter().find(|puzzle| puzzle.id == puzzle_id))
    }
}

impl Puzzle {
    /// Check a submitted answer against the solution, ignoring case and
    /// surrounding whitespace.
    pub fn matches(&self, answer: &str) -> bool {
        answer.trim().eq_ignore_ascii_case(self.solution.trim())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::AppConfig;

    #[test]
    fn builtin_catalog_has_six_stages() {
        let catalog = AppConfig::default().into_catalog();
        assert_eq!(catalog.stage_count(), 6);
        assert_eq!(catalog.total_puzzles(), 18);
    }

    #[test]
    fn puzzle_lookup_by_stage_and_id() {
        let catalog = AppConfig::default().into_catalog();
        let puzzle = catalog.puzzle(0, "voice-cipher").expect("puzzle exists");
        assert_eq!(puzzle.title, "Voice Message Cipher");
        assert!(catalog.puzzle(0, "badge-tracking").is_none());
        assert!(catalog.puzzle(99, "voice-cipher").is_none());
    }

    #[test]
    fn answer_matching_ignores_case_and_whitespace() {
        let catalog = AppConfig::default().into_catalog();
        let puzzle = catalog.puzzle(0, "voice-cipher").unwrap();
        assert!(puzzle.matches("4729"));
        assert!(puzzle.matches("  4729 "));
        let worded = catalog.puzzle(0, "calendar-analysis").unwrap();
        assert!(worded.matches("board meetings"));
        assert!(!worded.matches("board"));
    }
}
