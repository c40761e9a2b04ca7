//! Application-level configuration loading, including the built-in puzzle catalog.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::catalog::{Puzzle, PuzzleCatalog, Stage};

/// Default location on disk where the library looks for the JSON catalog.
const DEFAULT_CONFIG_PATH: &str = "config/catalog.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "CURATOR_CONFIG_PATH";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    catalog: PuzzleCatalog,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// baked-in "The Vanishing Curator" catalog.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawCatalog>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        stages = app_config.catalog.stage_count(),
                        "loaded puzzle catalog from config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse catalog config; falling back to built-in catalog"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "catalog config not found; using built-in catalog"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read catalog config; falling back to built-in catalog"
                );
                Self::default()
            }
        }
    }

    /// Consume the configuration and hand out the catalog.
    pub fn into_catalog(self) -> PuzzleCatalog {
        self.catalog
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog: default_catalog(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the catalog file located at [`DEFAULT_CONFIG_PATH`].
struct RawCatalog {
    title: String,
    stages: Vec<RawStage>,
}

#[derive(Debug, Deserialize)]
/// JSON representation of a single stage inside the catalog file.
struct RawStage {
    title: String,
    puzzles: Vec<RawPuzzle>,
}

#[derive(Debug, Deserialize)]
/// JSON representation of a single puzzle inside a stage.
struct RawPuzzle {
    id: String,
    title: String,
    solution: String,
    #[serde(default)]
    hints: Vec<String>,
}

impl From<RawCatalog> for AppConfig {
    fn from(value: RawCatalog) -> Self {
        Self {
            catalog: PuzzleCatalog {
                title: value.title,
                stages: value.stages.into_iter().map(Into::into).collect(),
            },
        }
    }
}

impl From<RawStage> for Stage {
    fn from(value: RawStage) -> Self {
        Self {
            title: value.title,
            puzzles: value.puzzles.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<RawPuzzle> for Puzzle {
    fn from(value: RawPuzzle) -> Self {
        Self {
            id: value.id,
            title: value.title,
            solution: value.solution,
            hints: value.hints,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn puzzle(id: &str, title: &str, solution: &str, hints: [&str; 3]) -> Puzzle {
    Puzzle {
        id: id.into(),
        title: title.into(),
        solution: solution.into(),
        hints: hints.into_iter().map(Into::into).collect(),
    }
}

/// Built-in catalog shipped with the library: "The Vanishing Curator".
fn default_catalog() -> PuzzleCatalog {
    PuzzleCatalog {
        title: "The Vanishing Curator".into(),
        stages: vec![
            Stage {
                title: "The Locked Office".into(),
                puzzles: vec![
                    puzzle(
                        "calendar-analysis",
                        "Digital Calendar Analysis",
                        "BOARD MEETINGS",
                        [
                            "Look at the days of the week for circled dates",
                            "Consider what type of meetings happen on these days",
                            "Think about who Dr. Blackwood suspected",
                        ],
                    ),
                    puzzle(
                        "voice-cipher",
                        "Voice Message Cipher",
                        "4729",
                        [
                            "The static isn't random - it contains a pattern",
                            "Listen for tonal changes in the static",
                            "The numbers relate to the desk drawer combination",
                        ],
                    ),
                    puzzle(
                        "hidden-compartment",
                        "Hidden Compartment",
                        "USB DRIVE",
                        [
                            "Use the numbers from the voice message",
                            "The drawer has a secret compartment",
                            "Look for something that can store digital files",
                        ],
                    ),
                ],
            },
            Stage {
                title: "Digital Forensics Lab".into(),
                puzzles: vec![
                    puzzle(
                        "email-analysis",
                        "Email Trail Analysis",
                        "MARCUS STERLING",
                        [
                            "Check the email metadata",
                            "Look at the sender's IP address",
                            "Cross-reference with staff directory",
                        ],
                    ),
                    puzzle(
                        "metadata-analysis",
                        "Photo Metadata Analysis",
                        "ZURICH",
                        [
                            "Look at the GPS coordinates in the metadata",
                            "Check the camera settings for location data",
                            "Some photos were taken outside the museum",
                        ],
                    ),
                    puzzle(
                        "network-logs",
                        "Network Access Logs",
                        "03:47 AM",
                        [
                            "Look for access outside normal hours",
                            "Check for unusual IP addresses",
                            "Find the timestamp that doesn't match normal patterns",
                        ],
                    ),
                ],
            },
            Stage {
                title: "The Restricted Archives".into(),
                puzzles: vec![
                    puzzle(
                        "document-matching",
                        "Historical Document Matching",
                        "DOCUMENTS A, C, E",
                        [
                            "Look for anachronisms in the text",
                            "Check the paper aging patterns",
                            "Compare handwriting styles",
                        ],
                    ),
                    puzzle(
                        "boolean-logic",
                        "Archive Database Logic",
                        "PROJECT AND ETRUSCAN AND NOT AUTHENTIC",
                        [
                            "Use AND, OR, NOT operators",
                            "Think about what connects the forgeries",
                            "Exclude authentic items from your search",
                        ],
                    ),
                    puzzle(
                        "ancient-cipher",
                        "Ancient Multi-language Cipher",
                        "BOARD MEMBER BETRAYAL",
                        [
                            "The cipher uses three languages as a key",
                            "Look for the first letter of each language section",
                            "The message is about internal treachery",
                        ],
                    ),
                ],
            },
            Stage {
                title: "Security System Investigation".into(),
                puzzles: vec![
                    puzzle(
                        "camera-timeline",
                        "Security Camera Timeline",
                        "4:23 AM",
                        [
                            "Look for gaps in the footage",
                            "Check multiple camera angles",
                            "The last clear sighting is the answer",
                        ],
                    ),
                    puzzle(
                        "badge-tracking",
                        "Access Badge Analysis",
                        "MARCUS STERLING",
                        [
                            "Compare badge logs with staff schedules",
                            "Look for badge usage when the owner was elsewhere",
                            "Check for duplicate entries",
                        ],
                    ),
                    puzzle(
                        "motion-sensor",
                        "3D Motion Sensor Analysis",
                        "EXHIBITION HALL",
                        [
                            "Follow the motion sensor activations",
                            "Look for a path that avoids cameras",
                            "The destination is where valuable items are displayed",
                        ],
                    ),
                ],
            },
            Stage {
                title: "The Exhibition Hall".into(),
                puzzles: vec![
                    puzzle(
                        "artwork-authentication",
                        "Artwork Authentication",
                        "PAINTINGS 2, 4, 7",
                        [
                            "Look for anachronistic elements",
                            "Check the paint composition",
                            "Compare with known authentic works",
                        ],
                    ),
                    puzzle(
                        "uv-messages",
                        "UV Light Secret Messages",
                        "BOARD ORCHESTRATED FORGERY SCHEME",
                        [
                            "Shine UV light on different artworks",
                            "The message is split across multiple pieces",
                            "Combine the words in the right order",
                        ],
                    ),
                    puzzle(
                        "security-navigation",
                        "Security System Navigation",
                        "7834",
                        [
                            "Follow the symbols from the archives",
                            "The code is hidden in the security panel",
                            "Look for the Etruscan symbol sequence",
                        ],
                    ),
                ],
            },
            Stage {
                title: "The Final Confrontation".into(),
                puzzles: vec![
                    puzzle(
                        "evidence-assembly",
                        "Evidence Assembly",
                        "DIRECTOR HAMILTON",
                        [
                            "Look at who had access to everything",
                            "Check who could authorize the changes",
                            "The person with the most power is often the most dangerous",
                        ],
                    ),
                    puzzle(
                        "identity-deduction",
                        "Identity Deduction",
                        "FINANCIAL GAIN",
                        [
                            "Follow the money trail",
                            "Check the insurance claims",
                            "Look for personal financial troubles",
                        ],
                    ),
                    puzzle(
                        "location-discovery",
                        "Find Dr. Blackwood",
                        "STORAGE WAREHOUSE 7",
                        [
                            "Use the GPS coordinates from the photos",
                            "Cross-reference with museum property records",
                            "Look for off-site storage facilities",
                        ],
                    ),
                ],
            },
        ],
    }
}
