//! Orchestration on top of the shared state and the persistence layer.

/// Game orchestration: session creation, answers, hints, completion.
pub mod game_service;
/// Startup reconciliation of the persisted local snapshot.
pub mod resume_service;
/// Periodic best-effort remote push of session progress.
pub mod sync_supervisor;
