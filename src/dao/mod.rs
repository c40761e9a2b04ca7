//! Persistence layer: local snapshot cache and remote store backends.

/// Synchronous local snapshot persistence.
pub mod local_cache;
/// Wire model definitions shared with the remote store.
pub mod models;
/// Storage abstraction layer for remote operations.
pub mod storage;
/// Remote store trait and its backends.
pub mod team_store;
