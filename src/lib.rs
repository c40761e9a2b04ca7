//! Escape-room game engine with dual-layer persistence.
//!
//! The crate keeps one authoritative [`state::TeamSession`] per process,
//! mutated exclusively through a reducer so its invariants hold no matter
//! who asks for a change. Every accepted change while a game is live is
//! snapshotted synchronously to a local cache; a background supervisor
//! mirrors progress to a remote store on a fixed interval, best effort.

pub mod catalog;
pub mod config;
pub mod dao;
pub mod error;
pub mod services;
pub mod state;
