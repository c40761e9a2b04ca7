//! Remote store adapter for the hosted PostgREST backend.

mod config;
mod error;
mod store;

pub use config::PostgrestConfig;
pub use error::{PostgrestError, PostgrestResult};
pub use store::PostgrestTeamStore;
