//! Remote store abstraction for team, session, attempt, and statistics records.

pub mod memory;
#[cfg(feature = "postgrest-store")]
pub mod postgrest;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    models::{
        GameStatisticsRecord, NewSession, NewTeam, PuzzleAttemptRecord, SessionBlob,
        SessionRecord, TeamRecord, TeamUpdate,
    },
    storage::StorageResult,
};

pub use memory::MemoryTeamStore;

/// Abstraction over the remote persistence layer.
///
/// Every operation is asynchronous and may fail; callers decide whether a
/// failure degrades to local-only operation or surfaces to the user.
pub trait TeamStore: Send + Sync {
    /// Create a team record; the store assigns and returns the id.
    fn create_team(&self, team: NewTeam) -> BoxFuture<'static, StorageResult<TeamRecord>>;
    /// Apply a partial update to an existing team record.
    fn update_team(
        &self,
        id: Uuid,
        update: TeamUpdate,
    ) -> BoxFuture<'static, StorageResult<TeamRecord>>;
    /// Fetch a single team record.
    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamRecord>>>;
    /// Teams currently playing or paused, newest first; consumed by the
    /// external monitoring view.
    fn list_active_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamRecord>>>;
    /// Create the per-team session record.
    fn create_session(
        &self,
        session: NewSession,
    ) -> BoxFuture<'static, StorageResult<SessionRecord>>;
    /// Overwrite the session blob for a team.
    fn update_session(
        &self,
        team_id: Uuid,
        blob: SessionBlob,
    ) -> BoxFuture<'static, StorageResult<SessionRecord>>;
    /// Append one puzzle attempt.
    fn record_attempt(
        &self,
        attempt: PuzzleAttemptRecord,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Write the one-time completion summary.
    fn record_statistics(
        &self,
        stats: GameStatisticsRecord,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Probe backend reachability.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
