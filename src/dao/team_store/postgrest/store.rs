use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::dao::{
    models::{
        GameStatisticsRecord, NewSession, NewTeam, PuzzleAttemptRecord, SessionBlob,
        SessionRecord, TeamRecord, TeamUpdate,
    },
    storage::StorageResult,
    team_store::TeamStore,
};

use super::{
    config::PostgrestConfig,
    error::{PostgrestError, PostgrestResult},
};

const TEAMS_TABLE: &str = "teams_escaperoom_2024";
const SESSIONS_TABLE: &str = "game_sessions_escaperoom_2024";
const ATTEMPTS_TABLE: &str = "puzzle_attempts_escaperoom_2024";
const STATISTICS_TABLE: &str = "game_statistics_escaperoom_2024";

/// [`TeamStore`] backed by a hosted PostgREST endpoint.
#[derive(Clone)]
pub struct PostgrestTeamStore {
    client: Client,
    base_url: Arc<str>,
    anon_key: Arc<str>,
}

#[derive(Serialize)]
struct SessionPatch {
    session_data: SessionBlob,
}

impl PostgrestTeamStore {
    /// Build a store from the given configuration.
    pub fn new(config: PostgrestConfig) -> PostgrestResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| PostgrestError::ClientBuilder { source })?;

        Ok(Self {
            client,
            base_url: Arc::<str>::from(config.base_url.trim_end_matches('/')),
            anon_key: Arc::<str>::from(config.anon_key),
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/rest/v1/{}", self.base_url, path);
        self.client
            .request(method, url)
            .header("apikey", self.anon_key.as_ref())
            .bearer_auth(self.anon_key.as_ref())
    }

    /// Issue a write and decode the single row the backend echoes back.
    async fn write_returning<T, B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> PostgrestResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self
            .request(method, path)
            .query(query)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await
            .map_err(|source| PostgrestError::RequestSend {
                path: path.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PostgrestError::RequestStatus {
                path: path.to_string(),
                status,
            });
        }

        let rows: Vec<T> =
            response
                .json()
                .await
                .map_err(|source| PostgrestError::DecodeResponse {
                    path: path.to_string(),
                    source,
                })?;
        rows.into_iter()
            .next()
            .ok_or_else(|| PostgrestError::EmptyResponse {
                path: path.to_string(),
            })
    }

    /// Issue a write whose response body is irrelevant.
    async fn write<B>(&self, path: &str, body: &B) -> PostgrestResult<()>
    where
        B: Serialize + ?Sized,
    {
        let response = self
            .request(Method::POST, path)
            .json(body)
            .send()
            .await
            .map_err(|source| PostgrestError::RequestSend {
                path: path.to_string(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(PostgrestError::RequestStatus {
                path: path.to_string(),
                status,
            })
        }
    }

    async fn select<T>(&self, path: &str, query: &[(&str, String)]) -> PostgrestResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, path)
            .query(query)
            .send()
            .await
            .map_err(|source| PostgrestError::RequestSend {
                path: path.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PostgrestError::RequestStatus {
                path: path.to_string(),
                status,
            });
        }

        response
            .json()
            .await
            .map_err(|source| PostgrestError::DecodeResponse {
                path: path.to_string(),
                source,
            })
    }
}

impl TeamStore for PostgrestTeamStore {
    fn create_team(&self, team: NewTeam) -> BoxFuture<'static, StorageResult<TeamRecord>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .write_returning(Method::POST, TEAMS_TABLE, &[], &team)
                .await
                .map_err(Into::into)
        })
    }

    fn update_team(
        &self,
        id: Uuid,
        update: TeamUpdate,
    ) -> BoxFuture<'static, StorageResult<TeamRecord>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .write_returning(
                    Method::PATCH,
                    TEAMS_TABLE,
                    &[("id", format!("eq.{id}"))],
                    &update,
                )
                .await
                .map_err(Into::into)
        })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamRecord>>> {
        let store = self.clone();
        Box::pin(async move {
            let rows: Vec<TeamRecord> = store
                .select(
                    TEAMS_TABLE,
                    &[
                        ("select", "*".to_string()),
                        ("id", format!("eq.{id}")),
                        ("limit", "1".to_string()),
                    ],
                )
                .await?;
            Ok(rows.into_iter().next())
        })
    }

    fn list_active_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamRecord>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .select(
                    TEAMS_TABLE,
                    &[
                        ("select", "*".to_string()),
                        ("game_state", "in.(playing,paused)".to_string()),
                        ("order", "created_at.desc".to_string()),
                    ],
                )
                .await
                .map_err(Into::into)
        })
    }

    fn create_session(
        &self,
        session: NewSession,
    ) -> BoxFuture<'static, StorageResult<SessionRecord>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .write_returning(Method::POST, SESSIONS_TABLE, &[], &session)
                .await
                .map_err(Into::into)
        })
    }

    fn update_session(
        &self,
        team_id: Uuid,
        blob: SessionBlob,
    ) -> BoxFuture<'static, StorageResult<SessionRecord>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .write_returning(
                    Method::PATCH,
                    SESSIONS_TABLE,
                    &[("team_id", format!("eq.{team_id}"))],
                    &SessionPatch { session_data: blob },
                )
                .await
                .map_err(Into::into)
        })
    }

    fn record_attempt(
        &self,
        attempt: PuzzleAttemptRecord,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .write(ATTEMPTS_TABLE, &attempt)
                .await
                .map_err(Into::into)
        })
    }

    fn record_statistics(
        &self,
        stats: GameStatisticsRecord,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .write(STATISTICS_TABLE, &stats)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let response = store
                .request(Method::GET, "")
                .send()
                .await
                .map_err(|source| PostgrestError::RequestSend {
                    path: String::new(),
                    source,
                })?;

            let status = response.status();
            if status.is_success() {
                Ok(())
            } else {
                Err(PostgrestError::RequestStatus {
                    path: String::new(),
                    status,
                }
                .into())
            }
        })
    }
}
