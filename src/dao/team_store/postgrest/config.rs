use super::error::{PostgrestError, PostgrestResult};

/// Runtime configuration describing how to reach the PostgREST backend.
#[derive(Debug, Clone)]
pub struct PostgrestConfig {
    /// Project base URL, without the `/rest/v1` suffix.
    pub base_url: String,
    /// Anonymous API key sent as both `apikey` and bearer token.
    pub anon_key: String,
}

impl PostgrestConfig {
    /// Construct a configuration from an explicit base URL and key.
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            anon_key: anon_key.into(),
        }
    }

    /// Build a configuration by reading the expected environment variables.
    pub fn from_env() -> PostgrestResult<Self> {
        let base_url = std::env::var("SUPABASE_URL").map_err(|_| PostgrestError::MissingEnvVar {
            var: "SUPABASE_URL",
        })?;
        let anon_key =
            std::env::var("SUPABASE_ANON_KEY").map_err(|_| PostgrestError::MissingEnvVar {
                var: "SUPABASE_ANON_KEY",
            })?;

        Ok(Self::new(base_url, anon_key))
    }
}
