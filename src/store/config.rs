use time::Duration;

use crate::error::Error;
use crate::persist::{DEFAULT_STORAGE_KEY, SCHEMA_VERSION};

/// Cache windows and persistence settings for an [`AuthStore`](super::AuthStore).
///
/// Use [`from_env()`](AuthConfig::from_env) for convention-based setup,
/// or [`Default`] with `with_*` methods for full control.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct AuthConfig {
    pub(crate) auth_check_interval: Duration,
    pub(crate) admin_check_interval: Duration,
    pub(crate) storage_key: String,
    pub(crate) schema_version: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            auth_check_interval: Duration::minutes(5),
            admin_check_interval: Duration::minutes(30),
            storage_key: DEFAULT_STORAGE_KEY.into(),
            schema_version: SCHEMA_VERSION,
        }
    }
}

impl AuthConfig {
    /// Create config from environment variables, falling back to defaults.
    ///
    /// # Optional env vars
    /// - `VOYAGE_AUTH_CHECK_SECS`: session revalidation window in seconds
    /// - `VOYAGE_ADMIN_CHECK_SECS`: admin-status window in seconds
    /// - `VOYAGE_AUTH_STORAGE_KEY`: key of the persisted record
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a window is not a non-negative integer.
    pub fn from_env() -> Result<Self, Error> {
        let mut config = Self::default();

        if let Some(secs) = env_secs("VOYAGE_AUTH_CHECK_SECS")? {
            config = config.with_auth_check_interval(secs);
        }
        if let Some(secs) = env_secs("VOYAGE_ADMIN_CHECK_SECS")? {
            config = config.with_admin_check_interval(secs);
        }
        if let Ok(key) = std::env::var("VOYAGE_AUTH_STORAGE_KEY") {
            config = config.with_storage_key(key);
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_auth_check_interval(mut self, interval: Duration) -> Self {
        self.auth_check_interval = interval;
        self
    }

    #[must_use]
    pub fn with_admin_check_interval(mut self, interval: Duration) -> Self {
        self.admin_check_interval = interval;
        self
    }

    #[must_use]
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Override the expected record version. Stored records with any other
    /// version are discarded on hydration.
    #[must_use]
    pub fn with_schema_version(mut self, version: u32) -> Self {
        self.schema_version = version;
        self
    }

    #[must_use]
    pub fn auth_check_interval(&self) -> Duration {
        self.auth_check_interval
    }

    #[must_use]
    pub fn admin_check_interval(&self) -> Duration {
        self.admin_check_interval
    }

    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    #[must_use]
    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }
}

fn env_secs(name: &str) -> Result<Option<Duration>, Error> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u32>()
            .map(|secs| Some(Duration::seconds(i64::from(secs))))
            .map_err(|e| Error::Config(format!("{name}: {e}"))),
        Err(_) => Ok(None),
    }
}
