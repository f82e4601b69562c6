use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use time::OffsetDateTime;

use crate::error::Error;
use crate::storage::KeyValueStore;
use crate::types::{AdminStatus, AuthToken, Session, UserIdentity};

/// Version of the persisted record layout written by this crate.
pub const SCHEMA_VERSION: u32 = 2;

/// Default storage key of the persisted record.
pub const DEFAULT_STORAGE_KEY: &str = "auth-storage";

/// The auth fields that survive a restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub session: Option<Session>,
    pub token: Option<AuthToken>,
    pub user: Option<UserIdentity>,
    #[serde(with = "time::serde::rfc3339")]
    pub last_auth_check: OffsetDateTime,
    pub admin_status: AdminStatus,
    pub schema_version: u32,
}

impl PersistedState {
    /// Empty record stamped with `schema_version`.
    #[must_use]
    pub fn empty(schema_version: u32) -> Self {
        Self {
            session: None,
            token: None,
            user: None,
            last_auth_check: OffsetDateTime::UNIX_EPOCH,
            admin_status: AdminStatus::default(),
            schema_version,
        }
    }
}

/// Load the record under `key`.
///
/// Returns `Ok(None)` if nothing is stored, or if the stored record has a
/// different schema version or cannot be decoded. Such records are not
/// migrated; the caller starts from defaults and overwrites them on next save.
///
/// # Errors
///
/// Returns [`Error::Storage`] only if the backing store itself fails.
pub fn load<K: KeyValueStore + ?Sized>(
    store: &K,
    key: &str,
    schema_version: u32,
) -> Result<Option<PersistedState>, Error> {
    let Some(raw) = store.get_item(key)? else {
        return Ok(None);
    };

    let value: JsonValue = match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(key, error = %e, "Discarding unreadable persisted auth state");
            return Ok(None);
        }
    };

    let stored_version = value.get("schemaVersion").and_then(JsonValue::as_u64);
    if stored_version != Some(u64::from(schema_version)) {
        tracing::info!(
            key,
            stored = ?stored_version,
            expected = schema_version,
            "Persisted auth state has a different schema version, discarding"
        );
        return Ok(None);
    }

    match serde_json::from_value::<PersistedState>(value) {
        Ok(mut state) => {
            state.admin_status.loading = false;
            Ok(Some(state))
        }
        Err(e) => {
            tracing::warn!(key, error = %e, "Discarding malformed persisted auth state");
            Ok(None)
        }
    }
}

/// Write the record under `key`.
///
/// # Errors
///
/// Returns [`Error::Serialization`] or [`Error::Storage`].
pub fn save<K: KeyValueStore + ?Sized>(
    store: &K,
    key: &str,
    state: &PersistedState,
) -> Result<(), Error> {
    let raw = serde_json::to_string(state)?;
    store.set_item(key, &raw)
}
