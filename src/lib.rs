#![doc = include_str!("../README.md")]

pub mod clock;
pub mod error;
pub mod persist;
pub mod provider;
#[cfg(feature = "http")]
pub mod rest;
pub mod storage;
pub mod store;
pub mod types;

#[cfg(test)]
mod testing;

// Re-exports for convenient access
pub use clock::{Clock, SystemClock};
pub use error::{Error, ProviderError};
pub use persist::{PersistedState, SCHEMA_VERSION};
pub use provider::IdentityProvider;
#[cfg(feature = "http")]
pub use rest::{ProviderConfig, RestIdentityProvider};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::{ActionOutcome, AuthConfig, AuthStore, AuthView};
pub use types::{
    ADMIN_LABEL, AdminStatus, AuthToken, Preferences, Session, SessionId, UserId, UserIdentity,
};
