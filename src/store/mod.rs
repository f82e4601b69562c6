//! Client-side auth controller: session cache, admin-status cache, and the
//! actions that move between logged-in and logged-out.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use voyage_auth::{AuthConfig, AuthStore, FileStore, ProviderConfig, RestIdentityProvider};
//!
//! let provider = RestIdentityProvider::new(ProviderConfig::from_env()?)?;
//! let store = AuthStore::new(provider, FileStore::open(".voyage")?, AuthConfig::from_env()?);
//!
//! store.hydrate();
//! store.verify_session().await;
//!
//! let view = store.view();
//! if view.is_admin {
//!     // show the dashboard link
//! }
//! ```

mod actions;
mod admin;
mod config;
mod session;
mod state;
mod view;

use parking_lot::Mutex;
use time::OffsetDateTime;
use tokio::sync::watch;

pub use actions::ActionOutcome;
pub use config::AuthConfig;
pub use view::AuthView;

use self::state::AuthState;
use crate::clock::{Clock, SystemClock};
use crate::persist;
use crate::provider::IdentityProvider;
use crate::storage::KeyValueStore;
use crate::types::{AdminStatus, AuthToken, Session, UserIdentity};

/// Session and admin-status cache in front of an [`IdentityProvider`].
///
/// One instance per client. Share it behind an `Arc`; every method takes
/// `&self`. State changes are persisted to `K` and published to
/// [`subscribe`](AuthStore::subscribe) receivers.
pub struct AuthStore<P, K> {
    provider: P,
    storage: K,
    config: AuthConfig,
    clock: Box<dyn Clock>,
    state: Mutex<AuthState>,
    /// Serializes provider calls that replace the identity.
    gate: tokio::sync::Mutex<()>,
    changes: watch::Sender<AuthView>,
}

impl<P: IdentityProvider, K: KeyValueStore> AuthStore<P, K> {
    #[must_use]
    pub fn new(provider: P, storage: K, config: AuthConfig) -> Self {
        let (changes, _) = watch::channel(AuthView::default());
        Self {
            provider,
            storage,
            config,
            clock: Box::new(SystemClock),
            state: Mutex::new(AuthState::default()),
            gate: tokio::sync::Mutex::new(()),
            changes,
        }
    }

    /// Use a custom time source (for tests or simulated time).
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock) -> Self {
        self.clock = Box::new(clock);
        self
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Load persisted state and mark the store hydrated.
    ///
    /// Unreadable storage or a record from another schema version leaves the
    /// defaults in place. Calling this again is a no-op.
    pub fn hydrate(&self) {
        let stored = match persist::load(
            &self.storage,
            &self.config.storage_key,
            self.config.schema_version,
        ) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "Auth storage unavailable, continuing in memory");
                None
            }
        };

        self.update(|state, _| {
            if state.hydrated {
                return;
            }
            if let Some(stored) = stored {
                tracing::debug!(
                    user_id = ?stored.user.as_ref().map(|u| &u.id),
                    "Restored persisted auth state"
                );
                state.restore(stored);
            }
            state.hydrated = true;
        });
    }

    #[must_use]
    pub fn is_hydrated(&self) -> bool {
        self.state.lock().hydrated
    }

    /// Render-safe snapshot of the current state.
    #[must_use]
    pub fn view(&self) -> AuthView {
        AuthView::from_state(&self.state.lock())
    }

    /// Receive a new [`AuthView`] every time it changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthView> {
        self.changes.subscribe()
    }

    #[must_use]
    pub fn user(&self) -> Option<UserIdentity> {
        self.state.lock().user.clone()
    }

    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.state.lock().session.clone()
    }

    #[must_use]
    pub fn token(&self) -> Option<AuthToken> {
        self.state.lock().token.clone()
    }

    #[must_use]
    pub fn admin_status(&self) -> AdminStatus {
        self.state.lock().admin_status.clone()
    }

    #[must_use]
    pub fn last_auth_check(&self) -> OffsetDateTime {
        self.state.lock().last_auth_check
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        let state = self.state.lock();
        state.session.is_some() && state.user.is_some()
    }

    /// Apply `f` to the state, then persist and publish if anything changed.
    ///
    /// This is the only writer of `state`. The lock is released before return,
    /// so callers never hold it across an `.await`.
    fn update<R>(&self, f: impl FnOnce(&mut AuthState, OffsetDateTime) -> R) -> R {
        let now = self.clock.now();
        let mut state = self.state.lock();
        let before = state.clone();
        let out = f(&mut *state, now);
        if *state == before {
            return out;
        }

        // Nothing is written until the stored record has been read.
        if state.hydrated {
            let record = state.to_persisted(self.config.schema_version);
            if record != before.to_persisted(self.config.schema_version) || !before.hydrated {
                if let Err(e) = persist::save(&self.storage, &self.config.storage_key, &record) {
                    tracing::warn!(error = %e, "Failed to persist auth state");
                }
            }
        }

        let view = AuthView::from_state(&state);
        drop(state);
        self.changes.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });
        out
    }
}
