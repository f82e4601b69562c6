use time::OffsetDateTime;

use super::AuthStore;
use crate::error::ProviderError;
use crate::provider::IdentityProvider;
use crate::storage::KeyValueStore;
use crate::types::{Session, UserIdentity};

impl<P: IdentityProvider, K: KeyValueStore> AuthStore<P, K> {
    /// Whether the cached identity must be revalidated before it is trusted.
    ///
    /// True when no user is cached or the last check is older than the
    /// session window. Pure; performs no I/O.
    #[must_use]
    pub fn should_check_auth(&self) -> bool {
        let now = self.clock.now();
        self.state
            .lock()
            .should_check_auth(now, self.config.auth_check_interval)
    }

    /// Revalidate the session against the provider unless the cache is fresh.
    ///
    /// Never fails: provider errors leave the store logged out. Concurrent
    /// callers share one provider round trip; whoever waited re-checks the
    /// cache after the in-flight call settles.
    pub async fn verify_session(&self) {
        let _gate = self.gate.lock().await;
        if !self.should_check_auth() {
            tracing::debug!("Session cache hit");
            return;
        }
        self.revalidate().await;
    }

    /// Expire the session window and revalidate immediately.
    pub async fn force_auth_refresh(&self) {
        let _gate = self.gate.lock().await;
        self.update(|state, _| state.last_auth_check = OffsetDateTime::UNIX_EPOCH);
        self.revalidate().await;
    }

    /// Caller must hold `gate`.
    async fn revalidate(&self) {
        self.update(|state, _| state.loading = true);

        match self.fetch_identity().await {
            Ok((session, user)) => {
                tracing::debug!(user_id = %user.id, "Session verified");
                self.update(|state, now| state.sign_in(session, user, None, now));
                self.recompute_admin_status();
            }
            Err(e) => {
                tracing::warn!(error = %e, "Session verification failed, treating as logged out");
                self.update(|state, now| {
                    state.sign_out(now);
                    state.last_auth_check = now;
                });
            }
        }

        self.update(|state, _| state.loading = false);
    }

    async fn fetch_identity(&self) -> Result<(Session, UserIdentity), ProviderError> {
        let session = self.provider.get_current_session().await?;
        let user = self.provider.get_current_user().await?;
        Ok((session, user))
    }
}
