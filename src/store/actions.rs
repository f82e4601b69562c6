use ulid::Ulid;

use super::AuthStore;
use crate::error::ProviderError;
use crate::provider::IdentityProvider;
use crate::storage::KeyValueStore;
use crate::types::{Preferences, UserId};

/// Result of a user-initiated auth action.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ActionOutcome {
    Success,
    /// The provider refused with an error it described; safe to show the user.
    Rejected(ProviderError),
    /// Something unexpected went wrong; show a generic message.
    Failed,
}

impl ActionOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// The provider error to display, if any.
    #[must_use]
    pub fn error(&self) -> Option<&ProviderError> {
        match self {
            Self::Rejected(e) => Some(e),
            Self::Success | Self::Failed => None,
        }
    }

    fn from_error(e: ProviderError, operation: &'static str) -> Self {
        if e.is_recognized() {
            tracing::warn!(operation, error = %e, "Auth action rejected by provider");
            Self::Rejected(e)
        } else {
            tracing::error!(operation, error = %e, "Auth action failed");
            Self::Failed
        }
    }
}

impl<P: IdentityProvider, K: KeyValueStore> AuthStore<P, K> {
    /// Log in with email and password.
    ///
    /// On success the session, user and auth token are stored together and
    /// admin status is derived for the new user before this returns.
    pub async fn login(&self, email: &str, password: &str) -> ActionOutcome {
        let _gate = self.gate.lock().await;
        match self.sign_in_with_password(email, password).await {
            Ok(user_id) => {
                tracing::info!(user_id = %user_id, "Login successful");
                ActionOutcome::Success
            }
            Err(e) => ActionOutcome::from_error(e, "login"),
        }
    }

    /// Register a new account and log into it.
    pub async fn create_account(&self, email: &str, password: &str, name: &str) -> ActionOutcome {
        let _gate = self.gate.lock().await;
        let id = UserId(Ulid::new().to_string().to_lowercase());

        if let Err(e) = self
            .provider
            .create_account(&id, email, password, name)
            .await
        {
            return ActionOutcome::from_error(e, "create account");
        }
        tracing::info!(user_id = %id, "Account created");

        match self.sign_in_with_password(email, password).await {
            Ok(user_id) => {
                tracing::info!(user_id = %user_id, "Login successful");
                ActionOutcome::Success
            }
            Err(e) => ActionOutcome::from_error(e, "login after registration"),
        }
    }

    /// End every session of the current user.
    ///
    /// If the provider call fails the local identity is kept as it was and
    /// the failure is only logged. The loading flag is cleared either way.
    pub async fn logout(&self) {
        let _gate = self.gate.lock().await;
        self.update(|state, _| state.loading = true);

        match self.provider.delete_all_sessions().await {
            Ok(()) => {
                let user_id = self.update(|state, now| {
                    let user_id = state.user.as_ref().map(|u| u.id.clone());
                    state.sign_out(now);
                    user_id
                });
                tracing::info!(user_id = ?user_id, "Logged out");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Logout failed, local session kept");
            }
        }

        self.update(|state, _| state.loading = false);
    }

    /// Replace the current user's preferences.
    pub async fn update_preferences(&self, prefs: Preferences) -> ActionOutcome {
        let Some(current) = self.user().map(|u| u.id) else {
            tracing::warn!("Preference update without a logged-in user");
            return ActionOutcome::Failed;
        };

        match self.provider.update_preferences(&prefs).await {
            Ok(updated) if updated.id == current => {
                self.update(|state, _| {
                    if state.user.as_ref().is_some_and(|u| u.id == updated.id) {
                        state.user = Some(updated);
                    }
                });
                ActionOutcome::Success
            }
            Ok(updated) => {
                tracing::error!(
                    expected = %current,
                    got = %updated.id,
                    "Preference update returned a different user"
                );
                ActionOutcome::Failed
            }
            Err(e) => ActionOutcome::from_error(e, "update preferences"),
        }
    }

    /// Caller must hold `gate`.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserId, ProviderError> {
        let session = self
            .provider
            .create_email_password_session(email, password)
            .await?;

        let (user, token) = tokio::join!(
            self.provider.get_current_user(),
            self.provider.create_auth_token()
        );
        let (user, token) = (user?, token?);

        let user_id = user.id.clone();
        self.update(|state, now| state.sign_in(session, user, Some(token), now));
        self.recompute_admin_status();
        Ok(user_id)
    }
}
