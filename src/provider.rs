use std::future::Future;

use crate::error::ProviderError;
use crate::types::{AuthToken, Preferences, Session, UserId, UserIdentity};

/// Account API of the backend identity provider.
///
/// The [`AuthStore`](crate::AuthStore) is the only caller. Implementations are
/// expected to keep whatever transport state (cookies, headers) ties
/// consecutive calls to the same client session.
///
/// # Example
///
/// ```rust,ignore
/// impl IdentityProvider for MyBackend {
///     async fn get_current_user(&self) -> Result<UserIdentity, ProviderError> {
///         self.http.get("/account").await
///     }
///     // ...
/// }
/// ```
pub trait IdentityProvider: Send + Sync + 'static {
    /// Fetch the session this client is currently bound to.
    fn get_current_session(&self) -> impl Future<Output = Result<Session, ProviderError>> + Send;

    /// Fetch the user owning the current session.
    fn get_current_user(&self) -> impl Future<Output = Result<UserIdentity, ProviderError>> + Send;

    /// Log in with email and password.
    fn create_email_password_session(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Session, ProviderError>> + Send;

    /// Register a new account. Does not log in.
    fn create_account(
        &self,
        id: &UserId,
        email: &str,
        password: &str,
        name: &str,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send;

    /// Mint a short-lived token for the current session.
    fn create_auth_token(&self) -> impl Future<Output = Result<AuthToken, ProviderError>> + Send;

    /// Invalidate every session of the current user.
    fn delete_all_sessions(&self) -> impl Future<Output = Result<(), ProviderError>> + Send;

    /// Replace the current user's preferences. Returns the updated identity.
    fn update_preferences(
        &self,
        prefs: &Preferences,
    ) -> impl Future<Output = Result<UserIdentity, ProviderError>> + Send;
}
