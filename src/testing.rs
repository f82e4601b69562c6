//! Test doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Error, ProviderError};
use crate::provider::IdentityProvider;
use crate::storage::KeyValueStore;
use crate::types::{AuthToken, Preferences, Session, UserId, UserIdentity};

struct Account {
    user: UserIdentity,
    password: String,
}

#[derive(Default)]
struct Backend {
    accounts: Vec<Account>,
    /// Index into `accounts` of the user this client is logged in as.
    current: Option<usize>,
    outage: Option<ProviderError>,
    fail_next: HashMap<&'static str, ProviderError>,
    delay: Option<std::time::Duration>,
    calls: HashMap<&'static str, usize>,
}

/// In-memory identity provider that behaves like a tiny account backend.
///
/// Clones share the same backend, so a test can keep a handle after moving
/// one into the store.
#[derive(Clone, Default)]
pub(crate) struct MockProvider(Arc<Mutex<Backend>>);

impl MockProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_account(self, id: &str, email: &str, password: &str, labels: &[&str]) -> Self {
        self.0.lock().accounts.push(Account {
            user: UserIdentity::new(id)
                .with_email(email)
                .with_labels(labels.iter().copied()),
            password: password.to_owned(),
        });
        self
    }

    /// Account that already has a live session on this client.
    pub(crate) fn with_logged_in_user(self, id: &str, labels: &[&str]) -> Self {
        let provider = self.with_account(id, &format!("{id}@example.com"), "pw", labels);
        {
            let mut backend = provider.0.lock();
            backend.current = Some(backend.accounts.len() - 1);
        }
        provider
    }

    pub(crate) fn with_delay(self, delay: std::time::Duration) -> Self {
        self.0.lock().delay = Some(delay);
        self
    }

    /// Make every call fail with `error` until cleared.
    pub(crate) fn set_outage(&self, error: Option<ProviderError>) {
        self.0.lock().outage = error;
    }

    /// Fail the next call of `operation` only.
    pub(crate) fn fail_next(&self, operation: &'static str, error: ProviderError) {
        self.0.lock().fail_next.insert(operation, error);
    }

    /// Drop the session on the backend side, as if it expired or was revoked.
    pub(crate) fn end_remote_session(&self) {
        self.0.lock().current = None;
    }

    pub(crate) fn calls(&self, operation: &str) -> usize {
        self.0.lock().calls.get(operation).copied().unwrap_or(0)
    }

    async fn call<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut Backend) -> Result<T, ProviderError>,
    ) -> Result<T, ProviderError> {
        let delay = {
            let mut backend = self.0.lock();
            *backend.calls.entry(operation).or_default() += 1;
            backend.delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut backend = self.0.lock();
        if let Some(e) = backend.outage.clone() {
            return Err(e);
        }
        if let Some(e) = backend.fail_next.remove(operation) {
            return Err(e);
        }
        f(&mut backend)
    }
}

fn unauthorized() -> ProviderError {
    ProviderError::api(401, "general_unauthorized_scope", "User (role: guests) missing scope (account)")
}

impl Backend {
    fn current_user(&self) -> Result<&UserIdentity, ProviderError> {
        self.current
            .map(|i| &self.accounts[i].user)
            .ok_or_else(unauthorized)
    }
}

impl IdentityProvider for MockProvider {
    async fn get_current_session(&self) -> Result<Session, ProviderError> {
        self.call("get_current_session", |b| {
            let user = b.current_user()?;
            Ok(Session::new(format!("session-{}", user.id), user.id.to_string()))
        })
        .await
    }

    async fn get_current_user(&self) -> Result<UserIdentity, ProviderError> {
        self.call("get_current_user", |b| b.current_user().cloned())
            .await
    }

    async fn create_email_password_session(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, ProviderError> {
        self.call("create_email_password_session", |b| {
            let index = b
                .accounts
                .iter()
                .position(|a| a.user.email == email && a.password == password)
                .ok_or_else(|| {
                    ProviderError::api(
                        401,
                        "user_invalid_credentials",
                        "Invalid credentials. Please check the email and password.",
                    )
                })?;
            b.current = Some(index);
            let id = &b.accounts[index].user.id;
            Ok(Session::new(format!("session-{id}"), id.to_string()))
        })
        .await
    }

    async fn create_account(
        &self,
        id: &UserId,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<(), ProviderError> {
        self.call("create_account", |b| {
            if b.accounts.iter().any(|a| a.user.email == email) {
                return Err(ProviderError::api(
                    409,
                    "user_already_exists",
                    "A user with the same id, email, or phone already exists in this project.",
                ));
            }
            b.accounts.push(Account {
                user: UserIdentity::new(id.to_string())
                    .with_email(email)
                    .with_name(name),
                password: password.to_owned(),
            });
            Ok(())
        })
        .await
    }

    async fn create_auth_token(&self) -> Result<AuthToken, ProviderError> {
        self.call("create_auth_token", |b| {
            let user = b.current_user()?;
            Ok(AuthToken(format!("jwt-{}", user.id)))
        })
        .await
    }

    async fn delete_all_sessions(&self) -> Result<(), ProviderError> {
        self.call("delete_all_sessions", |b| {
            b.current_user()?;
            b.current = None;
            Ok(())
        })
        .await
    }

    async fn update_preferences(&self, prefs: &Preferences) -> Result<UserIdentity, ProviderError> {
        self.call("update_preferences", |b| {
            let index = b.current.ok_or_else(unauthorized)?;
            let user = &mut b.accounts[index].user;
            user.prefs = prefs.clone();
            Ok(user.clone())
        })
        .await
    }
}

/// Storage whose every operation fails, like a browser with storage disabled.
pub(crate) struct FailingStore;

impl KeyValueStore for FailingStore {
    fn get_item(&self, _key: &str) -> Result<Option<String>, Error> {
        Err(Error::Storage("storage disabled".into()))
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<(), Error> {
        Err(Error::Storage("storage disabled".into()))
    }

    fn remove_item(&self, _key: &str) -> Result<(), Error> {
        Err(Error::Storage("storage disabled".into()))
    }
}
