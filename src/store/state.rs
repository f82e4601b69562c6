use time::{Duration, OffsetDateTime};

use crate::persist::PersistedState;
use crate::types::{AdminStatus, AuthToken, Session, UserIdentity};

/// In-memory auth state. Mutated only through `AuthStore::update`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AuthState {
    pub(crate) session: Option<Session>,
    pub(crate) token: Option<AuthToken>,
    pub(crate) user: Option<UserIdentity>,
    pub(crate) last_auth_check: OffsetDateTime,
    pub(crate) admin_status: AdminStatus,
    /// A session revalidation or logout is in flight.
    pub(crate) loading: bool,
    pub(crate) hydrated: bool,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            session: None,
            token: None,
            user: None,
            last_auth_check: OffsetDateTime::UNIX_EPOCH,
            admin_status: AdminStatus::default(),
            loading: false,
            hydrated: false,
        }
    }
}

impl AuthState {
    pub(crate) fn should_check_auth(&self, now: OffsetDateTime, interval: Duration) -> bool {
        self.user.is_none() || now - self.last_auth_check > interval
    }

    pub(crate) fn should_check_admin(&self, now: OffsetDateTime, interval: Duration) -> bool {
        let Some(user) = &self.user else {
            return false;
        };
        let status = &self.admin_status;
        if !status.checked {
            return true;
        }
        if status.last_checked_user_id.as_ref() != Some(&user.id) {
            return true;
        }
        now - status.last_checked > interval
    }

    /// Store a freshly verified identity. Session, token and user move together.
    pub(crate) fn sign_in(
        &mut self,
        session: Session,
        user: UserIdentity,
        token: Option<AuthToken>,
        now: OffsetDateTime,
    ) {
        self.session = Some(session);
        self.user = Some(user);
        if token.is_some() {
            self.token = token;
        }
        self.last_auth_check = now;
    }

    /// Drop the identity and record a definitive "not admin".
    pub(crate) fn sign_out(&mut self, now: OffsetDateTime) {
        self.session = None;
        self.token = None;
        self.user = None;
        self.admin_status = AdminStatus::anonymous(now);
    }

    pub(crate) fn to_persisted(&self, schema_version: u32) -> PersistedState {
        PersistedState {
            session: self.session.clone(),
            token: self.token.clone(),
            user: self.user.clone(),
            last_auth_check: self.last_auth_check,
            admin_status: AdminStatus {
                loading: false,
                ..self.admin_status.clone()
            },
            schema_version,
        }
    }

    pub(crate) fn restore(&mut self, stored: PersistedState) {
        self.session = stored.session;
        self.token = stored.token;
        self.user = stored.user;
        self.last_auth_check = stored.last_auth_check;
        self.admin_status = stored.admin_status;
        // A half-restored pair is treated as logged out.
        if self.session.is_none() || self.user.is_none() {
            self.session = None;
            self.user = None;
            self.token = None;
        }
    }
}
