use time::OffsetDateTime;

use super::AuthStore;
use super::state::AuthState;
use crate::provider::IdentityProvider;
use crate::storage::KeyValueStore;
use crate::types::AdminStatus;

impl<P: IdentityProvider, K: KeyValueStore> AuthStore<P, K> {
    /// Whether the cached admin determination must be recomputed.
    ///
    /// False without a user. True if never checked, if it was computed for a
    /// different user, or if it is older than the admin window.
    #[must_use]
    pub fn should_check_admin(&self) -> bool {
        let now = self.clock.now();
        self.state
            .lock()
            .should_check_admin(now, self.config.admin_check_interval)
    }

    /// Derive admin status from the cached user's labels, unless cached.
    ///
    /// Uses only the labels fetched with the identity; no provider call.
    /// Without a user the status becomes a definitive "not admin".
    pub fn check_admin_status(&self) {
        let interval = self.config.admin_check_interval;
        self.update(|state, now| {
            if state.user.is_none() {
                state.admin_status = AdminStatus::anonymous(now);
            } else if state.should_check_admin(now, interval) {
                derive_admin_status(state, now);
            } else {
                tracing::debug!("Admin status cache hit");
            }
        });
    }

    /// Discard the cached determination and derive it again.
    pub fn force_admin_refresh(&self) {
        self.update(|state, _| {
            state.admin_status.last_checked = OffsetDateTime::UNIX_EPOCH;
            state.admin_status.checked = false;
            state.admin_status.last_checked_user_id = None;
        });
        self.check_admin_status();
    }

    /// Recompute regardless of the admin window. Used after the identity was
    /// just fetched, since a fresh identity may carry different labels.
    pub(super) fn recompute_admin_status(&self) {
        self.update(|state, now| {
            if state.user.is_some() {
                derive_admin_status(state, now);
            } else {
                state.admin_status = AdminStatus::anonymous(now);
            }
        });
    }
}

fn derive_admin_status(state: &mut AuthState, now: OffsetDateTime) {
    let Some(user) = &state.user else {
        return;
    };
    let is_admin = user.has_admin_label();
    tracing::debug!(user_id = %user.id, is_admin, "Admin status derived");
    state.admin_status = AdminStatus {
        is_admin,
        checked: true,
        loading: false,
        last_checked: now,
        last_checked_user_id: Some(user.id.clone()),
    };
}
