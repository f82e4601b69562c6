use super::state::AuthState;
use crate::types::UserIdentity;

/// What the UI may render right now.
///
/// Until hydration completes every field holds its safe default, so nothing
/// privileged is shown and no loading indicator flashes on first paint.
#[derive(Debug, Clone, Default, PartialEq)]
#[non_exhaustive]
pub struct AuthView {
    pub user: Option<UserIdentity>,
    pub hydrated: bool,
    /// A session check is running and there is no admin determination to show.
    pub loading: bool,
    pub is_admin: bool,
    pub admin_checked: bool,
    pub admin_loading: bool,
}

impl AuthView {
    pub(crate) fn from_state(state: &AuthState) -> Self {
        if !state.hydrated {
            return Self::default();
        }

        let status = &state.admin_status;
        let is_admin = state
            .user
            .as_ref()
            .is_some_and(|user| status.is_admin && status.is_trusted_for(user));

        Self {
            user: state.user.clone(),
            hydrated: true,
            loading: state.loading && !status.checked,
            is_admin,
            admin_checked: status.checked,
            admin_loading: status.loading,
        }
    }
}
