use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use time::OffsetDateTime;

/// Identity-provider user identifier (opaque string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct UserId(pub String);

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Identity-provider session identifier (opaque string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct SessionId(pub String);

/// Free-form user preferences.
pub type Preferences = Map<String, JsonValue>;

/// Label that marks a user as an administrator (matched case-insensitively).
pub const ADMIN_LABEL: &str = "admin";

/// Provider-issued session handle.
///
/// Only `id` and `user_id` are interpreted; everything else the provider sends
/// is kept verbatim in `extra` so it survives persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Session {
    #[serde(rename = "$id")]
    pub id: SessionId,
    #[serde(rename = "userId")]
    pub user_id: UserId,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expire: Option<OffsetDateTime>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Session {
    #[must_use]
    pub fn new(id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            id: SessionId(id.into()),
            user_id: UserId(user_id.into()),
            expire: None,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn with_expire(mut self, expire: OffsetDateTime) -> Self {
        self.expire = Some(expire);
        self
    }
}

/// The authenticated principal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct UserIdentity {
    #[serde(rename = "$id")]
    pub id: UserId,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub prefs: Preferences,
}

impl UserIdentity {
    /// Create an identity with only the required `id`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: UserId(id.into()),
            email: String::new(),
            name: String::new(),
            labels: Vec::new(),
            prefs: Map::new(),
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_prefs(mut self, prefs: Preferences) -> Self {
        self.prefs = prefs;
        self
    }

    /// True if any label equals `"admin"`, ignoring ASCII case.
    ///
    /// Exact match only: `"administrator"` or `"admins"` do not qualify.
    #[must_use]
    pub fn has_admin_label(&self) -> bool {
        self.labels
            .iter()
            .any(|label| label.eq_ignore_ascii_case(ADMIN_LABEL))
    }
}

/// Short-lived provider token (JWT) minted at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct AuthToken(pub String);

/// Cached determination of whether the current user is an administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct AdminStatus {
    pub is_admin: bool,
    pub checked: bool,
    #[serde(skip)]
    pub loading: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub last_checked: OffsetDateTime,
    #[serde(default)]
    pub last_checked_user_id: Option<UserId>,
}

impl Default for AdminStatus {
    fn default() -> Self {
        Self {
            is_admin: false,
            checked: false,
            loading: false,
            last_checked: OffsetDateTime::UNIX_EPOCH,
            last_checked_user_id: None,
        }
    }
}

impl AdminStatus {
    /// Definitive negative: there is no user, so there is nothing pending.
    #[must_use]
    pub fn anonymous(now: OffsetDateTime) -> Self {
        Self {
            is_admin: false,
            checked: true,
            loading: false,
            last_checked: now,
            last_checked_user_id: None,
        }
    }

    /// Whether `is_admin` may be trusted for the given user.
    #[must_use]
    pub fn is_trusted_for(&self, user: &UserIdentity) -> bool {
        self.checked && self.last_checked_user_id.as_ref() == Some(&user.id)
    }
}
