/// Crate-level error.
///
/// Only configuration and the persistence layer produce these directly; the
/// auth store itself never returns them across its public boundary.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Identity provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Error returned by an [`IdentityProvider`](crate::provider::IdentityProvider) call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ProviderError {
    /// The provider answered with a structured error body.
    #[error("{message} ({kind}, {code})")]
    Api {
        code: u16,
        kind: String,
        message: String,
    },
    /// The request never produced a response.
    #[error("transport failure: {0}")]
    Transport(String),
    /// The response could not be decoded.
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl ProviderError {
    /// Whether the provider itself recognized and described the failure.
    ///
    /// Recognized errors carry a message that is safe to show to the user
    /// (wrong password, duplicate account, ...).
    #[must_use]
    pub fn is_recognized(&self) -> bool {
        matches!(self, Self::Api { .. })
    }

    #[must_use]
    pub fn api(code: u16, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            code,
            kind: kind.into(),
            message: message.into(),
        }
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_api_errors_are_recognized() {
        assert!(ProviderError::api(401, "user_invalid_credentials", "Invalid credentials").is_recognized());
        assert!(!ProviderError::Transport("connection reset".into()).is_recognized());
        assert!(!ProviderError::Decode("eof".into()).is_recognized());
        assert!(!ProviderError::Unexpected("boom".into()).is_recognized());
    }

    #[test]
    fn api_error_display_includes_kind_and_code() {
        let e = ProviderError::api(409, "user_already_exists", "A user with the same email already exists");
        assert_eq!(
            e.to_string(),
            "A user with the same email already exists (user_already_exists, 409)"
        );
    }
}
