use reqwest::Method;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

use crate::error::{Error, ProviderError};
use crate::provider::IdentityProvider;
use crate::types::{AuthToken, Preferences, Session, UserId, UserIdentity};

const PROJECT_HEADER: &str = "X-Appwrite-Project";

/// Connection settings for the account REST API.
///
/// ```rust,ignore
/// use voyage_auth::ProviderConfig;
///
/// let config = ProviderConfig::new("https://cloud.appwrite.io/v1".parse()?, "voyage-web");
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ProviderConfig {
    pub(crate) endpoint: Url,
    pub(crate) project_id: String,
}

impl ProviderConfig {
    #[must_use]
    pub fn new(endpoint: Url, project_id: impl Into<String>) -> Self {
        Self {
            endpoint,
            project_id: project_id.into(),
        }
    }

    /// Read the configuration from the environment.
    ///
    /// # Required env vars
    /// - `VOYAGE_AUTH_ENDPOINT`: API base URL, e.g. `https://cloud.appwrite.io/v1`
    /// - `VOYAGE_AUTH_PROJECT`: project identifier
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable is missing or the URL is invalid.
    pub fn from_env() -> Result<Self, Error> {
        let endpoint = std::env::var("VOYAGE_AUTH_ENDPOINT")
            .map_err(|_| Error::Config("VOYAGE_AUTH_ENDPOINT is required".into()))?;
        let endpoint: Url = endpoint
            .parse()
            .map_err(|e| Error::Config(format!("VOYAGE_AUTH_ENDPOINT: {e}")))?;
        let project_id = std::env::var("VOYAGE_AUTH_PROJECT")
            .map_err(|_| Error::Config("VOYAGE_AUTH_PROJECT is required".into()))?;
        Ok(Self::new(endpoint, project_id))
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Join an API path onto the endpoint, keeping the endpoint's own path prefix.
    pub(crate) fn url(&self, path: &str) -> Result<Url, ProviderError> {
        let base = self.endpoint.as_str().trim_end_matches('/');
        format!("{base}{path}")
            .parse()
            .map_err(|e| ProviderError::Unexpected(format!("invalid url for {path}: {e}")))
    }
}

/// Error body returned by the account API on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    #[serde(default)]
    code: Option<u16>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JwtResponse {
    jwt: String,
}

/// [`IdentityProvider`] over the Appwrite-style account REST API.
///
/// Session cookies set by the API are kept in the client's cookie store, so a
/// single instance represents a single logged-in client.
pub struct RestIdentityProvider {
    config: ProviderConfig,
    http: reqwest::Client,
}

impl RestIdentityProvider {
    /// Create a provider with its own cookie-keeping HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the HTTP client cannot be initialized.
    pub fn new(config: ProviderConfig) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| Error::Config(format!("http client: {e}")))?;
        Ok(Self { config, http })
    }

    /// Use a custom HTTP client (it must keep cookies for sessions to stick).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> Result<reqwest::RequestBuilder, ProviderError> {
        let url = self.config.url(path)?;
        Ok(self
            .http
            .request(method, url)
            .header(PROJECT_HEADER, &self.config.project_id))
    }

    async fn send_json<T: DeserializeOwned>(
        builder: reqwest::RequestBuilder,
        operation: &'static str,
    ) -> Result<T, ProviderError> {
        let response = Self::ensure_success(builder.send().await?, operation).await?;
        response.json::<T>().await.map_err(Into::into)
    }

    async fn send_empty(
        builder: reqwest::RequestBuilder,
        operation: &'static str,
    ) -> Result<(), ProviderError> {
        Self::ensure_success(builder.send().await?, operation).await?;
        Ok(())
    }

    /// Returns the response on 2xx, otherwise the decoded API error.
    async fn ensure_success(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response, ProviderError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(operation, status, "Account API returned an error");
        Err(parse_api_error(status, &body))
    }
}

/// Decode an error body; bodies that are not the API's JSON shape are unexpected.
fn parse_api_error(status: u16, body: &str) -> ProviderError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(err) => ProviderError::Api {
            code: err.code.unwrap_or(status),
            kind: err.kind.unwrap_or_else(|| "unknown".into()),
            message: err.message,
        },
        Err(_) => ProviderError::Unexpected(format!("HTTP {status}: {body}")),
    }
}

impl IdentityProvider for RestIdentityProvider {
    async fn get_current_session(&self) -> Result<Session, ProviderError> {
        let req = self.request(Method::GET, "/account/sessions/current")?;
        Self::send_json(req, "get current session").await
    }

    async fn get_current_user(&self) -> Result<UserIdentity, ProviderError> {
        let req = self.request(Method::GET, "/account")?;
        Self::send_json(req, "get current user").await
    }

    async fn create_email_password_session(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, ProviderError> {
        let req = self
            .request(Method::POST, "/account/sessions/email")?
            .json(&json!({ "email": email, "password": password }));
        Self::send_json(req, "create email session").await
    }

    async fn create_account(
        &self,
        id: &UserId,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<(), ProviderError> {
        let req = self.request(Method::POST, "/account")?.json(&json!({
            "userId": id,
            "email": email,
            "password": password,
            "name": name,
        }));
        Self::send_empty(req, "create account").await
    }

    async fn create_auth_token(&self) -> Result<AuthToken, ProviderError> {
        let req = self.request(Method::POST, "/account/jwts")?;
        let body: JwtResponse = Self::send_json(req, "create jwt").await?;
        Ok(AuthToken(body.jwt))
    }

    async fn delete_all_sessions(&self) -> Result<(), ProviderError> {
        let req = self.request(Method::DELETE, "/account/sessions")?;
        Self::send_empty(req, "delete sessions").await
    }

    async fn update_preferences(&self, prefs: &Preferences) -> Result<UserIdentity, ProviderError> {
        let req = self
            .request(Method::PATCH, "/account/prefs")?
            .json(&json!({ "prefs": prefs }));
        Self::send_json(req, "update prefs").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ProviderConfig {
        ProviderConfig::new("https://cloud.example.com/v1".parse().unwrap(), "voyage-web")
    }

    #[test]
    fn url_keeps_endpoint_path_prefix() {
        let config = test_config();
        assert_eq!(
            config.url("/account/sessions/current").unwrap().as_str(),
            "https://cloud.example.com/v1/account/sessions/current"
        );
    }

    #[test]
    fn url_tolerates_trailing_slash() {
        let config = ProviderConfig::new("https://cloud.example.com/v1/".parse().unwrap(), "p");
        assert_eq!(
            config.url("/account").unwrap().as_str(),
            "https://cloud.example.com/v1/account"
        );
    }

    #[test]
    fn api_error_body_is_recognized() {
        let body = r#"{"message":"Invalid credentials. Please check the email and password.","code":401,"type":"user_invalid_credentials","version":"1.5.7"}"#;
        let err = parse_api_error(401, body);
        assert_eq!(
            err,
            ProviderError::api(
                401,
                "user_invalid_credentials",
                "Invalid credentials. Please check the email and password."
            )
        );
        assert!(err.is_recognized());
    }

    #[test]
    fn api_error_without_code_uses_status() {
        let err = parse_api_error(503, r#"{"message":"Service unavailable"}"#);
        assert_eq!(err, ProviderError::api(503, "unknown", "Service unavailable"));
    }

    #[test]
    fn non_json_error_body_is_unexpected() {
        let err = parse_api_error(502, "<html>Bad Gateway</html>");
        assert!(matches!(err, ProviderError::Unexpected(_)));
        assert!(!err.is_recognized());
    }

    #[test]
    fn provider_builds_with_config() {
        let provider = RestIdentityProvider::new(test_config()).unwrap();
        assert_eq!(provider.config().project_id(), "voyage-web");
    }
}
