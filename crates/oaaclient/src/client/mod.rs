//! Async client for the platform's OAA REST API.
//!
//! [`OaaClient`] wraps an [`HttpTransport`] with bearer authentication,
//! retries, pagination and error mapping. Endpoint groups live in their own
//! modules: providers and data sources, payload pushes, and assessment
//! queries and reports.
//!
//! ```rust,ignore
//! use oaaclient::client::{ClientConfig, OaaClient};
//!
//! let config = ClientConfig::from_env(None, None)?;
//! let client = OaaClient::connect(config).await?;
//! let providers = client.get_provider_list().await?;
//! ```

use serde_json::Value;
use tracing::debug;
use url::Url;

mod assessments;
mod compression;
mod config;
mod error;
mod providers;
mod push;
mod response;
mod retry;
mod transport;

pub use compression::{GZIP, MAX_PAYLOAD_SIZE, compress_payload};
pub use config::{
    ClientConfig, DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT, PROVIDER_ICON_MAX_SIZE, RetrySettings,
    VezaSettings, normalize_url, user_agent,
};
pub use error::{ApiErrorResponse, ClientError};
pub use push::PushOptions;
pub use retry::{RETRY_STATUSES, RetryPolicy};
pub use transport::{
    ApiRequest, HttpMethod, HttpTransport, RawResponse, ReqwestTransport, TransportError,
    TransportErrorKind,
};

#[cfg(test)]
pub(crate) use transport::MockHttpTransport;

use self::response::Page;

/// Path probed to check connectivity and credentials.
const TEMPLATES_PATH: &str = "api/v1/providers/custom/templates";

/// Client for one platform instance.
#[derive(Debug)]
pub struct OaaClient<T = ReqwestTransport> {
    transport: T,
    config: ClientConfig,
}

impl OaaClient {
    /// Connects with the reqwest transport and checks that the platform is
    /// reachable and accepts the API key.
    ///
    /// # Errors
    ///
    /// Returns a `Unknown host` [`ClientError::Connection`] when the host
    /// does not resolve, and any error of the templates request.
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        let transport = ReqwestTransport::new(&config)?;
        resolve_host(config.url()).await?;
        let client = Self::with_transport(config, transport);
        client.test_connection().await?;
        Ok(client)
    }
}

impl<T: HttpTransport> OaaClient<T> {
    /// Builds a client over an existing transport without any network call.
    #[must_use]
    pub const fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { transport, config }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Normalized platform URL.
    #[must_use]
    pub fn url(&self) -> &str {
        self.config.url()
    }

    /// Appends `extra` to the user agent of later requests.
    pub fn set_user_agent_extra(&mut self, extra: Option<&str>) {
        self.config.user_agent_extra = extra.map(str::to_owned);
    }

    /// Enables or disables payload compression for pushes.
    pub const fn set_compression(&mut self, enabled: bool) {
        self.config.compression = enabled;
    }

    /// Requests the custom provider templates to validate the connection
    /// and the API key.
    ///
    /// # Errors
    ///
    /// Returns the request error, typically a 401 response error for a bad
    /// key.
    pub async fn test_connection(&self) -> Result<(), ClientError> {
        self.api_get(TEMPLATES_PATH, &[]).await.map(drop)
    }

    /// Issues a `GET`, following pagination.
    ///
    /// List responses are concatenated into one JSON array; a `value`
    /// response yields the value and anything else is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] of the first failed page.
    pub async fn api_get(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, ClientError> {
        self.paginated(HttpMethod::Get, path, None, params).await
    }

    /// Issues a `POST`, following pagination like [`OaaClient::api_get`].
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] of the failed request.
    pub async fn api_post(
        &self,
        path: &str,
        body: Option<&Value>,
        params: &[(&str, &str)],
    ) -> Result<Value, ClientError> {
        self.paginated(HttpMethod::Post, path, body, params).await
    }

    /// Issues a `PUT`, following pagination like [`OaaClient::api_get`].
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] of the failed request.
    pub async fn api_put(
        &self,
        path: &str,
        body: Option<&Value>,
        params: &[(&str, &str)],
    ) -> Result<Value, ClientError> {
        self.paginated(HttpMethod::Put, path, body, params).await
    }

    /// Issues a `PATCH` and returns the decoded body.
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] of the failed request.
    pub async fn api_patch(
        &self,
        path: &str,
        body: Option<&Value>,
        params: &[(&str, &str)],
    ) -> Result<Value, ClientError> {
        self.perform(HttpMethod::Patch, path, body, &owned_params(params))
            .await
    }

    /// Issues a `DELETE` and returns the decoded body.
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] of the failed request.
    pub async fn api_delete(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, ClientError> {
        self.perform(HttpMethod::Delete, path, None, &owned_params(params))
            .await
    }

    async fn paginated(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
        params: &[(&str, &str)],
    ) -> Result<Value, ClientError> {
        let mut query = owned_params(params);
        let mut collected = Vec::new();
        loop {
            let response = self.perform(method, path, body, &query).await?;
            match Page::from_response(response) {
                Page::Values {
                    entries,
                    next_page_token,
                } => {
                    collected.extend(entries);
                    let Some(token) = next_page_token else {
                        return Ok(Value::Array(collected));
                    };
                    query.retain(|(name, _)| name != "page_token");
                    query.push(("page_token".to_owned(), token));
                }
                Page::Single(value) | Page::Raw(value) => return Ok(value),
            }
        }
    }

    async fn perform(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
        query: &[(String, String)],
    ) -> Result<Value, ClientError> {
        let request = ApiRequest {
            method,
            path: path.trim_start_matches('/').to_owned(),
            query: query.to_vec(),
            body: body.cloned(),
            user_agent: self.config.user_agent(),
        };
        debug!(%method, path = %request.path, "sending API request");
        let raw = retry::send_with_retry(&self.transport, &self.config.retry, &request).await?;
        response::decode(method, &request.path, raw)
    }
}

fn owned_params(params: &[(&str, &str)]) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
        .collect()
}

async fn resolve_host(url: &str) -> Result<(), ClientError> {
    let unknown_host = |host: &str| ClientError::Connection {
        code: "Unknown host".to_owned(),
        message: format!("Unable to lookup DNS for {host}"),
        status_code: None,
    };
    let parsed = Url::parse(url).map_err(|_| unknown_host(url))?;
    let host = parsed.host_str().ok_or_else(|| unknown_host(url))?;
    let port = parsed.port_or_known_default().unwrap_or(443);
    let mut addresses = tokio::net::lookup_host((host, port))
        .await
        .map_err(|_| unknown_host(host))?;
    addresses.next().map(drop).ok_or_else(|| unknown_host(host))
}
