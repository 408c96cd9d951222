//! HTTP transport port and its reqwest adapter.
//!
//! The client builds [`ApiRequest`]s and hands them to an [`HttpTransport`];
//! retries, pagination and error mapping stay in the client so they can be
//! exercised against a mock transport.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER, USER_AGENT};
use reqwest::{Client, Url};
use serde_json::Value;
use thiserror::Error;
use zeroize::Zeroizing;

use super::config::ClientConfig;
use super::error::ClientError;

/// HTTP methods used by the platform API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl HttpMethod {
    /// Upper-case method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Methods that may be repeated after a failed or throttled attempt.
    #[must_use]
    pub const fn is_idempotent(self) -> bool {
        matches!(self, Self::Get | Self::Put | Self::Delete)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Self::GET,
            HttpMethod::Post => Self::POST,
            HttpMethod::Put => Self::PUT,
            HttpMethod::Patch => Self::PATCH,
            HttpMethod::Delete => Self::DELETE,
        }
    }
}

/// One API call, relative to the platform base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Path without the leading `/`, e.g. `api/v1/providers/custom`.
    pub path: String,
    /// Query parameters in send order.
    pub query: Vec<(String, String)>,
    /// JSON body, if any.
    pub body: Option<Value>,
    /// User agent header value.
    pub user_agent: String,
}

/// Response as received, before any JSON decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Reason phrase for the status, when known.
    pub reason: Option<String>,
    /// Response body bytes.
    pub body: Vec<u8>,
    /// Delay requested through a `Retry-After` header in seconds.
    pub retry_after: Option<Duration>,
}

impl RawResponse {
    /// Builds a response carrying a JSON body.
    #[must_use]
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            reason: None,
            body: body.to_string().into_bytes(),
            retry_after: None,
        }
    }

    /// Returns `true` for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Class of a transport failure, which decides whether it is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// No connection could be established.
    Connect,
    /// The request timed out.
    Timeout,
    /// Any other failure after the request was sent.
    Other,
}

/// Transport failure without a usable HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    /// Failure class.
    pub kind: TransportErrorKind,
    /// Description from the HTTP stack.
    pub message: String,
}

impl TransportError {
    /// Builds a connection failure.
    pub fn connect(message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Connect,
            message: message.into(),
        }
    }

    /// Builds a timeout failure.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Timeout,
            message: message.into(),
        }
    }
}

/// Port executing single HTTP exchanges against the platform.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends one request and returns the raw response.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when no response was received.
    async fn execute(&self, request: &ApiRequest) -> Result<RawResponse, TransportError>;
}

/// Reqwest-backed transport adding bearer authentication to every call.
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
    api_key: Zeroizing<String>,
}

impl fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ReqwestTransport {
    /// Builds a transport from the client configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidArgument`] when the base URL does not
    /// parse and [`ClientError::Client`] when the HTTP client cannot be
    /// constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(&format!("{}/", config.url())).map_err(|error| {
            ClientError::invalid_argument(format!("Invalid Veza URL {}: {error}", config.url()))
        })?;
        let client = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|error| ClientError::client("ERROR", format!("create HTTP client: {error}")))?;
        Ok(Self {
            client,
            base_url,
            api_key: Zeroizing::new(config.api_key().to_owned()),
        })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<RawResponse, TransportError> {
        let url = self.base_url.join(&request.path).map_err(|error| TransportError {
            kind: TransportErrorKind::Other,
            message: format!("invalid request path {}: {error}", request.path),
        })?;
        let mut builder = self
            .client
            .request(request.method.into(), url)
            .bearer_auth(self.api_key.as_str())
            .header(USER_AGENT, request.user_agent.as_str());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let retry_after = retry_after(response.headers());
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        Ok(RawResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().map(str::to_owned),
            body: body.to_vec(),
            retry_after,
        })
    }
}

fn map_reqwest_error(error: reqwest::Error) -> TransportError {
    let kind = if error.is_connect() {
        TransportErrorKind::Connect
    } else if error.is_timeout() {
        TransportErrorKind::Timeout
    } else {
        TransportErrorKind::Other
    };
    TransportError {
        kind,
        message: error.to_string(),
    }
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
