//! Client configuration and its environment sources.
//!
//! Explicit arguments win over the environment. The environment is read
//! through OrthoConfig:
//!
//! - `VEZA_URL`, `VEZA_API_KEY`: platform address and credentials
//! - `VEZA_UNSAFE_HTTPS`: `true` disables certificate verification
//! - `OAA_API_RETRIES`: retry budget for each request

use std::ffi::OsString;
use std::fmt;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};
use tracing::error;
use zeroize::Zeroizing;

use super::error::ClientError;
use super::retry::RetryPolicy;

/// Request timeout applied to every call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Page size requested from list endpoints.
pub const DEFAULT_PAGE_SIZE: u32 = 250;

/// Largest accepted provider icon, in bytes of base64 text.
pub const PROVIDER_ICON_MAX_SIZE: usize = 64_000;

/// Platform connection settings read from `VEZA_*` variables.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "VEZA")]
pub struct VezaSettings {
    /// Platform URL.
    pub url: Option<String>,
    /// API key used as the bearer token.
    pub api_key: Option<String>,
    /// Skip TLS certificate verification. Development use only.
    ///
    /// Only `true`, in any case, is honoured; any other value keeps
    /// verification on.
    #[ortho_config(default = false)]
    #[serde(default, deserialize_with = "true_flag")]
    pub unsafe_https: bool,
}

fn true_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Text(text) => text.trim().eq_ignore_ascii_case("true"),
        Flag::Other(_) => false,
    })
}

/// Retry settings read from `OAA_API_*` variables.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "OAA_API")]
pub struct RetrySettings {
    /// Number of retries for each request.
    pub retries: Option<u32>,
}

impl VezaSettings {
    /// Loads the settings from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidArgument`] when a variable cannot be
    /// parsed.
    pub fn load() -> Result<Self, ClientError> {
        Self::load_from_iter([OsString::from("oaaclient")])
            .map_err(|error| ClientError::invalid_argument(format!("invalid VEZA settings: {error}")))
    }
}

impl RetrySettings {
    /// Retry budget from `OAA_API_RETRIES`, falling back to the default.
    ///
    /// A value that is not an unsigned integer is logged and ignored.
    #[must_use]
    pub fn retries_or_default() -> u32 {
        match Self::load_from_iter([OsString::from("oaaclient")]) {
            Ok(settings) => settings.retries.unwrap_or(RetryPolicy::DEFAULT_RETRIES),
            Err(_) => {
                error!(
                    "OAA_API_RETRIES variable must be integer, ignoring and setting to default {}",
                    RetryPolicy::DEFAULT_RETRIES
                );
                RetryPolicy::DEFAULT_RETRIES
            }
        }
    }
}

/// Everything [`OaaClient`](super::OaaClient) needs to reach the platform.
#[derive(Clone)]
pub struct ClientConfig {
    url: String,
    api_key: Zeroizing<String>,
    /// Verify TLS certificates.
    pub verify_tls: bool,
    /// Retry schedule for failed requests.
    pub retry: RetryPolicy,
    /// Timeout for each request.
    pub timeout: Duration,
    /// Gzip and base64 encode pushed payloads.
    pub compression: bool,
    /// Text appended to the user agent.
    pub user_agent_extra: Option<String>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("verify_tls", &self.verify_tls)
            .field("retry", &self.retry)
            .field("timeout", &self.timeout)
            .field("compression", &self.compression)
            .field("user_agent_extra", &self.user_agent_extra)
            .finish()
    }
}

impl ClientConfig {
    /// Builds a configuration from explicit values and library defaults.
    ///
    /// The URL gains an `https://` prefix when it has no scheme and loses
    /// any trailing `/`.
    ///
    /// # Errors
    ///
    /// Returns a `MISSING_URL` or `MISSING_AUTH` [`ClientError::Client`]
    /// for empty values.
    ///
    /// # Examples
    ///
    /// ```
    /// use oaaclient::client::ClientConfig;
    ///
    /// let config = ClientConfig::new("example.vezacloud.com/", "key")?;
    /// assert_eq!(config.url(), "https://example.vezacloud.com");
    /// # Ok::<(), oaaclient::client::ClientError>(())
    /// ```
    pub fn new(url: &str, api_key: &str) -> Result<Self, ClientError> {
        if url.trim().is_empty() {
            return Err(ClientError::client("MISSING_URL", "URL cannot be None"));
        }
        if api_key.is_empty() {
            return Err(ClientError::client("MISSING_AUTH", "API key cannot be None"));
        }
        Ok(Self {
            url: normalize_url(url),
            api_key: Zeroizing::new(api_key.to_owned()),
            verify_tls: true,
            retry: RetryPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
            compression: true,
            user_agent_extra: None,
        })
    }

    /// Builds a configuration from explicit values, filling gaps from the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidArgument`] when neither source supplies
    /// the URL or key, and the errors of [`ClientConfig::new`].
    pub fn from_env(url: Option<&str>, api_key: Option<&str>) -> Result<Self, ClientError> {
        let settings = VezaSettings::load()?;
        let resolved_url = match url.filter(|value| !value.is_empty()) {
            Some(value) => value.to_owned(),
            None => settings
                .url
                .ok_or_else(|| ClientError::invalid_argument("Must provide Veza URL"))?,
        };
        let resolved_key = match api_key.filter(|value| !value.is_empty()) {
            Some(value) => Zeroizing::new(value.to_owned()),
            None => Zeroizing::new(
                settings
                    .api_key
                    .ok_or_else(|| ClientError::invalid_argument("Must provide Veza API key"))?,
            ),
        };

        let mut config = Self::new(&resolved_url, &resolved_key)?;
        config.verify_tls = !settings.unsafe_https;
        config.retry = RetryPolicy {
            retries: RetrySettings::retries_or_default(),
            ..RetryPolicy::default()
        };
        Ok(config)
    }

    /// Normalized platform URL without a trailing `/`.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    pub(crate) fn api_key(&self) -> &str {
        self.api_key.as_str()
    }

    /// User agent sent with every request.
    #[must_use]
    pub fn user_agent(&self) -> String {
        user_agent(self.user_agent_extra.as_deref())
    }
}

/// Adds `https://` when no scheme is present and strips trailing slashes.
///
/// # Examples
///
/// ```
/// use oaaclient::client::normalize_url;
///
/// assert_eq!(normalize_url("veza.example.com/"), "https://veza.example.com");
/// assert_eq!(normalize_url("https://veza.example.com"), "https://veza.example.com");
/// ```
#[must_use]
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    let with_scheme = if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    };
    with_scheme.trim_end_matches('/').to_owned()
}

/// User agent naming the library version and platform, plus `extra`.
#[must_use]
pub fn user_agent(extra: Option<&str>) -> String {
    let base = format!(
        "oaaclient/{} rust {}/{};",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    match extra.filter(|value| !value.is_empty()) {
        Some(value) => format!("{base} {value}"),
        None => base,
    }
}
