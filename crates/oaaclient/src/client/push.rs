//! Payload pushes to a provider's data source.

use std::path::{Path, PathBuf};

use cap_std::ambient_authority;
use cap_std::fs::Dir;
use chrono::Local;
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::compression::{GZIP, MAX_PAYLOAD_SIZE, compress_payload, with_thousands};
use super::error::ClientError;
use super::providers::{data_sources_path, object_id};
use super::transport::HttpTransport;
use super::OaaClient;
use crate::error::TemplateError;
use crate::templates::OaaTemplate;

/// Options for [`OaaClient::push_metadata`] and
/// [`OaaClient::push_application`].
#[derive(Debug, Clone, Default)]
pub struct PushOptions {
    /// Directory to write a pretty-printed copy of the payload to before
    /// the push.
    pub save_json: Option<PathBuf>,
    /// Create the provider from the template when it does not exist.
    /// Only used by [`OaaClient::push_application`].
    pub create_provider: bool,
    /// Extra fields for the push request body. Fields the client sets
    /// itself are not overridden.
    pub extra: Map<String, Value>,
}

impl<T: HttpTransport> OaaClient<T> {
    /// Pushes a raw OAA payload to `data_source_name` under an existing
    /// provider, creating the data source when it is missing.
    ///
    /// Returns the platform's response, including any payload warnings.
    ///
    /// # Errors
    ///
    /// Returns a `NO_PROVIDER` [`ClientError::Client`] when the provider
    /// does not exist, `OVERSIZE` when the encoded payload exceeds
    /// [`MAX_PAYLOAD_SIZE`], [`ClientError::Io`] when the payload copy
    /// cannot be written, and any request error.
    pub async fn push_metadata(
        &self,
        provider_name: &str,
        data_source_name: &str,
        metadata: &Value,
        options: &PushOptions,
    ) -> Result<Value, ClientError> {
        let provider = self.get_provider(provider_name).await?.ok_or_else(|| {
            ClientError::client(
                "NO_PROVIDER",
                format!(
                    "Unable to locate provider {provider_name}, cannot push without existing provider"
                ),
            )
        })?;
        let provider_id = object_id(&provider)?;
        let data_source = self
            .ensure_data_source(data_source_name, provider_id)
            .await?;
        let data_source_id = object_id(&data_source)?;

        if let Some(directory) = &options.save_json {
            save_payload(directory, data_source_name, metadata)?;
        }

        let body = self.push_body(provider_id, data_source_id, metadata, &options.extra)?;
        self.api_post(
            &format!("{}/{data_source_id}:push", data_sources_path(provider_id)),
            Some(&body),
            &[],
        )
        .await
    }

    /// Renders `application` and pushes it with
    /// [`OaaClient::push_metadata`].
    ///
    /// With [`PushOptions::create_provider`] set, a missing provider is
    /// created for the application's template first.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Template`] when the payload cannot be rendered
    /// and the errors of [`OaaClient::push_metadata`].
    pub async fn push_application<A>(
        &self,
        provider_name: &str,
        data_source_name: &str,
        application: &A,
        options: &PushOptions,
    ) -> Result<Value, ClientError>
    where
        A: OaaTemplate + ?Sized,
    {
        if options.create_provider && self.get_provider(provider_name).await?.is_none() {
            info!(provider = provider_name, "creating provider");
            self.create_provider(provider_name, application.template(), None)
                .await?;
        }
        let payload = application.payload()?;
        self.push_metadata(provider_name, data_source_name, &payload, options)
            .await
    }

    async fn ensure_data_source(&self, name: &str, provider_id: &str) -> Result<Value, ClientError> {
        if let Some(existing) = self.get_data_source(name, provider_id).await? {
            return Ok(existing);
        }
        info!(data_source = name, "creating data source");
        self.create_data_source(name, provider_id).await?;
        self.get_data_source(name, provider_id)
            .await?
            .ok_or_else(|| {
                ClientError::client("ERROR", format!("Unable to locate data source {name} after creation"))
            })
    }

    fn push_body(
        &self,
        provider_id: &str,
        data_source_id: &str,
        metadata: &Value,
        extra: &Map<String, Value>,
    ) -> Result<Value, ClientError> {
        let json_text = serde_json::to_string(metadata).map_err(TemplateError::from)?;
        let mut body = Map::new();
        body.insert("id".to_owned(), Value::from(provider_id));
        body.insert("data_source_id".to_owned(), Value::from(data_source_id));

        let json_data = if self.config.compression {
            debug!("Compressing payload");
            let encoded = compress_payload(json_text.as_bytes())?;
            debug!(
                "Compression complete, payload size in bytes: {}, encoded compressed: {}",
                with_thousands(json_text.len()),
                with_thousands(encoded.len())
            );
            body.insert("compression_type".to_owned(), Value::from(GZIP));
            encoded
        } else {
            json_text
        };

        if json_data.len() > MAX_PAYLOAD_SIZE {
            return Err(ClientError::client(
                "OVERSIZE",
                format!(
                    "Payload size exceeds maximum size of 100MB: {} bytes, compression enabled: {}",
                    with_thousands(json_data.len()),
                    self.config.compression
                ),
            ));
        }
        debug!("Final payload size: {} bytes", with_thousands(json_data.len()));
        body.insert("json_data".to_owned(), Value::String(json_data));

        for (name, value) in extra {
            body.entry(name.clone()).or_insert_with(|| value.clone());
        }
        Ok(Value::Object(body))
    }
}

/// Writes `metadata` as `{data_source}-{timestamp}.json` under `directory`.
fn save_payload(directory: &Path, data_source_name: &str, metadata: &Value) -> Result<PathBuf, ClientError> {
    let file_name = format!(
        "{data_source_name}-{}.json",
        Local::now().format("%Y%m%d-%H%M%S")
    );
    let pretty = serde_json::to_string_pretty(metadata).map_err(TemplateError::from)?;
    let dir = Dir::open_ambient_dir(directory, ambient_authority())?;
    dir.write(&file_name, pretty)?;
    let saved = directory.join(file_name);
    info!(path = %saved.display(), "saved payload");
    Ok(saved)
}
