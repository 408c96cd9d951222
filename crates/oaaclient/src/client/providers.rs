//! Custom providers and their data sources.

use serde_json::{Map, Value, json};

use super::config::{DEFAULT_PAGE_SIZE, PROVIDER_ICON_MAX_SIZE};
use super::error::ClientError;
use super::response::into_list;
use super::transport::HttpTransport;
use super::OaaClient;
use crate::templates::CustomTemplate;
use crate::validation::{ALLOWED_NAME_PATTERN, is_allowed_name};

const PROVIDERS_PATH: &str = "api/v1/providers/custom";

fn name_filter(name: &str) -> String {
    format!("name eq \"{name}\"")
}

/// Zero or one entry of a filtered list.
fn single(entries: Vec<Value>) -> Result<Option<Value>, ClientError> {
    let mut remaining = entries.into_iter();
    let first = remaining.next();
    if remaining.next().is_some() {
        return Err(ClientError::client(
            "Unexpected Results",
            "Unexpected results in response, returned more than one result",
        ));
    }
    Ok(first)
}

/// Identifier of a provider or data source object.
pub(crate) fn object_id(object: &Value) -> Result<&str, ClientError> {
    object.get("id").and_then(Value::as_str).ok_or_else(|| {
        ClientError::client("ERROR", "Response object has no 'id' field")
    })
}

impl<T: HttpTransport> OaaClient<T> {
    /// Lists every custom provider.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    pub async fn get_provider_list(&self) -> Result<Vec<Value>, ClientError> {
        let page_size = DEFAULT_PAGE_SIZE.to_string();
        let providers = self
            .api_get(PROVIDERS_PATH, &[("page_size", page_size.as_str())])
            .await?;
        Ok(into_list(providers))
    }

    /// Finds a provider by exact name.
    ///
    /// # Errors
    ///
    /// Returns an `Unexpected Results` [`ClientError::Client`] when more than
    /// one provider matches, and any request error.
    pub async fn get_provider(&self, name: &str) -> Result<Option<Value>, ClientError> {
        let filter = name_filter(name);
        let providers = self.api_get(PROVIDERS_PATH, &[("filter", filter.as_str())]).await?;
        single(into_list(providers))
    }

    /// Fetches a provider by id, `None` when the platform answers 404.
    ///
    /// # Errors
    ///
    /// Returns any request error other than not found.
    pub async fn get_provider_by_id(&self, provider_id: &str) -> Result<Option<Value>, ClientError> {
        match self
            .api_get(&format!("{PROVIDERS_PATH}/{provider_id}"), &[])
            .await
        {
            Ok(provider) => Ok(Some(provider)),
            Err(ClientError::Response(response)) if response.status_code == 404 => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Creates a provider for `template`, then uploads `icon` if given.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidArgument`] for a name outside
    /// [`ALLOWED_NAME_PATTERN`] or an oversized icon, and any request error.
    pub async fn create_provider(
        &self,
        name: &str,
        template: CustomTemplate,
        icon_base64: Option<&str>,
    ) -> Result<Value, ClientError> {
        self.create_provider_with_options(name, template, icon_base64, &Map::new())
            .await
    }

    /// Like [`OaaClient::create_provider`], merging `options` into the
    /// request body.
    ///
    /// # Errors
    ///
    /// See [`OaaClient::create_provider`].
    pub async fn create_provider_with_options(
        &self,
        name: &str,
        template: CustomTemplate,
        icon_base64: Option<&str>,
        options: &Map<String, Value>,
    ) -> Result<Value, ClientError> {
        if !is_allowed_name(name) {
            return Err(ClientError::invalid_argument(format!(
                "Provider name contains invalid characters, must match {ALLOWED_NAME_PATTERN}"
            )));
        }
        let mut body = options.clone();
        body.insert("name".to_owned(), Value::from(name));
        body.insert("custom_template".to_owned(), Value::from(template.as_str()));
        let provider = self
            .api_post(PROVIDERS_PATH, Some(&Value::Object(body)), &[])
            .await?;

        if let Some(icon) = icon_base64.filter(|icon| !icon.is_empty()) {
            self.update_provider_icon(object_id(&provider)?, icon).await?;
        }
        Ok(provider)
    }

    /// Replaces a provider's icon with base64 encoded image data.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidArgument`] when the encoded icon exceeds
    /// [`PROVIDER_ICON_MAX_SIZE`], and any request error.
    pub async fn update_provider_icon(&self, provider_id: &str, icon_base64: &str) -> Result<(), ClientError> {
        if icon_base64.len() > PROVIDER_ICON_MAX_SIZE {
            return Err(ClientError::invalid_argument("Max icon size of 64KB exceeded"));
        }
        let body = json!({ "icon_base64": icon_base64 });
        self.api_post(&format!("{PROVIDERS_PATH}/{provider_id}:icon"), Some(&body), &[])
            .await
            .map(drop)
    }

    /// Deletes a provider with all of its data sources.
    ///
    /// Removal completes in the background after the response.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    pub async fn delete_provider(&self, provider_id: &str) -> Result<Value, ClientError> {
        self.api_delete(&format!("{PROVIDERS_PATH}/{provider_id}"), &[])
            .await
    }

    /// Lists the data sources of a provider.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    pub async fn get_data_sources(&self, provider_id: &str) -> Result<Vec<Value>, ClientError> {
        let page_size = DEFAULT_PAGE_SIZE.to_string();
        let data_sources = self
            .api_get(
                &data_sources_path(provider_id),
                &[("page_size", page_size.as_str())],
            )
            .await?;
        Ok(into_list(data_sources))
    }

    /// Finds a provider's data source by exact name.
    ///
    /// # Errors
    ///
    /// Returns an `Unexpected Results` [`ClientError::Client`] when more than
    /// one data source matches, and any request error.
    pub async fn get_data_source(&self, name: &str, provider_id: &str) -> Result<Option<Value>, ClientError> {
        let filter = name_filter(name);
        let data_sources = self
            .api_get(&data_sources_path(provider_id), &[("filter", filter.as_str())])
            .await?;
        single(into_list(data_sources))
    }

    /// Creates a data source under a provider.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidArgument`] for a name outside
    /// [`ALLOWED_NAME_PATTERN`], and any request error.
    pub async fn create_data_source(&self, name: &str, provider_id: &str) -> Result<Value, ClientError> {
        if !is_allowed_name(name) {
            return Err(ClientError::invalid_argument(format!(
                "Data source name contains invalid characters, must match {ALLOWED_NAME_PATTERN}"
            )));
        }
        let body = json!({ "name": name, "id": provider_id });
        self.api_post(&data_sources_path(provider_id), Some(&body), &[])
            .await
    }

    /// Deletes a data source and all of its entities.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    pub async fn delete_data_source(&self, data_source_id: &str, provider_id: &str) -> Result<Value, ClientError> {
        self.api_delete(
            &format!("{}/{data_source_id}", data_sources_path(provider_id)),
            &[],
        )
        .await
    }
}

pub(crate) fn data_sources_path(provider_id: &str) -> String {
    format!("{PROVIDERS_PATH}/{provider_id}/datasources")
}
