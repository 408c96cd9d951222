//! Response decoding and pagination.

use serde_json::{Map, Value};
use tracing::debug;

use super::error::{ApiErrorResponse, ClientError};
use super::transport::{HttpMethod, RawResponse};

/// Decodes a response body, mapping error statuses to [`ClientError`].
pub(crate) fn decode(method: HttpMethod, path: &str, response: RawResponse) -> Result<Value, ClientError> {
    if response.is_success() {
        return serde_json::from_slice(&response.body).map_err(|_| ClientError::Client {
            code: "ERROR".to_owned(),
            message: "Response not JSON".to_owned(),
            status_code: Some(response.status),
        });
    }

    let error = match serde_json::from_slice::<Value>(&response.body) {
        Ok(Value::Object(body)) => error_from_body(method, response.status, &body),
        _ => ApiErrorResponse {
            code: "ERROR".to_owned(),
            message: response.reason.as_deref().map_or_else(
                || "Unknown error, response is not JSON".to_owned(),
                |reason| format!("Error reason: {reason}"),
            ),
            status_code: response.status,
            details: Vec::new(),
            timestamp: None,
            request_id: None,
        },
    };
    debug!(
        status = error.status_code,
        path,
        request_id = error.request_id.as_deref(),
        timestamp = error.timestamp.as_deref(),
        details = ?error.details,
        "Error returned by Veza API: {}",
        error.message
    );
    Err(ClientError::Response(Box::new(error)))
}

fn error_from_body(method: HttpMethod, status: u16, body: &Map<String, Value>) -> ApiErrorResponse {
    let text = |key: &str| body.get(key).and_then(Value::as_str).map(str::to_owned);
    ApiErrorResponse {
        code: text("code").unwrap_or_else(|| "UNKNOWN".to_owned()),
        message: text("message").unwrap_or_else(|| format!("Unknown error during {method}")),
        status_code: status,
        details: match body.get("details") {
            Some(Value::Array(details)) => details.clone(),
            _ => Vec::new(),
        },
        timestamp: text("timestamp"),
        request_id: text("request_id"),
    }
}

/// What one page of a list response contributes.
#[derive(Debug, PartialEq)]
pub(crate) enum Page {
    /// Entries of a paginated result, plus the token of the next page.
    Values {
        entries: Vec<Value>,
        next_page_token: Option<String>,
    },
    /// A single `value` result.
    Single(Value),
    /// Any other body, returned unchanged.
    Raw(Value),
}

impl Page {
    /// Classifies a decoded response body.
    pub(crate) fn from_response(response: Value) -> Self {
        let Value::Object(mut body) = response else {
            return Self::Raw(response);
        };
        if let Some(values) = body.remove("values") {
            let mut entries = into_entries(values);
            if let Some(path_values) = body.remove("path_values") {
                entries.extend(into_entries(path_values));
            }
            let has_more = body
                .get("has_more")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let next_page_token = body
                .get("next_page_token")
                .and_then(Value::as_str)
                .filter(|_| has_more)
                .map(str::to_owned);
            return Self::Values {
                entries,
                next_page_token,
            };
        }
        match body.remove("value") {
            Some(value) => Self::Single(value),
            None => Self::Raw(Value::Object(body)),
        }
    }
}

fn into_entries(values: Value) -> Vec<Value> {
    match values {
        Value::Array(entries) => entries,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// Converts a list result into its entries.
pub(crate) fn into_list(value: Value) -> Vec<Value> {
    into_entries(value)
}
