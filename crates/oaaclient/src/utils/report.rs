//! Creates or extends an assessment report from a JSON definition.

use std::collections::HashMap;

use serde_json::{Value, json};
use tracing::debug;

use crate::client::{ClientError, HttpTransport, OaaClient};

/// Query type of built-in queries, which never match a definition by name.
const SYSTEM_CREATED: &str = "SYSTEM_CREATED";

fn text<'a>(object: &'a Value, key: &str) -> Option<&'a str> {
    object.get(key).and_then(Value::as_str)
}

fn required_id(object: &Value) -> Result<String, ClientError> {
    text(object, "id")
        .map(str::to_owned)
        .ok_or_else(|| ClientError::client("ERROR", "Response object has no 'id' field"))
}

/// Ids of the queries a report already contains.
fn report_query_ids(report: &Value) -> Vec<&str> {
    report
        .get("queries")
        .and_then(Value::as_array)
        .map(|queries| {
            queries
                .iter()
                .filter_map(|query| text(query, "query").or_else(|| text(query, "id")))
                .collect()
        })
        .unwrap_or_default()
}

/// Creates the report named in `definition`, or adds missing queries to
/// the existing report with that name.
///
/// `definition` holds the report `name` and a `queries` list of query
/// definitions. A query whose name matches an existing user query is
/// reused; the others are created first.
///
/// Returns the response of the last change, or the current report when
/// nothing had to change.
///
/// # Errors
///
/// Returns [`ClientError::InvalidArgument`] when `name` or a non-empty
/// `queries` list is missing, and any request error.
///
/// # Examples
///
/// ```rust,ignore
/// use oaaclient::utils::{build_report, load_json_from_file};
///
/// let definition = load_json_from_file("report.json".as_ref())?;
/// let report = build_report(&client, &definition).await?;
/// ```
pub async fn build_report<T: HttpTransport>(
    client: &OaaClient<T>,
    definition: &Value,
) -> Result<Value, ClientError> {
    let report_name = text(definition, "name")
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ClientError::invalid_argument("Report source file must contain 'name'"))?;
    let queries = definition
        .get("queries")
        .and_then(Value::as_array)
        .filter(|queries| !queries.is_empty())
        .ok_or_else(|| {
            ClientError::invalid_argument("Report source file must contain 'queries' list")
        })?;

    let existing_queries = client.get_queries(true).await?;
    let known: HashMap<&str, &str> = existing_queries
        .iter()
        .filter(|query| text(query, "query_type") != Some(SYSTEM_CREATED))
        .filter_map(|query| Some((text(query, "name")?, text(query, "id")?)))
        .collect();

    let mut query_ids = Vec::with_capacity(queries.len());
    for query in queries {
        let query_name = text(query, "name").ok_or_else(|| {
            ClientError::invalid_argument("Report query definitions must contain 'name'")
        })?;
        if let Some(id) = known.get(query_name) {
            debug!("Found existing query with same name, using for report, {query_name}");
            query_ids.push((*id).to_owned());
        } else {
            debug!("Creating query {query_name}");
            let created = client.create_query(query).await?;
            query_ids.push(required_id(&created)?);
        }
    }

    let reports = client.get_reports(true, true).await?;
    let existing_report = reports
        .iter()
        .find(|report| text(report, "name") == Some(report_name))
        .map(required_id)
        .transpose()?;

    let Some(report_id) = existing_report else {
        debug!("Creating new report");
        let report = json!({
            "name": report_name,
            "description": report_name,
            "queries": query_ids
                .iter()
                .map(|id| json!({ "query": id }))
                .collect::<Vec<_>>(),
        });
        return client.create_report(&report).await;
    };

    debug!("Updating report {report_id}");
    let current = client.get_report_by_id(&report_id, true).await?;
    let present = report_query_ids(&current);
    let mut last_change = None;
    for query_id in query_ids
        .iter()
        .filter(|query_id| !present.contains(&query_id.as_str()))
    {
        last_change = Some(client.add_query_report(&report_id, query_id).await?);
    }
    Ok(last_change.unwrap_or(current))
}
