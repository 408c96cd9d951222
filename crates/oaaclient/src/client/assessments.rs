//! Assessment queries and reports.
//!
//! Query and report definitions are owned by the platform and passed
//! through as JSON.

use serde_json::Value;

use super::config::DEFAULT_PAGE_SIZE;
use super::error::ClientError;
use super::response::into_list;
use super::transport::HttpTransport;
use super::OaaClient;

const QUERIES_PATH: &str = "api/v1/assessments/queries";
const REPORTS_PATH: &str = "api/preview/assessments/reports";

const fn flag(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

impl<T: HttpTransport> OaaClient<T> {
    /// Lists saved assessment queries.
    ///
    /// Queries on entity types with no configured integration are inactive;
    /// pass `false` to leave them out.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    pub async fn get_queries(&self, include_inactive_queries: bool) -> Result<Vec<Value>, ClientError> {
        let page_size = DEFAULT_PAGE_SIZE.to_string();
        let queries = self
            .api_get(
                QUERIES_PATH,
                &[
                    ("include_inactive_queries", flag(include_inactive_queries)),
                    ("page_size", page_size.as_str()),
                ],
            )
            .await?;
        Ok(into_list(queries))
    }

    /// Fetches a query definition.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    pub async fn get_query_by_id(&self, query_id: &str) -> Result<Value, ClientError> {
        self.api_get(&format!("{QUERIES_PATH}/{query_id}"), &[]).await
    }

    /// Creates a query; the result carries the new query's `id`.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    pub async fn create_query(&self, query: &Value) -> Result<Value, ClientError> {
        self.api_post(QUERIES_PATH, Some(query), &[]).await
    }

    /// Deletes a query. `force` also removes it from reports using it.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    pub async fn delete_query(&self, query_id: &str, force: bool) -> Result<Value, ClientError> {
        self.api_delete(&format!("{QUERIES_PATH}/{query_id}"), &[("force", flag(force))])
            .await
    }

    /// Lists reports. Both flags must be `true` to list every report.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    pub async fn get_reports(
        &self,
        include_inactive_reports: bool,
        include_inactive_queries: bool,
    ) -> Result<Vec<Value>, ClientError> {
        let page_size = DEFAULT_PAGE_SIZE.to_string();
        let reports = self
            .api_get(
                REPORTS_PATH,
                &[
                    ("include_inactive_reports", flag(include_inactive_reports)),
                    ("include_inactive_queries", flag(include_inactive_queries)),
                    ("page_size", page_size.as_str()),
                ],
            )
            .await?;
        Ok(into_list(reports))
    }

    /// Fetches a report definition.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    pub async fn get_report_by_id(
        &self,
        report_id: &str,
        include_inactive_queries: bool,
    ) -> Result<Value, ClientError> {
        self.api_get(
            &format!("{REPORTS_PATH}/{report_id}"),
            &[("include_inactive_queries", flag(include_inactive_queries))],
        )
        .await
    }

    /// Creates a report.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    pub async fn create_report(&self, report: &Value) -> Result<Value, ClientError> {
        self.api_post(REPORTS_PATH, Some(report), &[]).await
    }

    /// Replaces a report definition.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    pub async fn update_report(&self, report_id: &str, report: &Value) -> Result<Value, ClientError> {
        self.api_put(&format!("{REPORTS_PATH}/{report_id}"), Some(report), &[])
            .await
    }

    /// Adds an existing query to a report.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    pub async fn add_query_report(&self, report_id: &str, query_id: &str) -> Result<Value, ClientError> {
        self.api_put(&format!("{REPORTS_PATH}/{report_id}/queries/{query_id}"), None, &[])
            .await
    }

    /// Deletes a report.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    pub async fn delete_report(&self, report_id: &str) -> Result<Value, ClientError> {
        self.api_delete(&format!("{REPORTS_PATH}/{report_id}"), &[])
            .await
    }
}

#[cfg(test)]
mod tests {
    //! Query and report endpoints against a mock transport.

    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::client::tests::{expect_call, mock_client};
    use crate::client::transport::{HttpMethod, MockHttpTransport, RawResponse};

    fn has_param(query: &[(String, String)], name: &str, value: &str) -> bool {
        query.iter().any(|(key, val)| key == name && val == value)
    }

    #[rstest]
    #[case::all(true)]
    #[case::active(false)]
    #[tokio::test]
    async fn queries_are_listed_with_flags(#[case] include_inactive: bool) {
        let expected = flag(include_inactive);
        let mut transport = MockHttpTransport::new();
        transport
            .expect_execute()
            .withf(move |request| {
                request.path == QUERIES_PATH
                    && has_param(&request.query, "include_inactive_queries", expected)
                    && has_param(&request.query, "page_size", "250")
            })
            .times(1)
            .returning(|_| Ok(RawResponse::json(200, &json!({"values": [{"id": "q-1"}]}))));

        let queries = mock_client(transport)
            .get_queries(include_inactive)
            .await
            .expect("listed");
        assert_eq!(queries, vec![json!({"id": "q-1"})]);
    }

    #[tokio::test]
    async fn forced_query_delete_sends_flag() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_execute()
            .withf(|request| {
                request.method == HttpMethod::Delete
                    && request.path == "api/v1/assessments/queries/q-1"
                    && has_param(&request.query, "force", "true")
            })
            .times(1)
            .returning(|_| Ok(RawResponse::json(200, &json!({}))));

        mock_client(transport)
            .delete_query("q-1", true)
            .await
            .expect("deleted");
    }

    #[tokio::test]
    async fn reports_are_listed_with_both_flags() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_execute()
            .withf(|request| {
                request.path == REPORTS_PATH
                    && has_param(&request.query, "include_inactive_reports", "false")
                    && has_param(&request.query, "include_inactive_queries", "true")
            })
            .times(1)
            .returning(|_| Ok(RawResponse::json(200, &json!({"values": []}))));

        let reports = mock_client(transport)
            .get_reports(false, true)
            .await
            .expect("listed");
        assert!(reports.is_empty());
    }

    #[tokio::test]
    async fn query_is_added_to_report_without_body() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_execute()
            .withf(|request| {
                request.method == HttpMethod::Put
                    && request.path == "api/preview/assessments/reports/r-1/queries/q-1"
                    && request.body.is_none()
            })
            .times(1)
            .returning(|_| Ok(RawResponse::json(200, &json!({"id": "r-1"}))));

        let response = mock_client(transport)
            .add_query_report("r-1", "q-1")
            .await
            .expect("added");
        assert_eq!(response, json!({"id": "r-1"}));
    }

    #[tokio::test]
    async fn report_is_updated_with_put() {
        let mut transport = MockHttpTransport::new();
        expect_call(
            &mut transport,
            HttpMethod::Put,
            "api/preview/assessments/reports/r-1",
            200,
            json!({"value": {"id": "r-1", "name": "Audit"}}),
        );

        let report = mock_client(transport)
            .update_report("r-1", &json!({"name": "Audit"}))
            .await
            .expect("updated");
        assert_eq!(report, json!({"id": "r-1", "name": "Audit"}));
    }
}
