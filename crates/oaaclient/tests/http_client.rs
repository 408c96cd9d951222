//! End-to-end client tests against a local HTTP mock server.
//!
//! These exercise the reqwest transport: bearer authentication, query
//! encoding, JSON bodies and error mapping over a real socket.

#![expect(
    clippy::expect_used,
    reason = "test code uses expect for clear failure messages"
)]

use httpmock::prelude::*;
use oaaclient::client::{
    ClientConfig, ClientError, HttpTransport, OaaClient, PushOptions, ReqwestTransport,
    RetryPolicy, TransportErrorKind,
};
use oaaclient::client::{ApiRequest, HttpMethod};
use serde_json::json;

fn config(url: &str) -> ClientConfig {
    let mut config = ClientConfig::new(url, "secret-key").expect("valid config");
    config.retry = RetryPolicy::none();
    config
}

async fn connected(server: &MockServer) -> OaaClient {
    let templates = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/providers/custom/templates")
                .header("authorization", "Bearer secret-key");
            then.status(200)
                .json_body(json!({"values": [{"id": "application"}], "has_more": false}));
        })
        .await;
    let client = OaaClient::connect(config(&server.base_url()))
        .await
        .expect("connects");
    templates.assert_async().await;
    client
}

#[tokio::test]
async fn provider_lookup_sends_filter_and_credentials() {
    let server = MockServer::start_async().await;
    let client = connected(&server).await;
    let lookup = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/providers/custom")
                .query_param("filter", "name eq \"Acme\"")
                .header("authorization", "Bearer secret-key");
            then.status(200)
                .json_body(json!({"values": [{"id": "p-1", "name": "Acme"}], "has_more": false}));
        })
        .await;

    let provider = client.get_provider("Acme").await.expect("lookup succeeds");

    lookup.assert_async().await;
    assert_eq!(provider, Some(json!({"id": "p-1", "name": "Acme"})));
}

#[tokio::test]
async fn push_posts_uncompressed_payload() {
    let server = MockServer::start_async().await;
    let mut client = connected(&server).await;
    client.set_compression(false);
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/providers/custom");
            then.status(200).json_body(json!({"values": [{"id": "p-1", "name": "Acme"}]}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/providers/custom/p-1/datasources");
            then.status(200).json_body(json!({"values": [{"id": "ds-1", "name": "acme"}]}));
        })
        .await;
    let push = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1/providers/custom/p-1/datasources/ds-1:push")
                .json_body(json!({
                    "id": "p-1",
                    "data_source_id": "ds-1",
                    "json_data": "{\"applications\":[]}"
                }));
            then.status(200).json_body(json!({"warnings": []}));
        })
        .await;

    let response = client
        .push_metadata("Acme", "acme", &json!({"applications": []}), &PushOptions::default())
        .await
        .expect("push succeeds");

    push.assert_async().await;
    assert_eq!(response, json!({"warnings": []}));
}

#[tokio::test]
async fn error_bodies_are_mapped() {
    let server = MockServer::start_async().await;
    let client = connected(&server).await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/assessments/queries");
            then.status(400).json_body(json!({
                "code": "InvalidArgument",
                "message": "Invalid Arguments",
                "request_id": "req-7",
                "details": [{"field": "query_type"}]
            }));
        })
        .await;

    let error = client
        .create_query(&json!({"name": "Admins"}))
        .await
        .expect_err("rejected");

    let ClientError::Response(response) = &error else {
        panic!("expected response error, got {error:?}");
    };
    assert_eq!(response.code, "InvalidArgument");
    assert_eq!(response.status_code, 400);
    assert_eq!(response.request_id.as_deref(), Some("req-7"));
    assert_eq!(error.details(), [json!({"field": "query_type"})]);
}

#[tokio::test]
async fn refused_connections_are_connect_errors() {
    let transport =
        ReqwestTransport::new(&config("http://127.0.0.1:9")).expect("transport builds");
    let request = ApiRequest {
        method: HttpMethod::Get,
        path: "api/v1/providers/custom".to_owned(),
        query: Vec::new(),
        body: None,
        user_agent: oaaclient::client::user_agent(None),
    };

    let error = transport
        .execute(&request)
        .await
        .expect_err("nothing listens on the discard port");
    assert_eq!(error.kind, TransportErrorKind::Connect);
}
