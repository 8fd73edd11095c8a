mod common;

use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use tablestore_client::protocol;
use tablestore_client::{
    BatchError, BatchGetRowRequest, CallOptions, ClientError, ErrorCode, RetryPolicy,
    TableGetCriteria, TablestoreClient, headers,
};

use common::{MockServer, Reply, client, client_with_policy, get_response, row_ok, table};

fn one_key() -> BatchGetRowRequest {
    BatchGetRowRequest::new()
        .table(TableGetCriteria::new("T").primary_key(Bytes::from_static(b"pk")))
}

fn client_error(err: BatchError<Option<Bytes>>) -> ClientError {
    match err {
        BatchError::Client(err) => err,
        BatchError::Partial(failure) => panic!("unexpected partial failure: {failure}"),
    }
}

#[tokio::test]
async fn test_access_denied_carries_detail() {
    let (server, addr) = MockServer::start(vec![Reply::service_error(
        StatusCode::FORBIDDEN,
        "req-403",
        protocol::Error {
            code: "OTSAccessDenied".into(),
            message: Some("not allowed".into()),
            access_denied_detail: Some(protocol::AccessDeniedDetail {
                auth_action: Some("ots:BatchGetRow".into()),
                policy_type: Some("RAM".into()),
                ..Default::default()
            }),
        },
    )])
    .await;

    let err = client_error(client(addr).batch_get_row(one_key()).await.unwrap_err());

    let service = err.as_service().unwrap();
    assert_eq!(service.code, ErrorCode::AccessDenied);
    assert_eq!(service.message, "not allowed");
    assert_eq!(service.request_id.as_deref(), Some("req-403"));
    assert_eq!(service.http_status, StatusCode::FORBIDDEN);
    let detail = service.access_denied.as_ref().unwrap();
    assert_eq!(detail.auth_action.as_deref(), Some("ots:BatchGetRow"));
    assert_eq!(detail.policy_type.as_deref(), Some("RAM"));

    assert_eq!(server.request_count(), 1);
}

#[tokio::test]
async fn test_undecodable_error_body_falls_back_to_status() {
    let (_server, addr) = MockServer::start(vec![
        Reply::bare(StatusCode::NOT_FOUND, "table T does not exist").header(headers::REQUEST_ID, "req-404"),
    ])
    .await;

    let err = client_error(client(addr).batch_get_row(one_key()).await.unwrap_err());

    let service = err.as_service().unwrap();
    assert_eq!(service.code, ErrorCode::ObjectNotExist);
    assert_eq!(service.request_id.as_deref(), Some("req-404"));
}

#[tokio::test]
async fn test_redirect_names_new_endpoint() {
    let (server, addr) = MockServer::start(vec![
        Reply::bare(StatusCode::MOVED_PERMANENTLY, "")
            .header(headers::LOCATION, "https://new.example.com"),
    ])
    .await;

    let err = client_error(client(addr).batch_get_row(one_key()).await.unwrap_err());

    assert!(
        matches!(err, ClientError::Redirect { ref location } if location == "https://new.example.com")
    );
    assert_eq!(server.request_count(), 1);
}

#[tokio::test]
async fn test_redirect_without_location_is_missing_header() {
    let (_server, addr) =
        MockServer::start(vec![Reply::bare(StatusCode::MOVED_PERMANENTLY, "")]).await;

    let err = client_error(client(addr).batch_get_row(one_key()).await.unwrap_err());
    assert!(matches!(err, ClientError::MissingHeader { ref name } if name == "location"));
}

#[tokio::test]
async fn test_proxy_error_is_not_an_application_response() {
    let (server, addr) =
        MockServer::start(vec![Reply::bare(StatusCode::BAD_GATEWAY, "upstream down")]).await;

    let err = client_error(client(addr).batch_get_row(one_key()).await.unwrap_err());

    match err {
        ClientError::NoApplicationResponse { status, message } => {
            assert_eq!(status, StatusCode::BAD_GATEWAY);
            assert_eq!(message, "upstream down");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(server.request_count(), 1);
}

#[tokio::test]
async fn test_corrupted_body_fails_integrity_check() {
    let (server, addr) = MockServer::start(vec![
        Reply::ok("req-1", get_response(vec![table("T", vec![row_ok(b"A")])])).corrupt_digest(),
    ])
    .await;

    let err = client_error(client(addr).batch_get_row(one_key()).await.unwrap_err());
    assert!(matches!(err, ClientError::Integrity(_)));
    assert_eq!(server.request_count(), 1);
}

#[tokio::test]
async fn test_missing_request_id_on_success() {
    let (_server, addr) = MockServer::start(vec![
        Reply::bare(StatusCode::OK, "")
            .header(headers::CONTENT_MD5, &tablestore_core::content_md5(b"")),
    ])
    .await;

    let err = client_error(client(addr).batch_get_row(one_key()).await.unwrap_err());
    assert!(matches!(err, ClientError::MissingHeader { ref name } if name == headers::REQUEST_ID));
}

#[tokio::test]
async fn test_strict_validation_requires_content_type() {
    let (_server, addr) = MockServer::start(vec![Reply::ok(
        "req-1",
        get_response(vec![table("T", vec![row_ok(b"A")])]),
    )])
    .await;

    let client = TablestoreClient::builder(format!("http://{addr}"), "demo")
        .strict_validation(true)
        .build()
        .unwrap();
    let err = client_error(client.batch_get_row(one_key()).await.unwrap_err());
    assert!(matches!(err, ClientError::MissingHeader { ref name } if name == headers::CONTENT_TYPE));
}

#[tokio::test]
async fn test_digest_is_optional_unless_strict() {
    let reply = || {
        Reply::ok("req-1", get_response(vec![table("T", vec![row_ok(b"A")])])).without_digest()
    };
    let (_server, addr) = MockServer::start(vec![reply(), reply()]).await;

    let response = client(addr).batch_get_row(one_key()).await.unwrap();
    assert_eq!(response.request_id.as_deref(), Some("req-1"));

    let strict = TablestoreClient::builder(format!("http://{addr}"), "demo")
        .strict_validation(true)
        .build()
        .unwrap();
    let err = client_error(strict.batch_get_row(one_key()).await.unwrap_err());
    assert!(matches!(err, ClientError::MissingHeader { ref name } if name == headers::CONTENT_MD5));
}

#[tokio::test]
async fn test_attempt_timeout_is_transport_error() {
    let (_server, addr) = MockServer::start(vec![
        Reply::ok("req-1", get_response(vec![table("T", vec![row_ok(b"A")])]))
            .delay(Duration::from_millis(500)),
    ])
    .await;

    let err = client_with_policy(addr, RetryPolicy::no_retry())
        .batch_get_row_with_options(one_key(), CallOptions::new().timeout(Duration::from_millis(50)))
        .await
        .unwrap_err();

    let err = client_error(err);
    assert!(matches!(err, ClientError::Transport(ref msg) if msg.contains("timed out")));
}

#[tokio::test]
async fn test_connection_refused_is_retried_then_reported() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let policy = RetryPolicy::new()
        .max_retries(1)
        .base_delay(Duration::from_millis(1))
        .max_delay(Duration::from_millis(1));
    let err = client_with_policy(addr, policy)
        .batch_get_row(one_key())
        .await
        .unwrap_err();

    assert!(matches!(client_error(err), ClientError::Transport(_)));
}
