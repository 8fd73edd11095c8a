mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use prost::Message;
use tablestore_client::protocol;
use tablestore_client::{
    CallOptions, ClientError, ErrorCode, ResponseHandler, ResponseMessage, RetryPolicy,
    TablestoreClient, TraceContext, headers,
};

use common::{MockServer, Reply, client, get_response, row_ok, table};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn get_request() -> protocol::BatchGetRowRequest {
    protocol::BatchGetRowRequest {
        tables: vec![protocol::TableInBatchGetRowRequest {
            table_name: "T".into(),
            primary_key: vec![Bytes::from_static(b"pk")],
            columns_to_get: Vec::new(),
            max_versions: Some(1),
        }],
    }
}

#[tokio::test]
async fn test_call_unary_decodes_response_and_metadata() {
    init_tracing();
    let (server, addr) = MockServer::start(vec![
        Reply::ok("req-1", get_response(vec![table("T", vec![row_ok(b"A")])]))
            .header(headers::TRACE_INFO, "server-trace"),
    ])
    .await;

    let response = client(addr)
        .call_unary::<_, protocol::BatchGetRowResponse>("BatchGetRow", &get_request())
        .await
        .unwrap();

    assert_eq!(response.request_id(), Some("req-1"));
    assert_eq!(response.metadata().tracer_info(), Some("server-trace"));
    let message = response.into_inner();
    assert_eq!(message.tables[0].rows[0].row, Some(Bytes::from_static(b"A")));

    let sent = protocol::BatchGetRowRequest::decode(server.requests()[0].body.clone()).unwrap();
    assert_eq!(sent, get_request());
}

#[tokio::test]
async fn test_call_unary_retry_depends_on_idempotency() {
    let internal_error = || {
        Reply::service_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "req-500",
            protocol::Error {
                code: "OTSInternalServerError".into(),
                message: None,
                access_denied_detail: None,
            },
        )
    };
    let ok = || Reply::ok("req-ok", get_response(Vec::new()));

    // not idempotent: the error is returned as is
    let (server, addr) = MockServer::start(vec![internal_error(), ok()]).await;
    let err = client(addr)
        .call_unary::<_, protocol::BatchGetRowResponse>("BatchGetRow", &get_request())
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(&ErrorCode::InternalServerError));
    assert_eq!(server.request_count(), 1);

    // idempotent: retried
    let (server, addr) = MockServer::start(vec![internal_error(), ok()]).await;
    let response = client(addr)
        .call_unary_with_options::<_, protocol::BatchGetRowResponse>(
            "BatchGetRow",
            &get_request(),
            CallOptions::new().idempotent(),
        )
        .await
        .unwrap();
    assert_eq!(response.request_id(), Some("req-ok"));
    assert_eq!(server.request_count(), 2);
}

#[tokio::test]
async fn test_call_with_custom_decode_and_headers() {
    let (server, addr) = MockServer::start(vec![Reply::ok("req-1", b"raw".to_vec())]).await;

    let body = client(addr)
        .call_with(
            "ListTable",
            Bytes::new(),
            |response: ResponseMessage| Ok::<_, ClientError>(response.body),
            CallOptions::new().header("x-tenant", "acme").priority("low"),
        )
        .await
        .unwrap();
    assert_eq!(body, Bytes::from_static(b"raw"));

    let request = &server.requests()[0];
    assert_eq!(request.path, "/ListTable");
    assert_eq!(request.headers.get("x-tenant").unwrap(), "acme");
    assert_eq!(request.headers.get(headers::PRIORITY).unwrap(), "low");
}

struct Counting(AtomicUsize);

impl ResponseHandler for Counting {
    fn handle_response(
        &self,
        _trace: &TraceContext,
        _response: &mut ResponseMessage,
    ) -> Result<(), ClientError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn test_custom_response_handler_runs_on_every_attempt() {
    let (_server, addr) = MockServer::start(vec![
        Reply::service_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "req-1",
            protocol::Error {
                code: "OTSServerBusy".into(),
                message: None,
                access_denied_detail: None,
            },
        ),
        Reply::ok("req-2", get_response(Vec::new())),
    ])
    .await;

    let counting = Arc::new(Counting(AtomicUsize::new(0)));
    let client = TablestoreClient::builder(format!("http://{addr}"), "demo")
        .retry_policy(
            RetryPolicy::new()
                .base_delay(Duration::from_millis(1))
                .max_delay(Duration::from_millis(1)),
        )
        .response_handler(counting.clone())
        .build()
        .unwrap();

    client
        .call_unary::<_, protocol::BatchGetRowResponse>("BatchGetRow", &get_request())
        .await
        .unwrap();

    // the first attempt is rejected by the error decoder before this handler
    assert_eq!(counting.0.load(Ordering::SeqCst), 1);
}
