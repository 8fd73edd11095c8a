//! Scripted Tablestore front end for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::response::Response;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use prost::Message;
use tablestore_client::protocol;
use tablestore_client::{RetryPolicy, TablestoreClient};
use tablestore_core::{content_md5, headers};

/// One canned answer.
pub struct Reply {
    status: StatusCode,
    headers: Vec<(&'static str, String)>,
    body: Vec<u8>,
    digest: bool,
    delay: Option<Duration>,
}

impl Reply {
    /// A 2xx answer from the service with a valid digest.
    pub fn ok(request_id: &str, body: Vec<u8>) -> Self {
        Self {
            status: StatusCode::OK,
            headers: vec![(headers::REQUEST_ID, request_id.to_string())],
            body,
            digest: true,
            delay: None,
        }
    }

    /// A structured service error.
    pub fn service_error(status: StatusCode, request_id: &str, error: protocol::Error) -> Self {
        Self {
            status,
            headers: vec![(headers::REQUEST_ID, request_id.to_string())],
            body: error.encode_to_vec(),
            digest: true,
            delay: None,
        }
    }

    /// An answer with no request id, as a proxy would send.
    pub fn bare(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
            digest: false,
            delay: None,
        }
    }

    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.push((name, value.to_string()));
        self
    }

    /// Announce a digest that does not match the body.
    pub fn corrupt_digest(mut self) -> Self {
        self.headers
            .push((headers::CONTENT_MD5, content_md5(b"something else")));
        self.digest = false;
        self
    }

    /// Leave out `x-ots-contentmd5`.
    pub fn without_digest(mut self) -> Self {
        self.digest = false;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// A request as the server saw it.
#[derive(Clone, Debug)]
pub struct Recorded {
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Clone, Default)]
pub struct MockServer {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockServer {
    /// Start serving `replies` in order on a random local port.
    pub async fn start(replies: Vec<Reply>) -> (Self, SocketAddr) {
        let server = MockServer {
            replies: Arc::new(Mutex::new(replies.into())),
            requests: Arc::default(),
        };
        let app = Router::new().fallback(handle).with_state(server.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (server, addr)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

async fn handle(State(server): State<MockServer>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    server.requests.lock().unwrap().push(Recorded {
        path: parts.uri.path().to_string(),
        headers: parts.headers,
        body,
    });

    let reply = server.replies.lock().unwrap().pop_front();
    let Some(reply) = reply else {
        return Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .body(Body::from("no scripted reply left"))
            .unwrap();
    };
    if let Some(delay) = reply.delay {
        tokio::time::sleep(delay).await;
    }

    let mut response = Response::builder().status(reply.status);
    for (name, value) in &reply.headers {
        response = response.header(*name, value);
    }
    if reply.digest {
        response = response.header(headers::CONTENT_MD5, content_md5(&reply.body));
    }
    response.body(Body::from(reply.body)).unwrap()
}

/// A client for `addr` that retries quickly.
pub fn client(addr: SocketAddr) -> TablestoreClient {
    client_with_policy(
        addr,
        RetryPolicy::new()
            .base_delay(Duration::from_millis(1))
            .max_delay(Duration::from_millis(5)),
    )
}

pub fn client_with_policy(addr: SocketAddr, policy: RetryPolicy) -> TablestoreClient {
    TablestoreClient::builder(format!("http://{addr}"), "demo")
        .retry_policy(policy)
        .build()
        .unwrap()
}

pub fn row_ok(data: &'static [u8]) -> protocol::RowInBatchResponse {
    protocol::RowInBatchResponse {
        is_ok: true,
        error: None,
        consumed: Some(protocol::ConsumedCapacity {
            capacity_unit: Some(protocol::CapacityUnit {
                read: Some(1),
                write: Some(0),
            }),
        }),
        row: Some(Bytes::from_static(data)),
    }
}

pub fn row_err(code: &str, message: &str) -> protocol::RowInBatchResponse {
    protocol::RowInBatchResponse {
        is_ok: false,
        error: Some(protocol::Error {
            code: code.to_string(),
            message: Some(message.to_string()),
            access_denied_detail: None,
        }),
        consumed: None,
        row: None,
    }
}

pub fn table(name: &str, rows: Vec<protocol::RowInBatchResponse>) -> protocol::TableInBatchResponse {
    protocol::TableInBatchResponse {
        table_name: name.to_string(),
        rows,
    }
}

pub fn get_response(tables: Vec<protocol::TableInBatchResponse>) -> Vec<u8> {
    protocol::BatchGetRowResponse { tables }.encode_to_vec()
}

pub fn write_response(tables: Vec<protocol::TableInBatchResponse>) -> Vec<u8> {
    protocol::BatchWriteRowResponse { tables }.encode_to_vec()
}
