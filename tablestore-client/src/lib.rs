//! Tablestore client for Rust.
//!
//! This crate talks to a Tablestore (OTS) instance over HTTP with protobuf
//! payloads. Every call goes through the same path:
//!
//! 1. the typed request is encoded and wrapped in a [`RequestMessage`];
//! 2. request handlers run in order, then the signer;
//! 3. [`HyperTransport`] sends the request;
//! 4. a [`ResponseConsumer`] buffers the streaming body, runs the response
//!    handlers (content digest, header validation, tracing, error decoding)
//!    and decodes the typed response.
//!
//! Batch operations add one more step. Each attempt's row results are merged
//! with the previous attempt's, and rows that still failed are raised as
//! [`PartialFailure`]. When every failed row may be resent, the client resends
//! only those rows while the [`RetryPolicy`] allows.
//!
//! ## Example
//!
//! ```ignore
//! use tablestore_client::{
//!     BatchError, BatchGetRowRequest, TableGetCriteria, TablestoreClient,
//! };
//!
//! let client = TablestoreClient::builder("https://demo.cn-hangzhou.ots.aliyuncs.com", "demo")
//!     .build()?;
//!
//! let request = BatchGetRowRequest::new()
//!     .table(TableGetCriteria::new("users").primary_key(pk1).primary_key(pk2));
//!
//! match client.batch_get_row(request).await {
//!     Ok(response) => println!("read {} rows", response.row_count()),
//!     Err(BatchError::Partial(failure)) => {
//!         for row in &failure.failures {
//!             eprintln!("{}[{}]: {}", row.table, row.index, row.error);
//!         }
//!     }
//!     Err(BatchError::Client(err)) => return Err(err.into()),
//! }
//! ```
//!
//! ## Other operations
//!
//! Any operation with a protobuf request and response can be called through
//! [`TablestoreClient::call_unary`]:
//!
//! ```ignore
//! let response = client
//!     .call_unary::<ListTableRequest, ListTableResponse>("ListTable", &ListTableRequest {})
//!     .await?;
//! println!("request id: {:?}", response.request_id());
//! ```
//!
//! ## Features
//!
//! - `tls` (default): rustls with the ring provider and native roots
//! - `tracing` (default): spans per call and debug events on retries and
//!   in the tracer handler

pub mod batch;
mod builder;
mod client;
pub mod config;
mod error;
mod message;
pub mod pipeline;
pub mod protocol;
pub mod response;
pub mod transport;

pub use batch::{
    BatchError, BatchGetRowRequest, BatchGetRowResponse, BatchRequest, BatchResponse,
    BatchWriteRowRequest, BatchWriteRowResponse, ConsumedCapacity, PartialFailure, Row, RowChange,
    RowError, RowFailure, RowOperation, RowOutcome, RowResult, TableGetCriteria, TableWriteRows,
};
pub use builder::{ClientBuilder, DEFAULT_TIMEOUT};
pub use client::TablestoreClient;
pub use config::{CallOptions, ExponentialBackoff, RetryPolicy, retry, retry_when, retry_with_policy};
pub use error::{AccessDeniedDetail, ClientError, ServiceError};
pub use message::{RequestMessage, ResponseMessage, TraceContext};
pub use pipeline::{
    CredentialsSigner, ExecutionContext, ExecutionContextBuilder, NoSigner, RequestHandler,
    ResponseHandler, Signer,
};
pub use response::{ConsumerState, Metadata, OtsResponse, ResponseConsumer};
pub use transport::{HyperTransport, HyperTransportBuilder, TlsClientConfig};

pub use tablestore_core::{ErrorCode, headers};

pub use bytes::Bytes;
