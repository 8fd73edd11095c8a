//! Tablestore client implementation.
//!
//! This module provides [`TablestoreClient`], which turns typed requests into
//! attempts: build the request message, run the handler pipeline, send it,
//! and feed the streaming response through a [`ResponseConsumer`].

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, Request, header};
use http_body_util::Full;
use prost::Message;
use tablestore_core::headers;

use crate::ClientError;
use crate::batch::{
    BatchError, BatchGetRowRequest, BatchGetRowResponse, BatchRequest, BatchResponse,
    BatchWriteRowRequest, BatchWriteRowResponse, PartialFailure, Row, check_row_counts, merge,
};
use crate::builder::ClientBuilder;
use crate::config::{CallOptions, RetryPolicy, retry_when};
use crate::message::{RequestMessage, ResponseMessage, TraceContext};
use crate::pipeline::ExecutionContext;
use crate::response::{Metadata, OtsResponse, ResponseConsumer};
use crate::transport::HyperTransport;

type BatchResult = Result<BatchResponse<Option<Row>>, BatchError<Option<Row>>>;

/// Content type of every request body.
const PROTOBUF_CONTENT_TYPE: &str = "application/x.pb2";

/// Tablestore client.
///
/// Cheap to clone; clones share the transport's connection pool and the
/// execution context.
///
/// # Example
///
/// ```ignore
/// use tablestore_client::{BatchGetRowRequest, TableGetCriteria, TablestoreClient};
///
/// let client = TablestoreClient::builder("https://demo.cn-hangzhou.ots.aliyuncs.com", "demo")
///     .build()?;
///
/// let request = BatchGetRowRequest::new()
///     .table(TableGetCriteria::new("users").primary_key(encoded_pk));
/// let response = client.batch_get_row(request).await?;
/// ```
#[derive(Debug, Clone)]
pub struct TablestoreClient {
    transport: HyperTransport,
    endpoint: String,
    instance_name: String,
    context: Arc<ExecutionContext>,
    extra_headers: HeaderMap,
    timeout: Option<Duration>,
    max_body_size: usize,
    retry_policy: RetryPolicy,
}

impl TablestoreClient {
    pub fn builder(
        endpoint: impl Into<String>,
        instance_name: impl Into<String>,
    ) -> ClientBuilder {
        ClientBuilder::new(endpoint, instance_name)
    }

    /// Called by [`ClientBuilder::build`].
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        transport: HyperTransport,
        endpoint: String,
        instance_name: String,
        context: Arc<ExecutionContext>,
        extra_headers: HeaderMap,
        timeout: Option<Duration>,
        max_body_size: usize,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            endpoint,
            instance_name,
            context,
            extra_headers,
            timeout,
            max_body_size,
            retry_policy,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    pub fn context(&self) -> &Arc<ExecutionContext> {
        &self.context
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Send one attempt of `action` with a raw body and decode the response
    /// with `decode`.
    ///
    /// The response handlers run before `decode`. No retry happens at this
    /// level; wrap the call in [`retry_when`] if needed.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let len = client
    ///     .call_with("ListTable", body, |resp| Ok::<_, ClientError>(resp.body.len()), CallOptions::new())
    ///     .await?;
    /// ```
    pub async fn call_with<T, E, F>(
        &self,
        action: &str,
        body: Bytes,
        decode: F,
        options: CallOptions,
    ) -> Result<T, E>
    where
        F: FnOnce(ResponseMessage) -> Result<T, E>,
        E: From<ClientError>,
    {
        let trace = TraceContext::new(action);
        instrument(&trace, self.attempt(action, body, trace.clone(), &options, decode)).await
    }

    /// Call `action` with a protobuf request and decode a protobuf response.
    ///
    /// Retryable errors are retried under the client's [`RetryPolicy`].
    /// Timeouts and internal server errors count only when
    /// [`CallOptions::idempotent`] is set.
    pub async fn call_unary<Req, Res>(
        &self,
        action: &str,
        request: &Req,
    ) -> Result<OtsResponse<Res>, ClientError>
    where
        Req: Message,
        Res: Message + Default,
    {
        self.call_unary_with_options(action, request, CallOptions::new())
            .await
    }

    pub async fn call_unary_with_options<Req, Res>(
        &self,
        action: &str,
        request: &Req,
        options: CallOptions,
    ) -> Result<OtsResponse<Res>, ClientError>
    where
        Req: Message,
        Res: Message + Default,
    {
        let body = Bytes::from(request.encode_to_vec());
        let first = TraceContext::new(action);
        let attempts = AtomicU32::new(0);
        let idempotent = options.is_idempotent();

        let call = retry_when(
            &self.retry_policy,
            |err: &ClientError| err.is_retryable_for(idempotent),
            || {
                let trace = TraceContext {
                    attempt: attempts.fetch_add(1, Ordering::Relaxed) + 1,
                    ..first.clone()
                };
                self.attempt(action, body.clone(), trace, &options, decode_unary::<Res>)
            },
        );
        instrument(&first, call).await
    }

    /// Read rows from one or more tables.
    ///
    /// Rows that fail with a retryable code are resent, alone, under the
    /// client's [`RetryPolicy`]. Rows still failing at the end are reported
    /// through [`BatchError::Partial`], which also holds the rows that were
    /// read.
    pub async fn batch_get_row(
        &self,
        request: BatchGetRowRequest,
    ) -> Result<BatchGetRowResponse, BatchError<Option<Row>>> {
        self.call_batch(request, CallOptions::new()).await
    }

    pub async fn batch_get_row_with_options(
        &self,
        request: BatchGetRowRequest,
        options: CallOptions,
    ) -> Result<BatchGetRowResponse, BatchError<Option<Row>>> {
        self.call_batch(request, options).await
    }

    /// Put, update or delete rows in one or more tables.
    ///
    /// Writes are not idempotent: rows are resent only after a failure code
    /// that guarantees the write did not happen.
    pub async fn batch_write_row(
        &self,
        request: BatchWriteRowRequest,
    ) -> Result<BatchWriteRowResponse, BatchError<Option<Row>>> {
        self.call_batch(request, CallOptions::new()).await
    }

    pub async fn batch_write_row_with_options(
        &self,
        request: BatchWriteRowRequest,
        options: CallOptions,
    ) -> Result<BatchWriteRowResponse, BatchError<Option<Row>>> {
        self.call_batch(request, options).await
    }

    /// Run a batch operation, resending failed rows until they succeed or
    /// the retry policy gives up.
    ///
    /// Every attempt after the first sends only the rows that failed so far,
    /// in their original relative order. Its results are merged into the
    /// response carried from the earlier attempts. Failed rows are resent
    /// only when all of them are retryable for the operation; otherwise the
    /// partial failure is returned as is.
    pub async fn call_batch<Req: BatchRequest>(
        &self,
        request: Req,
        options: CallOptions,
    ) -> BatchResult {
        if request.row_counts().values().sum::<usize>() == 0 {
            return Err(ClientError::Config(format!("{} request has no rows", Req::ACTION)).into());
        }
        request.validate()?;
        self.retry_policy
            .validate()
            .map_err(|msg| ClientError::Config(msg.to_string()))?;

        let first = TraceContext::new(Req::ACTION);
        instrument(&first, self.run_batch(request, first.clone(), options)).await
    }

    async fn run_batch<Req: BatchRequest>(
        &self,
        request: Req,
        mut trace: TraceContext,
        options: CallOptions,
    ) -> BatchResult {
        let mut backoff = self.retry_policy.backoff();
        let mut pending = request.clone();
        let mut last: Option<BatchResponse<Option<Row>>> = None;

        loop {
            let submitted = pending.row_counts();
            let previous = last.clone();
            let decode = move |response: ResponseMessage| -> BatchResult {
                let fresh = Req::decode(&response.body, response.request_id().map(str::to_owned))?;
                check_row_counts(&fresh, &submitted)?;
                let merged = merge(previous, fresh)?;
                Ok(PartialFailure::check(merged)?)
            };

            let result = self
                .attempt(Req::ACTION, pending.encode(), trace.clone(), &options, decode)
                .await;

            let delay = match result {
                Ok(response) => return Ok(response),
                Err(BatchError::Partial(failure)) if failure.is_retryable(Req::IDEMPOTENT) => {
                    let Some(delay) = backoff.next_retry() else {
                        return Err(BatchError::Partial(failure));
                    };
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        trace_id = %trace.trace_id,
                        attempt = trace.attempt,
                        failed_rows = failure.failures.len(),
                        delay_ms = delay.as_millis(),
                        "resending failed rows"
                    );
                    pending = request.retain_failed(&failure.response);
                    last = Some(failure.into_response());
                    delay
                }
                Err(BatchError::Client(err)) if err.is_retryable_for(Req::IDEMPOTENT) => {
                    let Some(delay) = backoff.next_retry() else {
                        return Err(BatchError::Client(err));
                    };
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        trace_id = %trace.trace_id,
                        attempt = trace.attempt,
                        error = %err,
                        delay_ms = delay.as_millis(),
                        "retrying batch after transient error"
                    );
                    delay
                }
                Err(err) => return Err(err),
            };

            tokio::time::sleep(delay).await;
            trace = trace.next_attempt();
        }
    }

    /// One attempt: build and sign the request, send it, and consume the
    /// response within the call's timeout.
    async fn attempt<T, E, F>(
        &self,
        action: &str,
        body: Bytes,
        trace: TraceContext,
        options: &CallOptions,
        decode: F,
    ) -> Result<T, E>
    where
        F: FnOnce(ResponseMessage) -> Result<T, E>,
        E: From<ClientError>,
    {
        let message = self.build_request(action, body, &trace, options)?;
        let request = into_http(message)?;
        let mut consumer = ResponseConsumer::new(self.context.clone(), trace, decode)
            .max_body_size(self.max_body_size);

        let exchange = async move {
            match self.transport.request(request).await {
                Ok(response) => consumer.consume(response).await,
                Err(err) => Err(consumer.on_failed(err)),
            }
        };

        match options.get_timeout().or(self.timeout) {
            Some(limit) => match tokio::time::timeout(limit, exchange).await {
                Ok(result) => result,
                Err(_) => Err(ClientError::Transport(format!(
                    "{action} attempt timed out after {limit:?}"
                ))
                .into()),
            },
            None => exchange.await,
        }
    }

    /// Build the request message for one attempt and run the request
    /// pipeline on it.
    fn build_request(
        &self,
        action: &str,
        body: Bytes,
        trace: &TraceContext,
        options: &CallOptions,
    ) -> Result<RequestMessage, ClientError> {
        let uri = format!("{}/{}", self.endpoint, action.trim_start_matches('/'));
        let mut message = RequestMessage::new(action, uri, body);

        let date = chrono::Utc::now()
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string();
        message.set_header(headers::DATE, &date)?;
        message.set_header(headers::API_VERSION, headers::API_VERSION_VALUE)?;
        message.set_header(headers::INSTANCE_NAME, &self.instance_name)?;
        message.set_header(headers::TRACE_ID, &trace.trace_id)?;
        message.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(PROTOBUF_CONTENT_TYPE),
        );
        for (name, value) in &self.extra_headers {
            message.headers.insert(name.clone(), value.clone());
        }
        options.apply_headers(&mut message.headers)?;

        self.context.prepare_request(trace, &mut message)?;
        Ok(message)
    }
}

fn into_http(message: RequestMessage) -> Result<Request<Full<Bytes>>, ClientError> {
    let mut request = Request::builder()
        .method(Method::POST)
        .uri(&message.uri)
        .body(Full::new(message.body))
        .map_err(|e| ClientError::Config(format!("failed to build request: {e}")))?;
    *request.headers_mut() = message.headers;
    Ok(request)
}

fn decode_unary<Res: Message + Default>(
    response: ResponseMessage,
) -> Result<OtsResponse<Res>, ClientError> {
    let message = Res::decode(response.body)
        .map_err(|e| ClientError::Decode(format!("failed to decode response: {e}")))?;
    Ok(OtsResponse::new(message, Metadata::new(response.headers)))
}

#[cfg(feature = "tracing")]
fn instrument<F: Future>(trace: &TraceContext, call: F) -> impl Future<Output = F::Output> {
    use tracing::Instrument;
    call.instrument(tracing::info_span!(
        "ots.call",
        action = %trace.action,
        trace_id = %trace.trace_id,
    ))
}

#[cfg(not(feature = "tracing"))]
fn instrument<F: Future>(_trace: &TraceContext, call: F) -> F {
    call
}
