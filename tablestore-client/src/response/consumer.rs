//! Per-attempt response consumer.
//!
//! Adapts a streaming HTTP response into one typed result:
//!
//! ```text
//! AwaitingHeaders --on_headers--> ReceivingBody --on_complete--> Complete
//!        \                             |
//!         `--------on_failed-----------`-----> Failed
//! ```
//!
//! The body buffer lives inside the state and is moved out on every
//! transition, so it is released whichever way the attempt ends.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use http::{HeaderMap, StatusCode, header::CONTENT_LENGTH};
use http_body::Body;
use http_body_util::BodyExt;

use crate::message::{ResponseMessage, TraceContext};
use crate::pipeline::ExecutionContext;
use crate::ClientError;

/// Initial buffer capacity when the response announces no usable length.
pub const DEFAULT_BODY_CAPACITY: usize = 4 * 1024;

/// Default limit on a buffered response body.
pub const DEFAULT_MAX_BODY_SIZE: usize = 64 * 1024 * 1024;

/// Observable phase of a [`ResponseConsumer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsumerState {
    AwaitingHeaders,
    ReceivingBody,
    Complete,
    Failed,
}

enum State {
    AwaitingHeaders,
    ReceivingBody {
        status: StatusCode,
        headers: HeaderMap,
        buffer: BytesMut,
        expected_len: Option<usize>,
    },
    Complete,
    Failed,
}

impl State {
    fn phase(&self) -> ConsumerState {
        match self {
            State::AwaitingHeaders => ConsumerState::AwaitingHeaders,
            State::ReceivingBody { .. } => ConsumerState::ReceivingBody,
            State::Complete => ConsumerState::Complete,
            State::Failed => ConsumerState::Failed,
        }
    }
}

/// Consumes the response of one attempt.
///
/// Generic over the operation's decode step `F` and its error type `E`, so
/// unary and batch calls share one consumer. Response handlers run before
/// `decode`; their errors reach the caller through `E: From<ClientError>`.
pub struct ResponseConsumer<T, E, F> {
    context: Arc<ExecutionContext>,
    trace: TraceContext,
    max_body_size: usize,
    state: State,
    decode: Option<F>,
    _marker: PhantomData<fn() -> Result<T, E>>,
}

impl<T, E, F> fmt::Debug for ResponseConsumer<T, E, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseConsumer")
            .field("trace", &self.trace)
            .field("max_body_size", &self.max_body_size)
            .field("state", &self.state.phase())
            .finish_non_exhaustive()
    }
}

impl<T, E, F> ResponseConsumer<T, E, F>
where
    F: FnOnce(ResponseMessage) -> Result<T, E>,
    E: From<ClientError>,
{
    /// Create a consumer for one attempt.
    pub fn new(context: Arc<ExecutionContext>, trace: TraceContext, decode: F) -> Self {
        Self {
            context,
            trace,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            state: State::AwaitingHeaders,
            decode: Some(decode),
            _marker: PhantomData,
        }
    }

    /// Limit the buffered body to `max` bytes.
    pub fn max_body_size(mut self, max: usize) -> Self {
        self.max_body_size = max;
        self
    }

    pub fn state(&self) -> ConsumerState {
        self.state.phase()
    }

    pub fn trace(&self) -> &TraceContext {
        &self.trace
    }

    /// Store the status line and headers and size the body buffer.
    pub fn on_headers(&mut self, status: StatusCode, headers: HeaderMap) -> Result<(), ClientError> {
        match std::mem::replace(&mut self.state, State::Failed) {
            State::AwaitingHeaders => {}
            other => return Err(out_of_order("headers", other.phase())),
        }

        let expected_len = match announced_length(&headers) {
            Some(len) => match usize::try_from(len) {
                Ok(len) if len <= self.max_body_size => Some(len),
                _ => {
                    return Err(ClientError::Transport(format!(
                        "response announces {len} bytes, limit is {}",
                        self.max_body_size
                    )));
                }
            },
            None => None,
        };
        let capacity = expected_len.unwrap_or(DEFAULT_BODY_CAPACITY);

        self.state = State::ReceivingBody {
            status,
            headers,
            buffer: BytesMut::with_capacity(capacity),
            expected_len,
        };
        Ok(())
    }

    /// Append a body chunk.
    pub fn on_body_chunk(&mut self, chunk: &[u8]) -> Result<(), ClientError> {
        let (status, headers, mut buffer, expected_len) =
            match std::mem::replace(&mut self.state, State::Failed) {
                State::ReceivingBody {
                    status,
                    headers,
                    buffer,
                    expected_len,
                } => (status, headers, buffer, expected_len),
                other => return Err(out_of_order("body chunk", other.phase())),
            };

        let received = buffer.len() + chunk.len();
        if received > self.max_body_size {
            return Err(ClientError::Transport(format!(
                "response body exceeds limit of {} bytes",
                self.max_body_size
            )));
        }
        if let Some(expected) = expected_len.filter(|&expected| received > expected) {
            return Err(ClientError::Transport(format!(
                "response body longer than announced content-length {expected}"
            )));
        }

        buffer.extend_from_slice(chunk);
        self.state = State::ReceivingBody {
            status,
            headers,
            buffer,
            expected_len,
        };
        Ok(())
    }

    /// Finish the attempt: build the response message, run the response
    /// handlers, then decode.
    pub fn on_complete(&mut self) -> Result<T, E> {
        let (status, headers, buffer, expected_len) =
            match std::mem::replace(&mut self.state, State::Failed) {
                State::ReceivingBody {
                    status,
                    headers,
                    buffer,
                    expected_len,
                } => (status, headers, buffer, expected_len),
                other => return Err(out_of_order("completion", other.phase()).into()),
            };

        if let Some(expected) = expected_len.filter(|&expected| buffer.len() < expected) {
            return Err(ClientError::Transport(format!(
                "response body truncated: received {} of {expected} bytes",
                buffer.len()
            ))
            .into());
        }

        let mut response = ResponseMessage::new(status, headers, buffer.freeze());
        self.context.process_response(&self.trace, &mut response)?;

        let decode = self
            .decode
            .take()
            .ok_or_else(|| ClientError::Protocol("response already decoded".into()))?;
        let output = decode(response)?;
        self.state = State::Complete;
        Ok(output)
    }

    /// Fail the attempt and release the buffer.
    pub fn on_failed(&mut self, error: ClientError) -> E {
        self.state = State::Failed;
        error.into()
    }

    /// Drive the consumer from a streaming response, frame by frame.
    pub async fn consume<B>(mut self, response: http::Response<B>) -> Result<T, E>
    where
        B: Body<Data = Bytes> + Unpin,
        B::Error: fmt::Display,
    {
        let (parts, mut body) = response.into_parts();
        self.on_headers(parts.status, parts.headers)?;

        while let Some(frame) = body.frame().await {
            let frame = match frame {
                Ok(frame) => frame,
                Err(err) => {
                    return Err(self.on_failed(ClientError::Transport(format!(
                        "failed to read response body: {err}"
                    ))));
                }
            };
            // trailers carry nothing this protocol reads
            if let Ok(data) = frame.into_data() {
                self.on_body_chunk(&data)?;
            }
        }

        self.on_complete()
    }
}

/// Content-Length when present, parseable and non-negative.
fn announced_length(headers: &HeaderMap) -> Option<u64> {
    let value = headers.get(CONTENT_LENGTH)?.to_str().ok()?;
    let len = value.trim().parse::<i64>().ok()?;
    u64::try_from(len).ok()
}

fn out_of_order(event: &str, phase: ConsumerState) -> ClientError {
    ClientError::Protocol(format!("unexpected {event} while consumer is {phase:?}"))
}
