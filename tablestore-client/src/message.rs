//! Request and response messages exchanged with the transport.
//!
//! A [`RequestMessage`] is built fresh for every attempt and mutated in place
//! by request handlers and the signer. A [`ResponseMessage`] is built by the
//! response consumer once the body has been fully received and is owned by
//! that consumer alone.

use std::fmt;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use tablestore_core::headers;

use crate::ClientError;

/// An outbound call for one attempt.
#[derive(Clone)]
pub struct RequestMessage {
    /// Operation name, e.g. `BatchGetRow`.
    pub action: String,
    /// Fully-qualified target URI.
    pub uri: String,
    /// Request headers (mutable by handlers).
    pub headers: HeaderMap,
    /// Encoded request body.
    pub body: Bytes,
}

impl RequestMessage {
    /// Create a new request message.
    pub fn new(action: impl Into<String>, uri: impl Into<String>, body: Bytes) -> Self {
        Self {
            action: action.into(),
            uri: uri.into(),
            headers: HeaderMap::new(),
            body,
        }
    }

    /// Length of the body in bytes.
    pub fn content_length(&self) -> usize {
        self.body.len()
    }

    /// Insert a header, validating name and value.
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<(), ClientError> {
        let name = HeaderName::try_from(name)
            .map_err(|_| ClientError::Config(format!("invalid header name: {name}")))?;
        let value = HeaderValue::try_from(value)
            .map_err(|_| ClientError::Config(format!("invalid header value for {name}")))?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Get a header as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl fmt::Debug for RequestMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestMessage")
            .field("action", &self.action)
            .field("uri", &self.uri)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .finish()
    }
}

/// A fully received response for one attempt.
#[derive(Clone)]
pub struct ResponseMessage {
    /// HTTP status.
    pub status: StatusCode,
    /// Response headers (case-insensitive lookup).
    pub headers: HeaderMap,
    /// Buffered response body.
    pub body: Bytes,
}

impl ResponseMessage {
    /// Create a new response message.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Returns whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Get a header as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get a header, failing with [`ClientError::MissingHeader`] when absent.
    pub fn require_header(&self, name: &str) -> Result<&str, ClientError> {
        self.header(name)
            .ok_or_else(|| ClientError::missing_header(name))
    }

    /// The service request id, if the application tier answered.
    pub fn request_id(&self) -> Option<&str> {
        self.header(headers::REQUEST_ID)
    }
}

impl fmt::Debug for ResponseMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseMessage")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .finish()
    }
}

/// Trace state for one attempt of one logical call.
///
/// Threaded explicitly from the call through the consumer into every handler
/// instead of living in thread-local or global state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceContext {
    /// Client-generated id shared by all attempts of a logical call.
    pub trace_id: String,
    /// Operation name.
    pub action: String,
    /// Attempt number, starting at 1.
    pub attempt: u32,
}

impl TraceContext {
    /// Create the context for the first attempt of a call with a fresh trace id.
    pub fn new(action: impl Into<String>) -> Self {
        Self::with_trace_id(action, hex::encode(rand::random::<[u8; 8]>()))
    }

    /// Create the context for the first attempt with a caller-chosen trace id.
    pub fn with_trace_id(action: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            action: action.into(),
            attempt: 1,
        }
    }

    /// The context for the next attempt of the same call.
    pub fn next_attempt(&self) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            action: self.action.clone(),
            attempt: self.attempt + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_message_headers() {
        let mut req = RequestMessage::new("GetRow", "http://localhost/GetRow", Bytes::from("abc"));
        req.set_header("x-ots-instancename", "demo").unwrap();
        assert_eq!(req.header("x-ots-instancename"), Some("demo"));
        assert_eq!(req.content_length(), 3);
        assert!(req.set_header("bad header", "v").is_err());
    }

    #[test]
    fn test_response_message_header_lookup_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_bytes(b"X-OTS-RequestId").unwrap(),
            HeaderValue::from_static("0000-aaaa"),
        );
        let resp = ResponseMessage::new(StatusCode::OK, headers, Bytes::new());
        assert_eq!(resp.request_id(), Some("0000-aaaa"));
        assert_eq!(resp.header("X-Ots-Requestid"), Some("0000-aaaa"));
    }

    #[test]
    fn test_require_header_names_missing_header() {
        let resp = ResponseMessage::new(StatusCode::OK, HeaderMap::new(), Bytes::new());
        let err = resp.require_header("x-ots-contentmd5").unwrap_err();
        assert!(matches!(err, ClientError::MissingHeader { name } if name == "x-ots-contentmd5"));
    }

    #[test]
    fn test_trace_context_attempts() {
        let ctx = TraceContext::new("BatchGetRow");
        assert_eq!(ctx.attempt, 1);
        assert_eq!(ctx.trace_id.len(), 16);
        let next = ctx.next_attempt();
        assert_eq!(next.attempt, 2);
        assert_eq!(next.trace_id, ctx.trace_id);
    }
}
