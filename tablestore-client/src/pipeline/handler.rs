//! Handler traits and simple request handlers.
//!
//! # Example
//!
//! ```ignore
//! use tablestore_client::pipeline::{FnRequestHandler, HeaderHandler};
//!
//! // Simple header handler
//! let tenant = HeaderHandler::new("x-tenant", "acme");
//!
//! // Custom handler with a closure
//! let logging = FnRequestHandler::new(|trace, req| {
//!     println!("{} attempt {}: {}", trace.action, trace.attempt, req.uri);
//!     Ok(())
//! });
//!
//! let client = TablestoreClient::builder("https://demo.cn-hangzhou.ots.aliyuncs.com", "demo")
//!     .with_request_handler(tenant)
//!     .with_request_handler(logging)
//!     .build()?;
//! ```

use http::{HeaderName, HeaderValue};

use crate::message::{RequestMessage, ResponseMessage, TraceContext};
use crate::ClientError;

/// A stage that runs on the outgoing request before it is signed.
///
/// Handlers must not keep references to the message past their invocation
/// and must not share state with other handlers.
pub trait RequestHandler: Send + Sync {
    /// Inspect or modify the request, or return an error to abort the attempt.
    fn handle_request(
        &self,
        trace: &TraceContext,
        request: &mut RequestMessage,
    ) -> Result<(), ClientError>;

    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// A stage that runs on the buffered response before it is decoded.
pub trait ResponseHandler: Send + Sync {
    /// Inspect or modify the response, or return an error to abort the attempt.
    fn handle_response(
        &self,
        trace: &TraceContext,
        response: &mut ResponseMessage,
    ) -> Result<(), ClientError>;

    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// A request handler that sets one header on every request.
#[derive(Clone, Debug)]
pub struct HeaderHandler {
    name: HeaderName,
    value: HeaderValue,
}

impl HeaderHandler {
    /// Create a new header handler.
    ///
    /// # Panics
    ///
    /// Panics if the header name or value is invalid.
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.parse().expect("invalid header name"),
            value: value.parse().expect("invalid header value"),
        }
    }

    /// Try to create a new header handler, returning an error if invalid.
    pub fn try_new(name: &str, value: &str) -> Result<Self, ClientError> {
        let name = name
            .parse()
            .map_err(|_| ClientError::Config(format!("invalid header name: {}", name)))?;
        let value = value
            .parse()
            .map_err(|_| ClientError::Config(format!("invalid header value: {}", value)))?;
        Ok(Self { name, value })
    }

    /// Create a new header handler from pre-parsed values.
    pub fn from_parts(name: HeaderName, value: HeaderValue) -> Self {
        Self { name, value }
    }
}

impl RequestHandler for HeaderHandler {
    fn handle_request(
        &self,
        _trace: &TraceContext,
        request: &mut RequestMessage,
    ) -> Result<(), ClientError> {
        request.headers.insert(self.name.clone(), self.value.clone());
        Ok(())
    }
}

/// Adapts a closure to the [`RequestHandler`] trait.
pub struct FnRequestHandler<F> {
    f: F,
}

impl<F> FnRequestHandler<F>
where
    F: Fn(&TraceContext, &mut RequestMessage) -> Result<(), ClientError> + Send + Sync,
{
    /// Create a new handler from a closure.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> std::fmt::Debug for FnRequestHandler<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnRequestHandler").finish()
    }
}

impl<F> RequestHandler for FnRequestHandler<F>
where
    F: Fn(&TraceContext, &mut RequestMessage) -> Result<(), ClientError> + Send + Sync,
{
    fn handle_request(
        &self,
        trace: &TraceContext,
        request: &mut RequestMessage,
    ) -> Result<(), ClientError> {
        (self.f)(trace, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn request() -> RequestMessage {
        RequestMessage::new("GetRow", "http://localhost/GetRow", Bytes::new())
    }

    #[test]
    fn test_header_handler() {
        let handler = HeaderHandler::new("x-custom-header", "test-value");
        let mut req = request();
        handler
            .handle_request(&TraceContext::new("GetRow"), &mut req)
            .unwrap();
        assert_eq!(req.header("x-custom-header"), Some("test-value"));
    }

    #[test]
    fn test_header_handler_try_new_rejects_invalid_name() {
        assert!(HeaderHandler::try_new("bad name", "v").is_err());
    }

    #[test]
    fn test_closure_handler_can_abort() {
        let handler = FnRequestHandler::new(|_trace: &TraceContext, _req: &mut RequestMessage| {
            Err(ClientError::Config("blocked".into()))
        });
        let err = handler
            .handle_request(&TraceContext::new("GetRow"), &mut request())
            .unwrap_err();
        assert!(matches!(err, ClientError::Config(msg) if msg == "blocked"));
    }
}
