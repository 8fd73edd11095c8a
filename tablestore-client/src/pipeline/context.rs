//! Execution context: the ordered pipeline shared by every attempt of a call.

use std::sync::Arc;

use super::{
    ContentMd5Handler, ErrorDecodeHandler, RequestDigestHandler, RequestHandler, ResponseHandler,
    Signer, TracerHandler, ValidationHandler,
};
use crate::message::{RequestMessage, ResponseMessage, TraceContext};
use crate::ClientError;

/// Request handlers, response handlers and the final signer of a logical call.
///
/// Immutable once built. Attempts share it through an `Arc` and each gets
/// fresh messages, so nothing leaks from one attempt into the next.
#[derive(Clone)]
pub struct ExecutionContext {
    signer: Arc<dyn Signer>,
    request_handlers: Vec<Arc<dyn RequestHandler>>,
    response_handlers: Vec<Arc<dyn ResponseHandler>>,
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field(
                "request_handlers",
                &self.request_handlers.iter().map(|h| h.name()).collect::<Vec<_>>(),
            )
            .field(
                "response_handlers",
                &self.response_handlers.iter().map(|h| h.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl ExecutionContext {
    /// Start building a context around `signer` with empty handler lists.
    pub fn builder(signer: Arc<dyn Signer>) -> ExecutionContextBuilder {
        ExecutionContextBuilder::new(signer)
    }

    /// The default pipeline with lenient header validation.
    pub fn with_defaults(signer: Arc<dyn Signer>) -> Self {
        ExecutionContextBuilder::new(signer).default_handlers(false).build()
    }

    pub fn signer(&self) -> &Arc<dyn Signer> {
        &self.signer
    }

    pub fn request_handlers(&self) -> &[Arc<dyn RequestHandler>] {
        &self.request_handlers
    }

    pub fn response_handlers(&self) -> &[Arc<dyn ResponseHandler>] {
        &self.response_handlers
    }

    /// Run every request handler in order, then the signer.
    pub fn prepare_request(
        &self,
        trace: &TraceContext,
        request: &mut RequestMessage,
    ) -> Result<(), ClientError> {
        for handler in &self.request_handlers {
            handler.handle_request(trace, request)?;
        }
        self.signer.sign(trace, request)
    }

    /// Run every response handler in order. The first error aborts the rest.
    pub fn process_response(
        &self,
        trace: &TraceContext,
        response: &mut ResponseMessage,
    ) -> Result<(), ClientError> {
        for handler in &self.response_handlers {
            if let Err(err) = handler.handle_response(trace, response) {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    trace_id = %trace.trace_id,
                    handler = handler.name(),
                    error = %err,
                    "response rejected"
                );
                return Err(err);
            }
        }
        Ok(())
    }
}

/// Builder for [`ExecutionContext`].
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use tablestore_client::pipeline::{ExecutionContext, HeaderHandler, NoSigner};
///
/// let tenant: Arc<dyn RequestHandler> = Arc::new(HeaderHandler::new("x-tenant", "acme"));
/// let ctx = ExecutionContext::builder(Arc::new(NoSigner))
///     .default_handlers(true)
///     .insert_request_handler(0, tenant)
///     .build();
/// ```
#[derive(Clone)]
pub struct ExecutionContextBuilder {
    signer: Arc<dyn Signer>,
    request_handlers: Vec<Arc<dyn RequestHandler>>,
    response_handlers: Vec<Arc<dyn ResponseHandler>>,
}

impl ExecutionContextBuilder {
    /// Create a builder with no handlers.
    pub fn new(signer: Arc<dyn Signer>) -> Self {
        Self {
            signer,
            request_handlers: Vec::new(),
            response_handlers: Vec::new(),
        }
    }

    /// Append the standard handlers: request digest on the way out, then
    /// digest check, validation, tracing and error decoding on the way in.
    /// Tracing precedes error decoding so error responses are logged too.
    pub fn default_handlers(mut self, strict_validation: bool) -> Self {
        let validation = if strict_validation {
            ValidationHandler::strict(self.signer.clone())
        } else {
            ValidationHandler::lenient(self.signer.clone())
        };
        self.request_handlers.push(Arc::new(RequestDigestHandler));
        self.response_handlers.push(Arc::new(ContentMd5Handler));
        self.response_handlers.push(Arc::new(validation));
        self.response_handlers.push(Arc::new(TracerHandler));
        self.response_handlers.push(Arc::new(ErrorDecodeHandler));
        self
    }

    /// Append a request handler.
    pub fn request_handler(mut self, handler: Arc<dyn RequestHandler>) -> Self {
        self.request_handlers.push(handler);
        self
    }

    /// Insert a request handler at `index`, clamped to the list length.
    pub fn insert_request_handler(mut self, index: usize, handler: Arc<dyn RequestHandler>) -> Self {
        let index = index.min(self.request_handlers.len());
        self.request_handlers.insert(index, handler);
        self
    }

    /// Remove every occurrence of `handler`, compared by identity.
    pub fn remove_request_handler(mut self, handler: &Arc<dyn RequestHandler>) -> Self {
        self.request_handlers.retain(|h| !Arc::ptr_eq(h, handler));
        self
    }

    /// Append a response handler.
    pub fn response_handler(mut self, handler: Arc<dyn ResponseHandler>) -> Self {
        self.response_handlers.push(handler);
        self
    }

    /// Insert a response handler at `index`, clamped to the list length.
    pub fn insert_response_handler(
        mut self,
        index: usize,
        handler: Arc<dyn ResponseHandler>,
    ) -> Self {
        let index = index.min(self.response_handlers.len());
        self.response_handlers.insert(index, handler);
        self
    }

    /// Remove every occurrence of `handler`, compared by identity.
    pub fn remove_response_handler(mut self, handler: &Arc<dyn ResponseHandler>) -> Self {
        self.response_handlers.retain(|h| !Arc::ptr_eq(h, handler));
        self
    }

    pub fn build(self) -> ExecutionContext {
        ExecutionContext {
            signer: self.signer,
            request_handlers: self.request_handlers,
            response_handlers: self.response_handlers,
        }
    }
}
