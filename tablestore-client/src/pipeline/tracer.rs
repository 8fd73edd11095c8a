use tablestore_core::headers;

use super::ResponseHandler;
use crate::message::{ResponseMessage, TraceContext};
use crate::ClientError;

/// Logs the server's trace info next to the client trace context.
///
/// The `x-ots-tracerinfo` value is opaque and only logged. Without the
/// `tracing` feature this handler does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracerHandler;

impl ResponseHandler for TracerHandler {
    fn handle_response(
        &self,
        trace: &TraceContext,
        response: &mut ResponseMessage,
    ) -> Result<(), ClientError> {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            trace_id = %trace.trace_id,
            action = %trace.action,
            attempt = trace.attempt,
            status = response.status.as_u16(),
            request_id = response.request_id().unwrap_or("-"),
            tracer_info = response.header(headers::TRACE_INFO).unwrap_or("-"),
            "response received"
        );
        #[cfg(not(feature = "tracing"))]
        let _ = (trace, response.header(headers::TRACE_INFO));
        Ok(())
    }
}
