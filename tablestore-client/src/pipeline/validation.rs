//! Response header validation.

use std::sync::Arc;

use tablestore_core::headers;

use super::{ResponseHandler, Signer};
use crate::message::{ResponseMessage, TraceContext};
use crate::ClientError;

/// Headers every successful response must carry under strict validation.
const STRICT_HEADERS: [&str; 3] = [
    headers::CONTENT_MD5,
    headers::CONTENT_TYPE,
    headers::AUTHORIZATION,
];

/// Checks the headers of successful responses and lets the signer verify the
/// response signature.
///
/// Error responses are left to [`ErrorDecodeHandler`](super::ErrorDecodeHandler),
/// which tells service errors from front-end errors by the request id.
#[derive(Clone)]
pub struct ValidationHandler {
    signer: Arc<dyn Signer>,
    strict: bool,
}

impl ValidationHandler {
    /// Require only the request id.
    pub fn lenient(signer: Arc<dyn Signer>) -> Self {
        Self {
            signer,
            strict: false,
        }
    }

    /// Require the request id plus digest, content type and authorization.
    pub fn strict(signer: Arc<dyn Signer>) -> Self {
        Self {
            signer,
            strict: true,
        }
    }

    /// Returns whether strict validation is enabled.
    pub fn is_strict(&self) -> bool {
        self.strict
    }
}

impl std::fmt::Debug for ValidationHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationHandler")
            .field("strict", &self.strict)
            .finish_non_exhaustive()
    }
}

impl ResponseHandler for ValidationHandler {
    fn handle_response(
        &self,
        _trace: &TraceContext,
        response: &mut ResponseMessage,
    ) -> Result<(), ClientError> {
        if !response.is_success() {
            return Ok(());
        }
        response.require_header(headers::REQUEST_ID)?;
        if self.strict {
            for name in STRICT_HEADERS {
                response.require_header(name)?;
            }
            self.signer.verify_response(response)?;
        }
        Ok(())
    }
}
