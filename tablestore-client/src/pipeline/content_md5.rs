//! Content integrity handlers.

use tablestore_core::{content_md5, headers, verify_content_md5};

use super::{RequestHandler, ResponseHandler};
use crate::message::{RequestMessage, ResponseMessage, TraceContext};
use crate::ClientError;

/// Writes `x-ots-contentmd5` for the outgoing body.
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestDigestHandler;

impl RequestHandler for RequestDigestHandler {
    fn handle_request(
        &self,
        _trace: &TraceContext,
        request: &mut RequestMessage,
    ) -> Result<(), ClientError> {
        let digest = content_md5(&request.body);
        request.set_header(headers::CONTENT_MD5, &digest)
    }
}

/// Verifies `x-ots-contentmd5` against the received body when the header is
/// present.
///
/// Whether a successful response must carry the digest is up to
/// [`ValidationHandler`](super::ValidationHandler) in strict mode.
#[derive(Clone, Copy, Debug, Default)]
pub struct ContentMd5Handler;

impl ResponseHandler for ContentMd5Handler {
    fn handle_response(
        &self,
        _trace: &TraceContext,
        response: &mut ResponseMessage,
    ) -> Result<(), ClientError> {
        let Some(announced) = response.header(headers::CONTENT_MD5) else {
            return Ok(());
        };
        verify_content_md5(announced, &response.body)?;
        Ok(())
    }
}
