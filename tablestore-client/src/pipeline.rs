//! Request/response handler pipeline.
//!
//! Every logical call runs through an [`ExecutionContext`]:
//! - request handlers, in list order, on the outgoing [`RequestMessage`];
//! - the [`Signer`], always last, after every request handler;
//! - response handlers, in list order, on the buffered [`ResponseMessage`]
//!   before the operation decodes it.
//!
//! The default response pipeline is
//! [`ContentMd5Handler`] → [`ValidationHandler`] → [`TracerHandler`] →
//! [`ErrorDecodeHandler`], so a corrupted body is rejected before it can be
//! read as an error payload, and the server's trace info is logged for error
//! responses as well.
//!
//! [`RequestMessage`]: crate::RequestMessage
//! [`ResponseMessage`]: crate::ResponseMessage

mod content_md5;
mod context;
mod error_decoder;
mod handler;
mod signer;
mod tracer;
mod validation;

pub use content_md5::{ContentMd5Handler, RequestDigestHandler};
pub use context::{ExecutionContext, ExecutionContextBuilder};
pub use error_decoder::ErrorDecodeHandler;
pub use handler::{FnRequestHandler, HeaderHandler, RequestHandler, ResponseHandler};
pub use signer::{CredentialsSigner, NoSigner, Signer};
pub use tracer::TracerHandler;
pub use validation::ValidationHandler;
