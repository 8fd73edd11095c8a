//! Header names used by the Tablestore protocol.
//!
//! All names are lowercase so they can be used directly with
//! `http::HeaderName::from_static`.

/// Request id assigned by the service's application tier.
pub const REQUEST_ID: &str = "x-ots-requestid";
/// Base64 MD5 digest of the message body.
pub const CONTENT_MD5: &str = "x-ots-contentmd5";
/// Content type of the response payload.
pub const CONTENT_TYPE: &str = "x-ots-contenttype";
/// Request or response signature.
pub const AUTHORIZATION: &str = "authorization";
/// New endpoint announced by a permanent redirect.
pub const LOCATION: &str = "location";
/// Server-side trace information, logged but never parsed.
pub const TRACE_INFO: &str = "x-ots-tracerinfo";
/// Request timestamp.
pub const DATE: &str = "x-ots-date";
/// Protocol version.
pub const API_VERSION: &str = "x-ots-apiversion";
/// Target instance.
pub const INSTANCE_NAME: &str = "x-ots-instancename";
/// Access key id, written by signers.
pub const ACCESS_KEY_ID: &str = "x-ots-accesskeyid";
/// Security token for temporary credentials.
pub const STS_TOKEN: &str = "x-ots-ststoken";
/// Client-chosen trace id, echoed in logs on both sides.
pub const TRACE_ID: &str = "x-ots-traceid";
/// Flow-control priority hint.
pub const PRIORITY: &str = "x-ots-priority";

/// Prefix reserved for protocol headers.
pub const RESERVED_PREFIX: &str = "x-ots-";

/// Protocol version sent with every request.
pub const API_VERSION_VALUE: &str = "2015-12-31";

/// Returns whether a header name belongs to the protocol and must not be
/// overridden by per-call headers.
pub fn is_reserved(name: &str) -> bool {
    name.starts_with(RESERVED_PREFIX) || name == AUTHORIZATION || name == "content-type"
}
