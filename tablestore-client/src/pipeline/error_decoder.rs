//! Error response decoding.
//!
//! Turns non-2xx responses into typed errors:
//! - `301` with `location` → [`ClientError::Redirect`], without it →
//!   [`ClientError::MissingHeader`];
//! - no `x-ots-requestid` → [`ClientError::NoApplicationResponse`];
//! - otherwise the protobuf error payload → [`ClientError::Service`], falling
//!   back to a code derived from the HTTP status when the body is not a
//!   payload.

use http::StatusCode;
use prost::Message;
use tablestore_core::{ErrorCode, headers};

use super::ResponseHandler;
use crate::error::{AccessDeniedDetail, ServiceError};
use crate::message::{ResponseMessage, TraceContext};
use crate::protocol;
use crate::ClientError;

/// Raises the typed error carried by a non-2xx response.
#[derive(Clone, Copy, Debug, Default)]
pub struct ErrorDecodeHandler;

impl ResponseHandler for ErrorDecodeHandler {
    fn handle_response(
        &self,
        _trace: &TraceContext,
        response: &mut ResponseMessage,
    ) -> Result<(), ClientError> {
        if response.is_success() {
            return Ok(());
        }
        Err(decode_error(response))
    }
}

/// Decode the error carried by a non-2xx response.
pub(crate) fn decode_error(response: &ResponseMessage) -> ClientError {
    let status = response.status;

    if status == StatusCode::MOVED_PERMANENTLY {
        return match response.header(headers::LOCATION) {
            Some(location) => ClientError::Redirect {
                location: location.to_string(),
            },
            None => ClientError::missing_header(headers::LOCATION),
        };
    }

    let Some(request_id) = response.request_id() else {
        return ClientError::NoApplicationResponse {
            status,
            message: body_text(&response.body, status),
        };
    };
    let request_id = Some(request_id.to_string());

    match protocol::Error::decode(response.body.as_ref()) {
        Ok(payload) if !payload.code.is_empty() => {
            let code = ErrorCode::from(payload.code);
            let message = payload.message.unwrap_or_default();
            let mut err = ServiceError::new(code, message, request_id, status);
            if let Some(detail) = payload.access_denied_detail {
                err = err.with_access_denied(detail.into());
            }
            ClientError::Service(Box::new(err))
        }
        _ => ClientError::service(
            ErrorCode::from_http_status(status.as_u16()),
            body_text(&response.body, status),
            request_id,
            status,
        ),
    }
}

fn body_text(body: &[u8], status: StatusCode) -> String {
    match std::str::from_utf8(body) {
        Ok(text) if !text.is_empty() => text.to_string(),
        _ => status.canonical_reason().unwrap_or("Unknown error").to_string(),
    }
}

impl From<protocol::AccessDeniedDetail> for AccessDeniedDetail {
    fn from(detail: protocol::AccessDeniedDetail) -> Self {
        Self {
            auth_action: detail.auth_action,
            auth_principal_type: detail.auth_principal_type,
            auth_principal_owner_id: detail.auth_principal_owner_id,
            auth_principal_id: detail.auth_principal_id,
            encoded_diagnostic_message: detail.encoded_diagnostic_message,
            no_permission_type: detail.no_permission_type,
            policy_type: detail.policy_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{HeaderMap, HeaderValue};

    fn error_body(code: &str, message: &str) -> Bytes {
        Bytes::from(
            protocol::Error {
                code: code.to_string(),
                message: Some(message.to_string()),
                access_denied_detail: None,
            }
            .encode_to_vec(),
        )
    }

    fn with_request_id(request_id: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(headers::REQUEST_ID, HeaderValue::from_static(request_id));
        headers
    }

    fn run(response: ResponseMessage) -> Result<(), ClientError> {
        let mut response = response;
        ErrorDecodeHandler.handle_response(&TraceContext::new("GetRow"), &mut response)
    }

    #[test]
    fn test_success_passes_through() {
        let resp = ResponseMessage::new(StatusCode::OK, HeaderMap::new(), Bytes::new());
        assert!(run(resp).is_ok());
    }

    #[test]
    fn test_service_error_decoded() {
        let resp = ResponseMessage::new(
            StatusCode::NOT_FOUND,
            with_request_id("0000-aaaa"),
            error_body("OTSObjectNotExist", "Requested table does not exist."),
        );

        let err = run(resp).unwrap_err();
        let service = err.as_service().expect("service error");
        assert_eq!(service.code, ErrorCode::ObjectNotExist);
        assert_eq!(service.message, "Requested table does not exist.");
        assert_eq!(service.request_id.as_deref(), Some("0000-aaaa"));
        assert_eq!(service.http_status, StatusCode::NOT_FOUND);
        assert!(service.access_denied.is_none());
    }

    #[test]
    fn test_access_denied_detail_decoded() {
        let body = protocol::Error {
            code: "OTSAccessDenied".into(),
            message: Some("denied".into()),
            access_denied_detail: Some(protocol::AccessDeniedDetail {
                auth_action: Some("ots:BatchWriteRow".into()),
                no_permission_type: Some("ImplicitDeny".into()),
                ..Default::default()
            }),
        }
        .encode_to_vec();
        let resp = ResponseMessage::new(
            StatusCode::FORBIDDEN,
            with_request_id("req-9"),
            Bytes::from(body),
        );

        let err = run(resp).unwrap_err();
        let detail = err.as_service().unwrap().access_denied.clone().unwrap();
        assert_eq!(detail.auth_action.as_deref(), Some("ots:BatchWriteRow"));
        assert_eq!(detail.no_permission_type.as_deref(), Some("ImplicitDeny"));
    }

    #[test]
    fn test_missing_request_id_is_front_end_error() {
        let resp = ResponseMessage::new(
            StatusCode::BAD_GATEWAY,
            HeaderMap::new(),
            Bytes::from_static(b"upstream connect error"),
        );

        let err = run(resp).unwrap_err();
        match err {
            ClientError::NoApplicationResponse { status, message } => {
                assert_eq!(status, StatusCode::BAD_GATEWAY);
                assert_eq!(message, "upstream connect error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_redirect_with_location() {
        let mut headers = HeaderMap::new();
        headers.insert(headers::LOCATION, HeaderValue::from_static("https://new-endpoint"));
        let resp = ResponseMessage::new(StatusCode::MOVED_PERMANENTLY, headers, Bytes::new());

        let err = run(resp).unwrap_err();
        assert!(matches!(&err, ClientError::Redirect { location } if location == "https://new-endpoint"));
        assert!(err.to_string().contains("https://new-endpoint"));
    }

    #[test]
    fn test_redirect_without_location() {
        let resp = ResponseMessage::new(StatusCode::MOVED_PERMANENTLY, HeaderMap::new(), Bytes::new());
        let err = run(resp).unwrap_err();
        assert!(matches!(err, ClientError::MissingHeader { name } if name == headers::LOCATION));
    }

    #[test]
    fn test_undecodable_body_falls_back_to_http_status() {
        let resp = ResponseMessage::new(
            StatusCode::SERVICE_UNAVAILABLE,
            with_request_id("req-3"),
            Bytes::new(),
        );

        let err = run(resp).unwrap_err();
        let service = err.as_service().unwrap();
        assert_eq!(service.code, ErrorCode::ServerUnavailable);
        assert_eq!(service.message, "Service Unavailable");
        assert_eq!(service.request_id.as_deref(), Some("req-3"));
    }
}
