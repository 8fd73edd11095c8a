//! Client-side error types.
//!
//! This module provides [`ClientError`], the error type for every Tablestore
//! client operation, and [`ServiceError`], the structured error decoded from
//! a non-2xx service response.

use std::fmt;

use http::StatusCode;
use tablestore_core::{DigestMismatch, ErrorCode};

/// Client-side error variants.
///
/// Variants fall into three groups:
/// - local errors (`MissingHeader`, `Integrity`, `SignatureMismatch`,
///   `Config`, `Encode`, `Decode`, `Protocol`): never retried;
/// - service errors (`Service`): carry the server's code and request id;
/// - transport-boundary errors (`Transport`, `Redirect`,
///   `NoApplicationResponse`): the request did not get a regular answer from
///   the service's application tier.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ClientError {
    /// A structured error returned by the service.
    #[error("{0}")]
    Service(Box<ServiceError>),

    /// A header the protocol requires is absent.
    #[error("missing required header: {name}")]
    MissingHeader { name: String },

    /// The body does not match its content digest.
    #[error("content integrity check failed: {0}")]
    Integrity(#[from] DigestMismatch),

    /// The response signature could not be verified.
    #[error("response signature mismatch: {0}")]
    SignatureMismatch(String),

    /// The endpoint moved permanently.
    #[error("endpoint moved permanently to {location}, update the client endpoint")]
    Redirect { location: String },

    /// A non-2xx response that carries no request id, so it was produced by
    /// something in front of the service (proxy, gateway, load balancer).
    #[error("HTTP {status} without request id, no application-level response: {message}")]
    NoApplicationResponse { status: StatusCode, message: String },

    /// Transport-level error (connection failed, timeout, truncated body, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Message encoding error.
    #[error("encode error: {0}")]
    Encode(String),

    /// Message decoding error.
    #[error("decode error: {0}")]
    Decode(String),

    /// Protocol error (unexpected state, inconsistent batch results, ...).
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl ClientError {
    /// Create a service error.
    pub fn service<S: Into<String>>(
        code: ErrorCode,
        message: S,
        request_id: Option<String>,
        http_status: StatusCode,
    ) -> Self {
        ClientError::Service(Box::new(ServiceError::new(
            code,
            message,
            request_id,
            http_status,
        )))
    }

    /// Create a missing-header error.
    pub fn missing_header<S: Into<String>>(name: S) -> Self {
        ClientError::MissingHeader { name: name.into() }
    }

    /// Get the service error code, if this is a service error.
    pub fn code(&self) -> Option<&ErrorCode> {
        match self {
            ClientError::Service(err) => Some(&err.code),
            _ => None,
        }
    }

    /// Get the service request id, if the service answered.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            ClientError::Service(err) => err.request_id.as_deref(),
            _ => None,
        }
    }

    /// Get the structured service error, if any.
    pub fn as_service(&self) -> Option<&ServiceError> {
        match self {
            ClientError::Service(err) => Some(err),
            _ => None,
        }
    }

    /// Returns whether this error indicates a transient condition that is
    /// safe to retry for any operation.
    ///
    /// # Example
    ///
    /// ```
    /// use tablestore_client::{ClientError, ErrorCode};
    /// use http::StatusCode;
    ///
    /// let err = ClientError::service(ErrorCode::ServerBusy, "busy", None, StatusCode::SERVICE_UNAVAILABLE);
    /// assert!(err.is_retryable());
    ///
    /// let err = ClientError::missing_header("x-ots-contentmd5");
    /// assert!(!err.is_retryable());
    ///
    /// // Transport errors are retryable
    /// let err = ClientError::Transport("connection reset".into());
    /// assert!(err.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        self.is_retryable_for(false)
    }

    /// Returns whether this error may be retried, taking the operation's
    /// idempotency into account.
    pub fn is_retryable_for(&self, idempotent: bool) -> bool {
        match self {
            ClientError::Service(err) => err.code.is_retryable_for(idempotent),
            ClientError::Transport(_) => true,
            _ => false,
        }
    }
}

/// Structured error decoded from a service response.
#[derive(Clone, Debug)]
pub struct ServiceError {
    /// Service error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Request id of the call that failed.
    pub request_id: Option<String>,
    /// HTTP status of the response.
    pub http_status: StatusCode,
    /// Extra detail carried by access-denied errors.
    pub access_denied: Option<AccessDeniedDetail>,
}

impl ServiceError {
    /// Create a new service error without access-denied detail.
    pub fn new<S: Into<String>>(
        code: ErrorCode,
        message: S,
        request_id: Option<String>,
        http_status: StatusCode,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            request_id,
            http_status,
            access_denied: None,
        }
    }

    /// Attach access-denied detail.
    pub fn with_access_denied(mut self, detail: AccessDeniedDetail) -> Self {
        self.access_denied = Some(detail);
        self
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(request_id) = &self.request_id {
            write!(f, " (request id {request_id}")?;
        } else {
            write!(f, " (no request id")?;
        }
        write!(f, ", HTTP {})", self.http_status.as_u16())?;
        if let Some(detail) = &self.access_denied {
            write!(f, ": {detail}")?;
        }
        Ok(())
    }
}

/// Why an access-denied error was raised.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessDeniedDetail {
    pub auth_action: Option<String>,
    pub auth_principal_type: Option<String>,
    pub auth_principal_owner_id: Option<String>,
    pub auth_principal_id: Option<String>,
    pub encoded_diagnostic_message: Option<String>,
    pub no_permission_type: Option<String>,
    pub policy_type: Option<String>,
}

impl fmt::Display for AccessDeniedDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = [
            ("action", &self.auth_action),
            ("principal_type", &self.auth_principal_type),
            ("principal_owner_id", &self.auth_principal_owner_id),
            ("principal_id", &self.auth_principal_id),
            ("no_permission_type", &self.no_permission_type),
            ("policy_type", &self.policy_type),
        ];
        let mut first = true;
        for (name, value) in fields {
            if let Some(value) = value {
                if !first {
                    f.write_str(", ")?;
                }
                write!(f, "{name}={value}")?;
                first = false;
            }
        }
        Ok(())
    }
}
