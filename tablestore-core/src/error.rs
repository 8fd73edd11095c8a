//! Tablestore service error codes.
//!
//! This module provides [`ErrorCode`], the string-valued error codes returned
//! by the service in error payloads and in per-row batch results, together
//! with their retry classification.

use std::fmt;
use std::str::FromStr;

/// Error codes returned by the Tablestore service.
///
/// Known codes get their own variant; anything else is kept verbatim in
/// [`ErrorCode::Other`] so a newer server never breaks decoding.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    AuthFailed,
    AccessDenied,
    RequestBodyTooLarge,
    RequestTimeout,
    MethodNotAllowed,
    ParameterInvalid,
    QuotaExhausted,
    RowOperationConflict,
    NotEnoughCapacityUnit,
    TableNotReady,
    PartitionUnavailable,
    ServerBusy,
    ServerUnavailable,
    InternalServerError,
    Timeout,
    ObjectNotExist,
    ObjectAlreadyExist,
    ConditionCheckFail,
    OutOfColumnCountLimit,
    OutOfRowSizeLimit,
    /// A code this client does not know about.
    Other(String),
}

impl ErrorCode {
    /// Get the wire representation of this code.
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::AuthFailed => "OTSAuthFailed",
            ErrorCode::AccessDenied => "OTSAccessDenied",
            ErrorCode::RequestBodyTooLarge => "OTSRequestBodyTooLarge",
            ErrorCode::RequestTimeout => "OTSRequestTimeout",
            ErrorCode::MethodNotAllowed => "OTSMethodNotAllowed",
            ErrorCode::ParameterInvalid => "OTSParameterInvalid",
            ErrorCode::QuotaExhausted => "OTSQuotaExhausted",
            ErrorCode::RowOperationConflict => "OTSRowOperationConflict",
            ErrorCode::NotEnoughCapacityUnit => "OTSNotEnoughCapacityUnit",
            ErrorCode::TableNotReady => "OTSTableNotReady",
            ErrorCode::PartitionUnavailable => "OTSPartitionUnavailable",
            ErrorCode::ServerBusy => "OTSServerBusy",
            ErrorCode::ServerUnavailable => "OTSServerUnavailable",
            ErrorCode::InternalServerError => "OTSInternalServerError",
            ErrorCode::Timeout => "OTSTimeout",
            ErrorCode::ObjectNotExist => "OTSObjectNotExist",
            ErrorCode::ObjectAlreadyExist => "OTSObjectAlreadyExist",
            ErrorCode::ConditionCheckFail => "OTSConditionCheckFail",
            ErrorCode::OutOfColumnCountLimit => "OTSOutOfColumnCountLimit",
            ErrorCode::OutOfRowSizeLimit => "OTSOutOfRowSizeLimit",
            ErrorCode::Other(code) => code,
        }
    }

    /// Returns whether this code indicates a transient condition that is safe
    /// to retry for any operation, idempotent or not.
    ///
    /// # Example
    ///
    /// ```
    /// use tablestore_core::ErrorCode;
    ///
    /// assert!(ErrorCode::ServerBusy.is_retryable());
    /// assert!(!ErrorCode::Timeout.is_retryable());
    /// assert!(!ErrorCode::ParameterInvalid.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::RowOperationConflict
                | ErrorCode::NotEnoughCapacityUnit
                | ErrorCode::TableNotReady
                | ErrorCode::PartitionUnavailable
                | ErrorCode::ServerBusy
                | ErrorCode::QuotaExhausted
        )
    }

    /// Returns whether this code may be retried when the operation is
    /// idempotent.
    ///
    /// A timeout or internal error leaves the outcome of a write unknown, so
    /// these codes are only retried for reads.
    pub fn is_retryable_for(&self, idempotent: bool) -> bool {
        if self.is_retryable() {
            return true;
        }
        idempotent
            && matches!(
                self,
                ErrorCode::Timeout | ErrorCode::InternalServerError | ErrorCode::ServerUnavailable
            )
    }

    /// Derive a code from an HTTP status when the error body is unusable.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 => ErrorCode::ParameterInvalid,
            401 => ErrorCode::AuthFailed,
            403 => ErrorCode::AccessDenied,
            404 => ErrorCode::ObjectNotExist,
            405 => ErrorCode::MethodNotAllowed,
            408 => ErrorCode::RequestTimeout,
            409 => ErrorCode::ObjectAlreadyExist,
            413 => ErrorCode::RequestBodyTooLarge,
            429 => ErrorCode::QuotaExhausted,
            500 => ErrorCode::InternalServerError,
            502 | 504 => ErrorCode::Timeout,
            503 => ErrorCode::ServerUnavailable,
            other => ErrorCode::Other(format!("HTTP{other}")),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<&str> for ErrorCode {
    fn from(s: &str) -> Self {
        match s {
            "OTSAuthFailed" => ErrorCode::AuthFailed,
            "OTSAccessDenied" => ErrorCode::AccessDenied,
            "OTSRequestBodyTooLarge" => ErrorCode::RequestBodyTooLarge,
            "OTSRequestTimeout" => ErrorCode::RequestTimeout,
            "OTSMethodNotAllowed" => ErrorCode::MethodNotAllowed,
            "OTSParameterInvalid" => ErrorCode::ParameterInvalid,
            "OTSQuotaExhausted" => ErrorCode::QuotaExhausted,
            "OTSRowOperationConflict" => ErrorCode::RowOperationConflict,
            "OTSNotEnoughCapacityUnit" => ErrorCode::NotEnoughCapacityUnit,
            "OTSTableNotReady" => ErrorCode::TableNotReady,
            "OTSPartitionUnavailable" => ErrorCode::PartitionUnavailable,
            "OTSServerBusy" => ErrorCode::ServerBusy,
            "OTSServerUnavailable" => ErrorCode::ServerUnavailable,
            "OTSInternalServerError" => ErrorCode::InternalServerError,
            "OTSTimeout" => ErrorCode::Timeout,
            "OTSObjectNotExist" => ErrorCode::ObjectNotExist,
            "OTSObjectAlreadyExist" => ErrorCode::ObjectAlreadyExist,
            "OTSConditionCheckFail" => ErrorCode::ConditionCheckFail,
            "OTSOutOfColumnCountLimit" => ErrorCode::OutOfColumnCountLimit,
            "OTSOutOfRowSizeLimit" => ErrorCode::OutOfRowSizeLimit,
            other => ErrorCode::Other(other.to_string()),
        }
    }
}

impl From<String> for ErrorCode {
    fn from(s: String) -> Self {
        match ErrorCode::from(s.as_str()) {
            ErrorCode::Other(_) => ErrorCode::Other(s),
            known => known,
        }
    }
}
