use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use http::StatusCode;
use tablestore_core::ErrorCode;

use crate::error::ServiceError;
use crate::ClientError;

/// Encoded row contents, opaque to this crate.
pub type Row = Bytes;

/// Capacity units a row operation consumed, as reported by the service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConsumedCapacity {
    pub read: i32,
    pub write: i32,
}

/// Error reported for a single row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowError {
    pub code: ErrorCode,
    pub message: String,
}

impl RowError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RowOutcome<R> {
    Succeeded { row: R, consumed: ConsumedCapacity },
    Failed { error: RowError },
}

/// Outcome of one submitted row, tagged with its index in the original
/// request for its table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowResult<R> {
    pub index: usize,
    pub outcome: RowOutcome<R>,
}

impl<R> RowResult<R> {
    pub fn succeeded(index: usize, row: R, consumed: ConsumedCapacity) -> Self {
        Self {
            index,
            outcome: RowOutcome::Succeeded { row, consumed },
        }
    }

    pub fn failed(index: usize, error: RowError) -> Self {
        Self {
            index,
            outcome: RowOutcome::Failed { error },
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, RowOutcome::Succeeded { .. })
    }

    pub fn row(&self) -> Option<&R> {
        match &self.outcome {
            RowOutcome::Succeeded { row, .. } => Some(row),
            RowOutcome::Failed { .. } => None,
        }
    }

    pub fn consumed(&self) -> Option<ConsumedCapacity> {
        match &self.outcome {
            RowOutcome::Succeeded { consumed, .. } => Some(*consumed),
            RowOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&RowError> {
        match &self.outcome {
            RowOutcome::Succeeded { .. } => None,
            RowOutcome::Failed { error } => Some(error),
        }
    }
}

/// Result of a batch call: per table, one result per submitted row in
/// submission order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchResponse<R> {
    pub request_id: Option<String>,
    pub tables: BTreeMap<String, Vec<RowResult<R>>>,
}

impl<R> Default for BatchResponse<R> {
    fn default() -> Self {
        Self {
            request_id: None,
            tables: BTreeMap::new(),
        }
    }
}

impl<R> BatchResponse<R> {
    pub fn new(request_id: Option<String>) -> Self {
        Self {
            request_id,
            tables: BTreeMap::new(),
        }
    }

    /// Add a table's results, replacing any previous entry.
    pub fn with_table(mut self, table: impl Into<String>, rows: Vec<RowResult<R>>) -> Self {
        self.tables.insert(table.into(), rows);
        self
    }

    pub fn table(&self, name: &str) -> Option<&[RowResult<R>]> {
        self.tables.get(name).map(Vec::as_slice)
    }

    /// Total number of row results across tables.
    pub fn row_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    pub fn is_all_succeeded(&self) -> bool {
        self.tables.values().flatten().all(RowResult::is_ok)
    }

    pub fn succeeded_rows(&self) -> impl Iterator<Item = (&str, &RowResult<R>)> {
        self.rows().filter(|(_, row)| row.is_ok())
    }

    pub fn failed_rows(&self) -> impl Iterator<Item = (&str, &RowResult<R>)> {
        self.rows().filter(|(_, row)| !row.is_ok())
    }

    fn rows(&self) -> impl Iterator<Item = (&str, &RowResult<R>)> {
        self.tables
            .iter()
            .flat_map(|(table, rows)| rows.iter().map(move |row| (table.as_str(), row)))
    }
}

/// A row that still failed after the merge.
#[derive(Clone, Debug)]
pub struct RowFailure {
    pub table: String,
    pub index: usize,
    pub error: ServiceError,
}

/// Some rows of a batch call failed.
///
/// Carries one error per failed row plus the full merged response, so rows
/// that succeeded can still be recovered.
#[derive(Clone, Debug, thiserror::Error)]
#[error(
    "{} of {} rows failed{}",
    .failures.len(),
    .response.row_count(),
    describe(.request_id, .failures)
)]
pub struct PartialFailure<R: fmt::Debug> {
    pub request_id: Option<String>,
    pub failures: Vec<RowFailure>,
    pub response: BatchResponse<R>,
}

fn describe(request_id: &Option<String>, failures: &[RowFailure]) -> String {
    let mut out = String::new();
    if let Some(request_id) = request_id {
        out.push_str(&format!(" (request id {request_id})"));
    }
    if let Some(first) = failures.first() {
        out.push_str(&format!(", first: {}[{}] {}", first.table, first.index, first.error));
    }
    out
}

impl<R: fmt::Debug> PartialFailure<R> {
    /// Scan a merged response. Returns it unchanged when every row succeeded.
    pub fn check(response: BatchResponse<R>) -> Result<BatchResponse<R>, Self> {
        let failures: Vec<RowFailure> = response
            .failed_rows()
            .filter_map(|(table, row)| {
                row.error().map(|error| RowFailure {
                    table: table.to_string(),
                    index: row.index,
                    error: ServiceError::new(
                        error.code.clone(),
                        error.message.clone(),
                        response.request_id.clone(),
                        StatusCode::OK,
                    ),
                })
            })
            .collect();

        if failures.is_empty() {
            return Ok(response);
        }
        Err(Self {
            request_id: response.request_id.clone(),
            failures,
            response,
        })
    }

    /// Returns whether every failed row may be resent.
    ///
    /// A single final failure, or a row whose outcome is unknown for a
    /// non-idempotent operation, keeps the whole set from being resent.
    pub fn is_retryable(&self, idempotent: bool) -> bool {
        self.failures
            .iter()
            .all(|failure| failure.error.code.is_retryable_for(idempotent))
    }

    pub fn into_response(self) -> BatchResponse<R> {
        self.response
    }
}

/// Error of a batch call.
#[derive(Debug, thiserror::Error)]
pub enum BatchError<R: fmt::Debug> {
    /// The call as a whole failed.
    #[error(transparent)]
    Client(#[from] ClientError),
    /// The call completed but some rows failed.
    #[error("batch partially failed: {0}")]
    Partial(Box<PartialFailure<R>>),
}

impl<R: fmt::Debug> BatchError<R> {
    pub fn as_partial(&self) -> Option<&PartialFailure<R>> {
        match self {
            BatchError::Partial(failure) => Some(failure),
            BatchError::Client(_) => None,
        }
    }

    pub fn into_partial(self) -> Option<PartialFailure<R>> {
        match self {
            BatchError::Partial(failure) => Some(*failure),
            BatchError::Client(_) => None,
        }
    }
}

impl<R: fmt::Debug> From<PartialFailure<R>> for BatchError<R> {
    fn from(failure: PartialFailure<R>) -> Self {
        BatchError::Partial(Box::new(failure))
    }
}
