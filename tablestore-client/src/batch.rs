//! Batch row operations and partial-failure reconciliation.
//!
//! A batch call returns one [`RowResult`] per submitted row. When some rows
//! fail the call raises [`PartialFailure`], which still carries the merged
//! [`BatchResponse`]. Retries resend only the failed rows (see
//! [`BatchRequest::retain_failed`]) and [`merge`] folds their results back
//! into the earlier response under the original indices.

mod merge;
mod model;
mod request;

pub use merge::{MergeMismatch, merge, merge_rows};
pub(crate) use merge::check_row_counts;
pub use model::{
    BatchError, BatchResponse, ConsumedCapacity, PartialFailure, Row, RowError, RowFailure,
    RowOutcome, RowResult,
};
pub use request::{
    BatchGetRowRequest, BatchRequest, BatchWriteRowRequest, RowChange, RowOperation,
    TableGetCriteria, TableWriteRows,
};

/// Result rows of [`BatchGetRowRequest`]: `None` when the row does not exist.
pub type BatchGetRowResponse = BatchResponse<Option<Row>>;

/// Result rows of [`BatchWriteRowRequest`]: `Some` only when the row was
/// requested back.
pub type BatchWriteRowResponse = BatchResponse<Option<Row>>;
