//! Reconciles a retried batch attempt with the attempts before it.
//!
//! A retry resends only the rows that failed, in their original relative
//! order. The fresh response therefore lists, per table, exactly the
//! previously failed rows; merging walks the previous result and takes the
//! next fresh entry for every row that had failed.

use std::collections::BTreeMap;

use super::model::{BatchResponse, RowResult};
use crate::ClientError;

/// Merge the response of a retry into the response carried from earlier
/// attempts.
///
/// With no previous response the fresh one is returned unchanged. Rows that
/// already succeeded are carried forward; every previously failed row is
/// replaced by the next fresh result for its table, keeping its original
/// index. The merged response takes the request id of the fresh attempt.
///
/// Fails with [`ClientError::Protocol`] when the fresh response does not hold
/// exactly one result per previously failed row.
pub fn merge<R>(
    last: Option<BatchResponse<R>>,
    fresh: BatchResponse<R>,
) -> Result<BatchResponse<R>, ClientError> {
    let Some(last) = last else {
        return Ok(fresh);
    };

    let mut fresh_tables = fresh.tables;
    let mut tables = BTreeMap::new();
    for (table, rows) in last.tables {
        let resent = fresh_tables.remove(&table).unwrap_or_default();
        let merged = merge_rows(rows, resent)
            .map_err(|err| ClientError::Protocol(format!("table {table}: {err}")))?;
        tables.insert(table, merged);
    }

    if let Some(unknown) = fresh_tables.keys().next() {
        return Err(ClientError::Protocol(format!(
            "retry response contains table {unknown} that was not part of the batch"
        )));
    }

    Ok(BatchResponse {
        request_id: fresh.request_id,
        tables,
    })
}

/// Merge a flat list of row results, as returned by operations without a
/// per-table grouping.
pub fn merge_rows<R>(
    last: Vec<RowResult<R>>,
    resent: Vec<RowResult<R>>,
) -> Result<Vec<RowResult<R>>, MergeMismatch> {
    let failed = last.iter().filter(|row| !row.is_ok()).count();
    if failed != resent.len() {
        return Err(MergeMismatch {
            failed,
            received: resent.len(),
        });
    }

    let mut resent = resent.into_iter();
    let merged = last
        .into_iter()
        .map(|row| {
            if row.is_ok() {
                return row;
            }
            match resent.next() {
                Some(fresh) => RowResult {
                    index: row.index,
                    outcome: fresh.outcome,
                },
                // counts were checked above
                None => row,
            }
        })
        .collect();
    Ok(merged)
}

/// The resent results do not line up with the previously failed rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{failed} rows were resent but {received} results came back")]
pub struct MergeMismatch {
    pub failed: usize,
    pub received: usize,
}

/// Check that a response holds one result per submitted row for every table.
pub(crate) fn check_row_counts<R>(
    response: &BatchResponse<R>,
    submitted: &BTreeMap<String, usize>,
) -> Result<(), ClientError> {
    for (table, expected) in submitted {
        let received = response.table(table).map_or(0, <[_]>::len);
        if received != *expected {
            return Err(ClientError::Protocol(format!(
                "table {table}: submitted {expected} rows, response has {received}"
            )));
        }
    }
    if let Some(unknown) = response.tables.keys().find(|t| !submitted.contains_key(*t)) {
        return Err(ClientError::Protocol(format!(
            "response contains table {unknown} that was not submitted"
        )));
    }
    Ok(())
}
