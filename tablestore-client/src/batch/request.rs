use std::collections::{BTreeMap, BTreeSet};

use bytes::Bytes;
use prost::Message;
use tablestore_core::ErrorCode;

use super::model::{BatchResponse, ConsumedCapacity, Row, RowError, RowResult};
use crate::protocol;
use crate::ClientError;

/// A multi-row request that can be narrowed to the rows that failed.
pub trait BatchRequest: Clone + Send + Sync + 'static {
    /// Operation name.
    const ACTION: &'static str;

    /// Whether resending a row after an unknown outcome is safe.
    const IDEMPOTENT: bool;

    /// Rows submitted per table.
    fn row_counts(&self) -> BTreeMap<String, usize>;

    /// Checks the request before it is sent. Each table may appear once,
    /// since results are keyed by table name.
    fn validate(&self) -> Result<(), ClientError>;

    /// Keep only the rows that failed in `merged`, in their original order.
    ///
    /// `merged` must be a response to this request, with original indices.
    fn retain_failed<R>(&self, merged: &BatchResponse<R>) -> Self;

    fn encode(&self) -> Bytes;

    fn decode(body: &[u8], request_id: Option<String>)
        -> Result<BatchResponse<Option<Row>>, ClientError>;
}

/// Rows to read from one table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableGetCriteria {
    pub table_name: String,
    /// Encoded primary keys, one per row.
    pub primary_keys: Vec<Bytes>,
    pub columns_to_get: Vec<String>,
    pub max_versions: Option<i32>,
}

impl TableGetCriteria {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            max_versions: Some(1),
            ..Default::default()
        }
    }

    pub fn primary_key(mut self, key: impl Into<Bytes>) -> Self {
        self.primary_keys.push(key.into());
        self
    }

    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.columns_to_get.push(name.into());
        self
    }

    pub fn max_versions(mut self, versions: i32) -> Self {
        self.max_versions = Some(versions);
        self
    }
}

/// Read rows from several tables in one call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchGetRowRequest {
    tables: Vec<TableGetCriteria>,
}

impl BatchGetRowRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table. A table listed twice fails the call before it is sent.
    pub fn table(mut self, criteria: TableGetCriteria) -> Self {
        self.tables.push(criteria);
        self
    }

    pub fn tables(&self) -> &[TableGetCriteria] {
        &self.tables
    }

    pub fn is_empty(&self) -> bool {
        self.tables.iter().all(|t| t.primary_keys.is_empty())
    }
}

impl BatchRequest for BatchGetRowRequest {
    const ACTION: &'static str = "BatchGetRow";
    const IDEMPOTENT: bool = true;

    fn validate(&self) -> Result<(), ClientError> {
        unique_tables(Self::ACTION, self.tables.iter().map(|t| t.table_name.as_str()))
    }

    fn row_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for table in &self.tables {
            *counts.entry(table.table_name.clone()).or_default() += table.primary_keys.len();
        }
        counts
    }

    fn retain_failed<R>(&self, merged: &BatchResponse<R>) -> Self {
        let tables = self
            .tables
            .iter()
            .filter_map(|table| {
                let results = merged.table(&table.table_name)?;
                let primary_keys: Vec<Bytes> = keep_failed(&table.primary_keys, results);
                (!primary_keys.is_empty()).then(|| TableGetCriteria {
                    primary_keys,
                    ..table.clone()
                })
            })
            .collect();
        Self { tables }
    }

    fn encode(&self) -> Bytes {
        let request = protocol::BatchGetRowRequest {
            tables: self
                .tables
                .iter()
                .map(|table| protocol::TableInBatchGetRowRequest {
                    table_name: table.table_name.clone(),
                    primary_key: table.primary_keys.clone(),
                    columns_to_get: table.columns_to_get.clone(),
                    max_versions: table.max_versions,
                })
                .collect(),
        };
        Bytes::from(request.encode_to_vec())
    }

    fn decode(
        body: &[u8],
        request_id: Option<String>,
    ) -> Result<BatchResponse<Option<Row>>, ClientError> {
        let response = protocol::BatchGetRowResponse::decode(body)
            .map_err(|e| ClientError::Decode(format!("BatchGetRowResponse: {e}")))?;
        Ok(from_tables(response.tables, request_id))
    }
}

/// Kind of change applied to a row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowOperation {
    Put,
    Update,
    Delete,
}

impl From<RowOperation> for protocol::OperationType {
    fn from(op: RowOperation) -> Self {
        match op {
            RowOperation::Put => protocol::OperationType::Put,
            RowOperation::Update => protocol::OperationType::Update,
            RowOperation::Delete => protocol::OperationType::Delete,
        }
    }
}

/// One row change inside a batch write.
#[derive(Clone, Debug, PartialEq)]
pub struct RowChange {
    pub operation: RowOperation,
    /// Encoded row change.
    pub change: Bytes,
    pub return_row: bool,
}

impl RowChange {
    pub fn put(change: impl Into<Bytes>) -> Self {
        Self::new(RowOperation::Put, change)
    }

    pub fn update(change: impl Into<Bytes>) -> Self {
        Self::new(RowOperation::Update, change)
    }

    pub fn delete(change: impl Into<Bytes>) -> Self {
        Self::new(RowOperation::Delete, change)
    }

    fn new(operation: RowOperation, change: impl Into<Bytes>) -> Self {
        Self {
            operation,
            change: change.into(),
            return_row: false,
        }
    }

    pub fn return_row(mut self) -> Self {
        self.return_row = true;
        self
    }
}

/// Row changes for one table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableWriteRows {
    pub table_name: String,
    pub rows: Vec<RowChange>,
}

impl TableWriteRows {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, change: RowChange) -> Self {
        self.rows.push(change);
        self
    }
}

/// Write rows to several tables in one call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchWriteRowRequest {
    tables: Vec<TableWriteRows>,
}

impl BatchWriteRowRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table. A table listed twice fails the call before it is sent.
    pub fn table(mut self, rows: TableWriteRows) -> Self {
        self.tables.push(rows);
        self
    }

    pub fn tables(&self) -> &[TableWriteRows] {
        &self.tables
    }

    pub fn is_empty(&self) -> bool {
        self.tables.iter().all(|t| t.rows.is_empty())
    }
}

impl BatchRequest for BatchWriteRowRequest {
    const ACTION: &'static str = "BatchWriteRow";
    const IDEMPOTENT: bool = false;

    fn validate(&self) -> Result<(), ClientError> {
        unique_tables(Self::ACTION, self.tables.iter().map(|t| t.table_name.as_str()))
    }

    fn row_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for table in &self.tables {
            *counts.entry(table.table_name.clone()).or_default() += table.rows.len();
        }
        counts
    }

    fn retain_failed<R>(&self, merged: &BatchResponse<R>) -> Self {
        let tables = self
            .tables
            .iter()
            .filter_map(|table| {
                let results = merged.table(&table.table_name)?;
                let rows = keep_failed(&table.rows, results);
                (!rows.is_empty()).then(|| TableWriteRows {
                    table_name: table.table_name.clone(),
                    rows,
                })
            })
            .collect();
        Self { tables }
    }

    fn encode(&self) -> Bytes {
        let request = protocol::BatchWriteRowRequest {
            tables: self
                .tables
                .iter()
                .map(|table| protocol::TableInBatchWriteRowRequest {
                    table_name: table.table_name.clone(),
                    rows: table
                        .rows
                        .iter()
                        .map(|row| protocol::RowInBatchWriteRowRequest {
                            r#type: protocol::OperationType::from(row.operation) as i32,
                            row_change: row.change.clone(),
                            return_row: row.return_row.then_some(true),
                        })
                        .collect(),
                })
                .collect(),
        };
        Bytes::from(request.encode_to_vec())
    }

    fn decode(
        body: &[u8],
        request_id: Option<String>,
    ) -> Result<BatchResponse<Option<Row>>, ClientError> {
        let response = protocol::BatchWriteRowResponse::decode(body)
            .map_err(|e| ClientError::Decode(format!("BatchWriteRowResponse: {e}")))?;
        Ok(from_tables(response.tables, request_id))
    }
}

fn unique_tables<'a>(
    action: &str,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), ClientError> {
    let mut seen = BTreeSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ClientError::Config(format!(
                "{action} lists table {name} more than once"
            )));
        }
    }
    Ok(())
}

/// Items whose result at the same index failed.
fn keep_failed<T: Clone, R>(items: &[T], results: &[RowResult<R>]) -> Vec<T> {
    results
        .iter()
        .filter(|result| !result.is_ok())
        .filter_map(|result| items.get(result.index).cloned())
        .collect()
}

fn from_tables(
    tables: Vec<protocol::TableInBatchResponse>,
    request_id: Option<String>,
) -> BatchResponse<Option<Row>> {
    let mut response = BatchResponse::new(request_id);
    for table in tables {
        let rows = table
            .rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| row_result(index, row))
            .collect();
        response.tables.insert(table.table_name, rows);
    }
    response
}

fn row_result(index: usize, row: protocol::RowInBatchResponse) -> RowResult<Option<Row>> {
    if row.is_ok {
        let consumed = row
            .consumed
            .and_then(|c| c.capacity_unit)
            .map(|cu| ConsumedCapacity {
                read: cu.read.unwrap_or(0),
                write: cu.write.unwrap_or(0),
            })
            .unwrap_or_default();
        let data = row.row.filter(|bytes| !bytes.is_empty());
        return RowResult::succeeded(index, data, consumed);
    }
    let error = match row.error {
        Some(err) => RowError::new(ErrorCode::from(err.code), err.message.unwrap_or_default()),
        None => RowError::new(
            ErrorCode::Other(String::new()),
            "row failed without error detail",
        ),
    };
    RowResult::failed(index, error)
}
