//! Result rows and execution summaries.
//!
//! [`Rows`] is a forward-only cursor over the tuples returned by one
//! statement execution. Each msgpack value is projected into a [`CellValue`]
//! on read.
//!
//! # Example
//!
//! ```no_run
//! use tntsql::query::Rows;
//! use tntsql::types::CellValue;
//!
//! # fn example(mut rows: Rows) -> Result<(), Box<dyn std::error::Error>> {
//! let mut row = vec![CellValue::Null; rows.columns().len()];
//! while rows.next(&mut row)? {
//!     println!("{}", row[0]);
//! }
//! rows.close();
//! # Ok(())
//! # }
//! ```

use crate::error::{ConversionError, QueryError};
use crate::transport::protocol::{ColumnMetadata, ExecuteResponse, SqlInfo};
use crate::types::{
    CellValue, Datetime, Decimal, Time, DATETIME_EXT_TYPE, DECIMAL_EXT_TYPE, UUID_EXT_TYPE,
};
use rmpv::Value as MpValue;
use std::collections::VecDeque;
use uuid::Uuid;

/// How datetime extension values are presented to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatetimeMode {
    /// `CellValue::Datetime`
    #[default]
    Native,
    /// RFC 3339 text in a `CellValue::String`
    Text,
}

impl DatetimeMode {
    /// Parse a mode name as used in connection strings.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "native" | "datetime" => Some(DatetimeMode::Native),
            "text" | "string" => Some(DatetimeMode::Text),
            _ => None,
        }
    }
}

/// Decode one msgpack value of column `column` into a cell.
///
/// # Errors
///
/// Binary, array, map and unknown extension values have no cell mapping and
/// yield `ConversionError::UnhandledKind`.
pub fn project_value(
    column: usize,
    value: &MpValue,
    mode: DatetimeMode,
) -> Result<CellValue, ConversionError> {
    let unhandled = |kind: String| ConversionError::UnhandledKind { column, kind };

    match value {
        MpValue::Nil => Ok(CellValue::Null),
        MpValue::Boolean(b) => Ok(CellValue::Bool(*b)),
        // The engine sends every non-negative integer with a uint marker.
        MpValue::Integer(i) => match (i.as_u64(), i.as_i64()) {
            (Some(v), _) => Ok(CellValue::UInt(v)),
            (None, Some(v)) => Ok(CellValue::Int(v)),
            (None, None) => Err(unhandled("integer".to_string())),
        },
        MpValue::F32(f) => Ok(CellValue::Float(f64::from(*f))),
        MpValue::F64(f) => Ok(CellValue::Float(*f)),
        MpValue::String(s) => s
            .as_str()
            .map(|s| CellValue::String(s.to_string()))
            .ok_or(ConversionError::InvalidUtf8 { column }),
        MpValue::Ext(UUID_EXT_TYPE, data) => {
            let id = Uuid::from_slice(data).map_err(|e| ConversionError::InvalidExtension {
                type_id: UUID_EXT_TYPE,
                message: e.to_string(),
            })?;
            Ok(CellValue::String(id.hyphenated().to_string()))
        }
        MpValue::Ext(DATETIME_EXT_TYPE, data) => {
            let datetime = Datetime::from_ext_bytes(data)?;
            Ok(match mode {
                DatetimeMode::Native => CellValue::Datetime(datetime),
                DatetimeMode::Text => CellValue::String(Time::new(datetime).to_string()),
            })
        }
        MpValue::Ext(DECIMAL_EXT_TYPE, data) => {
            Decimal::from_ext_bytes(data).map(CellValue::Decimal)
        }
        MpValue::Ext(type_id, _) => Err(unhandled(format!("ext({})", type_id))),
        MpValue::Binary(_) => Err(unhandled("binary".to_string())),
        MpValue::Array(_) => Err(unhandled("array".to_string())),
        MpValue::Map(_) => Err(unhandled("map".to_string())),
    }
}

/// Forward-only cursor over a result set.
#[derive(Debug, Clone)]
pub struct Rows {
    metadata: Vec<ColumnMetadata>,
    columns: Vec<String>,
    tuples: VecDeque<Vec<MpValue>>,
    datetime_mode: DatetimeMode,
    closed: bool,
}

impl Rows {
    /// Create a cursor over decoded tuples.
    pub fn new(metadata: Vec<ColumnMetadata>, tuples: Vec<Vec<MpValue>>) -> Self {
        let columns = metadata.iter().map(|m| m.field_name.clone()).collect();
        Self {
            metadata,
            columns,
            tuples: tuples.into(),
            datetime_mode: DatetimeMode::default(),
            closed: false,
        }
    }

    pub(crate) fn from_response(response: ExecuteResponse, mode: DatetimeMode) -> Self {
        Self::new(response.columns, response.tuples).with_datetime_mode(mode)
    }

    /// Set how datetime values are presented.
    pub fn with_datetime_mode(mut self, mode: DatetimeMode) -> Self {
        self.datetime_mode = mode;
        self
    }

    /// Column names in result order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Full column metadata.
    pub fn column_metadata(&self) -> &[ColumnMetadata] {
        &self.metadata
    }

    /// Number of unread tuples.
    pub fn remaining(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Read the next tuple into `dest`.
    ///
    /// Returns `Ok(false)` once all tuples were read. The tuple is consumed
    /// even when one of its values fails to decode.
    ///
    /// # Errors
    ///
    /// `QueryError::RowsClosed` after [`close`](Self::close), or a
    /// conversion error when `dest` is too short or a value has no mapping.
    pub fn next(&mut self, dest: &mut [CellValue]) -> Result<bool, QueryError> {
        if self.closed {
            return Err(QueryError::RowsClosed);
        }
        let tuple = match self.tuples.pop_front() {
            Some(tuple) => tuple,
            None => return Ok(false),
        };
        if dest.len() < tuple.len() {
            return Err(ConversionError::DestinationTooSmall {
                slots: dest.len(),
                values: tuple.len(),
            }
            .into());
        }

        for (column, (slot, value)) in dest.iter_mut().zip(tuple.iter()).enumerate() {
            *slot = project_value(column, value, self.datetime_mode)?;
        }
        Ok(true)
    }

    /// Read the next tuple as an owned row.
    pub fn next_row(&mut self) -> Result<Option<Vec<CellValue>>, QueryError> {
        if self.closed {
            return Err(QueryError::RowsClosed);
        }
        let width = self.tuples.front().map(Vec::len).unwrap_or(0);
        let mut row = vec![CellValue::Null; width];
        match self.next(&mut row)? {
            true => Ok(Some(row)),
            false => Ok(None),
        }
    }

    /// Read all remaining rows.
    pub fn collect_rows(&mut self) -> Result<Vec<Vec<CellValue>>, QueryError> {
        let mut rows = Vec::with_capacity(self.remaining());
        while let Some(row) = self.next_row()? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Discard unread tuples. Safe to call more than once.
    pub fn close(&mut self) {
        self.tuples.clear();
        self.closed = true;
    }
}

/// Summary of a statement that does not return rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecResult {
    rows_affected: u64,
    last_insert_id: i64,
}

impl ExecResult {
    pub fn new(rows_affected: u64, last_insert_id: i64) -> Self {
        Self {
            rows_affected,
            last_insert_id,
        }
    }

    /// Build from the engine's SQL info block.
    pub fn from_sql_info(info: Option<&SqlInfo>) -> Self {
        match info {
            Some(info) => Self::new(
                info.row_count,
                info.autoincrement_ids.last().copied().unwrap_or(0),
            ),
            None => Self::default(),
        }
    }

    /// Number of rows changed by the statement.
    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    /// Last generated autoincrement id, 0 if none.
    pub fn last_insert_id(&self) -> i64 {
        self.last_insert_id
    }
}
