//! Result cell values and typed extraction.

use crate::error::ConversionError;
use crate::types::{Datetime, Decimal};
use std::fmt;
use uuid::Uuid;

/// One decoded value of a result row.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Null,
    String(String),
    Bool(bool),
    Float(f64),
    Int(i64),
    UInt(u64),
    Datetime(Datetime),
    Decimal(Decimal),
}

impl CellValue {
    /// Short name of the variant, used in conversion errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            CellValue::Null => "null",
            CellValue::String(_) => "string",
            CellValue::Bool(_) => "bool",
            CellValue::Float(_) => "float",
            CellValue::Int(_) => "int",
            CellValue::UInt(_) => "uint",
            CellValue::Datetime(_) => "datetime",
            CellValue::Decimal(_) => "decimal",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Convert into a Rust type.
    pub fn get<T: FromCell>(&self) -> Result<T, ConversionError> {
        T::from_cell(self)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, "NULL"),
            CellValue::String(s) => write!(f, "{}", s),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Int(v) => write!(f, "{}", v),
            CellValue::UInt(v) => write!(f, "{}", v),
            CellValue::Datetime(d) => write!(f, "{}", d),
            CellValue::Decimal(d) => write!(f, "{}", d),
        }
    }
}

/// Extract a Rust value from a result cell.
pub trait FromCell: Sized {
    fn from_cell(cell: &CellValue) -> Result<Self, ConversionError>;
}

fn mismatch(expected: &'static str, cell: &CellValue) -> ConversionError {
    ConversionError::TypeMismatch {
        expected,
        found: cell.kind_name().to_string(),
    }
}

impl FromCell for CellValue {
    fn from_cell(cell: &CellValue) -> Result<Self, ConversionError> {
        Ok(cell.clone())
    }
}

impl FromCell for String {
    fn from_cell(cell: &CellValue) -> Result<Self, ConversionError> {
        match cell {
            CellValue::String(s) => Ok(s.clone()),
            other => Err(mismatch("String", other)),
        }
    }
}

impl FromCell for bool {
    fn from_cell(cell: &CellValue) -> Result<Self, ConversionError> {
        match cell {
            CellValue::Bool(b) => Ok(*b),
            other => Err(mismatch("bool", other)),
        }
    }
}

impl FromCell for i64 {
    fn from_cell(cell: &CellValue) -> Result<Self, ConversionError> {
        match cell {
            CellValue::Int(v) => Ok(*v),
            CellValue::UInt(v) => i64::try_from(*v).map_err(|_| mismatch("i64", cell)),
            other => Err(mismatch("i64", other)),
        }
    }
}

impl FromCell for u64 {
    fn from_cell(cell: &CellValue) -> Result<Self, ConversionError> {
        match cell {
            CellValue::UInt(v) => Ok(*v),
            CellValue::Int(v) => u64::try_from(*v).map_err(|_| mismatch("u64", cell)),
            other => Err(mismatch("u64", other)),
        }
    }
}

impl FromCell for f64 {
    fn from_cell(cell: &CellValue) -> Result<Self, ConversionError> {
        match cell {
            CellValue::Float(v) => Ok(*v),
            CellValue::Int(v) => Ok(*v as f64),
            CellValue::UInt(v) => Ok(*v as f64),
            CellValue::Decimal(d) => Ok(d.to_f64()),
            other => Err(mismatch("f64", other)),
        }
    }
}

impl FromCell for Uuid {
    fn from_cell(cell: &CellValue) -> Result<Self, ConversionError> {
        match cell {
            CellValue::String(s) => Uuid::parse_str(s)
                .map_err(|e| ConversionError::InvalidFormat(format!("invalid uuid '{}': {}", s, e))),
            other => Err(mismatch("Uuid", other)),
        }
    }
}

impl<T: FromCell> FromCell for Option<T> {
    fn from_cell(cell: &CellValue) -> Result<Self, ConversionError> {
        match cell {
            CellValue::Null => Ok(None),
            other => T::from_cell(other).map(Some),
        }
    }
}
