//! Value types exchanged with the engine.
//!
//! Caller arguments are [`Value`]s, decoded result cells are [`CellValue`]s.
//! The engine's extended kinds (datetime, decimal, UUID) travel as msgpack
//! extensions.

mod cell;
mod datetime;
mod decimal;
mod value;

pub use cell::{CellValue, FromCell};
pub use datetime::{Datetime, Time, DATETIME_EXT_TYPE};
pub use decimal::{Decimal, DECIMAL_EXT_TYPE};
pub use value::{check_value, positional_args, NamedValue, ScalarKind, Value, ValueKind};

/// Msgpack extension id of the UUID type.
pub const UUID_EXT_TYPE: i8 = 2;
