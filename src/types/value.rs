//! Caller-side argument values.
//!
//! `Value` is the closed set of kinds a caller may bind to a placeholder.
//! `NamedValue` carries a value together with its ordinal and optional name.

use crate::error::BindingError;
use crate::types::{Datetime, Decimal, Time};
use std::fmt;
use uuid::Uuid;

/// Scalar kind of a bound value, used for typed nulls and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Int,
    UInt,
    Float,
    String,
    Bytes,
    Uuid,
    Datetime,
    Time,
    Decimal,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::UInt => "uint",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Bytes => "bytes",
            ValueKind::Uuid => "uuid",
            ValueKind::Datetime => "datetime",
            ValueKind::Time => "time",
            ValueKind::Decimal => "decimal",
        };
        f.write_str(name)
    }
}

/// A value supplied by the caller for one placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Untyped NULL
    Null,
    /// Boolean value
    Bool(bool),
    /// Signed integer of any width
    Int(i64),
    /// Unsigned integer of any width
    UInt(u64),
    /// 64-bit float
    Float(f64),
    /// Text value
    String(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// UUID, sent as the engine's UUID extension
    Uuid(Uuid),
    /// Engine-native datetime
    Datetime(Datetime),
    /// Wrapper time with a textual round trip
    Time(Time),
    /// Fixed-point decimal
    Decimal(Decimal),
    /// Nullable value of a declared kind
    Nullable(ValueKind, Option<Box<Value>>),
    /// Array of primitive values
    Array(Vec<Value>),
}

impl Value {
    /// Typed NULL of the given kind.
    pub fn null_of(kind: ValueKind) -> Self {
        Value::Nullable(kind, None)
    }

    /// Build an array value from anything convertible into values.
    pub fn array<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::Array(items.into_iter().map(Into::into).collect())
    }

    /// Scalar kind of this value, `None` for `Null`, nullable wrappers and arrays.
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Bool(_) => Some(ValueKind::Bool),
            Value::Int(_) => Some(ValueKind::Int),
            Value::UInt(_) => Some(ValueKind::UInt),
            Value::Float(_) => Some(ValueKind::Float),
            Value::String(_) => Some(ValueKind::String),
            Value::Bytes(_) => Some(ValueKind::Bytes),
            Value::Uuid(_) => Some(ValueKind::Uuid),
            Value::Datetime(_) => Some(ValueKind::Datetime),
            Value::Time(_) => Some(ValueKind::Time),
            Value::Decimal(_) => Some(ValueKind::Decimal),
            Value::Null | Value::Nullable(..) | Value::Array(_) => None,
        }
    }

    /// Kind after looking through one level of nullable wrapper.
    ///
    /// A typed NULL reports its declared kind.
    pub fn semantic_kind(&self) -> Option<ValueKind> {
        match self {
            Value::Nullable(kind, _) => Some(*kind),
            other => other.kind(),
        }
    }

    /// Human-readable description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Nullable(kind, _) => format!("nullable {}", kind),
            Value::Array(items) => match items.first() {
                Some(first) => format!("array of {}", first.describe()),
                None => "empty array".to_string(),
            },
            other => other
                .kind()
                .map(|k| k.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }
}

/// Check that a value can be sent to the engine.
///
/// Scalars and typed nulls are always accepted. A nullable wrapper must hold
/// a scalar of its declared kind. Arrays may only hold primitive kinds and
/// wrapper times, bare or nullable, and NULL elements; nested arrays are
/// rejected.
pub fn check_value(value: &Value) -> Result<(), BindingError> {
    match value {
        Value::Nullable(kind, Some(inner)) => match inner.kind() {
            Some(found) if found == *kind => Ok(()),
            _ => Err(BindingError::UnsupportedValueType {
                kind: format!("nullable {} holding {}", kind, inner.describe()),
            }),
        },
        Value::Array(items) => {
            for item in items {
                if matches!(item, Value::Null) {
                    continue;
                }
                let allowed = match item.semantic_kind() {
                    Some(ValueKind::Bytes) => matches!(item, Value::Bytes(_)),
                    Some(
                        ValueKind::Bool
                        | ValueKind::Int
                        | ValueKind::UInt
                        | ValueKind::Float
                        | ValueKind::String
                        | ValueKind::Time,
                    ) => true,
                    _ => false,
                };
                if !allowed {
                    return Err(BindingError::UnsupportedValueType {
                        kind: format!("array of {}", item.describe()),
                    });
                }
                check_value(item)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Scalar types with a fixed [`ValueKind`].
///
/// Lets `None` of such a type become a typed NULL that still carries its
/// kind, so a missing UUID or time keeps its cast.
pub trait ScalarKind {
    const KIND: ValueKind;
}

macro_rules! scalar_kind {
    ($kind:ident; $($t:ty),+) => {
        $(
            impl ScalarKind for $t {
                const KIND: ValueKind = ValueKind::$kind;
            }
        )+
    };
}

scalar_kind!(Bool; bool);
scalar_kind!(Int; i8, i16, i32, i64, isize);
scalar_kind!(UInt; u8, u16, u32, u64, usize);
scalar_kind!(Float; f32, f64);
scalar_kind!(String; String, &str);
scalar_kind!(Bytes; Vec<u8>, &[u8]);
scalar_kind!(Uuid; Uuid);
scalar_kind!(Datetime; Datetime);
scalar_kind!(Time; Time);
scalar_kind!(Decimal; Decimal);

macro_rules! value_from {
    ($variant:ident, $cast:ty; $($t:ty),+) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::$variant(value as $cast)
                }
            }
        )+
    };
}

value_from!(Int, i64; i8, i16, i32, i64, isize);
value_from!(UInt, u64; u8, u16, u32, u64, usize);
value_from!(Float, f64; f32, f64);

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(value.to_vec())
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Value::Uuid(value)
    }
}

impl From<Datetime> for Value {
    fn from(value: Datetime) -> Self {
        Value::Datetime(value)
    }
}

impl From<Time> for Value {
    fn from(value: Time) -> Self {
        Value::Time(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Decimal(value)
    }
}

impl<T: Into<Value> + ScalarKind> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        Value::Nullable(T::KIND, value.map(|inner| Box::new(inner.into())))
    }
}

/// A caller argument with its resolution metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedValue {
    /// 1-based declared position
    pub ordinal: usize,
    /// Name for `:name` placeholders
    pub name: Option<String>,
    /// Bound value
    pub value: Value,
}

impl NamedValue {
    /// Create an unnamed argument.
    pub fn positional(ordinal: usize, value: impl Into<Value>) -> Self {
        Self {
            ordinal,
            name: None,
            value: value.into(),
        }
    }

    /// Create a named argument. An empty name makes the argument unnamed.
    pub fn named(ordinal: usize, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        Self {
            ordinal,
            name: if name.is_empty() { None } else { Some(name) },
            value: value.into(),
        }
    }

    /// Argument name, `None` for positional arguments.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Turn a list of values into positional arguments with ordinals `1..=n`.
pub fn positional_args<I, T>(values: I) -> Vec<NamedValue>
where
    I: IntoIterator<Item = T>,
    T: Into<Value>,
{
    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| NamedValue::positional(i + 1, v))
        .collect()
}
