//! Conversion of caller arguments into wire values.

use crate::error::BindingError;
use crate::types::{NamedValue, Value, UUID_EXT_TYPE};
use rmpv::Value as MpValue;

/// Argument in the form sent to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    /// Bound to the next `?`
    Positional(MpValue),
    /// Bound to `:key`
    Named { key: String, value: MpValue },
}

impl WireValue {
    /// Msgpack representation inside the bind array.
    ///
    /// Named arguments become a one-entry map `{":key": value}`.
    pub fn into_msgpack(self) -> MpValue {
        match self {
            WireValue::Positional(value) => value,
            WireValue::Named { key, value } => {
                MpValue::Map(vec![(MpValue::from(format!(":{}", key)), value)])
            }
        }
    }
}

/// Convert one caller value.
///
/// Datetimes and wrapper times become RFC 3339 text, UUIDs and decimals use
/// the engine's extension types, everything else maps directly.
pub fn convert_value(value: &Value) -> Result<MpValue, BindingError> {
    let converted = match value {
        Value::Null | Value::Nullable(_, None) => MpValue::Nil,
        Value::Bool(b) => MpValue::Boolean(*b),
        Value::Int(i) => MpValue::from(*i),
        Value::UInt(u) => MpValue::from(*u),
        Value::Float(f) => MpValue::F64(*f),
        Value::String(s) => MpValue::from(s.as_str()),
        Value::Bytes(b) => MpValue::Binary(b.clone()),
        Value::Uuid(id) => MpValue::Ext(UUID_EXT_TYPE, id.as_bytes().to_vec()),
        Value::Datetime(dt) => MpValue::from(dt.to_rfc3339()),
        Value::Time(t) => MpValue::from(t.to_string()),
        Value::Decimal(d) => {
            let payload = d
                .to_ext_bytes()
                .map_err(|e| BindingError::UnsupportedValueType {
                    kind: format!("decimal {}: {}", d, e),
                })?;
            MpValue::Ext(crate::types::DECIMAL_EXT_TYPE, payload)
        }
        Value::Nullable(_, Some(inner)) => convert_value(inner)?,
        Value::Array(items) => MpValue::Array(
            items
                .iter()
                .map(convert_value)
                .collect::<Result<Vec<_>, _>>()?,
        ),
    };
    Ok(converted)
}

/// Build the wire argument list. Slot `i` holds the argument with ordinal `i + 1`.
///
/// # Errors
///
/// Returns `InvalidOrdinal` when an ordinal is outside `1..=args.len()` or
/// appears twice.
pub fn marshal(args: &[NamedValue]) -> Result<Vec<WireValue>, BindingError> {
    let count = args.len();
    let mut slots: Vec<Option<WireValue>> = vec![None; count];

    for arg in args {
        let invalid = || BindingError::InvalidOrdinal {
            ordinal: arg.ordinal,
            count,
        };
        let slot = arg
            .ordinal
            .checked_sub(1)
            .filter(|index| *index < count)
            .ok_or_else(invalid)?;
        if slots[slot].is_some() {
            return Err(invalid());
        }

        let value = convert_value(&arg.value)?;
        slots[slot] = Some(match arg.name() {
            Some(name) => WireValue::Named {
                key: name.to_string(),
                value,
            },
            None => WireValue::Positional(value),
        });
    }

    // Every slot is filled: `count` distinct ordinals in `1..=count`.
    Ok(slots.into_iter().flatten().collect())
}
