//! Fixed-point decimal matching the engine's decimal extension.

use crate::error::ConversionError;
use crate::types::cell::{CellValue, FromCell};
use std::fmt;
use std::str::FromStr;

/// Msgpack extension id of the decimal type.
pub const DECIMAL_EXT_TYPE: i8 = 1;

/// Maximum number of significant digits the engine stores.
pub const MAX_PRECISION: u32 = 38;

const SIGN_POSITIVE: u8 = 0x0c;
const SIGN_NEGATIVE: u8 = 0x0d;

/// Decimal number stored as `mantissa * 10^-scale`.
///
/// Equality is structural: `1.0` and `1.00` differ in scale and compare unequal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Decimal {
    mantissa: i128,
    scale: u32,
}

fn invalid_ext(message: impl Into<String>) -> ConversionError {
    ConversionError::InvalidExtension {
        type_id: DECIMAL_EXT_TYPE,
        message: message.into(),
    }
}

fn digit_count(value: u128) -> u32 {
    if value == 0 {
        1
    } else {
        value.ilog10() + 1
    }
}

impl Decimal {
    /// Create a decimal from a mantissa and scale.
    pub fn new(mantissa: i128, scale: u32) -> Result<Self, ConversionError> {
        if scale > MAX_PRECISION {
            return Err(ConversionError::InvalidFormat(format!(
                "decimal scale {} exceeds {}",
                scale, MAX_PRECISION
            )));
        }
        if digit_count(mantissa.unsigned_abs()) > MAX_PRECISION {
            return Err(ConversionError::InvalidFormat(format!(
                "decimal {} exceeds {} digits",
                mantissa, MAX_PRECISION
            )));
        }
        Ok(Self { mantissa, scale })
    }

    /// Unscaled integer value.
    pub fn mantissa(&self) -> i128 {
        self.mantissa
    }

    /// Number of digits after the decimal point.
    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn is_negative(&self) -> bool {
        self.mantissa < 0
    }

    /// Lossy conversion to a float.
    pub fn to_f64(&self) -> f64 {
        self.mantissa as f64 / 10f64.powi(self.scale as i32)
    }

    /// Encode the extension payload: msgpack scale then packed BCD with a sign nibble.
    pub fn to_ext_bytes(&self) -> Result<Vec<u8>, ConversionError> {
        let mut buf = Vec::with_capacity(21);
        rmp::encode::write_sint(&mut buf, i64::from(self.scale))
            .map_err(|e| invalid_ext(e.to_string()))?;

        let digits = self.mantissa.unsigned_abs().to_string();
        let mut nibbles: Vec<u8> = Vec::with_capacity(digits.len() + 2);
        if digits.len() % 2 == 0 {
            nibbles.push(0);
        }
        nibbles.extend(digits.bytes().map(|b| b - b'0'));
        nibbles.push(if self.mantissa < 0 {
            SIGN_NEGATIVE
        } else {
            SIGN_POSITIVE
        });

        buf.extend(nibbles.chunks(2).map(|pair| (pair[0] << 4) | pair[1]));
        Ok(buf)
    }

    /// Decode an extension payload.
    pub fn from_ext_bytes(data: &[u8]) -> Result<Self, ConversionError> {
        let mut cursor = data;
        let scale: i64 = rmp::decode::read_int(&mut cursor)
            .map_err(|e| invalid_ext(format!("bad scale: {}", e)))?;
        if cursor.is_empty() {
            return Err(invalid_ext("missing digits"));
        }

        let last = cursor.len() - 1;
        let mut mantissa: i128 = 0;
        let mut negative = false;
        for (i, byte) in cursor.iter().enumerate() {
            let high = byte >> 4;
            let low = byte & 0x0f;
            let pair = [high, low];
            let count = if i == last {
                negative = match low {
                    0x0b | 0x0d => true,
                    0x0a | 0x0c | 0x0e | 0x0f => false,
                    other => return Err(invalid_ext(format!("bad sign nibble {:#x}", other))),
                };
                1
            } else {
                2
            };
            for digit in &pair[..count] {
                if *digit > 9 {
                    return Err(invalid_ext(format!("bad digit nibble {:#x}", digit)));
                }
                mantissa = mantissa
                    .checked_mul(10)
                    .and_then(|m| m.checked_add(i128::from(*digit)))
                    .ok_or_else(|| invalid_ext("too many digits"))?;
            }
        }
        if negative {
            mantissa = -mantissa;
        }

        // A negative scale means trailing zeros were dropped.
        if scale < 0 {
            let exponent = u32::try_from(-scale).map_err(|_| invalid_ext("scale out of range"))?;
            let factor = 10i128
                .checked_pow(exponent)
                .ok_or_else(|| invalid_ext("scale out of range"))?;
            mantissa = mantissa
                .checked_mul(factor)
                .ok_or_else(|| invalid_ext("scale out of range"))?;
            return Self::new(mantissa, 0).map_err(|e| invalid_ext(e.to_string()));
        }

        let scale = u32::try_from(scale).map_err(|_| invalid_ext("scale out of range"))?;
        Self::new(mantissa, scale).map_err(|e| invalid_ext(e.to_string()))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.mantissa.unsigned_abs().to_string();
        let sign = if self.mantissa < 0 { "-" } else { "" };
        let scale = self.scale as usize;
        if scale == 0 {
            return write!(f, "{}{}", sign, digits);
        }
        if digits.len() > scale {
            let (int_part, frac_part) = digits.split_at(digits.len() - scale);
            write!(f, "{}{}.{}", sign, int_part, frac_part)
        } else {
            write!(f, "{}0.{}{}", sign, "0".repeat(scale - digits.len()), digits)
        }
    }
}

impl FromStr for Decimal {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConversionError::InvalidFormat(format!("invalid decimal '{}'", s));
        let trimmed = s.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((i, f)) => (i, f),
            None => (unsigned, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part
            .bytes()
            .chain(frac_part.bytes())
            .all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let mut mantissa: i128 = 0;
        for b in int_part.bytes().chain(frac_part.bytes()) {
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add(i128::from(b - b'0')))
                .ok_or_else(invalid)?;
        }
        if negative {
            mantissa = -mantissa;
        }

        let scale = u32::try_from(frac_part.len()).map_err(|_| invalid())?;
        Decimal::new(mantissa, scale)
    }
}

impl FromCell for Decimal {
    fn from_cell(cell: &CellValue) -> Result<Self, ConversionError> {
        match cell {
            CellValue::Decimal(d) => Ok(*d),
            CellValue::Int(i) => Decimal::new(i128::from(*i), 0),
            CellValue::UInt(u) => Decimal::new(i128::from(*u), 0),
            CellValue::String(s) => s.parse(),
            other => Err(ConversionError::TypeMismatch {
                expected: "Decimal",
                found: other.kind_name().to_string(),
            }),
        }
    }
}
