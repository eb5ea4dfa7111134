//! Engine datetime and the wrapper time type.
//!
//! `Datetime` mirrors the engine's datetime extension (UTC seconds,
//! nanoseconds, a minute offset and a timezone index). `Time` wraps it and
//! adds the textual RFC 3339 round trip used when binding and scanning.

use crate::error::ConversionError;
use crate::types::cell::{CellValue, FromCell};
use chrono::{DateTime, FixedOffset, Local, SecondsFormat, TimeZone, Utc};
use std::fmt;
use std::str::FromStr;

/// Smallest number of seconds the engine accepts.
pub const MIN_SECONDS: i64 = -185_604_722_870;
/// Largest number of seconds the engine accepts.
pub const MAX_SECONDS: i64 = 185_480_451_417;
/// Offset bounds in minutes.
const MIN_OFFSET_MINUTES: i32 = -12 * 60;
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Msgpack extension id of the datetime type.
pub const DATETIME_EXT_TYPE: i8 = 4;

/// Datetime value as stored by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Datetime {
    inner: DateTime<FixedOffset>,
    tz_index: i16,
}

impl Datetime {
    /// Create a datetime from a chrono value, validating the engine's range.
    pub fn new<Tz: TimeZone>(value: DateTime<Tz>) -> Result<Self, ConversionError> {
        let inner = value.fixed_offset();
        let seconds = inner.timestamp();
        if !(MIN_SECONDS..=MAX_SECONDS).contains(&seconds) {
            return Err(ConversionError::InvalidFormat(format!(
                "seconds {} out of range [{}, {}]",
                seconds, MIN_SECONDS, MAX_SECONDS
            )));
        }

        let offset_seconds = inner.offset().local_minus_utc();
        if offset_seconds % 60 != 0 {
            return Err(ConversionError::InvalidFormat(format!(
                "offset {}s is not a whole number of minutes",
                offset_seconds
            )));
        }
        let offset_minutes = offset_seconds / 60;
        if !(MIN_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&offset_minutes) {
            return Err(ConversionError::InvalidFormat(format!(
                "offset {} minutes out of range",
                offset_minutes
            )));
        }

        Ok(Self { inner, tz_index: 0 })
    }

    /// Build from the raw extension fields.
    pub fn from_parts(
        seconds: i64,
        nanoseconds: i32,
        tz_offset_minutes: i16,
        tz_index: i16,
    ) -> Result<Self, ConversionError> {
        let nanos = u32::try_from(nanoseconds)
            .ok()
            .filter(|n| *n < 1_000_000_000)
            .ok_or_else(|| {
                ConversionError::InvalidFormat(format!("invalid nanoseconds {}", nanoseconds))
            })?;
        let offset = FixedOffset::east_opt(i32::from(tz_offset_minutes) * 60).ok_or_else(|| {
            ConversionError::InvalidFormat(format!("invalid offset {}", tz_offset_minutes))
        })?;
        let utc = DateTime::<Utc>::from_timestamp(seconds, nanos).ok_or_else(|| {
            ConversionError::InvalidFormat(format!("seconds {} out of range", seconds))
        })?;

        let mut datetime = Self::new(utc.with_timezone(&offset))?;
        datetime.tz_index = tz_index;
        Ok(datetime)
    }

    /// Seconds since the Unix epoch, UTC.
    pub fn seconds(&self) -> i64 {
        self.inner.timestamp()
    }

    /// Sub-second part in nanoseconds.
    pub fn nanoseconds(&self) -> i32 {
        // Always below 2e9, so it fits.
        self.inner.timestamp_subsec_nanos() as i32
    }

    /// Timezone offset in minutes east of UTC.
    pub fn tz_offset_minutes(&self) -> i16 {
        (self.inner.offset().local_minus_utc() / 60) as i16
    }

    /// Engine timezone index, 0 when only an offset is known.
    pub fn tz_index(&self) -> i16 {
        self.tz_index
    }

    /// Convert to a chrono datetime in the stored offset.
    pub fn to_chrono(&self) -> DateTime<FixedOffset> {
        self.inner
    }

    /// RFC 3339 text with nanoseconds, `Z` for UTC.
    pub fn to_rfc3339(&self) -> String {
        self.inner.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    /// Encode the extension payload.
    ///
    /// The payload is 8 bytes when only seconds are set and 16 bytes otherwise.
    pub fn to_ext_bytes(&self) -> Vec<u8> {
        let nanoseconds = self.nanoseconds();
        let tz_offset = self.tz_offset_minutes();

        let mut buf = Vec::with_capacity(16);
        buf.extend_from_slice(&self.seconds().to_le_bytes());
        if nanoseconds != 0 || tz_offset != 0 || self.tz_index != 0 {
            buf.extend_from_slice(&nanoseconds.to_le_bytes());
            buf.extend_from_slice(&tz_offset.to_le_bytes());
            buf.extend_from_slice(&self.tz_index.to_le_bytes());
        }
        buf
    }

    /// Decode an extension payload.
    pub fn from_ext_bytes(data: &[u8]) -> Result<Self, ConversionError> {
        let invalid = |message: String| ConversionError::InvalidExtension {
            type_id: DATETIME_EXT_TYPE,
            message,
        };

        match data.len() {
            8 | 16 => {}
            n => return Err(invalid(format!("unexpected payload length {}", n))),
        }

        let mut seconds = [0u8; 8];
        seconds.copy_from_slice(&data[0..8]);
        let seconds = i64::from_le_bytes(seconds);

        let (nanoseconds, tz_offset, tz_index) = if data.len() == 16 {
            let mut nsec = [0u8; 4];
            nsec.copy_from_slice(&data[8..12]);
            let mut offset = [0u8; 2];
            offset.copy_from_slice(&data[12..14]);
            let mut index = [0u8; 2];
            index.copy_from_slice(&data[14..16]);
            (
                i32::from_le_bytes(nsec),
                i16::from_le_bytes(offset),
                i16::from_le_bytes(index),
            )
        } else {
            (0, 0, 0)
        };

        Self::from_parts(seconds, nanoseconds, tz_offset, tz_index)
            .map_err(|e| invalid(e.to_string()))
    }
}

impl fmt::Display for Datetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl TryFrom<DateTime<FixedOffset>> for Datetime {
    type Error = ConversionError;

    fn try_from(value: DateTime<FixedOffset>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<DateTime<Utc>> for Datetime {
    type Error = ConversionError;

    fn try_from(value: DateTime<Utc>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Default for Datetime {
    fn default() -> Self {
        Self {
            inner: DateTime::<Utc>::UNIX_EPOCH.fixed_offset(),
            tz_index: 0,
        }
    }
}

/// Wrapper time that travels as RFC 3339 text.
///
/// Bound `Time` values are sent as text and cast to DATETIME in the query.
/// Scanning accepts nil, RFC 3339 text or an engine datetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Time(Datetime);

impl Time {
    /// Wrap an engine datetime.
    pub fn new(datetime: Datetime) -> Self {
        Time(datetime)
    }

    /// Current local time.
    pub fn now() -> Result<Self, ConversionError> {
        let now = Local::now();
        let offset = *now.offset();
        Datetime::new(now.with_timezone(&offset)).map(Time)
    }

    /// Parse RFC 3339 text.
    pub fn parse(text: &str) -> Result<Self, ConversionError> {
        let parsed = DateTime::parse_from_rfc3339(text)
            .map_err(|e| ConversionError::InvalidFormat(format!("Scan: {}", e)))?;
        Datetime::new(parsed).map(Time)
    }

    /// The wrapped engine datetime.
    pub fn datetime(&self) -> Datetime {
        self.0
    }

    /// Convert to a chrono datetime.
    pub fn to_chrono(&self) -> DateTime<FixedOffset> {
        self.0.to_chrono()
    }

    /// Scan a result cell into this value.
    ///
    /// Nil and empty text leave the value unchanged.
    pub fn scan(&mut self, cell: &CellValue) -> Result<(), ConversionError> {
        match cell {
            CellValue::Null => Ok(()),
            CellValue::String(text) if text.is_empty() => Ok(()),
            CellValue::String(text) => {
                *self = Time::parse(text)?;
                Ok(())
            }
            CellValue::Datetime(datetime) => {
                *self = Time(*datetime);
                Ok(())
            }
            other => Err(ConversionError::TypeMismatch {
                expected: "Time",
                found: other.kind_name().to_string(),
            }),
        }
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339())
    }
}

impl FromStr for Time {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Time::parse(s)
    }
}

impl From<Datetime> for Time {
    fn from(value: Datetime) -> Self {
        Time(value)
    }
}

impl FromCell for Time {
    fn from_cell(cell: &CellValue) -> Result<Self, ConversionError> {
        let mut time = Time::default();
        time.scan(cell)?;
        Ok(time)
    }
}

impl FromCell for Datetime {
    fn from_cell(cell: &CellValue) -> Result<Self, ConversionError> {
        match cell {
            CellValue::Datetime(datetime) => Ok(*datetime),
            CellValue::String(text) => Time::parse(text).map(|t| t.datetime()),
            other => Err(ConversionError::TypeMismatch {
                expected: "Datetime",
                found: other.kind_name().to_string(),
            }),
        }
    }
}
