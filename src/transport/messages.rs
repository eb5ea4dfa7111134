//! IPROTO message types.
//!
//! Requests are framed as a msgpack `uint32` length followed by a header map
//! and a body map. Responses use the same layout; a response code with the
//! `0x8000` bit set carries an error message in the body.

use crate::error::TransportError;
use crate::query::WireValue;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rmpv::Value as MpValue;
use sha1::{Digest, Sha1};
use std::fmt;

/// Size of the server greeting in bytes.
pub const GREETING_SIZE: usize = 128;
/// Bytes of the length prefix: `0xce` marker and a big-endian `u32`.
pub const LENGTH_PREFIX_SIZE: usize = 5;
/// Largest response payload accepted from the server.
pub const MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;
/// Bytes of salt used by the CHAP-SHA1 scramble.
pub const SCRAMBLE_SIZE: usize = 20;
/// Authentication method sent with AUTH requests.
pub const AUTH_METHOD: &str = "chap-sha1";

const ERROR_FLAG: u32 = 0x8000;

/// Header and body map keys.
pub mod keys {
    pub const REQUEST_TYPE: u8 = 0x00;
    pub const SYNC: u8 = 0x01;
    pub const STREAM_ID: u8 = 0x0a;
    pub const TUPLE: u8 = 0x21;
    pub const USER_NAME: u8 = 0x23;
    pub const OPTIONS: u8 = 0x2b;
    pub const DATA: u8 = 0x30;
    pub const ERROR_24: u8 = 0x31;
    pub const METADATA: u8 = 0x32;
    pub const SQL_TEXT: u8 = 0x40;
    pub const SQL_BIND: u8 = 0x41;
    pub const SQL_INFO: u8 = 0x42;
    pub const TIMEOUT: u8 = 0x56;
    pub const TXN_ISOLATION: u8 = 0x59;

    pub const FIELD_NAME: u8 = 0x00;
    pub const FIELD_TYPE: u8 = 0x01;

    pub const SQL_INFO_ROW_COUNT: u8 = 0x00;
    pub const SQL_INFO_AUTOINCREMENT_IDS: u8 = 0x01;
}

/// Request codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RequestType {
    Auth = 7,
    Execute = 11,
    Begin = 14,
    Commit = 15,
    Rollback = 16,
    Ping = 64,
}

impl RequestType {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Identifier of an engine-side interactive transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamId(pub u64);

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transaction isolation level sent with BEGIN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationLevel {
    /// Engine default
    Default,
    ReadCommitted,
    ReadConfirmed,
    #[default]
    BestEffort,
}

impl IsolationLevel {
    /// Wire code of the level.
    pub fn code(self) -> u8 {
        match self {
            IsolationLevel::Default => 0,
            IsolationLevel::ReadCommitted => 1,
            IsolationLevel::ReadConfirmed => 2,
            IsolationLevel::BestEffort => 3,
        }
    }

    /// Parse a level name as used in connection strings.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "default" => Some(IsolationLevel::Default),
            "read_committed" => Some(IsolationLevel::ReadCommitted),
            "read_confirmed" => Some(IsolationLevel::ReadConfirmed),
            "best_effort" => Some(IsolationLevel::BestEffort),
            _ => None,
        }
    }
}

/// Server greeting sent right after the socket opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Greeting {
    /// First greeting line, e.g. `Tarantool 2.11.1 (Binary) <uuid>`
    pub version: String,
    /// Decoded authentication salt
    pub salt: Vec<u8>,
}

impl Greeting {
    /// Parse the 128-byte greeting.
    pub fn parse(data: &[u8]) -> Result<Self, TransportError> {
        if data.len() < GREETING_SIZE {
            return Err(TransportError::InvalidResponse(format!(
                "greeting is {} bytes, expected {}",
                data.len(),
                GREETING_SIZE
            )));
        }

        let version = String::from_utf8_lossy(&data[..64]).trim().to_string();
        if !version.starts_with("Tarantool") {
            return Err(TransportError::InvalidResponse(format!(
                "unexpected greeting '{}'",
                version
            )));
        }

        let salt_line = String::from_utf8_lossy(&data[64..GREETING_SIZE]);
        let encoded: String = salt_line.trim().chars().take(44).collect();
        let salt = STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| TransportError::InvalidResponse(format!("invalid salt: {}", e)))?;
        if salt.len() < SCRAMBLE_SIZE {
            return Err(TransportError::InvalidResponse(format!(
                "salt is {} bytes, expected at least {}",
                salt.len(),
                SCRAMBLE_SIZE
            )));
        }

        Ok(Self { version, salt })
    }
}

/// Information about an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// Server greeting line
    pub server_version: String,
    /// Authenticated user
    pub username: String,
}

/// CHAP-SHA1 scramble: `sha1(password) XOR sha1(salt ++ sha1(sha1(password)))`.
pub fn scramble(salt: &[u8], password: &str) -> [u8; SCRAMBLE_SIZE] {
    let hash1 = Sha1::digest(password.as_bytes());
    let hash2 = Sha1::digest(hash1);

    let mut hasher = Sha1::new();
    hasher.update(&salt[..SCRAMBLE_SIZE.min(salt.len())]);
    hasher.update(hash2);
    let hash3 = hasher.finalize();

    let mut out = [0u8; SCRAMBLE_SIZE];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = hash1[i] ^ hash3[i];
    }
    out
}

/// Column description from response metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    pub field_name: String,
    /// Engine type name such as `integer` or `string`
    pub field_type: Option<String>,
}

impl ColumnMetadata {
    pub fn new(field_name: impl Into<String>, field_type: Option<&str>) -> Self {
        Self {
            field_name: field_name.into(),
            field_type: field_type.map(str::to_string),
        }
    }
}

/// SQL info block of a data-changing statement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SqlInfo {
    pub row_count: u64,
    pub autoincrement_ids: Vec<i64>,
}

/// Decoded reply to an EXECUTE request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExecuteResponse {
    pub columns: Vec<ColumnMetadata>,
    pub tuples: Vec<Vec<MpValue>>,
    pub sql_info: Option<SqlInfo>,
    /// Error reported by the engine, `None` on success
    pub error: Option<String>,
}

impl ExecuteResponse {
    /// Response carrying only an engine error.
    pub fn engine_error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

fn encode_err(e: impl fmt::Display) -> TransportError {
    TransportError::EncodeError(e.to_string())
}

fn write_value(buf: &mut Vec<u8>, value: &MpValue) -> Result<(), TransportError> {
    rmpv::encode::write_value(buf, value).map_err(encode_err)
}

/// A request ready to be framed.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub request_type: RequestType,
    pub stream: Option<StreamId>,
    body: Vec<u8>,
}

impl Request {
    fn with_body(request_type: RequestType, body: &MpValue) -> Result<Self, TransportError> {
        let mut buf = Vec::new();
        write_value(&mut buf, body)?;
        Ok(Self {
            request_type,
            stream: None,
            body: buf,
        })
    }

    /// Route the request through a transaction stream.
    pub fn on_stream(mut self, stream: Option<StreamId>) -> Self {
        self.stream = stream;
        self
    }

    pub fn ping() -> Result<Self, TransportError> {
        Self::with_body(RequestType::Ping, &MpValue::Map(Vec::new()))
    }

    /// EXECUTE with SQL text and bound arguments.
    pub fn execute(sql: &str, args: Vec<WireValue>) -> Result<Self, TransportError> {
        let bind = args.into_iter().map(WireValue::into_msgpack).collect();
        let body = MpValue::Map(vec![
            (MpValue::from(keys::SQL_TEXT), MpValue::from(sql)),
            (MpValue::from(keys::SQL_BIND), MpValue::Array(bind)),
            (MpValue::from(keys::OPTIONS), MpValue::Array(Vec::new())),
        ]);
        Self::with_body(RequestType::Execute, &body)
    }

    /// AUTH with a CHAP-SHA1 scramble.
    ///
    /// The scramble is raw bytes written under a msgpack string header.
    pub fn auth(username: &str, scramble: &[u8]) -> Result<Self, TransportError> {
        let mut buf = Vec::new();
        rmp::encode::write_map_len(&mut buf, 2).map_err(encode_err)?;
        rmp::encode::write_uint(&mut buf, u64::from(keys::USER_NAME)).map_err(encode_err)?;
        rmp::encode::write_str(&mut buf, username).map_err(encode_err)?;
        rmp::encode::write_uint(&mut buf, u64::from(keys::TUPLE)).map_err(encode_err)?;
        rmp::encode::write_array_len(&mut buf, 2).map_err(encode_err)?;
        rmp::encode::write_str(&mut buf, AUTH_METHOD).map_err(encode_err)?;
        let len = u32::try_from(scramble.len()).map_err(encode_err)?;
        rmp::encode::write_str_len(&mut buf, len).map_err(encode_err)?;
        buf.extend_from_slice(scramble);

        Ok(Self {
            request_type: RequestType::Auth,
            stream: None,
            body: buf,
        })
    }

    /// BEGIN with an isolation level and optional timeout in seconds.
    pub fn begin(isolation: IsolationLevel, timeout: Option<f64>) -> Result<Self, TransportError> {
        let mut entries = vec![(
            MpValue::from(keys::TXN_ISOLATION),
            MpValue::from(isolation.code()),
        )];
        if let Some(seconds) = timeout {
            entries.push((MpValue::from(keys::TIMEOUT), MpValue::F64(seconds)));
        }
        Self::with_body(RequestType::Begin, &MpValue::Map(entries))
    }

    pub fn commit() -> Result<Self, TransportError> {
        Self::with_body(RequestType::Commit, &MpValue::Map(Vec::new()))
    }

    pub fn rollback() -> Result<Self, TransportError> {
        Self::with_body(RequestType::Rollback, &MpValue::Map(Vec::new()))
    }

    /// Frame the request with the given sync id.
    pub fn encode(&self, sync: u64) -> Result<Vec<u8>, TransportError> {
        let mut header = vec![
            (
                MpValue::from(keys::REQUEST_TYPE),
                MpValue::from(self.request_type.code()),
            ),
            (MpValue::from(keys::SYNC), MpValue::from(sync)),
        ];
        if let Some(stream) = self.stream {
            header.push((MpValue::from(keys::STREAM_ID), MpValue::from(stream.0)));
        }

        let mut payload = Vec::with_capacity(self.body.len() + 16);
        write_value(&mut payload, &MpValue::Map(header))?;
        payload.extend_from_slice(&self.body);

        let len = u32::try_from(payload.len())
            .map_err(|_| TransportError::EncodeError("request too large".to_string()))?;
        let mut frame = Vec::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
        frame.push(0xce);
        frame.extend_from_slice(&len.to_be_bytes());
        frame.extend_from_slice(&payload);
        Ok(frame)
    }
}

/// Read the payload length from a frame prefix.
pub fn frame_length(prefix: &[u8]) -> Result<usize, TransportError> {
    let mut cursor = prefix;
    let len: u64 = rmp::decode::read_int(&mut cursor)
        .map_err(|e| TransportError::DecodeError(format!("invalid length prefix: {}", e)))?;
    match usize::try_from(len) {
        Ok(len) if len <= MAX_FRAME_SIZE => Ok(len),
        _ => Err(TransportError::InvalidResponse(format!(
            "frame of {} bytes exceeds the {} byte limit",
            len, MAX_FRAME_SIZE
        ))),
    }
}

fn map_get(map: &[(MpValue, MpValue)], key: u8) -> Option<&MpValue> {
    map.iter()
        .find(|(k, _)| k.as_u64() == Some(u64::from(key)))
        .map(|(_, v)| v)
}

fn decode_map(value: MpValue, what: &str) -> Result<Vec<(MpValue, MpValue)>, TransportError> {
    match value {
        MpValue::Map(entries) => Ok(entries),
        other => Err(TransportError::InvalidResponse(format!(
            "{} is not a map: {}",
            what, other
        ))),
    }
}

/// A decoded response frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub code: u32,
    pub sync: u64,
    pub body: Vec<(MpValue, MpValue)>,
}

impl Response {
    /// Decode a frame payload (without the length prefix).
    pub fn decode(payload: &[u8]) -> Result<Self, TransportError> {
        let mut cursor = payload;
        let header = decode_map(rmpv::decode::read_value(&mut cursor)?, "header")?;
        let body = if cursor.is_empty() {
            Vec::new()
        } else {
            decode_map(rmpv::decode::read_value(&mut cursor)?, "body")?
        };

        let code = map_get(&header, keys::REQUEST_TYPE)
            .and_then(MpValue::as_u64)
            .and_then(|c| u32::try_from(c).ok())
            .ok_or_else(|| TransportError::InvalidResponse("missing response code".to_string()))?;
        let sync = map_get(&header, keys::SYNC)
            .and_then(MpValue::as_u64)
            .ok_or_else(|| TransportError::InvalidResponse("missing sync".to_string()))?;

        Ok(Self { code, sync, body })
    }

    pub fn is_error(&self) -> bool {
        self.code & ERROR_FLAG != 0
    }

    /// Engine error code without the error flag.
    pub fn error_code(&self) -> u32 {
        self.code & !ERROR_FLAG
    }

    /// Error text of an error response.
    pub fn error_message(&self) -> String {
        map_get(&self.body, keys::ERROR_24)
            .and_then(MpValue::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("unknown error (code {})", self.error_code()))
    }

    /// Fail with `ServerError` when this is an error response.
    pub fn into_result(self) -> Result<Self, TransportError> {
        if self.is_error() {
            return Err(TransportError::ServerError {
                code: self.error_code(),
                message: self.error_message(),
            });
        }
        Ok(self)
    }

    /// Interpret the body as an EXECUTE reply.
    ///
    /// An error response becomes an `ExecuteResponse` carrying the message.
    pub fn into_execute_response(self) -> Result<ExecuteResponse, TransportError> {
        if self.is_error() {
            return Ok(ExecuteResponse::engine_error(self.error_message()));
        }

        let mut response = ExecuteResponse::default();
        for (key, value) in self.body {
            let Some(key) = key.as_u64() else { continue };
            match u8::try_from(key) {
                Ok(keys::METADATA) => response.columns = decode_metadata(value)?,
                Ok(keys::DATA) => response.tuples = decode_tuples(value)?,
                Ok(keys::SQL_INFO) => response.sql_info = Some(decode_sql_info(value)?),
                _ => {}
            }
        }
        Ok(response)
    }
}

fn decode_metadata(value: MpValue) -> Result<Vec<ColumnMetadata>, TransportError> {
    let MpValue::Array(fields) = value else {
        return Err(TransportError::InvalidResponse(
            "metadata is not an array".to_string(),
        ));
    };
    fields
        .into_iter()
        .map(|field| {
            let field = decode_map(field, "column metadata")?;
            let name = map_get(&field, keys::FIELD_NAME)
                .and_then(MpValue::as_str)
                .ok_or_else(|| {
                    TransportError::InvalidResponse("column without a name".to_string())
                })?;
            let field_type = map_get(&field, keys::FIELD_TYPE).and_then(MpValue::as_str);
            Ok(ColumnMetadata::new(name, field_type))
        })
        .collect()
}

fn decode_tuples(value: MpValue) -> Result<Vec<Vec<MpValue>>, TransportError> {
    let MpValue::Array(tuples) = value else {
        return Err(TransportError::InvalidResponse(
            "data is not an array".to_string(),
        ));
    };
    tuples
        .into_iter()
        .map(|tuple| match tuple {
            MpValue::Array(values) => Ok(values),
            other => Err(TransportError::InvalidResponse(format!(
                "tuple is not an array: {}",
                other
            ))),
        })
        .collect()
}

fn decode_sql_info(value: MpValue) -> Result<SqlInfo, TransportError> {
    let info = decode_map(value, "sql info")?;
    let row_count = map_get(&info, keys::SQL_INFO_ROW_COUNT)
        .and_then(MpValue::as_u64)
        .unwrap_or(0);
    let autoincrement_ids = match map_get(&info, keys::SQL_INFO_AUTOINCREMENT_IDS) {
        Some(MpValue::Array(ids)) => ids.iter().filter_map(MpValue::as_i64).collect(),
        _ => Vec::new(),
    };
    Ok(SqlInfo {
        row_count,
        autoincrement_ids,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Greeting with the salt bytes `0..32`.
    pub(crate) fn sample_greeting() -> Vec<u8> {
        let mut greeting = format!("{:<63}\n", "Tarantool 2.11.1 (Binary) 7d4f7ac7-2c1e-4f8e-9d26-3b1f1d7c9a10")
            .into_bytes();
        greeting.extend(
            format!("{:<63}\n", "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8=").into_bytes(),
        );
        greeting
    }

    fn encode_response(code: u32, sync: u64, body: MpValue) -> Vec<u8> {
        let mut payload = Vec::new();
        let header = MpValue::Map(vec![
            (MpValue::from(keys::REQUEST_TYPE), MpValue::from(code)),
            (MpValue::from(keys::SYNC), MpValue::from(sync)),
        ]);
        rmpv::encode::write_value(&mut payload, &header).unwrap();
        rmpv::encode::write_value(&mut payload, &body).unwrap();
        payload
    }

    #[test]
    fn test_greeting_parse() {
        let greeting = Greeting::parse(&sample_greeting()).unwrap();
        assert!(greeting.version.starts_with("Tarantool 2.11.1"));
        assert_eq!(greeting.salt, (0u8..32).collect::<Vec<_>>());
    }

    #[test]
    fn test_greeting_rejects_other_servers() {
        let mut data = sample_greeting();
        data[..9].copy_from_slice(b"Redis 7.0");
        assert!(Greeting::parse(&data).is_err());
        assert!(Greeting::parse(&data[..100]).is_err());
    }

    #[test]
    fn test_scramble_vector() {
        let salt: Vec<u8> = (0u8..32).collect();
        let expected = [
            0x21, 0xb3, 0xff, 0x40, 0x5f, 0x32, 0xcb, 0xe4, 0xaa, 0xff, 0xf2, 0x91, 0x39, 0x60,
            0x46, 0xea, 0x29, 0xfa, 0x3a, 0x4d,
        ];
        assert_eq!(scramble(&salt, "secret"), expected);
    }

    #[test]
    fn test_oversized_frame_length_is_refused() {
        let mut prefix = vec![0xce];
        prefix.extend_from_slice(&u32::MAX.to_be_bytes());
        assert!(matches!(
            frame_length(&prefix),
            Err(TransportError::InvalidResponse(_))
        ));

        let mut prefix = vec![0xce];
        prefix.extend_from_slice(&(MAX_FRAME_SIZE as u32).to_be_bytes());
        assert_eq!(frame_length(&prefix).unwrap(), MAX_FRAME_SIZE);
    }

    #[test]
    fn test_request_framing() {
        let request = Request::ping().unwrap().on_stream(Some(StreamId(9)));
        let frame = request.encode(5).unwrap();

        assert_eq!(frame[0], 0xce);
        let len = frame_length(&frame[..LENGTH_PREFIX_SIZE]).unwrap();
        assert_eq!(len, frame.len() - LENGTH_PREFIX_SIZE);

        let mut cursor = &frame[LENGTH_PREFIX_SIZE..];
        let header = rmpv::decode::read_value(&mut cursor).unwrap();
        assert_eq!(
            header,
            MpValue::Map(vec![
                (MpValue::from(0u8), MpValue::from(64u8)),
                (MpValue::from(1u8), MpValue::from(5u64)),
                (MpValue::from(0x0au8), MpValue::from(9u64)),
            ])
        );
        let body = rmpv::decode::read_value(&mut cursor).unwrap();
        assert_eq!(body, MpValue::Map(vec![]));
    }

    #[test]
    fn test_execute_body() {
        let args = vec![
            WireValue::Positional(MpValue::from(1i64)),
            WireValue::Named {
                key: "name".to_string(),
                value: MpValue::from("x"),
            },
        ];
        let request = Request::execute("SELECT ?, :name", args).unwrap();
        let mut cursor = &request.body[..];
        let body = rmpv::decode::read_value(&mut cursor).unwrap();
        let entries = body.as_map().unwrap();
        assert_eq!(
            map_get(entries, keys::SQL_TEXT).and_then(MpValue::as_str),
            Some("SELECT ?, :name")
        );
        assert_eq!(
            map_get(entries, keys::SQL_BIND),
            Some(&MpValue::Array(vec![
                MpValue::from(1i64),
                MpValue::Map(vec![(MpValue::from(":name"), MpValue::from("x"))]),
            ]))
        );
    }

    #[test]
    fn test_auth_body() {
        let request = Request::auth("admin", &[0xffu8; SCRAMBLE_SIZE]).unwrap();
        let body = &request.body;
        // map(2), USER_NAME, "admin"
        assert_eq!(&body[..3], &[0x82, 0x23, 0xa5]);
        assert_eq!(&body[3..8], b"admin");
        // TUPLE, array(2), "chap-sha1", str(20)
        assert_eq!(&body[8..11], &[0x21, 0x92, 0xa9]);
        assert_eq!(&body[11..20], b"chap-sha1");
        assert_eq!(body[20], 0xb4);
        assert_eq!(&body[21..], &[0xffu8; SCRAMBLE_SIZE]);
    }

    #[test]
    fn test_begin_body() {
        let request = Request::begin(IsolationLevel::BestEffort, None).unwrap();
        let mut cursor = &request.body[..];
        let body = rmpv::decode::read_value(&mut cursor).unwrap();
        assert_eq!(
            body,
            MpValue::Map(vec![(MpValue::from(0x59u8), MpValue::from(3u8))])
        );
    }

    #[test]
    fn test_execute_response_decoding() {
        let body = MpValue::Map(vec![
            (
                MpValue::from(keys::METADATA),
                MpValue::Array(vec![
                    MpValue::Map(vec![
                        (MpValue::from(0u8), MpValue::from("ID")),
                        (MpValue::from(1u8), MpValue::from("integer")),
                    ]),
                    MpValue::Map(vec![(MpValue::from(0u8), MpValue::from("NAME"))]),
                ]),
            ),
            (
                MpValue::from(keys::DATA),
                MpValue::Array(vec![MpValue::Array(vec![
                    MpValue::from(1i64),
                    MpValue::from("a"),
                ])]),
            ),
        ]);
        let response = Response::decode(&encode_response(0, 3, body)).unwrap();
        assert_eq!(response.sync, 3);
        assert!(!response.is_error());

        let execute = response.into_execute_response().unwrap();
        assert_eq!(
            execute.columns,
            vec![
                ColumnMetadata::new("ID", Some("integer")),
                ColumnMetadata::new("NAME", None)
            ]
        );
        assert_eq!(execute.tuples.len(), 1);
        assert!(execute.error.is_none());
    }

    #[test]
    fn test_sql_info_decoding() {
        let body = MpValue::Map(vec![(
            MpValue::from(keys::SQL_INFO),
            MpValue::Map(vec![
                (MpValue::from(0u8), MpValue::from(2u64)),
                (
                    MpValue::from(1u8),
                    MpValue::Array(vec![MpValue::from(7i64), MpValue::from(8i64)]),
                ),
            ]),
        )]);
        let execute = Response::decode(&encode_response(0, 1, body))
            .unwrap()
            .into_execute_response()
            .unwrap();
        assert_eq!(
            execute.sql_info,
            Some(SqlInfo {
                row_count: 2,
                autoincrement_ids: vec![7, 8]
            })
        );
    }

    #[test]
    fn test_error_response() {
        let body = MpValue::Map(vec![(
            MpValue::from(keys::ERROR_24),
            MpValue::from("Space 'T' does not exist"),
        )]);
        let response = Response::decode(&encode_response(0x8000 | 36, 1, body)).unwrap();
        assert!(response.is_error());
        assert_eq!(response.error_code(), 36);

        let execute = response.clone().into_execute_response().unwrap();
        assert_eq!(execute.error.as_deref(), Some("Space 'T' does not exist"));

        match response.into_result() {
            Err(TransportError::ServerError { code, message }) => {
                assert_eq!(code, 36);
                assert!(message.contains("does not exist"));
            }
            other => panic!("expected server error, got {:?}", other),
        }
    }

    #[test]
    fn test_isolation_parse() {
        assert_eq!(
            IsolationLevel::parse("READ_COMMITTED"),
            Some(IsolationLevel::ReadCommitted)
        );
        assert_eq!(IsolationLevel::default().code(), 3);
        assert_eq!(IsolationLevel::parse("serializable"), None);
    }
}
