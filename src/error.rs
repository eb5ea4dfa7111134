//! Error types for tntsql.
//!
//! This module defines domain-specific error types organized by functional area.

use std::fmt;
use thiserror::Error;

/// Top-level error type encompassing all possible errors.
#[derive(Error, Debug)]
pub enum TntError {
    /// Connection-related errors
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Query execution errors
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Argument binding errors
    #[error(transparent)]
    Binding(#[from] BindingError),

    /// Result decoding errors
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// Transport protocol errors
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Errors related to database connections.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Failed to establish connection to the database
    #[error("Failed to connect to {host}:{port}: {message}")]
    ConnectionFailed {
        host: String,
        port: u16,
        message: String,
    },

    /// Authentication failure
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Invalid connection parameters
    #[error("Invalid connection parameter '{parameter}': {message}")]
    InvalidParameter { parameter: String, message: String },

    /// Connection string parsing error
    #[error("Failed to parse connection string: {0}")]
    ParseError(String),

    /// Connection is closed
    #[error("Connection is closed")]
    ConnectionClosed,
}

/// Errors related to query execution.
#[derive(Error, Debug)]
pub enum QueryError {
    /// The engine rejected the request and reported a message
    #[error("Engine error: {0}")]
    Engine(String),

    /// Argument binding failed before the request was sent
    #[error(transparent)]
    Binding(#[from] BindingError),

    /// A result value could not be decoded
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// The transport failed while sending or receiving
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Invalid query state
    #[error("Invalid query state: {0}")]
    InvalidState(String),

    /// Rows were read after being closed
    #[error("Next called after Close")]
    RowsClosed,

    /// A transaction is already open on this connection
    #[error("Already in transaction")]
    AlreadyInTransaction,

    /// Commit or rollback without an open transaction
    #[error("No active transaction")]
    NoActiveTransaction,

    /// The engine refused a transaction control request
    #[error("Transaction error: {0}")]
    TransactionError(String),
}

/// Errors raised while reconciling placeholders with caller arguments.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// Placeholder and argument counts differ
    #[error("not enough parameters for query want {want} have {have}")]
    CountMismatch { want: usize, have: usize },

    /// A named placeholder has no argument with that name
    #[error("no parameter with name {name}")]
    NoNamedParameter { name: String },

    /// A positional placeholder found no unnamed argument left
    #[error("not enough unnamed parameters")]
    NotEnoughUnnamed,

    /// The caller supplied a value kind the engine cannot receive
    #[error("unsupported value type: {kind}")]
    UnsupportedValueType { kind: String },

    /// An argument ordinal is outside the argument list or repeated
    #[error("invalid ordinal {ordinal} for {count} arguments")]
    InvalidOrdinal { ordinal: usize, count: usize },
}

/// Errors related to decoding result values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// The result projector has no mapping for a value kind
    #[error("Unhandled value kind '{kind}' in column {column}")]
    UnhandledKind { column: usize, kind: String },

    /// Destination has fewer slots than the tuple has values
    #[error("Destination has {slots} slots but row has {values} values")]
    DestinationTooSmall { slots: usize, values: usize },

    /// A msgpack extension payload is malformed
    #[error("Invalid extension type {type_id}: {message}")]
    InvalidExtension { type_id: i8, message: String },

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Invalid UTF-8 string
    #[error("Invalid UTF-8 string in column {column}")]
    InvalidUtf8 { column: usize },

    /// A cell cannot be converted into the requested Rust type
    #[error("Cannot convert {found} into {expected}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },
}

/// Errors related to the transport protocol.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Network I/O error
    #[error("Network I/O error: {0}")]
    IoError(String),

    /// Message encoding error
    #[error("Encoding error: {0}")]
    EncodeError(String),

    /// Message decoding error
    #[error("Decoding error: {0}")]
    DecodeError(String),

    /// Protocol error
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    /// Invalid response from server
    #[error("Invalid server response: {0}")]
    InvalidResponse(String),

    /// The server answered with an error response
    #[error("Server error {code}: {message}")]
    ServerError { code: u32, message: String },

    /// Request timed out
    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Transport not connected
    #[error("Not connected")]
    NotConnected,
}

/// Error classification used by callers that decide how to react to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Programmer error, never retried
    Usage,
    /// Caller data does not match the query
    Binding,
    /// Reported by the engine alongside a successful round trip
    Engine,
    /// Result values could not be decoded
    Conversion,
    /// Socket, framing or timeout failures
    Transport,
    /// DSN, connect or authentication failures
    Connection,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Usage => write!(f, "USAGE"),
            ErrorCategory::Binding => write!(f, "BINDING"),
            ErrorCategory::Engine => write!(f, "ENGINE"),
            ErrorCategory::Conversion => write!(f, "CONVERSION"),
            ErrorCategory::Transport => write!(f, "TRANSPORT"),
            ErrorCategory::Connection => write!(f, "CONNECTION"),
        }
    }
}

impl TntError {
    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            TntError::Connection(_) => ErrorCategory::Connection,
            TntError::Query(e) => e.category(),
            TntError::Binding(e) => e.category(),
            TntError::Conversion(_) => ErrorCategory::Conversion,
            TntError::Transport(_) => ErrorCategory::Transport,
        }
    }
}

impl QueryError {
    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            QueryError::Engine(_) | QueryError::TransactionError(_) => ErrorCategory::Engine,
            QueryError::Binding(e) => e.category(),
            QueryError::Conversion(_) => ErrorCategory::Conversion,
            QueryError::Transport(_) => ErrorCategory::Transport,
            QueryError::InvalidState(_)
            | QueryError::RowsClosed
            | QueryError::AlreadyInTransaction
            | QueryError::NoActiveTransaction => ErrorCategory::Usage,
        }
    }
}

impl BindingError {
    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            BindingError::UnsupportedValueType { .. } => ErrorCategory::Usage,
            _ => ErrorCategory::Binding,
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::IoError(err.to_string())
    }
}

impl From<rmpv::encode::Error> for TransportError {
    fn from(err: rmpv::encode::Error) -> Self {
        TransportError::EncodeError(err.to_string())
    }
}

impl From<rmpv::decode::Error> for TransportError {
    fn from(err: rmpv::decode::Error) -> Self {
        TransportError::DecodeError(err.to_string())
    }
}

impl From<ConversionError> for TransportError {
    fn from(err: ConversionError) -> Self {
        TransportError::DecodeError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_display() {
        let err = ConnectionError::ConnectionFailed {
            host: "localhost".to_string(),
            port: 3301,
            message: "Connection refused".to_string(),
        };
        assert!(err.to_string().contains("localhost"));
        assert!(err.to_string().contains("3301"));
    }

    #[test]
    fn test_binding_error_messages() {
        let err = BindingError::CountMismatch { want: 2, have: 1 };
        assert_eq!(
            err.to_string(),
            "not enough parameters for query want 2 have 1"
        );

        let err = BindingError::NoNamedParameter {
            name: "id".to_string(),
        };
        assert_eq!(err.to_string(), "no parameter with name id");
        assert_eq!(
            BindingError::NotEnoughUnnamed.to_string(),
            "not enough unnamed parameters"
        );
    }

    #[test]
    fn test_engine_error_is_distinct_from_transport() {
        let engine = QueryError::Engine("Space 'T' does not exist".to_string());
        let transport = QueryError::from(TransportError::NotConnected);

        assert_eq!(engine.category(), ErrorCategory::Engine);
        assert_eq!(transport.category(), ErrorCategory::Transport);
        assert!(engine.to_string().contains("Space 'T' does not exist"));
    }

    #[test]
    fn test_category_mapping() {
        let err = TntError::Query(QueryError::RowsClosed);
        assert_eq!(err.category(), ErrorCategory::Usage);

        let err = TntError::Binding(BindingError::UnsupportedValueType {
            kind: "array of uuid".to_string(),
        });
        assert_eq!(err.category(), ErrorCategory::Usage);

        let err = TntError::Query(QueryError::Binding(BindingError::NotEnoughUnnamed));
        assert_eq!(err.category(), ErrorCategory::Binding);

        let err = TntError::Connection(ConnectionError::ConnectionClosed);
        assert_eq!(err.category(), ErrorCategory::Connection);
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::Usage.to_string(), "USAGE");
        assert_eq!(ErrorCategory::Engine.to_string(), "ENGINE");
    }

    #[test]
    fn test_rows_closed_message() {
        assert!(QueryError::RowsClosed.to_string().contains("after Close"));
    }
}
