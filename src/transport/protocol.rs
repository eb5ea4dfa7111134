//! Transport protocol abstraction trait.
//!
//! `TransportProtocol` is the seam between statements and the wire. The
//! query layer only ever sees this trait, so tests substitute a mock and
//! production uses [`IprotoTransport`](super::IprotoTransport).

use crate::error::TransportError;
use crate::query::WireValue;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

pub use super::messages::{
    ColumnMetadata, ExecuteResponse, IsolationLevel, SessionInfo, SqlInfo, StreamId,
};

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default timeout of a single request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection parameters for establishing a transport connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    /// Database host
    pub host: String,
    /// Database port
    pub port: u16,
    /// Timeout for opening the socket and reading the greeting
    pub connect_timeout: Duration,
    /// Timeout for one request/response round trip
    pub request_timeout: Duration,
}

impl ConnectionParams {
    /// Create new connection parameters.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// `host:port` address.
    pub fn address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// User credentials for authentication.
#[derive(Clone)]
pub struct Credentials {
    /// Username
    pub username: String,
    /// Password (cleared on drop)
    pub password: String,
}

impl Credentials {
    /// Create new credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// The built-in guest user needs no AUTH request.
    pub fn is_guest(&self) -> bool {
        self.username == "guest" && self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl Drop for Credentials {
    fn drop(&mut self) {
        self.password.clear();
    }
}

/// Transport protocol trait for engine communication.
///
/// Engine errors reported for an EXECUTE request are returned inside
/// [`ExecuteResponse::error`]. Every other request maps an engine error to
/// `TransportError::ServerError`.
#[async_trait]
pub trait TransportProtocol: Send + Sync {
    /// Connect to the server and read its greeting.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the socket cannot be opened or the
    /// greeting is malformed.
    async fn connect(&mut self, params: &ConnectionParams) -> Result<(), TransportError>;

    /// Authenticate with CHAP-SHA1. The guest user is accepted without a request.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::ServerError` if the server rejects the credentials.
    async fn authenticate(
        &mut self,
        credentials: &Credentials,
    ) -> Result<SessionInfo, TransportError>;

    /// Execute SQL with bound arguments, optionally inside a stream.
    async fn execute(
        &mut self,
        sql: &str,
        args: Vec<WireValue>,
        stream: Option<StreamId>,
    ) -> Result<ExecuteResponse, TransportError>;

    /// Round trip with an empty request.
    async fn ping(&mut self) -> Result<(), TransportError>;

    /// Open an interactive transaction on `stream`.
    async fn begin(
        &mut self,
        stream: StreamId,
        isolation: IsolationLevel,
    ) -> Result<(), TransportError>;

    /// Commit the transaction open on `stream`.
    async fn commit(&mut self, stream: StreamId) -> Result<(), TransportError>;

    /// Roll back the transaction open on `stream`.
    async fn rollback(&mut self, stream: StreamId) -> Result<(), TransportError>;

    /// Close the connection. Closing twice is not an error.
    async fn close(&mut self) -> Result<(), TransportError>;

    /// Check if the connection is still active.
    fn is_connected(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_params_default() {
        let params = ConnectionParams::new("localhost", 3301);
        assert_eq!(params.host, "localhost");
        assert_eq!(params.port, 3301);
        assert_eq!(params.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
        assert_eq!(params.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(params.address(), "localhost:3301");
    }

    #[test]
    fn test_connection_params_builder() {
        let params = ConnectionParams::new("::1", 3302)
            .with_connect_timeout(Duration::from_secs(1))
            .with_request_timeout(Duration::from_millis(500));

        assert_eq!(params.address(), "[::1]:3302");
        assert_eq!(params.connect_timeout, Duration::from_secs(1));
        assert_eq!(params.request_timeout, Duration::from_millis(500));
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::new("admin", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("admin"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_guest_detection() {
        assert!(Credentials::new("guest", "").is_guest());
        assert!(!Credentials::new("guest", "pw").is_guest());
        assert!(!Credentials::new("admin", "").is_guest());
    }
}
