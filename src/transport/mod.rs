//! Transport layer for Tarantool communication.
//!
//! This module provides the transport protocol abstraction and the IPROTO
//! implementation used to reach a Tarantool server.
//!
//! # Architecture
//!
//! The transport layer is organized into:
//! - `protocol` - Transport protocol trait definition
//! - `messages` - IPROTO request and response types
//! - `iproto` - IPROTO transport over TCP or any async byte stream
//!
//! # Example
//!
//! ```no_run
//! use tntsql::transport::{
//!     ConnectionParams, Credentials, IprotoTransport, TransportProtocol,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut transport: IprotoTransport = IprotoTransport::new();
//!
//! // Connect
//! let params = ConnectionParams::new("localhost", 3301);
//! transport.connect(&params).await?;
//!
//! // Authenticate
//! let credentials = Credentials::new("admin", "secret");
//! let session = transport.authenticate(&credentials).await?;
//! println!("Connected to: {}", session.server_version);
//!
//! // Execute query
//! let response = transport.execute("SELECT 1", vec![], None).await?;
//! println!("{} rows", response.tuples.len());
//!
//! // Close connection
//! transport.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod iproto;
pub mod messages;
pub mod protocol;

// Re-export commonly used types
pub use iproto::{Dial, IprotoTransport};
pub use messages::{
    ColumnMetadata, ExecuteResponse, IsolationLevel, SessionInfo, SqlInfo, StreamId,
};
pub use protocol::{ConnectionParams, Credentials, TransportProtocol};


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_exports() {
        // Verify that key types are exported and accessible
        let _params = ConnectionParams::new("localhost", 3301);
        let _creds = Credentials::new("user", "pass");
        let _transport: IprotoTransport = IprotoTransport::new();
        let _stream = StreamId(1);
    }
}
