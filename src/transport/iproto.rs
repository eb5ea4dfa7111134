//! IPROTO transport over an async byte stream.
//!
//! Production code runs over `TcpStream`; any `AsyncRead + AsyncWrite`
//! stream works once the greeting has been read, which is how the tests
//! drive the transport through an in-memory duplex pipe.

use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::error::TransportError;
use crate::query::WireValue;

use super::messages::{
    frame_length, scramble, ExecuteResponse, Greeting, IsolationLevel, Request, Response,
    SessionInfo, StreamId, GREETING_SIZE, LENGTH_PREFIX_SIZE,
};
use super::protocol::{ConnectionParams, Credentials, TransportProtocol, DEFAULT_REQUEST_TIMEOUT};

/// Streams the transport can open by itself.
#[async_trait]
pub trait Dial: Sized + Send {
    async fn dial(params: &ConnectionParams) -> std::io::Result<Self>;
}

#[async_trait]
impl Dial for TcpStream {
    async fn dial(params: &ConnectionParams) -> std::io::Result<Self> {
        let stream = TcpStream::connect((params.host.as_str(), params.port)).await?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}

/// Connection state tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionState {
    /// Not connected
    Disconnected,
    /// Greeting received
    Connected,
    /// Connected and authenticated
    Authenticated,
    /// Connection closed
    Closed,
}

/// IPROTO client transport.
pub struct IprotoTransport<S = TcpStream> {
    stream: Option<S>,
    greeting: Option<Greeting>,
    session: Option<SessionInfo>,
    state: ConnectionState,
    next_sync: u64,
    request_timeout: Duration,
}

impl<S> std::fmt::Debug for IprotoTransport<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IprotoTransport")
            .field("state", &self.state)
            .field("greeting", &self.greeting)
            .field("next_sync", &self.next_sync)
            .finish()
    }
}

/// Read one length-prefixed frame and return its payload.
pub(crate) async fn read_frame<R>(reader: &mut R) -> Result<Vec<u8>, TransportError>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
    reader.read_exact(&mut prefix).await?;
    let len = frame_length(&prefix)?;
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(payload)
}

impl<S> IprotoTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + Sync,
{
    /// Create a disconnected transport.
    pub fn new() -> Self {
        Self {
            stream: None,
            greeting: None,
            session: None,
            state: ConnectionState::Disconnected,
            next_sync: 1,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Take over an already opened stream and read the server greeting.
    pub async fn from_stream(stream: S, request_timeout: Duration) -> Result<Self, TransportError> {
        let mut transport = Self::new();
        transport.request_timeout = request_timeout;
        transport.attach(stream).await?;
        Ok(transport)
    }

    async fn attach(&mut self, mut stream: S) -> Result<(), TransportError> {
        let mut buf = [0u8; GREETING_SIZE];
        stream.read_exact(&mut buf).await?;
        let greeting = Greeting::parse(&buf)?;
        debug!(version = %greeting.version, "received greeting");

        self.stream = Some(stream);
        self.greeting = Some(greeting);
        self.session = None;
        self.state = ConnectionState::Connected;
        Ok(())
    }

    /// Greeting of the connected server.
    pub fn greeting(&self) -> Option<&Greeting> {
        self.greeting.as_ref()
    }

    /// Session established by [`authenticate`](TransportProtocol::authenticate).
    pub fn session(&self) -> Option<&SessionInfo> {
        self.session.as_ref()
    }

    fn require_authenticated(&self) -> Result<(), TransportError> {
        match self.state {
            ConnectionState::Authenticated => Ok(()),
            ConnectionState::Connected => Err(TransportError::ProtocolError(
                "Must authenticate before executing requests".to_string(),
            )),
            _ => Err(TransportError::NotConnected),
        }
    }

    /// Drop a stream whose framing can no longer be trusted.
    fn mark_broken(&mut self) {
        self.stream = None;
        self.state = ConnectionState::Closed;
    }

    async fn round_trip(&mut self, request: Request) -> Result<Response, TransportError> {
        let sync = self.next_sync;
        self.next_sync = self.next_sync.wrapping_add(1);
        let frame = request.encode(sync)?;
        let request_timeout = self.request_timeout;

        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;
        trace!(
            request = ?request.request_type,
            sync,
            stream = ?request.stream,
            bytes = frame.len(),
            "sending request"
        );

        let exchange = async {
            stream.write_all(&frame).await?;
            stream.flush().await?;
            let payload = read_frame(stream).await?;
            Ok::<Vec<u8>, TransportError>(payload)
        };

        let outcome = timeout(request_timeout, exchange).await;
        let payload = match outcome {
            Ok(Ok(payload)) => payload,
            Ok(Err(e)) => {
                warn!(error = %e, "request failed, dropping connection");
                self.mark_broken();
                return Err(e);
            }
            Err(_) => {
                warn!(sync, "request timed out, dropping connection");
                self.mark_broken();
                return Err(TransportError::Timeout {
                    timeout_ms: request_timeout.as_millis() as u64,
                });
            }
        };

        let response = Response::decode(&payload)?;
        trace!(sync = response.sync, code = response.code, "received response");
        if response.sync != sync {
            self.mark_broken();
            return Err(TransportError::InvalidResponse(format!(
                "response sync {} does not match request {}",
                response.sync, sync
            )));
        }
        Ok(response)
    }
}

impl<S> Default for IprotoTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S> TransportProtocol for IprotoTransport<S>
where
    S: Dial + AsyncRead + AsyncWrite + Unpin + Send + Sync + 'static,
{
    async fn connect(&mut self, params: &ConnectionParams) -> Result<(), TransportError> {
        if matches!(
            self.state,
            ConnectionState::Connected | ConnectionState::Authenticated
        ) {
            return Err(TransportError::ProtocolError(
                "Already connected".to_string(),
            ));
        }

        debug!(address = %params.address(), "connecting");
        let timeout_ms = params.connect_timeout.as_millis() as u64;
        let stream = timeout(params.connect_timeout, S::dial(params))
            .await
            .map_err(|_| TransportError::Timeout { timeout_ms })??;

        self.request_timeout = params.request_timeout;
        timeout(params.connect_timeout, self.attach(stream))
            .await
            .map_err(|_| TransportError::Timeout { timeout_ms })?
    }

    async fn authenticate(
        &mut self,
        credentials: &Credentials,
    ) -> Result<SessionInfo, TransportError> {
        if self.state != ConnectionState::Connected && self.state != ConnectionState::Authenticated
        {
            return Err(TransportError::ProtocolError(
                "Must connect before authenticating".to_string(),
            ));
        }
        let greeting = self.greeting.clone().ok_or(TransportError::NotConnected)?;

        if !credentials.is_guest() {
            let scrambled = scramble(&greeting.salt, &credentials.password);
            let request = Request::auth(&credentials.username, &scrambled)?;
            self.round_trip(request).await?.into_result()?;
        }

        let session = SessionInfo {
            server_version: greeting.version,
            username: credentials.username.clone(),
        };
        debug!(user = %session.username, "authenticated");
        self.session = Some(session.clone());
        self.state = ConnectionState::Authenticated;
        Ok(session)
    }

    async fn execute(
        &mut self,
        sql: &str,
        args: Vec<WireValue>,
        stream: Option<StreamId>,
    ) -> Result<ExecuteResponse, TransportError> {
        self.require_authenticated()?;
        let request = Request::execute(sql, args)?.on_stream(stream);
        self.round_trip(request).await?.into_execute_response()
    }

    async fn ping(&mut self) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        self.round_trip(Request::ping()?).await?.into_result()?;
        Ok(())
    }

    async fn begin(
        &mut self,
        stream: StreamId,
        isolation: IsolationLevel,
    ) -> Result<(), TransportError> {
        self.require_authenticated()?;
        let request = Request::begin(isolation, None)?.on_stream(Some(stream));
        self.round_trip(request).await?.into_result()?;
        Ok(())
    }

    async fn commit(&mut self, stream: StreamId) -> Result<(), TransportError> {
        self.require_authenticated()?;
        let request = Request::commit()?.on_stream(Some(stream));
        self.round_trip(request).await?.into_result()?;
        Ok(())
    }

    async fn rollback(&mut self, stream: StreamId) -> Result<(), TransportError> {
        self.require_authenticated()?;
        let request = Request::rollback()?.on_stream(Some(stream));
        self.round_trip(request).await?.into_result()?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if let Some(mut stream) = self.stream.take() {
            // The peer may already be gone.
            let _ = stream.shutdown().await;
            debug!("connection closed");
        }
        self.session = None;
        if self.state != ConnectionState::Disconnected {
            self.state = ConnectionState::Closed;
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        matches!(
            self.state,
            ConnectionState::Connected | ConnectionState::Authenticated
        )
    }
}
