//! One TCP connection to a game server and the status exchange over it.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tokio::{
    io::{AsyncRead, AsyncWrite, AsyncWriteExt},
    net::TcpStream,
    time::{sleep, timeout},
};

use crate::{
    Endpoint, Error,
    packet::{self, Packet, STATE_STATUS},
};

/// Timing limits for one status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// How long to wait for the TCP connection to be established.
    pub connect: Duration,
    /// How long to wait for the status response once every request is written.
    pub response: Duration,
    /// Pause between consecutive writes, for servers that process the
    /// handshake asynchronously. Zero disables it.
    pub write_pause: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_millis(1000),
            response: Duration::from_millis(500),
            write_pause: Duration::from_millis(100),
        }
    }
}

/// An open connection to a server in the status state.
///
/// The stream is shut down by [`Session::close`]; if the session is dropped
/// without being closed the socket is released with it.
#[derive(Debug)]
pub struct Session<S = TcpStream> {
    stream: S,
    closed: bool,
}

impl Session<TcpStream> {
    /// Connects to `endpoint`, giving up after `limit`.
    ///
    /// # Errors
    /// [`Error::ConnectTimeout`] if the timer fires first, [`Error::IoError`]
    /// if the connection attempt itself fails.
    pub async fn connect(endpoint: &Endpoint, limit: Duration) -> Result<Self, Error> {
        let connecting = TcpStream::connect((endpoint.hostname.as_str(), endpoint.port));
        let stream = connect_within(connecting, limit).await?;
        stream.set_nodelay(true)?;
        debug!(%endpoint, "connected");
        Ok(Self::new(stream))
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Session<S> {
    pub const fn new(stream: S) -> Self {
        Self {
            stream,
            closed: false,
        }
    }

    /// Writes the handshake, status request and ping frames, pausing for
    /// `pause` between them.
    ///
    /// # Errors
    /// [`Error::IoError`] if any write fails.
    pub async fn handshake(
        &mut self,
        protocol_version: u32,
        server_address: &str,
        server_port: u16,
        pause: Duration,
    ) -> Result<(), Error> {
        let handshake = Packet::Handshake {
            version: protocol_version,
            host: server_address.to_string(),
            port: server_port,
            next_state: STATE_STATUS,
        };
        let ping = Packet::Ping {
            payload: unix_millis(),
        };

        self.send(&handshake).await?;
        debug!(protocol_version, server_address, server_port, "handshake sent");
        pause_for(pause).await;
        self.send(&Packet::Request).await?;
        pause_for(pause).await;
        self.send(&ping).await?;
        Ok(())
    }

    /// Waits up to `limit` for the status response and parses its JSON.
    ///
    /// A pong that arrives ahead of the response is skipped.
    ///
    /// # Errors
    /// [`Error::ResponseTimeout`] if the timer fires first, [`Error::Truncated`]
    /// if the server hangs up mid-frame, or a protocol error if the response
    /// is malformed.
    pub async fn read_status(&mut self, limit: Duration) -> Result<Value, Error> {
        timeout(limit, self.read_response())
            .await
            .map_err(|_| Error::ResponseTimeout)?
    }

    async fn read_response(&mut self) -> Result<Value, Error> {
        loop {
            let (packet_id, payload) = packet::read_frame(&mut self.stream).await?;
            match Packet::decode_clientbound(packet_id, &payload)? {
                Packet::Response { response } => {
                    debug!(bytes = response.len(), "status response received");
                    return Ok(serde_json::from_str(&response)?);
                }
                Packet::Pong { payload } => {
                    debug!(payload, "pong arrived before the status response, skipping");
                }
                other => return Err(Error::UnexpectedPacket(other.id())),
            }
        }
    }

    /// Shuts the connection down. Calling it again does nothing, and errors
    /// are ignored.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(error) = self.stream.shutdown().await {
            trace!(%error, "error while closing connection");
        }
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    async fn send(&mut self, packet: &Packet) -> Result<(), Error> {
        self.stream.write_all(&packet.to_frame()).await?;
        self.stream.flush().await?;
        Ok(())
    }
}

async fn pause_for(pause: Duration) {
    if !pause.is_zero() {
        sleep(pause).await;
    }
}

fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}

/// Races a pending connection against `limit`.
async fn connect_within<F, S>(connecting: F, limit: Duration) -> Result<S, Error>
where
    F: Future<Output = std::io::Result<S>>,
{
    timeout(limit, connecting)
        .await
        .map_err(|_| Error::ConnectTimeout)?
        .map_err(Error::from)
}
