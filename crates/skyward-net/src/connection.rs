//! Non-blocking framed TCP connection.

use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use tracing::{debug, warn};

use crate::framing::{FrameConfig, FrameDecoder, FrameError, encode_frame};

/// Errors surfaced by the transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The peer closed the connection (orderly or not).
    #[error("peer disconnected")]
    Disconnected,

    /// All connection attempts to the host failed.
    #[error("could not reach {addr} after {attempts} attempts")]
    ConnectFailed { addr: SocketAddr, attempts: u32 },

    /// The inbound byte stream violated the framing rules.
    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("transport i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

/// How a client reaches the host: per-attempt timeout and attempt count.
#[derive(Debug, Clone, Copy)]
pub struct ConnectPolicy {
    pub timeout: Duration,
    pub attempts: u32,
}

/// A framed, ordered, non-blocking TCP connection.
///
/// All reads and writes are bounded: `poll_frames` drains only what the
/// kernel already has, and `flush` writes only what the kernel will take,
/// carrying the rest over to the next tick.
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    decoder: FrameDecoder,
    outbox: Vec<u8>,
    config: FrameConfig,
}

impl Connection {
    /// Wrap an accepted stream. Switches it to non-blocking and disables
    /// Nagle so small state updates leave immediately.
    pub fn from_stream(stream: TcpStream, config: FrameConfig) -> Result<Self, TransportError> {
        let peer = stream.peer_addr()?;
        stream.set_nonblocking(true)?;
        stream.set_nodelay(true)?;
        Ok(Self {
            stream,
            peer,
            decoder: FrameDecoder::new(config),
            outbox: Vec::new(),
            config,
        })
    }

    /// Dial the host, blocking up to `policy.timeout` per attempt.
    ///
    /// This is the one blocking operation in the transport; it runs before
    /// the tick loop starts. After the handshake the stream is switched to
    /// non-blocking like every other connection.
    pub fn connect(
        addr: SocketAddr,
        policy: ConnectPolicy,
        config: FrameConfig,
    ) -> Result<Self, TransportError> {
        for attempt in 1..=policy.attempts {
            match TcpStream::connect_timeout(&addr, policy.timeout) {
                Ok(stream) => {
                    debug!(%addr, attempt, "connected");
                    return Self::from_stream(stream, config);
                }
                Err(err) => {
                    warn!(%addr, attempt, attempts = policy.attempts, %err, "connect attempt failed");
                }
            }
        }
        Err(TransportError::ConnectFailed {
            addr,
            attempts: policy.attempts,
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Drain every complete frame the kernel has buffered for us.
    ///
    /// Returns the payloads in arrival order. `WouldBlock` ends the drain;
    /// EOF means the peer went away and yields [`TransportError::Disconnected`].
    pub fn poll_frames(&mut self) -> Result<Vec<Vec<u8>>, TransportError> {
        let mut chunk = [0u8; 4096];
        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => return Err(TransportError::Disconnected),
                Ok(n) => self.decoder.extend(&chunk[..n]),
                Err(err) if err.kind() == ErrorKind::WouldBlock => break,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if err.kind() == ErrorKind::ConnectionReset
                        || err.kind() == ErrorKind::ConnectionAborted =>
                {
                    return Err(TransportError::Disconnected);
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        let mut frames = Vec::new();
        while let Some(payload) = self.decoder.next_frame()? {
            frames.push(payload);
        }
        Ok(frames)
    }

    /// Queue a payload for transmission. Bytes leave on the next `flush`.
    pub fn queue_frame(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let frame = encode_frame(payload, &self.config)?;
        self.outbox.extend_from_slice(&frame);
        Ok(())
    }

    /// Write as much of the outbox as the kernel accepts right now.
    ///
    /// A partial write keeps the unsent tail for the next tick, preserving
    /// byte order.
    pub fn flush(&mut self) -> Result<(), TransportError> {
        while !self.outbox.is_empty() {
            match self.stream.write(&self.outbox) {
                Ok(0) => return Err(TransportError::Disconnected),
                Ok(n) => {
                    self.outbox.drain(..n);
                }
                Err(err) if err.kind() == ErrorKind::WouldBlock => break,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if err.kind() == ErrorKind::BrokenPipe
                        || err.kind() == ErrorKind::ConnectionReset =>
                {
                    return Err(TransportError::Disconnected);
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
        Ok(())
    }

    /// Bytes queued but not yet handed to the kernel.
    pub fn pending_bytes(&self) -> usize {
        self.outbox.len()
    }
}
