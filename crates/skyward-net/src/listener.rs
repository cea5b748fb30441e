//! Non-blocking accept socket for the host.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener};

use socket2::{Domain, Protocol, Socket, Type};
use tracing::info;

use crate::connection::{Connection, TransportError};
use crate::framing::FrameConfig;

/// Listening socket polled once per tick.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
}

impl Listener {
    /// Bind and listen on `addr`.
    ///
    /// Built through `socket2` so SO_REUSEADDR is set before the bind;
    /// restarting a host must not trip over a socket in TIME_WAIT.
    pub fn bind(addr: SocketAddr) -> std::io::Result<Self> {
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
        socket.set_reuse_address(true)?;
        socket.bind(&addr.into())?;
        socket.listen(128)?;
        socket.set_nonblocking(true)?;

        let inner: TcpListener = socket.into();
        info!(addr = %inner.local_addr()?, "listening");
        Ok(Self { inner })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    /// Accept one pending connection, if any.
    pub fn poll_accept(&self, config: FrameConfig) -> Result<Option<Connection>, TransportError> {
        match self.inner.accept() {
            Ok((stream, addr)) => {
                info!(%addr, "accepted connection");
                Ok(Some(Connection::from_stream(stream, config)?))
            }
            Err(err) if err.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(err) => Err(TransportError::Io(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectPolicy;
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    #[test]
    fn poll_accept_is_nonblocking_when_idle() {
        let listener =
            Listener::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)).unwrap();
        assert!(listener.poll_accept(FrameConfig::default()).unwrap().is_none());
    }

    #[test]
    fn accepts_a_pending_connection() {
        let listener =
            Listener::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)).unwrap();
        let addr = listener.local_addr().unwrap();
        let _client = Connection::connect(
            addr,
            ConnectPolicy {
                timeout: Duration::from_millis(500),
                attempts: 1,
            },
            FrameConfig::default(),
        )
        .unwrap();

        let mut accepted = None;
        for _ in 0..100 {
            if let Some(conn) = listener.poll_accept(FrameConfig::default()).unwrap() {
                accepted = Some(conn);
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(accepted.is_some());
    }
}
