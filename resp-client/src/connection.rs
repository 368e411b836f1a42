//! Byte transport consumed by [`Client`](crate::Client).
//!
//! The client only needs to write whole requests and to append whatever bytes
//! have arrived to its read buffer. Everything else (TLS, reconnection,
//! authentication policy) belongs to the transport or the caller.

use std::io;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::config::ConnectionConfig;

/// A bidirectional byte stream to a Redis server.
#[allow(async_fn_in_trait)]
pub trait Connection {
    /// Establish the underlying transport.
    async fn connect(&mut self) -> io::Result<()>;

    /// Returns true once `connect()` has succeeded and the transport is open.
    fn is_connected(&self) -> bool;

    /// Returns true after `close()` or once the peer has shut the stream.
    fn is_closed(&self) -> bool;

    /// Write all of `data`.
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Append received bytes to `buf`, waiting until at least one byte is
    /// available. Returns 0 at end of stream.
    async fn read_buf(&mut self, buf: &mut BytesMut) -> io::Result<usize>;

    /// Shut the transport down. Further reads and writes fail.
    async fn close(&mut self) -> io::Result<()>;
}

/// A plain TCP connection built on tokio.
#[derive(Debug)]
pub struct TcpConnection {
    addr: String,
    connect_timeout: Option<Duration>,
    nodelay: bool,
    stream: Option<TcpStream>,
    closed: bool,
}

impl TcpConnection {
    /// Create an unconnected TCP transport for `addr` (`host:port`).
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            connect_timeout: None,
            nodelay: true,
            stream: None,
            closed: false,
        }
    }

    /// Create a transport from configuration.
    pub fn from_config(config: &ConnectionConfig) -> Self {
        let mut conn = Self::new(config.addr.clone());
        if config.connect_timeout_ms > 0 {
            conn.connect_timeout = Some(Duration::from_millis(config.connect_timeout_ms));
        }
        conn.nodelay = config.nodelay;
        conn
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// The configured server address.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    fn stream(&mut self) -> io::Result<&mut TcpStream> {
        self.stream
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "not connected"))
    }
}

impl Connection for TcpConnection {
    async fn connect(&mut self) -> io::Result<()> {
        let connect = TcpStream::connect(self.addr.as_str());
        let stream = match self.connect_timeout {
            Some(timeout) => tokio::time::timeout(timeout, connect)
                .await
                .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "connect timed out"))??,
            None => connect.await?,
        };
        stream.set_nodelay(self.nodelay)?;
        info!(addr = %self.addr, "connected");
        self.stream = Some(stream);
        self.closed = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some() && !self.closed
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.stream()?.write_all(data).await
    }

    async fn read_buf(&mut self, buf: &mut BytesMut) -> io::Result<usize> {
        let n = self.stream()?.read_buf(buf).await?;
        if n == 0 {
            debug!(addr = %self.addr, "peer closed connection");
            self.closed = true;
        }
        Ok(n)
    }

    async fn close(&mut self) -> io::Result<()> {
        self.closed = true;
        if let Some(mut stream) = self.stream.take() {
            stream.shutdown().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_applies_settings() {
        let config = ConnectionConfig {
            addr: "127.0.0.1:7777".to_string(),
            connect_timeout_ms: 150,
            nodelay: false,
            read_buffer_size: 1024,
        };
        let conn = TcpConnection::from_config(&config);
        assert_eq!(conn.addr(), "127.0.0.1:7777");
        assert_eq!(conn.connect_timeout, Some(Duration::from_millis(150)));
        assert!(!conn.nodelay);
        assert!(!conn.is_connected());
        assert!(!conn.is_closed());
    }

    #[tokio::test]
    async fn io_before_connect_fails() {
        let mut conn = TcpConnection::new("127.0.0.1:6379");
        let err = conn.write_all(b"PING").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
    }

    #[tokio::test]
    async fn connect_and_exchange_bytes() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 14];
            sock.read_exact(&mut buf).await.unwrap();
            assert_eq!(&buf, b"*1\r\n$4\r\nPING\r\n");
            sock.write_all(b"+PONG\r\n").await.unwrap();
        });

        let mut conn = TcpConnection::new(addr.to_string()).connect_timeout(Duration::from_secs(1));
        conn.connect().await.unwrap();
        assert!(conn.is_connected());
        conn.write_all(b"*1\r\n$4\r\nPING\r\n").await.unwrap();

        let mut buf = BytesMut::new();
        while buf.len() < 7 {
            assert!(conn.read_buf(&mut buf).await.unwrap() > 0);
        }
        assert_eq!(&buf[..], b"+PONG\r\n");

        server.await.unwrap();
        conn.close().await.unwrap();
        assert!(conn.is_closed());
        assert!(!conn.is_connected());
    }
}
