use std::time::Instant;

use bytes::{Buf, BytesMut};
use resp_proto::{ParseOptions, Request, Value};
use tracing::{debug, trace, warn};

use crate::config::ClientConfig;
use crate::connection::{Connection, TcpConnection};
use crate::Error;

const DEFAULT_READ_BUFFER: usize = 16 * 1024;

// ── Command results ─────────────────────────────────────────────────────

/// Result metadata for a completed command, passed to the `on_result` callback.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// The command name as sent (`GET`, `XADD`, ...).
    pub command: String,
    /// Latency in nanoseconds (write → reply parsed).
    pub latency_ns: u64,
    /// Whether the command succeeded (no Redis error, no transport error).
    pub success: bool,
}

/// Options for [`Client::send_command`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendOptions {
    /// Return server error replies as `Value::Error` instead of `Error::Redis`.
    pub raw_errors: bool,
}

impl SendOptions {
    /// Options that pass server errors through as values.
    pub const fn raw_errors() -> Self {
        Self { raw_errors: true }
    }
}

// ── ClientMetrics ───────────────────────────────────────────────────────

/// Built-in histogram-based metrics, available when the `metrics` feature is
/// enabled. Not registered globally, the caller decides how to expose them.
#[cfg(feature = "metrics")]
pub struct ClientMetrics {
    /// Overall request latency histogram.
    pub latency: histogram::Histogram,
    /// Total requests completed.
    pub requests: u64,
    /// Total errors.
    pub errors: u64,
}

#[cfg(feature = "metrics")]
impl ClientMetrics {
    fn new() -> Self {
        Self {
            latency: histogram::Histogram::new(7, 64)
                .expect("grouping power 7 with 64-bit values is a valid histogram"),
            requests: 0,
            errors: 0,
        }
    }

    fn record(&mut self, result: &CommandResult) {
        self.requests += 1;
        let _ = self.latency.increment(result.latency_ns);
        if !result.success {
            self.errors += 1;
        }
    }
}

// ── ClientBuilder ───────────────────────────────────────────────────────

type ResultCallback = Box<dyn Fn(&CommandResult)>;

/// Builder for creating a [`Client`] with parser limits, per-request
/// callbacks and metrics.
pub struct ClientBuilder<C> {
    conn: C,
    parse_options: ParseOptions,
    read_buffer_size: usize,
    on_result: Option<ResultCallback>,
    #[cfg(feature = "metrics")]
    with_metrics: bool,
}

impl<C: Connection> ClientBuilder<C> {
    pub(crate) fn new(conn: C) -> Self {
        Self {
            conn,
            parse_options: ParseOptions::default(),
            read_buffer_size: DEFAULT_READ_BUFFER,
            on_result: None,
            #[cfg(feature = "metrics")]
            with_metrics: false,
        }
    }

    /// Apply parser limits and buffer sizing from a configuration.
    pub fn config(mut self, config: &ClientConfig) -> Self {
        self.parse_options = config.parse_options();
        self.read_buffer_size = config.connection.read_buffer_size;
        self
    }

    /// Limits applied to every reply.
    pub fn parse_options(mut self, options: ParseOptions) -> Self {
        self.parse_options = options;
        self
    }

    /// Initial read buffer capacity in bytes.
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// Register a callback invoked after each command completes.
    pub fn on_result<F: Fn(&CommandResult) + 'static>(mut self, f: F) -> Self {
        self.on_result = Some(Box::new(f));
        self
    }

    /// Enable built-in histogram tracking (requires `metrics` feature).
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self) -> Self {
        self.with_metrics = true;
        self
    }

    /// Build the client.
    pub fn build(self) -> Client<C> {
        Client {
            conn: self.conn,
            buf: BytesMut::with_capacity(self.read_buffer_size),
            parse_options: self.parse_options,
            poisoned: false,
            on_result: self.on_result,
            #[cfg(feature = "metrics")]
            metrics: if self.with_metrics {
                Some(ClientMetrics::new())
            } else {
                None
            },
        }
    }
}

// ── Client ──────────────────────────────────────────────────────────────

/// A RESP client owning a single connection.
///
/// Every call writes one request and reads exactly one reply, so methods take
/// `&mut self`. [`Client::pipeline`](crate::Pipeline) and
/// [`Client::transaction`](crate::Transaction) borrow the client for the
/// lifetime of the batch, and [`Client::subscribe`] consumes it.
///
/// A protocol or I/O failure closes the connection; every later call fails
/// with [`Error::ConnectionClosed`].
pub struct Client<C> {
    conn: C,
    buf: BytesMut,
    parse_options: ParseOptions,
    poisoned: bool,
    on_result: Option<ResultCallback>,
    #[cfg(feature = "metrics")]
    metrics: Option<ClientMetrics>,
}

impl Client<TcpConnection> {
    /// Connect over TCP using `config`.
    pub async fn connect_with_config(config: &ClientConfig) -> Result<Self, Error> {
        let mut conn = TcpConnection::from_config(&config.connection);
        conn.connect().await?;
        Ok(Client::builder(conn).config(config).build())
    }
}

impl<C: Connection> Client<C> {
    /// Create a new client wrapping a connection. No callbacks, no metrics.
    pub fn new(conn: C) -> Self {
        ClientBuilder::new(conn).build()
    }

    /// Connect `conn` if it is not open yet and wrap it.
    pub async fn connect(mut conn: C) -> Result<Self, Error> {
        if !conn.is_connected() {
            conn.connect().await?;
        }
        Ok(Self::new(conn))
    }

    /// Create a builder for a client with limits, callbacks and metrics.
    pub fn builder(conn: C) -> ClientBuilder<C> {
        ClientBuilder::new(conn)
    }

    /// Returns the underlying connection.
    pub fn conn(&self) -> &C {
        &self.conn
    }

    /// Returns the underlying connection mutably.
    pub fn conn_mut(&mut self) -> &mut C {
        &mut self.conn
    }

    /// Returns false once the connection is closed or was poisoned.
    pub fn is_connected(&self) -> bool {
        !self.poisoned && self.conn.is_connected()
    }

    /// Close the connection.
    pub async fn close(&mut self) -> Result<(), Error> {
        self.poisoned = true;
        self.buf.clear();
        self.conn.close().await?;
        Ok(())
    }

    /// Returns a reference to the built-in metrics, if enabled.
    #[cfg(feature = "metrics")]
    pub fn metrics(&self) -> Option<&ClientMetrics> {
        self.metrics.as_ref()
    }

    /// Returns a mutable reference to the built-in metrics, if enabled.
    #[cfg(feature = "metrics")]
    pub fn metrics_mut(&mut self) -> Option<&mut ClientMetrics> {
        self.metrics.as_mut()
    }

    // ── Instrumentation (private) ───────────────────────────────────────

    #[inline]
    fn is_instrumented(&self) -> bool {
        if self.on_result.is_some() {
            return true;
        }
        #[cfg(feature = "metrics")]
        if self.metrics.is_some() {
            return true;
        }
        false
    }

    #[inline]
    fn record(&mut self, result: &CommandResult) {
        if let Some(ref cb) = self.on_result {
            cb(result);
        }
        #[cfg(feature = "metrics")]
        if let Some(ref mut m) = self.metrics {
            m.record(result);
        }
    }

    // ── Request/reply ───────────────────────────────────────────────────

    /// Send a command and return its raw reply.
    ///
    /// A server error reply becomes [`Error::Redis`].
    pub async fn exec(&mut self, request: &Request<'_>) -> Result<Value, Error> {
        self.send_command(request, SendOptions::default()).await
    }

    /// Send a command and return its raw reply, with explicit options.
    pub async fn send_command(
        &mut self,
        request: &Request<'_>,
        options: SendOptions,
    ) -> Result<Value, Error> {
        if !self.is_instrumented() {
            return self.roundtrip(request, options).await;
        }
        let start = Instant::now();
        let result = self.roundtrip(request, options).await;
        let latency_ns = start.elapsed().as_nanos() as u64;
        self.record(&CommandResult {
            command: request.name_lossy(),
            latency_ns,
            success: matches!(result, Ok(ref v) if !v.is_error()),
        });
        result
    }

    async fn roundtrip(
        &mut self,
        request: &Request<'_>,
        options: SendOptions,
    ) -> Result<Value, Error> {
        debug!(command = %request.name_lossy(), args = request.len() - 1, "send");
        self.write(&request.to_vec()).await?;
        let value = self.read_value().await?;
        trace!(kind = value.kind(), "reply");
        match value {
            Value::Error(msg) if !options.raw_errors => Err(Error::redis(request.name(), &msg)),
            value => Ok(value),
        }
    }

    /// Write pre-encoded bytes.
    pub(crate) async fn write(&mut self, data: &[u8]) -> Result<(), Error> {
        if !self.is_connected() {
            return Err(Error::ConnectionClosed);
        }
        if let Err(e) = self.conn.write_all(data).await {
            return Err(self.poison(Error::Io(e)).await);
        }
        Ok(())
    }

    /// Read exactly one reply, buffering partial frames.
    pub(crate) async fn read_value(&mut self) -> Result<Value, Error> {
        loop {
            if !self.buf.is_empty() {
                match Value::parse_with_options(&self.buf, &self.parse_options) {
                    Ok((value, consumed)) => {
                        self.buf.advance(consumed);
                        return Ok(value);
                    }
                    Err(e) if e.is_incomplete() => {}
                    Err(e) => return Err(self.poison(Error::Protocol(e)).await),
                }
            }

            if !self.is_connected() {
                return Err(Error::ConnectionClosed);
            }
            match self.conn.read_buf(&mut self.buf).await {
                Ok(0) => {
                    debug!(buffered = self.buf.len(), "connection closed while awaiting reply");
                    self.poisoned = true;
                    return Err(Error::ConnectionClosed);
                }
                Ok(n) => trace!(bytes = n, "read"),
                Err(e) => return Err(self.poison(Error::Io(e)).await),
            }
        }
    }

    async fn poison(&mut self, err: Error) -> Error {
        warn!(error = %err, "closing connection after fatal error");
        self.poisoned = true;
        self.buf.clear();
        let _ = self.conn.close().await;
        err
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::MockConnection;

    #[tokio::test]
    async fn exec_returns_raw_reply() {
        let conn = MockConnection::connected().with_reply(&Value::bulk_string(b"v"));
        let mut client = Client::new(conn);
        let value = client.exec(&Request::get(b"k")).await.unwrap();
        assert_eq!(value, Value::bulk_string(b"v"));
        assert_eq!(
            client.conn().written(),
            b"*2\r\n$3\r\nGET\r\n$1\r\nk\r\n"
        );
    }

    #[tokio::test]
    async fn server_error_is_redis_error_and_not_fatal() {
        let conn = MockConnection::connected()
            .with_reply(&Value::error(b"ERR unknown command 'NOPE'"))
            .with_reply(&Value::simple_string(b"PONG"));
        let mut client = Client::new(conn);
        match client.exec(&Request::cmd(b"NOPE")).await {
            Err(Error::Redis { command, message }) => {
                assert_eq!(command, "NOPE");
                assert_eq!(message, "ERR unknown command 'NOPE'");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(client.is_connected());
        let pong = client.exec(&Request::ping()).await.unwrap();
        assert_eq!(pong, Value::simple_string(b"PONG"));
    }

    #[tokio::test]
    async fn raw_errors_pass_through() {
        let conn = MockConnection::connected().with_reply(&Value::error(b"ERR x"));
        let mut client = Client::new(conn);
        let value = client
            .send_command(&Request::cmd(b"X"), SendOptions::raw_errors())
            .await
            .unwrap();
        assert_eq!(value, Value::error(b"ERR x"));
    }

    #[tokio::test]
    async fn partial_frames_are_reassembled() {
        let reply = Value::array(vec![
            Value::bulk_string(b"a-long-enough-value"),
            Value::integer(42),
        ]);
        let conn = MockConnection::connected().with_reply(&reply).chunked(3);
        let mut client = Client::new(conn);
        assert_eq!(client.exec(&Request::cmd(b"X")).await.unwrap(), reply);
    }

    #[tokio::test]
    async fn never_connected_is_connection_closed() {
        let mut client = Client::new(MockConnection::new());
        let err = client.exec(&Request::ping()).await.unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed));
        assert!(client.conn().written().is_empty());
    }

    #[tokio::test]
    async fn connect_opens_the_transport() {
        let conn = MockConnection::new().with_reply(&Value::simple_string(b"PONG"));
        let mut client = Client::connect(conn).await.unwrap();
        assert!(client.is_connected());
        client.exec(&Request::ping()).await.unwrap();
    }

    #[tokio::test]
    async fn eof_while_awaiting_reply() {
        let mut client = Client::new(MockConnection::connected());
        let err = client.exec(&Request::ping()).await.unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed));
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn protocol_error_poisons_the_client() {
        let conn = MockConnection::connected()
            .with_raw(b"?garbage\r\n")
            .with_reply(&Value::simple_string(b"PONG"));
        let mut client = Client::new(conn);
        let err = client.exec(&Request::ping()).await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
        assert!(client.conn().is_closed());

        let err = client.exec(&Request::ping()).await.unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed));
        assert_eq!(client.conn().written_commands().len(), 1);
    }

    #[tokio::test]
    async fn bare_cr_in_status_line_poisons_instead_of_waiting() {
        let conn = MockConnection::connected()
            .with_raw(b"+OK\rX\r\n")
            .with_reply(&Value::simple_string(b"PONG"));
        let mut client = Client::new(conn);
        let err = client.exec(&Request::ping()).await.unwrap_err();
        assert!(matches!(err, Error::Protocol(resp_proto::ParseError::Protocol(_))));
        assert!(!client.is_connected());
        assert!(matches!(
            client.exec(&Request::ping()).await,
            Err(Error::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn parse_limits_apply() {
        let conn = MockConnection::connected().with_reply(&Value::bulk_string(b"0123456789"));
        let mut client = Client::builder(conn)
            .parse_options(ParseOptions::new().max_bulk_string_len(4))
            .build();
        let err = client.exec(&Request::get(b"k")).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(resp_proto::ParseError::BulkStringTooLong { len: 10, max: 4 })
        ));
    }

    #[tokio::test]
    async fn on_result_sees_every_command() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let conn = MockConnection::connected()
            .with_reply(&Value::simple_string(b"OK"))
            .with_reply(&Value::error(b"WRONGTYPE nope"));
        let mut client = Client::builder(conn)
            .on_result(move |r: &CommandResult| sink.borrow_mut().push((r.command.clone(), r.success)))
            .build();
        client.exec(&Request::cmd(b"SET").arg(b"k").arg(b"v")).await.unwrap();
        let _ = client.exec(&Request::cmd(b"LPUSH").arg(b"k").arg(b"x")).await;
        assert_eq!(
            *seen.borrow(),
            vec![("SET".to_string(), true), ("LPUSH".to_string(), false)]
        );
    }

    #[cfg(feature = "metrics")]
    #[tokio::test]
    async fn metrics_count_requests_and_errors() {
        let conn = MockConnection::connected()
            .with_reply(&Value::simple_string(b"PONG"))
            .with_reply(&Value::error(b"ERR"));
        let mut client = Client::builder(conn).with_metrics().build();
        client.exec(&Request::ping()).await.unwrap();
        let _ = client.exec(&Request::cmd(b"BAD")).await;
        let metrics = client.metrics().unwrap();
        assert_eq!(metrics.requests, 2);
        assert_eq!(metrics.errors, 1);
    }
}
