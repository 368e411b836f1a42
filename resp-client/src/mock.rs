//! In-memory [`Connection`] for tests.
//!
//! Replies are scripted up front (or pushed while a test runs) and every byte
//! the client writes is captured for inspection. Enabled by the `mock`
//! feature.

use std::collections::VecDeque;
use std::io;

use bytes::BytesMut;
use resp_proto::Value;

use crate::connection::Connection;

/// A scripted connection that never touches the network.
///
/// Once the scripted bytes run out, reads report end of stream.
#[derive(Debug, Default)]
pub struct MockConnection {
    inbound: VecDeque<u8>,
    written: Vec<u8>,
    chunk: Option<usize>,
    connected: bool,
    closed: bool,
}

impl MockConnection {
    /// A mock that has not been connected yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock that is already connected.
    pub fn connected() -> Self {
        Self {
            connected: true,
            ..Self::default()
        }
    }

    /// Queue an encoded reply.
    pub fn with_reply(mut self, value: &Value) -> Self {
        self.push_reply(value);
        self
    }

    /// Queue several encoded replies in order.
    pub fn with_replies<'v>(mut self, values: impl IntoIterator<Item = &'v Value>) -> Self {
        for value in values {
            self.push_reply(value);
        }
        self
    }

    /// Queue raw bytes exactly as given.
    pub fn with_raw(mut self, bytes: &[u8]) -> Self {
        self.push_raw(bytes);
        self
    }

    /// Deliver at most `n` bytes per read, to exercise partial frames.
    pub fn chunked(mut self, n: usize) -> Self {
        self.chunk = Some(n.max(1));
        self
    }

    /// Queue an encoded reply.
    pub fn push_reply(&mut self, value: &Value) {
        self.inbound.extend(value.to_vec());
    }

    /// Queue raw bytes.
    pub fn push_raw(&mut self, bytes: &[u8]) {
        self.inbound.extend(bytes.iter().copied());
    }

    /// Bytes not yet read by the client.
    pub fn pending(&self) -> usize {
        self.inbound.len()
    }

    /// Everything written so far.
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Drain the captured output.
    pub fn take_written(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.written)
    }

    /// Decode the captured output into commands, each a list of arguments
    /// including the command name.
    pub fn written_commands(&self) -> Vec<Vec<Vec<u8>>> {
        let mut commands = Vec::new();
        let mut rest = &self.written[..];
        while let Ok((value, consumed)) = Value::parse(rest) {
            let args = value
                .as_array()
                .unwrap_or_default()
                .iter()
                .map(|arg| arg.as_bytes().unwrap_or_default().to_vec())
                .collect();
            commands.push(args);
            rest = &rest[consumed..];
        }
        commands
    }
}

impl Connection for MockConnection {
    async fn connect(&mut self) -> io::Result<()> {
        self.connected = true;
        self.closed = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected && !self.closed
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        if !self.is_connected() {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "mock not connected"));
        }
        self.written.extend_from_slice(data);
        Ok(())
    }

    async fn read_buf(&mut self, buf: &mut BytesMut) -> io::Result<usize> {
        if !self.is_connected() {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "mock not connected"));
        }
        let n = self
            .chunk
            .map_or(self.inbound.len(), |c| c.min(self.inbound.len()));
        if n == 0 {
            self.closed = true;
            return Ok(0);
        }
        buf.extend(self.inbound.drain(..n));
        Ok(n)
    }

    async fn close(&mut self) -> io::Result<()> {
        self.closed = true;
        Ok(())
    }
}
