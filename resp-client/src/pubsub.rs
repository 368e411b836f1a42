//! Publish/subscribe.
//!
//! A connection in subscribed mode only accepts (P)(UN)SUBSCRIBE and PING, so
//! [`Client::subscribe`] hands the client over to a [`Subscriber`] that
//! exposes exactly those commands. The client comes back through
//! [`Subscriber::into_client`] once every subscription is gone.

use std::collections::HashSet;

use bytes::Bytes;
use resp_proto::{Request, Value};
use tracing::{debug, trace};

use crate::client::Client;
use crate::connection::Connection;
use crate::reply::{array_reply, integer_reply, pairs_reply};
use crate::Error;

/// A message delivered to a subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubSubMessage {
    /// Channel the message was published to.
    pub channel: Bytes,
    /// Pattern that matched, for `PSUBSCRIBE` deliveries.
    pub pattern: Option<Bytes>,
    pub payload: Bytes,
}

/// A client in subscribed mode.
///
/// The message source stays open while the server reports subscriptions or
/// while any (un)subscribe ack or PING reply is still unread, so the client
/// only comes back once the connection is in step with the server.
pub struct Subscriber<C: Connection> {
    client: Client<C>,
    /// Server-reported subscription count from the last ack.
    subscriptions: i64,
    /// Acks and PING replies sent for but not yet read.
    pending_replies: usize,
    /// Channels and patterns the server will hold once every sent command
    /// has been processed.
    channels: HashSet<Vec<u8>>,
    patterns: HashSet<Vec<u8>>,
    closed: bool,
}

impl<C: Connection> Subscriber<C> {
    fn new(client: Client<C>) -> Self {
        Self {
            client,
            subscriptions: 0,
            pending_replies: 0,
            channels: HashSet::new(),
            patterns: HashSet::new(),
            closed: false,
        }
    }

    /// Subscribe to more channels.
    pub async fn subscribe<K: AsRef<[u8]>>(
        &mut self,
        channels: impl IntoIterator<Item = K>,
    ) -> Result<(), Error> {
        self.send_subscribe(Kind::Channel, channels).await
    }

    /// Subscribe to more patterns.
    pub async fn psubscribe<K: AsRef<[u8]>>(
        &mut self,
        patterns: impl IntoIterator<Item = K>,
    ) -> Result<(), Error> {
        self.send_subscribe(Kind::Pattern, patterns).await
    }

    /// Unsubscribe from channels. An empty list unsubscribes from all of them.
    ///
    /// Does nothing once the message source has completed.
    pub async fn unsubscribe<K: AsRef<[u8]>>(
        &mut self,
        channels: impl IntoIterator<Item = K>,
    ) -> Result<(), Error> {
        self.send_unsubscribe(Kind::Channel, channels).await
    }

    /// Unsubscribe from patterns. An empty list unsubscribes from all of them.
    ///
    /// Does nothing once the message source has completed.
    pub async fn punsubscribe<K: AsRef<[u8]>>(
        &mut self,
        patterns: impl IntoIterator<Item = K>,
    ) -> Result<(), Error> {
        self.send_unsubscribe(Kind::Pattern, patterns).await
    }

    /// Send a PING. Its reply is consumed by [`next_message`](Self::next_message).
    pub async fn ping(&mut self) -> Result<(), Error> {
        if !self.is_active() {
            return Err(Error::InvalidArgument(
                "PING on a completed subscriber".to_string(),
            ));
        }
        self.send(&Request::ping()).await?;
        self.pending_replies += 1;
        Ok(())
    }

    /// Subscription count as last reported by the server.
    pub fn subscriptions(&self) -> i64 {
        self.subscriptions
    }

    /// Returns false once the message source has completed.
    pub fn is_active(&self) -> bool {
        !self.closed && (self.subscriptions > 0 || self.pending_replies > 0)
    }

    /// Wait for the next published message.
    ///
    /// Subscription acknowledgements and PING replies are consumed along the
    /// way. Returns `None` once no subscriptions remain and every ack has
    /// been read, or when the server closes the connection.
    pub async fn next_message(&mut self) -> Result<Option<PubSubMessage>, Error> {
        while self.is_active() {
            let value = match self.client.read_value().await {
                Ok(value) => value,
                Err(Error::ConnectionClosed) => {
                    debug!("connection closed in subscribed mode");
                    self.closed = true;
                    return Ok(None);
                }
                Err(e) => return Err(e),
            };

            let frame = match value {
                Value::Array(items) | Value::Push(items) => items,
                Value::SimpleString(ref s) if s.eq_ignore_ascii_case(b"PONG") => {
                    self.reply_read();
                    continue;
                }
                Value::Error(msg) => return Err(Error::redis(b"SUBSCRIBE", &msg)),
                other => return Err(Error::malformed("pub/sub", &other)),
            };
            if let Some(message) = self.handle_frame(frame)? {
                return Ok(Some(message));
            }
        }
        Ok(None)
    }

    /// Give the client back once the message source has completed.
    ///
    /// Returns the subscriber unchanged while subscriptions remain or acks
    /// are still unread.
    pub fn into_client(self) -> Result<Client<C>, Self> {
        if self.is_active() {
            Err(self)
        } else {
            Ok(self.client)
        }
    }

    fn reply_read(&mut self) {
        self.pending_replies = self.pending_replies.saturating_sub(1);
    }

    fn handle_frame(&mut self, frame: Vec<Value>) -> Result<Option<PubSubMessage>, Error> {
        let raw = Value::Array(frame);
        let Some(items) = raw.as_array() else {
            return Err(Error::malformed("pub/sub", &raw));
        };
        let kind = items
            .first()
            .and_then(Value::as_bytes)
            .map(<[u8]>::to_ascii_lowercase)
            .unwrap_or_default();

        match (kind.as_slice(), items) {
            (b"message", [_, channel, payload]) => Ok(Some(PubSubMessage {
                channel: bytes_of(channel, &raw)?,
                pattern: None,
                payload: bytes_of(payload, &raw)?,
            })),
            (b"pmessage", [_, pattern, channel, payload]) => Ok(Some(PubSubMessage {
                channel: bytes_of(channel, &raw)?,
                pattern: Some(bytes_of(pattern, &raw)?),
                payload: bytes_of(payload, &raw)?,
            })),
            (b"subscribe" | b"psubscribe", [_, _, count]) => {
                self.subscriptions = count_of(count, &raw)?;
                self.reply_read();
                trace!(subscriptions = self.subscriptions, "subscribed");
                Ok(None)
            }
            (b"unsubscribe" | b"punsubscribe", [_, _, count]) => {
                self.subscriptions = count_of(count, &raw)?;
                self.reply_read();
                trace!(
                    subscriptions = self.subscriptions,
                    pending = self.pending_replies,
                    "unsubscribed"
                );
                if !self.is_active() {
                    debug!("no subscriptions left");
                }
                Ok(None)
            }
            (b"pong", _) => {
                self.reply_read();
                Ok(None)
            }
            _ => Err(Error::malformed("pub/sub", &raw)),
        }
    }

    async fn send_subscribe<K: AsRef<[u8]>>(
        &mut self,
        kind: Kind,
        targets: impl IntoIterator<Item = K>,
    ) -> Result<(), Error> {
        let req = Request::cmd(kind.subscribe()).args(targets);
        if req.len() == 1 {
            return Err(Error::InvalidArgument(format!(
                "{} requires at least one target",
                req.name_lossy()
            )));
        }
        self.send(&req).await?;
        // One ack per target, duplicates included.
        self.pending_replies += req.len() - 1;
        let held = self.held_mut(kind);
        for target in req.arguments() {
            held.insert(target.to_vec());
        }
        Ok(())
    }

    async fn send_unsubscribe<K: AsRef<[u8]>>(
        &mut self,
        kind: Kind,
        targets: impl IntoIterator<Item = K>,
    ) -> Result<(), Error> {
        if !self.is_active() {
            debug!("unsubscribe on a completed subscriber ignored");
            return Ok(());
        }
        let req = Request::cmd(kind.unsubscribe()).args(targets);
        self.send(&req).await?;
        let held = self.held_mut(kind);
        let acks = if req.len() == 1 {
            // The server acks each held target, or once with a nil target
            // when there are none.
            let n = held.len().max(1);
            held.clear();
            n
        } else {
            for target in req.arguments() {
                held.remove(target);
            }
            req.len() - 1
        };
        self.pending_replies += acks;
        Ok(())
    }

    fn held_mut(&mut self, kind: Kind) -> &mut HashSet<Vec<u8>> {
        match kind {
            Kind::Channel => &mut self.channels,
            Kind::Pattern => &mut self.patterns,
        }
    }

    async fn send(&mut self, request: &Request<'_>) -> Result<(), Error> {
        debug!(command = %request.name_lossy(), "send");
        self.client.write(&request.to_vec()).await
    }
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    Channel,
    Pattern,
}

impl Kind {
    fn subscribe(self) -> &'static [u8] {
        match self {
            Kind::Channel => b"SUBSCRIBE",
            Kind::Pattern => b"PSUBSCRIBE",
        }
    }

    fn unsubscribe(self) -> &'static [u8] {
        match self {
            Kind::Channel => b"UNSUBSCRIBE",
            Kind::Pattern => b"PUNSUBSCRIBE",
        }
    }
}

fn bytes_of(value: &Value, frame: &Value) -> Result<Bytes, Error> {
    match value {
        Value::BulkString(b) | Value::SimpleString(b) => Ok(b.clone()),
        _ => Err(Error::malformed("pub/sub", frame)),
    }
}

fn count_of(value: &Value, frame: &Value) -> Result<i64, Error> {
    value
        .as_integer()
        .ok_or_else(|| Error::malformed("pub/sub", frame))
}

impl<C: Connection> Client<C> {
    /// Enter subscribed mode on `channels`.
    pub async fn subscribe<K: AsRef<[u8]>>(
        self,
        channels: impl IntoIterator<Item = K>,
    ) -> Result<Subscriber<C>, Error> {
        let mut subscriber = Subscriber::new(self);
        subscriber.subscribe(channels).await?;
        Ok(subscriber)
    }

    /// Enter subscribed mode on `patterns`.
    pub async fn psubscribe<K: AsRef<[u8]>>(
        self,
        patterns: impl IntoIterator<Item = K>,
    ) -> Result<Subscriber<C>, Error> {
        let mut subscriber = Subscriber::new(self);
        subscriber.psubscribe(patterns).await?;
        Ok(subscriber)
    }

    /// Post a message to a channel. Returns the number of receiving clients.
    pub async fn publish(
        &mut self,
        channel: impl AsRef<[u8]>,
        message: impl AsRef<[u8]>,
    ) -> Result<i64, Error> {
        let req = Request::cmd(b"PUBLISH")
            .arg(channel.as_ref())
            .arg(message.as_ref());
        integer_reply(self.exec(&req).await?)
    }

    /// Active channels, optionally filtered by a glob pattern (`PUBSUB CHANNELS`).
    pub async fn pubsub_channels(&mut self, pattern: Option<&str>) -> Result<Vec<Bytes>, Error> {
        let mut req = Request::cmd(b"PUBSUB").arg(b"CHANNELS");
        if let Some(pattern) = pattern {
            req = req.arg(pattern.as_bytes());
        }
        array_reply(self.exec(&req).await?)
    }

    /// Subscriber counts per channel (`PUBSUB NUMSUB`).
    pub async fn pubsub_numsub<K: AsRef<[u8]>>(
        &mut self,
        channels: impl IntoIterator<Item = K>,
    ) -> Result<Vec<(Bytes, i64)>, Error> {
        let req = Request::cmd(b"PUBSUB").arg(b"NUMSUB").args(channels);
        pairs_reply(self.exec(&req).await?)
    }

    /// Number of pattern subscriptions across all clients (`PUBSUB NUMPAT`).
    pub async fn pubsub_numpat(&mut self) -> Result<i64, Error> {
        integer_reply(self.exec(&Request::cmd(b"PUBSUB").arg(b"NUMPAT")).await?)
    }
}
