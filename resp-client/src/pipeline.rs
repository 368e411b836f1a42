//! Batched execution: pipelines and MULTI/EXEC transactions.
//!
//! Both builders borrow the [`Client`] mutably, so nothing else can be sent
//! on the connection until the batch is executed or dropped.

use resp_proto::{Request, Value};
use tracing::{debug, trace};

use crate::client::Client;
use crate::connection::Connection;
use crate::reply::ok_reply;
use crate::Error;

enum Slot {
    Queued(String),
    Invalid(Error),
}

/// Queued commands and their encoding.
#[derive(Default)]
struct Batch {
    slots: Vec<Slot>,
    buf: Vec<u8>,
}

impl Batch {
    fn push(&mut self, request: &Request<'_>) {
        request.encode_into(&mut self.buf);
        self.slots.push(Slot::Queued(request.name_lossy()));
    }

    fn push_result(&mut self, request: Result<Request<'_>, Error>) {
        match request {
            Ok(request) => self.push(&request),
            Err(e) => self.slots.push(Slot::Invalid(e)),
        }
    }

    fn queued(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, Slot::Queued(_)))
            .count()
    }
}

fn slot_result(name: &str, value: Value) -> Result<Value, Error> {
    match value {
        Value::Error(msg) => Err(Error::redis(name.as_bytes(), &msg)),
        value => Ok(value),
    }
}

// ── Pipeline ────────────────────────────────────────────────────────────

/// Accumulates commands into a single buffer and sends them as a batch.
///
/// Replies are read back in order after sending. Each command gets its own
/// result slot, so a failed command does not hide the others.
///
/// # Example
///
/// ```no_run
/// # use resp_client::{Client, Connection, Error, Request};
/// # async fn example<C: Connection>(client: &mut Client<C>) -> Result<(), Error> {
/// let results = client
///     .pipeline()
///     .cmd(&Request::cmd(b"SET").arg(b"k1").arg(b"v1"))
///     .cmd(&Request::get(b"k1"))
///     .execute()
///     .await?;
/// assert_eq!(results.len(), 2);
/// # Ok(())
/// # }
/// ```
#[must_use = "a pipeline does nothing until executed"]
pub struct Pipeline<'c, C: Connection> {
    client: &'c mut Client<C>,
    batch: Batch,
}

impl<'c, C: Connection> Pipeline<'c, C> {
    pub(crate) fn new(client: &'c mut Client<C>) -> Self {
        Self {
            client,
            batch: Batch::default(),
        }
    }

    /// Add a command.
    pub fn cmd(mut self, request: &Request<'_>) -> Self {
        self.batch.push(request);
        self
    }

    /// Add a command whose construction may have failed validation. A failed
    /// command occupies its result slot and is not sent.
    pub fn try_cmd(mut self, request: Result<Request<'_>, Error>) -> Self {
        self.batch.push_result(request);
        self
    }

    /// Number of queued commands, including invalid ones.
    pub fn len(&self) -> usize {
        self.batch.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.slots.is_empty()
    }

    /// Send every valid command in one write and collect one result per
    /// queued command, in order.
    ///
    /// The outer error is reserved for transport and protocol failures.
    pub async fn execute(self) -> Result<Vec<Result<Value, Error>>, Error> {
        let Self { client, batch } = self;
        if batch.slots.is_empty() {
            return Ok(Vec::new());
        }

        let queued = batch.queued();
        trace!(commands = queued, bytes = batch.buf.len(), "pipeline flush");
        if queued > 0 {
            client.write(&batch.buf).await?;
        }

        let mut results = Vec::with_capacity(batch.slots.len());
        for slot in batch.slots {
            match slot {
                Slot::Invalid(e) => results.push(Err(e)),
                Slot::Queued(name) => {
                    let value = client.read_value().await?;
                    results.push(slot_result(&name, value));
                }
            }
        }
        Ok(results)
    }
}

// ── Transaction ─────────────────────────────────────────────────────────

/// A MULTI/EXEC block.
///
/// Commands are queued locally and sent together with `MULTI` and `EXEC` in
/// a single write. If any queued command failed validation, nothing is sent.
#[must_use = "a transaction does nothing until executed"]
pub struct Transaction<'c, C: Connection> {
    client: &'c mut Client<C>,
    batch: Batch,
}

impl<'c, C: Connection> Transaction<'c, C> {
    pub(crate) fn new(client: &'c mut Client<C>) -> Self {
        Self {
            client,
            batch: Batch::default(),
        }
    }

    /// Add a command.
    pub fn cmd(mut self, request: &Request<'_>) -> Self {
        self.batch.push(request);
        self
    }

    /// Add a command whose construction may have failed validation. Any
    /// failure aborts the whole transaction with [`Error::ExecAbort`].
    pub fn try_cmd(mut self, request: Result<Request<'_>, Error>) -> Self {
        self.batch.push_result(request);
        self
    }

    pub fn len(&self) -> usize {
        self.batch.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.slots.is_empty()
    }

    /// Run the transaction and return one result per command, taken from the
    /// EXEC reply.
    ///
    /// Returns [`Error::TransactionDiscarded`] if a WATCHed key changed, and
    /// [`Error::Redis`] (from EXEC) if the server rejected a queued command.
    pub async fn execute(self) -> Result<Vec<Result<Value, Error>>, Error> {
        let Self { client, batch } = self;
        if batch.slots.is_empty() {
            return Ok(Vec::new());
        }

        let mut names = Vec::with_capacity(batch.slots.len());
        let mut invalid = Vec::new();
        for slot in batch.slots {
            match slot {
                Slot::Queued(name) => names.push(name),
                Slot::Invalid(e) => invalid.push(e.to_string()),
            }
        }
        if !invalid.is_empty() {
            debug!(errors = invalid.len(), "transaction aborted before MULTI");
            return Err(Error::ExecAbort(invalid.join("; ")));
        }

        let mut buf = Request::multi().to_vec();
        buf.extend_from_slice(&batch.buf);
        Request::exec().encode_into(&mut buf);
        trace!(commands = names.len(), bytes = buf.len(), "transaction flush");
        client.write(&buf).await?;

        // MULTI ack, one QUEUED per command, then EXEC. All of them are read
        // before reporting anything so the connection stays in step.
        let multi = client.read_value().await?;
        let mut rejected = None;
        for name in &names {
            let ack = client.read_value().await?;
            if let Value::Error(msg) = ack {
                debug!(command = %name, "command rejected while queueing");
                rejected.get_or_insert(Error::redis(name.as_bytes(), &msg));
            }
        }
        let exec = client.read_value().await?;

        if let Value::Error(msg) = multi {
            return Err(Error::redis(b"MULTI", &msg));
        }
        ok_reply(multi)?;

        match exec {
            Value::Error(msg) => Err(Error::redis(b"EXEC", &msg)),
            Value::Null => Err(Error::TransactionDiscarded),
            Value::Array(items) => {
                if let Some(e) = rejected {
                    return Err(e);
                }
                if items.len() != names.len() {
                    return Err(Error::UnexpectedResponse);
                }
                Ok(names
                    .iter()
                    .zip(items)
                    .map(|(name, value)| slot_result(name, value))
                    .collect())
            }
            _ => Err(Error::UnexpectedResponse),
        }
    }
}

impl<C: Connection> Client<C> {
    /// Start a pipeline on this connection.
    pub fn pipeline(&mut self) -> Pipeline<'_, C> {
        Pipeline::new(self)
    }

    /// Start a MULTI/EXEC transaction on this connection.
    pub fn transaction(&mut self) -> Transaction<'_, C> {
        Transaction::new(self)
    }

    /// Watch keys for changes before a transaction (`WATCH`).
    pub async fn watch<K: AsRef<[u8]>>(
        &mut self,
        keys: impl IntoIterator<Item = K>,
    ) -> Result<(), Error> {
        let req = Request::cmd(b"WATCH").args(keys);
        if req.len() == 1 {
            return Err(Error::InvalidArgument("WATCH requires at least one key".into()));
        }
        ok_reply(self.exec(&req).await?)
    }

    /// Forget all watched keys (`UNWATCH`).
    pub async fn unwatch(&mut self) -> Result<(), Error> {
        ok_reply(self.exec(&Request::cmd(b"UNWATCH")).await?)
    }
}
