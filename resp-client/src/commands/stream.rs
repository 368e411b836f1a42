use resp_proto::{Request, Value};

use super::invalid;
use crate::client::Client;
use crate::connection::Connection;
use crate::reply::{bool_reply, bulk_reply, integer_reply, ok_reply};
use crate::stream::{
    XAutoClaimReply, XClaimReply, XId, XIdArg, XInfoConsumer, XInfoGroup, XInfoStream,
    XInfoStreamFull, XMessage, XPendingCount, XPendingSummary, XReadStream, parse_xautoclaim_reply,
    parse_xclaim_reply, parse_xid, parse_xinfo_consumers, parse_xinfo_groups, parse_xinfo_stream,
    parse_xinfo_stream_full, parse_xmessage, parse_xpending_counts, parse_xpending_summary,
    parse_xread_reply,
};
use crate::Error;

// ── Options ─────────────────────────────────────────────────────────────

/// What a trim keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimStrategy {
    /// Keep at most this many entries.
    MaxLen(u64),
    /// Drop entries with ids below this one.
    MinId(XIdArg),
}

/// A trim clause for `XADD` or `XTRIM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamTrim {
    pub strategy: TrimStrategy,
    /// Trim in whole radix-tree nodes (`~`).
    pub approx: bool,
    /// Cap on entries evicted per call. Sent only with `approx`.
    pub limit: Option<u64>,
}

impl StreamTrim {
    pub fn maxlen(n: u64) -> Self {
        Self {
            strategy: TrimStrategy::MaxLen(n),
            approx: false,
            limit: None,
        }
    }

    pub fn minid(id: impl Into<XIdArg>) -> Self {
        Self {
            strategy: TrimStrategy::MinId(id.into()),
            approx: false,
            limit: None,
        }
    }

    pub fn approx(mut self) -> Self {
        self.approx = true;
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    fn push<'a>(&self, req: Request<'a>) -> Request<'a> {
        let req = match self.strategy {
            TrimStrategy::MaxLen(n) => req
                .arg(b"MAXLEN")
                .arg_flag(self.approx, b"~")
                .arg_uint(n),
            TrimStrategy::MinId(id) => req
                .arg(b"MINID")
                .arg_flag(self.approx, b"~")
                .arg_owned(id.write_token()),
        };
        match self.limit {
            Some(n) if self.approx => req.arg(b"LIMIT").arg_uint(n),
            _ => req,
        }
    }
}

/// Options for `XADD`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XAddOptions {
    /// Do not create the stream if it does not exist.
    pub nomkstream: bool,
    pub trim: Option<StreamTrim>,
}

/// Options for `XREAD`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XReadOptions {
    pub count: Option<u64>,
    /// Block up to this many milliseconds; 0 blocks indefinitely.
    pub block_ms: Option<u64>,
}

/// Options for `XREADGROUP`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XReadGroupOptions {
    pub count: Option<u64>,
    pub block_ms: Option<u64>,
    /// Do not add delivered entries to the pending list.
    pub noack: bool,
}

/// Options for `XCLAIM`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XClaimOptions {
    pub idle_ms: Option<u64>,
    pub time_ms: Option<u64>,
    pub retrycount: Option<u64>,
    pub force: bool,
    pub justid: bool,
    pub lastid: Option<XId>,
}

/// The extended `XPENDING` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XPendingOptions {
    /// Only entries idle at least this long.
    pub idle_ms: Option<u64>,
    pub start: XIdArg,
    pub end: XIdArg,
    pub count: u64,
    pub consumer: Option<String>,
}

impl XPendingOptions {
    /// The whole pending list, `count` entries at most.
    pub fn new(count: u64) -> Self {
        Self {
            idle_ms: None,
            start: XIdArg::Min,
            end: XIdArg::Max,
            count,
            consumer: None,
        }
    }
}

// ── Encoders ────────────────────────────────────────────────────────────

/// `XADD key [NOMKSTREAM] [MAXLEN|MINID [~] n [LIMIT l]] id field value ...`.
pub fn xadd<'a, F, V>(
    key: &'a [u8],
    id: &XIdArg,
    fields: impl IntoIterator<Item = (F, V)>,
    options: &XAddOptions,
) -> Result<Request<'a>, Error>
where
    F: AsRef<[u8]>,
    V: AsRef<[u8]>,
{
    let mut req = Request::cmd(b"XADD")
        .arg(key)
        .arg_flag(options.nomkstream, b"NOMKSTREAM");
    if let Some(ref trim) = options.trim {
        req = trim.push(req);
    }
    let mut req = req.arg_owned(id.write_token());
    let before = req.len();
    for (f, v) in fields {
        req = req.arg_owned(f.as_ref()).arg_owned(v.as_ref());
    }
    if req.len() == before {
        return Err(invalid("XADD requires at least one field/value pair"));
    }
    Ok(req)
}

/// `XTRIM key MAXLEN|MINID [~] n [LIMIT l]`.
pub fn xtrim<'a>(key: &'a [u8], trim: &StreamTrim) -> Request<'a> {
    trim.push(Request::cmd(b"XTRIM").arg(key))
}

fn push_streams<'a, K: AsRef<[u8]>>(
    mut req: Request<'a>,
    command: &str,
    streams: &[(K, XIdArg)],
) -> Result<Request<'a>, Error> {
    if streams.is_empty() {
        return Err(invalid(format!("{command} requires at least one stream")));
    }
    req = req.arg(b"STREAMS");
    for (key, _) in streams {
        req = req.arg_owned(key.as_ref());
    }
    for (_, id) in streams {
        req = req.arg_owned(id.range_token());
    }
    Ok(req)
}

fn push_count_block(mut req: Request<'_>, count: Option<u64>, block_ms: Option<u64>) -> Request<'_> {
    if let Some(count) = count {
        req = req.arg(b"COUNT").arg_uint(count);
    }
    if let Some(ms) = block_ms {
        req = req.arg(b"BLOCK").arg_uint(ms);
    }
    req
}

/// `XREAD [COUNT n] [BLOCK ms] STREAMS key ... id ...`.
pub fn xread<K: AsRef<[u8]>>(
    options: &XReadOptions,
    streams: &[(K, XIdArg)],
) -> Result<Request<'static>, Error> {
    let req = push_count_block(Request::cmd(b"XREAD"), options.count, options.block_ms);
    push_streams(req, "XREAD", streams)
}

/// `XREADGROUP GROUP g c [COUNT n] [BLOCK ms] [NOACK] STREAMS key ... id ...`.
pub fn xreadgroup<'a, K: AsRef<[u8]>>(
    group: &'a [u8],
    consumer: &'a [u8],
    options: &XReadGroupOptions,
    streams: &[(K, XIdArg)],
) -> Result<Request<'a>, Error> {
    let req = Request::cmd(b"XREADGROUP")
        .arg(b"GROUP")
        .arg(group)
        .arg(consumer);
    let req = push_count_block(req, options.count, options.block_ms).arg_flag(options.noack, b"NOACK");
    push_streams(req, "XREADGROUP", streams)
}

/// `XCLAIM key group consumer min-idle id ... [IDLE ms] [TIME ms]
/// [RETRYCOUNT n] [FORCE] [JUSTID] [LASTID id]`.
pub fn xclaim<'a, I: Into<XIdArg>>(
    key: &'a [u8],
    group: &'a [u8],
    consumer: &'a [u8],
    min_idle_ms: u64,
    ids: impl IntoIterator<Item = I>,
    options: &XClaimOptions,
) -> Result<Request<'a>, Error> {
    let mut req = Request::cmd(b"XCLAIM")
        .arg(key)
        .arg(group)
        .arg(consumer)
        .arg_uint(min_idle_ms);
    let before = req.len();
    for id in ids {
        req = req.arg_owned(id.into().write_token());
    }
    if req.len() == before {
        return Err(invalid("XCLAIM requires at least one id"));
    }
    if let Some(ms) = options.idle_ms {
        req = req.arg(b"IDLE").arg_uint(ms);
    }
    if let Some(ms) = options.time_ms {
        req = req.arg(b"TIME").arg_uint(ms);
    }
    if let Some(n) = options.retrycount {
        req = req.arg(b"RETRYCOUNT").arg_uint(n);
    }
    req = req
        .arg_flag(options.force, b"FORCE")
        .arg_flag(options.justid, b"JUSTID");
    if let Some(id) = options.lastid {
        req = req.arg(b"LASTID").arg_owned(id.to_string());
    }
    Ok(req)
}

/// `XAUTOCLAIM key group consumer min-idle start [COUNT n] [JUSTID]`.
pub fn xautoclaim<'a>(
    key: &'a [u8],
    group: &'a [u8],
    consumer: &'a [u8],
    min_idle_ms: u64,
    start: &XIdArg,
    count: Option<u64>,
    justid: bool,
) -> Request<'a> {
    let mut req = Request::cmd(b"XAUTOCLAIM")
        .arg(key)
        .arg(group)
        .arg(consumer)
        .arg_uint(min_idle_ms)
        .arg_owned(start.write_token());
    if let Some(count) = count {
        req = req.arg(b"COUNT").arg_uint(count);
    }
    req.arg_flag(justid, b"JUSTID")
}

/// `XPENDING key group [IDLE ms] start end count [consumer]`.
pub fn xpending<'a>(key: &'a [u8], group: &'a [u8], options: &'a XPendingOptions) -> Request<'a> {
    let mut req = Request::cmd(b"XPENDING").arg(key).arg(group);
    if let Some(ms) = options.idle_ms {
        req = req.arg(b"IDLE").arg_uint(ms);
    }
    req = req
        .arg_owned(options.start.range_token())
        .arg_owned(options.end.range_token())
        .arg_uint(options.count);
    if let Some(ref consumer) = options.consumer {
        req = req.arg(consumer.as_bytes());
    }
    req
}

fn entries_reply(context: &'static str, raw: &Value) -> Result<Vec<XMessage>, Error> {
    match raw {
        Value::Array(items) => items.iter().map(parse_xmessage).collect(),
        Value::Null => Ok(Vec::new()),
        _ => Err(Error::malformed(context, raw)),
    }
}

fn range_request<'a>(
    name: &'static [u8],
    key: &'a [u8],
    first: &XIdArg,
    second: &XIdArg,
    count: Option<u64>,
) -> Request<'a> {
    let req = Request::cmd(name)
        .arg(key)
        .arg_owned(first.range_token())
        .arg_owned(second.range_token());
    match count {
        Some(n) => req.arg(b"COUNT").arg_uint(n),
        None => req,
    }
}

// ── Commands ────────────────────────────────────────────────────────────

impl<C: Connection> Client<C> {
    /// Append an entry. Returns its id, or `None` if `NOMKSTREAM` was set and
    /// the stream does not exist.
    pub async fn xadd<F, V>(
        &mut self,
        key: impl AsRef<[u8]>,
        id: &XIdArg,
        fields: impl IntoIterator<Item = (F, V)>,
        options: &XAddOptions,
    ) -> Result<Option<XId>, Error>
    where
        F: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let req = xadd(key.as_ref(), id, fields, options)?;
        let raw = self.exec(&req).await?;
        match bulk_reply(raw.clone())? {
            Some(text) => parse_xid(&text).map(Some).map_err(|_| Error::malformed("XADD", &raw)),
            None => Ok(None),
        }
    }

    pub async fn xlen(&mut self, key: impl AsRef<[u8]>) -> Result<i64, Error> {
        integer_reply(self.exec(&Request::cmd(b"XLEN").arg(key.as_ref())).await?)
    }

    /// Entries with ids in `[start, end]`, oldest first.
    pub async fn xrange(
        &mut self,
        key: impl AsRef<[u8]>,
        start: &XIdArg,
        end: &XIdArg,
        count: Option<u64>,
    ) -> Result<Vec<XMessage>, Error> {
        let req = range_request(b"XRANGE", key.as_ref(), start, end, count);
        entries_reply("XRANGE", &self.exec(&req).await?)
    }

    /// Entries with ids in `[start, end]`, newest first. Bounds are given
    /// high then low, as on the wire.
    pub async fn xrevrange(
        &mut self,
        key: impl AsRef<[u8]>,
        end: &XIdArg,
        start: &XIdArg,
        count: Option<u64>,
    ) -> Result<Vec<XMessage>, Error> {
        let req = range_request(b"XREVRANGE", key.as_ref(), end, start, count);
        entries_reply("XREVRANGE", &self.exec(&req).await?)
    }

    /// Returns the number of entries deleted.
    pub async fn xdel<I: Into<XIdArg>>(
        &mut self,
        key: impl AsRef<[u8]>,
        ids: impl IntoIterator<Item = I>,
    ) -> Result<i64, Error> {
        let mut req = Request::cmd(b"XDEL").arg(key.as_ref());
        for id in ids {
            req = req.arg_owned(id.into().write_token());
        }
        if req.len() == 2 {
            return Err(invalid("XDEL requires at least one id"));
        }
        integer_reply(self.exec(&req).await?)
    }

    /// Returns the number of entries evicted.
    pub async fn xtrim(&mut self, key: impl AsRef<[u8]>, trim: &StreamTrim) -> Result<i64, Error> {
        integer_reply(self.exec(&xtrim(key.as_ref(), trim)).await?)
    }

    /// Read from one or more streams after the given ids. A blocking read
    /// that times out yields an empty vector.
    pub async fn xread<K: AsRef<[u8]>>(
        &mut self,
        options: &XReadOptions,
        streams: &[(K, XIdArg)],
    ) -> Result<Vec<XReadStream>, Error> {
        let req = xread(options, streams)?;
        parse_xread_reply(&self.exec(&req).await?)
    }

    /// Read as `consumer` in `group`. Use [`XIdArg::New`] for entries never
    /// delivered to the group, or an id to re-read this consumer's pending
    /// entries.
    pub async fn xreadgroup<K: AsRef<[u8]>>(
        &mut self,
        group: impl AsRef<[u8]>,
        consumer: impl AsRef<[u8]>,
        options: &XReadGroupOptions,
        streams: &[(K, XIdArg)],
    ) -> Result<Vec<XReadStream>, Error> {
        let req = xreadgroup(group.as_ref(), consumer.as_ref(), options, streams)?;
        parse_xread_reply(&self.exec(&req).await?)
    }

    /// Acknowledge entries. Returns how many were pending.
    pub async fn xack<I: Into<XIdArg>>(
        &mut self,
        key: impl AsRef<[u8]>,
        group: impl AsRef<[u8]>,
        ids: impl IntoIterator<Item = I>,
    ) -> Result<i64, Error> {
        let mut req = Request::cmd(b"XACK").arg(key.as_ref()).arg(group.as_ref());
        for id in ids {
            req = req.arg_owned(id.into().write_token());
        }
        if req.len() == 3 {
            return Err(invalid("XACK requires at least one id"));
        }
        integer_reply(self.exec(&req).await?)
    }

    /// Take ownership of pending entries idle for at least `min_idle_ms`.
    pub async fn xclaim<I: Into<XIdArg>>(
        &mut self,
        key: impl AsRef<[u8]>,
        group: impl AsRef<[u8]>,
        consumer: impl AsRef<[u8]>,
        min_idle_ms: u64,
        ids: impl IntoIterator<Item = I>,
        options: &XClaimOptions,
    ) -> Result<XClaimReply, Error> {
        let req = xclaim(
            key.as_ref(),
            group.as_ref(),
            consumer.as_ref(),
            min_idle_ms,
            ids,
            options,
        )?;
        parse_xclaim_reply(&self.exec(&req).await?, options.justid)
    }

    /// Scan the pending list from `start` and claim idle entries.
    #[allow(clippy::too_many_arguments)]
    pub async fn xautoclaim(
        &mut self,
        key: impl AsRef<[u8]>,
        group: impl AsRef<[u8]>,
        consumer: impl AsRef<[u8]>,
        min_idle_ms: u64,
        start: &XIdArg,
        count: Option<u64>,
        justid: bool,
    ) -> Result<XAutoClaimReply, Error> {
        let req = xautoclaim(
            key.as_ref(),
            group.as_ref(),
            consumer.as_ref(),
            min_idle_ms,
            start,
            count,
            justid,
        );
        parse_xautoclaim_reply(&self.exec(&req).await?, justid)
    }

    /// The `XPENDING key group` summary.
    pub async fn xpending_summary(
        &mut self,
        key: impl AsRef<[u8]>,
        group: impl AsRef<[u8]>,
    ) -> Result<XPendingSummary, Error> {
        let req = Request::cmd(b"XPENDING").arg(key.as_ref()).arg(group.as_ref());
        parse_xpending_summary(&self.exec(&req).await?)
    }

    /// Pending entries in a range, optionally for one consumer.
    pub async fn xpending(
        &mut self,
        key: impl AsRef<[u8]>,
        group: impl AsRef<[u8]>,
        options: &XPendingOptions,
    ) -> Result<Vec<XPendingCount>, Error> {
        let req = xpending(key.as_ref(), group.as_ref(), options);
        parse_xpending_counts(&self.exec(&req).await?)
    }

    // ── Consumer groups ─────────────────────────────────────────────────

    /// `XGROUP CREATE key group id [MKSTREAM] [ENTRIESREAD n]`.
    pub async fn xgroup_create(
        &mut self,
        key: impl AsRef<[u8]>,
        group: impl AsRef<[u8]>,
        id: &XIdArg,
        mkstream: bool,
        entries_read: Option<u64>,
    ) -> Result<(), Error> {
        let mut req = Request::cmd(b"XGROUP")
            .arg(b"CREATE")
            .arg(key.as_ref())
            .arg(group.as_ref())
            .arg_owned(id.write_token())
            .arg_flag(mkstream, b"MKSTREAM");
        if let Some(n) = entries_read {
            req = req.arg(b"ENTRIESREAD").arg_uint(n);
        }
        ok_reply(self.exec(&req).await?)
    }

    /// Move the group's last-delivered id.
    pub async fn xgroup_setid(
        &mut self,
        key: impl AsRef<[u8]>,
        group: impl AsRef<[u8]>,
        id: &XIdArg,
    ) -> Result<(), Error> {
        let req = Request::cmd(b"XGROUP")
            .arg(b"SETID")
            .arg(key.as_ref())
            .arg(group.as_ref())
            .arg_owned(id.write_token());
        ok_reply(self.exec(&req).await?)
    }

    /// Returns whether the group existed.
    pub async fn xgroup_destroy(
        &mut self,
        key: impl AsRef<[u8]>,
        group: impl AsRef<[u8]>,
    ) -> Result<bool, Error> {
        let req = Request::cmd(b"XGROUP")
            .arg(b"DESTROY")
            .arg(key.as_ref())
            .arg(group.as_ref());
        bool_reply(self.exec(&req).await?)
    }

    /// Returns whether the consumer was created.
    pub async fn xgroup_createconsumer(
        &mut self,
        key: impl AsRef<[u8]>,
        group: impl AsRef<[u8]>,
        consumer: impl AsRef<[u8]>,
    ) -> Result<bool, Error> {
        let req = Request::cmd(b"XGROUP")
            .arg(b"CREATECONSUMER")
            .arg(key.as_ref())
            .arg(group.as_ref())
            .arg(consumer.as_ref());
        bool_reply(self.exec(&req).await?)
    }

    /// Returns the number of entries the consumer still had pending.
    pub async fn xgroup_delconsumer(
        &mut self,
        key: impl AsRef<[u8]>,
        group: impl AsRef<[u8]>,
        consumer: impl AsRef<[u8]>,
    ) -> Result<i64, Error> {
        let req = Request::cmd(b"XGROUP")
            .arg(b"DELCONSUMER")
            .arg(key.as_ref())
            .arg(group.as_ref())
            .arg(consumer.as_ref());
        integer_reply(self.exec(&req).await?)
    }

    // ── Introspection ───────────────────────────────────────────────────

    pub async fn xinfo_stream(&mut self, key: impl AsRef<[u8]>) -> Result<XInfoStream, Error> {
        let req = Request::cmd(b"XINFO").arg(b"STREAM").arg(key.as_ref());
        parse_xinfo_stream(&self.exec(&req).await?)
    }

    /// `XINFO STREAM key FULL [COUNT n]`.
    pub async fn xinfo_stream_full(
        &mut self,
        key: impl AsRef<[u8]>,
        count: Option<u64>,
    ) -> Result<XInfoStreamFull, Error> {
        let mut req = Request::cmd(b"XINFO")
            .arg(b"STREAM")
            .arg(key.as_ref())
            .arg(b"FULL");
        if let Some(n) = count {
            req = req.arg(b"COUNT").arg_uint(n);
        }
        parse_xinfo_stream_full(&self.exec(&req).await?)
    }

    pub async fn xinfo_groups(&mut self, key: impl AsRef<[u8]>) -> Result<Vec<XInfoGroup>, Error> {
        let req = Request::cmd(b"XINFO").arg(b"GROUPS").arg(key.as_ref());
        parse_xinfo_groups(&self.exec(&req).await?)
    }

    pub async fn xinfo_consumers(
        &mut self,
        key: impl AsRef<[u8]>,
        group: impl AsRef<[u8]>,
    ) -> Result<Vec<XInfoConsumer>, Error> {
        let req = Request::cmd(b"XINFO")
            .arg(b"CONSUMERS")
            .arg(key.as_ref())
            .arg(group.as_ref());
        parse_xinfo_consumers(&self.exec(&req).await?)
    }
}
