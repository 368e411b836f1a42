use resp_proto::Value;

use super::{
    XAutoClaimReply, XClaimReply, XConsumerDetail, XConsumerPendingEntry, XGroupDetail,
    XGroupPendingEntry, XId, XInfoConsumer, XInfoGroup, XInfoStream, XInfoStreamFull, XMessage,
    XPendingConsumer, XPendingCount, XPendingSummary, XReadStream, parse_xid,
};
use crate::Error;

// ── Scalars ─────────────────────────────────────────────────────────────

fn text<'v>(value: &'v Value, context: &'static str, raw: &Value) -> Result<&'v str, Error> {
    value
        .as_bytes()
        .and_then(|b| std::str::from_utf8(b).ok())
        .ok_or_else(|| Error::malformed(context, raw))
}

fn string(value: &Value, context: &'static str, raw: &Value) -> Result<String, Error> {
    text(value, context, raw).map(str::to_owned)
}

fn xid(value: &Value, context: &'static str, raw: &Value) -> Result<XId, Error> {
    parse_xid(text(value, context, raw)?).map_err(|_| Error::malformed(context, raw))
}

fn opt_xid(value: &Value, context: &'static str, raw: &Value) -> Result<Option<XId>, Error> {
    match value {
        Value::Null => Ok(None),
        value => xid(value, context, raw).map(Some),
    }
}

/// Integers arrive as RESP integers or, in a few replies, as decimal text.
fn int(value: &Value, context: &'static str, raw: &Value) -> Result<i64, Error> {
    match value {
        Value::Integer(n) => Ok(*n),
        value => text(value, context, raw)?
            .parse()
            .map_err(|_| Error::malformed(context, raw)),
    }
}

fn uint(value: &Value, context: &'static str, raw: &Value) -> Result<u64, Error> {
    u64::try_from(int(value, context, raw)?).map_err(|_| Error::malformed(context, raw))
}

fn array<'v>(value: &'v Value, context: &'static str, raw: &Value) -> Result<&'v [Value], Error> {
    value.as_array().ok_or_else(|| Error::malformed(context, raw))
}

/// Arrays where nil stands for "none".
fn array_or_nil<'v>(
    value: &'v Value,
    context: &'static str,
    raw: &Value,
) -> Result<&'v [Value], Error> {
    match value {
        Value::Null => Ok(&[]),
        value => array(value, context, raw),
    }
}

// ── Labeled replies ─────────────────────────────────────────────────────

/// A `[label, value, label, value, ...]` reply (or RESP3 map), looked up by
/// label so fields added by newer servers are ignored.
struct Labeled<'v> {
    context: &'static str,
    raw: &'v Value,
    entries: Vec<(&'v [u8], &'v Value)>,
}

impl<'v> Labeled<'v> {
    fn new(raw: &'v Value, context: &'static str) -> Result<Self, Error> {
        let malformed = || Error::malformed(context, raw);
        let entries = match raw {
            Value::Map(map) => map
                .iter()
                .map(|(k, v)| k.as_bytes().map(|k| (k, v)).ok_or_else(malformed))
                .collect::<Result<Vec<_>, _>>()?,
            Value::Array(items) if items.len() % 2 == 0 => items
                .chunks_exact(2)
                .map(|kv| kv[0].as_bytes().map(|k| (k, &kv[1])).ok_or_else(malformed))
                .collect::<Result<Vec<_>, _>>()?,
            _ => return Err(malformed()),
        };
        Ok(Self {
            context,
            raw,
            entries,
        })
    }

    fn get(&self, label: &str) -> Option<&'v Value> {
        self.entries
            .iter()
            .find(|(k, _)| *k == label.as_bytes())
            .map(|(_, v)| *v)
    }

    fn required(&self, label: &str) -> Result<&'v Value, Error> {
        self.get(label)
            .ok_or_else(|| Error::malformed(self.context, self.raw))
    }

    fn string(&self, label: &str) -> Result<String, Error> {
        string(self.required(label)?, self.context, self.raw)
    }

    fn uint(&self, label: &str) -> Result<u64, Error> {
        uint(self.required(label)?, self.context, self.raw)
    }

    /// Missing (older servers) and nil both read as `None`.
    fn opt_uint(&self, label: &str) -> Result<Option<u64>, Error> {
        match self.get(label) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => uint(v, self.context, self.raw).map(Some),
        }
    }

    fn opt_int(&self, label: &str) -> Result<Option<i64>, Error> {
        match self.get(label) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => int(v, self.context, self.raw).map(Some),
        }
    }

    fn xid(&self, label: &str) -> Result<XId, Error> {
        xid(self.required(label)?, self.context, self.raw)
    }

    fn opt_xid(&self, label: &str) -> Result<Option<XId>, Error> {
        match self.get(label) {
            None => Ok(None),
            Some(v) => opt_xid(v, self.context, self.raw),
        }
    }

    fn array(&self, label: &str) -> Result<&'v [Value], Error> {
        array_or_nil(self.required(label)?, self.context, self.raw)
    }

    fn opt_message(&self, label: &str) -> Result<Option<XMessage>, Error> {
        match self.get(label) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => parse_xmessage(v).map(Some),
        }
    }
}

// ── Entries ─────────────────────────────────────────────────────────────

/// Decode `[id, [field, value, ...]]`. A nil field list (deleted entry)
/// decodes to no fields.
pub fn parse_xmessage(raw: &Value) -> Result<XMessage, Error> {
    const CONTEXT: &str = "stream entry";
    let [id, fields] = array(raw, CONTEXT, raw)? else {
        return Err(Error::malformed(CONTEXT, raw));
    };
    let id = xid(id, CONTEXT, raw)?;
    let flat = array_or_nil(fields, CONTEXT, raw)?;
    if flat.len() % 2 != 0 {
        return Err(Error::malformed(CONTEXT, raw));
    }
    let fields = flat
        .chunks_exact(2)
        .map(|fv| Ok((string(&fv[0], CONTEXT, raw)?, string(&fv[1], CONTEXT, raw)?)))
        .collect::<Result<Vec<_>, Error>>()?;
    Ok(XMessage { id, fields })
}

fn parse_messages(value: &Value, context: &'static str, raw: &Value) -> Result<Vec<XMessage>, Error> {
    array_or_nil(value, context, raw)?
        .iter()
        .map(parse_xmessage)
        .collect()
}

/// Decode an XREAD/XREADGROUP reply: an array of `[key, entries]` pairs or a
/// map of key to entries. Nil (a blocking read that timed out) is empty.
pub fn parse_xread_reply(raw: &Value) -> Result<Vec<XReadStream>, Error> {
    const CONTEXT: &str = "XREAD";
    let stream = |key: &Value, entries: &Value| -> Result<XReadStream, Error> {
        Ok(XReadStream {
            key: string(key, CONTEXT, raw)?,
            messages: parse_messages(entries, CONTEXT, raw)?,
        })
    };
    match raw {
        Value::Null => Ok(Vec::new()),
        Value::Map(map) => map.iter().map(|(k, v)| stream(k, v)).collect(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item.as_array() {
                Some([key, entries]) => stream(key, entries),
                _ => Err(Error::malformed(CONTEXT, raw)),
            })
            .collect(),
        _ => Err(Error::malformed(CONTEXT, raw)),
    }
}

// ── XPENDING ────────────────────────────────────────────────────────────

/// Decode the summary form: `[count, start, end, [[consumer, count], ...]]`.
/// With nothing pending the server sends `[0, nil, nil, nil]`.
pub fn parse_xpending_summary(raw: &Value) -> Result<XPendingSummary, Error> {
    const CONTEXT: &str = "XPENDING";
    let [count, start, end, consumers] = array(raw, CONTEXT, raw)? else {
        return Err(Error::malformed(CONTEXT, raw));
    };
    Ok(XPendingSummary {
        count: uint(count, CONTEXT, raw)?,
        start: opt_xid(start, CONTEXT, raw)?,
        end: opt_xid(end, CONTEXT, raw)?,
        consumers: parse_xpending_consumers(consumers)?,
    })
}

/// Decode the consumer list of the summary form. Counts arrive as text.
pub fn parse_xpending_consumers(raw: &Value) -> Result<Vec<XPendingConsumer>, Error> {
    const CONTEXT: &str = "XPENDING consumers";
    array_or_nil(raw, CONTEXT, raw)?
        .iter()
        .map(|row| match row.as_array() {
            Some([name, pending]) => Ok(XPendingConsumer {
                name: string(name, CONTEXT, raw)?,
                pending: uint(pending, CONTEXT, raw)?,
            }),
            _ => Err(Error::malformed(CONTEXT, raw)),
        })
        .collect()
}

/// Decode the extended form: `[[id, consumer, idle-ms, deliveries], ...]`.
pub fn parse_xpending_counts(raw: &Value) -> Result<Vec<XPendingCount>, Error> {
    const CONTEXT: &str = "XPENDING";
    array_or_nil(raw, CONTEXT, raw)?
        .iter()
        .map(|row| match row.as_array() {
            Some([id, owner, idle, deliveries]) => Ok(XPendingCount {
                id: xid(id, CONTEXT, raw)?,
                owner: string(owner, CONTEXT, raw)?,
                last_delivered_ms: uint(idle, CONTEXT, raw)?,
                times_delivered: uint(deliveries, CONTEXT, raw)?,
            }),
            _ => Err(Error::malformed(CONTEXT, raw)),
        })
        .collect()
}

// ── XCLAIM / XAUTOCLAIM ─────────────────────────────────────────────────

/// Decode an XCLAIM reply. Entries deleted while pending come back as nil and
/// are skipped.
pub fn parse_xclaim_reply(raw: &Value, justid: bool) -> Result<XClaimReply, Error> {
    parse_claimed(raw, justid, "XCLAIM", raw)
}

fn parse_claimed(
    value: &Value,
    justid: bool,
    context: &'static str,
    raw: &Value,
) -> Result<XClaimReply, Error> {
    let items = array_or_nil(value, context, raw)?;
    if justid {
        return items
            .iter()
            .map(|id| xid(id, context, raw))
            .collect::<Result<Vec<_>, _>>()
            .map(XClaimReply::Ids);
    }
    items
        .iter()
        .filter(|entry| !entry.is_null())
        .map(parse_xmessage)
        .collect::<Result<Vec<_>, _>>()
        .map(XClaimReply::Messages)
}

/// Decode `[next-cursor, claimed, deleted-ids]`. Servers before 7.0 omit the
/// deleted list.
pub fn parse_xautoclaim_reply(raw: &Value, justid: bool) -> Result<XAutoClaimReply, Error> {
    const CONTEXT: &str = "XAUTOCLAIM";
    let (next, claimed, deleted) = match array(raw, CONTEXT, raw)? {
        [next, claimed] => (next, claimed, &[][..]),
        [next, claimed, deleted] => (next, claimed, array_or_nil(deleted, CONTEXT, raw)?),
        _ => return Err(Error::malformed(CONTEXT, raw)),
    };
    Ok(XAutoClaimReply {
        next: xid(next, CONTEXT, raw)?,
        claimed: parse_claimed(claimed, justid, CONTEXT, raw)?,
        deleted: deleted
            .iter()
            .map(|id| xid(id, CONTEXT, raw))
            .collect::<Result<Vec<_>, _>>()?,
    })
}

// ── XINFO ───────────────────────────────────────────────────────────────

pub fn parse_xinfo_stream(raw: &Value) -> Result<XInfoStream, Error> {
    let info = Labeled::new(raw, "XINFO STREAM")?;
    Ok(XInfoStream {
        length: info.uint("length")?,
        radix_tree_keys: info.uint("radix-tree-keys")?,
        radix_tree_nodes: info.uint("radix-tree-nodes")?,
        groups: info.uint("groups")?,
        last_generated_id: info.xid("last-generated-id")?,
        max_deleted_entry_id: info.opt_xid("max-deleted-entry-id")?,
        entries_added: info.opt_uint("entries-added")?,
        recorded_first_entry_id: info.opt_xid("recorded-first-entry-id")?,
        first_entry: info.opt_message("first-entry")?,
        last_entry: info.opt_message("last-entry")?,
    })
}

pub fn parse_xinfo_stream_full(raw: &Value) -> Result<XInfoStreamFull, Error> {
    let info = Labeled::new(raw, "XINFO STREAM FULL")?;
    Ok(XInfoStreamFull {
        length: info.uint("length")?,
        radix_tree_keys: info.uint("radix-tree-keys")?,
        radix_tree_nodes: info.uint("radix-tree-nodes")?,
        last_generated_id: info.xid("last-generated-id")?,
        max_deleted_entry_id: info.opt_xid("max-deleted-entry-id")?,
        entries_added: info.opt_uint("entries-added")?,
        recorded_first_entry_id: info.opt_xid("recorded-first-entry-id")?,
        entries: parse_messages(info.required("entries")?, info.context, raw)?,
        groups: info
            .array("groups")?
            .iter()
            .map(parse_xgroup_detail)
            .collect::<Result<Vec<_>, _>>()?,
    })
}

/// Decode one group of an XINFO STREAM FULL reply, including its pending
/// entries and consumers.
pub fn parse_xgroup_detail(raw: &Value) -> Result<XGroupDetail, Error> {
    const CONTEXT: &str = "XINFO STREAM FULL group";
    let group = Labeled::new(raw, CONTEXT)?;
    let pending = group
        .array("pending")?
        .iter()
        .map(|row| match row.as_array() {
            Some([id, consumer, time, count]) => Ok(XGroupPendingEntry {
                id: xid(id, CONTEXT, raw)?,
                consumer: string(consumer, CONTEXT, raw)?,
                delivery_time_ms: uint(time, CONTEXT, raw)?,
                delivery_count: uint(count, CONTEXT, raw)?,
            }),
            _ => Err(Error::malformed(CONTEXT, raw)),
        })
        .collect::<Result<Vec<_>, _>>()?;
    let consumers = group
        .array("consumers")?
        .iter()
        .map(parse_consumer_detail)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(XGroupDetail {
        name: group.string("name")?,
        last_delivered_id: group.xid("last-delivered-id")?,
        entries_read: group.opt_uint("entries-read")?,
        lag: group.opt_uint("lag")?,
        pel_count: group.uint("pel-count")?,
        pending,
        consumers,
    })
}

fn parse_consumer_detail(raw: &Value) -> Result<XConsumerDetail, Error> {
    const CONTEXT: &str = "XINFO STREAM FULL consumer";
    let consumer = Labeled::new(raw, CONTEXT)?;
    let pending = consumer
        .array("pending")?
        .iter()
        .map(|row| match row.as_array() {
            Some([id, time, count]) => Ok(XConsumerPendingEntry {
                id: xid(id, CONTEXT, raw)?,
                delivery_time_ms: uint(time, CONTEXT, raw)?,
                delivery_count: uint(count, CONTEXT, raw)?,
            }),
            _ => Err(Error::malformed(CONTEXT, raw)),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(XConsumerDetail {
        name: consumer.string("name")?,
        seen_time_ms: consumer.uint("seen-time")?,
        active_time_ms: consumer.opt_uint("active-time")?,
        pel_count: consumer.uint("pel-count")?,
        pending,
    })
}

pub fn parse_xinfo_groups(raw: &Value) -> Result<Vec<XInfoGroup>, Error> {
    const CONTEXT: &str = "XINFO GROUPS";
    array(raw, CONTEXT, raw)?
        .iter()
        .map(|item| {
            let group = Labeled::new(item, CONTEXT)?;
            Ok(XInfoGroup {
                name: group.string("name")?,
                consumers: group.uint("consumers")?,
                pending: group.uint("pending")?,
                last_delivered_id: group.xid("last-delivered-id")?,
                entries_read: group.opt_uint("entries-read")?,
                lag: group.opt_uint("lag")?,
            })
        })
        .collect()
}

pub fn parse_xinfo_consumers(raw: &Value) -> Result<Vec<XInfoConsumer>, Error> {
    const CONTEXT: &str = "XINFO CONSUMERS";
    array(raw, CONTEXT, raw)?
        .iter()
        .map(|item| {
            let consumer = Labeled::new(item, CONTEXT)?;
            Ok(XInfoConsumer {
                name: consumer.string("name")?,
                pending: consumer.uint("pending")?,
                idle_ms: consumer.uint("idle")?,
                inactive_ms: consumer.opt_int("inactive")?,
            })
        })
        .collect()
}
