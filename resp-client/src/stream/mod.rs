//! Stream (X*) ids, entries and reply decoding.
//!
//! Stream replies are nested arrays whose shape depends on the command. The
//! parsers here rebuild them into the structs below and report anything that
//! does not fit as [`Error::MalformedReply`](crate::Error::MalformedReply)
//! carrying the raw reply.

mod id;
mod parse;

pub use id::{XId, XIdArg, XIdParseError, parse_xid, xidstr};
pub use parse::{
    parse_xautoclaim_reply, parse_xclaim_reply, parse_xgroup_detail, parse_xinfo_consumers,
    parse_xinfo_groups, parse_xinfo_stream, parse_xinfo_stream_full, parse_xmessage,
    parse_xpending_consumers, parse_xpending_counts, parse_xpending_summary, parse_xread_reply,
};

/// A stream entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XMessage {
    pub id: XId,
    /// Field/value pairs in stream order. Empty for a deleted entry.
    pub fields: Vec<(String, String)>,
}

impl XMessage {
    /// The value of the first field named `field`.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, v)| v.as_str())
    }
}

/// Entries read from one stream by XREAD or XREADGROUP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XReadStream {
    pub key: String,
    pub messages: Vec<XMessage>,
}

/// Pending entry count for one consumer, from the XPENDING summary form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XPendingConsumer {
    pub name: String,
    pub pending: u64,
}

/// The XPENDING summary form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XPendingSummary {
    pub count: u64,
    /// Smallest pending id, absent when nothing is pending.
    pub start: Option<XId>,
    /// Largest pending id, absent when nothing is pending.
    pub end: Option<XId>,
    pub consumers: Vec<XPendingConsumer>,
}

/// One row of the extended XPENDING form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XPendingCount {
    pub id: XId,
    pub owner: String,
    /// Milliseconds since the entry was last delivered.
    pub last_delivered_ms: u64,
    pub times_delivered: u64,
}

/// XINFO STREAM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XInfoStream {
    pub length: u64,
    pub radix_tree_keys: u64,
    pub radix_tree_nodes: u64,
    pub groups: u64,
    pub last_generated_id: XId,
    pub max_deleted_entry_id: Option<XId>,
    pub entries_added: Option<u64>,
    pub recorded_first_entry_id: Option<XId>,
    pub first_entry: Option<XMessage>,
    pub last_entry: Option<XMessage>,
}

/// XINFO STREAM FULL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XInfoStreamFull {
    pub length: u64,
    pub radix_tree_keys: u64,
    pub radix_tree_nodes: u64,
    pub last_generated_id: XId,
    pub max_deleted_entry_id: Option<XId>,
    pub entries_added: Option<u64>,
    pub recorded_first_entry_id: Option<XId>,
    pub entries: Vec<XMessage>,
    pub groups: Vec<XGroupDetail>,
}

/// A consumer group as reported by XINFO STREAM FULL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XGroupDetail {
    pub name: String,
    pub last_delivered_id: XId,
    pub entries_read: Option<u64>,
    pub lag: Option<u64>,
    pub pel_count: u64,
    pub pending: Vec<XGroupPendingEntry>,
    pub consumers: Vec<XConsumerDetail>,
}

/// An entry in a group's pending entries list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XGroupPendingEntry {
    pub id: XId,
    pub consumer: String,
    /// Unix time of the last delivery, in milliseconds.
    pub delivery_time_ms: u64,
    pub delivery_count: u64,
}

/// A consumer as reported by XINFO STREAM FULL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XConsumerDetail {
    pub name: String,
    pub seen_time_ms: u64,
    pub active_time_ms: Option<u64>,
    pub pel_count: u64,
    pub pending: Vec<XConsumerPendingEntry>,
}

/// An entry in a consumer's pending entries list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XConsumerPendingEntry {
    pub id: XId,
    pub delivery_time_ms: u64,
    pub delivery_count: u64,
}

/// XINFO GROUPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XInfoGroup {
    pub name: String,
    pub consumers: u64,
    pub pending: u64,
    pub last_delivered_id: XId,
    pub entries_read: Option<u64>,
    pub lag: Option<u64>,
}

/// XINFO CONSUMERS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XInfoConsumer {
    pub name: String,
    pub pending: u64,
    pub idle_ms: u64,
    /// Milliseconds since the last successful interaction, -1 if never.
    pub inactive_ms: Option<i64>,
}

/// XCLAIM reply: full entries, or ids with `JUSTID`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XClaimReply {
    Messages(Vec<XMessage>),
    Ids(Vec<XId>),
}

impl XClaimReply {
    pub fn len(&self) -> usize {
        match self {
            XClaimReply::Messages(m) => m.len(),
            XClaimReply::Ids(ids) => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of the claimed entries, in reply order.
    pub fn ids(&self) -> Vec<XId> {
        match self {
            XClaimReply::Messages(m) => m.iter().map(|m| m.id).collect(),
            XClaimReply::Ids(ids) => ids.clone(),
        }
    }
}

/// XAUTOCLAIM reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XAutoClaimReply {
    /// Cursor for the next call; `0-0` when the scan is complete.
    pub next: XId,
    pub claimed: XClaimReply,
    /// Pending ids whose entries no longer exist (Redis 7+).
    pub deleted: Vec<XId>,
}
