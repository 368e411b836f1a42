//! Typed command methods on [`Client`](crate::Client) and the encoders
//! behind them.
//!
//! Commands with structured options have a free function here that builds
//! the [`Request`]. The client method uses it, and so can a pipeline or
//! transaction:
//!
//! ```
//! use resp_client::commands::{self, SetOptions};
//!
//! let req = commands::set(b"k", b"v", &SetOptions::new().nx());
//! assert_eq!(req.name(), b"SET");
//! ```
//!
//! Encoders that can reject their input return `Result<Request, Error>`,
//! which [`Pipeline::try_cmd`](crate::Pipeline::try_cmd) accepts directly.

mod acl;
mod bitmap;
mod client_admin;
mod cluster;
mod geo;
mod hash;
mod keys;
mod list;
mod scripting;
mod server;
mod set;
mod sorted_set;
mod stream;
mod string;

pub use acl::AclLogEntry;
pub use bitmap::{BitOp, bitop};
pub use client_admin::{
    ClientKillOptions, ClientListOptions, ClientType, PauseMode, TrackingOptions, client_kill,
    client_list, client_tracking,
};
pub use geo::{GeoMember, GeoRadiusOptions, GeoUnit, geoadd, georadius, georadiusbymember};
pub use hash::hset;
pub use keys::{RestoreOptions, ScanOptions, SortOptions, restore, scan, sort};
pub use list::{Direction, InsertPosition, LposOptions, lpos};
pub use server::SlowLogEntry;
pub use sorted_set::{
    Aggregate, LexBound, Limit, ScoreBound, ZAddComparison, ZAddInput, ZAddOptions, ZStoreOptions,
    zadd, zinterstore, zrangebyscore, zunionstore,
};
pub use stream::{
    StreamTrim, TrimStrategy, XAddOptions, XClaimOptions, XPendingOptions, XReadGroupOptions,
    XReadOptions, xadd, xautoclaim, xclaim, xpending, xread, xreadgroup, xtrim,
};
pub use string::{GetExOptions, SetOptions, getex, mset, msetnx, set};

use crate::Error;

/// `NX` / `XX`: write only if the key (or member) is absent / present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Nx,
    Xx,
}

impl Condition {
    pub(crate) fn token(self) -> &'static [u8] {
        match self {
            Condition::Nx => b"NX",
            Condition::Xx => b"XX",
        }
    }
}

/// `ASC` / `DESC`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub(crate) fn token(self) -> &'static [u8] {
        match self {
            SortOrder::Asc => b"ASC",
            SortOrder::Desc => b"DESC",
        }
    }
}

pub(crate) fn invalid(message: impl Into<String>) -> Error {
    Error::InvalidArgument(message.into())
}

#[cfg(test)]
pub(crate) fn args_of(req: &resp_proto::Request<'_>) -> Vec<String> {
    req.arguments()
        .map(|a| String::from_utf8_lossy(a).into_owned())
        .collect()
}
