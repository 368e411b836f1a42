//! Async RESP client with a typed Redis command surface.
//!
//! A [`Client`] owns one [`Connection`] and sends one request at a time.
//! Typed methods cover strings, keys, hashes, lists, sets, sorted sets,
//! bitmaps, geo, scripting, server and client administration, ACL, cluster
//! introspection and streams. Anything else goes through [`Client::exec`]
//! with a hand-built [`Request`].
//!
//! All key and value parameters accept `impl AsRef<[u8]>`, so you can pass
//! `&str`, `String`, `&[u8]`, `Vec<u8>`, `Bytes`, etc.
//!
//! Batching uses [`Pipeline`] and [`Transaction`], which borrow the client
//! until executed. Pub/sub uses [`Subscriber`], which takes the client over
//! until every subscription ends.
//!
//! # Example
//!
//! ```no_run
//! use resp_client::{Client, Error, TcpConnection};
//! use resp_client::stream::XIdArg;
//! use resp_client::commands::XAddOptions;
//!
//! async fn example() -> Result<(), Error> {
//!     let mut client = Client::connect(TcpConnection::new("127.0.0.1:6379")).await?;
//!     client.set("hello", "world").await?;
//!     let val = client.get("hello").await?;
//!     assert_eq!(val.as_deref(), Some(&b"world"[..]));
//!
//!     let id = client
//!         .xadd("events", &XIdArg::Auto, [("kind", "login")], &XAddOptions::default())
//!         .await?;
//!     println!("appended {id:?}");
//!     Ok(())
//! }
//! ```

mod client;
pub mod commands;
mod config;
mod connection;
mod error;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod pipeline;
mod pubsub;
mod reply;
pub mod stream;

#[cfg(feature = "metrics")]
pub use client::ClientMetrics;
pub use client::{Client, ClientBuilder, CommandResult, SendOptions};
pub use config::{ClientConfig, ConnectionConfig, LimitsConfig};
pub use connection::{Connection, TcpConnection};
pub use error::Error;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockConnection;
pub use pipeline::{Pipeline, Transaction};
pub use pubsub::{PubSubMessage, Subscriber};
pub use reply::{
    FromValue, array_reply, binary_reply, bool_reply, bulk_reply, float_or_nil_reply,
    float_reply, integer_or_nil_reply, integer_reply, ok_reply, pairs_reply, scan_reply,
    status_or_nil_reply, status_reply,
};
pub use resp_proto::{ParseOptions, Request, Value};
