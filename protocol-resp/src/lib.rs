//! RESP protocol implementation for clients.
//!
//! This crate provides the wire layer of a Redis client:
//!
//! - **Requests**: encode commands as RESP arrays of bulk strings
//! - **Values**: parse replies (and encode values, which tests use to script servers)
//!
//! # Features
//!
//! - `resp3` - Accepts the RESP3 reply types a newer server may send:
//!   - Null (`_\r\n`)
//!   - Boolean (`#t`/`#f`)
//!   - Double (`,3.14159`)
//!   - Map (`%<len>\r\n<key><val>...`)
//!   - Set (`~<len>\r\n<elem>...`)
//!   - Push (`><len>\r\n<elem>...`)
//!
//! # Example
//!
//! ```
//! use resp_proto::{Request, Value};
//!
//! // Encode a GET command
//! let mut buf = vec![0u8; 1024];
//! let len = Request::get(b"mykey").encode(&mut buf);
//! assert_eq!(&buf[..len], b"*2\r\n$3\r\nGET\r\n$5\r\nmykey\r\n");
//!
//! // Parse the response
//! let (value, consumed) = Value::parse(b"$5\r\nhello\r\n").unwrap();
//! assert_eq!(value.as_bytes(), Some(&b"hello"[..]));
//! assert_eq!(consumed, 11);
//! ```

mod error;
mod request;
mod value;

pub use error::ParseError;
pub use request::{Request, encode_command};
pub use value::{
    DEFAULT_MAX_BULK_STRING_LEN, DEFAULT_MAX_COLLECTION_ELEMENTS, DEFAULT_MAX_DEPTH,
    DEFAULT_MAX_TOTAL_ITEMS, ParseOptions, Value,
};
