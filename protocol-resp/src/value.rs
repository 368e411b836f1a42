//! RESP value types and parsing/encoding.
//!
//! RESP2 defines the following value types:
//! - Simple String: `+OK\r\n`
//! - Error: `-ERR message\r\n`
//! - Integer: `:1000\r\n`
//! - Bulk String: `$6\r\nfoobar\r\n`
//! - Null Bulk String: `$-1\r\n`
//! - Array: `*2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n`
//! - Null Array: `*-1\r\n`
//!
//! With the `resp3` feature the parser also accepts the RESP3 types a server
//! may send to a RESP2 client after a protocol upgrade:
//! - Null: `_\r\n`
//! - Boolean: `#t\r\n` or `#f\r\n`
//! - Double: `,3.14159\r\n`
//! - Map: `%<len>\r\n<key><val>...`
//! - Set: `~<len>\r\n<elem>...`
//! - Push: `><len>\r\n<elem>...`

use crate::error::ParseError;
use bytes::Bytes;

/// Default maximum number of elements in a single collection.
///
/// Replies such as `XRANGE - +` or `HGETALL` on large keys legitimately carry
/// many elements, so the client default is far above a server's request limit.
pub const DEFAULT_MAX_COLLECTION_ELEMENTS: usize = 1 << 20;

/// Default maximum size of a bulk string in bytes (512MB, Redis' `proto-max-bulk-len`).
pub const DEFAULT_MAX_BULK_STRING_LEN: usize = 512 * 1024 * 1024;

/// Default maximum nesting depth.
///
/// `XINFO STREAM FULL` is the deepest standard reply at seven levels.
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Default maximum total items across all collections in a single parse.
pub const DEFAULT_MAX_TOTAL_ITEMS: usize = 1 << 24;

/// Limits applied while parsing a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum number of elements in a single collection.
    pub max_collection_elements: usize,
    /// Maximum size of a bulk string in bytes.
    pub max_bulk_string_len: usize,
    /// Maximum nesting depth for recursive structures.
    pub max_depth: usize,
    /// Maximum total items across all collections in a single parse.
    pub max_total_items: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseOptions {
    /// Create new parse options with default values.
    pub const fn new() -> Self {
        Self {
            max_collection_elements: DEFAULT_MAX_COLLECTION_ELEMENTS,
            max_bulk_string_len: DEFAULT_MAX_BULK_STRING_LEN,
            max_depth: DEFAULT_MAX_DEPTH,
            max_total_items: DEFAULT_MAX_TOTAL_ITEMS,
        }
    }

    /// Set the maximum collection element count.
    pub const fn max_collection_elements(mut self, count: usize) -> Self {
        self.max_collection_elements = count;
        self
    }

    /// Set the maximum bulk string length.
    pub const fn max_bulk_string_len(mut self, len: usize) -> Self {
        self.max_bulk_string_len = len;
        self
    }

    /// Set the maximum nesting depth.
    pub const fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the maximum total items across all collections.
    pub const fn max_total_items(mut self, count: usize) -> Self {
        self.max_total_items = count;
        self
    }
}

/// A RESP protocol value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Simple string: `+OK\r\n`
    SimpleString(Bytes),
    /// Error: `-ERR message\r\n`
    Error(Bytes),
    /// Integer: `:1000\r\n`
    Integer(i64),
    /// Bulk string: `$6\r\nfoobar\r\n`
    BulkString(Bytes),
    /// Null value: `$-1\r\n`, `*-1\r\n` or RESP3 `_\r\n`.
    Null,
    /// Array: `*2\r\n...`
    Array(Vec<Value>),
    /// Boolean: `#t\r\n` or `#f\r\n`
    #[cfg(feature = "resp3")]
    Boolean(bool),
    /// Double-precision floating point: `,3.14159\r\n`
    #[cfg(feature = "resp3")]
    Double(f64),
    /// Map: `%<len>\r\n<key><val>...`
    #[cfg(feature = "resp3")]
    Map(Vec<(Value, Value)>),
    /// Set: `~<len>\r\n<elem>...`
    #[cfg(feature = "resp3")]
    Set(Vec<Value>),
    /// Push message (server-initiated): `><len>\r\n<elem>...`
    #[cfg(feature = "resp3")]
    Push(Vec<Value>),
}

impl Value {
    /// Create a simple string value.
    #[inline]
    pub fn simple_string(s: &[u8]) -> Self {
        Value::SimpleString(Bytes::copy_from_slice(s))
    }

    /// Create an error value.
    #[inline]
    pub fn error(msg: &[u8]) -> Self {
        Value::Error(Bytes::copy_from_slice(msg))
    }

    /// Create an integer value.
    #[inline]
    pub fn integer(n: i64) -> Self {
        Value::Integer(n)
    }

    /// Create a bulk string value.
    #[inline]
    pub fn bulk_string(data: &[u8]) -> Self {
        Value::BulkString(Bytes::copy_from_slice(data))
    }

    /// Create a null value.
    #[inline]
    pub fn null() -> Self {
        Value::Null
    }

    /// Create an array value.
    #[inline]
    pub fn array(elements: Vec<Value>) -> Self {
        Value::Array(elements)
    }

    /// Create a map value (RESP3).
    #[cfg(feature = "resp3")]
    #[inline]
    pub fn map(entries: Vec<(Value, Value)>) -> Self {
        Value::Map(entries)
    }

    /// Create a push value (RESP3).
    #[cfg(feature = "resp3")]
    #[inline]
    pub fn push(elements: Vec<Value>) -> Self {
        Value::Push(elements)
    }

    /// Returns true if this is a null value.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true if this is an error value.
    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Returns the payload of a simple string or bulk string.
    #[inline]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::SimpleString(s) | Value::BulkString(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the payload of a simple string or bulk string as UTF-8.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Returns the integer value.
    #[inline]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the elements of an array-like value (array, set, push).
    #[inline]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(arr) => Some(arr),
            #[cfg(feature = "resp3")]
            Value::Set(arr) | Value::Push(arr) => Some(arr),
            _ => None,
        }
    }

    /// Short name of the RESP type, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::SimpleString(_) => "simple-string",
            Value::Error(_) => "error",
            Value::Integer(_) => "integer",
            Value::BulkString(_) => "bulk-string",
            Value::Null => "null",
            Value::Array(_) => "array",
            #[cfg(feature = "resp3")]
            Value::Boolean(_) => "boolean",
            #[cfg(feature = "resp3")]
            Value::Double(_) => "double",
            #[cfg(feature = "resp3")]
            Value::Map(_) => "map",
            #[cfg(feature = "resp3")]
            Value::Set(_) => "set",
            #[cfg(feature = "resp3")]
            Value::Push(_) => "push",
        }
    }

    // ========================================================================
    // Parsing
    // ========================================================================

    /// Parse a RESP value from a byte buffer.
    ///
    /// Returns the parsed value and the number of bytes consumed.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Incomplete` if more data is needed to complete parsing.
    /// Returns other errors for malformed data.
    #[inline]
    pub fn parse(data: &[u8]) -> Result<(Self, usize), ParseError> {
        Self::parse_with_options(data, &ParseOptions::default())
    }

    /// Parse a RESP value with custom limits.
    pub fn parse_with_options(
        data: &[u8],
        options: &ParseOptions,
    ) -> Result<(Self, usize), ParseError> {
        let mut total_items = 0;
        Self::parse_internal(data, options, 0, &mut total_items)
    }

    fn parse_internal(
        data: &[u8],
        options: &ParseOptions,
        depth: usize,
        total_items: &mut usize,
    ) -> Result<(Self, usize), ParseError> {
        if data.is_empty() {
            return Err(ParseError::Incomplete);
        }

        match data[0] {
            b'+' => parse_line(data).map(|(s, n)| (Value::SimpleString(s), n)),
            b'-' => parse_line(data).map(|(s, n)| (Value::Error(s), n)),
            b':' => parse_integer(data),
            b'$' => parse_bulk_string(data, options),
            b'*' => {
                let (items, n) = parse_elements(data, options, depth, total_items, 1)?;
                Ok((items.map_or(Value::Null, Value::Array), n))
            }
            #[cfg(feature = "resp3")]
            b'_' => parse_null(data),
            #[cfg(feature = "resp3")]
            b'#' => parse_boolean(data),
            #[cfg(feature = "resp3")]
            b',' => parse_double(data),
            #[cfg(feature = "resp3")]
            b'%' => {
                let (items, n) = parse_elements(data, options, depth, total_items, 2)?;
                let Some(items) = items else {
                    return Ok((Value::Null, n));
                };
                let mut entries = Vec::with_capacity(items.len() / 2);
                let mut iter = items.into_iter();
                while let (Some(k), Some(v)) = (iter.next(), iter.next()) {
                    entries.push((k, v));
                }
                Ok((Value::Map(entries), n))
            }
            #[cfg(feature = "resp3")]
            b'~' => {
                let (items, n) = parse_elements(data, options, depth, total_items, 1)?;
                Ok((items.map_or(Value::Null, Value::Set), n))
            }
            #[cfg(feature = "resp3")]
            b'>' => {
                let (items, n) = parse_elements(data, options, depth, total_items, 1)?;
                Ok((items.map_or(Value::Null, Value::Push), n))
            }
            other => Err(ParseError::InvalidPrefix(other)),
        }
    }

    // ========================================================================
    // Encoding
    // ========================================================================

    /// Encode this value into a byte buffer.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is too small. Use `encoded_len()` to size it.
    pub fn encode(&self, buf: &mut [u8]) -> usize {
        match self {
            Value::SimpleString(s) => encode_line(buf, b'+', s),
            Value::Error(msg) => encode_line(buf, b'-', msg),
            Value::Integer(n) => {
                let mut fmt = itoa::Buffer::new();
                encode_line(buf, b':', fmt.format(*n).as_bytes())
            }
            Value::BulkString(data) => encode_bulk_string(buf, data),
            Value::Null => encode_line(buf, b'$', b"-1"),
            Value::Array(elements) => encode_elements(buf, b'*', elements),
            #[cfg(feature = "resp3")]
            Value::Boolean(b) => encode_line(buf, b'#', if *b { b"t" } else { b"f" }),
            #[cfg(feature = "resp3")]
            Value::Double(d) => {
                let mut fmt = ryu::Buffer::new();
                encode_line(buf, b',', fmt.format(*d).as_bytes())
            }
            #[cfg(feature = "resp3")]
            Value::Map(entries) => {
                let mut pos = encode_header(buf, b'%', entries.len());
                for (k, v) in entries {
                    pos += k.encode(&mut buf[pos..]);
                    pos += v.encode(&mut buf[pos..]);
                }
                pos
            }
            #[cfg(feature = "resp3")]
            Value::Set(elements) => encode_elements(buf, b'~', elements),
            #[cfg(feature = "resp3")]
            Value::Push(elements) => encode_elements(buf, b'>', elements),
        }
    }

    /// Calculate the encoded length of this value.
    pub fn encoded_len(&self) -> usize {
        match self {
            Value::SimpleString(s) | Value::Error(s) => 1 + s.len() + 2,
            Value::Integer(n) => {
                let mut fmt = itoa::Buffer::new();
                1 + fmt.format(*n).len() + 2
            }
            Value::BulkString(data) => header_len(data.len()) + data.len() + 2,
            Value::Null => 5,
            Value::Array(elements) => {
                header_len(elements.len()) + elements.iter().map(Value::encoded_len).sum::<usize>()
            }
            #[cfg(feature = "resp3")]
            Value::Boolean(_) => 4,
            #[cfg(feature = "resp3")]
            Value::Double(d) => {
                let mut fmt = ryu::Buffer::new();
                1 + fmt.format(*d).len() + 2
            }
            #[cfg(feature = "resp3")]
            Value::Map(entries) => {
                header_len(entries.len())
                    + entries
                        .iter()
                        .map(|(k, v)| k.encoded_len() + v.encoded_len())
                        .sum::<usize>()
            }
            #[cfg(feature = "resp3")]
            Value::Set(elements) | Value::Push(elements) => {
                header_len(elements.len()) + elements.iter().map(Value::encoded_len).sum::<usize>()
            }
        }
    }

    /// Encode this value into a freshly allocated buffer.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut buf = vec![0u8; self.encoded_len()];
        let len = self.encode(&mut buf);
        buf.truncate(len);
        buf
    }
}

// ============================================================================
// Parsing helpers
// ============================================================================

/// Find the position of the \r\n ending the first line.
///
/// A `\r` not followed by `\n` is a protocol error. Running out of bytes
/// (including on a trailing `\r`) is `Incomplete`.
#[inline]
fn find_crlf(data: &[u8]) -> Result<usize, ParseError> {
    let pos = memchr::memchr(b'\r', data).ok_or(ParseError::Incomplete)?;
    match data.get(pos + 1) {
        Some(b'\n') => Ok(pos),
        Some(_) => Err(ParseError::Protocol("bare CR in line".to_string())),
        None => Err(ParseError::Incomplete),
    }
}

/// Parse the payload of a single-line value (`+...\r\n` or `-...\r\n`).
fn parse_line(data: &[u8]) -> Result<(Bytes, usize), ParseError> {
    let end = find_crlf(data)?;
    Ok((Bytes::copy_from_slice(&data[1..end]), end + 2))
}

/// Parse the signed decimal on the first line, returning it and the line length.
fn parse_header_number(data: &[u8]) -> Result<(i64, usize), ParseError> {
    let end = find_crlf(data)?;
    let s = std::str::from_utf8(&data[1..end])
        .map_err(|e| ParseError::InvalidInteger(e.to_string()))?;
    let n: i64 = s
        .parse()
        .map_err(|e: std::num::ParseIntError| ParseError::InvalidInteger(e.to_string()))?;
    Ok((n, end + 2))
}

/// Parse an integer: :1000\r\n
fn parse_integer(data: &[u8]) -> Result<(Value, usize), ParseError> {
    let (n, consumed) = parse_header_number(data)?;
    Ok((Value::Integer(n), consumed))
}

/// Parse a bulk string: $6\r\nfoobar\r\n or $-1\r\n
fn parse_bulk_string(data: &[u8], options: &ParseOptions) -> Result<(Value, usize), ParseError> {
    let (len, data_start) = parse_header_number(data)?;
    if len < 0 {
        return Ok((Value::Null, data_start));
    }

    let len = len as usize;
    if len > options.max_bulk_string_len {
        return Err(ParseError::BulkStringTooLong {
            len,
            max: options.max_bulk_string_len,
        });
    }

    let data_end = data_start
        .checked_add(len)
        .ok_or_else(|| ParseError::InvalidInteger("length overflow".to_string()))?;
    let total_end = data_end
        .checked_add(2)
        .ok_or_else(|| ParseError::InvalidInteger("length overflow".to_string()))?;

    if data.len() < total_end {
        return Err(ParseError::Incomplete);
    }
    if data[data_end] != b'\r' || data[data_end + 1] != b'\n' {
        return Err(ParseError::Protocol("missing trailing CRLF".to_string()));
    }

    let content = Bytes::copy_from_slice(&data[data_start..data_end]);
    Ok((Value::BulkString(content), total_end))
}

/// Parse the elements of an aggregate whose header announces `len` entries of
/// `width` values each. A negative length yields `None` (null aggregate).
fn parse_elements(
    data: &[u8],
    options: &ParseOptions,
    depth: usize,
    total_items: &mut usize,
    width: usize,
) -> Result<(Option<Vec<Value>>, usize), ParseError> {
    if depth >= options.max_depth {
        return Err(ParseError::NestingTooDeep(depth));
    }

    let (len, mut pos) = parse_header_number(data)?;
    if len < 0 {
        return Ok((None, pos));
    }

    let len = len as usize;
    if len > options.max_collection_elements {
        return Err(ParseError::CollectionTooLarge(len));
    }
    let count = len
        .checked_mul(width)
        .ok_or(ParseError::CollectionTooLarge(usize::MAX))?;

    // Budget across all nesting levels so nested headers cannot multiply allocations.
    *total_items = total_items
        .checked_add(count)
        .ok_or(ParseError::CollectionTooLarge(usize::MAX))?;
    if *total_items > options.max_total_items {
        return Err(ParseError::CollectionTooLarge(*total_items));
    }

    let mut elements = Vec::with_capacity(count);
    for _ in 0..count {
        if pos >= data.len() {
            return Err(ParseError::Incomplete);
        }
        let (value, consumed) =
            Value::parse_internal(&data[pos..], options, depth + 1, total_items)?;
        elements.push(value);
        pos += consumed;
    }

    Ok((Some(elements), pos))
}

/// Parse RESP3 null: _\r\n
#[cfg(feature = "resp3")]
fn parse_null(data: &[u8]) -> Result<(Value, usize), ParseError> {
    let end = find_crlf(data)?;
    if end != 1 {
        return Err(ParseError::Protocol("malformed null".to_string()));
    }
    Ok((Value::Null, 3))
}

/// Parse RESP3 boolean: #t\r\n or #f\r\n
#[cfg(feature = "resp3")]
fn parse_boolean(data: &[u8]) -> Result<(Value, usize), ParseError> {
    let end = find_crlf(data)?;
    match &data[1..end] {
        b"t" => Ok((Value::Boolean(true), end + 2)),
        b"f" => Ok((Value::Boolean(false), end + 2)),
        _ => Err(ParseError::InvalidBoolean),
    }
}

/// Parse RESP3 double: ,3.14\r\n (also inf, -inf, nan)
#[cfg(feature = "resp3")]
fn parse_double(data: &[u8]) -> Result<(Value, usize), ParseError> {
    let end = find_crlf(data)?;
    let s = std::str::from_utf8(&data[1..end])
        .map_err(|e| ParseError::InvalidDouble(e.to_string()))?;
    let d: f64 = s
        .parse()
        .map_err(|e: std::num::ParseFloatError| ParseError::InvalidDouble(e.to_string()))?;
    Ok((Value::Double(d), end + 2))
}

// ============================================================================
// Encoding helpers
// ============================================================================

/// Length of an aggregate or bulk header: `<prefix><n>\r\n`.
fn header_len(n: usize) -> usize {
    let mut fmt = itoa::Buffer::new();
    1 + fmt.format(n).len() + 2
}

/// Encode `<prefix><payload>\r\n`.
fn encode_line(buf: &mut [u8], prefix: u8, payload: &[u8]) -> usize {
    buf[0] = prefix;
    buf[1..1 + payload.len()].copy_from_slice(payload);
    buf[1 + payload.len()] = b'\r';
    buf[2 + payload.len()] = b'\n';
    3 + payload.len()
}

/// Encode `<prefix><n>\r\n`.
fn encode_header(buf: &mut [u8], prefix: u8, n: usize) -> usize {
    let mut fmt = itoa::Buffer::new();
    encode_line(buf, prefix, fmt.format(n).as_bytes())
}

/// Encode a bulk string: $<len>\r\n<data>\r\n
fn encode_bulk_string(buf: &mut [u8], data: &[u8]) -> usize {
    let header = encode_header(buf, b'$', data.len());
    buf[header..header + data.len()].copy_from_slice(data);
    buf[header + data.len()] = b'\r';
    buf[header + data.len() + 1] = b'\n';
    header + data.len() + 2
}

fn encode_elements(buf: &mut [u8], prefix: u8, elements: &[Value]) -> usize {
    let mut pos = encode_header(buf, prefix, elements.len());
    for element in elements {
        pos += element.encode(&mut buf[pos..]);
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_string() {
        let (value, consumed) = Value::parse(b"+OK\r\n").unwrap();
        assert_eq!(value, Value::SimpleString(Bytes::from_static(b"OK")));
        assert_eq!(consumed, 5);
    }

    #[test]
    fn test_parse_error() {
        let (value, consumed) = Value::parse(b"-WRONGTYPE Operation against a key\r\n").unwrap();
        assert_eq!(value, Value::error(b"WRONGTYPE Operation against a key"));
        assert_eq!(consumed, 36);
        assert!(value.is_error());
    }

    #[test]
    fn test_parse_integer() {
        let (value, _) = Value::parse(b":-42\r\n").unwrap();
        assert_eq!(value.as_integer(), Some(-42));
    }

    #[test]
    fn test_parse_bulk_string() {
        let (value, consumed) = Value::parse(b"$6\r\nfoobar\r\n").unwrap();
        assert_eq!(value.as_bytes(), Some(&b"foobar"[..]));
        assert_eq!(consumed, 12);
    }

    #[test]
    fn test_parse_binary_bulk_string() {
        let (value, _) = Value::parse(b"$4\r\n\x00\r\n\xff\r\n").unwrap();
        assert_eq!(value.as_bytes(), Some(&b"\x00\r\n\xff"[..]));
    }

    #[test]
    fn test_parse_null_bulk_and_array() {
        assert_eq!(Value::parse(b"$-1\r\n").unwrap(), (Value::Null, 5));
        assert_eq!(Value::parse(b"*-1\r\n").unwrap(), (Value::Null, 5));
    }

    #[test]
    fn test_parse_nested_array() {
        let data = b"*2\r\n$15\r\n1526919030474-0\r\n*2\r\n$1\r\nf\r\n$1\r\nv\r\n";
        let (value, consumed) = Value::parse(data).unwrap();
        assert_eq!(consumed, data.len());
        let arr = value.as_array().unwrap();
        assert_eq!(arr[0].as_str(), Some("1526919030474-0"));
        assert_eq!(arr[1].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_parse_incomplete() {
        assert_eq!(Value::parse(b""), Err(ParseError::Incomplete));
        assert_eq!(Value::parse(b"+OK"), Err(ParseError::Incomplete));
        assert_eq!(Value::parse(b"$6\r\nfoo"), Err(ParseError::Incomplete));
        assert_eq!(
            Value::parse(b"*2\r\n$1\r\na\r\n"),
            Err(ParseError::Incomplete)
        );
        assert_eq!(Value::parse(b"+OK\r"), Err(ParseError::Incomplete));
    }

    #[test]
    fn test_parse_bare_cr_in_line() {
        assert!(matches!(
            Value::parse(b"+OK\rX\r\n"),
            Err(ParseError::Protocol(_))
        ));
        assert!(matches!(
            Value::parse(b":12\r3\r\n"),
            Err(ParseError::Protocol(_))
        ));
        assert!(matches!(
            Value::parse(b"*1\r\n$2\rx\r\n"),
            Err(ParseError::Protocol(_))
        ));
    }

    #[test]
    fn test_parse_invalid_prefix() {
        assert_eq!(Value::parse(b"?x\r\n"), Err(ParseError::InvalidPrefix(b'?')));
    }

    #[test]
    fn test_parse_missing_crlf_after_bulk() {
        assert!(matches!(
            Value::parse(b"$3\r\nfooXX"),
            Err(ParseError::Protocol(_))
        ));
    }

    #[test]
    fn test_parse_bad_integer() {
        assert!(matches!(
            Value::parse(b":12a\r\n"),
            Err(ParseError::InvalidInteger(_))
        ));
    }

    #[test]
    fn test_limits() {
        let opts = ParseOptions::new().max_bulk_string_len(4);
        assert_eq!(
            Value::parse_with_options(b"$5\r\nhello\r\n", &opts),
            Err(ParseError::BulkStringTooLong { len: 5, max: 4 })
        );

        let opts = ParseOptions::new().max_collection_elements(2);
        assert_eq!(
            Value::parse_with_options(b"*3\r\n:1\r\n:2\r\n:3\r\n", &opts),
            Err(ParseError::CollectionTooLarge(3))
        );

        let opts = ParseOptions::new().max_depth(2);
        assert_eq!(
            Value::parse_with_options(b"*1\r\n*1\r\n*1\r\n:1\r\n", &opts),
            Err(ParseError::NestingTooDeep(2))
        );

        let opts = ParseOptions::new().max_total_items(3);
        assert!(matches!(
            Value::parse_with_options(b"*2\r\n*2\r\n:1\r\n:2\r\n:3\r\n", &opts),
            Err(ParseError::CollectionTooLarge(_))
        ));
    }

    #[test]
    fn test_encode_matches_wire_format() {
        let value = Value::array(vec![
            Value::bulk_string(b"foo"),
            Value::integer(7),
            Value::Null,
            Value::simple_string(b"OK"),
            Value::error(b"ERR nope"),
        ]);
        assert_eq!(
            value.to_vec(),
            b"*5\r\n$3\r\nfoo\r\n:7\r\n$-1\r\n+OK\r\n-ERR nope\r\n".to_vec()
        );
        assert_eq!(value.encoded_len(), value.to_vec().len());
    }

    #[test]
    fn test_parse_encoded_value() {
        let value = Value::array(vec![
            Value::bulk_string(b"mystream"),
            Value::array(vec![Value::array(vec![
                Value::bulk_string(b"1-1"),
                Value::Null,
            ])]),
        ]);
        let bytes = value.to_vec();
        assert_eq!(Value::parse(&bytes).unwrap(), (value, bytes.len()));
    }

    #[test]
    fn test_kind() {
        assert_eq!(Value::Null.kind(), "null");
        assert_eq!(Value::integer(1).kind(), "integer");
        assert_eq!(Value::array(vec![]).kind(), "array");
    }

    #[cfg(feature = "resp3")]
    #[test]
    fn test_parse_resp3_map() {
        let data = b"%1\r\n$8\r\nmystream\r\n*0\r\n";
        let (value, consumed) = Value::parse(data).unwrap();
        assert_eq!(consumed, data.len());
        assert_eq!(
            value,
            Value::map(vec![(Value::bulk_string(b"mystream"), Value::array(vec![]))])
        );
    }

    #[cfg(feature = "resp3")]
    #[test]
    fn test_parse_resp3_scalars() {
        assert_eq!(Value::parse(b"_\r\n").unwrap(), (Value::Null, 3));
        assert_eq!(Value::parse(b"#t\r\n").unwrap(), (Value::Boolean(true), 4));
        assert_eq!(Value::parse(b",1.5\r\n").unwrap(), (Value::Double(1.5), 6));
        assert_eq!(Value::parse(b"#x\r\n"), Err(ParseError::InvalidBoolean));
    }

    #[cfg(feature = "resp3")]
    #[test]
    fn test_parse_resp3_push() {
        let push = Value::push(vec![
            Value::bulk_string(b"message"),
            Value::bulk_string(b"news"),
            Value::bulk_string(b"hi"),
        ]);
        let bytes = push.to_vec();
        assert_eq!(bytes[0], b'>');
        assert_eq!(Value::parse(&bytes).unwrap().0, push);
        assert_eq!(push.as_array().map(<[Value]>::len), Some(3));
    }
}
