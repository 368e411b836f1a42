//! Client-side request encoding.
//!
//! Commands are encoded as RESP arrays of bulk strings. Numeric arguments are
//! rendered as decimal text, which is how Redis expects every argument.

use std::borrow::Cow;
use std::fmt;

/// A request builder for encoding Redis commands.
///
/// Arguments either borrow from the caller (`arg`) or are owned by the
/// request (`arg_owned`, `arg_int`, ...), so a request can be built from
/// temporaries and encoded later.
///
/// # Example
///
/// ```
/// use resp_proto::Request;
///
/// let req = Request::cmd(b"ZADD")
///     .arg(b"board")
///     .arg_flag(true, b"CH")
///     .arg_float(1.5)
///     .arg(b"alice");
///
/// let mut buf = vec![0u8; req.encoded_len()];
/// let len = req.encode(&mut buf);
/// assert_eq!(len, buf.len());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Request<'a> {
    args: Vec<Cow<'a, [u8]>>,
}

impl<'a> Request<'a> {
    /// Create a new request with the given arguments (command name first).
    #[inline]
    pub fn new(args: Vec<&'a [u8]>) -> Self {
        Self {
            args: args.into_iter().map(Cow::Borrowed).collect(),
        }
    }

    /// Create a command with no arguments yet.
    #[inline]
    pub fn cmd(name: &'a [u8]) -> Self {
        Self {
            args: vec![Cow::Borrowed(name)],
        }
    }

    /// Create a PING command.
    #[inline]
    pub fn ping() -> Self {
        Self::cmd(b"PING")
    }

    /// Create a GET command.
    #[inline]
    pub fn get(key: &'a [u8]) -> Self {
        Self::cmd(b"GET").arg(key)
    }

    /// Create a DEL command.
    #[inline]
    pub fn del(key: &'a [u8]) -> Self {
        Self::cmd(b"DEL").arg(key)
    }

    /// Create a MGET command (multiple keys).
    #[inline]
    pub fn mget(keys: &[&'a [u8]]) -> Self {
        let mut req = Self::cmd(b"MGET");
        req.args.extend(keys.iter().map(|k| Cow::Borrowed(*k)));
        req
    }

    /// Create a MULTI command.
    #[inline]
    pub fn multi() -> Self {
        Self::cmd(b"MULTI")
    }

    /// Create an EXEC command.
    #[inline]
    pub fn exec() -> Self {
        Self::cmd(b"EXEC")
    }

    /// Add a borrowed argument.
    #[inline]
    pub fn arg(mut self, arg: &'a [u8]) -> Self {
        self.args.push(Cow::Borrowed(arg));
        self
    }

    /// Add an owned argument.
    #[inline]
    pub fn arg_owned(mut self, arg: impl Into<Vec<u8>>) -> Self {
        self.args.push(Cow::Owned(arg.into()));
        self
    }

    /// Add a signed integer argument.
    #[inline]
    pub fn arg_int(self, n: i64) -> Self {
        let mut fmt = itoa::Buffer::new();
        let s = fmt.format(n).as_bytes().to_vec();
        self.arg_owned(s)
    }

    /// Add an unsigned integer argument.
    #[inline]
    pub fn arg_uint(self, n: u64) -> Self {
        let mut fmt = itoa::Buffer::new();
        let s = fmt.format(n).as_bytes().to_vec();
        self.arg_owned(s)
    }

    /// Add a floating point argument (`1`, `0.5`, `inf`, `-inf`).
    #[inline]
    pub fn arg_float(self, d: f64) -> Self {
        self.arg_owned(d.to_string())
    }

    /// Add `token` only when `flag` is set.
    #[inline]
    pub fn arg_flag(self, flag: bool, token: &'a [u8]) -> Self {
        if flag { self.arg(token) } else { self }
    }

    /// Add every item of an iterator as an owned argument.
    pub fn args<I>(mut self, items: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        self.args
            .extend(items.into_iter().map(|i| Cow::Owned(i.as_ref().to_vec())));
        self
    }

    /// Append an argument in place.
    #[inline]
    pub fn push_arg(&mut self, arg: impl Into<Cow<'a, [u8]>>) {
        self.args.push(arg.into());
    }

    /// The command name (first token).
    #[inline]
    pub fn name(&self) -> &[u8] {
        &self.args[0]
    }

    /// The command name as text, for logs and error messages.
    pub fn name_lossy(&self) -> String {
        String::from_utf8_lossy(self.name()).into_owned()
    }

    /// The arguments after the command name.
    pub fn arguments(&self) -> impl Iterator<Item = &[u8]> {
        self.args[1..].iter().map(|a| a.as_ref())
    }

    /// Total token count, including the command name.
    #[inline]
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Pairs with [`len`](Self::len) for clippy's `len_without_is_empty`.
    /// A built request always holds its command name, so this is false.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Encode this request into a buffer.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is too small.
    #[inline]
    pub fn encode(&self, buf: &mut [u8]) -> usize {
        encode_command(buf, self.args.iter().map(|a| a.as_ref()), self.args.len())
    }

    /// Append the encoded request to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        let start = out.len();
        out.resize(start + self.encoded_len(), 0);
        let len = self.encode(&mut out[start..]);
        out.truncate(start + len);
    }

    /// Encode this request into a new vector.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut out);
        out
    }

    /// Calculate the encoded length of this request.
    pub fn encoded_len(&self) -> usize {
        let mut fmt = itoa::Buffer::new();
        // Array header: *<count>\r\n
        let mut len = 1 + fmt.format(self.args.len()).len() + 2;
        // Each argument: $<len>\r\n<data>\r\n
        for arg in &self.args {
            len += 1 + fmt.format(arg.len()).len() + 2 + arg.len() + 2;
        }
        len
    }
}

impl fmt::Debug for Request<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Request")
            .field(
                &self
                    .args
                    .iter()
                    .map(|a| String::from_utf8_lossy(a))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Encode a command (array of bulk strings) into a buffer.
///
/// Returns the number of bytes written.
pub fn encode_command<'b>(
    buf: &mut [u8],
    args: impl Iterator<Item = &'b [u8]>,
    count: usize,
) -> usize {
    let mut fmt = itoa::Buffer::new();
    let mut pos = write_header(buf, b'*', fmt.format(count).as_bytes());

    for arg in args {
        pos += write_header(&mut buf[pos..], b'$', fmt.format(arg.len()).as_bytes());
        buf[pos..pos + arg.len()].copy_from_slice(arg);
        pos += arg.len();
        buf[pos] = b'\r';
        buf[pos + 1] = b'\n';
        pos += 2;
    }

    pos
}

fn write_header(buf: &mut [u8], prefix: u8, digits: &[u8]) -> usize {
    buf[0] = prefix;
    buf[1..1 + digits.len()].copy_from_slice(digits);
    buf[1 + digits.len()] = b'\r';
    buf[2 + digits.len()] = b'\n';
    3 + digits.len()
}
