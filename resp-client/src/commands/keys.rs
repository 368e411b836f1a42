use bytes::Bytes;
use resp_proto::Request;

use super::{SortOrder, invalid};
use crate::client::Client;
use crate::connection::Connection;
use crate::reply::{
    array_reply, binary_reply, bool_reply, bulk_reply, integer_or_nil_reply, integer_reply,
    ok_reply, scan_reply, status_reply,
};
use crate::Error;

/// Filters for the `SCAN` family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// `MATCH` glob.
    pub pattern: Option<String>,
    pub count: Option<u64>,
    /// `TYPE`, honoured by `SCAN` only.
    pub key_type: Option<String>,
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn key_type(mut self, key_type: impl Into<String>) -> Self {
        self.key_type = Some(key_type.into());
        self
    }

    pub(crate) fn push<'a>(&self, mut req: Request<'a>) -> Request<'a> {
        if let Some(ref pattern) = self.pattern {
            req = req.arg(b"MATCH").arg_owned(pattern.as_bytes());
        }
        if let Some(count) = self.count {
            req = req.arg(b"COUNT").arg_uint(count);
        }
        req
    }
}

/// Options for `RESTORE`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreOptions {
    pub replace: bool,
    /// Treat the TTL as an absolute unix time in milliseconds.
    pub absttl: bool,
    pub idletime: Option<u64>,
    pub freq: Option<u64>,
}

/// Options for `SORT`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortOptions {
    /// `BY` pattern.
    pub by: Option<String>,
    /// `LIMIT offset count`.
    pub limit: Option<(i64, i64)>,
    /// `GET` patterns, in order.
    pub get: Vec<String>,
    pub order: Option<SortOrder>,
    pub alpha: bool,
}

/// `SCAN cursor [MATCH p] [COUNT n] [TYPE t]`.
pub fn scan(cursor: u64, options: &ScanOptions) -> Request<'static> {
    let mut req = options.push(Request::cmd(b"SCAN").arg_uint(cursor));
    if let Some(ref key_type) = options.key_type {
        req = req.arg(b"TYPE").arg_owned(key_type.as_bytes());
    }
    req
}

/// `RESTORE key ttl payload [REPLACE] [ABSTTL] [IDLETIME s] [FREQ f]`.
///
/// `IDLETIME` and `FREQ` are mutually exclusive.
pub fn restore<'a>(
    key: &'a [u8],
    ttl_ms: u64,
    payload: &'a [u8],
    options: &RestoreOptions,
) -> Result<Request<'a>, Error> {
    if options.idletime.is_some() && options.freq.is_some() {
        return Err(invalid("RESTORE accepts IDLETIME or FREQ, not both"));
    }
    let mut req = Request::cmd(b"RESTORE")
        .arg(key)
        .arg_uint(ttl_ms)
        .arg(payload)
        .arg_flag(options.replace, b"REPLACE")
        .arg_flag(options.absttl, b"ABSTTL");
    if let Some(secs) = options.idletime {
        req = req.arg(b"IDLETIME").arg_uint(secs);
    }
    if let Some(freq) = options.freq {
        req = req.arg(b"FREQ").arg_uint(freq);
    }
    Ok(req)
}

/// `SORT key [BY p] [LIMIT o c] [GET p ...] [ASC|DESC] [ALPHA] [STORE dest]`.
pub fn sort<'a>(key: &'a [u8], options: &SortOptions, store: Option<&'a [u8]>) -> Request<'a> {
    let mut req = Request::cmd(b"SORT").arg(key);
    if let Some(ref by) = options.by {
        req = req.arg(b"BY").arg_owned(by.as_bytes());
    }
    if let Some((offset, count)) = options.limit {
        req = req.arg(b"LIMIT").arg_int(offset).arg_int(count);
    }
    for pattern in &options.get {
        req = req.arg(b"GET").arg_owned(pattern.as_bytes());
    }
    if let Some(order) = options.order {
        req = req.arg(order.token());
    }
    req = req.arg_flag(options.alpha, b"ALPHA");
    if let Some(dest) = store {
        req = req.arg(b"STORE").arg(dest);
    }
    req
}

fn keyed<K: AsRef<[u8]>>(
    name: &'static [u8],
    keys: impl IntoIterator<Item = K>,
) -> Result<Request<'static>, Error> {
    let req = Request::cmd(name).args(keys);
    if req.len() == 1 {
        return Err(invalid(format!(
            "{} requires at least one key",
            String::from_utf8_lossy(name)
        )));
    }
    Ok(req)
}

impl<C: Connection> Client<C> {
    /// Delete keys. Returns how many existed.
    pub async fn del<K: AsRef<[u8]>>(
        &mut self,
        keys: impl IntoIterator<Item = K>,
    ) -> Result<i64, Error> {
        let req = keyed(b"DEL", keys)?;
        integer_reply(self.exec(&req).await?)
    }

    /// Delete keys, reclaiming memory in the background.
    pub async fn unlink<K: AsRef<[u8]>>(
        &mut self,
        keys: impl IntoIterator<Item = K>,
    ) -> Result<i64, Error> {
        let req = keyed(b"UNLINK", keys)?;
        integer_reply(self.exec(&req).await?)
    }

    /// Count how many of `keys` exist. Repeated keys count repeatedly.
    pub async fn exists<K: AsRef<[u8]>>(
        &mut self,
        keys: impl IntoIterator<Item = K>,
    ) -> Result<i64, Error> {
        let req = keyed(b"EXISTS", keys)?;
        integer_reply(self.exec(&req).await?)
    }

    pub async fn touch<K: AsRef<[u8]>>(
        &mut self,
        keys: impl IntoIterator<Item = K>,
    ) -> Result<i64, Error> {
        let req = keyed(b"TOUCH", keys)?;
        integer_reply(self.exec(&req).await?)
    }

    /// Set a TTL in seconds. Returns false if the key does not exist.
    pub async fn expire(&mut self, key: impl AsRef<[u8]>, secs: u64) -> Result<bool, Error> {
        let req = Request::cmd(b"EXPIRE").arg(key.as_ref()).arg_uint(secs);
        bool_reply(self.exec(&req).await?)
    }

    pub async fn pexpire(&mut self, key: impl AsRef<[u8]>, ms: u64) -> Result<bool, Error> {
        let req = Request::cmd(b"PEXPIRE").arg(key.as_ref()).arg_uint(ms);
        bool_reply(self.exec(&req).await?)
    }

    pub async fn expireat(&mut self, key: impl AsRef<[u8]>, ts: u64) -> Result<bool, Error> {
        let req = Request::cmd(b"EXPIREAT").arg(key.as_ref()).arg_uint(ts);
        bool_reply(self.exec(&req).await?)
    }

    pub async fn pexpireat(&mut self, key: impl AsRef<[u8]>, ts_ms: u64) -> Result<bool, Error> {
        let req = Request::cmd(b"PEXPIREAT").arg(key.as_ref()).arg_uint(ts_ms);
        bool_reply(self.exec(&req).await?)
    }

    /// Remaining TTL in seconds: -1 without expiry, -2 if missing.
    pub async fn ttl(&mut self, key: impl AsRef<[u8]>) -> Result<i64, Error> {
        integer_reply(self.exec(&Request::cmd(b"TTL").arg(key.as_ref())).await?)
    }

    pub async fn pttl(&mut self, key: impl AsRef<[u8]>) -> Result<i64, Error> {
        integer_reply(self.exec(&Request::cmd(b"PTTL").arg(key.as_ref())).await?)
    }

    /// Remove the expiry. Returns false if there was none.
    pub async fn persist(&mut self, key: impl AsRef<[u8]>) -> Result<bool, Error> {
        bool_reply(self.exec(&Request::cmd(b"PERSIST").arg(key.as_ref())).await?)
    }

    /// The type name of the value at `key` (`TYPE`), `none` if missing.
    pub async fn key_type(&mut self, key: impl AsRef<[u8]>) -> Result<String, Error> {
        status_reply(self.exec(&Request::cmd(b"TYPE").arg(key.as_ref())).await?)
    }

    pub async fn rename(
        &mut self,
        key: impl AsRef<[u8]>,
        new_key: impl AsRef<[u8]>,
    ) -> Result<(), Error> {
        let req = Request::cmd(b"RENAME").arg(key.as_ref()).arg(new_key.as_ref());
        ok_reply(self.exec(&req).await?)
    }

    /// Rename only if `new_key` does not exist.
    pub async fn renamenx(
        &mut self,
        key: impl AsRef<[u8]>,
        new_key: impl AsRef<[u8]>,
    ) -> Result<bool, Error> {
        let req = Request::cmd(b"RENAMENX").arg(key.as_ref()).arg(new_key.as_ref());
        bool_reply(self.exec(&req).await?)
    }

    /// Every key matching a glob. Prefer [`scan`](Self::scan) on large keyspaces.
    pub async fn keys(&mut self, pattern: impl AsRef<[u8]>) -> Result<Vec<Bytes>, Error> {
        array_reply(self.exec(&Request::cmd(b"KEYS").arg(pattern.as_ref())).await?)
    }

    /// One `SCAN` page: the next cursor and the keys found.
    pub async fn scan(
        &mut self,
        cursor: u64,
        options: &ScanOptions,
    ) -> Result<(u64, Vec<Bytes>), Error> {
        scan_reply(self.exec(&scan(cursor, options)).await?)
    }

    pub async fn randomkey(&mut self) -> Result<Option<Bytes>, Error> {
        binary_reply(self.exec(&Request::cmd(b"RANDOMKEY")).await?)
    }

    /// Serialized value for [`restore`](Self::restore). `None` if missing.
    pub async fn dump(&mut self, key: impl AsRef<[u8]>) -> Result<Option<Bytes>, Error> {
        binary_reply(self.exec(&Request::cmd(b"DUMP").arg(key.as_ref())).await?)
    }

    pub async fn restore(
        &mut self,
        key: impl AsRef<[u8]>,
        ttl_ms: u64,
        payload: impl AsRef<[u8]>,
        options: &RestoreOptions,
    ) -> Result<(), Error> {
        let req = restore(key.as_ref(), ttl_ms, payload.as_ref(), options)?;
        ok_reply(self.exec(&req).await?)
    }

    /// Move a key to another database (`MOVE`).
    pub async fn move_key(&mut self, key: impl AsRef<[u8]>, db: u32) -> Result<bool, Error> {
        let req = Request::cmd(b"MOVE").arg(key.as_ref()).arg_uint(db as u64);
        bool_reply(self.exec(&req).await?)
    }

    /// Internal encoding of a value (`OBJECT ENCODING`).
    pub async fn object_encoding(
        &mut self,
        key: impl AsRef<[u8]>,
    ) -> Result<Option<String>, Error> {
        let req = Request::cmd(b"OBJECT").arg(b"ENCODING").arg(key.as_ref());
        bulk_reply(self.exec(&req).await?)
    }

    pub async fn object_refcount(&mut self, key: impl AsRef<[u8]>) -> Result<Option<i64>, Error> {
        let req = Request::cmd(b"OBJECT").arg(b"REFCOUNT").arg(key.as_ref());
        integer_or_nil_reply(self.exec(&req).await?)
    }

    pub async fn object_idletime(&mut self, key: impl AsRef<[u8]>) -> Result<Option<i64>, Error> {
        let req = Request::cmd(b"OBJECT").arg(b"IDLETIME").arg(key.as_ref());
        integer_or_nil_reply(self.exec(&req).await?)
    }

    pub async fn object_freq(&mut self, key: impl AsRef<[u8]>) -> Result<Option<i64>, Error> {
        let req = Request::cmd(b"OBJECT").arg(b"FREQ").arg(key.as_ref());
        integer_or_nil_reply(self.exec(&req).await?)
    }

    /// Sorted elements. With `GET #`-style patterns, missing lookups are `None`.
    pub async fn sort(
        &mut self,
        key: impl AsRef<[u8]>,
        options: &SortOptions,
    ) -> Result<Vec<Option<Bytes>>, Error> {
        array_reply(self.exec(&sort(key.as_ref(), options, None)).await?)
    }

    /// Sort into `dest`. Returns the stored length.
    pub async fn sort_store(
        &mut self,
        key: impl AsRef<[u8]>,
        dest: impl AsRef<[u8]>,
        options: &SortOptions,
    ) -> Result<i64, Error> {
        let req = sort(key.as_ref(), options, Some(dest.as_ref()));
        integer_reply(self.exec(&req).await?)
    }
}

#[cfg(test)]
mod tests {
    use resp_proto::Value;

    use super::*;
    use crate::commands::args_of;
    use crate::MockConnection;

    #[test]
    fn scan_arguments() {
        let opts = ScanOptions::new().pattern("user:*").count(100).key_type("hash");
        assert_eq!(
            args_of(&scan(0, &opts)),
            ["0", "MATCH", "user:*", "COUNT", "100", "TYPE", "hash"]
        );
    }

    #[test]
    fn sort_arguments() {
        let opts = SortOptions {
            by: Some("w_*".into()),
            limit: Some((0, 10)),
            get: vec!["#".into(), "o_*".into()],
            order: Some(SortOrder::Desc),
            alpha: true,
        };
        assert_eq!(
            args_of(&sort(b"l", &opts, Some(b"dst"))),
            [
                "l", "BY", "w_*", "LIMIT", "0", "10", "GET", "#", "GET", "o_*", "DESC", "ALPHA",
                "STORE", "dst"
            ]
        );
    }

    #[test]
    fn restore_rejects_idletime_with_freq() {
        let opts = RestoreOptions {
            idletime: Some(1),
            freq: Some(2),
            ..Default::default()
        };
        assert!(matches!(
            restore(b"k", 0, b"x", &opts),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn del_requires_keys() {
        let mut client = Client::new(MockConnection::connected());
        let none: [&str; 0] = [];
        assert!(matches!(client.del(none).await, Err(Error::InvalidArgument(_))));
        assert!(client.conn().written().is_empty());
    }

    #[tokio::test]
    async fn scan_page() {
        let conn = MockConnection::connected().with_reply(&Value::array(vec![
            Value::bulk_string(b"17"),
            Value::array(vec![Value::bulk_string(b"a"), Value::bulk_string(b"b")]),
        ]));
        let mut client = Client::new(conn);
        let (cursor, keys) = client.scan(0, &ScanOptions::new()).await.unwrap();
        assert_eq!(cursor, 17);
        assert_eq!(keys, vec![Bytes::from_static(b"a"), Bytes::from_static(b"b")]);
    }

    #[tokio::test]
    async fn ttl_and_type() {
        let conn = MockConnection::connected().with_replies(&[
            Value::integer(1),
            Value::integer(-2),
            Value::simple_string(b"string"),
        ]);
        let mut client = Client::new(conn);
        assert!(client.expire("k", 10).await.unwrap());
        assert_eq!(client.ttl("gone").await.unwrap(), -2);
        assert_eq!(client.key_type("k").await.unwrap(), "string");
    }
}
