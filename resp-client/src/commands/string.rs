use bytes::Bytes;
use resp_proto::Request;

use super::{Condition, invalid};
use crate::client::Client;
use crate::connection::Connection;
use crate::reply::{
    array_reply, binary_reply, bool_reply, float_reply, integer_reply, ok_reply,
};
use crate::Error;

// ── Options ─────────────────────────────────────────────────────────────

/// Options for `SET`.
///
/// Only one expiry is sent. If several are given, the first of
/// `EX`, `PX`, `EXAT`, `PXAT`, `KEEPTTL` wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetOptions {
    pub ex: Option<u64>,
    pub px: Option<u64>,
    pub exat: Option<u64>,
    pub pxat: Option<u64>,
    pub keepttl: bool,
    pub condition: Option<Condition>,
    /// Return the previous value (`GET`).
    pub get: bool,
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expire after `secs` seconds.
    pub fn ex(mut self, secs: u64) -> Self {
        self.ex = Some(secs);
        self
    }

    /// Expire after `ms` milliseconds.
    pub fn px(mut self, ms: u64) -> Self {
        self.px = Some(ms);
        self
    }

    /// Expire at a unix time in seconds.
    pub fn exat(mut self, ts: u64) -> Self {
        self.exat = Some(ts);
        self
    }

    /// Expire at a unix time in milliseconds.
    pub fn pxat(mut self, ts: u64) -> Self {
        self.pxat = Some(ts);
        self
    }

    pub fn keepttl(mut self) -> Self {
        self.keepttl = true;
        self
    }

    pub fn nx(mut self) -> Self {
        self.condition = Some(Condition::Nx);
        self
    }

    pub fn xx(mut self) -> Self {
        self.condition = Some(Condition::Xx);
        self
    }

    pub fn get(mut self) -> Self {
        self.get = true;
        self
    }
}

/// Options for `GETEX`. First present wins: `EX`, `PX`, `EXAT`, `PXAT`,
/// `PERSIST`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetExOptions {
    pub ex: Option<u64>,
    pub px: Option<u64>,
    pub exat: Option<u64>,
    pub pxat: Option<u64>,
    pub persist: bool,
}

fn push_expiry<'a>(
    req: Request<'a>,
    ex: Option<u64>,
    px: Option<u64>,
    exat: Option<u64>,
    pxat: Option<u64>,
) -> (Request<'a>, bool) {
    let pushed = match (ex, px, exat, pxat) {
        (Some(s), ..) => Some((&b"EX"[..], s)),
        (None, Some(ms), ..) => Some((&b"PX"[..], ms)),
        (None, None, Some(ts), _) => Some((&b"EXAT"[..], ts)),
        (None, None, None, Some(ts)) => Some((&b"PXAT"[..], ts)),
        _ => None,
    };
    match pushed {
        Some((token, n)) => (req.arg(token).arg_uint(n), true),
        None => (req, false),
    }
}

// ── Encoders ────────────────────────────────────────────────────────────

/// `SET key value [EX|PX|EXAT|PXAT|KEEPTTL] [NX|XX] [GET]`.
pub fn set<'a>(key: &'a [u8], value: &'a [u8], options: &SetOptions) -> Request<'a> {
    let req = Request::cmd(b"SET").arg(key).arg(value);
    let (mut req, expiry) = push_expiry(req, options.ex, options.px, options.exat, options.pxat);
    if !expiry && options.keepttl {
        req = req.arg(b"KEEPTTL");
    }
    if let Some(condition) = options.condition {
        req = req.arg(condition.token());
    }
    req.arg_flag(options.get, b"GET")
}

/// `GETEX key [EX|PX|EXAT|PXAT|PERSIST]`.
pub fn getex<'a>(key: &'a [u8], options: &GetExOptions) -> Request<'a> {
    let req = Request::cmd(b"GETEX").arg(key);
    let (req, expiry) = push_expiry(req, options.ex, options.px, options.exat, options.pxat);
    req.arg_flag(!expiry && options.persist, b"PERSIST")
}

fn pairs_request<K, V>(
    name: &'static [u8],
    pairs: impl IntoIterator<Item = (K, V)>,
) -> Result<Request<'static>, Error>
where
    K: AsRef<[u8]>,
    V: AsRef<[u8]>,
{
    let mut req = Request::cmd(name);
    for (k, v) in pairs {
        req = req.arg_owned(k.as_ref()).arg_owned(v.as_ref());
    }
    if req.len() == 1 {
        return Err(invalid(format!(
            "{} requires at least one key/value pair",
            String::from_utf8_lossy(name)
        )));
    }
    Ok(req)
}

/// `MSET k1 v1 [k2 v2 ...]`. At least one pair is required.
pub fn mset<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Request<'static>, Error>
where
    K: AsRef<[u8]>,
    V: AsRef<[u8]>,
{
    pairs_request(b"MSET", pairs)
}

/// `MSETNX k1 v1 [k2 v2 ...]`. At least one pair is required.
pub fn msetnx<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Request<'static>, Error>
where
    K: AsRef<[u8]>,
    V: AsRef<[u8]>,
{
    pairs_request(b"MSETNX", pairs)
}

// ── Commands ────────────────────────────────────────────────────────────

impl<C: Connection> Client<C> {
    /// Get the value of a key. Returns `None` on a miss.
    pub async fn get(&mut self, key: impl AsRef<[u8]>) -> Result<Option<Bytes>, Error> {
        binary_reply(self.exec(&Request::get(key.as_ref())).await?)
    }

    /// Set a key-value pair.
    pub async fn set(&mut self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<(), Error> {
        let req = set(key.as_ref(), value.as_ref(), &SetOptions::default());
        ok_reply(self.exec(&req).await?)
    }

    /// `SET` with options.
    ///
    /// Returns `None` when an `NX`/`XX` condition skipped the write, or when
    /// `GET` found no previous value. Otherwise returns the previous value
    /// with `GET`, or the status text `OK`.
    pub async fn set_with(
        &mut self,
        key: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
        options: &SetOptions,
    ) -> Result<Option<Bytes>, Error> {
        let req = set(key.as_ref(), value.as_ref(), options);
        binary_reply(self.exec(&req).await?)
    }

    /// Set only if the key does not exist. Returns whether it was set.
    pub async fn setnx(
        &mut self,
        key: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
    ) -> Result<bool, Error> {
        let req = Request::cmd(b"SETNX").arg(key.as_ref()).arg(value.as_ref());
        bool_reply(self.exec(&req).await?)
    }

    /// Set with a TTL in seconds.
    pub async fn setex(
        &mut self,
        key: impl AsRef<[u8]>,
        secs: u64,
        value: impl AsRef<[u8]>,
    ) -> Result<(), Error> {
        let req = Request::cmd(b"SETEX")
            .arg(key.as_ref())
            .arg_uint(secs)
            .arg(value.as_ref());
        ok_reply(self.exec(&req).await?)
    }

    /// Set with a TTL in milliseconds.
    pub async fn psetex(
        &mut self,
        key: impl AsRef<[u8]>,
        ms: u64,
        value: impl AsRef<[u8]>,
    ) -> Result<(), Error> {
        let req = Request::cmd(b"PSETEX")
            .arg(key.as_ref())
            .arg_uint(ms)
            .arg(value.as_ref());
        ok_reply(self.exec(&req).await?)
    }

    pub async fn getset(
        &mut self,
        key: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
    ) -> Result<Option<Bytes>, Error> {
        let req = Request::cmd(b"GETSET").arg(key.as_ref()).arg(value.as_ref());
        binary_reply(self.exec(&req).await?)
    }

    pub async fn getdel(&mut self, key: impl AsRef<[u8]>) -> Result<Option<Bytes>, Error> {
        binary_reply(self.exec(&Request::cmd(b"GETDEL").arg(key.as_ref())).await?)
    }

    /// Get a value and update its expiry.
    pub async fn getex(
        &mut self,
        key: impl AsRef<[u8]>,
        options: &GetExOptions,
    ) -> Result<Option<Bytes>, Error> {
        binary_reply(self.exec(&getex(key.as_ref(), options)).await?)
    }

    /// Get several values. Misses are `None`, in key order.
    pub async fn mget<K: AsRef<[u8]>>(
        &mut self,
        keys: impl IntoIterator<Item = K>,
    ) -> Result<Vec<Option<Bytes>>, Error> {
        let req = Request::cmd(b"MGET").args(keys);
        if req.len() == 1 {
            return Err(invalid("MGET requires at least one key"));
        }
        array_reply(self.exec(&req).await?)
    }

    pub async fn mset<K, V>(&mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Result<(), Error>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let req = mset(pairs)?;
        ok_reply(self.exec(&req).await?)
    }

    /// Set every pair, or none if any key exists.
    pub async fn msetnx<K, V>(
        &mut self,
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Result<bool, Error>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let req = msetnx(pairs)?;
        bool_reply(self.exec(&req).await?)
    }

    pub async fn incr(&mut self, key: impl AsRef<[u8]>) -> Result<i64, Error> {
        integer_reply(self.exec(&Request::cmd(b"INCR").arg(key.as_ref())).await?)
    }

    pub async fn decr(&mut self, key: impl AsRef<[u8]>) -> Result<i64, Error> {
        integer_reply(self.exec(&Request::cmd(b"DECR").arg(key.as_ref())).await?)
    }

    pub async fn incrby(&mut self, key: impl AsRef<[u8]>, delta: i64) -> Result<i64, Error> {
        let req = Request::cmd(b"INCRBY").arg(key.as_ref()).arg_int(delta);
        integer_reply(self.exec(&req).await?)
    }

    pub async fn decrby(&mut self, key: impl AsRef<[u8]>, delta: i64) -> Result<i64, Error> {
        let req = Request::cmd(b"DECRBY").arg(key.as_ref()).arg_int(delta);
        integer_reply(self.exec(&req).await?)
    }

    pub async fn incrbyfloat(&mut self, key: impl AsRef<[u8]>, delta: f64) -> Result<f64, Error> {
        let req = Request::cmd(b"INCRBYFLOAT").arg(key.as_ref()).arg_float(delta);
        float_reply(self.exec(&req).await?)
    }

    /// Append to a string. Returns the new length.
    pub async fn append(
        &mut self,
        key: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
    ) -> Result<i64, Error> {
        let req = Request::cmd(b"APPEND").arg(key.as_ref()).arg(value.as_ref());
        integer_reply(self.exec(&req).await?)
    }

    pub async fn strlen(&mut self, key: impl AsRef<[u8]>) -> Result<i64, Error> {
        integer_reply(self.exec(&Request::cmd(b"STRLEN").arg(key.as_ref())).await?)
    }

    /// Substring with inclusive, possibly negative, offsets.
    pub async fn getrange(
        &mut self,
        key: impl AsRef<[u8]>,
        start: i64,
        end: i64,
    ) -> Result<Bytes, Error> {
        let req = Request::cmd(b"GETRANGE")
            .arg(key.as_ref())
            .arg_int(start)
            .arg_int(end);
        Ok(binary_reply(self.exec(&req).await?)?.unwrap_or_default())
    }

    /// Overwrite part of a string. Returns the new length.
    pub async fn setrange(
        &mut self,
        key: impl AsRef<[u8]>,
        offset: u64,
        value: impl AsRef<[u8]>,
    ) -> Result<i64, Error> {
        let req = Request::cmd(b"SETRANGE")
            .arg(key.as_ref())
            .arg_uint(offset)
            .arg(value.as_ref());
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
    fn set_nx() {
        let req = set(b"k", b"v", &SetOptions::new().nx());
        assert_eq!(args_of(&req), ["k", "v", "NX"]);
    }

    #[test]
    fn set_expiry_precedence() {
        let opts = SetOptions::new().keepttl().pxat(9).px(1500).xx().get();
        assert_eq!(args_of(&set(b"k", b"v", &opts)), ["k", "v", "PX", "1500", "XX", "GET"]);

        let opts = SetOptions::new().keepttl();
        assert_eq!(args_of(&set(b"k", b"v", &opts)), ["k", "v", "KEEPTTL"]);

        let opts = SetOptions::new().ex(10).px(5);
        assert_eq!(args_of(&set(b"k", b"v", &opts)), ["k", "v", "EX", "10"]);
    }

    #[test]
    fn getex_persist_is_last_resort() {
        let opts = GetExOptions {
            persist: true,
            ..Default::default()
        };
        assert_eq!(args_of(&getex(b"k", &opts)), ["k", "PERSIST"]);

        let opts = GetExOptions {
            exat: Some(100),
            persist: true,
            ..Default::default()
        };
        assert_eq!(args_of(&getex(b"k", &opts)), ["k", "EXAT", "100"]);
    }

    #[test]
    fn mset_requires_pairs() {
        let empty: [(&str, &str); 0] = [];
        assert!(matches!(mset(empty), Err(Error::InvalidArgument(_))));
        let req = mset([("a", "1"), ("b", "2")]).unwrap();
        assert_eq!(args_of(&req), ["a", "1", "b", "2"]);
    }

    #[tokio::test]
    async fn set_nx_nil_is_none() {
        let conn = MockConnection::connected().with_reply(&Value::Null);
        let mut client = Client::new(conn);
        let reply = client.set_with("k", "v", &SetOptions::new().nx()).await.unwrap();
        assert_eq!(reply, None);
        assert_eq!(
            client.conn().written_commands()[0],
            vec![b"SET".to_vec(), b"k".to_vec(), b"v".to_vec(), b"NX".to_vec()]
        );
    }

    #[tokio::test]
    async fn string_commands() {
        let conn = MockConnection::connected().with_replies(&[
            Value::simple_string(b"OK"),
            Value::bulk_string(b"v"),
            Value::Null,
            Value::integer(11),
            Value::bulk_string(b"11.5"),
            Value::array(vec![Value::bulk_string(b"v"), Value::Null]),
            Value::bulk_string(b""),
        ]);
        let mut client = Client::new(conn);
        client.set("k", "v").await.unwrap();
        assert_eq!(client.get("k").await.unwrap(), Some(Bytes::from_static(b"v")));
        assert_eq!(client.get("missing").await.unwrap(), None);
        assert_eq!(client.incrby("n", 10).await.unwrap(), 11);
        assert_eq!(client.incrbyfloat("n", 0.5).await.unwrap(), 11.5);
        assert_eq!(
            client.mget(["k", "missing"]).await.unwrap(),
            vec![Some(Bytes::from_static(b"v")), None]
        );
        assert!(client.getrange("k", 5, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn set_rejects_unexpected_status() {
        let conn = MockConnection::connected().with_reply(&Value::simple_string(b"QUEUED"));
        let mut client = Client::new(conn);
        assert!(matches!(
            client.set("k", "v").await,
            Err(Error::UnexpectedResponse)
        ));
    }
}
