use bytes::Bytes;
use resp_proto::Request;

use super::invalid;
use crate::client::Client;
use crate::connection::Connection;
use crate::reply::{
    array_or_nil_reply, array_reply, binary_reply, integer_or_nil_reply, integer_reply, ok_reply,
    pair_or_nil_reply,
};
use crate::Error;

/// `LINSERT` position relative to the pivot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    Before,
    After,
}

/// The end of a list to pop from or push to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    fn token(self) -> &'static [u8] {
        match self {
            Direction::Left => b"LEFT",
            Direction::Right => b"RIGHT",
        }
    }
}

/// Options for `LPOS`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LposOptions {
    pub rank: Option<i64>,
    pub maxlen: Option<u64>,
}

/// `LPOS key element [RANK r] [COUNT n] [MAXLEN m]`.
pub fn lpos<'a>(
    key: &'a [u8],
    element: &'a [u8],
    count: Option<u64>,
    options: &LposOptions,
) -> Request<'a> {
    let mut req = Request::cmd(b"LPOS").arg(key).arg(element);
    if let Some(rank) = options.rank {
        req = req.arg(b"RANK").arg_int(rank);
    }
    if let Some(count) = count {
        req = req.arg(b"COUNT").arg_uint(count);
    }
    if let Some(maxlen) = options.maxlen {
        req = req.arg(b"MAXLEN").arg_uint(maxlen);
    }
    req
}

fn push_request<V: AsRef<[u8]>>(
    name: &'static [u8],
    key: &[u8],
    values: impl IntoIterator<Item = V>,
) -> Result<Request<'static>, Error> {
    let req = Request::cmd(name).arg_owned(key).args(values);
    if req.len() == 2 {
        return Err(invalid(format!(
            "{} requires at least one element",
            String::from_utf8_lossy(name)
        )));
    }
    Ok(req)
}

fn blocking<K: AsRef<[u8]>>(
    name: &'static [u8],
    keys: impl IntoIterator<Item = K>,
    timeout_secs: f64,
) -> Result<Request<'static>, Error> {
    let req = Request::cmd(name).args(keys);
    if req.len() == 1 {
        return Err(invalid(format!(
            "{} requires at least one key",
            String::from_utf8_lossy(name)
        )));
    }
    Ok(req.arg_float(timeout_secs))
}

impl<C: Connection> Client<C> {
    /// Prepend elements. Returns the new length.
    pub async fn lpush<V: AsRef<[u8]>>(
        &mut self,
        key: impl AsRef<[u8]>,
        values: impl IntoIterator<Item = V>,
    ) -> Result<i64, Error> {
        let req = push_request(b"LPUSH", key.as_ref(), values)?;
        integer_reply(self.exec(&req).await?)
    }

    /// Append elements. Returns the new length.
    pub async fn rpush<V: AsRef<[u8]>>(
        &mut self,
        key: impl AsRef<[u8]>,
        values: impl IntoIterator<Item = V>,
    ) -> Result<i64, Error> {
        let req = push_request(b"RPUSH", key.as_ref(), values)?;
        integer_reply(self.exec(&req).await?)
    }

    /// Prepend only if the list exists.
    pub async fn lpushx<V: AsRef<[u8]>>(
        &mut self,
        key: impl AsRef<[u8]>,
        values: impl IntoIterator<Item = V>,
    ) -> Result<i64, Error> {
        let req = push_request(b"LPUSHX", key.as_ref(), values)?;
        integer_reply(self.exec(&req).await?)
    }

    /// Append only if the list exists.
    pub async fn rpushx<V: AsRef<[u8]>>(
        &mut self,
        key: impl AsRef<[u8]>,
        values: impl IntoIterator<Item = V>,
    ) -> Result<i64, Error> {
        let req = push_request(b"RPUSHX", key.as_ref(), values)?;
        integer_reply(self.exec(&req).await?)
    }

    pub async fn lpop(&mut self, key: impl AsRef<[u8]>) -> Result<Option<Bytes>, Error> {
        binary_reply(self.exec(&Request::cmd(b"LPOP").arg(key.as_ref())).await?)
    }

    /// Pop up to `count` elements. A missing list is empty.
    pub async fn lpop_count(
        &mut self,
        key: impl AsRef<[u8]>,
        count: u64,
    ) -> Result<Vec<Bytes>, Error> {
        let req = Request::cmd(b"LPOP").arg(key.as_ref()).arg_uint(count);
        array_or_nil_reply(self.exec(&req).await?)
    }

    pub async fn rpop(&mut self, key: impl AsRef<[u8]>) -> Result<Option<Bytes>, Error> {
        binary_reply(self.exec(&Request::cmd(b"RPOP").arg(key.as_ref())).await?)
    }

    pub async fn rpop_count(
        &mut self,
        key: impl AsRef<[u8]>,
        count: u64,
    ) -> Result<Vec<Bytes>, Error> {
        let req = Request::cmd(b"RPOP").arg(key.as_ref()).arg_uint(count);
        array_or_nil_reply(self.exec(&req).await?)
    }

    pub async fn llen(&mut self, key: impl AsRef<[u8]>) -> Result<i64, Error> {
        integer_reply(self.exec(&Request::cmd(b"LLEN").arg(key.as_ref())).await?)
    }

    pub async fn lindex(
        &mut self,
        key: impl AsRef<[u8]>,
        index: i64,
    ) -> Result<Option<Bytes>, Error> {
        let req = Request::cmd(b"LINDEX").arg(key.as_ref()).arg_int(index);
        binary_reply(self.exec(&req).await?)
    }

    /// Elements between inclusive, possibly negative, indices.
    pub async fn lrange(
        &mut self,
        key: impl AsRef<[u8]>,
        start: i64,
        stop: i64,
    ) -> Result<Vec<Bytes>, Error> {
        let req = Request::cmd(b"LRANGE")
            .arg(key.as_ref())
            .arg_int(start)
            .arg_int(stop);
        array_reply(self.exec(&req).await?)
    }

    pub async fn ltrim(&mut self, key: impl AsRef<[u8]>, start: i64, stop: i64) -> Result<(), Error> {
        let req = Request::cmd(b"LTRIM")
            .arg(key.as_ref())
            .arg_int(start)
            .arg_int(stop);
        ok_reply(self.exec(&req).await?)
    }

    pub async fn lset(
        &mut self,
        key: impl AsRef<[u8]>,
        index: i64,
        value: impl AsRef<[u8]>,
    ) -> Result<(), Error> {
        let req = Request::cmd(b"LSET")
            .arg(key.as_ref())
            .arg_int(index)
            .arg(value.as_ref());
        ok_reply(self.exec(&req).await?)
    }

    /// Remove occurrences of `value`: the first `count` from the head when
    /// positive, from the tail when negative, all when zero.
    pub async fn lrem(
        &mut self,
        key: impl AsRef<[u8]>,
        count: i64,
        value: impl AsRef<[u8]>,
    ) -> Result<i64, Error> {
        let req = Request::cmd(b"LREM")
            .arg(key.as_ref())
            .arg_int(count)
            .arg(value.as_ref());
        integer_reply(self.exec(&req).await?)
    }

    /// Returns the new length, or -1 if the pivot was not found.
    pub async fn linsert(
        &mut self,
        key: impl AsRef<[u8]>,
        position: InsertPosition,
        pivot: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
    ) -> Result<i64, Error> {
        let where_ = match position {
            InsertPosition::Before => &b"BEFORE"[..],
            InsertPosition::After => &b"AFTER"[..],
        };
        let req = Request::cmd(b"LINSERT")
            .arg(key.as_ref())
            .arg(where_)
            .arg(pivot.as_ref())
            .arg(value.as_ref());
        integer_reply(self.exec(&req).await?)
    }

    /// Index of the first match, or `None`.
    pub async fn lpos(
        &mut self,
        key: impl AsRef<[u8]>,
        element: impl AsRef<[u8]>,
        options: &LposOptions,
    ) -> Result<Option<i64>, Error> {
        let req = lpos(key.as_ref(), element.as_ref(), None, options);
        integer_or_nil_reply(self.exec(&req).await?)
    }

    /// Indices of up to `count` matches (0 for all).
    pub async fn lpos_count(
        &mut self,
        key: impl AsRef<[u8]>,
        element: impl AsRef<[u8]>,
        count: u64,
        options: &LposOptions,
    ) -> Result<Vec<i64>, Error> {
        let req = lpos(key.as_ref(), element.as_ref(), Some(count), options);
        array_reply(self.exec(&req).await?)
    }

    pub async fn rpoplpush(
        &mut self,
        source: impl AsRef<[u8]>,
        dest: impl AsRef<[u8]>,
    ) -> Result<Option<Bytes>, Error> {
        let req = Request::cmd(b"RPOPLPUSH").arg(source.as_ref()).arg(dest.as_ref());
        binary_reply(self.exec(&req).await?)
    }

    pub async fn lmove(
        &mut self,
        source: impl AsRef<[u8]>,
        dest: impl AsRef<[u8]>,
        from: Direction,
        to: Direction,
    ) -> Result<Option<Bytes>, Error> {
        let req = Request::cmd(b"LMOVE")
            .arg(source.as_ref())
            .arg(dest.as_ref())
            .arg(from.token())
            .arg(to.token());
        binary_reply(self.exec(&req).await?)
    }

    /// Blocking left pop across `keys`. Returns `(key, element)`, or `None`
    /// on timeout. A timeout of 0 blocks indefinitely.
    pub async fn blpop<K: AsRef<[u8]>>(
        &mut self,
        keys: impl IntoIterator<Item = K>,
        timeout_secs: f64,
    ) -> Result<Option<(Bytes, Bytes)>, Error> {
        let req = blocking(b"BLPOP", keys, timeout_secs)?;
        pair_or_nil_reply(self.exec(&req).await?)
    }

    pub async fn brpop<K: AsRef<[u8]>>(
        &mut self,
        keys: impl IntoIterator<Item = K>,
        timeout_secs: f64,
    ) -> Result<Option<(Bytes, Bytes)>, Error> {
        let req = blocking(b"BRPOP", keys, timeout_secs)?;
        pair_or_nil_reply(self.exec(&req).await?)
    }

    pub async fn brpoplpush(
        &mut self,
        source: impl AsRef<[u8]>,
        dest: impl AsRef<[u8]>,
        timeout_secs: f64,
    ) -> Result<Option<Bytes>, Error> {
        let req = Request::cmd(b"BRPOPLPUSH")
            .arg(source.as_ref())
            .arg(dest.as_ref())
            .arg_float(timeout_secs);
        binary_reply(self.exec(&req).await?)
    }

    pub async fn blmove(
        &mut self,
        source: impl AsRef<[u8]>,
        dest: impl AsRef<[u8]>,
        from: Direction,
        to: Direction,
        timeout_secs: f64,
    ) -> Result<Option<Bytes>, Error> {
        let req = Request::cmd(b"BLMOVE")
            .arg(source.as_ref())
            .arg(dest.as_ref())
            .arg(from.token())
            .arg(to.token())
            .arg_float(timeout_secs);
        binary_reply(self.exec(&req).await?)
    }
}

#[cfg(test)]
mod tests {
    use resp_proto::Value;

    use super::*;
    use crate::commands::args_of;
    use crate::MockConnection;

    #[test]
    fn lpos_argument_order() {
        let opts = LposOptions {
            rank: Some(-1),
            maxlen: Some(50),
        };
        assert_eq!(
            args_of(&lpos(b"l", b"x", Some(2), &opts)),
            ["l", "x", "RANK", "-1", "COUNT", "2", "MAXLEN", "50"]
        );
    }

    #[tokio::test]
    async fn blpop_timeout_and_hit() {
        let conn = MockConnection::connected().with_replies(&[
            Value::Null,
            Value::array(vec![Value::bulk_string(b"q2"), Value::bulk_string(b"job")]),
        ]);
        let mut client = Client::new(conn);
        assert_eq!(client.blpop(["q1", "q2"], 0.5).await.unwrap(), None);
        assert_eq!(
            client.blpop(["q1", "q2"], 0.0).await.unwrap(),
            Some((Bytes::from_static(b"q2"), Bytes::from_static(b"job")))
        );
        let written = client.conn().written_commands();
        assert_eq!(written[0].last().unwrap(), b"0.5");
        assert_eq!(written[1].last().unwrap(), b"0");
    }

    #[tokio::test]
    async fn push_requires_elements() {
        let mut client = Client::new(MockConnection::connected());
        let none: [&str; 0] = [];
        assert!(matches!(
            client.rpush("l", none).await,
            Err(Error::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn pop_count_on_missing_list() {
        let conn = MockConnection::connected().with_reply(&Value::Null);
        let mut client = Client::new(conn);
        assert!(client.lpop_count("nope", 3).await.unwrap().is_empty());
    }
}
