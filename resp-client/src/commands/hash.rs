use bytes::Bytes;
use resp_proto::Request;

use super::{ScanOptions, invalid};
use crate::client::Client;
use crate::connection::Connection;
use crate::reply::{
    array_reply, binary_reply, bool_reply, float_reply, integer_reply, pairs_reply, scan_reply,
};
use crate::Error;

/// `HSET key f1 v1 [f2 v2 ...]`. At least one pair is required.
pub fn hset<'a, F, V>(
    key: &'a [u8],
    pairs: impl IntoIterator<Item = (F, V)>,
) -> Result<Request<'a>, Error>
where
    F: AsRef<[u8]>,
    V: AsRef<[u8]>,
{
    let mut req = Request::cmd(b"HSET").arg(key);
    for (f, v) in pairs {
        req = req.arg_owned(f.as_ref()).arg_owned(v.as_ref());
    }
    if req.len() == 2 {
        return Err(invalid("HSET requires at least one field/value pair"));
    }
    Ok(req)
}

impl<C: Connection> Client<C> {
    /// Set hash fields. Returns the number of fields added.
    pub async fn hset<F, V>(
        &mut self,
        key: impl AsRef<[u8]>,
        pairs: impl IntoIterator<Item = (F, V)>,
    ) -> Result<i64, Error>
    where
        F: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let req = hset(key.as_ref(), pairs)?;
        integer_reply(self.exec(&req).await?)
    }

    pub async fn hsetnx(
        &mut self,
        key: impl AsRef<[u8]>,
        field: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
    ) -> Result<bool, Error> {
        let req = Request::cmd(b"HSETNX")
            .arg(key.as_ref())
            .arg(field.as_ref())
            .arg(value.as_ref());
        bool_reply(self.exec(&req).await?)
    }

    pub async fn hget(
        &mut self,
        key: impl AsRef<[u8]>,
        field: impl AsRef<[u8]>,
    ) -> Result<Option<Bytes>, Error> {
        let req = Request::cmd(b"HGET").arg(key.as_ref()).arg(field.as_ref());
        binary_reply(self.exec(&req).await?)
    }

    pub async fn hmget<F: AsRef<[u8]>>(
        &mut self,
        key: impl AsRef<[u8]>,
        fields: impl IntoIterator<Item = F>,
    ) -> Result<Vec<Option<Bytes>>, Error> {
        let req = Request::cmd(b"HMGET").arg(key.as_ref()).args(fields);
        if req.len() == 2 {
            return Err(invalid("HMGET requires at least one field"));
        }
        array_reply(self.exec(&req).await?)
    }

    /// All fields and values, in server order.
    pub async fn hgetall(&mut self, key: impl AsRef<[u8]>) -> Result<Vec<(Bytes, Bytes)>, Error> {
        pairs_reply(self.exec(&Request::cmd(b"HGETALL").arg(key.as_ref())).await?)
    }

    pub async fn hdel<F: AsRef<[u8]>>(
        &mut self,
        key: impl AsRef<[u8]>,
        fields: impl IntoIterator<Item = F>,
    ) -> Result<i64, Error> {
        let req = Request::cmd(b"HDEL").arg(key.as_ref()).args(fields);
        if req.len() == 2 {
            return Err(invalid("HDEL requires at least one field"));
        }
        integer_reply(self.exec(&req).await?)
    }

    pub async fn hexists(
        &mut self,
        key: impl AsRef<[u8]>,
        field: impl AsRef<[u8]>,
    ) -> Result<bool, Error> {
        let req = Request::cmd(b"HEXISTS").arg(key.as_ref()).arg(field.as_ref());
        bool_reply(self.exec(&req).await?)
    }

    pub async fn hlen(&mut self, key: impl AsRef<[u8]>) -> Result<i64, Error> {
        integer_reply(self.exec(&Request::cmd(b"HLEN").arg(key.as_ref())).await?)
    }

    pub async fn hkeys(&mut self, key: impl AsRef<[u8]>) -> Result<Vec<Bytes>, Error> {
        array_reply(self.exec(&Request::cmd(b"HKEYS").arg(key.as_ref())).await?)
    }

    pub async fn hvals(&mut self, key: impl AsRef<[u8]>) -> Result<Vec<Bytes>, Error> {
        array_reply(self.exec(&Request::cmd(b"HVALS").arg(key.as_ref())).await?)
    }

    pub async fn hincrby(
        &mut self,
        key: impl AsRef<[u8]>,
        field: impl AsRef<[u8]>,
        delta: i64,
    ) -> Result<i64, Error> {
        let req = Request::cmd(b"HINCRBY")
            .arg(key.as_ref())
            .arg(field.as_ref())
            .arg_int(delta);
        integer_reply(self.exec(&req).await?)
    }

    pub async fn hincrbyfloat(
        &mut self,
        key: impl AsRef<[u8]>,
        field: impl AsRef<[u8]>,
        delta: f64,
    ) -> Result<f64, Error> {
        let req = Request::cmd(b"HINCRBYFLOAT")
            .arg(key.as_ref())
            .arg(field.as_ref())
            .arg_float(delta);
        float_reply(self.exec(&req).await?)
    }

    pub async fn hstrlen(
        &mut self,
        key: impl AsRef<[u8]>,
        field: impl AsRef<[u8]>,
    ) -> Result<i64, Error> {
        let req = Request::cmd(b"HSTRLEN").arg(key.as_ref()).arg(field.as_ref());
        integer_reply(self.exec(&req).await?)
    }

    /// One `HSCAN` page of field/value pairs.
    pub async fn hscan(
        &mut self,
        key: impl AsRef<[u8]>,
        cursor: u64,
        options: &ScanOptions,
    ) -> Result<(u64, Vec<(Bytes, Bytes)>), Error> {
        let req = options.push(Request::cmd(b"HSCAN").arg(key.as_ref()).arg_uint(cursor));
        let (cursor, flat) = scan_reply::<Bytes>(self.exec(&req).await?)?;
        Ok((cursor, into_pairs(flat)?))
    }
}

/// Pair up a flat `[a1, b1, a2, b2, ...]` list.
pub(crate) fn into_pairs<T>(flat: Vec<T>) -> Result<Vec<(T, T)>, Error> {
    if flat.len() % 2 != 0 {
        return Err(Error::UnexpectedResponse);
    }
    let mut pairs = Vec::with_capacity(flat.len() / 2);
    let mut iter = flat.into_iter();
    while let (Some(a), Some(b)) = (iter.next(), iter.next()) {
        pairs.push((a, b));
    }
    Ok(pairs)
}
