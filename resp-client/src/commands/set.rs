use bytes::Bytes;
use resp_proto::Request;

use super::{ScanOptions, invalid};
use crate::client::Client;
use crate::connection::Connection;
use crate::reply::{array_or_nil_reply, array_reply, binary_reply, bool_reply, integer_reply, scan_reply};
use crate::Error;

fn members_request<M: AsRef<[u8]>>(
    name: &'static [u8],
    key: &[u8],
    members: impl IntoIterator<Item = M>,
) -> Result<Request<'static>, Error> {
    let req = Request::cmd(name).arg_owned(key).args(members);
    if req.len() == 2 {
        return Err(invalid(format!(
            "{} requires at least one member",
            String::from_utf8_lossy(name)
        )));
    }
    Ok(req)
}

fn keys_request<K: AsRef<[u8]>>(
    name: &'static [u8],
    dest: Option<&[u8]>,
    keys: impl IntoIterator<Item = K>,
) -> Result<Request<'static>, Error> {
    let mut req = Request::cmd(name);
    if let Some(dest) = dest {
        req = req.arg_owned(dest);
    }
    let before = req.len();
    let req = req.args(keys);
    if req.len() == before {
        return Err(invalid(format!(
            "{} requires at least one key",
            String::from_utf8_lossy(name)
        )));
    }
    Ok(req)
}

impl<C: Connection> Client<C> {
    /// Add members. Returns how many were new.
    pub async fn sadd<M: AsRef<[u8]>>(
        &mut self,
        key: impl AsRef<[u8]>,
        members: impl IntoIterator<Item = M>,
    ) -> Result<i64, Error> {
        let req = members_request(b"SADD", key.as_ref(), members)?;
        integer_reply(self.exec(&req).await?)
    }

    pub async fn srem<M: AsRef<[u8]>>(
        &mut self,
        key: impl AsRef<[u8]>,
        members: impl IntoIterator<Item = M>,
    ) -> Result<i64, Error> {
        let req = members_request(b"SREM", key.as_ref(), members)?;
        integer_reply(self.exec(&req).await?)
    }

    pub async fn smembers(&mut self, key: impl AsRef<[u8]>) -> Result<Vec<Bytes>, Error> {
        array_reply(self.exec(&Request::cmd(b"SMEMBERS").arg(key.as_ref())).await?)
    }

    pub async fn scard(&mut self, key: impl AsRef<[u8]>) -> Result<i64, Error> {
        integer_reply(self.exec(&Request::cmd(b"SCARD").arg(key.as_ref())).await?)
    }

    pub async fn sismember(
        &mut self,
        key: impl AsRef<[u8]>,
        member: impl AsRef<[u8]>,
    ) -> Result<bool, Error> {
        let req = Request::cmd(b"SISMEMBER").arg(key.as_ref()).arg(member.as_ref());
        bool_reply(self.exec(&req).await?)
    }

    /// Membership of each member, in argument order.
    pub async fn smismember<M: AsRef<[u8]>>(
        &mut self,
        key: impl AsRef<[u8]>,
        members: impl IntoIterator<Item = M>,
    ) -> Result<Vec<bool>, Error> {
        let req = members_request(b"SMISMEMBER", key.as_ref(), members)?;
        array_reply(self.exec(&req).await?)
    }

    pub async fn spop(&mut self, key: impl AsRef<[u8]>) -> Result<Option<Bytes>, Error> {
        binary_reply(self.exec(&Request::cmd(b"SPOP").arg(key.as_ref())).await?)
    }

    pub async fn spop_count(
        &mut self,
        key: impl AsRef<[u8]>,
        count: u64,
    ) -> Result<Vec<Bytes>, Error> {
        let req = Request::cmd(b"SPOP").arg(key.as_ref()).arg_uint(count);
        array_or_nil_reply(self.exec(&req).await?)
    }

    pub async fn srandmember(&mut self, key: impl AsRef<[u8]>) -> Result<Option<Bytes>, Error> {
        binary_reply(self.exec(&Request::cmd(b"SRANDMEMBER").arg(key.as_ref())).await?)
    }

    /// Random members: distinct when `count` is positive, possibly repeated
    /// when negative.
    pub async fn srandmember_count(
        &mut self,
        key: impl AsRef<[u8]>,
        count: i64,
    ) -> Result<Vec<Bytes>, Error> {
        let req = Request::cmd(b"SRANDMEMBER").arg(key.as_ref()).arg_int(count);
        array_or_nil_reply(self.exec(&req).await?)
    }

    pub async fn smove(
        &mut self,
        source: impl AsRef<[u8]>,
        dest: impl AsRef<[u8]>,
        member: impl AsRef<[u8]>,
    ) -> Result<bool, Error> {
        let req = Request::cmd(b"SMOVE")
            .arg(source.as_ref())
            .arg(dest.as_ref())
            .arg(member.as_ref());
        bool_reply(self.exec(&req).await?)
    }

    pub async fn sinter<K: AsRef<[u8]>>(
        &mut self,
        keys: impl IntoIterator<Item = K>,
    ) -> Result<Vec<Bytes>, Error> {
        let req = keys_request(b"SINTER", None, keys)?;
        array_reply(self.exec(&req).await?)
    }

    pub async fn sinterstore<K: AsRef<[u8]>>(
        &mut self,
        dest: impl AsRef<[u8]>,
        keys: impl IntoIterator<Item = K>,
    ) -> Result<i64, Error> {
        let req = keys_request(b"SINTERSTORE", Some(dest.as_ref()), keys)?;
        integer_reply(self.exec(&req).await?)
    }

    pub async fn sunion<K: AsRef<[u8]>>(
        &mut self,
        keys: impl IntoIterator<Item = K>,
    ) -> Result<Vec<Bytes>, Error> {
        let req = keys_request(b"SUNION", None, keys)?;
        array_reply(self.exec(&req).await?)
    }

    pub async fn sunionstore<K: AsRef<[u8]>>(
        &mut self,
        dest: impl AsRef<[u8]>,
        keys: impl IntoIterator<Item = K>,
    ) -> Result<i64, Error> {
        let req = keys_request(b"SUNIONSTORE", Some(dest.as_ref()), keys)?;
        integer_reply(self.exec(&req).await?)
    }

    /// Members of the first set absent from all the others.
    pub async fn sdiff<K: AsRef<[u8]>>(
        &mut self,
        keys: impl IntoIterator<Item = K>,
    ) -> Result<Vec<Bytes>, Error> {
        let req = keys_request(b"SDIFF", None, keys)?;
        array_reply(self.exec(&req).await?)
    }

    pub async fn sdiffstore<K: AsRef<[u8]>>(
        &mut self,
        dest: impl AsRef<[u8]>,
        keys: impl IntoIterator<Item = K>,
    ) -> Result<i64, Error> {
        let req = keys_request(b"SDIFFSTORE", Some(dest.as_ref()), keys)?;
        integer_reply(self.exec(&req).await?)
    }

    pub async fn sscan(
        &mut self,
        key: impl AsRef<[u8]>,
        cursor: u64,
        options: &ScanOptions,
    ) -> Result<(u64, Vec<Bytes>), Error> {
        let req = options.push(Request::cmd(b"SSCAN").arg(key.as_ref()).arg_uint(cursor));
        scan_reply(self.exec(&req).await?)
    }
}
