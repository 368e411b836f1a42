use resp_proto::Request;

use super::invalid;
use crate::client::Client;
use crate::connection::Connection;
use crate::reply::{bool_reply, integer_reply, ok_reply};
use crate::Error;

/// `BITOP` operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOp {
    And,
    Or,
    Xor,
    Not,
}

/// `BITOP op dest key [key ...]`. `NOT` takes exactly one source key.
pub fn bitop<'a, K: AsRef<[u8]>>(
    op: BitOp,
    dest: &'a [u8],
    keys: impl IntoIterator<Item = K>,
) -> Result<Request<'a>, Error> {
    let token: &'static [u8] = match op {
        BitOp::And => b"AND",
        BitOp::Or => b"OR",
        BitOp::Xor => b"XOR",
        BitOp::Not => b"NOT",
    };
    let req = Request::cmd(b"BITOP").arg(token).arg(dest).args(keys);
    match (op, req.len() - 3) {
        (_, 0) => Err(invalid("BITOP requires at least one source key")),
        (BitOp::Not, n) if n > 1 => Err(invalid("BITOP NOT takes a single source key")),
        _ => Ok(req),
    }
}

impl<C: Connection> Client<C> {
    /// Set or clear a bit. Returns the previous bit.
    pub async fn setbit(
        &mut self,
        key: impl AsRef<[u8]>,
        offset: u64,
        value: bool,
    ) -> Result<bool, Error> {
        let req = Request::cmd(b"SETBIT")
            .arg(key.as_ref())
            .arg_uint(offset)
            .arg(if value { b"1" } else { b"0" });
        bool_reply(self.exec(&req).await?)
    }

    pub async fn getbit(&mut self, key: impl AsRef<[u8]>, offset: u64) -> Result<bool, Error> {
        let req = Request::cmd(b"GETBIT").arg(key.as_ref()).arg_uint(offset);
        bool_reply(self.exec(&req).await?)
    }

    /// Count set bits, optionally within an inclusive byte range.
    pub async fn bitcount(
        &mut self,
        key: impl AsRef<[u8]>,
        range: Option<(i64, i64)>,
    ) -> Result<i64, Error> {
        let mut req = Request::cmd(b"BITCOUNT").arg(key.as_ref());
        if let Some((start, end)) = range {
            req = req.arg_int(start).arg_int(end);
        }
        integer_reply(self.exec(&req).await?)
    }

    /// Returns the size of the destination string.
    pub async fn bitop<K: AsRef<[u8]>>(
        &mut self,
        op: BitOp,
        dest: impl AsRef<[u8]>,
        keys: impl IntoIterator<Item = K>,
    ) -> Result<i64, Error> {
        let req = bitop(op, dest.as_ref(), keys)?;
        integer_reply(self.exec(&req).await?)
    }

    /// Position of the first `bit`, optionally within a byte range. -1 if none.
    pub async fn bitpos(
        &mut self,
        key: impl AsRef<[u8]>,
        bit: bool,
        start: Option<i64>,
        end: Option<i64>,
    ) -> Result<i64, Error> {
        if end.is_some() && start.is_none() {
            return Err(invalid("BITPOS end requires a start"));
        }
        let mut req = Request::cmd(b"BITPOS")
            .arg(key.as_ref())
            .arg(if bit { b"1" } else { b"0" });
        if let Some(start) = start {
            req = req.arg_int(start);
        }
        if let Some(end) = end {
            req = req.arg_int(end);
        }
        integer_reply(self.exec(&req).await?)
    }

    // ── HyperLogLog ─────────────────────────────────────────────────────

    /// Returns true if the estimate changed.
    pub async fn pfadd<E: AsRef<[u8]>>(
        &mut self,
        key: impl AsRef<[u8]>,
        elements: impl IntoIterator<Item = E>,
    ) -> Result<bool, Error> {
        let req = Request::cmd(b"PFADD").arg(key.as_ref()).args(elements);
        bool_reply(self.exec(&req).await?)
    }

    /// Approximate cardinality of the union of `keys`.
    pub async fn pfcount<K: AsRef<[u8]>>(
        &mut self,
        keys: impl IntoIterator<Item = K>,
    ) -> Result<i64, Error> {
        let req = Request::cmd(b"PFCOUNT").args(keys);
        if req.len() == 1 {
            return Err(invalid("PFCOUNT requires at least one key"));
        }
        integer_reply(self.exec(&req).await?)
    }

    pub async fn pfmerge<K: AsRef<[u8]>>(
        &mut self,
        dest: impl AsRef<[u8]>,
        sources: impl IntoIterator<Item = K>,
    ) -> Result<(), Error> {
        let req = Request::cmd(b"PFMERGE").arg(dest.as_ref()).args(sources);
        ok_reply(self.exec(&req).await?)
    }
}

#[cfg(test)]
mod tests {
    use resp_proto::Value;

    use super::*;
    use crate::commands::args_of;
    use crate::MockConnection;

    #[test]
    fn bitop_arity() {
        let req = bitop(BitOp::Xor, b"d", ["a", "b"]).unwrap();
        assert_eq!(args_of(&req), ["XOR", "d", "a", "b"]);
        assert!(bitop(BitOp::Not, b"d", ["a", "b"]).is_err());
        let none: [&str; 0] = [];
        assert!(bitop(BitOp::And, b"d", none).is_err());
    }

    #[tokio::test]
    async fn bits_and_hll() {
        let conn = MockConnection::connected().with_replies(&[
            Value::integer(0),
            Value::integer(1),
            Value::integer(3),
        ]);
        let mut client = Client::new(conn);
        assert!(!client.setbit("b", 7, true).await.unwrap());
        assert!(client.pfadd("h", ["x", "y"]).await.unwrap());
        assert_eq!(client.pfcount(["h"]).await.unwrap(), 3);
        assert_eq!(client.conn().written_commands()[0][3], b"1");
    }
}
