//! Cluster introspection forwarded to the connected node. Slot routing and
//! redirection handling are left to the caller.

use bytes::Bytes;
use resp_proto::Request;

use crate::client::Client;
use crate::connection::Connection;
use crate::reply::{array_reply, bulk_reply, integer_reply, ok_reply};
use crate::Error;

impl<C: Connection> Client<C> {
    /// `CLUSTER INFO` as raw `field:value` lines.
    pub async fn cluster_info(&mut self) -> Result<String, Error> {
        let req = Request::cmd(b"CLUSTER").arg(b"INFO");
        bulk_reply(self.exec(&req).await?)?.ok_or(Error::UnexpectedResponse)
    }

    /// `CLUSTER NODES` as raw text, one node per line.
    pub async fn cluster_nodes(&mut self) -> Result<String, Error> {
        let req = Request::cmd(b"CLUSTER").arg(b"NODES");
        bulk_reply(self.exec(&req).await?)?.ok_or(Error::UnexpectedResponse)
    }

    pub async fn cluster_myid(&mut self) -> Result<String, Error> {
        let req = Request::cmd(b"CLUSTER").arg(b"MYID");
        bulk_reply(self.exec(&req).await?)?.ok_or(Error::UnexpectedResponse)
    }

    /// Hash slot of a key, as computed by the server.
    pub async fn cluster_keyslot(&mut self, key: impl AsRef<[u8]>) -> Result<i64, Error> {
        let req = Request::cmd(b"CLUSTER").arg(b"KEYSLOT").arg(key.as_ref());
        integer_reply(self.exec(&req).await?)
    }

    pub async fn cluster_countkeysinslot(&mut self, slot: u16) -> Result<i64, Error> {
        let req = Request::cmd(b"CLUSTER")
            .arg(b"COUNTKEYSINSLOT")
            .arg_uint(slot as u64);
        integer_reply(self.exec(&req).await?)
    }

    pub async fn cluster_getkeysinslot(&mut self, slot: u16, count: u64) -> Result<Vec<Bytes>, Error> {
        let req = Request::cmd(b"CLUSTER")
            .arg(b"GETKEYSINSLOT")
            .arg_uint(slot as u64)
            .arg_uint(count);
        array_reply(self.exec(&req).await?)
    }

    /// Allow reads from this replica connection.
    pub async fn readonly(&mut self) -> Result<(), Error> {
        ok_reply(self.exec(&Request::cmd(b"READONLY")).await?)
    }

    pub async fn readwrite(&mut self) -> Result<(), Error> {
        ok_reply(self.exec(&Request::cmd(b"READWRITE")).await?)
    }

    /// Flag the next command as following an `ASK` redirection.
    pub async fn asking(&mut self) -> Result<(), Error> {
        ok_reply(self.exec(&Request::cmd(b"ASKING")).await?)
    }
}

#[cfg(test)]
mod tests {
    use resp_proto::Value;

    use super::*;
    use crate::MockConnection;

    #[tokio::test]
    async fn keyslot_and_info() {
        let conn = MockConnection::connected().with_replies(&[
            Value::integer(12182),
            Value::bulk_string(b"cluster_state:ok\r\ncluster_slots_assigned:16384\r\n"),
        ]);
        let mut client = Client::new(conn);
        assert_eq!(client.cluster_keyslot("foo").await.unwrap(), 12182);
        assert!(client.cluster_info().await.unwrap().starts_with("cluster_state:ok"));
    }

    #[tokio::test]
    async fn moved_is_a_plain_redis_error() {
        let conn = MockConnection::connected().with_reply(&Value::error(b"MOVED 3999 127.0.0.1:6381"));
        let mut client = Client::new(conn);
        match client.cluster_countkeysinslot(3999).await {
            Err(Error::Redis { message, .. }) => assert!(message.starts_with("MOVED")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
