use bytes::Bytes;
use resp_proto::{Request, Value};

use crate::client::Client;
use crate::connection::Connection;
use crate::reply::{
    FromValue, array_reply, binary_reply, bulk_reply, integer_or_nil_reply, integer_reply,
    ok_reply, pairs_reply, status_reply,
};
use crate::Error;

/// One `SLOWLOG GET` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlowLogEntry {
    pub id: i64,
    /// Unix time the command was logged, in seconds.
    pub timestamp: i64,
    pub duration_us: i64,
    pub args: Vec<Bytes>,
    /// Absent before Redis 4.0.
    pub client_addr: Option<String>,
    pub client_name: Option<String>,
}

impl FromValue for SlowLogEntry {
    fn from_value(value: Value) -> Result<Self, Error> {
        let Value::Array(fields) = value else {
            return Err(Error::UnexpectedResponse);
        };
        if fields.len() < 4 {
            return Err(Error::UnexpectedResponse);
        }
        let mut fields = fields.into_iter();
        let mut next = || fields.next().ok_or(Error::UnexpectedResponse);
        let id = i64::from_value(next()?)?;
        let timestamp = i64::from_value(next()?)?;
        let duration_us = i64::from_value(next()?)?;
        let args = array_reply(next()?)?;
        let client_addr = next().ok().map(String::from_value).transpose()?;
        let client_name = next().ok().map(String::from_value).transpose()?;
        Ok(SlowLogEntry {
            id,
            timestamp,
            duration_us,
            args,
            client_addr,
            client_name,
        })
    }
}

fn text_reply(value: Value) -> Result<String, Error> {
    bulk_reply(value)?.ok_or(Error::UnexpectedResponse)
}

impl<C: Connection> Client<C> {
    pub async fn ping(&mut self) -> Result<(), Error> {
        let reply = status_reply(self.exec(&Request::ping()).await?)?;
        if reply != "PONG" {
            return Err(Error::UnexpectedResponse);
        }
        Ok(())
    }

    pub async fn echo(&mut self, message: impl AsRef<[u8]>) -> Result<Bytes, Error> {
        let req = Request::cmd(b"ECHO").arg(message.as_ref());
        binary_reply(self.exec(&req).await?)?.ok_or(Error::UnexpectedResponse)
    }

    /// Send `AUTH password`. Nothing is retried or remembered.
    pub async fn auth(&mut self, password: impl AsRef<[u8]>) -> Result<(), Error> {
        ok_reply(self.exec(&Request::cmd(b"AUTH").arg(password.as_ref())).await?)
    }

    /// Send `AUTH username password` (ACL users).
    pub async fn auth_user(
        &mut self,
        username: impl AsRef<[u8]>,
        password: impl AsRef<[u8]>,
    ) -> Result<(), Error> {
        let req = Request::cmd(b"AUTH")
            .arg(username.as_ref())
            .arg(password.as_ref());
        ok_reply(self.exec(&req).await?)
    }

    pub async fn select(&mut self, db: u32) -> Result<(), Error> {
        ok_reply(self.exec(&Request::cmd(b"SELECT").arg_uint(db as u64)).await?)
    }

    pub async fn swapdb(&mut self, a: u32, b: u32) -> Result<(), Error> {
        let req = Request::cmd(b"SWAPDB").arg_uint(a as u64).arg_uint(b as u64);
        ok_reply(self.exec(&req).await?)
    }

    pub async fn dbsize(&mut self) -> Result<i64, Error> {
        integer_reply(self.exec(&Request::cmd(b"DBSIZE")).await?)
    }

    /// Remove every key in the selected database, in the background if `lazy`.
    pub async fn flushdb(&mut self, lazy: bool) -> Result<(), Error> {
        let req = Request::cmd(b"FLUSHDB").arg_flag(lazy, b"ASYNC");
        ok_reply(self.exec(&req).await?)
    }

    /// Remove every key in every database, in the background if `lazy`.
    pub async fn flushall(&mut self, lazy: bool) -> Result<(), Error> {
        let req = Request::cmd(b"FLUSHALL").arg_flag(lazy, b"ASYNC");
        ok_reply(self.exec(&req).await?)
    }

    /// `INFO [section]` as raw text.
    pub async fn info(&mut self, section: Option<&str>) -> Result<String, Error> {
        let mut req = Request::cmd(b"INFO");
        if let Some(section) = section {
            req = req.arg(section.as_bytes());
        }
        text_reply(self.exec(&req).await?)
    }

    /// Server clock as `(unix seconds, microseconds)`.
    pub async fn time(&mut self) -> Result<(u64, u64), Error> {
        let parts: Vec<u64> = array_reply(self.exec(&Request::cmd(b"TIME")).await?)?;
        match parts[..] {
            [secs, micros] => Ok((secs, micros)),
            _ => Err(Error::UnexpectedResponse),
        }
    }

    pub async fn lastsave(&mut self) -> Result<i64, Error> {
        integer_reply(self.exec(&Request::cmd(b"LASTSAVE")).await?)
    }

    pub async fn save(&mut self) -> Result<(), Error> {
        ok_reply(self.exec(&Request::cmd(b"SAVE")).await?)
    }

    /// Returns the server's status line, e.g. `Background saving started`.
    pub async fn bgsave(&mut self) -> Result<String, Error> {
        status_reply(self.exec(&Request::cmd(b"BGSAVE")).await?)
    }

    pub async fn bgrewriteaof(&mut self) -> Result<String, Error> {
        status_reply(self.exec(&Request::cmd(b"BGREWRITEAOF")).await?)
    }

    /// Parameters matching a glob, as name/value pairs.
    pub async fn config_get(
        &mut self,
        pattern: impl AsRef<[u8]>,
    ) -> Result<Vec<(String, String)>, Error> {
        let req = Request::cmd(b"CONFIG").arg(b"GET").arg(pattern.as_ref());
        pairs_reply(self.exec(&req).await?)
    }

    pub async fn config_set(
        &mut self,
        parameter: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
    ) -> Result<(), Error> {
        let req = Request::cmd(b"CONFIG")
            .arg(b"SET")
            .arg(parameter.as_ref())
            .arg(value.as_ref());
        ok_reply(self.exec(&req).await?)
    }

    pub async fn config_resetstat(&mut self) -> Result<(), Error> {
        ok_reply(self.exec(&Request::cmd(b"CONFIG").arg(b"RESETSTAT")).await?)
    }

    pub async fn config_rewrite(&mut self) -> Result<(), Error> {
        ok_reply(self.exec(&Request::cmd(b"CONFIG").arg(b"REWRITE")).await?)
    }

    pub async fn debug_object(&mut self, key: impl AsRef<[u8]>) -> Result<String, Error> {
        let req = Request::cmd(b"DEBUG").arg(b"OBJECT").arg(key.as_ref());
        status_reply(self.exec(&req).await?)
    }

    pub async fn slowlog_get(&mut self, count: Option<i64>) -> Result<Vec<SlowLogEntry>, Error> {
        let mut req = Request::cmd(b"SLOWLOG").arg(b"GET");
        if let Some(count) = count {
            req = req.arg_int(count);
        }
        array_reply(self.exec(&req).await?)
    }

    pub async fn slowlog_len(&mut self) -> Result<i64, Error> {
        integer_reply(self.exec(&Request::cmd(b"SLOWLOG").arg(b"LEN")).await?)
    }

    pub async fn slowlog_reset(&mut self) -> Result<(), Error> {
        ok_reply(self.exec(&Request::cmd(b"SLOWLOG").arg(b"RESET")).await?)
    }

    /// Bytes used by a key and its value, `None` if missing.
    pub async fn memory_usage(&mut self, key: impl AsRef<[u8]>) -> Result<Option<i64>, Error> {
        let req = Request::cmd(b"MEMORY").arg(b"USAGE").arg(key.as_ref());
        integer_or_nil_reply(self.exec(&req).await?)
    }

    /// `ROLE`: the role name (`master`, `slave`, `sentinel`) followed by the
    /// role-specific fields, unparsed.
    pub async fn role(&mut self) -> Result<(String, Vec<Value>), Error> {
        let mut fields: Vec<Value> = array_reply(self.exec(&Request::cmd(b"ROLE")).await?)?;
        if fields.is_empty() {
            return Err(Error::UnexpectedResponse);
        }
        let role = String::from_value(fields.remove(0))?;
        Ok((role, fields))
    }

    pub async fn command_count(&mut self) -> Result<i64, Error> {
        integer_reply(self.exec(&Request::cmd(b"COMMAND").arg(b"COUNT")).await?)
    }

    /// Block until `replicas` acknowledge prior writes or `timeout_ms` passes.
    /// Returns the number of replicas that acknowledged.
    pub async fn wait(&mut self, replicas: u64, timeout_ms: u64) -> Result<i64, Error> {
        let req = Request::cmd(b"WAIT").arg_uint(replicas).arg_uint(timeout_ms);
        integer_reply(self.exec(&req).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockConnection;

    fn bulk(s: &str) -> Value {
        Value::bulk_string(s.as_bytes())
    }

    #[tokio::test]
    async fn ping_echo_time() {
        let conn = MockConnection::connected().with_replies(&[
            Value::simple_string(b"PONG"),
            bulk("hi"),
            Value::array(vec![bulk("1700000000"), bulk("123456")]),
        ]);
        let mut client = Client::new(conn);
        client.ping().await.unwrap();
        assert_eq!(client.echo("hi").await.unwrap(), Bytes::from_static(b"hi"));
        assert_eq!(client.time().await.unwrap(), (1_700_000_000, 123_456));
    }

    #[tokio::test]
    async fn flushall_async() {
        let conn = MockConnection::connected().with_reply(&Value::simple_string(b"OK"));
        let mut client = Client::new(conn);
        client.flushall(true).await.unwrap();
        assert_eq!(
            client.conn().written_commands()[0],
            vec![b"FLUSHALL".to_vec(), b"ASYNC".to_vec()]
        );
    }

    #[tokio::test]
    async fn slowlog_entries_old_and_new() {
        let conn = MockConnection::connected().with_reply(&Value::array(vec![
            Value::array(vec![
                Value::integer(14),
                Value::integer(1309448221),
                Value::integer(15),
                Value::array(vec![bulk("ping")]),
                bulk("127.0.0.1:58217"),
                bulk("worker-1"),
            ]),
            Value::array(vec![
                Value::integer(13),
                Value::integer(1309448128),
                Value::integer(30),
                Value::array(vec![bulk("slowlog"), bulk("get")]),
            ]),
        ]));
        let mut client = Client::new(conn);
        let entries = client.slowlog_get(Some(2)).await.unwrap();
        assert_eq!(entries[0].client_name.as_deref(), Some("worker-1"));
        assert_eq!(entries[1].args.len(), 2);
        assert_eq!(entries[1].client_addr, None);
    }

    #[tokio::test]
    async fn config_get_pairs_and_role() {
        let conn = MockConnection::connected().with_replies(&[
            Value::array(vec![bulk("maxmemory"), bulk("0")]),
            Value::array(vec![bulk("master"), Value::integer(3129659), Value::array(vec![])]),
        ]);
        let mut client = Client::new(conn);
        assert_eq!(
            client.config_get("maxmemory").await.unwrap(),
            vec![("maxmemory".to_string(), "0".to_string())]
        );
        let (role, rest) = client.role().await.unwrap();
        assert_eq!(role, "master");
        assert_eq!(rest.len(), 2);
    }
}
