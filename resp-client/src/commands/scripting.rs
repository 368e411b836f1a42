use resp_proto::{Request, Value};

use crate::client::Client;
use crate::connection::Connection;
use crate::reply::{array_reply, bulk_reply, ok_reply};
use crate::Error;

fn script_call<'a, K, A>(
    name: &'static [u8],
    body: &'a [u8],
    keys: &[K],
    args: &[A],
) -> Request<'a>
where
    K: AsRef<[u8]>,
    A: AsRef<[u8]>,
{
    Request::cmd(name)
        .arg(body)
        .arg_uint(keys.len() as u64)
        .args(keys)
        .args(args)
}

impl<C: Connection> Client<C> {
    /// Run a Lua script. The reply is returned as-is.
    pub async fn eval<K: AsRef<[u8]>, A: AsRef<[u8]>>(
        &mut self,
        script: impl AsRef<[u8]>,
        keys: &[K],
        args: &[A],
    ) -> Result<Value, Error> {
        let req = script_call(b"EVAL", script.as_ref(), keys, args);
        self.exec(&req).await
    }

    /// Run a cached script by SHA1 digest.
    pub async fn evalsha<K: AsRef<[u8]>, A: AsRef<[u8]>>(
        &mut self,
        sha1: impl AsRef<[u8]>,
        keys: &[K],
        args: &[A],
    ) -> Result<Value, Error> {
        let req = script_call(b"EVALSHA", sha1.as_ref(), keys, args);
        self.exec(&req).await
    }

    /// Cache a script. Returns its SHA1 digest.
    pub async fn script_load(&mut self, script: impl AsRef<[u8]>) -> Result<String, Error> {
        let req = Request::cmd(b"SCRIPT").arg(b"LOAD").arg(script.as_ref());
        bulk_reply(self.exec(&req).await?)?.ok_or(Error::UnexpectedResponse)
    }

    pub async fn script_exists<S: AsRef<[u8]>>(
        &mut self,
        sha1s: impl IntoIterator<Item = S>,
    ) -> Result<Vec<bool>, Error> {
        let req = Request::cmd(b"SCRIPT").arg(b"EXISTS").args(sha1s);
        array_reply(self.exec(&req).await?)
    }

    pub async fn script_flush(&mut self) -> Result<(), Error> {
        ok_reply(self.exec(&Request::cmd(b"SCRIPT").arg(b"FLUSH")).await?)
    }

    /// Kill the running read-only script.
    pub async fn script_kill(&mut self) -> Result<(), Error> {
        ok_reply(self.exec(&Request::cmd(b"SCRIPT").arg(b"KILL")).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockConnection;

    #[tokio::test]
    async fn eval_sends_numkeys() {
        let conn = MockConnection::connected().with_reply(&Value::integer(2));
        let mut client = Client::new(conn);
        let reply = client
            .eval("return #KEYS + #ARGV", &["a"], &["x"])
            .await
            .unwrap();
        assert_eq!(reply, Value::integer(2));
        assert_eq!(
            client.conn().written_commands()[0][1..],
            [
                b"return #KEYS + #ARGV".to_vec(),
                b"1".to_vec(),
                b"a".to_vec(),
                b"x".to_vec()
            ]
        );
    }

    #[tokio::test]
    async fn script_errors_surface_as_redis_errors() {
        let conn = MockConnection::connected()
            .with_reply(&Value::error(b"NOSCRIPT No matching script"));
        let mut client = Client::new(conn);
        let none: [&str; 0] = [];
        let err = client.evalsha("abc", &none, &none).await.unwrap_err();
        assert!(matches!(err, Error::Redis { ref command, .. } if command == "EVALSHA"));
    }

    #[tokio::test]
    async fn script_load_and_exists() {
        let conn = MockConnection::connected().with_replies(&[
            Value::bulk_string(b"e0e1f9fabfc9d4800c877a703b823ac0578ff8db"),
            Value::array(vec![Value::integer(1), Value::integer(0)]),
        ]);
        let mut client = Client::new(conn);
        let sha = client.script_load("return 1").await.unwrap();
        assert_eq!(sha.len(), 40);
        assert_eq!(
            client.script_exists([sha.as_str(), "0000"]).await.unwrap(),
            vec![true, false]
        );
    }
}
