use resp_proto::Request;

use super::invalid;
use crate::client::Client;
use crate::connection::Connection;
use crate::reply::{bool_reply, bulk_reply, integer_reply, ok_reply};
use crate::Error;

/// Connection class for `CLIENT LIST TYPE` / `CLIENT KILL TYPE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientType {
    Normal,
    Master,
    Replica,
    Pubsub,
}

impl ClientType {
    fn token(self) -> &'static [u8] {
        match self {
            ClientType::Normal => b"normal",
            ClientType::Master => b"master",
            ClientType::Replica => b"replica",
            ClientType::Pubsub => b"pubsub",
        }
    }
}

/// Filters for `CLIENT LIST`. `TYPE` and `ID` cannot be combined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientListOptions {
    pub client_type: Option<ClientType>,
    pub ids: Vec<u64>,
}

/// Filters for `CLIENT KILL`. At least one of `id`, `client_type`, `user`,
/// `addr` or `laddr` is required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientKillOptions {
    pub id: Option<u64>,
    pub client_type: Option<ClientType>,
    pub user: Option<String>,
    pub addr: Option<String>,
    pub laddr: Option<String>,
    pub skipme: Option<bool>,
}

/// `CLIENT PAUSE` mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseMode {
    All,
    Write,
}

/// Options for `CLIENT TRACKING`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackingOptions {
    pub redirect: Option<u64>,
    pub prefixes: Vec<String>,
    pub bcast: bool,
    pub optin: bool,
    pub optout: bool,
    pub noloop: bool,
}

/// `CLIENT LIST [TYPE t | ID id ...]`.
pub fn client_list(options: &ClientListOptions) -> Result<Request<'static>, Error> {
    let mut req = Request::cmd(b"CLIENT").arg(b"LIST");
    match (options.client_type, options.ids.is_empty()) {
        (Some(_), false) => return Err(invalid("CLIENT LIST accepts TYPE or ID, not both")),
        (Some(t), true) => req = req.arg(b"TYPE").arg(t.token()),
        (None, false) => {
            req = req.arg(b"ID");
            for id in &options.ids {
                req = req.arg_uint(*id);
            }
        }
        (None, true) => {}
    }
    Ok(req)
}

/// `CLIENT KILL <filter> <value> ...`.
pub fn client_kill(options: &ClientKillOptions) -> Result<Request<'_>, Error> {
    let mut req = Request::cmd(b"CLIENT").arg(b"KILL");
    if let Some(id) = options.id {
        req = req.arg(b"ID").arg_uint(id);
    }
    if let Some(t) = options.client_type {
        req = req.arg(b"TYPE").arg(t.token());
    }
    if let Some(ref user) = options.user {
        req = req.arg(b"USER").arg(user.as_bytes());
    }
    if let Some(ref addr) = options.addr {
        req = req.arg(b"ADDR").arg(addr.as_bytes());
    }
    if let Some(ref laddr) = options.laddr {
        req = req.arg(b"LADDR").arg(laddr.as_bytes());
    }
    if req.len() == 2 {
        return Err(invalid("CLIENT KILL requires at least one filter"));
    }
    if let Some(skipme) = options.skipme {
        req = req
            .arg(b"SKIPME")
            .arg(if skipme { &b"yes"[..] } else { &b"no"[..] });
    }
    Ok(req)
}

/// `CLIENT TRACKING ON|OFF [REDIRECT id] [PREFIX p ...] [BCAST] [OPTIN] [OPTOUT] [NOLOOP]`.
pub fn client_tracking(on: bool, options: &TrackingOptions) -> Result<Request<'_>, Error> {
    if options.optin && options.optout {
        return Err(invalid("CLIENT TRACKING accepts OPTIN or OPTOUT, not both"));
    }
    if !options.prefixes.is_empty() && !options.bcast {
        return Err(invalid("CLIENT TRACKING PREFIX requires BCAST"));
    }
    let mut req = Request::cmd(b"CLIENT")
        .arg(b"TRACKING")
        .arg(if on { &b"ON"[..] } else { &b"OFF"[..] });
    if let Some(id) = options.redirect {
        req = req.arg(b"REDIRECT").arg_uint(id);
    }
    for prefix in &options.prefixes {
        req = req.arg(b"PREFIX").arg(prefix.as_bytes());
    }
    Ok(req
        .arg_flag(options.bcast, b"BCAST")
        .arg_flag(options.optin, b"OPTIN")
        .arg_flag(options.optout, b"OPTOUT")
        .arg_flag(options.noloop, b"NOLOOP"))
}

impl<C: Connection> Client<C> {
    pub async fn client_id(&mut self) -> Result<i64, Error> {
        integer_reply(self.exec(&Request::cmd(b"CLIENT").arg(b"ID")).await?)
    }

    pub async fn client_getname(&mut self) -> Result<Option<String>, Error> {
        bulk_reply(self.exec(&Request::cmd(b"CLIENT").arg(b"GETNAME")).await?)
    }

    pub async fn client_setname(&mut self, name: impl AsRef<[u8]>) -> Result<(), Error> {
        let req = Request::cmd(b"CLIENT").arg(b"SETNAME").arg(name.as_ref());
        ok_reply(self.exec(&req).await?)
    }

    /// Connected clients, one line per client, as raw text.
    pub async fn client_list(&mut self, options: &ClientListOptions) -> Result<String, Error> {
        let req = client_list(options)?;
        bulk_reply(self.exec(&req).await?)?.ok_or(Error::UnexpectedResponse)
    }

    /// Returns the number of clients killed.
    pub async fn client_kill(&mut self, options: &ClientKillOptions) -> Result<i64, Error> {
        let req = client_kill(options)?;
        integer_reply(self.exec(&req).await?)
    }

    pub async fn client_pause(&mut self, timeout_ms: u64, mode: Option<PauseMode>) -> Result<(), Error> {
        let mut req = Request::cmd(b"CLIENT").arg(b"PAUSE").arg_uint(timeout_ms);
        match mode {
            Some(PauseMode::All) => req = req.arg(b"ALL"),
            Some(PauseMode::Write) => req = req.arg(b"WRITE"),
            None => {}
        }
        ok_reply(self.exec(&req).await?)
    }

    pub async fn client_unpause(&mut self) -> Result<(), Error> {
        ok_reply(self.exec(&Request::cmd(b"CLIENT").arg(b"UNPAUSE")).await?)
    }

    /// This connection's `CLIENT LIST` line.
    pub async fn client_info(&mut self) -> Result<String, Error> {
        bulk_reply(self.exec(&Request::cmd(b"CLIENT").arg(b"INFO")).await?)?
            .ok_or(Error::UnexpectedResponse)
    }

    /// Id receiving this connection's tracking invalidations, 0 or -1 if none.
    pub async fn client_getredir(&mut self) -> Result<i64, Error> {
        integer_reply(self.exec(&Request::cmd(b"CLIENT").arg(b"GETREDIR")).await?)
    }

    /// Unblock a client stuck in a blocking command, as a timeout or, with
    /// `error`, as an error. Returns whether a client was unblocked.
    pub async fn client_unblock(&mut self, id: u64, error: bool) -> Result<bool, Error> {
        let req = Request::cmd(b"CLIENT")
            .arg(b"UNBLOCK")
            .arg_uint(id)
            .arg(if error { &b"ERROR"[..] } else { &b"TIMEOUT"[..] });
        bool_reply(self.exec(&req).await?)
    }

    pub async fn client_tracking(&mut self, on: bool, options: &TrackingOptions) -> Result<(), Error> {
        let req = client_tracking(on, options)?;
        ok_reply(self.exec(&req).await?)
    }

    /// `CLIENT CACHING YES|NO` for the next command under OPTIN/OPTOUT tracking.
    pub async fn client_caching(&mut self, yes: bool) -> Result<(), Error> {
        let req = Request::cmd(b"CLIENT")
            .arg(b"CACHING")
            .arg(if yes { &b"YES"[..] } else { &b"NO"[..] });
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
    fn client_list_filters() {
        let both = ClientListOptions {
            client_type: Some(ClientType::Normal),
            ids: vec![1],
        };
        assert!(matches!(client_list(&both), Err(Error::InvalidArgument(_))));

        let ids = ClientListOptions {
            client_type: None,
            ids: vec![3, 4],
        };
        assert_eq!(args_of(&client_list(&ids).unwrap()), ["LIST", "ID", "3", "4"]);

        let typed = ClientListOptions {
            client_type: Some(ClientType::Pubsub),
            ids: vec![],
        };
        assert_eq!(args_of(&client_list(&typed).unwrap()), ["LIST", "TYPE", "pubsub"]);
    }

    #[test]
    fn client_kill_needs_a_filter() {
        let only_skipme = ClientKillOptions {
            skipme: Some(false),
            ..Default::default()
        };
        assert!(matches!(client_kill(&only_skipme), Err(Error::InvalidArgument(_))));

        let opts = ClientKillOptions {
            addr: Some("10.0.0.1:6379".into()),
            skipme: Some(true),
            ..Default::default()
        };
        assert_eq!(
            args_of(&client_kill(&opts).unwrap()),
            ["KILL", "ADDR", "10.0.0.1:6379", "SKIPME", "yes"]
        );
    }

    #[test]
    fn tracking_prefix_requires_bcast() {
        let opts = TrackingOptions {
            prefixes: vec!["user:".into()],
            ..Default::default()
        };
        assert!(client_tracking(true, &opts).is_err());
        let opts = TrackingOptions {
            prefixes: vec!["user:".into()],
            bcast: true,
            ..Default::default()
        };
        assert_eq!(
            args_of(&client_tracking(true, &opts).unwrap()),
            ["TRACKING", "ON", "PREFIX", "user:", "BCAST"]
        );
    }

    #[tokio::test]
    async fn getname_unset_is_none() {
        let conn = MockConnection::connected().with_replies(&[Value::Null, Value::integer(7)]);
        let mut client = Client::new(conn);
        assert_eq!(client.client_getname().await.unwrap(), None);
        assert_eq!(client.client_id().await.unwrap(), 7);
    }
}
