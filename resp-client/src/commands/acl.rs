use resp_proto::{Request, Value};

use super::invalid;
use crate::client::Client;
use crate::connection::Connection;
use crate::reply::{
    FromValue, array_reply, bulk_reply, float_reply, integer_reply, ok_reply, pairs_reply,
};
use crate::Error;

/// One `ACL LOG` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct AclLogEntry {
    pub count: i64,
    /// `command`, `key`, `channel` or `auth`.
    pub reason: String,
    pub context: String,
    pub object: String,
    pub username: String,
    pub age_seconds: f64,
    pub client_info: String,
}

impl FromValue for AclLogEntry {
    fn from_value(value: Value) -> Result<Self, Error> {
        let fields: Vec<(String, Value)> = pairs_reply(value)?;
        let take = |name: &str| {
            fields
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        };
        let text = |name: &str| -> Result<String, Error> {
            match take(name) {
                Some(v) => String::from_value(v),
                None => Ok(String::new()),
            }
        };
        Ok(AclLogEntry {
            count: integer_reply(take("count").ok_or(Error::UnexpectedResponse)?)?,
            reason: text("reason")?,
            context: text("context")?,
            object: text("object")?,
            username: text("username")?,
            age_seconds: take("age-seconds").map(float_reply).transpose()?.unwrap_or(0.0),
            client_info: text("client-info")?,
        })
    }
}

impl<C: Connection> Client<C> {
    pub async fn acl_whoami(&mut self) -> Result<String, Error> {
        bulk_reply(self.exec(&Request::cmd(b"ACL").arg(b"WHOAMI")).await?)?
            .ok_or(Error::UnexpectedResponse)
    }

    pub async fn acl_users(&mut self) -> Result<Vec<String>, Error> {
        array_reply(self.exec(&Request::cmd(b"ACL").arg(b"USERS")).await?)
    }

    /// Command categories, or the commands in `category`.
    pub async fn acl_cat(&mut self, category: Option<&str>) -> Result<Vec<String>, Error> {
        let mut req = Request::cmd(b"ACL").arg(b"CAT");
        if let Some(category) = category {
            req = req.arg(category.as_bytes());
        }
        array_reply(self.exec(&req).await?)
    }

    /// Create or modify a user with ACL rules such as `on`, `>secret`, `~key:*`.
    pub async fn acl_setuser<R: AsRef<[u8]>>(
        &mut self,
        username: impl AsRef<[u8]>,
        rules: impl IntoIterator<Item = R>,
    ) -> Result<(), Error> {
        let req = Request::cmd(b"ACL")
            .arg(b"SETUSER")
            .arg(username.as_ref())
            .args(rules);
        ok_reply(self.exec(&req).await?)
    }

    /// Returns the number of users deleted.
    pub async fn acl_deluser<U: AsRef<[u8]>>(
        &mut self,
        usernames: impl IntoIterator<Item = U>,
    ) -> Result<i64, Error> {
        let req = Request::cmd(b"ACL").arg(b"DELUSER").args(usernames);
        if req.len() == 2 {
            return Err(invalid("ACL DELUSER requires at least one user"));
        }
        integer_reply(self.exec(&req).await?)
    }

    /// A user's properties as label/value pairs, `None` if unknown.
    pub async fn acl_getuser(
        &mut self,
        username: impl AsRef<[u8]>,
    ) -> Result<Option<Vec<(String, Value)>>, Error> {
        let req = Request::cmd(b"ACL").arg(b"GETUSER").arg(username.as_ref());
        match self.exec(&req).await? {
            Value::Null => Ok(None),
            value => pairs_reply(value).map(Some),
        }
    }

    /// Every user as an ACL rule line.
    pub async fn acl_list(&mut self) -> Result<Vec<String>, Error> {
        array_reply(self.exec(&Request::cmd(b"ACL").arg(b"LIST")).await?)
    }

    /// A random password, 256 bits unless `bits` is given.
    pub async fn acl_genpass(&mut self, bits: Option<u32>) -> Result<String, Error> {
        let mut req = Request::cmd(b"ACL").arg(b"GENPASS");
        if let Some(bits) = bits {
            req = req.arg_uint(bits as u64);
        }
        bulk_reply(self.exec(&req).await?)?.ok_or(Error::UnexpectedResponse)
    }

    /// Recent security events, newest first.
    pub async fn acl_log(&mut self, count: Option<u64>) -> Result<Vec<AclLogEntry>, Error> {
        let mut req = Request::cmd(b"ACL").arg(b"LOG");
        if let Some(count) = count {
            req = req.arg_uint(count);
        }
        array_reply(self.exec(&req).await?)
    }

    pub async fn acl_log_reset(&mut self) -> Result<(), Error> {
        ok_reply(self.exec(&Request::cmd(b"ACL").arg(b"LOG").arg(b"RESET")).await?)
    }

    /// Reload users from the configured ACL file.
    pub async fn acl_load(&mut self) -> Result<(), Error> {
        ok_reply(self.exec(&Request::cmd(b"ACL").arg(b"LOAD")).await?)
    }

    pub async fn acl_save(&mut self) -> Result<(), Error> {
        ok_reply(self.exec(&Request::cmd(b"ACL").arg(b"SAVE")).await?)
    }
}
