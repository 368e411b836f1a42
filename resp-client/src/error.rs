use std::io;

use resp_proto::Value;

/// Errors returned by the RESP client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The connection is not open, was closed before a response was
    /// received, or was shut down after a fatal protocol/I/O failure.
    #[error("connection closed")]
    ConnectionClosed,

    /// The server returned a Redis error response.
    #[error("redis error from {command}: {message}")]
    Redis {
        /// Name of the command that failed.
        command: String,
        /// The server's message, verbatim.
        message: String,
    },

    /// The response type did not match the expected type for the command.
    #[error("unexpected response")]
    UnexpectedResponse,

    /// A structured reply (stream entries, pending reports, ...) did not have
    /// the documented shape.
    #[error("malformed {context} reply: {reply:?}")]
    MalformedReply {
        /// Which reply was being decoded.
        context: &'static str,
        /// The offending raw value.
        reply: Value,
    },

    /// Arguments were rejected before anything was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A transaction was abandoned before EXEC because a queued command could
    /// not be encoded. No command was sent.
    #[error("EXECABORT transaction discarded: {0}")]
    ExecAbort(String),

    /// EXEC returned nil because a WATCHed key was modified.
    #[error("transaction discarded: watched key changed")]
    TransactionDiscarded,

    /// RESP protocol parse error.
    #[error("protocol error: {0}")]
    Protocol(#[from] resp_proto::ParseError),

    /// I/O error on the connection.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    /// Returns true for errors after which the connection is unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ConnectionClosed | Error::Protocol(_) | Error::Io(_)
        )
    }

    /// Build a server error from a RESP error payload.
    pub(crate) fn redis(command: &[u8], message: &[u8]) -> Self {
        Error::Redis {
            command: String::from_utf8_lossy(command).into_owned(),
            message: String::from_utf8_lossy(message).into_owned(),
        }
    }

    pub(crate) fn malformed(context: &'static str, reply: &Value) -> Self {
        Error::MalformedReply {
            context,
            reply: reply.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redis_error_keeps_message_verbatim() {
        let err = Error::redis(b"HSET", b"WRONGTYPE Operation against a key holding the wrong kind of value");
        match &err {
            Error::Redis { command, message } => {
                assert_eq!(command, "HSET");
                assert_eq!(
                    message,
                    "WRONGTYPE Operation against a key holding the wrong kind of value"
                );
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(err.to_string().starts_with("redis error from HSET: WRONGTYPE"));
        assert!(!err.is_fatal());
    }

    #[test]
    fn fatal_classification() {
        assert!(Error::ConnectionClosed.is_fatal());
        assert!(Error::Protocol(resp_proto::ParseError::InvalidPrefix(b'?')).is_fatal());
        assert!(Error::Io(io::Error::other("reset")).is_fatal());
        assert!(!Error::UnexpectedResponse.is_fatal());
        assert!(!Error::TransactionDiscarded.is_fatal());
    }

    #[test]
    fn malformed_carries_raw_reply() {
        let reply = Value::integer(3);
        let err = Error::malformed("XPENDING", &reply);
        assert_eq!(err.to_string(), "malformed XPENDING reply: Integer(3)");
    }
}
