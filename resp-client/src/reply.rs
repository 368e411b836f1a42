//! Typed views over raw replies.
//!
//! Each function checks the reply's shape and returns
//! [`Error::UnexpectedResponse`] when it does not match. Server error replies
//! never get here: the executor has already turned them into
//! [`Error::Redis`].

use bytes::Bytes;
use resp_proto::Value;

use crate::Error;

/// Conversion from a raw reply element.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, Error>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, Error> {
        Ok(value)
    }
}

impl FromValue for Bytes {
    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::BulkString(b) | Value::SimpleString(b) => Ok(b),
            _ => Err(Error::UnexpectedResponse),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, Error> {
        let bytes = Bytes::from_value(value)?;
        utf8(bytes)
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Integer(n) => Ok(n),
            Value::BulkString(b) | Value::SimpleString(b) => parse_text(&b),
            _ => Err(Error::UnexpectedResponse),
        }
    }
}

impl FromValue for u64 {
    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Integer(n) => u64::try_from(n).map_err(|_| Error::UnexpectedResponse),
            Value::BulkString(b) | Value::SimpleString(b) => parse_text(&b),
            _ => Err(Error::UnexpectedResponse),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, Error> {
        float_reply(value)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, Error> {
        bool_reply(value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Null => Ok(None),
            value => T::from_value(value).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, Error> {
        array_reply(value)
    }
}

/// `+<status>` as text.
pub fn status_reply(value: Value) -> Result<String, Error> {
    match value {
        Value::SimpleString(s) => utf8(s),
        _ => Err(Error::UnexpectedResponse),
    }
}

/// `+<status>` or nil.
pub fn status_or_nil_reply(value: Value) -> Result<Option<String>, Error> {
    match value {
        Value::Null => Ok(None),
        value => status_reply(value).map(Some),
    }
}

/// Exactly `+OK`.
pub fn ok_reply(value: Value) -> Result<(), Error> {
    match value {
        Value::SimpleString(ref s) if &s[..] == b"OK" => Ok(()),
        _ => Err(Error::UnexpectedResponse),
    }
}

pub fn integer_reply(value: Value) -> Result<i64, Error> {
    match value {
        Value::Integer(n) => Ok(n),
        _ => Err(Error::UnexpectedResponse),
    }
}

pub fn integer_or_nil_reply(value: Value) -> Result<Option<i64>, Error> {
    match value {
        Value::Null => Ok(None),
        value => integer_reply(value).map(Some),
    }
}

/// `:0` / `:1` (any non-zero integer is true), or a RESP3 boolean.
pub fn bool_reply(value: Value) -> Result<bool, Error> {
    match value {
        Value::Integer(n) => Ok(n != 0),
        Value::Boolean(b) => Ok(b),
        _ => Err(Error::UnexpectedResponse),
    }
}

/// Bulk or status text decoded as UTF-8. Nil is `None`.
pub fn bulk_reply(value: Value) -> Result<Option<String>, Error> {
    match value {
        Value::Null => Ok(None),
        Value::BulkString(b) | Value::SimpleString(b) => utf8(b).map(Some),
        _ => Err(Error::UnexpectedResponse),
    }
}

/// Bulk payload as raw bytes. Nil is `None`.
pub fn binary_reply(value: Value) -> Result<Option<Bytes>, Error> {
    match value {
        Value::Null => Ok(None),
        Value::BulkString(b) | Value::SimpleString(b) => Ok(Some(b)),
        _ => Err(Error::UnexpectedResponse),
    }
}

/// A float sent as bulk text (`"3.5"`, `"inf"`), an integer, or a RESP3 double.
pub fn float_reply(value: Value) -> Result<f64, Error> {
    match value {
        Value::BulkString(b) | Value::SimpleString(b) => parse_text(&b),
        Value::Integer(n) => Ok(n as f64),
        Value::Double(d) => Ok(d),
        _ => Err(Error::UnexpectedResponse),
    }
}

pub fn float_or_nil_reply(value: Value) -> Result<Option<f64>, Error> {
    match value {
        Value::Null => Ok(None),
        value => float_reply(value).map(Some),
    }
}

/// Every element of an array (or RESP3 set/push) converted with [`FromValue`].
pub fn array_reply<T: FromValue>(value: Value) -> Result<Vec<T>, Error> {
    match value {
        Value::Array(items) | Value::Set(items) | Value::Push(items) => {
            items.into_iter().map(T::from_value).collect()
        }
        _ => Err(Error::UnexpectedResponse),
    }
}

/// A flat `[k1, v1, k2, v2, ...]` array (or RESP3 map) as ordered pairs.
pub fn pairs_reply<K: FromValue, V: FromValue>(value: Value) -> Result<Vec<(K, V)>, Error> {
    match value {
        Value::Array(items) => {
            if items.len() % 2 != 0 {
                return Err(Error::UnexpectedResponse);
            }
            let mut result = Vec::with_capacity(items.len() / 2);
            let mut iter = items.into_iter();
            while let (Some(k), Some(v)) = (iter.next(), iter.next()) {
                result.push((K::from_value(k)?, V::from_value(v)?));
            }
            Ok(result)
        }
        Value::Map(entries) => entries
            .into_iter()
            .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
            .collect(),
        _ => Err(Error::UnexpectedResponse),
    }
}

/// A `SCAN`-family reply: `[cursor, [items...]]`. A returned cursor of 0
/// ends the iteration.
pub fn scan_reply<T: FromValue>(value: Value) -> Result<(u64, Vec<T>), Error> {
    match value {
        Value::Array(items) if items.len() == 2 => {
            let mut iter = items.into_iter();
            let (Some(cursor), Some(page)) = (iter.next(), iter.next()) else {
                return Err(Error::UnexpectedResponse);
            };
            Ok((u64::from_value(cursor)?, array_reply(page)?))
        }
        _ => Err(Error::UnexpectedResponse),
    }
}

/// Like [`array_reply`], but a nil reply is an empty vector.
pub(crate) fn array_or_nil_reply<T: FromValue>(value: Value) -> Result<Vec<T>, Error> {
    match value {
        Value::Null => Ok(Vec::new()),
        value => array_reply(value),
    }
}

/// A two-element array reply, or nil (blocking pops on timeout).
pub(crate) fn pair_or_nil_reply<A: FromValue, B: FromValue>(
    value: Value,
) -> Result<Option<(A, B)>, Error> {
    match value {
        Value::Null => Ok(None),
        Value::Array(items) if items.len() == 2 => {
            let mut iter = items.into_iter();
            let (Some(a), Some(b)) = (iter.next(), iter.next()) else {
                return Err(Error::UnexpectedResponse);
            };
            Ok(Some((A::from_value(a)?, B::from_value(b)?)))
        }
        _ => Err(Error::UnexpectedResponse),
    }
}

fn utf8(bytes: Bytes) -> Result<String, Error> {
    String::from_utf8(bytes.to_vec()).map_err(|_| Error::UnexpectedResponse)
}

fn parse_text<T: std::str::FromStr>(bytes: &[u8]) -> Result<T, Error> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(Error::UnexpectedResponse)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bulk(s: &str) -> Value {
        Value::bulk_string(s.as_bytes())
    }

    #[test]
    fn status_and_ok() {
        assert_eq!(status_reply(Value::simple_string(b"PONG")).unwrap(), "PONG");
        assert!(ok_reply(Value::simple_string(b"OK")).is_ok());
        assert!(matches!(
            ok_reply(Value::simple_string(b"QUEUED")),
            Err(Error::UnexpectedResponse)
        ));
        assert!(matches!(ok_reply(Value::Null), Err(Error::UnexpectedResponse)));
        assert_eq!(status_or_nil_reply(Value::Null).unwrap(), None);
    }

    #[test]
    fn integers() {
        assert_eq!(integer_reply(Value::integer(-3)).unwrap(), -3);
        assert!(integer_reply(bulk("3")).is_err());
        assert_eq!(integer_or_nil_reply(Value::Null).unwrap(), None);
        assert!(bool_reply(Value::integer(1)).unwrap());
        assert!(!bool_reply(Value::integer(0)).unwrap());
        assert!(bool_reply(Value::Boolean(true)).unwrap());
    }

    #[test]
    fn bulk_and_binary() {
        assert_eq!(bulk_reply(bulk("héllo")).unwrap().as_deref(), Some("héllo"));
        assert_eq!(bulk_reply(Value::Null).unwrap(), None);
        assert!(matches!(
            bulk_reply(Value::bulk_string(&[0xff, 0xfe])),
            Err(Error::UnexpectedResponse)
        ));
        assert_eq!(
            binary_reply(Value::bulk_string(&[0xff, 0xfe])).unwrap(),
            Some(Bytes::from_static(&[0xff, 0xfe]))
        );
        assert!(binary_reply(Value::integer(1)).is_err());
    }

    #[test]
    fn floats() {
        assert_eq!(float_reply(bulk("3.5")).unwrap(), 3.5);
        assert_eq!(float_reply(bulk("inf")).unwrap(), f64::INFINITY);
        assert_eq!(float_reply(bulk("-inf")).unwrap(), f64::NEG_INFINITY);
        assert_eq!(float_reply(Value::Double(0.25)).unwrap(), 0.25);
        assert!(float_reply(bulk("abc")).is_err());
        assert_eq!(float_or_nil_reply(Value::Null).unwrap(), None);
    }

    #[test]
    fn arrays_of_optionals() {
        let reply = Value::array(vec![bulk("a"), Value::Null, bulk("c")]);
        let values: Vec<Option<String>> = array_reply(reply).unwrap();
        assert_eq!(values, vec![Some("a".into()), None, Some("c".into())]);
        assert!(array_reply::<String>(Value::integer(1)).is_err());
    }

    #[test]
    fn pairs_from_flat_array_and_map() {
        let flat = Value::array(vec![bulk("f1"), bulk("1"), bulk("f2"), bulk("2")]);
        let pairs: Vec<(String, i64)> = pairs_reply(flat).unwrap();
        assert_eq!(pairs, vec![("f1".into(), 1), ("f2".into(), 2)]);

        let map = Value::map(vec![(bulk("f1"), Value::integer(1))]);
        let pairs: Vec<(String, i64)> = pairs_reply(map).unwrap();
        assert_eq!(pairs, vec![("f1".into(), 1)]);

        let odd = Value::array(vec![bulk("f1")]);
        assert!(pairs_reply::<String, String>(odd).is_err());
    }

    #[test]
    fn scan_cursor_and_page() {
        let reply = Value::array(vec![bulk("17"), Value::array(vec![bulk("k1"), bulk("k2")])]);
        let (cursor, keys): (u64, Vec<String>) = scan_reply(reply).unwrap();
        assert_eq!(cursor, 17);
        assert_eq!(keys, vec!["k1", "k2"]);
        assert!(scan_reply::<String>(Value::array(vec![bulk("0")])).is_err());
    }

    #[test]
    fn blocking_pop_pair() {
        let reply = Value::array(vec![bulk("list"), bulk("x")]);
        let popped: Option<(String, Bytes)> = pair_or_nil_reply(reply).unwrap();
        assert_eq!(popped, Some(("list".into(), Bytes::from_static(b"x"))));
        assert_eq!(pair_or_nil_reply::<String, Bytes>(Value::Null).unwrap(), None);
    }

    #[test]
    fn nested_vec_from_value() {
        let reply = Value::array(vec![
            Value::array(vec![Value::integer(1), Value::integer(2)]),
            Value::array(vec![]),
        ]);
        let nested: Vec<Vec<i64>> = array_reply(reply).unwrap();
        assert_eq!(nested, vec![vec![1, 2], vec![]]);
    }
}
