use bytes::Bytes;
use resp_proto::{Request, Value};

use super::{Condition, ScanOptions, invalid};
use crate::client::Client;
use crate::connection::Connection;
use crate::reply::{
    FromValue, array_reply, float_or_nil_reply, float_reply, integer_or_nil_reply, integer_reply,
    scan_reply,
};
use crate::Error;

// ── Arguments ───────────────────────────────────────────────────────────

/// Members to add with `ZADD`.
#[derive(Debug, Clone, PartialEq)]
pub enum ZAddInput<M> {
    /// A single `(score, member)`.
    Pair(f64, M),
    /// `(score, member)` pairs.
    Pairs(Vec<(f64, M)>),
    /// `member -> score` entries.
    ScoreMap(Vec<(M, f64)>),
}

impl<M: AsRef<[u8]>> ZAddInput<M> {
    fn len(&self) -> usize {
        match self {
            ZAddInput::Pair(..) => 1,
            ZAddInput::Pairs(pairs) => pairs.len(),
            ZAddInput::ScoreMap(map) => map.len(),
        }
    }

    fn push<'a>(&self, mut req: Request<'a>) -> Request<'a> {
        match self {
            ZAddInput::Pair(score, member) => req.arg_float(*score).arg_owned(member.as_ref()),
            ZAddInput::Pairs(pairs) => {
                for (score, member) in pairs {
                    req = req.arg_float(*score).arg_owned(member.as_ref());
                }
                req
            }
            ZAddInput::ScoreMap(map) => {
                for (member, score) in map {
                    req = req.arg_float(*score).arg_owned(member.as_ref());
                }
                req
            }
        }
    }
}

/// `GT` / `LT` for `ZADD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZAddComparison {
    Gt,
    Lt,
}

/// Flags for `ZADD`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZAddOptions {
    pub condition: Option<Condition>,
    pub comparison: Option<ZAddComparison>,
    /// Count changed members, not only added ones.
    pub ch: bool,
    /// Increment instead of set. Only one member is allowed.
    pub incr: bool,
}

impl ZAddOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nx(mut self) -> Self {
        self.condition = Some(Condition::Nx);
        self
    }

    pub fn xx(mut self) -> Self {
        self.condition = Some(Condition::Xx);
        self
    }

    pub fn gt(mut self) -> Self {
        self.comparison = Some(ZAddComparison::Gt);
        self
    }

    pub fn lt(mut self) -> Self {
        self.comparison = Some(ZAddComparison::Lt);
        self
    }

    pub fn ch(mut self) -> Self {
        self.ch = true;
        self
    }

    pub fn incr(mut self) -> Self {
        self.incr = true;
        self
    }
}

/// A score range endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreBound {
    Inclusive(f64),
    Exclusive(f64),
    NegInf,
    PosInf,
}

impl ScoreBound {
    fn token(&self) -> Vec<u8> {
        match self {
            ScoreBound::Inclusive(s) => s.to_string().into_bytes(),
            ScoreBound::Exclusive(s) => format!("({s}").into_bytes(),
            ScoreBound::NegInf => b"-inf".to_vec(),
            ScoreBound::PosInf => b"+inf".to_vec(),
        }
    }
}

/// A lexicographic range endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexBound<'a> {
    Inclusive(&'a [u8]),
    Exclusive(&'a [u8]),
    Min,
    Max,
}

impl LexBound<'_> {
    fn token(&self) -> Vec<u8> {
        let prefixed = |prefix: u8, value: &[u8]| {
            let mut token = Vec::with_capacity(value.len() + 1);
            token.push(prefix);
            token.extend_from_slice(value);
            token
        };
        match self {
            LexBound::Inclusive(v) => prefixed(b'[', v),
            LexBound::Exclusive(v) => prefixed(b'(', v),
            LexBound::Min => b"-".to_vec(),
            LexBound::Max => b"+".to_vec(),
        }
    }
}

/// `LIMIT offset count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    pub offset: i64,
    pub count: i64,
}

/// `AGGREGATE` mode for `ZUNIONSTORE` / `ZINTERSTORE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Sum,
    Min,
    Max,
}

/// Options for `ZUNIONSTORE` / `ZINTERSTORE`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZStoreOptions {
    /// One weight per source key, if any.
    pub weights: Vec<f64>,
    pub aggregate: Option<Aggregate>,
}

// ── Encoders ────────────────────────────────────────────────────────────

/// `ZADD key [NX|XX] [GT|LT] [CH] [INCR] score member ...`.
///
/// Rejects an empty input, `INCR` with more than one member, and `GT`/`LT`
/// combined with `NX`.
pub fn zadd<'a, M: AsRef<[u8]>>(
    key: &'a [u8],
    input: &ZAddInput<M>,
    options: &ZAddOptions,
) -> Result<Request<'a>, Error> {
    if input.len() == 0 {
        return Err(invalid("ZADD requires at least one member"));
    }
    if options.incr && input.len() > 1 {
        return Err(invalid("ZADD INCR accepts a single score/member pair"));
    }
    if options.comparison.is_some() && options.condition == Some(Condition::Nx) {
        return Err(invalid("ZADD GT/LT cannot be combined with NX"));
    }
    let mut req = Request::cmd(b"ZADD").arg(key);
    if let Some(condition) = options.condition {
        req = req.arg(condition.token());
    }
    match options.comparison {
        Some(ZAddComparison::Gt) => req = req.arg(b"GT"),
        Some(ZAddComparison::Lt) => req = req.arg(b"LT"),
        None => {}
    }
    let req = req
        .arg_flag(options.ch, b"CH")
        .arg_flag(options.incr, b"INCR");
    Ok(input.push(req))
}

/// `ZRANGEBYSCORE key min max [WITHSCORES] [LIMIT o c]`, or the `ZREVRANGEBYSCORE`
/// form when `rev` is set (bounds are then `max min`).
pub fn zrangebyscore(
    key: &[u8],
    first: ScoreBound,
    second: ScoreBound,
    withscores: bool,
    limit: Option<Limit>,
    rev: bool,
) -> Request<'_> {
    let name: &'static [u8] = if rev { b"ZREVRANGEBYSCORE" } else { b"ZRANGEBYSCORE" };
    let req = Request::cmd(name)
        .arg(key)
        .arg_owned(first.token())
        .arg_owned(second.token())
        .arg_flag(withscores, b"WITHSCORES");
    push_limit(req, limit)
}

fn push_limit(req: Request<'_>, limit: Option<Limit>) -> Request<'_> {
    match limit {
        Some(Limit { offset, count }) => req.arg(b"LIMIT").arg_int(offset).arg_int(count),
        None => req,
    }
}

fn store_request<'a, K: AsRef<[u8]>>(
    name: &'static [u8],
    dest: &'a [u8],
    keys: impl IntoIterator<Item = K>,
    options: &ZStoreOptions,
) -> Result<Request<'a>, Error> {
    let keys: Vec<Vec<u8>> = keys.into_iter().map(|k| k.as_ref().to_vec()).collect();
    let command = String::from_utf8_lossy(name);
    if keys.is_empty() {
        return Err(invalid(format!("{command} requires at least one key")));
    }
    if !options.weights.is_empty() && options.weights.len() != keys.len() {
        return Err(invalid(format!(
            "{command} takes one weight per key ({} keys, {} weights)",
            keys.len(),
            options.weights.len()
        )));
    }
    let mut req = Request::cmd(name)
        .arg(dest)
        .arg_uint(keys.len() as u64)
        .args(keys);
    if !options.weights.is_empty() {
        req = req.arg(b"WEIGHTS");
        for w in &options.weights {
            req = req.arg_float(*w);
        }
    }
    match options.aggregate {
        Some(Aggregate::Sum) => req = req.arg(b"AGGREGATE").arg(b"SUM"),
        Some(Aggregate::Min) => req = req.arg(b"AGGREGATE").arg(b"MIN"),
        Some(Aggregate::Max) => req = req.arg(b"AGGREGATE").arg(b"MAX"),
        None => {}
    }
    Ok(req)
}

/// `ZUNIONSTORE dest numkeys key ... [WEIGHTS w ...] [AGGREGATE a]`.
pub fn zunionstore<'a, K: AsRef<[u8]>>(
    dest: &'a [u8],
    keys: impl IntoIterator<Item = K>,
    options: &ZStoreOptions,
) -> Result<Request<'a>, Error> {
    store_request(b"ZUNIONSTORE", dest, keys, options)
}

/// `ZINTERSTORE dest numkeys key ... [WEIGHTS w ...] [AGGREGATE a]`.
pub fn zinterstore<'a, K: AsRef<[u8]>>(
    dest: &'a [u8],
    keys: impl IntoIterator<Item = K>,
    options: &ZStoreOptions,
) -> Result<Request<'a>, Error> {
    store_request(b"ZINTERSTORE", dest, keys, options)
}

// ── Replies ─────────────────────────────────────────────────────────────

/// Member/score pairs: flat in RESP2, nested pairs in RESP3.
fn scored_reply(value: Value) -> Result<Vec<(Bytes, f64)>, Error> {
    let items = match value {
        Value::Array(items) => items,
        Value::Map(entries) => {
            return entries
                .into_iter()
                .map(|(member, score)| Ok((Bytes::from_value(member)?, float_reply(score)?)))
                .collect();
        }
        _ => return Err(Error::UnexpectedResponse),
    };
    let nested = items
        .iter()
        .all(|v| matches!(v, Value::Array(pair) if pair.len() == 2));
    let flat: Vec<Value> = if nested {
        items
            .into_iter()
            .flat_map(|v| match v {
                Value::Array(pair) => pair,
                other => vec![other],
            })
            .collect()
    } else {
        items
    };
    if flat.len() % 2 != 0 {
        return Err(Error::UnexpectedResponse);
    }
    let mut pairs = Vec::with_capacity(flat.len() / 2);
    let mut iter = flat.into_iter();
    while let (Some(member), Some(score)) = (iter.next(), iter.next()) {
        pairs.push((Bytes::from_value(member)?, float_reply(score)?));
    }
    Ok(pairs)
}

/// `[key, member, score]` or nil, from `BZPOPMIN` / `BZPOPMAX`.
fn keyed_pop_reply(value: Value) -> Result<Option<(Bytes, Bytes, f64)>, Error> {
    match value {
        Value::Null => Ok(None),
        Value::Array(items) if items.len() == 3 => {
            let mut iter = items.into_iter();
            let (Some(key), Some(member), Some(score)) = (iter.next(), iter.next(), iter.next())
            else {
                return Err(Error::UnexpectedResponse);
            };
            Ok(Some((
                Bytes::from_value(key)?,
                Bytes::from_value(member)?,
                float_reply(score)?,
            )))
        }
        _ => Err(Error::UnexpectedResponse),
    }
}

// ── Commands ────────────────────────────────────────────────────────────

impl<C: Connection> Client<C> {
    /// Add or update members. Returns the number added (changed with `CH`).
    pub async fn zadd<M: AsRef<[u8]>>(
        &mut self,
        key: impl AsRef<[u8]>,
        input: &ZAddInput<M>,
        options: &ZAddOptions,
    ) -> Result<i64, Error> {
        let options = ZAddOptions {
            incr: false,
            ..*options
        };
        let req = zadd(key.as_ref(), input, &options)?;
        integer_reply(self.exec(&req).await?)
    }

    /// `ZADD ... INCR`. Returns the new score, or `None` when a condition
    /// prevented the update.
    pub async fn zadd_incr(
        &mut self,
        key: impl AsRef<[u8]>,
        score: f64,
        member: impl AsRef<[u8]>,
        options: &ZAddOptions,
    ) -> Result<Option<f64>, Error> {
        let options = ZAddOptions {
            incr: true,
            ..*options
        };
        let req = zadd(key.as_ref(), &ZAddInput::Pair(score, member.as_ref()), &options)?;
        float_or_nil_reply(self.exec(&req).await?)
    }

    pub async fn zincrby(
        &mut self,
        key: impl AsRef<[u8]>,
        delta: f64,
        member: impl AsRef<[u8]>,
    ) -> Result<f64, Error> {
        let req = Request::cmd(b"ZINCRBY")
            .arg(key.as_ref())
            .arg_float(delta)
            .arg(member.as_ref());
        float_reply(self.exec(&req).await?)
    }

    pub async fn zrem<M: AsRef<[u8]>>(
        &mut self,
        key: impl AsRef<[u8]>,
        members: impl IntoIterator<Item = M>,
    ) -> Result<i64, Error> {
        let req = Request::cmd(b"ZREM").arg(key.as_ref()).args(members);
        if req.len() == 2 {
            return Err(invalid("ZREM requires at least one member"));
        }
        integer_reply(self.exec(&req).await?)
    }

    pub async fn zcard(&mut self, key: impl AsRef<[u8]>) -> Result<i64, Error> {
        integer_reply(self.exec(&Request::cmd(b"ZCARD").arg(key.as_ref())).await?)
    }

    pub async fn zcount(
        &mut self,
        key: impl AsRef<[u8]>,
        min: ScoreBound,
        max: ScoreBound,
    ) -> Result<i64, Error> {
        let req = Request::cmd(b"ZCOUNT")
            .arg(key.as_ref())
            .arg_owned(min.token())
            .arg_owned(max.token());
        integer_reply(self.exec(&req).await?)
    }

    pub async fn zlexcount(
        &mut self,
        key: impl AsRef<[u8]>,
        min: LexBound<'_>,
        max: LexBound<'_>,
    ) -> Result<i64, Error> {
        let req = Request::cmd(b"ZLEXCOUNT")
            .arg(key.as_ref())
            .arg_owned(min.token())
            .arg_owned(max.token());
        integer_reply(self.exec(&req).await?)
    }

    pub async fn zscore(
        &mut self,
        key: impl AsRef<[u8]>,
        member: impl AsRef<[u8]>,
    ) -> Result<Option<f64>, Error> {
        let req = Request::cmd(b"ZSCORE").arg(key.as_ref()).arg(member.as_ref());
        float_or_nil_reply(self.exec(&req).await?)
    }

    pub async fn zmscore<M: AsRef<[u8]>>(
        &mut self,
        key: impl AsRef<[u8]>,
        members: impl IntoIterator<Item = M>,
    ) -> Result<Vec<Option<f64>>, Error> {
        let req = Request::cmd(b"ZMSCORE").arg(key.as_ref()).args(members);
        if req.len() == 2 {
            return Err(invalid("ZMSCORE requires at least one member"));
        }
        let Value::Array(items) = self.exec(&req).await? else {
            return Err(Error::UnexpectedResponse);
        };
        items.into_iter().map(float_or_nil_reply).collect()
    }

    pub async fn zrank(
        &mut self,
        key: impl AsRef<[u8]>,
        member: impl AsRef<[u8]>,
    ) -> Result<Option<i64>, Error> {
        let req = Request::cmd(b"ZRANK").arg(key.as_ref()).arg(member.as_ref());
        integer_or_nil_reply(self.exec(&req).await?)
    }

    pub async fn zrevrank(
        &mut self,
        key: impl AsRef<[u8]>,
        member: impl AsRef<[u8]>,
    ) -> Result<Option<i64>, Error> {
        let req = Request::cmd(b"ZREVRANK").arg(key.as_ref()).arg(member.as_ref());
        integer_or_nil_reply(self.exec(&req).await?)
    }

    /// Members by rank, lowest score first.
    pub async fn zrange(
        &mut self,
        key: impl AsRef<[u8]>,
        start: i64,
        stop: i64,
    ) -> Result<Vec<Bytes>, Error> {
        let req = Request::cmd(b"ZRANGE")
            .arg(key.as_ref())
            .arg_int(start)
            .arg_int(stop);
        array_reply(self.exec(&req).await?)
    }

    pub async fn zrange_withscores(
        &mut self,
        key: impl AsRef<[u8]>,
        start: i64,
        stop: i64,
    ) -> Result<Vec<(Bytes, f64)>, Error> {
        let req = Request::cmd(b"ZRANGE")
            .arg(key.as_ref())
            .arg_int(start)
            .arg_int(stop)
            .arg(b"WITHSCORES");
        scored_reply(self.exec(&req).await?)
    }

    /// Members by rank, highest score first.
    pub async fn zrevrange(
        &mut self,
        key: impl AsRef<[u8]>,
        start: i64,
        stop: i64,
    ) -> Result<Vec<Bytes>, Error> {
        let req = Request::cmd(b"ZREVRANGE")
            .arg(key.as_ref())
            .arg_int(start)
            .arg_int(stop);
        array_reply(self.exec(&req).await?)
    }

    pub async fn zrevrange_withscores(
        &mut self,
        key: impl AsRef<[u8]>,
        start: i64,
        stop: i64,
    ) -> Result<Vec<(Bytes, f64)>, Error> {
        let req = Request::cmd(b"ZREVRANGE")
            .arg(key.as_ref())
            .arg_int(start)
            .arg_int(stop)
            .arg(b"WITHSCORES");
        scored_reply(self.exec(&req).await?)
    }

    pub async fn zrangebyscore(
        &mut self,
        key: impl AsRef<[u8]>,
        min: ScoreBound,
        max: ScoreBound,
        limit: Option<Limit>,
    ) -> Result<Vec<Bytes>, Error> {
        let req = zrangebyscore(key.as_ref(), min, max, false, limit, false);
        array_reply(self.exec(&req).await?)
    }

    pub async fn zrangebyscore_withscores(
        &mut self,
        key: impl AsRef<[u8]>,
        min: ScoreBound,
        max: ScoreBound,
        limit: Option<Limit>,
    ) -> Result<Vec<(Bytes, f64)>, Error> {
        let req = zrangebyscore(key.as_ref(), min, max, true, limit, false);
        scored_reply(self.exec(&req).await?)
    }

    /// Members with scores from `max` down to `min`.
    pub async fn zrevrangebyscore(
        &mut self,
        key: impl AsRef<[u8]>,
        max: ScoreBound,
        min: ScoreBound,
        limit: Option<Limit>,
    ) -> Result<Vec<Bytes>, Error> {
        let req = zrangebyscore(key.as_ref(), max, min, false, limit, true);
        array_reply(self.exec(&req).await?)
    }

    pub async fn zrevrangebyscore_withscores(
        &mut self,
        key: impl AsRef<[u8]>,
        max: ScoreBound,
        min: ScoreBound,
        limit: Option<Limit>,
    ) -> Result<Vec<(Bytes, f64)>, Error> {
        let req = zrangebyscore(key.as_ref(), max, min, true, limit, true);
        scored_reply(self.exec(&req).await?)
    }

    pub async fn zrangebylex(
        &mut self,
        key: impl AsRef<[u8]>,
        min: LexBound<'_>,
        max: LexBound<'_>,
        limit: Option<Limit>,
    ) -> Result<Vec<Bytes>, Error> {
        let req = Request::cmd(b"ZRANGEBYLEX")
            .arg(key.as_ref())
            .arg_owned(min.token())
            .arg_owned(max.token());
        array_reply(self.exec(&push_limit(req, limit)).await?)
    }

    pub async fn zrevrangebylex(
        &mut self,
        key: impl AsRef<[u8]>,
        max: LexBound<'_>,
        min: LexBound<'_>,
        limit: Option<Limit>,
    ) -> Result<Vec<Bytes>, Error> {
        let req = Request::cmd(b"ZREVRANGEBYLEX")
            .arg(key.as_ref())
            .arg_owned(max.token())
            .arg_owned(min.token());
        array_reply(self.exec(&push_limit(req, limit)).await?)
    }

    pub async fn zremrangebyrank(
        &mut self,
        key: impl AsRef<[u8]>,
        start: i64,
        stop: i64,
    ) -> Result<i64, Error> {
        let req = Request::cmd(b"ZREMRANGEBYRANK")
            .arg(key.as_ref())
            .arg_int(start)
            .arg_int(stop);
        integer_reply(self.exec(&req).await?)
    }

    pub async fn zremrangebyscore(
        &mut self,
        key: impl AsRef<[u8]>,
        min: ScoreBound,
        max: ScoreBound,
    ) -> Result<i64, Error> {
        let req = Request::cmd(b"ZREMRANGEBYSCORE")
            .arg(key.as_ref())
            .arg_owned(min.token())
            .arg_owned(max.token());
        integer_reply(self.exec(&req).await?)
    }

    pub async fn zremrangebylex(
        &mut self,
        key: impl AsRef<[u8]>,
        min: LexBound<'_>,
        max: LexBound<'_>,
    ) -> Result<i64, Error> {
        let req = Request::cmd(b"ZREMRANGEBYLEX")
            .arg(key.as_ref())
            .arg_owned(min.token())
            .arg_owned(max.token());
        integer_reply(self.exec(&req).await?)
    }

    /// Pop the lowest-scored members.
    pub async fn zpopmin(
        &mut self,
        key: impl AsRef<[u8]>,
        count: Option<u64>,
    ) -> Result<Vec<(Bytes, f64)>, Error> {
        let mut req = Request::cmd(b"ZPOPMIN").arg(key.as_ref());
        if let Some(count) = count {
            req = req.arg_uint(count);
        }
        scored_reply(self.exec(&req).await?)
    }

    /// Pop the highest-scored members.
    pub async fn zpopmax(
        &mut self,
        key: impl AsRef<[u8]>,
        count: Option<u64>,
    ) -> Result<Vec<(Bytes, f64)>, Error> {
        let mut req = Request::cmd(b"ZPOPMAX").arg(key.as_ref());
        if let Some(count) = count {
            req = req.arg_uint(count);
        }
        scored_reply(self.exec(&req).await?)
    }

    /// Blocking pop of the lowest score across `keys`: `(key, member, score)`.
    pub async fn bzpopmin<K: AsRef<[u8]>>(
        &mut self,
        keys: impl IntoIterator<Item = K>,
        timeout_secs: f64,
    ) -> Result<Option<(Bytes, Bytes, f64)>, Error> {
        let req = Request::cmd(b"BZPOPMIN").args(keys);
        if req.len() == 1 {
            return Err(invalid("BZPOPMIN requires at least one key"));
        }
        keyed_pop_reply(self.exec(&req.arg_float(timeout_secs)).await?)
    }

    pub async fn bzpopmax<K: AsRef<[u8]>>(
        &mut self,
        keys: impl IntoIterator<Item = K>,
        timeout_secs: f64,
    ) -> Result<Option<(Bytes, Bytes, f64)>, Error> {
        let req = Request::cmd(b"BZPOPMAX").args(keys);
        if req.len() == 1 {
            return Err(invalid("BZPOPMAX requires at least one key"));
        }
        keyed_pop_reply(self.exec(&req.arg_float(timeout_secs)).await?)
    }

    pub async fn zunionstore<K: AsRef<[u8]>>(
        &mut self,
        dest: impl AsRef<[u8]>,
        keys: impl IntoIterator<Item = K>,
        options: &ZStoreOptions,
    ) -> Result<i64, Error> {
        let req = zunionstore(dest.as_ref(), keys, options)?;
        integer_reply(self.exec(&req).await?)
    }

    pub async fn zinterstore<K: AsRef<[u8]>>(
        &mut self,
        dest: impl AsRef<[u8]>,
        keys: impl IntoIterator<Item = K>,
        options: &ZStoreOptions,
    ) -> Result<i64, Error> {
        let req = zinterstore(dest.as_ref(), keys, options)?;
        integer_reply(self.exec(&req).await?)
    }

    /// One `ZSCAN` page of member/score pairs.
    pub async fn zscan(
        &mut self,
        key: impl AsRef<[u8]>,
        cursor: u64,
        options: &ScanOptions,
    ) -> Result<(u64, Vec<(Bytes, f64)>), Error> {
        let req = options.push(Request::cmd(b"ZSCAN").arg(key.as_ref()).arg_uint(cursor));
        let (cursor, flat) = scan_reply::<Value>(self.exec(&req).await?)?;
        Ok((cursor, scored_reply(Value::Array(flat))?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::args_of;
    use crate::MockConnection;

    fn bulk(s: &str) -> Value {
        Value::bulk_string(s.as_bytes())
    }

    #[test]
    fn zadd_ch() {
        let input = ZAddInput::Pairs(vec![(1.0, "a"), (2.0, "b")]);
        let req = zadd(b"k", &input, &ZAddOptions::new().ch()).unwrap();
        assert_eq!(args_of(&req), ["k", "CH", "1", "a", "2", "b"]);
    }

    #[test]
    fn zadd_score_map_and_flags() {
        let input = ZAddInput::ScoreMap(vec![("m", 2.5)]);
        let req = zadd(b"k", &input, &ZAddOptions::new().xx().gt()).unwrap();
        assert_eq!(args_of(&req), ["k", "XX", "GT", "2.5", "m"]);
    }

    #[test]
    fn zadd_validation() {
        let two = ZAddInput::Pairs(vec![(1.0, "a"), (2.0, "b")]);
        assert!(matches!(
            zadd(b"k", &two, &ZAddOptions::new().incr()),
            Err(Error::InvalidArgument(_))
        ));
        let one = ZAddInput::Pair(1.0, "a");
        assert!(matches!(
            zadd(b"k", &one, &ZAddOptions::new().nx().lt()),
            Err(Error::InvalidArgument(_))
        ));
        let empty: ZAddInput<&str> = ZAddInput::Pairs(Vec::new());
        assert!(matches!(
            zadd(b"k", &empty, &ZAddOptions::new()),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn bounds() {
        let req = zrangebyscore(
            b"z",
            ScoreBound::Exclusive(1.5),
            ScoreBound::PosInf,
            true,
            Some(Limit { offset: 0, count: 10 }),
            false,
        );
        assert_eq!(
            args_of(&req),
            ["z", "(1.5", "+inf", "WITHSCORES", "LIMIT", "0", "10"]
        );
        assert_eq!(LexBound::Inclusive(b"a").token(), b"[a");
        assert_eq!(LexBound::Exclusive(b"b").token(), b"(b");
        assert_eq!(LexBound::Min.token(), b"-");
        assert_eq!(ScoreBound::NegInf.token(), b"-inf");
    }

    #[test]
    fn store_weights_must_match_keys() {
        let opts = ZStoreOptions {
            weights: vec![1.0],
            aggregate: Some(Aggregate::Max),
        };
        assert!(zunionstore(b"d", ["a", "b"], &opts).is_err());
        let opts = ZStoreOptions {
            weights: vec![2.0, 0.5],
            aggregate: Some(Aggregate::Max),
        };
        let req = zinterstore(b"d", ["a", "b"], &opts).unwrap();
        assert_eq!(
            args_of(&req),
            ["d", "2", "a", "b", "WEIGHTS", "2", "0.5", "AGGREGATE", "MAX"]
        );
    }

    #[tokio::test]
    async fn withscores_flat_and_nested() {
        let conn = MockConnection::connected().with_replies(&[
            Value::array(vec![bulk("a"), bulk("1"), bulk("b"), bulk("2.5")]),
            Value::array(vec![Value::array(vec![bulk("a"), Value::Double(1.0)])]),
        ]);
        let mut client = Client::new(conn);
        let flat = client.zrange_withscores("z", 0, -1).await.unwrap();
        assert_eq!(flat, vec![(Bytes::from_static(b"a"), 1.0), (Bytes::from_static(b"b"), 2.5)]);
        let nested = client.zrange_withscores("z", 0, -1).await.unwrap();
        assert_eq!(nested, vec![(Bytes::from_static(b"a"), 1.0)]);
    }

    #[tokio::test]
    async fn zadd_incr_nil_and_score() {
        let conn = MockConnection::connected().with_replies(&[Value::Null, bulk("3")]);
        let mut client = Client::new(conn);
        let opts = ZAddOptions::new().xx();
        assert_eq!(client.zadd_incr("z", 1.0, "m", &opts).await.unwrap(), None);
        assert_eq!(client.zadd_incr("z", 1.0, "m", &opts).await.unwrap(), Some(3.0));
        assert_eq!(
            client.conn().written_commands()[0],
            vec![
                b"ZADD".to_vec(),
                b"z".to_vec(),
                b"XX".to_vec(),
                b"INCR".to_vec(),
                b"1".to_vec(),
                b"m".to_vec()
            ]
        );
    }

    #[tokio::test]
    async fn bzpopmin_reply() {
        let conn = MockConnection::connected()
            .with_reply(&Value::array(vec![bulk("z"), bulk("m"), bulk("0.5")]));
        let mut client = Client::new(conn);
        assert_eq!(
            client.bzpopmin(["z"], 1.0).await.unwrap(),
            Some((Bytes::from_static(b"z"), Bytes::from_static(b"m"), 0.5))
        );
    }
}
