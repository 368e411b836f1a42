use std::fmt;
use std::str::FromStr;

/// A stream entry id, `<ms>-<seq>`.
///
/// Ids order by milliseconds, then sequence, which is the order entries have
/// in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct XId {
    pub ms: u64,
    pub seq: u64,
}

impl XId {
    /// The smallest possible id, `0-0`.
    pub const MIN: XId = XId::new(0, 0);
    /// The largest possible id.
    pub const MAX: XId = XId::new(u64::MAX, u64::MAX);

    pub const fn new(ms: u64, seq: u64) -> Self {
        Self { ms, seq }
    }
}

impl fmt::Display for XId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ms, self.seq)
    }
}

impl FromStr for XId {
    type Err = XIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_xid(s)
    }
}

/// A textual stream id that is not `<ms>-<seq>`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum XIdParseError {
    #[error("stream id {0:?} has no '-' separator")]
    MissingSeparator(String),
    #[error("stream id {id:?} has an invalid {part} part")]
    InvalidPart { id: String, part: &'static str },
}

/// An id argument: a concrete id or one of the special tokens Redis accepts
/// in its place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XIdArg {
    /// `<ms>-<seq>`.
    Exact(XId),
    /// Milliseconds only. The sequence is wildcarded on range bounds and
    /// written as 0 everywhere else.
    Millis(u64),
    /// `-`, the smallest id in a range.
    Min,
    /// `+`, the largest id in a range.
    Max,
    /// `$`, the last entry currently in the stream.
    Last,
    /// `>`, entries never delivered to the group (XREADGROUP only).
    New,
    /// `*`, let the server assign the id (XADD only).
    Auto,
}

impl From<XId> for XIdArg {
    fn from(id: XId) -> Self {
        XIdArg::Exact(id)
    }
}

impl XIdArg {
    /// Token for a position where a sequence-less id denotes every sequence
    /// in that millisecond (XRANGE bounds, XPENDING ranges, XREAD cursors).
    pub(crate) fn range_token(&self) -> String {
        xidstr(self)
    }

    /// Token for a position where the id names a single entry (XADD target,
    /// XACK, XDEL, XCLAIM, XGROUP positions, XTRIM MINID).
    pub(crate) fn write_token(&self) -> String {
        match self {
            XIdArg::Millis(ms) => XId::new(*ms, 0).to_string(),
            other => xidstr(other),
        }
    }
}

/// Render an id argument. Special tokens pass through unchanged.
pub fn xidstr(id: &XIdArg) -> String {
    match id {
        XIdArg::Exact(id) => id.to_string(),
        XIdArg::Millis(ms) => ms.to_string(),
        XIdArg::Min => "-".to_string(),
        XIdArg::Max => "+".to_string(),
        XIdArg::Last => "$".to_string(),
        XIdArg::New => ">".to_string(),
        XIdArg::Auto => "*".to_string(),
    }
}

/// Parse `<ms>-<seq>`, both parts unsigned 64-bit decimal.
pub fn parse_xid(raw: &str) -> Result<XId, XIdParseError> {
    let (ms, seq) = raw
        .split_once('-')
        .ok_or_else(|| XIdParseError::MissingSeparator(raw.to_string()))?;
    let part = |s: &str, name: &'static str| {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(XIdParseError::InvalidPart {
                id: raw.to_string(),
                part: name,
            });
        }
        s.parse::<u64>().map_err(|_| XIdParseError::InvalidPart {
            id: raw.to_string(),
            part: name,
        })
    };
    Ok(XId::new(part(ms, "milliseconds")?, part(seq, "sequence")?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        for (ms, seq) in [(0, 0), (1526919030474, 55), (u64::MAX, u64::MAX), (7, u64::MAX)] {
            let rendered = xidstr(&XIdArg::Exact(XId::new(ms, seq)));
            assert_eq!(parse_xid(&rendered).unwrap(), XId::new(ms, seq));
        }
    }

    #[test]
    fn sentinels_pass_through() {
        assert_eq!(xidstr(&XIdArg::Min), "-");
        assert_eq!(xidstr(&XIdArg::Max), "+");
        assert_eq!(xidstr(&XIdArg::Last), "$");
        assert_eq!(xidstr(&XIdArg::New), ">");
        assert_eq!(xidstr(&XIdArg::Auto), "*");
    }

    #[test]
    fn millis_renders_by_position() {
        let id = XIdArg::Millis(1000);
        assert_eq!(id.range_token(), "1000");
        assert_eq!(id.write_token(), "1000-0");
        assert_eq!(XIdArg::Auto.write_token(), "*");
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(matches!(
            parse_xid("1526919030474"),
            Err(XIdParseError::MissingSeparator(_))
        ));
        for bad in ["-1", "1-", "a-1", "1-b", "1-2-3", "+1-2", "18446744073709551616-0", " 1-2"] {
            assert!(parse_xid(bad).is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn ordering_and_display() {
        assert!(XId::new(1, 5) < XId::new(2, 0));
        assert!(XId::new(2, 0) < XId::new(2, 1));
        assert_eq!(XId::new(3, 4).to_string(), "3-4");
        assert_eq!("3-4".parse::<XId>().unwrap(), XId::new(3, 4));
        assert_eq!(XIdArg::from(XId::MIN), XIdArg::Exact(XId::new(0, 0)));
    }
}
