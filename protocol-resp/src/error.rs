//! Error types for RESP reply parsing.

/// Error type for RESP parsing operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Need more data to complete parsing.
    /// This is not a fatal error - the caller should buffer more data and retry.
    #[error("incomplete data")]
    Incomplete,

    /// Invalid type prefix byte.
    #[error("invalid prefix byte: {0:#04x}")]
    InvalidPrefix(u8),

    /// Invalid integer format.
    #[error("invalid integer: {0}")]
    InvalidInteger(String),

    /// Protocol violation.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Collection size exceeds maximum allowed limit.
    #[error("collection too large: {0} elements exceeds limit")]
    CollectionTooLarge(usize),

    /// Nesting depth exceeds maximum allowed limit.
    #[error("nesting too deep: depth {0} exceeds limit")]
    NestingTooDeep(usize),

    /// Bulk string exceeds maximum allowed size.
    #[error("bulk string too long: {len} bytes exceeds {max} byte limit")]
    BulkStringTooLong { len: usize, max: usize },

    /// Invalid floating point number (RESP3).
    #[cfg(feature = "resp3")]
    #[error("invalid double: {0}")]
    InvalidDouble(String),

    /// Invalid boolean value (RESP3).
    #[cfg(feature = "resp3")]
    #[error("invalid boolean: expected 't' or 'f'")]
    InvalidBoolean,
}

impl ParseError {
    /// Returns true if this error indicates more data is needed.
    #[inline]
    pub fn is_incomplete(&self) -> bool {
        matches!(self, ParseError::Incomplete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_incomplete() {
        assert!(ParseError::Incomplete.is_incomplete());
        assert!(!ParseError::InvalidPrefix(0x00).is_incomplete());
        assert!(!ParseError::InvalidInteger("12a".to_string()).is_incomplete());
        assert!(!ParseError::Protocol("missing CRLF".to_string()).is_incomplete());
        assert!(!ParseError::CollectionTooLarge(100).is_incomplete());
        assert!(!ParseError::NestingTooDeep(9).is_incomplete());
        assert!(!ParseError::BulkStringTooLong { len: 100, max: 50 }.is_incomplete());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(ParseError::Incomplete.to_string(), "incomplete data");
        assert_eq!(
            ParseError::InvalidPrefix(0x40).to_string(),
            "invalid prefix byte: 0x40"
        );
        assert_eq!(
            ParseError::BulkStringTooLong { len: 10, max: 4 }.to_string(),
            "bulk string too long: 10 bytes exceeds 4 byte limit"
        );
        assert_eq!(
            ParseError::NestingTooDeep(8).to_string(),
            "nesting too deep: depth 8 exceeds limit"
        );
    }

    #[cfg(feature = "resp3")]
    #[test]
    fn test_resp3_errors() {
        assert!(!ParseError::InvalidDouble("x".to_string()).is_incomplete());
        assert_eq!(
            ParseError::InvalidBoolean.to_string(),
            "invalid boolean: expected 't' or 'f'"
        );
    }
}
