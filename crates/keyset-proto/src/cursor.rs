//! Page cursors exchanged with clients.

use crate::error::Error;
use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// A pair of opaque page-boundary tokens.
///
/// `after` continues forward past the last row of a page; `before` continues
/// backward from its first row. When both are set, `after` wins.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize,
)]
pub struct Cursor {
    /// Token for the page after the current one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    /// Token for the page before the current one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
}

/// Which way a page request traverses the result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// No cursor: first page, no bound.
    Initial,
    /// Continue after an `after` token.
    Forward,
    /// Continue before a `before` token.
    Backward,
}

impl Direction {
    pub fn is_forward(self) -> bool {
        self == Direction::Forward
    }

    pub fn is_backward(self) -> bool {
        self == Direction::Backward
    }
}

impl Cursor {
    /// A cursor with neither bound (first page).
    pub fn new() -> Self {
        Self::default()
    }

    /// A cursor continuing after `token`.
    pub fn after(token: impl Into<String>) -> Self {
        Self {
            after: Some(token.into()),
            before: None,
        }
    }

    /// A cursor continuing before `token`.
    pub fn before(token: impl Into<String>) -> Self {
        Self {
            after: None,
            before: Some(token.into()),
        }
    }

    /// Check if neither bound is set.
    pub fn is_empty(&self) -> bool {
        self.after.is_none() && self.before.is_none()
    }

    /// The traversal direction implied by this cursor.
    pub fn direction(&self) -> Direction {
        if self.after.is_some() {
            Direction::Forward
        } else if self.before.is_some() {
            Direction::Backward
        } else {
            Direction::Initial
        }
    }

    /// The token that drives the current request, if any.
    pub fn active_token(&self) -> Option<&str> {
        self.after.as_deref().or(self.before.as_deref())
    }

    /// Serialize the cursor to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize a cursor from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(bytes)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction() {
        assert_eq!(Cursor::new().direction(), Direction::Initial);
        assert_eq!(Cursor::after("a").direction(), Direction::Forward);
        assert_eq!(Cursor::before("b").direction(), Direction::Backward);
    }

    #[test]
    fn test_after_takes_precedence() {
        let cursor = Cursor {
            after: Some("a".into()),
            before: Some("b".into()),
        };
        assert_eq!(cursor.direction(), Direction::Forward);
        assert_eq!(cursor.active_token(), Some("a"));
        assert!(!cursor.is_empty());
    }

    #[test]
    fn test_json_omits_missing_sides() {
        let json = serde_json::to_string(&Cursor::after("abc")).unwrap();
        assert_eq!(json, r#"{"after":"abc"}"#);

        let cursor: Cursor = serde_json::from_str("{}").unwrap();
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_bytes_roundtrip() {
        let cursor = Cursor {
            after: Some("next".into()),
            before: Some("prev".into()),
        };
        let bytes = cursor.to_bytes().unwrap();
        assert_eq!(Cursor::from_bytes(&bytes).unwrap(), cursor);
    }
}
