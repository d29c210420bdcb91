//! Relay-style cursors. A cursor is the base64 encoding of a zero-based row offset inside a
//! connection, so `after` arguments can be turned back into a `SKIP` without any server state.

mod page_info;

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

pub use page_info::PageInfo;

const PREFIX: &str = "arrayconnection:";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CursorError {
    #[error("Cursor `{0}` is not valid base64")]
    Encoding(String),
    #[error("Cursor `{0}` does not point to a connection offset")]
    Malformed(String),
    #[error("Cursor `{0}` points past the last addressable row")]
    OutOfRange(String),
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GraphqlCursor(usize);

impl GraphqlCursor {
    pub fn from_offset(offset: usize) -> Self {
        Self(offset)
    }

    pub fn offset(self) -> usize {
        self.0
    }

    /// Decodes a cursor handed out by [`GraphqlCursor::encode`]. Anything that would not be
    /// produced by encoding an offset is rejected, including non-canonical numbers.
    pub fn decode(cursor: &str) -> Result<Self, CursorError> {
        let bytes = STANDARD
            .decode(cursor)
            .map_err(|_| CursorError::Encoding(cursor.to_string()))?;

        let decoded = String::from_utf8(bytes).map_err(|_| CursorError::Malformed(cursor.to_string()))?;

        let offset = decoded
            .strip_prefix(PREFIX)
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse::<usize>().ok())
            .ok_or_else(|| CursorError::Malformed(cursor.to_string()))?;

        let this = Self(offset);

        if this.encode() != cursor {
            return Err(CursorError::Malformed(cursor.to_string()));
        }

        Ok(this)
    }

    pub fn encode(self) -> String {
        STANDARD.encode(format!("{PREFIX}{}", self.0))
    }

    /// The offset of the first row after this cursor, `None` for the last addressable offset.
    pub fn next_offset(self) -> Option<usize> {
        self.0.checked_add(1)
    }
}

impl fmt::Display for GraphqlCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl TryFrom<String> for GraphqlCursor {
    type Error = CursorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::decode(&value)
    }
}

impl From<GraphqlCursor> for String {
    fn from(cursor: GraphqlCursor) -> Self {
        cursor.encode()
    }
}

pub fn offset_to_cursor(offset: usize) -> String {
    GraphqlCursor::from_offset(offset).encode()
}

pub fn cursor_to_offset(cursor: &str) -> Result<usize, CursorError> {
    GraphqlCursor::decode(cursor).map(GraphqlCursor::offset)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[test]
    fn encodes_like_relay() {
        assert_eq!(offset_to_cursor(0), "YXJyYXljb25uZWN0aW9uOjA=");
        assert_eq!(offset_to_cursor(10), "YXJyYXljb25uZWN0aW9uOjEw");
    }

    #[rstest]
    #[case::empty("")]
    #[case::not_base64("not a cursor!")]
    #[case::wrong_prefix("Y29ubmVjdGlvbjow")]
    #[case::no_digits("YXJyYXljb25uZWN0aW9uOg==")]
    #[case::negative("YXJyYXljb25uZWN0aW9uOi0x")]
    #[case::leading_zero("YXJyYXljb25uZWN0aW9uOjAx")]
    #[case::missing_padding("YXJyYXljb25uZWN0aW9uOjA")]
    fn rejects_foreign_strings(#[case] cursor: &str) {
        assert!(GraphqlCursor::decode(cursor).is_err());
    }

    #[test]
    fn serde_goes_through_the_encoded_form() {
        let cursor = GraphqlCursor::from_offset(3);
        let json = serde_json::to_string(&cursor).unwrap();

        assert_eq!(json, "\"YXJyYXljb25uZWN0aW9uOjM=\"");
        assert_eq!(serde_json::from_str::<GraphqlCursor>(&json).unwrap(), cursor);
        assert!(serde_json::from_str::<GraphqlCursor>("\"nope\"").is_err());
    }

    #[test]
    fn the_last_offset_has_no_successor() {
        let cursor = GraphqlCursor::decode(&offset_to_cursor(usize::MAX)).unwrap();

        assert_eq!(cursor.offset(), usize::MAX);
        assert_eq!(cursor.next_offset(), None);
        assert_eq!(GraphqlCursor::from_offset(4).next_offset(), Some(5));
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(offset in any::<usize>()) {
            prop_assert_eq!(cursor_to_offset(&offset_to_cursor(offset)), Ok(offset));
        }

        #[test]
        fn arbitrary_strings_never_panic(input in ".*") {
            if let Ok(offset) = cursor_to_offset(&input) {
                prop_assert_eq!(offset_to_cursor(offset), input);
            }
        }
    }
}
