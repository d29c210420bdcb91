use serde::Serialize;

use crate::GraphqlCursor;

/// Relay page info for a window of `edge_count` rows starting at `start_offset` in a connection of
/// `total_count` rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub start_cursor: Option<GraphqlCursor>,
    pub end_cursor: Option<GraphqlCursor>,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl PageInfo {
    pub fn new(start_offset: usize, edge_count: usize, total_count: usize) -> Self {
        let (start_cursor, end_cursor) = match edge_count {
            0 => (None, None),
            n => (
                Some(GraphqlCursor::from_offset(start_offset)),
                Some(GraphqlCursor::from_offset(start_offset.saturating_add(n - 1))),
            ),
        };

        Self {
            start_cursor,
            end_cursor,
            has_previous_page: start_offset > 0,
            has_next_page: start_offset.saturating_add(edge_count) < total_count,
        }
    }

    /// Page info for the window that follows `after`, the way a connection field receives it.
    pub fn after(after: Option<GraphqlCursor>, edge_count: usize, total_count: usize) -> Self {
        let start_offset = after.map(|cursor| cursor.offset().saturating_add(1)).unwrap_or(0);
        Self::new(start_offset, edge_count, total_count)
    }

    /// The cursor of the `index`-th edge of a window starting at `start_offset`.
    pub fn edge_cursor(start_offset: usize, index: usize) -> GraphqlCursor {
        GraphqlCursor::from_offset(start_offset.saturating_add(index))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::first_page(None, 2, 5, Some(0), Some(1), false, true)]
    #[case::middle_page(Some(1), 2, 5, Some(2), Some(3), true, true)]
    #[case::last_page(Some(2), 2, 5, Some(3), Some(4), true, false)]
    #[case::empty(None, 0, 0, None, None, false, false)]
    fn windows(
        #[case] after: Option<usize>,
        #[case] edge_count: usize,
        #[case] total_count: usize,
        #[case] start: Option<usize>,
        #[case] end: Option<usize>,
        #[case] has_previous_page: bool,
        #[case] has_next_page: bool,
    ) {
        let info = PageInfo::after(after.map(GraphqlCursor::from_offset), edge_count, total_count);

        assert_eq!(info.start_cursor.map(GraphqlCursor::offset), start);
        assert_eq!(info.end_cursor.map(GraphqlCursor::offset), end);
        assert_eq!(info.has_previous_page, has_previous_page);
        assert_eq!(info.has_next_page, has_next_page);
    }

    #[test]
    fn edge_cursors_are_absolute() {
        assert_eq!(PageInfo::edge_cursor(3, 2).offset(), 5);
    }

    #[test]
    fn windows_at_the_end_of_the_address_space() {
        let info = PageInfo::after(Some(GraphqlCursor::from_offset(usize::MAX)), 1, usize::MAX);

        assert_eq!(info.start_cursor.map(GraphqlCursor::offset), Some(usize::MAX));
        assert_eq!(info.end_cursor.map(GraphqlCursor::offset), Some(usize::MAX));
        assert!(!info.has_next_page);
    }
}
