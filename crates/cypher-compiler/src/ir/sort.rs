use super::PropertyOwner;
use crate::cypher::Order;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Sort {
    pub key: SortKey,
    pub order: Order,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SortKey {
    Property { owner: PropertyOwner, property: String },
    Score,
    /// A key of the projected row, used once the rows of several entities are combined.
    Projected(Vec<String>),
}

/// Skip and limit, resolved from the request and clamped by the entity limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Pagination {
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

impl Pagination {
    pub fn is_empty(&self) -> bool {
        self.skip.is_none() && self.limit.is_none()
    }
}
