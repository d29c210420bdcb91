use serde::{Deserialize, Serialize};

use crate::{
    names::RelationshipNames, AttributeId, AuthenticationRule, ConcreteEntityId, EntityId, IdRange,
    InterfaceEntityId, RelationshipDeclarationId, RelationshipId, RelationshipPropertiesId,
};

/// Which way the stored edge points, seen from the source entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipDirection {
    In,
    Out,
}

impl RelationshipDirection {
    pub fn inverse(self) -> Self {
        match self {
            Self::In => Self::Out,
            Self::Out => Self::In,
        }
    }
}

/// Whether traversals honour the stored edge direction, and whether a request may override it
/// with a `directed` argument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryDirection {
    DirectedOnly,
    UndirectedOnly,
    #[default]
    DefaultDirected,
    DefaultUndirected,
}

impl QueryDirection {
    /// Resolves the policy against the request override, returning `true` for a directed
    /// traversal. The `*_ONLY` policies ignore the override.
    pub fn is_directed(self, directed: Option<bool>) -> bool {
        match self {
            Self::DirectedOnly => true,
            Self::UndirectedOnly => false,
            Self::DefaultDirected => directed.unwrap_or(true),
            Self::DefaultUndirected => directed.unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter, strum::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "camelCase")]
pub enum NestedOperation {
    Create,
    Connect,
    ConnectOrCreate,
    Update,
    Disconnect,
    Delete,
}

impl NestedOperation {
    pub fn all() -> Vec<Self> {
        use strum::IntoEnumIterator;
        Self::iter().collect()
    }
}

bitflags::bitflags! {
    /// Nested mutations a relationship field accepts.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NestedOperations: u8 {
        const CREATE = 1;
        const CONNECT = 1 << 1;
        const CONNECT_OR_CREATE = 1 << 2;
        const UPDATE = 1 << 3;
        const DISCONNECT = 1 << 4;
        const DELETE = 1 << 5;
    }
}

impl From<NestedOperation> for NestedOperations {
    fn from(operation: NestedOperation) -> Self {
        match operation {
            NestedOperation::Create => Self::CREATE,
            NestedOperation::Connect => Self::CONNECT,
            NestedOperation::ConnectOrCreate => Self::CONNECT_OR_CREATE,
            NestedOperation::Update => Self::UPDATE,
            NestedOperation::Disconnect => Self::DISCONNECT,
            NestedOperation::Delete => Self::DELETE,
        }
    }
}

impl FromIterator<NestedOperation> for NestedOperations {
    fn from_iter<T: IntoIterator<Item = NestedOperation>>(iter: T) -> Self {
        iter.into_iter().map(NestedOperations::from).collect()
    }
}

#[derive(Debug, Clone)]
pub struct RelationshipRecord {
    pub(crate) name: String,
    pub(crate) source: ConcreteEntityId,
    pub(crate) target: EntityId,
    pub(crate) edge_type: String,
    pub(crate) direction: RelationshipDirection,
    pub(crate) query_direction: QueryDirection,
    pub(crate) list: bool,
    pub(crate) required: bool,
    pub(crate) nested_operations: NestedOperations,
    pub(crate) properties: Option<RelationshipPropertiesId>,
    pub(crate) aggregate: bool,
    pub(crate) authentication: Option<AuthenticationRule>,
    pub(crate) declaration: Option<RelationshipDeclarationId>,
    pub(crate) names: RelationshipNames,
}

/// The abstract signature of a relationship on an interface.
#[derive(Debug, Clone)]
pub struct RelationshipDeclarationRecord {
    pub(crate) name: String,
    pub(crate) interface: InterfaceEntityId,
    pub(crate) target: EntityId,
    pub(crate) list: bool,
    pub(crate) properties: Option<RelationshipPropertiesId>,
    /// Every concrete relationship implementing this declaration, in implementor order.
    pub(crate) implementations: Vec<RelationshipId>,
    /// The first interface, in declaration order, declaring a field of this name.
    pub(crate) first_declaring_interface: InterfaceEntityId,
    pub(crate) names: RelationshipNames,
}

#[derive(Debug, Clone)]
pub struct RelationshipPropertiesRecord {
    pub(crate) name: String,
    pub(crate) attributes: IdRange<AttributeId>,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(QueryDirection::DirectedOnly, [true, true, true])]
    #[case(QueryDirection::UndirectedOnly, [false, false, false])]
    #[case(QueryDirection::DefaultDirected, [true, true, false])]
    #[case(QueryDirection::DefaultUndirected, [false, true, false])]
    fn direction_policies(#[case] policy: QueryDirection, #[case] expected: [bool; 3]) {
        let resolved = [None, Some(true), Some(false)].map(|directed| policy.is_directed(directed));
        assert_eq!(resolved, expected);
    }

    #[test]
    fn nested_operations_from_declaration() {
        let operations: NestedOperations = [NestedOperation::Connect, NestedOperation::Delete].into_iter().collect();

        assert_eq!(operations, NestedOperations::CONNECT | NestedOperations::DELETE);
        assert_eq!(NestedOperation::ConnectOrCreate.to_string(), "connectOrCreate");
        assert_eq!(NestedOperation::all().into_iter().collect::<NestedOperations>(), NestedOperations::all());
    }
}
