use graph_schema::AttributeType;
use serde_json::Value;

use super::{AuthorizationFilters, DeleteOperation, Field, Filter, NodeTarget};
use crate::cypher::Direction;

/// An assignment to a stored property.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PropertyWrite {
    pub property: String,
    pub ty: AttributeType,
    pub value: WriteValue,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum WriteValue {
    Value(Value),
    Math(MathOperator, Value),
    /// Appends to a list property.
    Push(Value),
    /// Removes that many elements from the end of a list property.
    Pop(Value),
    RandomUuid,
    /// The current instant, converted to the attribute type.
    Now,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MathOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl MathOperator {
    /// Splits `released_INCREMENT` into `released` and its operator.
    pub fn split(key: &str) -> Option<(&str, MathOperator)> {
        const SUFFIXES: [(&str, MathOperator); 6] = [
            ("_INCREMENT", MathOperator::Add),
            ("_DECREMENT", MathOperator::Subtract),
            ("_ADD", MathOperator::Add),
            ("_SUBTRACT", MathOperator::Subtract),
            ("_MULTIPLY", MathOperator::Multiply),
            ("_DIVIDE", MathOperator::Divide),
        ];

        SUFFIXES
            .iter()
            .find_map(|(suffix, operator)| key.strip_suffix(suffix).map(|prefix| (prefix, *operator)))
    }
}

/// A node to create, with the relationships created from it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CreateInput {
    pub entity: String,
    pub labels: Vec<String>,
    pub properties: Vec<PropertyWrite>,
    pub mutations: Vec<RelationshipMutation>,
    /// Checked once the node and its relationships exist.
    pub validate_after: Option<Filter>,
}

/// A nested mutation through one relationship of the node in scope.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RelationshipMutation {
    pub relationship: String,
    pub edge_type: String,
    /// Direction of the stored edge, seen from the node in scope.
    pub direction: Direction,
    pub mutation: NestedMutation,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NestedMutation {
    Create {
        node: CreateInput,
        edge: Vec<PropertyWrite>,
    },
    Connect {
        target: NodeTarget,
        filter: Option<Filter>,
        authorization: AuthorizationFilters,
        /// Validation of the node in scope, which gains a relationship.
        source_validation: Option<Filter>,
        edge: Vec<PropertyWrite>,
        nested: Vec<RelationshipMutation>,
    },
    ConnectOrCreate(ConnectOrCreate),
    Update(UpdateInput),
    Disconnect(DisconnectMutation),
    Delete(DeleteOperation),
}

/// Merges the node identified by its unique properties, then the relationship to it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ConnectOrCreate {
    pub labels: Vec<String>,
    pub unique: Vec<(String, Value)>,
    pub on_create: Vec<PropertyWrite>,
    pub edge: Vec<PropertyWrite>,
}

/// Updates the related nodes, and the edges to them, matching a filter.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct UpdateInput {
    pub target: NodeTarget,
    pub filter: Option<Filter>,
    pub authorization: AuthorizationFilters,
    pub node: Vec<PropertyWrite>,
    pub edge: Vec<PropertyWrite>,
    pub nested: Vec<RelationshipMutation>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DisconnectMutation {
    pub target: NodeTarget,
    pub filter: Option<Filter>,
    pub authorization: AuthorizationFilters,
    pub source_validation: Option<Filter>,
}

/// The mutated nodes read back for the response.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResultProjection {
    pub fields: Vec<Field>,
    pub authorization: AuthorizationFilters,
}
