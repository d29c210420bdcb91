//! The intermediate representation: what one requested field asks of the graph, resolved
//! against the schema, before any variable or parameter exists. Factories build it and
//! emission lowers it.

mod field;
mod filter;
mod mutation;
mod operation;
mod selection;
mod sort;

pub(crate) use field::{AggregateField, AggregateFunction, Field};
pub(crate) use filter::{ComparisonOperator, Filter, Operand, PropertyFilter, Quantifier, Traversal};
pub(crate) use mutation::{
    ConnectOrCreate, CreateInput, DisconnectMutation, MathOperator, NestedMutation, PropertyWrite, RelationshipMutation,
    ResultProjection, UpdateInput, WriteValue,
};
pub(crate) use operation::{
    AggregateOperation, AuthorizationFilters, Cardinality, CompositeAggregateOperation, CompositeConnectionOperation,
    CompositeReadOperation, ConnectionOperation, CreateOperation, DeleteOperation, Operation, ReadOperation,
    UpdateOperation,
};
pub(crate) use selection::{NodeTarget, Selection};
pub(crate) use sort::{Pagination, Sort, SortKey};

/// Whether a property lives on the node in scope or on the relationship leading to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PropertyOwner {
    Node,
    Edge,
}
