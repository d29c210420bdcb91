use super::{
    AggregateField, CreateInput, Field, Filter, Pagination, PropertyWrite, RelationshipMutation, ResultProjection,
    Selection, Sort,
};

/// The compiled unit of work of one requested field.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operation {
    Read(ReadOperation),
    Connection(ConnectionOperation),
    Aggregate(AggregateOperation),
    CompositeRead(CompositeReadOperation),
    CompositeConnection(CompositeConnectionOperation),
    CompositeAggregate(CompositeAggregateOperation),
    Create(CreateOperation),
    Update(UpdateOperation),
    Delete(DeleteOperation),
}

impl Operation {
    pub fn is_mutation(&self) -> bool {
        matches!(self, Operation::Create(_) | Operation::Update(_) | Operation::Delete(_))
    }
}

/// Predicates derived from authorization rules. `filter` narrows the match like a user filter,
/// the validations abort the query when they do not hold for a matched row.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct AuthorizationFilters {
    pub filter: Option<Filter>,
    pub validate_before: Option<Filter>,
    pub validate_after: Option<Filter>,
}

impl AuthorizationFilters {
    pub fn is_empty(&self) -> bool {
        self.filter.is_none() && self.validate_before.is_none() && self.validate_after.is_none()
    }

    /// Both sets must hold.
    pub fn merge(self, other: AuthorizationFilters) -> AuthorizationFilters {
        let both = |a: Option<Filter>, b: Option<Filter>| Filter::all(a.into_iter().chain(b));

        AuthorizationFilters {
            filter: both(self.filter, other.filter),
            validate_before: both(self.validate_before, other.validate_before),
            validate_after: both(self.validate_after, other.validate_after),
        }
    }
}

/// Whether a nested read yields a list or a single, possibly null, value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum Cardinality {
    #[default]
    Many,
    One,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ReadOperation {
    pub entity: String,
    pub selection: Selection,
    pub filters: Vec<Filter>,
    pub authorization: AuthorizationFilters,
    pub fields: Vec<Field>,
    pub sort: Vec<Sort>,
    pub pagination: Pagination,
    pub cardinality: Cardinality,
}

/// Paginated edges with a total count.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ConnectionOperation {
    pub entity: String,
    pub selection: Selection,
    pub filters: Vec<Filter>,
    pub authorization: AuthorizationFilters,
    /// Response key of the edge list and the fields of one edge.
    pub edges: Option<(String, Vec<Field>)>,
    pub total_count: Option<String>,
    pub sort: Vec<Sort>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AggregateOperation {
    pub entity: String,
    pub selection: Selection,
    pub filters: Vec<Filter>,
    pub authorization: AuthorizationFilters,
    pub fields: Vec<AggregateField>,
    /// The aggregated node properties as `(key, stored property)`. Differs from the key when a
    /// member of a composite entity stores the attribute under a name of its own.
    pub properties: Vec<(String, String)>,
}

/// A read of an interface or a union: one child per concrete entity, combined into one list.
/// Sort and pagination apply to the combined rows.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CompositeReadOperation {
    pub entity: String,
    pub children: Vec<ReadOperation>,
    pub sort: Vec<Sort>,
    pub pagination: Pagination,
    pub cardinality: Cardinality,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CompositeConnectionOperation {
    pub entity: String,
    /// The edge fields of each child are its edge projection. Children carry no sort or
    /// pagination of their own.
    pub children: Vec<ConnectionOperation>,
    pub edges: Option<String>,
    pub total_count: Option<String>,
    pub sort: Vec<Sort>,
    pub pagination: Pagination,
}

/// An aggregation over the union of the matches of every child. Children carry no fields.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CompositeAggregateOperation {
    pub entity: String,
    pub children: Vec<AggregateOperation>,
    pub fields: Vec<AggregateField>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CreateOperation {
    pub entity: String,
    pub inputs: Vec<CreateInput>,
    pub projection: Option<ResultProjection>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct UpdateOperation {
    pub entity: String,
    pub selection: Selection,
    pub filters: Vec<Filter>,
    pub authorization: AuthorizationFilters,
    pub properties: Vec<PropertyWrite>,
    pub mutations: Vec<RelationshipMutation>,
    pub projection: Option<ResultProjection>,
}

/// Deletes the matched nodes, after the nested deletes reached from them.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DeleteOperation {
    pub entity: String,
    pub selection: Selection,
    pub filters: Vec<Filter>,
    pub authorization: AuthorizationFilters,
    pub nested: Vec<DeleteOperation>,
}

impl DeleteOperation {
    /// Levels of the cascade, this one included.
    pub fn depth(&self) -> usize {
        1 + self.nested.iter().map(DeleteOperation::depth).max().unwrap_or(0)
    }
}
