//! Factories turn the resolve tree of one requested field into an [`Operation`]. Every name is
//! resolved against the schema here and authentication is checked before anything is built, so
//! emission only deals with resolved storage names and labels.

mod aggregate;
mod connection;
mod delete;
mod fields;
mod filter;
mod mutation;
mod read;
mod search;
mod sort;
mod update;

pub(crate) use filter::FilterParser;

use graph_schema::{
    ConcreteEntityWalker, EntityWalker, Operations, RelationshipDirection, RelationshipWalker, RootField,
    RootFieldKind, Schema,
};
use serde_json::{Map, Value};

use crate::{
    auth::{AuthenticationTarget, Authorizer},
    cypher::Direction,
    error::{Error, Result},
    ir::{NodeTarget, Operation, Selection},
    request::ResolveTree,
};

pub(crate) struct QueryFactory<'a> {
    schema: &'a Schema,
    authorizer: Authorizer<'a>,
}

/// Where the nodes of an operation are found.
#[derive(Debug, Clone, Copy)]
pub(super) enum Anchor<'a> {
    /// Anywhere in the graph.
    Root,
    /// Related to the node in scope of the parent operation.
    Relationship {
        relationship: RelationshipWalker<'a>,
        direction: Direction,
    },
}

impl<'a> Anchor<'a> {
    /// A traversal honouring the query direction policy of the relationship and the `directed`
    /// argument of the field.
    fn traversal(relationship: RelationshipWalker<'a>, field: &ResolveTree) -> Self {
        let directed = field.argument("directed").and_then(Value::as_bool);

        Anchor::Relationship {
            relationship,
            direction: query_direction(relationship, directed),
        }
    }

    /// A traversal along the stored edge, as mutations always are.
    fn stored(relationship: RelationshipWalker<'a>) -> Self {
        Anchor::Relationship {
            relationship,
            direction: stored_direction(relationship),
        }
    }

    fn selection(self, member: ConcreteEntityWalker<'a>) -> Selection {
        let target = NodeTarget::labels(member.labels());

        match self {
            Anchor::Root => Selection::Node { target },
            Anchor::Relationship {
                relationship,
                direction,
            } => Selection::Relationship {
                edge_type: relationship.edge_type().to_string(),
                direction,
                target,
            },
        }
    }

    fn relationship(self) -> Option<RelationshipWalker<'a>> {
        match self {
            Anchor::Root => None,
            Anchor::Relationship { relationship, .. } => Some(relationship),
        }
    }
}

pub(super) fn stored_direction(relationship: RelationshipWalker<'_>) -> Direction {
    match relationship.direction() {
        RelationshipDirection::Out => Direction::Right,
        RelationshipDirection::In => Direction::Left,
    }
}

pub(super) fn query_direction(relationship: RelationshipWalker<'_>, directed: Option<bool>) -> Direction {
    match relationship.query_direction().is_directed(directed) {
        true => stored_direction(relationship),
        false => Direction::Both,
    }
}

/// The labels of any node an entity stands for.
pub(super) fn node_target(entity: EntityWalker<'_>) -> NodeTarget {
    match entity {
        EntityWalker::Concrete(entity) => NodeTarget::labels(entity.labels()),
        _ => NodeTarget::any_of(
            entity
                .concrete_entities()
                .into_iter()
                .map(|member| member.labels().to_vec())
                .collect(),
        ),
    }
}

/// Type conditions a selection set of the member can be written under.
pub(super) fn type_conditions(member: ConcreteEntityWalker<'_>) -> Vec<&str> {
    std::iter::once(member.name())
        .chain(member.interfaces().map(|interface| interface.name()))
        .chain(member.unions().map(|union| union.name()))
        .collect()
}

pub(super) fn object<'v>(argument: &str, value: &'v Value) -> Result<&'v Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| Error::invalid_argument(argument, "expected an input object"))
}

/// Input objects given either alone or as a list.
pub(super) fn objects<'v>(argument: &str, value: &'v Value) -> Result<Vec<&'v Map<String, Value>>> {
    match value {
        Value::Array(values) => values.iter().map(|value| object(argument, value)).collect(),
        Value::Null => Ok(Vec::new()),
        value => Ok(vec![object(argument, value)?]),
    }
}

impl<'a> QueryFactory<'a> {
    pub fn new(schema: &'a Schema, authorizer: Authorizer<'a>) -> Self {
        Self { schema, authorizer }
    }

    pub fn root(&self, root: &RootField, tree: &ResolveTree) -> Result<Operation> {
        let entity = self.schema.entity(root.entity);

        let operations = match root.kind {
            RootFieldKind::Aggregate => Operations::AGGREGATE,
            RootFieldKind::Create => Operations::CREATE,
            RootFieldKind::Update => Operations::UPDATE,
            RootFieldKind::Delete => Operations::DELETE,
            _ => Operations::READ,
        };

        self.authenticate(AuthenticationTarget::Schema(self.schema), operations)?;

        match &root.kind {
            RootFieldKind::Read => self.read(Anchor::Root, entity, tree),
            RootFieldKind::Connection => self.connection(Anchor::Root, entity, tree),
            RootFieldKind::Aggregate => self.aggregate(Anchor::Root, entity, tree),
            RootFieldKind::Create => self.create(self.mutated(entity, tree)?, tree),
            RootFieldKind::Update => self.update(self.mutated(entity, tree)?, tree),
            RootFieldKind::Delete => self.delete(self.mutated(entity, tree)?, tree),
            RootFieldKind::Fulltext(index) => self.fulltext_root(entity, index, tree),
            RootFieldKind::Vector(index) => self.vector_root(entity, index, tree),
        }
    }

    fn mutated(&self, entity: EntityWalker<'a>, tree: &ResolveTree) -> Result<ConcreteEntityWalker<'a>> {
        entity
            .as_concrete()
            .ok_or_else(|| Error::UnknownRootField(tree.name.clone()))
    }

    fn authenticate(&self, target: AuthenticationTarget<'_>, operations: Operations) -> Result<()> {
        self.authorizer.authenticate(target, operations)
    }

    fn authenticate_entity(&self, entity: EntityWalker<'_>, operations: Operations) -> Result<()> {
        self.authenticate(AuthenticationTarget::Entity(entity), operations)?;

        if entity.is_composite() {
            for member in entity.concrete_entities() {
                self.authenticate(AuthenticationTarget::Entity(EntityWalker::Concrete(member)), operations)?;
            }
        }

        Ok(())
    }

    /// The concrete entities a read of `entity` fans out to, with the part of the `where`
    /// argument applying to each. Interfaces are narrowed by `typename_IN`, unions by the
    /// members their `where` names.
    fn members<'w>(
        &self,
        entity: EntityWalker<'a>,
        filter: Option<&'w Value>,
    ) -> Result<Vec<(ConcreteEntityWalker<'a>, Option<&'w Map<String, Value>>)>> {
        let filter = filter.map(|value| object("where", value)).transpose()?;

        let members = match entity {
            EntityWalker::Concrete(entity) => vec![(entity, filter)],
            EntityWalker::Interface(interface) => {
                let typenames = filter
                    .and_then(|filter| filter.get("typename_IN"))
                    .and_then(Value::as_array);

                interface
                    .implementors()
                    .filter(|member| match typenames {
                        Some(names) => names.iter().any(|name| name.as_str() == Some(member.name())),
                        None => true,
                    })
                    .map(|member| (member, filter))
                    .collect()
            }
            EntityWalker::Union(union) => match filter.filter(|filter| !filter.is_empty()) {
                Some(filter) => {
                    let mut members = Vec::new();

                    for (name, value) in filter {
                        let member = union.find_member(name).ok_or_else(|| Error::UnknownEntity {
                            entity: name.clone(),
                            parent: union.name().to_string(),
                        })?;

                        members.push((member, Some(object(name, value)?)));
                    }

                    members
                }
                None => union.members().map(|member| (member, None)).collect(),
            },
        };

        if entity.is_composite() {
            tracing::trace!(
                entity = entity.name(),
                members = ?members.iter().map(|(member, _)| member.name()).collect::<Vec<_>>(),
                "fanning out"
            );
        }

        Ok(members)
    }
}
