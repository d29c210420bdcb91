use graph_schema::{ConcreteEntityWalker, EntityWalker, Operations};
use serde_json::Map;

use super::{
    mutation::{nested_inputs, WriteMode, WriteTarget},
    object, Anchor, FilterParser, QueryFactory,
};
use crate::{
    auth::AuthenticationTarget,
    error::{Error, Result},
    ir::{Operation, UpdateOperation},
    request::ResolveTree,
};

/// Arguments of an update mutation applying one nested operation to relationships, keyed by
/// relationship name.
const NESTED_ARGUMENTS: [&str; 5] = ["create", "connect", "connectOrCreate", "disconnect", "delete"];

impl<'a> QueryFactory<'a> {
    pub(super) fn update(&self, entity: ConcreteEntityWalker<'a>, tree: &ResolveTree) -> Result<Operation> {
        self.authenticate(AuthenticationTarget::Entity(EntityWalker::Concrete(entity)), Operations::UPDATE)?;

        let filters = match tree.argument("where") {
            Some(input) => FilterParser::user()
                .concrete_where(entity, object("where", input)?)?
                .into_iter()
                .collect(),
            None => Vec::new(),
        };

        let empty = Map::new();

        let input = match tree.argument("update") {
            Some(input) => object("update", input)?,
            None => &empty,
        };

        let writes = self.writes(WriteTarget::Node(entity), WriteMode::Update, input)?;
        let mut mutations = Vec::new();

        for (relationship, value) in writes.relationships {
            let inputs = nested_inputs(relationship, value, None)?;
            mutations.extend(self.relationship_mutations(entity, relationship, inputs, WriteMode::Update)?);
        }

        for argument in NESTED_ARGUMENTS {
            let Some(input) = tree.argument(argument) else {
                continue;
            };

            for (key, value) in object(argument, input)? {
                let relationship = entity.find_relationship(key).ok_or_else(|| Error::UnknownRelationship {
                    entity: entity.name().to_string(),
                    relationship: key.clone(),
                })?;

                let inputs = nested_inputs(relationship, value, Some(argument))?;
                mutations.extend(self.relationship_mutations(entity, relationship, inputs, WriteMode::Update)?);
            }
        }

        Ok(Operation::Update(UpdateOperation {
            entity: entity.name().to_string(),
            selection: Anchor::Root.selection(entity),
            filters,
            authorization: self.authorizer.filters(entity, &writes.attributes, Operations::UPDATE)?,
            properties: writes.properties,
            mutations,
            projection: self.projection(entity, tree)?,
        }))
    }
}
