use graph_schema::{ConcreteEntityWalker, EntityWalker, NestedOperation, NestedOperations, Operations, RelationshipWalker};
use serde_json::{Map, Value};

use super::{mutation::nested_inputs, object, objects, Anchor, FilterParser, QueryFactory};
use crate::{
    auth::AuthenticationTarget,
    error::{Error, Result},
    ir::{DeleteOperation, Filter, Operation},
    request::ResolveTree,
};

impl<'a> QueryFactory<'a> {
    pub(super) fn delete(&self, entity: ConcreteEntityWalker<'a>, tree: &ResolveTree) -> Result<Operation> {
        let filters = match tree.argument("where") {
            Some(input) => FilterParser::user()
                .concrete_where(entity, object("where", input)?)?
                .into_iter()
                .collect(),
            None => Vec::new(),
        };

        let operation = self.delete_operation(Anchor::Root, entity, filters, tree.argument("delete"))?;

        tracing::trace!(entity = entity.name(), depth = operation.depth(), "delete cascade");

        Ok(Operation::Delete(operation))
    }

    /// Deletes the matches of `entity`, after the nodes the `delete` input reaches from them.
    fn delete_operation(
        &self,
        anchor: Anchor<'a>,
        entity: ConcreteEntityWalker<'a>,
        filters: Vec<Filter>,
        nested: Option<&Value>,
    ) -> Result<DeleteOperation> {
        self.authenticate(AuthenticationTarget::Entity(EntityWalker::Concrete(entity)), Operations::DELETE)?;

        let mut operations = Vec::new();

        if let Some(nested) = nested {
            for (key, value) in object("delete", nested)? {
                let relationship = entity.find_relationship(key).ok_or_else(|| Error::UnknownRelationship {
                    entity: entity.name().to_string(),
                    relationship: key.clone(),
                })?;

                self.authenticate(AuthenticationTarget::Relationship(relationship), Operations::DELETE)?;

                if !relationship.allows(NestedOperations::DELETE) {
                    return Err(Error::NestedOperationNotAllowed {
                        entity: entity.name().to_string(),
                        relationship: relationship.name().to_string(),
                        operation: NestedOperation::Delete.to_string(),
                    });
                }

                for (target, _, input) in nested_inputs(relationship, value, Some("delete"))? {
                    for item in objects(key, input)? {
                        operations.extend(self.nested_deletes(relationship, target, item)?);
                    }
                }
            }
        }

        Ok(DeleteOperation {
            entity: entity.name().to_string(),
            selection: anchor.selection(entity),
            filters,
            authorization: self.authorizer.filters(entity, &[], Operations::DELETE)?,
            nested: operations,
        })
    }

    /// `{ where: { node, edge }, delete: { ... } }`. An abstract target is deleted through each
    /// of its concrete entities.
    pub(super) fn nested_deletes(
        &self,
        relationship: RelationshipWalker<'a>,
        target: EntityWalker<'a>,
        item: &Map<String, Value>,
    ) -> Result<Vec<DeleteOperation>> {
        let parser = FilterParser::user();
        let input = item.get("where").map(|value| object("where", value)).transpose()?;

        let edge = match input.and_then(|input| input.get("edge")) {
            Some(edge) => parser.edge_where(relationship, object("edge", edge)?)?,
            None => None,
        };

        let mut operations = Vec::new();

        for (member, node) in self.members(target, input.and_then(|input| input.get("node")))? {
            let mut filters = Vec::new();

            if let Some(node) = node {
                filters.extend(parser.concrete_where(member, node)?);
            }

            filters.extend(edge.clone());

            operations.push(self.delete_operation(Anchor::stored(relationship), member, filters, item.get("delete"))?);
        }

        Ok(operations)
    }
}

#[cfg(test)]
mod tests {
    use graph_schema::Schema;
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::{
        auth::{Authorizer, DeclaredRules},
        AuthContext,
    };

    const SCHEMA: &str = r#"
        [[nodes]]
        name = "Movie"

        [[nodes.relationships]]
        name = "actors"
        target = "Actor"
        edge_type = "ACTED_IN"
        direction = "IN"
        list = true

        [[nodes]]
        name = "Actor"

        [[nodes.relationships]]
        name = "movies"
        target = "Movie"
        edge_type = "ACTED_IN"
        direction = "OUT"
        list = true
    "#;

    #[rstest]
    #[case::flat(None, 1)]
    #[case::one_level(Some(json!({ "movies": [{}] })), 2)]
    #[case::two_levels(Some(json!({ "movies": [{ "delete": { "actors": [{}] } }] })), 3)]
    #[case::widest_branch_counts(
        Some(json!({ "movies": [{}, { "delete": { "actors": [{ "delete": { "movies": [{}] } }] } }] })),
        4
    )]
    fn cascade_depth(#[case] delete: Option<Value>, #[case] depth: usize) {
        let schema = Schema::from_toml_str(SCHEMA).unwrap();
        let auth = AuthContext::anonymous();
        let factory = QueryFactory::new(&schema, Authorizer::new(&DeclaredRules, &auth));

        let mut tree = ResolveTree::new("deleteActors");

        if let Some(delete) = delete {
            tree = tree.arg("delete", delete);
        }

        let root = schema.root_field("deleteActors").unwrap();

        let Ok(Operation::Delete(operation)) = factory.root(root, &tree) else {
            unreachable!("expected a delete");
        };

        assert_eq!(operation.depth(), depth);
    }
}
