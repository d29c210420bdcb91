use graph_schema::{AttributeWalker, ConcreteEntityWalker, Operations, RelationshipWalker};

use super::{type_conditions, Anchor, QueryFactory};
use crate::{
    auth::AuthenticationTarget,
    error::{Error, Result},
    ir::{Field, PropertyOwner},
    request::ResolveTree,
};

/// The projection of a node, and the attributes it reads. Rules of those attributes join the
/// authorization of the node.
pub(super) struct NodeFields<'a> {
    pub fields: Vec<Field>,
    pub attributes: Vec<AttributeWalker<'a>>,
}

#[derive(Debug, Clone, Copy)]
enum RelationshipField {
    Read,
    Connection,
    Aggregate,
}

fn relationship_field<'a>(
    entity: ConcreteEntityWalker<'a>,
    name: &str,
) -> Option<(RelationshipWalker<'a>, RelationshipField)> {
    if let Some(relationship) = entity.find_relationship(name) {
        return Some((relationship, RelationshipField::Read));
    }

    entity.relationships().find_map(|relationship| {
        let names = relationship.names();

        if names.connection_field == name {
            Some((relationship, RelationshipField::Connection))
        } else if names.aggregate_field == name && relationship.is_aggregable() {
            Some((relationship, RelationshipField::Aggregate))
        } else {
            None
        }
    })
}

impl<'a> QueryFactory<'a> {
    pub(super) fn node_fields(&self, entity: ConcreteEntityWalker<'a>, tree: &ResolveTree) -> Result<NodeFields<'a>> {
        let mut fields = Vec::new();
        let mut attributes = Vec::new();

        for field in tree.fields_for(&type_conditions(entity)) {
            let alias = field.response_key().to_string();

            if field.name == "__typename" {
                fields.push(Field::Typename {
                    alias,
                    type_name: entity.name().to_string(),
                });

                continue;
            }

            if let Some(attribute) = entity.find_attribute(&field.name) {
                self.authenticate(AuthenticationTarget::Attribute(attribute), Operations::READ)?;

                fields.push(Field::Attribute {
                    alias,
                    owner: PropertyOwner::Node,
                    property: attribute.storage_name().to_string(),
                });

                attributes.push(attribute);
                continue;
            }

            let (relationship, kind) =
                relationship_field(entity, &field.name).ok_or_else(|| Error::unknown_field(entity.name(), &field.name))?;

            self.authenticate(AuthenticationTarget::Relationship(relationship), Operations::READ)?;

            let anchor = Anchor::traversal(relationship, field);
            let target = relationship.target();

            let operation = match kind {
                RelationshipField::Read => self.read(anchor, target, field)?,
                RelationshipField::Connection => self.connection(anchor, target, field)?,
                RelationshipField::Aggregate => self.aggregate(anchor, target, field)?,
            };

            fields.push(Field::Operation {
                alias,
                operation: Box::new(operation),
            });
        }

        Ok(NodeFields { fields, attributes })
    }

    /// Properties of the edge leading to the node in scope.
    pub(super) fn edge_fields(&self, relationship: RelationshipWalker<'a>, tree: &ResolveTree) -> Result<Vec<Field>> {
        tree.all_fields()
            .into_iter()
            .map(|field| self.edge_field(relationship, field))
            .collect()
    }

    pub(super) fn edge_field(&self, relationship: RelationshipWalker<'a>, field: &ResolveTree) -> Result<Field> {
        let alias = field.response_key().to_string();

        if field.name == "__typename" {
            let type_name = relationship
                .properties()
                .map(|properties| properties.name())
                .unwrap_or(relationship.names().relationship_type.as_str());

            return Ok(Field::Typename {
                alias,
                type_name: type_name.to_string(),
            });
        }

        let attribute = relationship
            .find_attribute(&field.name)
            .ok_or_else(|| Error::unknown_field(&relationship.names().relationship_type, &field.name))?;

        self.authenticate(AuthenticationTarget::Attribute(attribute), Operations::READ)?;

        Ok(Field::Attribute {
            alias,
            owner: PropertyOwner::Edge,
            property: attribute.storage_name().to_string(),
        })
    }
}

/// Projects `property` into the row of a composite child under a key of its own, so the
/// combined rows can be ordered by it whatever the selection aliases. Returns the key to order by.
pub(super) fn project_attribute(fields: &mut Vec<Field>, name: &str, property: &str, owner: PropertyOwner) -> Vec<String> {
    let key = format!("__sort_{name}");

    if !fields.iter().any(|field| field.alias() == key) {
        fields.push(Field::Attribute {
            alias: key.clone(),
            owner,
            property: property.to_string(),
        });
    }

    vec![key]
}
