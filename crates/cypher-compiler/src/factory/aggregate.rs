use std::str::FromStr;

use graph_schema::{AttributeWalker, EntityWalker, Operations};

use super::{Anchor, FilterParser, QueryFactory};
use crate::{
    error::{Error, Result},
    ir::{AggregateField, AggregateFunction, AggregateOperation, CompositeAggregateOperation, Operation, PropertyOwner},
    request::ResolveTree,
};

impl<'a> QueryFactory<'a> {
    /// `count` and per-attribute aggregations. A relationship aggregation groups them under
    /// `node` and `edge`.
    pub(super) fn aggregate(&self, anchor: Anchor<'a>, entity: EntityWalker<'a>, tree: &ResolveTree) -> Result<Operation> {
        self.authenticate_entity(entity, Operations::AGGREGATE)?;

        let relationship = anchor.relationship();
        let members = self.members(entity, tree.argument("where"))?;

        let mut fields = Vec::new();
        let mut attributes = Vec::new();

        for field in tree.all_fields() {
            let alias = field.response_key().to_string();

            match (field.name.as_str(), relationship) {
                ("count", _) => fields.push(AggregateField::Count { alias }),
                ("__typename", _) => (),
                ("node", Some(_)) => {
                    let mut group = Vec::new();

                    for field in field.all_fields() {
                        let attribute = entity.find_attribute(&field.name);
                        group.push(attribute_aggregation(PropertyOwner::Node, entity.name(), attribute, field)?);
                        attributes.extend(attribute);
                    }

                    fields.push(AggregateField::Group { alias, fields: group });
                }
                ("edge", Some(relationship)) => {
                    let mut group = Vec::new();

                    for field in field.all_fields() {
                        let attribute = relationship.find_attribute(&field.name);
                        group.push(attribute_aggregation(
                            PropertyOwner::Edge,
                            &relationship.names().aggregate_selection,
                            attribute,
                            field,
                        )?);
                    }

                    fields.push(AggregateField::Group { alias, fields: group });
                }
                (name, None) => {
                    let attribute = entity.find_attribute(name);
                    fields.push(attribute_aggregation(PropertyOwner::Node, entity.name(), attribute, field)?);
                    attributes.extend(attribute);
                }
                (name, Some(relationship)) => {
                    return Err(Error::unknown_field(&relationship.names().aggregate_selection, name));
                }
            }
        }

        let mut children = Vec::with_capacity(members.len());

        for (member, filter) in members {
            let filters = match filter {
                Some(filter) => FilterParser::user().concrete_where(member, filter)?.into_iter().collect(),
                None => Vec::new(),
            };

            // Attributes of an abstract entity are redeclared by each of its members.
            let member_attributes: Vec<_> = attributes
                .iter()
                .filter_map(|attribute| member.find_attribute(attribute.name()))
                .collect();

            let mut properties: Vec<(String, String)> = Vec::with_capacity(attributes.len());

            for attribute in &attributes {
                let Some(stored) = member.find_attribute(attribute.name()) else {
                    continue;
                };

                if !properties.iter().any(|(key, _)| key == attribute.storage_name()) {
                    properties.push((attribute.storage_name().to_string(), stored.storage_name().to_string()));
                }
            }

            children.push(AggregateOperation {
                entity: member.name().to_string(),
                selection: anchor.selection(member),
                filters,
                authorization: self.authorizer.filters(member, &member_attributes, Operations::AGGREGATE)?,
                fields: Vec::new(),
                properties,
            });
        }

        if let (EntityWalker::Concrete(_), [_]) = (entity, children.as_slice()) {
            let mut operation = children.remove(0);
            operation.fields = fields;

            return Ok(Operation::Aggregate(operation));
        }

        Ok(Operation::CompositeAggregate(CompositeAggregateOperation {
            entity: entity.name().to_string(),
            children,
            fields,
        }))
    }
}

fn attribute_aggregation(
    owner: PropertyOwner,
    parent: &str,
    attribute: Option<AttributeWalker<'_>>,
    field: &ResolveTree,
) -> Result<AggregateField> {
    let attribute = attribute
        .filter(|attribute| attribute.is_aggregable())
        .ok_or_else(|| Error::unknown_field(parent, &field.name))?;

    let mut functions = Vec::new();

    for selection in field.all_fields() {
        if selection.name == "__typename" {
            continue;
        }

        let function = AggregateFunction::from_str(&selection.name)
            .ok()
            .filter(|function| function.supports(attribute.ty()))
            .ok_or_else(|| Error::unknown_field(attribute.name(), &selection.name))?;

        functions.push((selection.response_key().to_string(), function));
    }

    Ok(AggregateField::Attribute {
        alias: field.response_key().to_string(),
        owner,
        property: attribute.storage_name().to_string(),
        ty: attribute.ty().clone(),
        functions,
    })
}
