use graph_schema::{AttributeWalker, ConcreteEntityWalker, EntityWalker, Operations, RelationshipWalker};
use serde_json::{Map, Value};

use super::{
    fields::project_attribute,
    object,
    sort::{connection_pagination, resolve_sort, sort_fields, sortable, SortField, SortShape},
    Anchor, FilterParser, QueryFactory,
};
use crate::{
    error::{Error, Result},
    ir::{
        CompositeConnectionOperation, ConnectionOperation, Field, Filter, Operation, Pagination, PropertyOwner, Sort,
        SortKey,
    },
    request::ResolveTree,
};

/// What a connection selection asks for.
pub(super) struct ConnectionShape<'a> {
    pub edges: Option<(String, Vec<Field>)>,
    pub total_count: Option<String>,
    pub attributes: Vec<AttributeWalker<'a>>,
}

impl<'a> QueryFactory<'a> {
    pub(super) fn connection(&self, anchor: Anchor<'a>, entity: EntityWalker<'a>, tree: &ResolveTree) -> Result<Operation> {
        self.authenticate_entity(entity, Operations::READ)?;

        let search = self.search(anchor, entity, tree)?;
        let relationship = anchor.relationship();

        let input = tree.argument("where").map(|value| object("where", value)).transpose()?;

        // The `where` of a root connection is a node `where`, the one of a relationship
        // connection has `node` and `edge` parts.
        let node_input = match relationship {
            Some(_) => input.and_then(|input| input.get("node")),
            None => tree.argument("where"),
        };

        let members = self.members(entity, node_input)?;

        let shape = match (relationship, &search) {
            (Some(relationship), _) => SortShape::Wrapped {
                node: "node",
                edge: relationship.properties().is_some(),
                score: false,
            },
            (None, Some(_)) => SortShape::Wrapped {
                node: "node",
                edge: false,
                score: true,
            },
            (None, None) => SortShape::Node,
        };

        let sort = sort_fields(tree, shape)?;
        let edge_attribute = |name: &str| relationship.and_then(|relationship| relationship.find_attribute(name));

        if let EntityWalker::Concrete(entity) = entity {
            let pagination = connection_pagination(tree, entity.limit())?;

            let selection = match &search {
                Some(search) => search.selection(entity, pagination),
                None => anchor.selection(entity),
            };

            let node_filter = members.first().and_then(|(_, filter)| *filter);
            let shape = self.connection_shape(entity, relationship, tree, search.is_some())?;

            return Ok(Operation::Connection(ConnectionOperation {
                entity: entity.name().to_string(),
                selection,
                filters: self.connection_filters(entity, relationship, node_filter, input)?,
                authorization: self.authorizer.filters(entity, &shape.attributes, Operations::READ)?,
                edges: shape.edges,
                total_count: shape.total_count,
                sort: resolve_sort(&sort, |name| entity.find_attribute(name), edge_attribute)?,
                pagination,
            }));
        }

        let mut children = Vec::with_capacity(members.len());
        let mut combined_sort = Vec::new();
        let mut edges_alias = None;
        let mut total_count = None;

        for (member, node_filter) in members {
            let mut shape = self.connection_shape(member, relationship, tree, false)?;

            if let Some((alias, fields)) = &mut shape.edges {
                let mut child_sort = Vec::with_capacity(sort.len());

                for (field, order) in &sort {
                    let key = match field {
                        SortField::Node(name) => {
                            let property = sortable(name, member.find_attribute(name))?;
                            project_node_attribute(fields, name, &property)
                        }
                        SortField::Edge(name) => {
                            let property = sortable(name, edge_attribute(name))?;
                            project_attribute(fields, name, &property, PropertyOwner::Edge)
                        }
                        SortField::Score => continue,
                    };

                    child_sort.push(Sort {
                        key: SortKey::Projected(key),
                        order: *order,
                    });
                }

                combined_sort = child_sort;
                edges_alias = Some(alias.clone());
            }

            total_count = shape.total_count.clone();

            children.push(ConnectionOperation {
                entity: member.name().to_string(),
                selection: anchor.selection(member),
                filters: self.connection_filters(member, relationship, node_filter, input)?,
                authorization: self.authorizer.filters(member, &shape.attributes, Operations::READ)?,
                edges: shape.edges,
                total_count: shape.total_count,
                sort: Vec::new(),
                pagination: Pagination::default(),
            });
        }

        Ok(Operation::CompositeConnection(CompositeConnectionOperation {
            entity: entity.name().to_string(),
            children,
            edges: edges_alias,
            total_count,
            sort: combined_sort,
            pagination: connection_pagination(tree, entity.limit())?,
        }))
    }

    /// Reads `edges { cursor node { ... } properties { ... } }`, `totalCount` and `pageInfo`.
    /// Cursors and page info are derived from the offset and the total count once the rows
    /// are back, so page info implies the total count.
    pub(super) fn connection_shape(
        &self,
        entity: ConcreteEntityWalker<'a>,
        relationship: Option<RelationshipWalker<'a>>,
        tree: &ResolveTree,
        scored: bool,
    ) -> Result<ConnectionShape<'a>> {
        let connection_type = match relationship {
            Some(relationship) => relationship.names().connection_type.as_str(),
            None => entity.names().connection_type.as_str(),
        };

        let mut shape = ConnectionShape {
            edges: None,
            total_count: None,
            attributes: Vec::new(),
        };

        let mut page_info = false;

        for field in tree.all_fields() {
            match field.name.as_str() {
                "edges" => {
                    let fields = self.edge_shape(entity, relationship, field, scored, &mut shape.attributes)?;
                    shape.edges = Some((field.response_key().to_string(), fields));
                }
                "totalCount" => shape.total_count = Some(field.response_key().to_string()),
                "pageInfo" => page_info = true,
                "__typename" => (),
                name => return Err(Error::unknown_field(connection_type, name)),
            }
        }

        if page_info && shape.total_count.is_none() {
            shape.total_count = Some("totalCount".to_string());
        }

        Ok(shape)
    }

    fn edge_shape(
        &self,
        entity: ConcreteEntityWalker<'a>,
        relationship: Option<RelationshipWalker<'a>>,
        tree: &ResolveTree,
        scored: bool,
        attributes: &mut Vec<AttributeWalker<'a>>,
    ) -> Result<Vec<Field>> {
        let mut fields = Vec::new();

        for field in tree.all_fields() {
            let alias = field.response_key().to_string();

            match (field.name.as_str(), relationship) {
                ("cursor", _) => (),
                ("node", _) => {
                    let node = self.node_fields(entity, field)?;
                    attributes.extend(node.attributes);

                    fields.push(Field::Node {
                        alias,
                        fields: node.fields,
                    });
                }
                ("score", None) if scored => fields.push(Field::Score { alias }),
                ("__typename", Some(relationship)) => fields.push(Field::Typename {
                    alias,
                    type_name: relationship.names().relationship_type.clone(),
                }),
                ("__typename", None) => fields.push(Field::Typename {
                    alias,
                    type_name: entity.names().edge_type.clone(),
                }),
                ("properties", Some(relationship)) if relationship.properties().is_some() => {
                    fields.push(Field::Properties {
                        alias,
                        fields: self.edge_fields(relationship, field)?,
                    });
                }
                (name, Some(relationship)) if relationship.find_attribute(name).is_some() => {
                    fields.push(self.edge_field(relationship, field)?);
                }
                (name, _) => return Err(Error::unknown_field(&entity.names().edge_type, name)),
            }
        }

        Ok(fields)
    }

    /// Filters of one concrete entity of a connection.
    fn connection_filters(
        &self,
        entity: ConcreteEntityWalker<'a>,
        relationship: Option<RelationshipWalker<'a>>,
        node: Option<&Map<String, Value>>,
        input: Option<&Map<String, Value>>,
    ) -> Result<Vec<Filter>> {
        let parser = FilterParser::user();
        let mut filters = Vec::new();

        if let Some(node) = node {
            filters.extend(parser.concrete_where(entity, node)?);
        }

        let (Some(relationship), Some(input)) = (relationship, input) else {
            return Ok(filters);
        };

        for (key, value) in input {
            match key.as_str() {
                "node" => (),
                "edge" => filters.extend(parser.edge_where(relationship, object(key, value)?)?),
                "AND" | "OR" | "NOT" => {
                    let input = Map::from_iter([(key.clone(), value.clone())]);
                    filters.extend(parser.connection_where(relationship, EntityWalker::Concrete(entity), &input)?);
                }
                key => return Err(Error::unknown_field(&relationship.names().connection_type, key)),
            }
        }

        Ok(filters)
    }
}

/// Makes sure the `node` map of a composite edge carries the attribute. Returns the path to it.
fn project_node_attribute(fields: &mut Vec<Field>, name: &str, property: &str) -> Vec<String> {
    let position = fields.iter().position(|field| matches!(field, Field::Node { .. }));

    let position = position.unwrap_or_else(|| {
        fields.push(Field::Node {
            alias: "node".to_string(),
            fields: Vec::new(),
        });

        fields.len() - 1
    });

    let Field::Node { alias, fields } = &mut fields[position] else {
        return vec![name.to_string()];
    };

    let mut path = vec![alias.clone()];
    path.extend(project_attribute(fields, name, property, PropertyOwner::Node));

    path
}
