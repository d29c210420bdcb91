use graph_schema::{ConcreteEntityWalker, EntityWalker, FulltextIndex, Operations, VectorIndex};
use serde_json::{Map, Value};

use super::{
    fields::NodeFields,
    object,
    sort::{connection_pagination, pagination, resolve_sort, sort_fields, SortShape},
    Anchor, FilterParser, QueryFactory,
};
use crate::{
    error::{Error, Result},
    ir::{
        Cardinality, ComparisonOperator, ConnectionOperation, Field, Filter, NodeTarget, Operation, Pagination,
        ReadOperation, Selection,
    },
    request::ResolveTree,
};

/// Neighbours asked from a vector index when the request sets no limit.
const DEFAULT_NEIGHBOURS: u64 = 4;

/// An index probe replacing the label match of a node.
#[derive(Debug, Clone)]
pub(super) enum Search<'a> {
    Fulltext { index: &'a FulltextIndex, phrase: Value },
    Vector { index: &'a VectorIndex, vector: Value },
}

impl Search<'_> {
    /// The selection of the probe. A vector index returns as many neighbours as the page
    /// reaches.
    pub fn selection(&self, entity: ConcreteEntityWalker<'_>, pagination: Pagination) -> Selection {
        let target = NodeTarget::labels(entity.labels());

        match self {
            Search::Fulltext { index, phrase } => Selection::Fulltext {
                index: index.name.clone(),
                phrase: phrase.clone(),
                target,
            },
            Search::Vector { index, vector } => Selection::Vector {
                index: index.name.clone(),
                vector: vector.clone(),
                neighbours: pagination
                    .skip
                    .unwrap_or(0)
                    .saturating_add(pagination.limit.unwrap_or(DEFAULT_NEIGHBOURS)),
                target,
            },
        }
    }
}

impl<'a> QueryFactory<'a> {
    /// The `fulltext: { <index>: { phrase } }` or `vector: { <index>: { vector } }` argument of a
    /// root read. At most one index can be probed.
    pub(super) fn search(
        &self,
        anchor: Anchor<'a>,
        entity: EntityWalker<'a>,
        tree: &ResolveTree,
    ) -> Result<Option<Search<'a>>> {
        let (argument, input) = match (tree.argument("fulltext"), tree.argument("vector")) {
            (None, None) => return Ok(None),
            (Some(_), Some(_)) => return Err(Error::AmbiguousIndexSearch),
            (Some(input), None) => ("fulltext", input),
            (None, Some(input)) => ("vector", input),
        };

        if anchor.relationship().is_some() {
            return Err(Error::invalid_argument(argument, "indexes can only be queried from root fields"));
        }

        let entity = entity
            .as_concrete()
            .ok_or_else(|| Error::invalid_argument(argument, "only nodes declare indexes"))?;

        let mut indexes = object(argument, input)?.iter();

        let (Some((name, input)), None) = (indexes.next(), indexes.next()) else {
            return Err(Error::AmbiguousIndexSearch);
        };

        let input = object(name, input)?;

        match argument {
            "fulltext" => {
                let index = entity
                    .find_fulltext_index(name)
                    .ok_or_else(|| Error::unknown_field(entity.name(), name))?;

                Ok(Some(Search::Fulltext {
                    index,
                    phrase: phrase(input)?,
                }))
            }
            _ => {
                let index = entity
                    .find_vector_index(name)
                    .ok_or_else(|| Error::unknown_field(entity.name(), name))?;

                Ok(Some(Search::Vector {
                    index,
                    vector: vector(input)?,
                }))
            }
        }
    }

    /// `<plural>Fulltext<Index>(phrase, where, sort, limit, offset)`, whose rows are
    /// `{ score, <singular> }`.
    pub(super) fn fulltext_root(&self, entity: EntityWalker<'a>, index: &str, tree: &ResolveTree) -> Result<Operation> {
        let entity = self.indexed(entity, tree)?;

        let index = entity
            .find_fulltext_index(index)
            .ok_or_else(|| Error::UnknownRootField(tree.name.clone()))?;

        let search = Search::Fulltext {
            index,
            phrase: phrase(&tree.args)?,
        };

        let node_key = entity.names().singular.as_str();
        let result_type = format!("{}FulltextResult", entity.name());

        let filters = self.search_filters(entity, tree, node_key)?;

        let mut fields = Vec::new();
        let mut attributes = Vec::new();

        for field in tree.all_fields() {
            let alias = field.response_key().to_string();

            match field.name.as_str() {
                "score" => fields.push(Field::Score { alias }),
                "__typename" => fields.push(Field::Typename {
                    alias,
                    type_name: result_type.clone(),
                }),
                name if name == node_key => {
                    let node = self.node_fields(entity, field)?;
                    attributes.extend(node.attributes);
                    fields.push(Field::Node {
                        alias,
                        fields: node.fields,
                    });
                }
                name => return Err(Error::unknown_field(&result_type, name)),
            }
        }

        let shape = SortShape::Wrapped {
            node: node_key,
            edge: false,
            score: true,
        };

        let pagination = pagination(tree, entity.limit())?;

        Ok(Operation::Read(ReadOperation {
            entity: entity.name().to_string(),
            selection: search.selection(entity, pagination),
            filters,
            authorization: self.authorizer.filters(entity, &attributes, Operations::READ)?,
            fields,
            sort: resolve_sort(&sort_fields(tree, shape)?, |name| entity.find_attribute(name), |_| None)?,
            pagination,
            cardinality: Cardinality::Many,
        }))
    }

    /// The query field of a vector index, a connection whose edges carry the score.
    pub(super) fn vector_root(&self, entity: EntityWalker<'a>, index: &str, tree: &ResolveTree) -> Result<Operation> {
        let entity = self.indexed(entity, tree)?;

        let index = entity
            .find_vector_index(index)
            .ok_or_else(|| Error::UnknownRootField(tree.name.clone()))?;

        let search = Search::Vector {
            index,
            vector: vector(&tree.args)?,
        };

        let filters = self.search_filters(entity, tree, "node")?;
        let shape = self.connection_shape(entity, None, tree, true)?;

        let sort = SortShape::Wrapped {
            node: "node",
            edge: false,
            score: true,
        };

        let pagination = connection_pagination(tree, entity.limit())?;

        Ok(Operation::Connection(ConnectionOperation {
            entity: entity.name().to_string(),
            selection: search.selection(entity, pagination),
            filters,
            authorization: self.authorizer.filters(entity, &shape.attributes, Operations::READ)?,
            edges: shape.edges,
            total_count: shape.total_count,
            sort: resolve_sort(&sort_fields(tree, sort)?, |name| entity.find_attribute(name), |_| None)?,
            pagination,
        }))
    }

    fn indexed(&self, entity: EntityWalker<'a>, tree: &ResolveTree) -> Result<ConcreteEntityWalker<'a>> {
        self.authenticate_entity(entity, Operations::READ)?;

        entity
            .as_concrete()
            .ok_or_else(|| Error::UnknownRootField(tree.name.clone()))
    }

    /// `where: { score: { min, max }, <node>: { ... } }` of an index query field.
    fn search_filters(&self, entity: ConcreteEntityWalker<'a>, tree: &ResolveTree, node_key: &str) -> Result<Vec<Filter>> {
        let Some(input) = tree.argument("where") else {
            return Ok(Vec::new());
        };

        let mut filters = Vec::new();

        for (key, value) in object("where", input)? {
            match key.as_str() {
                "score" => filters.extend(score_filter(object(key, value)?)?),
                key if key == node_key => filters.extend(FilterParser::user().concrete_where(entity, object(key, value)?)?),
                key => return Err(Error::unknown_field(format!("{}IndexWhere", entity.name()), key)),
            }
        }

        Ok(filters)
    }
}

fn score_filter(input: &Map<String, Value>) -> Result<Vec<Filter>> {
    let mut filters = Vec::new();

    for (key, value) in input {
        let operator = match key.as_str() {
            "min" => ComparisonOperator::GreaterThanOrEqual,
            "max" => ComparisonOperator::LessThanOrEqual,
            _ => return Err(Error::invalid_argument("score", format!("unknown bound `{key}`"))),
        };

        if !value.is_number() {
            return Err(Error::invalid_argument("score", "expected a number"));
        }

        filters.push(Filter::Score {
            operator,
            value: value.clone(),
        });
    }

    Ok(filters)
}

fn phrase(input: &Map<String, Value>) -> Result<Value> {
    match input.get("phrase") {
        Some(phrase @ Value::String(_)) => Ok(phrase.clone()),
        _ => Err(Error::invalid_argument("phrase", "expected a search phrase")),
    }
}

fn vector(input: &Map<String, Value>) -> Result<Value> {
    if input.contains_key("phrase") {
        return Err(Error::invalid_argument(
            "phrase",
            "vector indexes are queried with a vector, phrases need an embedding provider",
        ));
    }

    match input.get("vector") {
        Some(vector @ Value::Array(values)) if values.iter().all(Value::is_number) => Ok(vector.clone()),
        _ => Err(Error::invalid_argument("vector", "expected a list of floats")),
    }
}
