use graph_schema::{AttributeWalker, Limit};
use graphql_cursor::{CursorError, GraphqlCursor};
use serde_json::Value;

use super::{object, objects};
use crate::{
    cypher::Order,
    error::{Error, Result},
    ir::{Pagination, PropertyOwner, Sort, SortKey},
    request::ResolveTree,
};

/// What one entry of a `sort` argument orders by, by attribute name.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum SortField {
    Node(String),
    Edge(String),
    Score,
}

/// How the entries of a `sort` argument are keyed.
#[derive(Debug, Clone, Copy)]
pub(super) enum SortShape<'s> {
    /// `{ title: DESC }`.
    Node,
    /// `{ <node>: { title: DESC } }`, `{ edge: { since: ASC } }` or `{ score: DESC }`.
    Wrapped { node: &'s str, edge: bool, score: bool },
}

/// The `sort` argument, read from `options` or from the field itself.
pub(super) fn sort_argument(tree: &ResolveTree) -> Option<&Value> {
    tree.argument("options")
        .and_then(|options| options.get("sort"))
        .filter(|sort| !sort.is_null())
        .or_else(|| tree.argument("sort"))
}

pub(super) fn sort_fields(tree: &ResolveTree, shape: SortShape<'_>) -> Result<Vec<(SortField, Order)>> {
    let Some(value) = sort_argument(tree) else {
        return Ok(Vec::new());
    };

    let mut fields = Vec::new();

    for input in objects("sort", value)? {
        for (key, value) in input {
            match shape {
                SortShape::Node => fields.push((SortField::Node(key.clone()), order_of(value)?)),
                SortShape::Wrapped { score: true, .. } if key == "score" => {
                    fields.push((SortField::Score, order_of(value)?));
                }
                SortShape::Wrapped { node, .. } if key == node => {
                    for (name, order) in object(key, value)? {
                        fields.push((SortField::Node(name.clone()), order_of(order)?));
                    }
                }
                SortShape::Wrapped { edge: true, .. } if key == "edge" => {
                    for (name, order) in object(key, value)? {
                        fields.push((SortField::Edge(name.clone()), order_of(order)?));
                    }
                }
                SortShape::Wrapped { .. } => {
                    return Err(Error::invalid_argument("sort", format!("unknown sort key `{key}`")));
                }
            }
        }
    }

    Ok(fields)
}

/// Resolves sort fields to stored properties of the node in scope and of its edge.
pub(super) fn resolve_sort<'a>(
    fields: &[(SortField, Order)],
    node: impl Fn(&str) -> Option<AttributeWalker<'a>>,
    edge: impl Fn(&str) -> Option<AttributeWalker<'a>>,
) -> Result<Vec<Sort>> {
    let mut sort = Vec::with_capacity(fields.len());

    for (field, order) in fields {
        let key = match field {
            SortField::Node(name) => SortKey::Property {
                owner: PropertyOwner::Node,
                property: sortable(name, node(name))?,
            },
            SortField::Edge(name) => SortKey::Property {
                owner: PropertyOwner::Edge,
                property: sortable(name, edge(name))?,
            },
            SortField::Score => SortKey::Score,
        };

        sort.push(Sort { key, order: *order });
    }

    Ok(sort)
}

pub(super) fn sortable(name: &str, attribute: Option<AttributeWalker<'_>>) -> Result<String> {
    attribute
        .filter(|attribute| attribute.is_sortable())
        .map(|attribute| attribute.storage_name().to_string())
        .ok_or_else(|| Error::invalid_argument("sort", format!("`{name}` cannot be sorted on")))
}

pub(super) fn order_of(value: &Value) -> Result<Order> {
    match value.as_str() {
        Some("ASC") => Ok(Order::Ascending),
        Some("DESC") => Ok(Order::Descending),
        _ => Err(Error::invalid_argument("sort", "expected ASC or DESC")),
    }
}

/// `limit` and `offset`, from `options` or from the field itself.
pub(super) fn pagination(tree: &ResolveTree, limit: Option<Limit>) -> Result<Pagination> {
    let options = tree.argument("options");
    let argument = |name: &str| {
        options
            .and_then(|options| options.get(name))
            .filter(|value| !value.is_null())
            .or_else(|| tree.argument(name))
    };

    let skip = argument("offset").map(|value| count("offset", value)).transpose()?;
    let requested = argument("limit").map(|value| count("limit", value)).transpose()?;

    Ok(Pagination {
        skip: skip.filter(|skip| *skip > 0),
        limit: clamp(limit, requested),
    })
}

/// `first` and `after` of a connection. A page starts right after the edge the cursor points
/// to.
pub(super) fn connection_pagination(tree: &ResolveTree, limit: Option<Limit>) -> Result<Pagination> {
    let requested = tree.argument("first").map(|value| count("first", value)).transpose()?;

    let skip = match tree.argument("after") {
        Some(Value::String(cursor)) => {
            let offset = GraphqlCursor::decode(cursor)?
                .next_offset()
                .and_then(|offset| u64::try_from(offset).ok())
                .ok_or_else(|| CursorError::OutOfRange(cursor.clone()))?;

            Some(offset)
        }
        Some(_) => return Err(Error::invalid_argument("after", "expected a cursor")),
        None => None,
    };

    Ok(Pagination {
        skip,
        limit: clamp(limit, requested),
    })
}

fn clamp(limit: Option<Limit>, requested: Option<u64>) -> Option<u64> {
    match limit {
        Some(limit) => limit.clamp(requested),
        None => requested,
    }
}

fn count(argument: &str, value: &Value) -> Result<u64> {
    value
        .as_u64()
        .ok_or_else(|| Error::invalid_argument(argument, "expected a non-negative integer"))
}
