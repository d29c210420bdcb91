use graph_schema::{AttributeWalker, ConcreteEntityWalker, EntityWalker, RelationshipWalker};
use serde_json::{Map, Value};

use super::{node_target, object, objects, query_direction};
use crate::{
    error::{Error, Result},
    ir::{ComparisonOperator, Filter, Operand, PropertyFilter, PropertyOwner, Quantifier, Traversal},
};

const CLAIM_PREFIX: &str = "$jwt.";

/// Parses `where` input objects into filters. Every key names an attribute with an optional
/// operator suffix, a relationship with an optional quantifier, or a boolean combinator.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FilterParser {
    /// Whether `"$jwt.<path>"` strings refer to claims of the caller.
    claims: bool,
}

impl FilterParser {
    /// For `where` arguments of the request.
    pub fn user() -> Self {
        Self { claims: false }
    }

    /// For `where` conditions of authorization rules.
    pub fn authorization() -> Self {
        Self { claims: true }
    }

    pub fn concrete_where(self, entity: ConcreteEntityWalker<'_>, input: &Map<String, Value>) -> Result<Option<Filter>> {
        let mut filters = Vec::new();

        for (key, value) in input {
            filters.extend(self.node_key(entity, key, value)?);
        }

        Ok(Filter::all(filters))
    }

    /// A `where` over any entity. Abstract entities match when one of their concrete entities
    /// does, a union `where` being keyed by member.
    pub fn entity_where(self, entity: EntityWalker<'_>, input: &Map<String, Value>) -> Result<Option<Filter>> {
        let alternatives = match entity {
            EntityWalker::Concrete(entity) => return self.concrete_where(entity, input),
            EntityWalker::Interface(interface) => {
                let mut alternatives = Vec::new();

                for member in interface.implementors() {
                    alternatives.push((member, self.concrete_where(member, input)?));
                }

                // The same predicate for every implementor needs no label test.
                if let Some(((_, first), rest)) = alternatives.split_first() {
                    if rest.iter().all(|(_, filter)| filter == first) {
                        return Ok(first.clone());
                    }
                }

                alternatives
            }
            EntityWalker::Union(union) => {
                let mut alternatives = Vec::new();

                for (name, value) in input {
                    let member = union.find_member(name).ok_or_else(|| Error::UnknownEntity {
                        entity: name.clone(),
                        parent: union.name().to_string(),
                    })?;

                    alternatives.push((member, self.concrete_where(member, object(name, value)?)?));
                }

                alternatives
            }
        };

        if alternatives.is_empty() {
            return Ok(None);
        }

        let alternatives = alternatives.into_iter().map(|(member, filter)| {
            let labels = Filter::Labels(member.labels().to_vec());
            Filter::all(std::iter::once(labels).chain(filter)).unwrap_or(Filter::Constant(true))
        });

        Ok(Filter::any(alternatives))
    }

    /// A `where` over the edges of a relationship: `node` for the related node, `edge` for the
    /// properties of the edge. `node` is read as a `where` of `target`.
    pub fn connection_where(
        self,
        relationship: RelationshipWalker<'_>,
        target: EntityWalker<'_>,
        input: &Map<String, Value>,
    ) -> Result<Option<Filter>> {
        let mut filters = Vec::new();

        for (key, value) in input {
            let filter = match key.as_str() {
                "node" => self.entity_where(target, object(key, value)?)?,
                "edge" => self.edge_where(relationship, object(key, value)?)?,
                "AND" | "OR" | "NOT" => {
                    self.combinator(key, value, |input| self.connection_where(relationship, target, input))?
                }
                _ => return Err(Error::unknown_field(&relationship.names().connection_type, key)),
            };

            filters.extend(filter);
        }

        Ok(Filter::all(filters))
    }

    pub fn edge_where(self, relationship: RelationshipWalker<'_>, input: &Map<String, Value>) -> Result<Option<Filter>> {
        let mut filters = Vec::new();

        for (key, value) in input {
            if matches!(key.as_str(), "AND" | "OR" | "NOT") {
                filters.extend(self.combinator(key, value, |input| self.edge_where(relationship, input))?);
                continue;
            }

            let (attribute, operator, negated) = resolve_attribute(key, |name| relationship.find_attribute(name))
                .ok_or_else(|| Error::unknown_field(&relationship.names().relationship_type, key))?;

            filters.push(self.property(PropertyOwner::Edge, attribute, operator, negated, key, value)?);
        }

        Ok(Filter::all(filters))
    }

    fn node_key(self, entity: ConcreteEntityWalker<'_>, key: &str, value: &Value) -> Result<Option<Filter>> {
        match key {
            "AND" | "OR" | "NOT" => return self.combinator(key, value, |input| self.concrete_where(entity, input)),
            "typename_IN" => {
                let names = value
                    .as_array()
                    .ok_or_else(|| Error::invalid_argument(key, "expected a list of type names"))?;

                return Ok(match names.iter().any(|name| name.as_str() == Some(entity.name())) {
                    true => None,
                    false => Some(Filter::Constant(false)),
                });
            }
            _ => (),
        }

        if let Some((attribute, operator, negated)) = resolve_attribute(key, |name| entity.find_attribute(name)) {
            return self
                .property(PropertyOwner::Node, attribute, operator, negated, key, value)
                .map(Some);
        }

        let (name, quantifier) = Quantifier::split(key);

        if let Some(relationship) = entity.find_relationship(name) {
            return self.relationship(relationship, quantifier, value, key).map(Some);
        }

        for relationship in entity.relationships() {
            if relationship.names().connection_field == name {
                // Like `actors: null`, `actorsConnection: null` asks for nodes without related nodes.
                if value.is_null() {
                    return Ok(Some(quantified(relationship, Quantifier::None, None)));
                }

                let predicate = self.connection_where(relationship, relationship.target(), object(key, value)?)?;
                return Ok(Some(quantified(relationship, quantifier, predicate)));
            }

            if relationship.names().aggregate_field == key {
                return self.relationship_count(relationship, object(key, value)?);
            }
        }

        Err(Error::unknown_field(entity.names().where_type.as_str(), key))
    }

    fn relationship(
        self,
        relationship: RelationshipWalker<'_>,
        quantifier: Quantifier,
        value: &Value,
        key: &str,
    ) -> Result<Filter> {
        match value {
            // `actors: null` asks for nodes without any related node.
            Value::Null => Ok(quantified(relationship, Quantifier::None, None)),
            value => {
                let predicate = self.entity_where(relationship.target(), object(key, value)?)?;
                Ok(quantified(relationship, quantifier, predicate))
            }
        }
    }

    fn relationship_count(self, relationship: RelationshipWalker<'_>, input: &Map<String, Value>) -> Result<Option<Filter>> {
        let mut filters = Vec::new();

        for (key, value) in input {
            if matches!(key.as_str(), "AND" | "OR" | "NOT") {
                filters.extend(self.combinator(key, value, |input| self.relationship_count(relationship, input))?);
                continue;
            }

            let operator = match ComparisonOperator::split(key) {
                None if key == "count" => ComparisonOperator::Equal,
                Some(("count", operator, false)) if operator.is_ordering() => operator,
                _ => return Err(Error::unknown_field(&relationship.names().aggregate_selection, key)),
            };

            if !value.is_u64() {
                return Err(Error::invalid_argument(key, "expected a non-negative integer"));
            }

            filters.push(Filter::RelationshipCount {
                traversal: traversal(relationship),
                operator,
                value: value.clone(),
            });
        }

        Ok(Filter::all(filters))
    }

    fn combinator(
        self,
        key: &str,
        value: &Value,
        parse: impl Fn(&Map<String, Value>) -> Result<Option<Filter>>,
    ) -> Result<Option<Filter>> {
        match key {
            "NOT" => Ok(parse(object(key, value)?)?.map(Filter::negate)),
            _ => {
                let mut filters = Vec::new();

                for input in objects(key, value)? {
                    filters.push(parse(input)?.unwrap_or(Filter::Constant(true)));
                }

                Ok(match key {
                    "AND" => Filter::all(filters),
                    _ => Filter::any(filters),
                })
            }
        }
    }

    fn property(
        self,
        owner: PropertyOwner,
        attribute: AttributeWalker<'_>,
        operator: ComparisonOperator,
        negated: bool,
        key: &str,
        value: &Value,
    ) -> Result<Filter> {
        if !attribute.is_filterable() {
            return Err(Error::invalid_argument(key, "the attribute cannot be filtered on"));
        }

        let operand = match value.as_str().and_then(|value| value.strip_prefix(CLAIM_PREFIX)) {
            Some(path) if self.claims => Operand::Claim(path.split('.').map(str::to_string).collect()),
            _ => Operand::Value(value.clone()),
        };

        if let Operand::Value(value) = &operand {
            validate_operand(attribute, operator, key, value)?;
        }

        let filter = Filter::Property(PropertyFilter {
            owner,
            property: attribute.storage_name().to_string(),
            ty: attribute.ty().clone(),
            list: attribute.is_list(),
            operator,
            operand,
        });

        Ok(match negated {
            true => filter.negate(),
            false => filter,
        })
    }
}

/// Resolves `title` or `title_STARTS_WITH`. A full attribute name wins over a suffix, so an
/// attribute may itself end like an operator.
fn resolve_attribute<'a>(
    key: &str,
    find: impl Fn(&str) -> Option<AttributeWalker<'a>>,
) -> Option<(AttributeWalker<'a>, ComparisonOperator, bool)> {
    if let Some(attribute) = find(key) {
        return Some((attribute, ComparisonOperator::Equal, false));
    }

    let (name, operator, negated) = ComparisonOperator::split(key)?;

    find(name).map(|attribute| (attribute, operator, negated))
}

fn validate_operand(attribute: AttributeWalker<'_>, operator: ComparisonOperator, key: &str, value: &Value) -> Result<()> {
    let ty = attribute.ty();

    let valid = match operator {
        ComparisonOperator::In => value.is_array(),
        ComparisonOperator::Includes => attribute.is_list(),
        ComparisonOperator::Distance => ty.is_spatial() && value.is_object(),
        operator if operator.is_textual() => ty.is_textual() && value.is_string(),
        operator if operator.is_ordering() && ty.is_spatial() => value.is_object(),
        ComparisonOperator::Equal => true,
        _ => !value.is_null(),
    };

    match valid {
        true => Ok(()),
        false => Err(Error::invalid_argument(key, format!("invalid value for `{}`", attribute.name()))),
    }
}

fn traversal(relationship: RelationshipWalker<'_>) -> Traversal {
    Traversal {
        edge_type: relationship.edge_type().to_string(),
        direction: query_direction(relationship, None),
        target: node_target(relationship.target()),
    }
}

fn quantified(relationship: RelationshipWalker<'_>, quantifier: Quantifier, predicate: Option<Filter>) -> Filter {
    Filter::Relationship {
        traversal: traversal(relationship),
        quantifier,
        predicate: predicate.map(Box::new),
    }
}

#[cfg(test)]
mod tests {
    use graph_schema::Schema;
    use serde_json::json;

    use super::*;
    use crate::cypher::Direction;

    const SCHEMA: &str = r#"
        [[nodes]]
        name = "Movie"

        [[nodes.attributes]]
        name = "title"
        type = "String"

        [[nodes.attributes]]
        name = "released"
        type = "Int"
        alias = "year"

        [[nodes.attributes]]
        name = "secret"
        type = "String"
        filterable = false

        [[nodes.relationships]]
        name = "actors"
        target = "Actor"
        edge_type = "ACTED_IN"
        direction = "IN"
        list = true

        [[nodes]]
        name = "Actor"

        [[nodes.attributes]]
        name = "name"
        type = "String"
    "#;

    fn parse(parser: FilterParser, input: Value) -> Result<Option<Filter>> {
        let schema = Schema::from_toml_str(SCHEMA).unwrap();
        let movie = schema.find_concrete_entity("Movie").unwrap();

        parser.concrete_where(movie, input.as_object().unwrap())
    }

    fn property(property: &str, ty: &str, operator: ComparisonOperator, operand: Operand) -> Filter {
        Filter::Property(PropertyFilter {
            owner: PropertyOwner::Node,
            property: property.to_string(),
            ty: ty.into(),
            list: false,
            operator,
            operand,
        })
    }

    #[test]
    fn storage_names_and_suffixes() {
        let filter = parse(FilterParser::user(), json!({ "title_NOT": "Matrix", "released_GTE": 1999 })).unwrap();

        pretty_assertions::assert_eq!(
            filter,
            Some(Filter::And(vec![
                property("title", "String", ComparisonOperator::Equal, Operand::Value(json!("Matrix"))).negate(),
                property(
                    "year",
                    "Int",
                    ComparisonOperator::GreaterThanOrEqual,
                    Operand::Value(json!(1999))
                ),
            ]))
        );
    }

    #[test]
    fn relationship_quantifiers() {
        let filter = parse(FilterParser::user(), json!({ "actors_NONE": { "name": "Keanu" } })).unwrap();

        let Some(Filter::Relationship {
            traversal,
            quantifier,
            predicate,
        }) = filter
        else {
            unreachable!("expected a relationship filter, got {filter:?}");
        };

        assert_eq!(quantifier, Quantifier::None);
        assert_eq!(traversal.direction, Direction::Left);
        assert_eq!(traversal.edge_type, "ACTED_IN");
        assert!(predicate.is_some());

        let empty = parse(FilterParser::user(), json!({ "actors": null })).unwrap();
        assert!(matches!(
            empty,
            Some(Filter::Relationship {
                quantifier: Quantifier::None,
                predicate: None,
                ..
            })
        ));
    }

    #[rstest::rstest]
    #[case::relationship("actors")]
    #[case::connection("actorsConnection")]
    #[case::connection_with_quantifier("actorsConnection_SOME")]
    fn null_relationships_match_unrelated_nodes(#[case] key: &str) {
        let filter = parse(FilterParser::user(), json!({ key: null })).unwrap();

        assert!(
            matches!(
                filter,
                Some(Filter::Relationship {
                    quantifier: Quantifier::None,
                    predicate: None,
                    ..
                })
            ),
            "{filter:?}"
        );
    }

    #[test]
    fn claims_only_in_authorization() {
        let input = json!({ "title": "$jwt.sub" });

        assert_eq!(
            parse(FilterParser::authorization(), input.clone()).unwrap(),
            Some(property(
                "title",
                "String",
                ComparisonOperator::Equal,
                Operand::Claim(vec!["sub".into()])
            ))
        );

        assert_eq!(
            parse(FilterParser::user(), input).unwrap(),
            Some(property(
                "title",
                "String",
                ComparisonOperator::Equal,
                Operand::Value(json!("$jwt.sub"))
            ))
        );
    }

    #[test]
    fn rejects_unknown_and_unfilterable_keys() {
        assert_eq!(
            parse(FilterParser::user(), json!({ "rating": 3 })),
            Err(Error::unknown_field("MovieWhere", "rating"))
        );

        assert!(matches!(
            parse(FilterParser::user(), json!({ "secret": "x" })),
            Err(Error::InvalidArgument { .. })
        ));

        assert!(matches!(
            parse(FilterParser::user(), json!({ "title_IN": "Matrix" })),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn aggregate_counts() {
        let filter = parse(FilterParser::user(), json!({ "actorsAggregate": { "count_GT": 2 } })).unwrap();

        assert!(matches!(
            filter,
            Some(Filter::RelationshipCount {
                operator: ComparisonOperator::GreaterThan,
                ..
            })
        ));
    }
}
