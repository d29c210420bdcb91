use graph_schema::AttributeType;

use super::{Operation, PropertyOwner};

/// One entry of a projected map, keyed by its response key.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Field {
    Attribute {
        alias: String,
        owner: PropertyOwner,
        property: String,
    },
    /// The concrete type name, as `__typename` or as the discriminator of a composite row.
    Typename { alias: String, type_name: String },
    /// The index score of the node in scope.
    Score { alias: String },
    /// The node in scope as a nested map, such as `node` of an edge.
    Node { alias: String, fields: Vec<Field> },
    /// The edge in scope as a nested map of its properties.
    Properties { alias: String, fields: Vec<Field> },
    /// A field compiled into an operation of its own.
    Operation { alias: String, operation: Box<Operation> },
}

impl Field {
    pub fn alias(&self) -> &str {
        match self {
            Field::Attribute { alias, .. }
            | Field::Typename { alias, .. }
            | Field::Score { alias }
            | Field::Node { alias, .. }
            | Field::Properties { alias, .. }
            | Field::Operation { alias, .. } => alias,
        }
    }

    /// Whether the projection of this field is a map literal around the node rather than a map
    /// projection of it.
    pub fn wraps_node(&self) -> bool {
        matches!(self, Field::Node { .. } | Field::Properties { .. } | Field::Score { .. })
    }
}

/// One entry of an aggregation result.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AggregateField {
    Count {
        alias: String,
    },
    Attribute {
        alias: String,
        owner: PropertyOwner,
        property: String,
        ty: AttributeType,
        functions: Vec<(String, AggregateFunction)>,
    },
    /// `node { ... }` and `edge { ... }` of a relationship aggregation.
    Group {
        alias: String,
        fields: Vec<AggregateField>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
#[strum(serialize_all = "camelCase")]
pub(crate) enum AggregateFunction {
    Min,
    Max,
    Average,
    Sum,
    Shortest,
    Longest,
}

impl AggregateFunction {
    /// Whether the function applies to attributes of the type.
    pub fn supports(self, ty: &AttributeType) -> bool {
        match self {
            AggregateFunction::Min | AggregateFunction::Max => ty.is_numeric() || ty.is_temporal(),
            AggregateFunction::Average | AggregateFunction::Sum => ty.is_numeric(),
            AggregateFunction::Shortest | AggregateFunction::Longest => ty.is_textual(),
        }
    }

    pub fn cypher_function(self) -> &'static str {
        match self {
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
            AggregateFunction::Average => "avg",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Shortest => "last",
            AggregateFunction::Longest => "head",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn aggregate_functions_by_type() {
        assert_eq!(AggregateFunction::from_str("average"), Ok(AggregateFunction::Average));
        assert!(AggregateFunction::from_str("median").is_err());

        assert!(AggregateFunction::Min.supports(&AttributeType::DateTime));
        assert!(!AggregateFunction::Sum.supports(&AttributeType::DateTime));
        assert!(AggregateFunction::Shortest.supports(&AttributeType::Id));
        assert!(!AggregateFunction::Longest.supports(&AttributeType::Int));
    }
}
