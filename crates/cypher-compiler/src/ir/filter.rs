use graph_schema::AttributeType;
use serde_json::Value;

use super::{NodeTarget, PropertyOwner};
use crate::cypher::Direction;

/// A predicate over the node in scope, the edge leading to it, or the caller.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Filter {
    Property(PropertyFilter),
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    /// The node in scope carries all the labels.
    Labels(Vec<String>),
    /// Quantifies over the nodes related to the node in scope. The predicate is evaluated with
    /// the related node and its edge in scope.
    Relationship {
        traversal: Traversal,
        quantifier: Quantifier,
        predicate: Option<Box<Filter>>,
    },
    RelationshipCount {
        traversal: Traversal,
        operator: ComparisonOperator,
        value: Value,
    },
    /// Compares a claim of the caller.
    Claim {
        path: Vec<String>,
        operator: ComparisonOperator,
        value: Value,
    },
    Authenticated,
    /// Compares the index score of the node in scope.
    Score {
        operator: ComparisonOperator,
        value: Value,
    },
    Constant(bool),
}

impl Filter {
    /// Conjunction of the filters, `None` when there are none.
    pub fn all(filters: impl IntoIterator<Item = Filter>) -> Option<Filter> {
        let mut filters: Vec<_> = filters.into_iter().collect();

        match filters.len() {
            0 => None,
            1 => filters.pop(),
            _ => Some(Filter::And(filters)),
        }
    }

    /// Disjunction of the filters, `None` when there are none.
    pub fn any(filters: impl IntoIterator<Item = Filter>) -> Option<Filter> {
        let mut filters: Vec<_> = filters.into_iter().collect();

        match filters.len() {
            0 => None,
            1 => filters.pop(),
            _ => Some(Filter::Or(filters)),
        }
    }

    pub fn negate(self) -> Filter {
        match self {
            Filter::Not(inner) => *inner,
            Filter::Constant(value) => Filter::Constant(!value),
            other => Filter::Not(Box::new(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PropertyFilter {
    pub owner: PropertyOwner,
    /// The storage name of the attribute.
    pub property: String,
    pub ty: AttributeType,
    pub list: bool,
    pub operator: ComparisonOperator,
    pub operand: Operand,
}

/// The right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operand {
    Value(Value),
    /// A claim of the caller, such as `$jwt.sub`. The comparison only holds when the claim is
    /// present.
    Claim(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ComparisonOperator {
    Equal,
    In,
    Contains,
    StartsWith,
    EndsWith,
    Matches,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    /// The list property contains the value.
    Includes,
    /// The point property is exactly at the given distance.
    Distance,
}

impl ComparisonOperator {
    /// Input suffixes and the operator they select. `negated` suffixes wrap the comparison in
    /// a negation.
    pub const SUFFIXES: &'static [(&'static str, ComparisonOperator, bool)] = &[
        ("_NOT_IN", ComparisonOperator::In, true),
        ("_NOT_CONTAINS", ComparisonOperator::Contains, true),
        ("_NOT_STARTS_WITH", ComparisonOperator::StartsWith, true),
        ("_NOT_ENDS_WITH", ComparisonOperator::EndsWith, true),
        ("_NOT_INCLUDES", ComparisonOperator::Includes, true),
        ("_NOT", ComparisonOperator::Equal, true),
        ("_EQ", ComparisonOperator::Equal, false),
        ("_IN", ComparisonOperator::In, false),
        ("_CONTAINS", ComparisonOperator::Contains, false),
        ("_STARTS_WITH", ComparisonOperator::StartsWith, false),
        ("_ENDS_WITH", ComparisonOperator::EndsWith, false),
        ("_MATCHES", ComparisonOperator::Matches, false),
        ("_LTE", ComparisonOperator::LessThanOrEqual, false),
        ("_LT", ComparisonOperator::LessThan, false),
        ("_GTE", ComparisonOperator::GreaterThanOrEqual, false),
        ("_GT", ComparisonOperator::GreaterThan, false),
        ("_INCLUDES", ComparisonOperator::Includes, false),
        ("_DISTANCE", ComparisonOperator::Distance, false),
    ];

    /// Splits `title_STARTS_WITH` into `title` and its operator.
    pub fn split(key: &str) -> Option<(&str, ComparisonOperator, bool)> {
        Self::SUFFIXES.iter().find_map(|(suffix, operator, negated)| {
            key.strip_suffix(suffix)
                .filter(|prefix| !prefix.is_empty())
                .map(|prefix| (prefix, *operator, *negated))
        })
    }

    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            ComparisonOperator::LessThan
                | ComparisonOperator::LessThanOrEqual
                | ComparisonOperator::GreaterThan
                | ComparisonOperator::GreaterThanOrEqual
        )
    }

    pub fn is_textual(self) -> bool {
        matches!(
            self,
            ComparisonOperator::Contains
                | ComparisonOperator::StartsWith
                | ComparisonOperator::EndsWith
                | ComparisonOperator::Matches
        )
    }
}

/// Quantifier of a relationship filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Quantifier {
    Some,
    None,
    All,
    Single,
}

impl Quantifier {
    /// Splits `actors_SOME` into `actors` and its quantifier. A bare field name means `SOME` and
    /// `_NOT` means `NONE`.
    pub fn split(key: &str) -> (&str, Quantifier) {
        const SUFFIXES: [(&str, Quantifier); 5] = [
            ("_SOME", Quantifier::Some),
            ("_NONE", Quantifier::None),
            ("_ALL", Quantifier::All),
            ("_SINGLE", Quantifier::Single),
            ("_NOT", Quantifier::None),
        ];

        SUFFIXES
            .iter()
            .find_map(|(suffix, quantifier)| key.strip_suffix(suffix).map(|prefix| (prefix, *quantifier)))
            .unwrap_or((key, Quantifier::Some))
    }
}

/// One hop from the node in scope.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Traversal {
    pub edge_type: String,
    pub direction: Direction,
    pub target: NodeTarget,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("title_NOT_IN", Some(("title", ComparisonOperator::In, true)))]
    #[case("title_IN", Some(("title", ComparisonOperator::In, false)))]
    #[case("released_LTE", Some(("released", ComparisonOperator::LessThanOrEqual, false)))]
    #[case("released_LT", Some(("released", ComparisonOperator::LessThan, false)))]
    #[case("title_NOT", Some(("title", ComparisonOperator::Equal, true)))]
    #[case("tags_NOT_INCLUDES", Some(("tags", ComparisonOperator::Includes, true)))]
    #[case("_IN", None)]
    #[case("title", None)]
    fn operator_suffixes(#[case] key: &str, #[case] expected: Option<(&str, ComparisonOperator, bool)>) {
        assert_eq!(ComparisonOperator::split(key), expected);
    }

    #[rstest]
    #[case("actors", ("actors", Quantifier::Some))]
    #[case("actors_NOT", ("actors", Quantifier::None))]
    #[case("actors_ALL", ("actors", Quantifier::All))]
    #[case("actorsConnection_SINGLE", ("actorsConnection", Quantifier::Single))]
    fn quantifier_suffixes(#[case] key: &str, #[case] expected: (&str, Quantifier)) {
        assert_eq!(Quantifier::split(key), expected);
    }
}
