use serde_json::{Map, Value};

use crate::ir::ComparisonOperator;

/// Evaluates an authentication `jwt` condition against the claims of the caller. The condition
/// uses the filter grammar, keyed by claim path.
pub(super) fn matches(condition: &Map<String, Value>, claims: &Map<String, Value>) -> bool {
    condition.iter().all(|(key, expected)| match key.as_str() {
        "AND" => each(expected).all(|condition| matches(condition, claims)),
        "OR" => each(expected).any(|condition| matches(condition, claims)),
        "NOT" => expected.as_object().is_some_and(|condition| !matches(condition, claims)),
        _ => {
            let (path, operator, negated) =
                ComparisonOperator::split(key).unwrap_or((key.as_str(), ComparisonOperator::Equal, false));

            compare(lookup(claims, path), operator, expected) != negated
        }
    })
}

fn each(value: &Value) -> impl Iterator<Item = &Map<String, Value>> {
    value.as_array().into_iter().flatten().filter_map(Value::as_object)
}

fn lookup<'a>(claims: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = claims.get(segments.next()?)?;

    segments.try_fold(first, |value, segment| value.get(segment))
}

fn compare(actual: Option<&Value>, operator: ComparisonOperator, expected: &Value) -> bool {
    let text = || actual.and_then(Value::as_str).zip(expected.as_str());
    let numbers = || actual.and_then(Value::as_f64).zip(expected.as_f64());

    match operator {
        ComparisonOperator::Equal => actual.unwrap_or(&Value::Null) == expected,
        ComparisonOperator::In => expected
            .as_array()
            .is_some_and(|candidates| actual.is_some_and(|actual| candidates.contains(actual))),
        ComparisonOperator::Includes => actual
            .and_then(Value::as_array)
            .is_some_and(|values| values.contains(expected)),
        ComparisonOperator::Contains => text().is_some_and(|(actual, expected)| actual.contains(expected)),
        ComparisonOperator::StartsWith => text().is_some_and(|(actual, expected)| actual.starts_with(expected)),
        ComparisonOperator::EndsWith => text().is_some_and(|(actual, expected)| actual.ends_with(expected)),
        ComparisonOperator::LessThan => numbers().is_some_and(|(actual, expected)| actual < expected),
        ComparisonOperator::LessThanOrEqual => numbers().is_some_and(|(actual, expected)| actual <= expected),
        ComparisonOperator::GreaterThan => numbers().is_some_and(|(actual, expected)| actual > expected),
        ComparisonOperator::GreaterThanOrEqual => numbers().is_some_and(|(actual, expected)| actual >= expected),
        // Patterns and distances cannot be decided without the store.
        ComparisonOperator::Matches | ComparisonOperator::Distance => false,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[rstest]
    #[case(json!({ "roles_INCLUDES": "admin" }), true)]
    #[case(json!({ "roles_NOT_INCLUDES": "admin" }), false)]
    #[case(json!({ "sub": "alice" }), true)]
    #[case(json!({ "org.id_IN": ["a", "b"] }), true)]
    #[case(json!({ "level_GTE": 3 }), true)]
    #[case(json!({ "level_GT": 3 }), false)]
    #[case(json!({ "missing": null }), true)]
    #[case(json!({ "OR": [{ "sub": "bob" }, { "roles_INCLUDES": "editor" }] }), true)]
    #[case(json!({ "NOT": { "sub": "alice" } }), false)]
    fn claim_conditions(#[case] condition: Value, #[case] expected: bool) {
        let claims = object(json!({
            "sub": "alice",
            "roles": ["admin", "editor"],
            "level": 3,
            "org": { "id": "a" }
        }));

        assert_eq!(matches(&object(condition), &claims), expected);
    }
}
