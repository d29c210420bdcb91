use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{AuthorizationOperation, ValidatePhase};

/// Access rules attached to an entity or an attribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthorizationDeclaration {
    /// Rules that narrow what is matched.
    #[serde(default)]
    pub filter: Vec<FilterRuleDeclaration>,
    /// Rules that must hold for matched rows, or the query aborts.
    #[serde(default)]
    pub validate: Vec<ValidateRuleDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterRuleDeclaration {
    #[serde(default = "AuthorizationOperation::all")]
    pub operations: Vec<AuthorizationOperation>,
    #[serde(default = "yes")]
    pub require_authentication: bool,
    #[serde(rename = "where")]
    pub predicate: AuthorizationWhere,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidateRuleDeclaration {
    #[serde(default = "AuthorizationOperation::all")]
    pub operations: Vec<AuthorizationOperation>,
    #[serde(default = "ValidatePhase::both")]
    pub when: Vec<ValidatePhase>,
    #[serde(default = "yes")]
    pub require_authentication: bool,
    #[serde(rename = "where")]
    pub predicate: AuthorizationWhere,
}

/// The condition of a rule. `node` uses the same grammar as a client `where` argument on the
/// entity, and may reference claims with `"$jwt.<path>"` strings. `jwt` is matched against the
/// claims themselves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthorizationWhere {
    #[serde(default)]
    pub node: Option<Map<String, Value>>,
    #[serde(default)]
    pub jwt: Option<Map<String, Value>>,
    #[serde(default, rename = "AND")]
    pub and: Vec<AuthorizationWhere>,
    #[serde(default, rename = "OR")]
    pub or: Vec<AuthorizationWhere>,
    #[serde(default, rename = "NOT")]
    pub not: Option<Box<AuthorizationWhere>>,
}

impl AuthorizationWhere {
    pub fn is_empty(&self) -> bool {
        self.node.as_ref().map_or(true, Map::is_empty)
            && self.jwt.as_ref().map_or(true, Map::is_empty)
            && self.and.is_empty()
            && self.or.is_empty()
            && self.not.is_none()
    }
}

/// Requires an authenticated caller, optionally with claims matching `jwt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthenticationDeclaration {
    #[serde(default = "AuthorizationOperation::all")]
    pub operations: Vec<AuthorizationOperation>,
    #[serde(default)]
    pub jwt: Option<Map<String, Value>>,
}

fn yes() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_defaults() {
        let declaration: AuthorizationDeclaration = toml::from_str(
            r#"
            [[filter]]
            where = { node = { owner = "$jwt.sub" } }

            [[validate]]
            operations = ["UPDATE", "DELETE"]
            where = { jwt = { roles_INCLUDES = "admin" } }
            "#,
        )
        .unwrap();

        let filter = &declaration.filter[0];
        assert!(filter.require_authentication);
        assert_eq!(filter.operations, AuthorizationOperation::all());
        assert!(!filter.predicate.is_empty());

        let validate = &declaration.validate[0];
        assert_eq!(validate.when, ValidatePhase::both());
        assert_eq!(
            validate.operations,
            vec![AuthorizationOperation::Update, AuthorizationOperation::Delete]
        );
    }
}
