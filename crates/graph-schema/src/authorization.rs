use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::declaration::{AuthenticationDeclaration, AuthorizationDeclaration, AuthorizationWhere};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumIter)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorizationOperation {
    Read,
    Aggregate,
    Create,
    Update,
    Delete,
    CreateRelationship,
    DeleteRelationship,
}

impl AuthorizationOperation {
    pub fn all() -> Vec<Self> {
        use strum::IntoEnumIterator;
        Self::iter().collect()
    }
}

bitflags::bitflags! {
    /// The operations a rule or annotation applies to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Operations: u8 {
        const READ = 1;
        const AGGREGATE = 1 << 1;
        const CREATE = 1 << 2;
        const UPDATE = 1 << 3;
        const DELETE = 1 << 4;
        const CREATE_RELATIONSHIP = 1 << 5;
        const DELETE_RELATIONSHIP = 1 << 6;
    }
}

impl From<AuthorizationOperation> for Operations {
    fn from(operation: AuthorizationOperation) -> Self {
        match operation {
            AuthorizationOperation::Read => Self::READ,
            AuthorizationOperation::Aggregate => Self::AGGREGATE,
            AuthorizationOperation::Create => Self::CREATE,
            AuthorizationOperation::Update => Self::UPDATE,
            AuthorizationOperation::Delete => Self::DELETE,
            AuthorizationOperation::CreateRelationship => Self::CREATE_RELATIONSHIP,
            AuthorizationOperation::DeleteRelationship => Self::DELETE_RELATIONSHIP,
        }
    }
}

impl FromIterator<AuthorizationOperation> for Operations {
    fn from_iter<T: IntoIterator<Item = AuthorizationOperation>>(iter: T) -> Self {
        iter.into_iter().map(Operations::from).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidatePhase {
    /// Checked against the matched rows before they are changed.
    Before,
    /// Checked against the rows as they are after the change.
    After,
}

impl ValidatePhase {
    pub fn both() -> Vec<Self> {
        vec![Self::Before, Self::After]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleMode {
    Filter,
    Validate { before: bool, after: bool },
}

/// A resolved authorization rule, in declaration order: filter rules first, then validate rules.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizationRule {
    pub mode: RuleMode,
    pub operations: Operations,
    pub require_authentication: bool,
    pub predicate: AuthorizationWhere,
}

impl AuthorizationRule {
    pub fn applies_to(&self, operations: Operations) -> bool {
        self.operations.intersects(operations)
    }

    pub fn is_filter(&self) -> bool {
        matches!(self.mode, RuleMode::Filter)
    }

    pub fn validates_before(&self) -> bool {
        matches!(self.mode, RuleMode::Validate { before: true, .. })
    }

    pub fn validates_after(&self) -> bool {
        matches!(self.mode, RuleMode::Validate { after: true, .. })
    }
}

pub(crate) fn resolve_authorization(declaration: &AuthorizationDeclaration) -> Vec<AuthorizationRule> {
    let filters = declaration.filter.iter().map(|rule| AuthorizationRule {
        mode: RuleMode::Filter,
        operations: rule.operations.iter().copied().collect(),
        require_authentication: rule.require_authentication,
        predicate: rule.predicate.clone(),
    });

    let validations = declaration.validate.iter().map(|rule| AuthorizationRule {
        mode: RuleMode::Validate {
            before: rule.when.contains(&ValidatePhase::Before),
            after: rule.when.contains(&ValidatePhase::After),
        },
        operations: rule.operations.iter().copied().collect(),
        require_authentication: rule.require_authentication,
        predicate: rule.predicate.clone(),
    });

    filters.chain(validations).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticationRule {
    pub operations: Operations,
    pub jwt: Option<Map<String, Value>>,
}

impl From<&AuthenticationDeclaration> for AuthenticationRule {
    fn from(declaration: &AuthenticationDeclaration) -> Self {
        Self {
            operations: declaration.operations.iter().copied().collect(),
            jwt: declaration.jwt.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::{FilterRuleDeclaration, ValidateRuleDeclaration};

    #[test]
    fn filters_are_listed_before_validations() {
        let declaration = AuthorizationDeclaration {
            validate: vec![ValidateRuleDeclaration {
                operations: vec![AuthorizationOperation::Delete],
                when: vec![ValidatePhase::Before],
                require_authentication: false,
                predicate: AuthorizationWhere::default(),
            }],
            filter: vec![FilterRuleDeclaration {
                operations: vec![AuthorizationOperation::Read, AuthorizationOperation::Aggregate],
                require_authentication: true,
                predicate: AuthorizationWhere::default(),
            }],
        };

        let rules = resolve_authorization(&declaration);

        assert!(rules[0].is_filter());
        assert_eq!(rules[0].operations, Operations::READ | Operations::AGGREGATE);
        assert!(rules[1].validates_before());
        assert!(!rules[1].validates_after());
        assert!(rules[1].applies_to(Operations::DELETE | Operations::UPDATE));
        assert!(!rules[1].applies_to(Operations::READ));
    }
}
