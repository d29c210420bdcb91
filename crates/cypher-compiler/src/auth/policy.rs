use graph_schema::{
    AttributeWalker, AuthenticationRule, AuthorizationRule, ConcreteEntityWalker, EntityWalker, RelationshipWalker,
    Schema,
};

/// What an authorization rule can be attached to.
#[derive(Debug, Clone, Copy)]
pub enum RuleTarget<'a> {
    Entity(ConcreteEntityWalker<'a>),
    Attribute(AttributeWalker<'a>),
}

/// What an authentication requirement can be attached to.
#[derive(Debug, Clone, Copy)]
pub enum AuthenticationTarget<'a> {
    Schema(&'a Schema),
    Entity(EntityWalker<'a>),
    Attribute(AttributeWalker<'a>),
    Relationship(RelationshipWalker<'a>),
}

/// Decides which access rules are in effect. The compiler asks for the rules of every entity
/// and attribute it touches and compiles them itself.
pub trait AuthorizationPolicy: Send + Sync {
    fn authorization(&self, target: RuleTarget<'_>) -> Vec<AuthorizationRule>;

    fn authentication(&self, target: AuthenticationTarget<'_>) -> Option<AuthenticationRule>;
}

/// The rules declared in the schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredRules;

impl AuthorizationPolicy for DeclaredRules {
    fn authorization(&self, target: RuleTarget<'_>) -> Vec<AuthorizationRule> {
        match target {
            RuleTarget::Entity(entity) => entity.authorization().to_vec(),
            RuleTarget::Attribute(attribute) => attribute.authorization().to_vec(),
        }
    }

    fn authentication(&self, target: AuthenticationTarget<'_>) -> Option<AuthenticationRule> {
        match target {
            AuthenticationTarget::Schema(schema) => schema.authentication().cloned(),
            AuthenticationTarget::Entity(entity) => entity.authentication().cloned(),
            AuthenticationTarget::Attribute(attribute) => attribute.authentication().cloned(),
            AuthenticationTarget::Relationship(relationship) => relationship.authentication().cloned(),
        }
    }
}
