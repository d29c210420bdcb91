//! The declared, unresolved form of a graph schema. Everything here is plain serde data, written
//! by hand in TOML or produced by a front-end as JSON. [`crate::Schema::build`] resolves it.

mod authorization;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{AttributeType, NestedOperation, QueryDirection, RelationshipDirection};

pub use authorization::{
    AuthenticationDeclaration, AuthorizationDeclaration, AuthorizationWhere, FilterRuleDeclaration,
    ValidateRuleDeclaration,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDeclaration {
    #[serde(default)]
    pub nodes: Vec<NodeDeclaration>,
    #[serde(default)]
    pub interfaces: Vec<InterfaceDeclaration>,
    #[serde(default)]
    pub unions: Vec<UnionDeclaration>,
    #[serde(default)]
    pub relationship_properties: Vec<RelationshipPropertiesDeclaration>,
    /// Authentication required for every operation of every entity.
    #[serde(default)]
    pub authentication: Option<AuthenticationDeclaration>,
}

impl SchemaDeclaration {
    pub fn from_toml_str(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }

    pub fn from_json_str(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeDeclaration {
    pub name: String,
    /// Storage labels. Defaults to the node name.
    #[serde(default)]
    pub labels: Vec<String>,
    /// Overrides the inflected plural used for root field names.
    #[serde(default)]
    pub plural: Option<String>,
    #[serde(default)]
    pub implements: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeDeclaration>,
    #[serde(default)]
    pub relationships: Vec<RelationshipDeclaration>,
    #[serde(default)]
    pub authorization: Option<AuthorizationDeclaration>,
    #[serde(default)]
    pub authentication: Option<AuthenticationDeclaration>,
    #[serde(default)]
    pub fulltext_indexes: Vec<FulltextIndexDeclaration>,
    #[serde(default)]
    pub vector_indexes: Vec<VectorIndexDeclaration>,
    #[serde(default)]
    pub limit: Option<LimitDeclaration>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InterfaceDeclaration {
    pub name: String,
    #[serde(default)]
    pub plural: Option<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeDeclaration>,
    /// Abstract relationship signatures. `edge_type` and `direction` are ignored here, every
    /// implementor brings its own.
    #[serde(default)]
    pub relationships: Vec<RelationshipDeclaration>,
    #[serde(default)]
    pub authorization: Option<AuthorizationDeclaration>,
    #[serde(default)]
    pub authentication: Option<AuthenticationDeclaration>,
    #[serde(default)]
    pub limit: Option<LimitDeclaration>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnionDeclaration {
    pub name: String,
    #[serde(default)]
    pub plural: Option<String>,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelationshipPropertiesDeclaration {
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<AttributeDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeDeclaration {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: AttributeType,
    #[serde(default)]
    pub list: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    /// The property name in the store, when it differs from the field name.
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default = "yes")]
    pub filterable: bool,
    #[serde(default = "yes")]
    pub sortable: bool,
    #[serde(default = "yes")]
    pub aggregable: bool,
    #[serde(default)]
    pub settable: SettableDeclaration,
    #[serde(default)]
    pub global_id: bool,
    #[serde(default)]
    pub autogenerate: Option<Autogenerate>,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub authorization: Option<AuthorizationDeclaration>,
    #[serde(default)]
    pub authentication: Option<AuthenticationDeclaration>,
}

impl AttributeDeclaration {
    pub fn new(name: impl Into<String>, ty: AttributeType) -> Self {
        Self {
            name: name.into(),
            ty,
            list: false,
            required: false,
            unique: false,
            alias: None,
            filterable: true,
            sortable: true,
            aggregable: true,
            settable: SettableDeclaration::default(),
            global_id: false,
            autogenerate: None,
            default: None,
            authorization: None,
            authentication: None,
        }
    }
}

fn yes() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettableDeclaration {
    #[serde(default = "yes")]
    pub on_create: bool,
    #[serde(default = "yes")]
    pub on_update: bool,
}

impl Default for SettableDeclaration {
    fn default() -> Self {
        Self {
            on_create: true,
            on_update: true,
        }
    }
}

/// Values the store generates instead of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Autogenerate {
    /// `randomUUID()` on create.
    Id,
    TimestampOnCreate,
    TimestampOnUpdate,
    /// Set on create and refreshed on every update.
    Timestamp,
}

impl Autogenerate {
    pub fn on_create(self) -> bool {
        matches!(self, Self::Id | Self::TimestampOnCreate | Self::Timestamp)
    }

    pub fn on_update(self) -> bool {
        matches!(self, Self::TimestampOnUpdate | Self::Timestamp)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelationshipDeclaration {
    pub name: String,
    /// Name of a node, interface or union.
    pub target: String,
    #[serde(default)]
    pub edge_type: String,
    #[serde(default = "default_direction")]
    pub direction: RelationshipDirection,
    #[serde(default)]
    pub query_direction: QueryDirection,
    #[serde(default)]
    pub list: bool,
    #[serde(default)]
    pub required: bool,
    /// Name of a `relationship_properties` declaration.
    #[serde(default)]
    pub properties: Option<String>,
    #[serde(default = "NestedOperation::all")]
    pub nested_operations: Vec<NestedOperation>,
    #[serde(default = "yes")]
    pub aggregate: bool,
    #[serde(default)]
    pub authentication: Option<AuthenticationDeclaration>,
}

impl RelationshipDeclaration {
    pub fn new(name: impl Into<String>, target: impl Into<String>, edge_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            edge_type: edge_type.into(),
            direction: default_direction(),
            query_direction: QueryDirection::default(),
            list: true,
            required: false,
            properties: None,
            nested_operations: NestedOperation::all(),
            aggregate: true,
            authentication: None,
        }
    }
}

fn default_direction() -> RelationshipDirection {
    RelationshipDirection::Out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FulltextIndexDeclaration {
    pub name: String,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VectorIndexDeclaration {
    pub name: String,
    pub embedding_property: String,
    pub query_name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitDeclaration {
    #[serde(default)]
    pub default: Option<u64>,
    #[serde(default)]
    pub max: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_declaration_with_defaults() {
        let declaration = SchemaDeclaration::from_toml_str(
            r#"
            [[nodes]]
            name = "Movie"

            [[nodes.attributes]]
            name = "title"
            type = "String"

            [[nodes.attributes]]
            name = "genre"
            type = "Genre"
            list = true

            [[nodes.relationships]]
            name = "actors"
            target = "Actor"
            edge_type = "ACTED_IN"
            direction = "IN"
            list = true
            "#,
        )
        .unwrap();

        let movie = &declaration.nodes[0];
        assert_eq!(movie.attributes[0].ty, AttributeType::String);
        assert!(movie.attributes[0].sortable);
        assert_eq!(movie.attributes[1].ty, AttributeType::Custom("Genre".into()));

        let actors = &movie.relationships[0];
        assert_eq!(actors.direction, RelationshipDirection::In);
        assert_eq!(actors.query_direction, QueryDirection::DefaultDirected);
        assert_eq!(actors.nested_operations, NestedOperation::all());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = SchemaDeclaration::from_toml_str(
            r#"
            [[nodes]]
            name = "Movie"
            colour = "blue"
            "#,
        );

        assert!(result.is_err());
    }
}
