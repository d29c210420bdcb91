use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    declaration::{AttributeDeclaration, Autogenerate},
    AuthenticationRule, AuthorizationRule, ConcreteEntityId, InterfaceEntityId, RelationshipPropertiesId,
};

/// The declared type of an attribute, without list wrapping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AttributeType {
    Id,
    String,
    Int,
    BigInt,
    Float,
    Boolean,
    Date,
    DateTime,
    LocalDateTime,
    Time,
    LocalTime,
    Duration,
    Point,
    CartesianPoint,
    /// An enum or a custom scalar. Compared for equality and membership only.
    Custom(String),
}

impl AttributeType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::BigInt | Self::Float)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            Self::Date | Self::DateTime | Self::LocalDateTime | Self::Time | Self::LocalTime | Self::Duration
        )
    }

    pub fn is_spatial(&self) -> bool {
        matches!(self, Self::Point | Self::CartesianPoint)
    }

    pub fn is_textual(&self) -> bool {
        matches!(self, Self::Id | Self::String)
    }

    /// The Cypher function turning a parameter into a value of this type, if the driver cannot
    /// send one natively.
    pub fn cypher_constructor(&self) -> Option<&'static str> {
        match self {
            Self::Date => Some("date"),
            Self::DateTime => Some("datetime"),
            Self::LocalDateTime => Some("localdatetime"),
            Self::Time => Some("time"),
            Self::LocalTime => Some("localtime"),
            Self::Duration => Some("duration"),
            Self::Point | Self::CartesianPoint => Some("point"),
            _ => None,
        }
    }

    fn supports_aggregation(&self) -> bool {
        self.is_numeric() || self.is_temporal() || self.is_textual()
    }
}

impl From<String> for AttributeType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "ID" => Self::Id,
            "String" => Self::String,
            "Int" => Self::Int,
            "BigInt" => Self::BigInt,
            "Float" => Self::Float,
            "Boolean" => Self::Boolean,
            "Date" => Self::Date,
            "DateTime" => Self::DateTime,
            "LocalDateTime" => Self::LocalDateTime,
            "Time" => Self::Time,
            "LocalTime" => Self::LocalTime,
            "Duration" => Self::Duration,
            "Point" => Self::Point,
            "CartesianPoint" => Self::CartesianPoint,
            _ => Self::Custom(value),
        }
    }
}

impl From<&str> for AttributeType {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<AttributeType> for String {
    fn from(ty: AttributeType) -> Self {
        ty.to_string()
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Id => "ID",
            Self::String => "String",
            Self::Int => "Int",
            Self::BigInt => "BigInt",
            Self::Float => "Float",
            Self::Boolean => "Boolean",
            Self::Date => "Date",
            Self::DateTime => "DateTime",
            Self::LocalDateTime => "LocalDateTime",
            Self::Time => "Time",
            Self::LocalTime => "LocalTime",
            Self::Duration => "Duration",
            Self::Point => "Point",
            Self::CartesianPoint => "CartesianPoint",
            Self::Custom(name) => name,
        };

        f.write_str(name)
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u8 {
        const SORTABLE = 1;
        const FILTERABLE = 1 << 1;
        const AGGREGABLE = 1 << 2;
        const UNIQUE = 1 << 3;
        const CREATABLE = 1 << 4;
        const UPDATABLE = 1 << 5;
        const GLOBAL_ID = 1 << 6;
    }
}

impl Capabilities {
    pub(crate) fn derive(declaration: &AttributeDeclaration) -> Self {
        let ty = &declaration.ty;
        let mut capabilities = Self::empty();

        capabilities.set(Self::FILTERABLE, declaration.filterable);
        capabilities.set(
            Self::SORTABLE,
            declaration.sortable && !declaration.list && !ty.is_spatial(),
        );
        capabilities.set(
            Self::AGGREGABLE,
            declaration.aggregable && !declaration.list && ty.supports_aggregation(),
        );
        capabilities.set(
            Self::UNIQUE,
            declaration.unique || declaration.autogenerate == Some(Autogenerate::Id),
        );
        capabilities.set(
            Self::CREATABLE,
            declaration.settable.on_create && declaration.autogenerate.is_none(),
        );
        capabilities.set(
            Self::UPDATABLE,
            declaration.settable.on_update && declaration.autogenerate.is_none(),
        );
        capabilities.set(Self::GLOBAL_ID, declaration.global_id);

        capabilities
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOwner {
    Concrete(ConcreteEntityId),
    Interface(InterfaceEntityId),
    RelationshipProperties(RelationshipPropertiesId),
}

#[derive(Debug, Clone)]
pub struct AttributeRecord {
    pub(crate) name: String,
    pub(crate) storage_name: String,
    pub(crate) ty: AttributeType,
    pub(crate) list: bool,
    pub(crate) required: bool,
    pub(crate) capabilities: Capabilities,
    pub(crate) autogenerate: Option<Autogenerate>,
    pub(crate) default: Option<Value>,
    pub(crate) authorization: Vec<AuthorizationRule>,
    pub(crate) authentication: Option<AuthenticationRule>,
    pub(crate) owner: AttributeOwner,
}

impl AttributeRecord {
    pub(crate) fn new(declaration: &AttributeDeclaration, owner: AttributeOwner) -> Self {
        Self {
            name: declaration.name.clone(),
            storage_name: declaration.alias.clone().unwrap_or_else(|| declaration.name.clone()),
            ty: declaration.ty.clone(),
            list: declaration.list,
            required: declaration.required,
            capabilities: Capabilities::derive(declaration),
            autogenerate: declaration.autogenerate,
            default: declaration.default.clone(),
            authorization: declaration
                .authorization
                .as_ref()
                .map(crate::authorization::resolve_authorization)
                .unwrap_or_default(),
            authentication: declaration.authentication.as_ref().map(AuthenticationRule::from),
            owner,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::plain("String", false, None, Capabilities::all() - Capabilities::UNIQUE - Capabilities::GLOBAL_ID)]
    #[case::list("String", true, None, Capabilities::FILTERABLE | Capabilities::CREATABLE | Capabilities::UPDATABLE)]
    #[case::boolean(
        "Boolean",
        false,
        None,
        Capabilities::FILTERABLE | Capabilities::SORTABLE | Capabilities::CREATABLE | Capabilities::UPDATABLE
    )]
    #[case::point("Point", false, None, Capabilities::FILTERABLE | Capabilities::CREATABLE | Capabilities::UPDATABLE)]
    #[case::generated_id("ID", false, Some(Autogenerate::Id), Capabilities::FILTERABLE | Capabilities::SORTABLE | Capabilities::AGGREGABLE | Capabilities::UNIQUE)]
    #[case::timestamp("DateTime", false, Some(Autogenerate::Timestamp), Capabilities::FILTERABLE | Capabilities::SORTABLE | Capabilities::AGGREGABLE)]
    fn capabilities(
        #[case] ty: &str,
        #[case] list: bool,
        #[case] autogenerate: Option<Autogenerate>,
        #[case] expected: Capabilities,
    ) {
        let mut declaration = AttributeDeclaration::new("field", AttributeType::from(ty));
        declaration.list = list;
        declaration.autogenerate = autogenerate;

        assert_eq!(Capabilities::derive(&declaration), expected);
    }

    #[test]
    fn custom_types_round_trip_through_their_name() {
        assert_eq!(AttributeType::from("Genre"), AttributeType::Custom("Genre".into()));
        assert_eq!(String::from(AttributeType::Id), "ID");
        assert_eq!(AttributeType::DateTime.cypher_constructor(), Some("datetime"));
        assert_eq!(AttributeType::Int.cypher_constructor(), None);
    }
}
