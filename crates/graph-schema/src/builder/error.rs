/// A declaration that cannot be resolved into a consistent model. These are schema author
/// mistakes and are reported once, when the schema is built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("Invalid schema declaration: {0}")]
    InvalidDeclaration(String),
    #[error("`{name}` is declared more than once")]
    DuplicateEntity { name: String },
    #[error("`{entity}.{field}` is declared more than once")]
    DuplicateField { entity: String, field: String },
    #[error("Relationship `{entity}.{field}` targets `{target}`, which is neither a node, an interface nor a union")]
    UnknownRelationshipTarget {
        entity: String,
        field: String,
        target: String,
    },
    #[error("Relationship `{entity}.{field}` uses undeclared relationship properties `{properties}`")]
    UnknownRelationshipProperties {
        entity: String,
        field: String,
        properties: String,
    },
    #[error("`{entity}` implements `{interface}`, which is not an interface")]
    UnknownInterface { entity: String, interface: String },
    #[error("Union `{union}` lists `{member}`, which is not a node")]
    InvalidUnionMember { union: String, member: String },
    #[error("`{entity}` implements `{interface}` but does not declare `{field}`")]
    MissingInterfaceField {
        entity: String,
        interface: String,
        field: String,
    },
    #[error("`{entity}.{field}` is incompatible with its declaration on `{interface}`")]
    IncompatibleImplementation {
        entity: String,
        interface: String,
        field: String,
    },
    #[error("Index `{index}` on `{entity}` covers `{field}`, which is not a string attribute of `{entity}`")]
    InvalidIndexField {
        entity: String,
        index: String,
        field: String,
    },
    #[error("Root field `{0}` is derived from more than one entity")]
    DuplicateRootField(String),
}
