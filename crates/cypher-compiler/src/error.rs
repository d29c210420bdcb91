use graphql_cursor::CursorError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unknown root field `{0}`")]
    UnknownRootField(String),
    #[error("`{entity}` has no relationship `{relationship}`")]
    UnknownRelationship { entity: String, relationship: String },
    #[error("Cannot connect or create `{entity}`, it has no unique attributes")]
    MissingUniqueAttributes { entity: String },
    #[error("`{entity}` is not a member of `{parent}`")]
    UnknownEntity { entity: String, parent: String },
    #[error("Relationship `{entity}.{relationship}` does not allow nested `{operation}`")]
    NestedOperationNotAllowed {
        entity: String,
        relationship: String,
        operation: String,
    },
    #[error(transparent)]
    InvalidCursor(#[from] CursorError),
    #[error("Only one full-text or vector index can be queried at a time")]
    AmbiguousIndexSearch,
    #[error("Property `{property}` of `{entity}` is written more than once")]
    ConflictingPropertyWrites { entity: String, property: String },
    #[error("Invalid argument `{argument}`: {reason}")]
    InvalidArgument { argument: String, reason: String },
    #[error("`{entity}` has no field `{field}`")]
    UnknownField { entity: String, field: String },
    #[error("Unauthenticated")]
    Unauthenticated,
    #[error("Forbidden")]
    Forbidden,
}

/// Who has to act on an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ErrorKind {
    /// The schema or its declarations are wrong. Fatal for the whole compilation.
    Configuration,
    /// The request is wrong and the caller can fix it.
    UserInput,
    Authentication,
    Authorization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr, strum::IntoStaticStr, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    SchemaMisconfigured,
    BadRequest,
    InvalidCursor,
    Unauthenticated,
    Forbidden,
}

impl Error {
    pub(crate) fn invalid_argument(argument: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            argument: argument.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unknown_field(entity: impl Into<String>, field: impl Into<String>) -> Self {
        Error::UnknownField {
            entity: entity.into(),
            field: field.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnknownRootField(_)
            | Error::UnknownRelationship { .. }
            | Error::MissingUniqueAttributes { .. }
            | Error::UnknownEntity { .. }
            | Error::NestedOperationNotAllowed { .. } => ErrorKind::Configuration,
            Error::InvalidCursor(_)
            | Error::AmbiguousIndexSearch
            | Error::ConflictingPropertyWrites { .. }
            | Error::InvalidArgument { .. }
            | Error::UnknownField { .. } => ErrorKind::UserInput,
            Error::Unauthenticated => ErrorKind::Authentication,
            Error::Forbidden => ErrorKind::Authorization,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Error::InvalidCursor(_) => ErrorCode::InvalidCursor,
            Error::Unauthenticated => ErrorCode::Unauthenticated,
            Error::Forbidden => ErrorCode::Forbidden,
            _ => match self.kind() {
                ErrorKind::Configuration => ErrorCode::SchemaMisconfigured,
                _ => ErrorCode::BadRequest,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_errors_are_user_errors() {
        let error = Error::from(CursorError::Malformed("abc".into()));

        assert_eq!(error.kind(), ErrorKind::UserInput);
        assert_eq!(error.code().as_ref(), "INVALID_CURSOR");
        assert_eq!(error.to_string(), "Cursor `abc` does not point to a connection offset");
    }

    #[test]
    fn codes() {
        assert_eq!(
            Error::MissingUniqueAttributes { entity: "Movie".into() }.code(),
            ErrorCode::SchemaMisconfigured
        );
        assert_eq!(Error::AmbiguousIndexSearch.code(), ErrorCode::BadRequest);
        assert_eq!(Error::Forbidden.kind(), ErrorKind::Authorization);
        assert_eq!(ErrorCode::Unauthenticated.to_string(), "UNAUTHENTICATED");
    }
}
