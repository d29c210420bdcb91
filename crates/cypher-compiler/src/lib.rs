//! Compiles the resolve tree of a GraphQL root field over a [`graph_schema::Schema`] into one
//! parameterized Cypher query.
//!
//! Compilation happens in two steps. Factories resolve the request against the schema into an
//! operation tree, checking authentication and turning authorization rules into predicates on
//! the way. Emission then lowers that tree into Cypher, binding every request value as a
//! parameter. Neither step touches the database.
//!
//! ```ignore
//! let translator = Translator::new(&schema, CompileOptions::default());
//! let query = translator.translate(&tree, &AuthContext::anonymous())?;
//! ```

mod auth;
mod cypher;
mod emit;
mod error;
mod factory;
mod ir;
mod options;
mod request;
mod translate;

#[cfg(test)]
mod tests;

pub use auth::{AuthenticationTarget, AuthorizationPolicy, DeclaredRules, RuleTarget};
pub use error::{Error, ErrorCode, ErrorKind, Result};
pub use options::{CompileOptions, DEFAULT_FORBIDDEN_MESSAGE};
pub use request::{AuthContext, ResolveTree};
pub use translate::{AccessMode, CompiledQuery, Translator};
