use graph_schema::Schema;
use indexmap::IndexMap;
use serde_json::Value;

use crate::{
    auth::{AuthorizationPolicy, Authorizer, DeclaredRules},
    emit::Emitter,
    error::{Error, Result},
    factory::QueryFactory,
    options::CompileOptions,
    request::{AuthContext, ResolveTree},
};

static DECLARED_RULES: DeclaredRules = DeclaredRules;

/// How the compiled query has to be run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, serde::Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AccessMode {
    Read,
    Write,
}

/// A parameterized Cypher query answering one root field.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CompiledQuery {
    pub text: String,
    pub params: IndexMap<String, Value>,
    pub mode: AccessMode,
}

/// Compiles root fields of the GraphQL API of a schema.
pub struct Translator<'a> {
    schema: &'a Schema,
    options: CompileOptions,
    policy: &'a dyn AuthorizationPolicy,
}

impl<'a> Translator<'a> {
    /// A translator enforcing the rules declared in the schema.
    pub fn new(schema: &'a Schema, options: CompileOptions) -> Self {
        Self::with_policy(schema, options, &DECLARED_RULES)
    }

    pub fn with_policy(schema: &'a Schema, options: CompileOptions, policy: &'a dyn AuthorizationPolicy) -> Self {
        Self {
            schema,
            options,
            policy,
        }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compiles one root field for the caller. Compiling the same field with the same context
    /// always yields the same text and parameters.
    pub fn translate(&self, tree: &ResolveTree, auth: &AuthContext) -> Result<CompiledQuery> {
        let span = tracing::debug_span!("translate", field = %tree.name);
        let _guard = span.enter();

        let root = self
            .schema
            .root_field(&tree.name)
            .ok_or_else(|| Error::UnknownRootField(tree.name.clone()))?;

        let factory = QueryFactory::new(self.schema, Authorizer::new(self.policy, auth));
        let operation = factory.root(root, tree)?;

        let mode = match operation.is_mutation() {
            true => AccessMode::Write,
            false => AccessMode::Read,
        };

        let (text, params) = Emitter::new(&self.options, auth).emit(&operation);

        tracing::debug!(%mode, params = params.len(), "compiled query:\n{text}");

        Ok(CompiledQuery { text, params, mode })
    }
}
