//! Authentication and authorization. Authentication is decided while compiling and fails
//! immediately. Authorization rules are compiled into predicates that travel with the query.

mod jwt;
mod policy;

pub use policy::{AuthenticationTarget, AuthorizationPolicy, DeclaredRules, RuleTarget};

use graph_schema::{AttributeWalker, AuthorizationRule, AuthorizationWhere, ConcreteEntityWalker, Operations};

use crate::{
    error::{Error, Result},
    factory::FilterParser,
    ir::{AuthorizationFilters, ComparisonOperator, Filter},
    request::AuthContext,
};

/// The authorization capability handed to every factory.
#[derive(Clone, Copy)]
pub(crate) struct Authorizer<'a> {
    policy: &'a dyn AuthorizationPolicy,
    context: &'a AuthContext,
}

impl<'a> Authorizer<'a> {
    pub fn new(policy: &'a dyn AuthorizationPolicy, context: &'a AuthContext) -> Self {
        Self { policy, context }
    }

    pub fn context(&self) -> &'a AuthContext {
        self.context
    }

    /// Fails unless the caller satisfies the authentication required for `operations` on the
    /// target.
    pub fn authenticate(&self, target: AuthenticationTarget<'_>, operations: Operations) -> Result<()> {
        let Some(rule) = self.policy.authentication(target) else {
            return Ok(());
        };

        if !rule.operations.intersects(operations) {
            return Ok(());
        }

        if !self.context.is_authenticated {
            tracing::debug!(operations = ?operations, "unauthenticated caller");
            return Err(Error::Unauthenticated);
        }

        match rule.jwt {
            Some(condition) if !jwt::matches(&condition, &self.context.jwt) => {
                tracing::debug!(operations = ?operations, "claims do not satisfy the authentication rule");
                Err(Error::Forbidden)
            }
            _ => Ok(()),
        }
    }

    /// Compiles the rules of the entity, and of the attributes in scope, that apply to
    /// `operations`. Rules of one target are alternatives, targets must all be satisfied.
    pub fn filters(
        &self,
        entity: ConcreteEntityWalker<'a>,
        attributes: &[AttributeWalker<'a>],
        operations: Operations,
    ) -> Result<AuthorizationFilters> {
        let mut groups = vec![self.policy.authorization(RuleTarget::Entity(entity))];

        for attribute in attributes {
            groups.push(self.policy.authorization(RuleTarget::Attribute(*attribute)));
        }

        let filter_operations = operations.difference(Operations::CREATE);

        let mut filters = AuthorizationFilters::default();

        for rules in groups {
            let group = AuthorizationFilters {
                filter: self.compile_any(entity, &rules, |rule| {
                    rule.is_filter() && rule.applies_to(filter_operations)
                })?,
                validate_before: self.compile_any(entity, &rules, |rule| {
                    rule.validates_before() && rule.applies_to(operations)
                })?,
                validate_after: self.compile_any(entity, &rules, |rule| {
                    rule.validates_after() && rule.applies_to(operations)
                })?,
            };

            filters = filters.merge(group);
        }

        Ok(filters)
    }

    fn compile_any(
        &self,
        entity: ConcreteEntityWalker<'a>,
        rules: &[AuthorizationRule],
        applies: impl Fn(&AuthorizationRule) -> bool,
    ) -> Result<Option<Filter>> {
        let mut alternatives = Vec::new();

        for rule in rules.iter().filter(|&rule| applies(rule)) {
            alternatives.push(self.compile_rule(entity, rule)?);
        }

        Ok(Filter::any(alternatives))
    }

    fn compile_rule(&self, entity: ConcreteEntityWalker<'a>, rule: &AuthorizationRule) -> Result<Filter> {
        let predicate = self.compile_where(entity, &rule.predicate)?;

        let authenticated = rule.require_authentication.then_some(Filter::Authenticated);

        Ok(Filter::all(authenticated.into_iter().chain(predicate)).unwrap_or(Filter::Constant(true)))
    }

    fn compile_where(&self, entity: ConcreteEntityWalker<'a>, predicate: &AuthorizationWhere) -> Result<Option<Filter>> {
        let mut parts = Vec::new();

        if let Some(node) = &predicate.node {
            parts.extend(FilterParser::authorization().concrete_where(entity, node)?);
        }

        if let Some(jwt) = &predicate.jwt {
            for (key, value) in jwt {
                let (path, operator, negated) =
                    ComparisonOperator::split(key).unwrap_or((key.as_str(), ComparisonOperator::Equal, false));

                let filter = Filter::Claim {
                    path: path.split('.').map(str::to_string).collect(),
                    operator,
                    value: value.clone(),
                };

                parts.push(if negated { filter.negate() } else { filter });
            }
        }

        let mut and = Vec::new();

        for predicate in &predicate.and {
            and.extend(self.compile_where(entity, predicate)?);
        }

        parts.extend(Filter::all(and));

        let mut or = Vec::new();

        for predicate in &predicate.or {
            or.push(self.compile_where(entity, predicate)?.unwrap_or(Filter::Constant(true)));
        }

        parts.extend(Filter::any(or));

        if let Some(not) = &predicate.not {
            parts.extend(self.compile_where(entity, not)?.map(Filter::negate));
        }

        Ok(Filter::all(parts))
    }
}
