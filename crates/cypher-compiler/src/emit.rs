//! Lowers an [`Operation`] into Cypher clauses and a parameter table. Every operation anchors its
//! nodes in a [`Scope`] of fresh variables, and every nested operation is a `CALL` subquery
//! importing the node in scope of its parent, so sibling and ancestor variables never collide.

mod aggregate;
mod filter;
mod mutation;
mod read;

use graph_schema::AttributeType;
use indexmap::IndexMap;
use serde_json::Value;

use crate::{
    cypher::{render, BinaryOp, Clause, Environment, Expr, NodePattern, Pattern, Projection, ROOT_VARIABLE},
    ir::{
        Filter, MathOperator, NodeTarget, Operation, Pagination, PropertyOwner, Selection, Sort, SortKey, WriteValue,
    },
    options::CompileOptions,
    request::AuthContext,
};

/// Column of the root row of a read, a connection or an aggregation.
const ROOT_COLUMN: &str = ROOT_VARIABLE;

/// Column of the root row of a create or an update.
const MUTATION_COLUMN: &str = "data";

/// The variables an operation binds for the nodes it matches.
#[derive(Debug, Clone)]
pub(crate) struct Scope {
    pub node: String,
    /// The relationship leading to the node from the parent scope.
    pub edge: Option<String>,
    /// The index score of the node.
    pub score: Option<String>,
}

impl Scope {
    fn node(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            edge: None,
            score: None,
        }
    }

    fn owner(&self, owner: PropertyOwner) -> Expr {
        match (owner, &self.edge) {
            (PropertyOwner::Edge, Some(edge)) => Expr::variable(edge),
            _ => Expr::variable(&self.node),
        }
    }
}

pub(crate) struct Emitter<'a> {
    env: Environment,
    options: &'a CompileOptions,
    auth: &'a AuthContext,
}

impl<'a> Emitter<'a> {
    pub fn new(options: &'a CompileOptions, auth: &'a AuthContext) -> Self {
        Self {
            env: Environment::default(),
            options,
            auth,
        }
    }

    /// The query text, prefixed by the configured preamble, and its parameters.
    pub fn emit(mut self, operation: &Operation) -> (String, IndexMap<String, Value>) {
        let clauses = self.root(operation);
        let text = render(&clauses);

        let text = match self.options.preamble() {
            Some(preamble) => format!("{preamble}\n{text}"),
            None => text,
        };

        (text, self.env.into_params())
    }

    fn root(&mut self, operation: &Operation) -> Vec<Clause> {
        let (mut clauses, value, column) = match operation {
            Operation::Read(read) => {
                let (clauses, row) = self.read_rows(read, None);
                (clauses, row, ROOT_COLUMN)
            }
            Operation::CompositeRead(read) => {
                let (clauses, row) = self.composite_read_rows(read, None);
                (clauses, Expr::variable(row), ROOT_COLUMN)
            }
            Operation::Connection(connection) => {
                let (clauses, value) = self.connection(connection, None);
                (clauses, value, ROOT_COLUMN)
            }
            Operation::CompositeConnection(connection) => {
                let (clauses, value) = self.composite_connection(connection, None);
                (clauses, value, ROOT_COLUMN)
            }
            Operation::Aggregate(aggregate) => {
                let (clauses, value) = self.aggregate(aggregate, None);
                (clauses, value, ROOT_COLUMN)
            }
            Operation::CompositeAggregate(aggregate) => {
                let (clauses, value) = self.composite_aggregate(aggregate, None);
                (clauses, value, ROOT_COLUMN)
            }
            Operation::Create(create) => {
                let (clauses, value) = self.create(create);
                (clauses, value, MUTATION_COLUMN)
            }
            Operation::Update(update) => {
                let (clauses, value) = self.update(update);
                (clauses, value, MUTATION_COLUMN)
            }
            // Nothing is read back from deleted nodes.
            Operation::Delete(delete) => return self.delete(delete, None),
        };

        clauses.push(Clause::Return(Projection::aliased(value, column)));
        clauses
    }

    /// A subquery computing a nested operation for each node of `parent`, and the variable its
    /// result is bound to.
    fn nested(&mut self, operation: &Operation, parent: &Scope) -> (Clause, String) {
        let (mut body, value) = match operation {
            Operation::Read(read) => {
                let (clauses, row) = self.read_rows(read, Some(parent));
                (clauses, read::collect(row, read.cardinality))
            }
            Operation::CompositeRead(read) => {
                let (clauses, row) = self.composite_read_rows(read, Some(parent));
                (clauses, read::collect(Expr::variable(row), read.cardinality))
            }
            Operation::Connection(connection) => self.connection(connection, Some(parent)),
            Operation::CompositeConnection(connection) => self.composite_connection(connection, Some(parent)),
            Operation::Aggregate(aggregate) => self.aggregate(aggregate, Some(parent)),
            Operation::CompositeAggregate(aggregate) => self.composite_aggregate(aggregate, Some(parent)),
            // Mutations are only ever root fields.
            Operation::Create(_) | Operation::Update(_) => (Vec::new(), Expr::Null),
            Operation::Delete(delete) => return self.nested_delete(delete, parent),
        };

        let variable = self.env.variable();
        body.push(Clause::Return(Projection::aliased(value, variable.clone())));

        (Clause::call(body), variable)
    }

    /// The clause anchoring the nodes of a selection, without its `WHERE`, and the scope it
    /// binds. Root selections bind the root variable.
    fn anchor(&mut self, selection: &Selection, parent: Option<&Scope>) -> (Clause, Scope) {
        let node = match parent {
            Some(_) => self.env.node(),
            None => ROOT_VARIABLE.to_string(),
        };

        let target = selection.target();

        match selection {
            Selection::Node { .. } => {
                let pattern = Pattern::node(NodePattern::new(&node).labels(target.pattern_labels()));
                (match_clause(pattern), Scope::node(node))
            }
            Selection::Relationship {
                edge_type, direction, ..
            } => {
                let edge = self.env.node();
                let parent = parent.map(|scope| scope.node.as_str()).unwrap_or(ROOT_VARIABLE);

                let pattern = Pattern::related(
                    NodePattern::new(parent),
                    Some(edge.clone()),
                    edge_type,
                    *direction,
                    NodePattern::new(&node).labels(target.pattern_labels()),
                );

                let scope = Scope {
                    node,
                    edge: Some(edge),
                    score: None,
                };

                (match_clause(pattern), scope)
            }
            Selection::Fulltext { index, phrase, .. } => {
                let score = self.env.variable();
                let args = vec![Expr::string(index), self.env.param(phrase.clone())];

                self.index_probe("db.index.fulltext.queryNodes", args, node, score, target)
            }
            Selection::Vector {
                index,
                vector,
                neighbours,
                ..
            } => {
                let score = self.env.variable();

                let args = vec![
                    Expr::string(index),
                    self.env.param(Value::from(*neighbours)),
                    self.env.param(vector.clone()),
                ];

                self.index_probe("db.index.vector.queryNodes", args, node, score, target)
            }
        }
    }

    fn index_probe(
        &mut self,
        procedure: &'static str,
        args: Vec<Expr>,
        node: String,
        score: String,
        target: &NodeTarget,
    ) -> (Clause, Scope) {
        let labels = Expr::HasLabels {
            variable: node.clone(),
            labels: target.pattern_labels().to_vec(),
        };

        let clause = Clause::Procedure {
            name: procedure,
            args,
            yields: vec![("node", node.clone()), ("score", score.clone())],
            predicate: Some(labels),
        };

        let scope = Scope {
            node,
            edge: None,
            score: Some(score),
        };

        (clause, scope)
    }

    /// The anchoring clause guarded by the filters, which also have to hold for a node of an
    /// abstract target to carry one of its label sets.
    fn guarded_anchor<'f>(
        &mut self,
        selection: &Selection,
        parent: Option<&Scope>,
        filters: impl IntoIterator<Item = &'f Filter>,
    ) -> (Clause, Scope) {
        let (mut clause, scope) = self.anchor(selection, parent);

        let mut predicates: Vec<Expr> = target_predicate(selection.target(), &scope.node).into_iter().collect();

        for filter in filters {
            predicates.push(self.predicate(filter, &scope));
        }

        match &mut clause {
            Clause::Match { predicate, .. } | Clause::Procedure { predicate, .. } => {
                *predicate = condition(predicate.take().into_iter().chain(predicates));
            }
            _ => (),
        }

        (clause, scope)
    }

    /// `WITH * WHERE apoc.util.validatePredicate(NOT (predicate), message, [0])`, raising the
    /// forbidden error for a row the predicate does not hold for.
    fn validate(&mut self, filter: Option<&Filter>, scope: &Scope) -> Option<Clause> {
        let predicate = self.predicate(filter?, scope);

        Some(Clause::guard(Expr::function(
            "apoc.util.validatePredicate",
            vec![
                predicate.not(),
                Expr::string(&self.options.forbidden_message),
                Expr::List(vec![Expr::Integer(0)]),
            ],
        )))
    }

    /// `ORDER BY`, `SKIP` and `LIMIT` of a projection. Projected keys are read from `row`.
    fn paginate(&self, projection: &mut Projection, sort: &[Sort], pagination: Pagination, scope: &Scope, row: &str) {
        for sort in sort {
            let key = match &sort.key {
                SortKey::Property { owner, property } => scope.owner(*owner).property(property),
                SortKey::Score => Expr::variable(scope.score.as_deref().unwrap_or(&scope.node)),
                SortKey::Projected(path) => path.iter().fold(Expr::variable(row), |expr, key| expr.property(key)),
            };

            projection.order_by.push((key, sort.order));
        }

        projection.skip = pagination.skip.filter(|skip| *skip > 0).map(integer);
        projection.limit = pagination.limit.map(integer);
    }

    /// The value written by an assignment to `target`.
    fn write_value(&mut self, target: Expr, ty: &AttributeType, value: &WriteValue) -> Expr {
        match value {
            WriteValue::Value(value) => self.typed_param(ty, value),
            WriteValue::Math(operator, value) => {
                let param = self.env.param(value.clone());
                Expr::binary(arithmetic(*operator), target, param)
            }
            WriteValue::Push(value) => {
                let param = self.typed_param(ty, value);
                Expr::binary(BinaryOp::Add, target, param)
            }
            WriteValue::Pop(value) => {
                let param = self.env.param(value.clone());
                let end = Expr::binary(
                    BinaryOp::Subtract,
                    Expr::function("size", vec![target.clone()]),
                    param,
                );

                Expr::Slice {
                    list: Box::new(target),
                    from: None,
                    to: Some(Box::new(end)),
                }
            }
            WriteValue::RandomUuid => Expr::function("randomUUID", Vec::new()),
            WriteValue::Now => Expr::function(ty.cypher_constructor().unwrap_or("datetime"), Vec::new()),
        }
    }

    /// Binds a value as a parameter, converted by the constructor of the type. Lists are
    /// converted element by element.
    fn typed_param(&mut self, ty: &AttributeType, value: &Value) -> Expr {
        let param = self.env.param(value.clone());

        match (ty.cypher_constructor(), value) {
            (None, _) | (_, Value::Null) => param,
            (Some(constructor), Value::Array(_)) => {
                let variable = self.env.variable();

                Expr::Comprehension {
                    variable: variable.clone(),
                    list: Box::new(param),
                    map: Box::new(Expr::function(constructor, vec![Expr::variable(variable)])),
                }
            }
            (Some(constructor), _) => Expr::function(constructor, vec![param]),
        }
    }

    /// `$jwt.<path>`
    fn claim(&mut self, path: &[String]) -> Expr {
        let auth = self.auth;
        let jwt = self.env.named_param("jwt", || Value::Object(auth.jwt.clone()));

        path.iter().fold(jwt, |expr, key| expr.property(key))
    }

    fn is_authenticated(&mut self) -> Expr {
        let auth = self.auth;
        self.env.named_param("isAuthenticated", || Value::Bool(auth.is_authenticated))
    }
}

fn match_clause(pattern: Pattern) -> Clause {
    Clause::Match {
        optional: false,
        pattern,
        predicate: None,
    }
}

/// The label test of a target with several alternatives. A single alternative is written into
/// the pattern itself.
fn target_predicate(target: &NodeTarget, variable: &str) -> Option<Expr> {
    match target.alternatives.as_slice() {
        [_] => None,
        alternatives => Some(Expr::or(alternatives.iter().map(|labels| Expr::HasLabels {
            variable: variable.to_string(),
            labels: labels.clone(),
        }))),
    }
}

/// The conjunction of the predicates, `None` when it is trivially true.
fn condition(predicates: impl IntoIterator<Item = Expr>) -> Option<Expr> {
    match Expr::and(predicates) {
        Expr::Boolean(true) => None,
        predicate => Some(predicate),
    }
}

fn integer(value: u64) -> Expr {
    Expr::Integer(i64::try_from(value).unwrap_or(i64::MAX))
}

/// `WITH *` carrying sort and pagination, `None` when there are neither.
fn ordering(projection: Projection) -> Option<Clause> {
    projection.has_modifiers().then_some(Clause::With(projection))
}

fn arithmetic(operator: MathOperator) -> BinaryOp {
    match operator {
        MathOperator::Add => BinaryOp::Add,
        MathOperator::Subtract => BinaryOp::Subtract,
        MathOperator::Multiply => BinaryOp::Multiply,
        MathOperator::Divide => BinaryOp::Divide,
    }
}
