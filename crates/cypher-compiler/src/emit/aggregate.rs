use super::{
    read::{import, union},
    Emitter, Scope,
};
use crate::{
    cypher::{Clause, Expr, Order, Projection, ProjectionItem},
    ir::{AggregateField, AggregateOperation, CompositeAggregateOperation},
};

/// Clauses matching the aggregated nodes, and the scope they are bound in.
type Source<'s, 'a> = &'s dyn Fn(&mut Emitter<'a>) -> (Vec<Clause>, Scope);

impl<'a> Emitter<'a> {
    pub(super) fn aggregate(&mut self, aggregate: &AggregateOperation, parent: Option<&Scope>) -> (Vec<Clause>, Expr) {
        let source = |emitter: &mut Emitter<'a>| emitter.aggregate_match(aggregate, parent);

        let mut clauses = import(parent);
        let (calls, value) = self.aggregations(&aggregate.fields, &source);
        clauses.extend(calls);

        (clauses, value)
    }

    /// Aggregates over the nodes of every concrete entity, combined by a `UNION` returning each
    /// node with the edge leading to it.
    pub(super) fn composite_aggregate(
        &mut self,
        aggregate: &CompositeAggregateOperation,
        parent: Option<&Scope>,
    ) -> (Vec<Clause>, Expr) {
        let has_edge = aggregate
            .children
            .first()
            .is_some_and(|child| child.selection.has_edge());

        // A member storing an attribute under another name returns its node as a map keyed
        // like the others.
        let renamed = aggregate
            .children
            .iter()
            .flat_map(|child| &child.properties)
            .any(|(key, property)| key != property);

        let source = |emitter: &mut Emitter<'a>| {
            let node = emitter.env.variable();
            let edge = has_edge.then(|| emitter.env.variable());

            let mut branches = Vec::with_capacity(aggregate.children.len());

            for child in &aggregate.children {
                let (mut clauses, scope) = emitter.aggregate_match(child, parent);

                let row = match renamed {
                    true => Expr::Projection {
                        variable: scope.node.clone(),
                        items: child
                            .properties
                            .iter()
                            .map(|(key, property)| {
                                ProjectionItem::Entry(key.clone(), Expr::variable(&scope.node).property(property))
                            })
                            .collect(),
                    },
                    false => Expr::variable(&scope.node),
                };

                let mut columns = vec![(row, Some(node.clone()))];

                if let (Some(edge), Some(relationship)) = (&edge, &scope.edge) {
                    columns.push((Expr::variable(relationship), Some(edge.clone())));
                }

                clauses.push(Clause::Return(Projection::items(columns)));
                branches.push(clauses);
            }

            let mut clauses = import(parent);
            clauses.push(union(branches, &node));

            let scope = Scope {
                node,
                edge,
                score: None,
            };

            (clauses, scope)
        };

        let mut clauses = import(parent);
        let (calls, value) = self.aggregations(&aggregate.fields, &source);
        clauses.extend(calls);

        (clauses, value)
    }

    fn aggregate_match(&mut self, aggregate: &AggregateOperation, parent: Option<&Scope>) -> (Vec<Clause>, Scope) {
        let mut clauses = import(parent);

        let filters = aggregate.filters.iter().chain(&aggregate.authorization.filter);
        let (anchor, scope) = self.guarded_anchor(&aggregate.selection, parent, filters);

        clauses.push(anchor);
        clauses.extend(self.validate(aggregate.authorization.validate_before.as_ref(), &scope));

        (clauses, scope)
    }

    /// One subquery per aggregated value, each matching the nodes anew, and the map of their
    /// results.
    fn aggregations(&mut self, fields: &[AggregateField], source: Source<'_, 'a>) -> (Vec<Clause>, Expr) {
        let mut calls = Vec::new();
        let mut entries = Vec::with_capacity(fields.len());

        for field in fields {
            match field {
                AggregateField::Count { alias } => {
                    let (mut body, scope) = source(self);
                    let variable = self.env.variable();

                    body.push(Clause::Return(Projection::aliased(
                        Expr::function("count", vec![Expr::variable(&scope.node)]),
                        variable.clone(),
                    )));

                    calls.push(Clause::call(body));
                    entries.push((alias.clone(), Expr::variable(variable)));
                }
                AggregateField::Attribute {
                    alias,
                    owner,
                    property,
                    ty,
                    functions,
                } => {
                    let (mut body, scope) = source(self);
                    let value = scope.owner(*owner).property(property);

                    let results = match ty.is_textual() {
                        // Strings ordered by length, the longest first.
                        true => {
                            let item = self.env.variable();
                            let list = self.env.variable();

                            body.push(Clause::With(Projection {
                                order_by: vec![(Expr::function("size", vec![Expr::variable(&item)]), Order::Descending)],
                                ..Projection::aliased(value, item.clone())
                            }));

                            body.push(Clause::With(Projection::aliased(
                                Expr::function("collect", vec![Expr::variable(item)]),
                                list.clone(),
                            )));

                            functions
                                .iter()
                                .map(|(key, function)| {
                                    let result = Expr::function(function.cypher_function(), vec![Expr::variable(&list)]);
                                    (key.clone(), result)
                                })
                                .collect()
                        }
                        false => functions
                            .iter()
                            .map(|(key, function)| {
                                let result = Expr::function(function.cypher_function(), vec![value.clone()]);
                                (key.clone(), result)
                            })
                            .collect(),
                    };

                    let variable = self.env.variable();
                    body.push(Clause::Return(Projection::aliased(Expr::Map(results), variable.clone())));

                    calls.push(Clause::call(body));
                    entries.push((alias.clone(), Expr::variable(variable)));
                }
                AggregateField::Group { alias, fields } => {
                    let (nested, value) = self.aggregations(fields, source);
                    calls.extend(nested);
                    entries.push((alias.clone(), value));
                }
            }
        }

        (calls, Expr::Map(entries))
    }
}
