use super::{read::import, Emitter, Scope, ROOT_COLUMN};
use crate::{
    cypher::{Clause, Expr, NodePattern, Pattern, Projection, SetItem},
    ir::{
        ConnectOrCreate, CreateInput, CreateOperation, DeleteOperation, DisconnectMutation, NestedMutation,
        NodeTarget, PropertyWrite, RelationshipMutation, ResultProjection, Selection, UpdateInput, UpdateOperation,
    },
};

impl Emitter<'_> {
    /// One subquery creating each input node, then the created nodes unwound into the root
    /// variable and projected.
    pub(super) fn create(&mut self, create: &CreateOperation) -> (Vec<Clause>, Expr) {
        let mut clauses = Vec::with_capacity(create.inputs.len() + 2);
        let mut created = Vec::with_capacity(create.inputs.len());

        for input in &create.inputs {
            let node = self.env.node();
            let mut body = self.create_node(input, &node);

            let variable = self.env.variable();
            body.push(Clause::Return(Projection::aliased(Expr::variable(&node), variable.clone())));

            clauses.push(Clause::call(body));
            created.push(Expr::variable(variable));
        }

        clauses.push(Clause::Unwind {
            list: Expr::List(created),
            alias: ROOT_COLUMN.to_string(),
        });

        let (projection, value) = self.result(create.projection.as_ref(), false);
        clauses.extend(projection);

        (clauses, value)
    }

    pub(super) fn update(&mut self, update: &UpdateOperation) -> (Vec<Clause>, Expr) {
        let filters = update.filters.iter().chain(&update.authorization.filter);
        let (anchor, scope) = self.guarded_anchor(&update.selection, None, filters);

        let mut clauses = vec![anchor];
        clauses.extend(self.validate(update.authorization.validate_before.as_ref(), &scope));

        let assignments = self.assignments(&scope.node, &update.properties);
        clauses.extend(set(assignments));

        clauses.extend(self.relationship_mutations(&update.mutations, &scope));
        clauses.extend(self.validate(update.authorization.validate_after.as_ref(), &scope));

        let (projection, value) = self.result(update.projection.as_ref(), true);
        clauses.extend(projection);

        (clauses, value)
    }

    /// Deletes the matched nodes once the nested deletes reached from them are done.
    pub(super) fn delete(&mut self, delete: &DeleteOperation, parent: Option<&Scope>) -> Vec<Clause> {
        let (mut clauses, scope) = self.delete_match(delete, parent);

        clauses.push(Clause::Delete {
            detach: true,
            targets: vec![Expr::variable(scope.node)],
        });

        clauses
    }

    /// Collects the related nodes to delete, and deletes them in a subquery of their own so
    /// every row of the parent is visited before any node disappears.
    pub(super) fn nested_delete(&mut self, delete: &DeleteOperation, parent: &Scope) -> (Clause, String) {
        let (mut body, scope) = self.delete_match(delete, Some(parent));

        let deleted = self.env.variable();
        let item = self.env.variable();

        body.push(Clause::With(Projection::aliased(
            Expr::distinct_function("collect", vec![Expr::variable(scope.node)]),
            deleted.clone(),
        )));

        body.push(Clause::call(vec![
            Clause::import([deleted.clone()]),
            Clause::Unwind {
                list: Expr::variable(deleted),
                alias: item.clone(),
            },
            Clause::Delete {
                detach: true,
                targets: vec![Expr::variable(item)],
            },
        ]));

        let variable = self.env.variable();
        body.push(count_rows(&variable));

        (Clause::call(body), variable)
    }

    /// The match of the nodes to delete with its guards, followed by the nested deletes.
    fn delete_match(&mut self, delete: &DeleteOperation, parent: Option<&Scope>) -> (Vec<Clause>, Scope) {
        let mut clauses = import(parent);

        let filters = delete.filters.iter().chain(&delete.authorization.filter);
        let (anchor, scope) = self.guarded_anchor(&delete.selection, parent, filters);

        clauses.push(anchor);
        clauses.extend(self.validate(delete.authorization.validate_before.as_ref(), &scope));

        for nested in &delete.nested {
            let (call, _) = self.nested_delete(nested, &scope);
            clauses.push(call);
        }

        (clauses, scope)
    }

    /// `CREATE` and `SET` of a new node, its nested mutations and its validation.
    fn create_node(&mut self, input: &CreateInput, node: &str) -> Vec<Clause> {
        let mut clauses = vec![Clause::Create(Pattern::node(
            NodePattern::new(node).labels(&input.labels),
        ))];

        let assignments = self.assignments(node, &input.properties);
        clauses.extend(set(assignments));

        let scope = Scope::node(node);
        clauses.extend(self.relationship_mutations(&input.mutations, &scope));
        clauses.extend(self.validate(input.validate_after.as_ref(), &scope));

        clauses
    }

    /// The mutated nodes in the root variable, read back with the fields of the projection.
    /// Without a projection, the value is their count.
    fn result(&mut self, projection: Option<&ResultProjection>, distinct: bool) -> (Vec<Clause>, Expr) {
        let scope = Scope::node(ROOT_COLUMN);

        let Some(projection) = projection else {
            let count = match distinct {
                true => Expr::distinct_function("count", vec![Expr::variable(&scope.node)]),
                false => Expr::function("count", vec![Expr::variable(&scope.node)]),
            };

            return (Vec::new(), count);
        };

        let mut clauses = Vec::new();

        if let Some(filter) = &projection.authorization.filter {
            let predicate = self.predicate(filter, &scope);
            clauses.push(Clause::guard(predicate));
        }

        clauses.extend(self.validate(projection.authorization.validate_before.as_ref(), &scope));

        let (calls, row) = self.row(&projection.fields, &scope);
        clauses.extend(calls);

        let value = match distinct {
            true => Expr::distinct_function("collect", vec![row]),
            false => Expr::function("collect", vec![row]),
        };

        (clauses, value)
    }

    /// One subquery per nested mutation of the node in scope.
    fn relationship_mutations(&mut self, mutations: &[RelationshipMutation], scope: &Scope) -> Vec<Clause> {
        mutations
            .iter()
            .map(|mutation| self.relationship_mutation(mutation, scope))
            .collect()
    }

    /// Each subquery ends in an aggregation, so it yields exactly one row whatever it matched.
    fn relationship_mutation(&mut self, mutation: &RelationshipMutation, scope: &Scope) -> Clause {
        let mut body = import(Some(scope));

        match &mutation.mutation {
            NestedMutation::Create { node, edge } => {
                let created = self.env.node();
                body.extend(self.create_node_edge(mutation, node, edge, scope, &created));
            }
            NestedMutation::Connect {
                target,
                filter,
                authorization,
                source_validation,
                edge,
                nested,
            } => {
                let selection = Selection::Node { target: target.clone() };
                let filters = filter.iter().chain(&authorization.filter);
                let (anchor, connected) = self.guarded_anchor(&selection, Some(scope), filters);

                body.push(anchor);
                body.extend(self.validate(authorization.validate_before.as_ref(), &connected));
                body.extend(self.validate(source_validation.as_ref(), scope));

                let (merge, connected) = self.merge_edge(mutation, scope, connected.node);
                body.push(merge);

                let assignments = self.edge_assignments(&connected, edge);
                body.extend(set(assignments));

                body.extend(self.relationship_mutations(nested, &connected));
                body.extend(self.validate(authorization.validate_after.as_ref(), &connected));
            }
            NestedMutation::ConnectOrCreate(connect_or_create) => {
                body.extend(self.connect_or_create(mutation, connect_or_create, scope));
            }
            NestedMutation::Update(update) => {
                body.extend(self.update_related(mutation, update, scope));
            }
            NestedMutation::Disconnect(disconnect) => {
                body.extend(self.disconnect(mutation, disconnect, scope));
            }
            NestedMutation::Delete(delete) => {
                let (call, _) = self.nested_delete(delete, scope);
                body.push(call);
            }
        }

        let variable = self.env.variable();
        body.push(count_rows(&variable));

        Clause::call(body)
    }

    fn create_node_edge(
        &mut self,
        mutation: &RelationshipMutation,
        input: &CreateInput,
        edge: &[PropertyWrite],
        parent: &Scope,
        node: &str,
    ) -> Vec<Clause> {
        let mut clauses = vec![Clause::Create(Pattern::node(
            NodePattern::new(node).labels(&input.labels),
        ))];

        let assignments = self.assignments(node, &input.properties);
        clauses.extend(set(assignments));

        let (merge, created) = self.merge_edge(mutation, parent, node.to_string());
        clauses.push(merge);

        let assignments = self.edge_assignments(&created, edge);
        clauses.extend(set(assignments));

        clauses.extend(self.relationship_mutations(&input.mutations, &created));
        clauses.extend(self.validate(input.validate_after.as_ref(), &created));

        clauses
    }

    /// `MERGE (m:Label { key: $value }) ON CREATE SET ...`, then the relationship to it.
    fn connect_or_create(
        &mut self,
        mutation: &RelationshipMutation,
        input: &ConnectOrCreate,
        parent: &Scope,
    ) -> Vec<Clause> {
        let node = self.env.node();

        let unique = input
            .unique
            .iter()
            .map(|(property, value)| (property.clone(), self.env.param(value.clone())))
            .collect();

        let on_create = self.assignments(&node, &input.on_create);

        let mut clauses = vec![Clause::Merge {
            pattern: Pattern::node(NodePattern::new(&node).labels(&input.labels).properties(unique)),
            on_create,
        }];

        let (merge, connected) = self.merge_edge(mutation, parent, node);
        clauses.push(merge);

        let assignments = self.edge_assignments(&connected, &input.edge);
        clauses.extend(set(assignments));

        clauses
    }

    fn update_related(&mut self, mutation: &RelationshipMutation, input: &UpdateInput, parent: &Scope) -> Vec<Clause> {
        let selection = related(mutation, input.target.clone());
        let filters = input.filter.iter().chain(&input.authorization.filter);
        let (anchor, scope) = self.guarded_anchor(&selection, Some(parent), filters);

        let mut clauses = vec![anchor];
        clauses.extend(self.validate(input.authorization.validate_before.as_ref(), &scope));

        let mut assignments = self.assignments(&scope.node, &input.node);
        assignments.extend(self.edge_assignments(&scope, &input.edge));
        clauses.extend(set(assignments));

        clauses.extend(self.relationship_mutations(&input.nested, &scope));
        clauses.extend(self.validate(input.authorization.validate_after.as_ref(), &scope));

        clauses
    }

    fn disconnect(&mut self, mutation: &RelationshipMutation, input: &DisconnectMutation, parent: &Scope) -> Vec<Clause> {
        let selection = related(mutation, input.target.clone());
        let filters = input.filter.iter().chain(&input.authorization.filter);
        let (anchor, scope) = self.guarded_anchor(&selection, Some(parent), filters);

        let mut clauses = vec![anchor];
        clauses.extend(self.validate(input.authorization.validate_before.as_ref(), &scope));
        clauses.extend(self.validate(input.source_validation.as_ref(), parent));

        if let Some(edge) = &scope.edge {
            clauses.push(Clause::Delete {
                detach: false,
                targets: vec![Expr::variable(edge)],
            });
        }

        clauses
    }

    /// `MERGE (parent)-[e:TYPE]->(node)` in the stored direction, and the scope of the node
    /// with its new edge.
    fn merge_edge(&mut self, mutation: &RelationshipMutation, parent: &Scope, node: String) -> (Clause, Scope) {
        let edge = self.env.node();

        let pattern = Pattern::related(
            NodePattern::new(&parent.node),
            Some(edge.clone()),
            &mutation.edge_type,
            mutation.direction,
            NodePattern::new(&node),
        );

        let clause = Clause::Merge {
            pattern,
            on_create: Vec::new(),
        };

        let scope = Scope {
            node,
            edge: Some(edge),
            score: None,
        };

        (clause, scope)
    }

    fn assignments(&mut self, owner: &str, writes: &[PropertyWrite]) -> Vec<SetItem> {
        writes
            .iter()
            .map(|write| {
                let target = Expr::variable(owner).property(&write.property);
                let value = self.write_value(target.clone(), &write.ty, &write.value);

                SetItem::new(target, value)
            })
            .collect()
    }

    fn edge_assignments(&mut self, scope: &Scope, writes: &[PropertyWrite]) -> Vec<SetItem> {
        match &scope.edge {
            Some(edge) => self.assignments(edge, writes),
            None => Vec::new(),
        }
    }
}

/// The related nodes a nested update or disconnect applies to.
fn related(mutation: &RelationshipMutation, target: NodeTarget) -> Selection {
    Selection::Relationship {
        edge_type: mutation.edge_type.clone(),
        direction: mutation.direction,
        target,
    }
}

fn set(assignments: Vec<SetItem>) -> Option<Clause> {
    (!assignments.is_empty()).then(|| Clause::Set(assignments))
}

/// `RETURN count(*) AS variable`
fn count_rows(variable: &str) -> Clause {
    Clause::Return(Projection::aliased(
        Expr::function("count", vec![Expr::Star]),
        variable,
    ))
}
