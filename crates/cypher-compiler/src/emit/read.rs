use super::{ordering, Emitter, Scope};
use crate::{
    cypher::{Clause, Expr, Projection, ProjectionItem},
    ir::{Cardinality, CompositeConnectionOperation, CompositeReadOperation, ConnectionOperation, Field, ReadOperation},
};

/// Key tagging each row of an abstract read with the concrete type it comes from.
const TYPENAME: &str = "__typename";

impl Emitter<'_> {
    /// The match of a read with its guards, ordering and the subqueries of its nested fields.
    /// Returns the clauses and the row of one matched node.
    pub(super) fn read_rows(&mut self, read: &ReadOperation, parent: Option<&Scope>) -> (Vec<Clause>, Expr) {
        let mut clauses = import(parent);

        let filters = read.filters.iter().chain(&read.authorization.filter);
        let (anchor, scope) = self.guarded_anchor(&read.selection, parent, filters);

        clauses.push(anchor);
        clauses.extend(self.validate(read.authorization.validate_before.as_ref(), &scope));

        let mut order = Projection::star();
        self.paginate(&mut order, &read.sort, read.pagination, &scope, &scope.node);
        clauses.extend(ordering(order));

        let (calls, row) = self.row(&read.fields, &scope);
        clauses.extend(calls);

        (clauses, row)
    }

    /// One `UNION` branch per concrete entity, each returning its rows under the same column,
    /// ordered and paginated once combined. Returns the clauses and the column.
    pub(super) fn composite_read_rows(
        &mut self,
        read: &CompositeReadOperation,
        parent: Option<&Scope>,
    ) -> (Vec<Clause>, String) {
        let row = self.env.variable();
        let mut branches = Vec::with_capacity(read.children.len());

        for child in &read.children {
            let (mut clauses, projection) = self.read_rows(child, parent);
            clauses.push(Clause::Return(Projection::aliased(tag(projection, &child.entity), row.clone())));
            branches.push(clauses);
        }

        let mut clauses = import(parent);
        clauses.push(union(branches, &row));

        let mut order = Projection::items([(Expr::variable(&row), None)]);
        self.paginate(&mut order, &read.sort, read.pagination, &Scope::node(&row), &row);
        clauses.extend(ordering(order));

        (clauses, row)
    }

    /// Collects the edges of a connection and counts them, then orders, paginates and projects
    /// them. Returns the clauses and the `{ edges, totalCount }` map.
    pub(super) fn connection(&mut self, connection: &ConnectionOperation, parent: Option<&Scope>) -> (Vec<Clause>, Expr) {
        let mut clauses = import(parent);

        let filters = connection.filters.iter().chain(&connection.authorization.filter);
        let (anchor, scope) = self.guarded_anchor(&connection.selection, parent, filters);

        clauses.push(anchor);
        clauses.extend(self.validate(connection.authorization.validate_before.as_ref(), &scope));

        let mut edge = vec![("node".to_string(), Expr::variable(&scope.node))];

        if let Some(relationship) = &scope.edge {
            edge.push(("relationship".to_string(), Expr::variable(relationship)));
        }

        if let Some(score) = &scope.score {
            edge.push(("score".to_string(), Expr::variable(score)));
        }

        let edges = self.env.variable();
        let total = self.env.variable();

        clauses.extend(count_edges(Expr::Map(edge), &edges, &total));

        let mut value = Vec::new();

        if let Some((alias, fields)) = &connection.edges {
            let row = self.env.variable();

            let mut body = vec![
                Clause::import([edges.as_str()]),
                Clause::Unwind {
                    list: Expr::variable(&edges),
                    alias: row.clone(),
                },
            ];

            // The edge map is taken apart again so that fields keep reading the scope.
            let mut rebind = vec![(Expr::variable(&row).property("node"), Some(scope.node.clone()))];

            if let Some(relationship) = &scope.edge {
                rebind.push((Expr::variable(&row).property("relationship"), Some(relationship.clone())));
            }

            if let Some(score) = &scope.score {
                rebind.push((Expr::variable(&row).property("score"), Some(score.clone())));
            }

            let mut projection = Projection::items(rebind);
            self.paginate(&mut projection, &connection.sort, connection.pagination, &scope, &row);
            body.push(Clause::With(projection));

            let (calls, projected) = self.map(fields, &scope);
            body.extend(calls);

            let page = self.env.variable();
            body.push(Clause::Return(Projection::aliased(collect(projected, Cardinality::Many), page.clone())));

            clauses.push(Clause::call(body));
            value.push((alias.clone(), Expr::variable(page)));
        }

        if let Some(alias) = &connection.total_count {
            value.push((alias.clone(), Expr::variable(total)));
        }

        (clauses, Expr::Map(value))
    }

    /// Like a connection, with the edges of every concrete entity combined by a `UNION`
    /// before they are counted.
    pub(super) fn composite_connection(
        &mut self,
        connection: &CompositeConnectionOperation,
        parent: Option<&Scope>,
    ) -> (Vec<Clause>, Expr) {
        let edge = self.env.variable();
        let mut branches = Vec::with_capacity(connection.children.len());

        for child in &connection.children {
            let mut clauses = import(parent);

            let filters = child.filters.iter().chain(&child.authorization.filter);
            let (anchor, scope) = self.guarded_anchor(&child.selection, parent, filters);

            clauses.push(anchor);
            clauses.extend(self.validate(child.authorization.validate_before.as_ref(), &scope));

            let fields = child.edges.as_ref().map(|(_, fields)| fields.as_slice()).unwrap_or_default();
            let (calls, row) = self.map(fields, &scope);

            clauses.extend(calls);
            clauses.push(Clause::Return(Projection::aliased(
                tag_node(row, &scope.node, &child.entity),
                edge.clone(),
            )));

            branches.push(clauses);
        }

        let mut clauses = import(parent);
        clauses.push(union(branches, &edge));

        let edges = self.env.variable();
        let total = self.env.variable();

        clauses.extend(count_edges(Expr::variable(&edge), &edges, &total));

        let mut value = Vec::new();

        if let Some(alias) = &connection.edges {
            let row = self.env.variable();

            let mut body = vec![
                Clause::import([edges.as_str()]),
                Clause::Unwind {
                    list: Expr::variable(&edges),
                    alias: row.clone(),
                },
            ];

            let mut order = Projection::items([(Expr::variable(&row), None)]);
            self.paginate(&mut order, &connection.sort, connection.pagination, &Scope::node(&row), &row);
            body.extend(ordering(order));

            let page = self.env.variable();
            body.push(Clause::Return(Projection::aliased(
                collect(Expr::variable(&row), Cardinality::Many),
                page.clone(),
            )));

            clauses.push(Clause::call(body));
            value.push((alias.clone(), Expr::variable(page)));
        }

        if let Some(alias) = &connection.total_count {
            value.push((alias.clone(), Expr::variable(total)));
        }

        (clauses, Expr::Map(value))
    }

    /// The projection of the node in scope with the subqueries of its nested operations. A row
    /// wrapping the node in other values is a map literal.
    pub(super) fn row(&mut self, fields: &[Field], scope: &Scope) -> (Vec<Clause>, Expr) {
        if fields.iter().any(Field::wraps_node) {
            return self.map(fields, scope);
        }

        let (calls, items) = self.projection_items(fields, scope, Some(scope.node.as_str()));

        let projection = Expr::Projection {
            variable: scope.node.clone(),
            items,
        };

        (calls, projection)
    }

    /// The fields as a map literal.
    pub(super) fn map(&mut self, fields: &[Field], scope: &Scope) -> (Vec<Clause>, Expr) {
        let (calls, items) = self.projection_items(fields, scope, None);

        let entries = items
            .into_iter()
            .map(|item| match item {
                ProjectionItem::Entry(key, value) => (key, value),
                ProjectionItem::Property(property) => {
                    let value = Expr::variable(&scope.node).property(&property);
                    (property, value)
                }
            })
            .collect();

        (calls, Expr::Map(entries))
    }

    /// Items of a projection of `subject`. Properties of the subject read under their own name
    /// are written as `.property`.
    fn projection_items(
        &mut self,
        fields: &[Field],
        scope: &Scope,
        subject: Option<&str>,
    ) -> (Vec<Clause>, Vec<ProjectionItem>) {
        let mut calls = Vec::new();
        let mut items = Vec::with_capacity(fields.len());

        for field in fields {
            let item = match field {
                Field::Attribute { alias, owner, property } => {
                    let owner = scope.owner(*owner);

                    match (&owner, subject) {
                        (Expr::Variable(variable), Some(subject)) if variable == subject && alias == property => {
                            ProjectionItem::Property(property.clone())
                        }
                        _ => ProjectionItem::Entry(alias.clone(), owner.property(property)),
                    }
                }
                Field::Typename { alias, type_name } => ProjectionItem::Entry(alias.clone(), Expr::string(type_name)),
                Field::Score { alias } => {
                    let score = scope.score.as_deref().unwrap_or(&scope.node);
                    ProjectionItem::Entry(alias.clone(), Expr::variable(score))
                }
                Field::Node { alias, fields } => {
                    let (nested, node) = self.projection_items(fields, scope, Some(scope.node.as_str()));
                    calls.extend(nested);

                    let projection = Expr::Projection {
                        variable: scope.node.clone(),
                        items: node,
                    };

                    ProjectionItem::Entry(alias.clone(), projection)
                }
                Field::Properties { alias, fields } => match &scope.edge {
                    Some(edge) => {
                        let (nested, properties) = self.projection_items(fields, scope, Some(edge.as_str()));
                        calls.extend(nested);

                        let projection = Expr::Projection {
                            variable: edge.clone(),
                            items: properties,
                        };

                        ProjectionItem::Entry(alias.clone(), projection)
                    }
                    None => ProjectionItem::Entry(alias.clone(), Expr::Null),
                },
                Field::Operation { alias, operation } => {
                    let (call, variable) = self.nested(operation, scope);
                    calls.push(call);

                    ProjectionItem::Entry(alias.clone(), Expr::variable(variable))
                }
            };

            items.push(item);
        }

        (calls, items)
    }
}

/// `collect(row)`, or its first element for a single related node.
pub(super) fn collect(row: Expr, cardinality: Cardinality) -> Expr {
    let collected = Expr::function("collect", vec![row]);

    match cardinality {
        Cardinality::Many => collected,
        Cardinality::One => Expr::function("head", vec![collected]),
    }
}

/// `WITH <parent>` at the top of a subquery.
pub(super) fn import(parent: Option<&Scope>) -> Vec<Clause> {
    parent
        .map(|scope| Clause::import([scope.node.as_str()]))
        .into_iter()
        .collect()
}

/// The branches joined by `UNION`. Without any branch, no row is produced under the column.
pub(super) fn union(branches: Vec<Vec<Clause>>, column: &str) -> Clause {
    match branches.is_empty() {
        true => Clause::Unwind {
            list: Expr::List(Vec::new()),
            alias: column.to_string(),
        },
        false => Clause::Call(branches),
    }
}

/// `WITH collect(edge) AS edges` then `WITH edges, size(edges) AS total`.
fn count_edges(edge: Expr, edges: &str, total: &str) -> [Clause; 2] {
    [
        Clause::With(Projection::aliased(collect(edge, Cardinality::Many), edges)),
        Clause::With(Projection::items([
            (Expr::variable(edges), None),
            (Expr::function("size", vec![Expr::variable(edges)]), Some(total.to_string())),
        ])),
    ]
}

/// Adds the concrete type to a row, unless the row already carries it.
fn tag(row: Expr, entity: &str) -> Expr {
    let typename = Expr::string(entity);

    match row {
        Expr::Projection { variable, mut items } => {
            let tagged = items.iter().any(|item| match item {
                ProjectionItem::Property(key) | ProjectionItem::Entry(key, _) => key == TYPENAME,
            });

            if !tagged {
                items.push(ProjectionItem::Entry(TYPENAME.to_string(), typename));
            }

            Expr::Projection { variable, items }
        }
        Expr::Map(mut entries) => {
            if !entries.iter().any(|(key, _)| key == TYPENAME) {
                entries.push((TYPENAME.to_string(), typename));
            }

            Expr::Map(entries)
        }
        row => row,
    }
}

/// Tags the projections of `node` inside an edge row.
fn tag_node(row: Expr, node: &str, entity: &str) -> Expr {
    let Expr::Map(entries) = row else {
        return row;
    };

    let entries = entries
        .into_iter()
        .map(|(key, value)| {
            let projected = matches!(&value, Expr::Projection { variable, .. } if variable == node);

            match projected {
                true => (key, tag(value, entity)),
                false => (key, value),
            }
        })
        .collect();

    Expr::Map(entries)
}
