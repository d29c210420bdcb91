use std::fmt::{self, Display};

use itertools::Itertools;

use super::{Clause, Expr, Ident, Projection, SetItem};

const INDENT: &str = "    ";

/// Renders a clause sequence, one clause per line, indenting subquery bodies.
pub(crate) fn render(clauses: &[Clause]) -> String {
    let mut renderer = Renderer::default();
    renderer.clauses(clauses);
    renderer.lines.join("\n")
}

#[derive(Default)]
struct Renderer {
    lines: Vec<String>,
    depth: usize,
}

struct SetItems<'a>(&'a [SetItem]);

impl Display for SetItems<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items = self
            .0
            .iter()
            .format_with(", ", |item, f| f(&format_args!("{} = {}", item.target, item.value)));

        items.fmt(f)
    }
}

impl Renderer {
    fn line(&mut self, text: impl Display) {
        self.lines.push(format!("{}{text}", INDENT.repeat(self.depth)));
    }

    fn clauses(&mut self, clauses: &[Clause]) {
        for clause in clauses {
            self.clause(clause);
        }
    }

    fn clause(&mut self, clause: &Clause) {
        match clause {
            Clause::Match {
                optional,
                pattern,
                predicate,
            } => {
                let keyword = if *optional { "OPTIONAL MATCH" } else { "MATCH" };
                self.line(format_args!("{keyword} {pattern}"));
                self.predicate(predicate.as_ref());
            }
            Clause::With(projection) => self.projection("WITH", projection),
            Clause::Return(projection) => self.projection("RETURN", projection),
            Clause::Unwind { list, alias } => self.line(format_args!("UNWIND {list} AS {}", Ident(alias))),
            Clause::Call(branches) => {
                self.line("CALL {");
                self.depth += 1;

                for (i, branch) in branches.iter().enumerate() {
                    if i > 0 {
                        self.line("UNION");
                    }

                    self.clauses(branch);
                }

                self.depth -= 1;
                self.line("}");
            }
            Clause::Procedure {
                name,
                args,
                yields,
                predicate,
            } => {
                let yields = yields
                    .iter()
                    .format_with(", ", |(column, alias), f| f(&format_args!("{column} AS {}", Ident(alias))));

                self.line(format_args!("CALL {name}({}) YIELD {yields}", args.iter().join(", ")));
                self.predicate(predicate.as_ref());
            }
            Clause::Create(pattern) => self.line(format_args!("CREATE {pattern}")),
            Clause::Merge { pattern, on_create } => {
                self.line(format_args!("MERGE {pattern}"));

                if !on_create.is_empty() {
                    self.line(format_args!("ON CREATE SET {}", SetItems(on_create)));
                }
            }
            Clause::Set(items) => self.line(format_args!("SET {}", SetItems(items))),
            Clause::Delete { detach, targets } => {
                let keyword = if *detach { "DETACH DELETE" } else { "DELETE" };
                self.line(format_args!("{keyword} {}", targets.iter().join(", ")));
            }
        }
    }

    fn predicate(&mut self, predicate: Option<&Expr>) {
        if let Some(predicate) = predicate {
            self.line(format_args!("WHERE {predicate}"));
        }
    }

    fn projection(&mut self, keyword: &str, projection: &Projection) {
        let mut items = Vec::with_capacity(projection.items.len() + 1);

        if projection.star {
            items.push("*".to_string());
        }

        for (expr, alias) in &projection.items {
            match (expr, alias) {
                (Expr::Variable(name), Some(alias)) if name == alias => items.push(expr.to_string()),
                (expr, Some(alias)) => items.push(format!("{expr} AS {}", Ident(alias))),
                (expr, None) => items.push(expr.to_string()),
            }
        }

        let distinct = if projection.distinct { "DISTINCT " } else { "" };
        self.line(format_args!("{keyword} {distinct}{}", items.join(", ")));

        if !projection.order_by.is_empty() {
            let order = projection
                .order_by
                .iter()
                .format_with(", ", |(expr, order), f| f(&format_args!("{expr} {order}")));

            self.line(format_args!("ORDER BY {order}"));
        }

        if let Some(skip) = &projection.skip {
            self.line(format_args!("SKIP {skip}"));
        }

        if let Some(limit) = &projection.limit {
            self.line(format_args!("LIMIT {limit}"));
        }

        self.predicate(projection.predicate.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cypher::{Direction, NodePattern, Order, Pattern};

    #[test]
    fn nested_subqueries_are_indented() {
        let this = Expr::variable("this");

        let clauses = vec![
            Clause::Match {
                optional: false,
                pattern: Pattern::node(NodePattern::new("this").labels(["Movie"])),
                predicate: Some(this.clone().property("title").equals(Expr::Param("param0".into()))),
            },
            Clause::call(vec![
                Clause::import(["this"]),
                Clause::Match {
                    optional: false,
                    pattern: Pattern::related(
                        NodePattern::new("this"),
                        Some("this0".into()),
                        "ACTED_IN",
                        Direction::Left,
                        NodePattern::new("this1").labels(["Actor"]),
                    ),
                    predicate: None,
                },
                Clause::Return(Projection::aliased(
                    Expr::function("collect", vec![Expr::variable("this1").property("name")]),
                    "var2",
                )),
            ]),
            Clause::With(Projection {
                order_by: vec![(this.clone().property("title"), Order::Descending)],
                limit: Some(Expr::Integer(10)),
                ..Projection::star()
            }),
            Clause::Return(Projection::aliased(this, "this")),
        ];

        insta::assert_snapshot!(render(&clauses), @r###"
        MATCH (this:Movie)
        WHERE this.title = $param0
        CALL {
            WITH this
            MATCH (this)<-[this0:ACTED_IN]-(this1:Actor)
            RETURN collect(this1.name) AS var2
        }
        WITH *
        ORDER BY this.title DESC
        LIMIT 10
        RETURN this
        "###);
    }

    #[test]
    fn union_branches() {
        let branch = |label: &str, variable: &str| {
            vec![
                Clause::Match {
                    optional: false,
                    pattern: Pattern::node(NodePattern::new(variable).labels([label])),
                    predicate: None,
                },
                Clause::Return(Projection::aliased(Expr::variable(variable), "node")),
            ]
        };

        let clauses = vec![Clause::Call(vec![branch("Movie", "this0"), branch("Series", "this1")])];

        insta::assert_snapshot!(render(&clauses), @r###"
        CALL {
            MATCH (this0:Movie)
            RETURN this0 AS node
            UNION
            MATCH (this1:Series)
            RETURN this1 AS node
        }
        "###);
    }
}
