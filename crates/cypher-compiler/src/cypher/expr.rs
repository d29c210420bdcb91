use std::fmt::{self, Display};

use itertools::Itertools;

use super::{Ident, Pattern};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Variable(String),
    Param(String),
    Property(Box<Expr>, String),
    Null,
    Boolean(bool),
    Integer(i64),
    String(String),
    /// `*`, only as a `count` argument.
    Star,
    List(Vec<Expr>),
    Map(Vec<(String, Expr)>),
    /// `this { .title, actors: var1 }`
    Projection {
        variable: String,
        items: Vec<ProjectionItem>,
    },
    Function {
        name: &'static str,
        distinct: bool,
        args: Vec<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    IsNull(Box<Expr>),
    IsNotNull(Box<Expr>),
    Exists(Box<Subquery>),
    Count(Box<Subquery>),
    /// `any(x IN list WHERE predicate)` and its siblings.
    ListPredicate {
        kind: ListPredicate,
        variable: String,
        list: Box<Expr>,
        predicate: Box<Expr>,
    },
    /// `this:Movie:Film`
    HasLabels {
        variable: String,
        labels: Vec<String>,
    },
    /// `[x IN list | map]`
    Comprehension {
        variable: String,
        list: Box<Expr>,
        map: Box<Expr>,
    },
    /// `list[from..to]`
    Slice {
        list: Box<Expr>,
        from: Option<Box<Expr>>,
        to: Option<Box<Expr>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ProjectionItem {
    /// `.title`
    Property(String),
    /// `key: expression`
    Entry(String, Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    In,
    Contains,
    StartsWith,
    EndsWith,
    Matches,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOp {
    fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Equal => "=",
            BinaryOp::NotEqual => "<>",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanOrEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanOrEqual => ">=",
            BinaryOp::In => "IN",
            BinaryOp::Contains => "CONTAINS",
            BinaryOp::StartsWith => "STARTS WITH",
            BinaryOp::EndsWith => "ENDS WITH",
            BinaryOp::Matches => "=~",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum ListPredicate {
    Any,
    All,
    None,
    Single,
}

/// `EXISTS { MATCH pattern WHERE predicate }` and `COUNT { ... }` bodies.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Subquery {
    pub pattern: Pattern,
    pub predicate: Option<Expr>,
}

impl Expr {
    pub fn variable(name: impl Into<String>) -> Self {
        Expr::Variable(name.into())
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::String(value.into())
    }

    pub fn property(self, name: impl Into<String>) -> Self {
        Expr::Property(Box::new(self), name.into())
    }

    pub fn function(name: &'static str, args: Vec<Expr>) -> Self {
        Expr::Function {
            name,
            distinct: false,
            args,
        }
    }

    pub fn distinct_function(name: &'static str, args: Vec<Expr>) -> Self {
        Expr::Function {
            name,
            distinct: true,
            args,
        }
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn equals(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Equal, self, other)
    }

    pub fn is_null(self) -> Self {
        Expr::IsNull(Box::new(self))
    }

    pub fn is_not_null(self) -> Self {
        Expr::IsNotNull(Box::new(self))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        match self {
            Expr::Not(inner) => *inner,
            Expr::Boolean(value) => Expr::Boolean(!value),
            other => Expr::Not(Box::new(other)),
        }
    }

    /// Conjunction, flattening nested conjunctions. An empty conjunction is `true`.
    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Self {
        let mut flattened = Vec::new();

        for expr in exprs {
            match expr {
                Expr::And(inner) => flattened.extend(inner),
                Expr::Boolean(true) => (),
                other => flattened.push(other),
            }
        }

        match flattened.len() {
            0 => Expr::Boolean(true),
            1 => flattened.remove(0),
            _ => Expr::And(flattened),
        }
    }

    /// Disjunction, flattening nested disjunctions. An empty disjunction is `false`.
    pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Self {
        let mut flattened = Vec::new();

        for expr in exprs {
            match expr {
                Expr::Or(inner) => flattened.extend(inner),
                Expr::Boolean(false) => (),
                other => flattened.push(other),
            }
        }

        match flattened.len() {
            0 => Expr::Boolean(false),
            1 => flattened.remove(0),
            _ => Expr::Or(flattened),
        }
    }

    pub fn exists(pattern: Pattern, predicate: Option<Expr>) -> Self {
        Expr::Exists(Box::new(Subquery { pattern, predicate }))
    }

    pub fn count(pattern: Pattern, predicate: Option<Expr>) -> Self {
        Expr::Count(Box::new(Subquery { pattern, predicate }))
    }

    fn is_atomic(&self) -> bool {
        !matches!(self, Expr::Binary { .. } | Expr::IsNull(_) | Expr::IsNotNull(_) | Expr::Not(_))
    }
}

/// Writes a Cypher string literal.
pub(crate) fn quote(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    f.write_str("\"")?;

    for c in value.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            c => write!(f, "{c}")?,
        }
    }

    f.write_str("\"")
}

struct Operand<'a>(&'a Expr);

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.is_atomic() {
            true => self.0.fmt(f),
            false => write!(f, "({})", self.0),
        }
    }
}

impl fmt::Display for Subquery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ MATCH {}", self.pattern)?;

        if let Some(predicate) = &self.predicate {
            write!(f, " WHERE {predicate}")?;
        }

        f.write_str(" }")
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Variable(name) => Ident(name).fmt(f),
            Expr::Param(name) => write!(f, "${}", Ident(name)),
            Expr::Property(owner, name) => write!(f, "{}.{}", Operand(owner), Ident(name)),
            Expr::Null => f.write_str("NULL"),
            Expr::Boolean(value) => write!(f, "{value}"),
            Expr::Integer(value) => write!(f, "{value}"),
            Expr::String(value) => quote(f, value),
            Expr::Star => f.write_str("*"),
            Expr::List(items) => write!(f, "[{}]", items.iter().join(", ")),
            Expr::Map(entries) => {
                if entries.is_empty() {
                    return f.write_str("{ }");
                }

                let entries = entries
                    .iter()
                    .format_with(", ", |(key, value), f| f(&format_args!("{}: {value}", Ident(key))));

                write!(f, "{{ {entries} }}")
            }
            Expr::Projection { variable, items } => {
                if items.is_empty() {
                    return write!(f, "{} {{ }}", Ident(variable));
                }

                let items = items.iter().format_with(", ", |item, f| match item {
                    ProjectionItem::Property(name) => f(&format_args!(".{}", Ident(name))),
                    ProjectionItem::Entry(key, value) => f(&format_args!("{}: {value}", Ident(key))),
                });

                write!(f, "{} {{ {items} }}", Ident(variable))
            }
            Expr::Function { name, distinct, args } => {
                let distinct = if *distinct { "DISTINCT " } else { "" };
                write!(f, "{name}({distinct}{})", args.iter().join(", "))
            }
            Expr::Binary { op, left, right } => {
                write!(f, "{} {} {}", Operand(left), op.as_str(), Operand(right))
            }
            Expr::And(exprs) => match exprs.as_slice() {
                [] => f.write_str("true"),
                [expr] => expr.fmt(f),
                _ => write!(f, "({})", exprs.iter().join(" AND ")),
            },
            Expr::Or(exprs) => match exprs.as_slice() {
                [] => f.write_str("false"),
                [expr] => expr.fmt(f),
                _ => write!(f, "({})", exprs.iter().join(" OR ")),
            },
            Expr::Not(expr) => write!(f, "NOT ({expr})"),
            Expr::IsNull(expr) => write!(f, "{} IS NULL", Operand(expr)),
            Expr::IsNotNull(expr) => write!(f, "{} IS NOT NULL", Operand(expr)),
            Expr::Exists(subquery) => write!(f, "EXISTS {subquery}"),
            Expr::Count(subquery) => write!(f, "COUNT {subquery}"),
            Expr::ListPredicate {
                kind,
                variable,
                list,
                predicate,
            } => write!(f, "{kind}({} IN {list} WHERE {predicate})", Ident(variable)),
            Expr::HasLabels { variable, labels } => {
                write!(f, "{}", Ident(variable))?;

                for label in labels {
                    write!(f, ":{}", Ident(label))?;
                }

                Ok(())
            }
            Expr::Comprehension { variable, list, map } => write!(f, "[{} IN {list} | {map}]", Ident(variable)),
            Expr::Slice { list, from, to } => {
                write!(f, "{}[", Operand(list))?;

                if let Some(from) = from {
                    from.fmt(f)?;
                }

                f.write_str("..")?;

                if let Some(to) = to {
                    to.fmt(f)?;
                }

                f.write_str("]")
            }
        }
    }
}
