use super::{Expr, Pattern};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Clause {
    Match {
        optional: bool,
        pattern: Pattern,
        predicate: Option<Expr>,
    },
    With(Projection),
    Return(Projection),
    Unwind {
        list: Expr,
        alias: String,
    },
    /// A subquery. Several branches are joined with `UNION`.
    Call(Vec<Vec<Clause>>),
    Procedure {
        name: &'static str,
        args: Vec<Expr>,
        yields: Vec<(&'static str, String)>,
        predicate: Option<Expr>,
    },
    Create(Pattern),
    Merge {
        pattern: Pattern,
        on_create: Vec<SetItem>,
    },
    Set(Vec<SetItem>),
    Delete {
        detach: bool,
        targets: Vec<Expr>,
    },
}

impl Clause {
    /// `WITH <variables>`, importing variables at the top of a subquery.
    pub fn import(variables: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Clause::With(Projection::items(
            variables.into_iter().map(|variable| (Expr::Variable(variable.into()), None)),
        ))
    }

    pub fn call(body: Vec<Clause>) -> Self {
        Clause::Call(vec![body])
    }

    /// `WITH * WHERE predicate`
    pub fn guard(predicate: Expr) -> Self {
        Clause::With(Projection {
            predicate: Some(predicate),
            ..Projection::star()
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub(crate) enum Order {
    #[strum(serialize = "ASC")]
    Ascending,
    #[strum(serialize = "DESC")]
    Descending,
}

/// The body of a `WITH` or `RETURN`.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Projection {
    pub star: bool,
    pub distinct: bool,
    pub items: Vec<(Expr, Option<String>)>,
    pub order_by: Vec<(Expr, Order)>,
    pub skip: Option<Expr>,
    pub limit: Option<Expr>,
    pub predicate: Option<Expr>,
}

impl Projection {
    pub fn star() -> Self {
        Self {
            star: true,
            ..Default::default()
        }
    }

    pub fn items(items: impl IntoIterator<Item = (Expr, Option<String>)>) -> Self {
        Self {
            items: items.into_iter().collect(),
            ..Default::default()
        }
    }

    /// A single `expression AS alias`.
    pub fn aliased(expr: Expr, alias: impl Into<String>) -> Self {
        Self::items([(expr, Some(alias.into()))])
    }

    pub fn has_modifiers(&self) -> bool {
        !self.order_by.is_empty() || self.skip.is_some() || self.limit.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SetItem {
    pub target: Expr,
    pub value: Expr,
}

impl SetItem {
    pub fn new(target: Expr, value: Expr) -> Self {
        Self { target, value }
    }
}
