//! A small Cypher syntax tree. Every value coming from a request is bound as a parameter, so the
//! only strings rendered verbatim are identifiers, which are escaped, and the few constants the
//! compiler itself writes.

mod clause;
mod environment;
mod expr;
mod pattern;
mod renderer;

pub(crate) use clause::{Clause, Order, Projection, SetItem};
pub(crate) use environment::{Environment, ROOT_VARIABLE};
pub(crate) use expr::{BinaryOp, Expr, ListPredicate, ProjectionItem, Subquery};
pub(crate) use pattern::{Direction, NodePattern, Pattern, RelationshipPattern};
pub(crate) use renderer::render;

use std::fmt;

/// Writes a label, relationship type, property key or variable, quoting it with backticks
/// unless it is a plain identifier.
pub(crate) struct Ident<'a>(pub &'a str);

impl fmt::Display for Ident<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chars = self.0.chars();

        let plain = chars
            .next()
            .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

        match plain {
            true => f.write_str(self.0),
            false => write!(f, "`{}`", self.0.replace('`', "``")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Ident;

    #[test]
    fn escapes_identifiers() {
        assert_eq!(Ident("Movie").to_string(), "Movie");
        assert_eq!(Ident("_private1").to_string(), "_private1");
        assert_eq!(Ident("ACTED IN").to_string(), "`ACTED IN`");
        assert_eq!(Ident("1st").to_string(), "`1st`");
        assert_eq!(Ident("a`b").to_string(), "`a``b`");
    }
}
