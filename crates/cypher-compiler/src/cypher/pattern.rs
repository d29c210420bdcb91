use std::fmt;

use itertools::Itertools;

use super::{Expr, Ident};

/// Arrow direction, as written from the left node to the right node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    /// `<-[]-`
    Left,
    /// `-[]->`
    Right,
    /// `-[]-`
    Both,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct NodePattern {
    pub variable: Option<String>,
    pub labels: Vec<String>,
    pub properties: Vec<(String, Expr)>,
}

impl NodePattern {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: Some(variable.into()),
            ..Default::default()
        }
    }

    pub fn labels(mut self, labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.labels.extend(labels.into_iter().map(Into::into));
        self
    }

    pub fn properties(mut self, properties: Vec<(String, Expr)>) -> Self {
        self.properties = properties;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RelationshipPattern {
    pub variable: Option<String>,
    pub edge_type: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Pattern {
    pub start: NodePattern,
    pub chain: Vec<(RelationshipPattern, NodePattern)>,
}

impl Pattern {
    pub fn node(start: NodePattern) -> Self {
        Self {
            start,
            chain: Vec::new(),
        }
    }

    pub fn related(
        start: NodePattern,
        variable: Option<String>,
        edge_type: impl Into<String>,
        direction: Direction,
        end: NodePattern,
    ) -> Self {
        let relationship = RelationshipPattern {
            variable,
            edge_type: edge_type.into(),
            direction,
        };

        Self {
            start,
            chain: vec![(relationship, end)],
        }
    }
}

fn properties(f: &mut fmt::Formatter<'_>, properties: &[(String, Expr)]) -> fmt::Result {
    if properties.is_empty() {
        return Ok(());
    }

    let entries = properties
        .iter()
        .format_with(", ", |(key, value), f| f(&format_args!("{}: {value}", Ident(key))));

    write!(f, " {{ {entries} }}")
}

impl fmt::Display for NodePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;

        if let Some(variable) = &self.variable {
            write!(f, "{}", Ident(variable))?;
        }

        for label in &self.labels {
            write!(f, ":{}", Ident(label))?;
        }

        properties(f, &self.properties)?;

        f.write_str(")")
    }
}

impl fmt::Display for RelationshipPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (left, right) = match self.direction {
            Direction::Left => ("<-", "-"),
            Direction::Right => ("-", "->"),
            Direction::Both => ("-", "-"),
        };

        let variable = self.variable.as_deref().map(Ident);

        match variable {
            Some(variable) => write!(f, "{left}[{variable}:{}]{right}", Ident(&self.edge_type)),
            None => write!(f, "{left}[:{}]{right}", Ident(&self.edge_type)),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start)?;

        for (relationship, node) in &self.chain {
            write!(f, "{relationship}{node}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patterns() {
        let pattern = Pattern::related(
            NodePattern::new("this"),
            Some("this0".into()),
            "ACTED_IN",
            Direction::Left,
            NodePattern::new("this1").labels(["Actor", "Person"]),
        );

        assert_eq!(pattern.to_string(), "(this)<-[this0:ACTED_IN]-(this1:Actor:Person)");

        let merge = Pattern::node(
            NodePattern::new("this2")
                .labels(["Actor"])
                .properties(vec![("name".into(), Expr::Param("param0".into()))]),
        );

        assert_eq!(merge.to_string(), "(this2:Actor { name: $param0 })");

        let undirected = Pattern::related(
            NodePattern::new("a"),
            None,
            "KNOWS",
            Direction::Both,
            NodePattern::default().labels(["Person"]),
        );

        assert_eq!(undirected.to_string(), "(a)-[:KNOWS]-(:Person)");
    }
}
