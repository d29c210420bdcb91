use serde_json::Value;

use crate::cypher::Direction;

/// How an operation anchors its target.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Selection {
    /// Every node carrying the labels.
    Node { target: NodeTarget },
    /// Nodes reached from the parent node over one edge type.
    Relationship {
        edge_type: String,
        direction: Direction,
        target: NodeTarget,
    },
    /// Nodes returned by a full-text index, with their score.
    Fulltext {
        index: String,
        phrase: Value,
        target: NodeTarget,
    },
    /// The nearest neighbours of a vector in a vector index, with their score.
    Vector {
        index: String,
        vector: Value,
        neighbours: u64,
        target: NodeTarget,
    },
}

impl Selection {
    pub fn target(&self) -> &NodeTarget {
        match self {
            Selection::Node { target }
            | Selection::Relationship { target, .. }
            | Selection::Fulltext { target, .. }
            | Selection::Vector { target, .. } => target,
        }
    }

    pub fn has_edge(&self) -> bool {
        matches!(self, Selection::Relationship { .. })
    }

    pub fn has_score(&self) -> bool {
        matches!(self, Selection::Fulltext { .. } | Selection::Vector { .. })
    }
}

/// The labels a matched node must carry. More than one alternative means any of them, which is
/// how an abstract relationship target is matched.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NodeTarget {
    pub alternatives: Vec<Vec<String>>,
}

impl NodeTarget {
    pub fn labels(labels: &[String]) -> Self {
        Self {
            alternatives: vec![labels.to_vec()],
        }
    }

    pub fn any_of(alternatives: Vec<Vec<String>>) -> Self {
        Self { alternatives }
    }

    /// Labels written into the node pattern itself.
    pub fn pattern_labels(&self) -> &[String] {
        match self.alternatives.as_slice() {
            [labels] => labels,
            _ => &[],
        }
    }
}
