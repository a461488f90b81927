//! Project hierarchy.
//!
//! Projects form a plain tree; each node only names its parent.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A project and the id of its parent (`None` for the root).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectNode {
    pub id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl ProjectNode {
    pub fn new(id: impl Into<String>, parent_id: Option<&str>) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.map(str::to_string),
        }
    }
}

/// Project hierarchy keyed by project id.
#[derive(Debug, Clone, Default)]
pub struct ProjectTree {
    nodes: HashMap<String, ProjectNode>,
}

impl ProjectTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: impl IntoIterator<Item = ProjectNode>) -> Self {
        Self {
            nodes: nodes.into_iter().map(|n| (n.id.clone(), n)).collect(),
        }
    }

    pub fn insert(&mut self, node: ProjectNode) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn parent_of(&self, id: &str) -> Option<&str> {
        self.nodes.get(id).and_then(|n| n.parent_id.as_deref())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The project itself followed by each ancestor up to the root.
    ///
    /// Bounded by the number of nodes so a malformed parent cycle terminates.
    pub fn ancestors<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        let limit = self.nodes.len() + 1;
        std::iter::successors(Some(id), move |current| self.parent_of(current)).take(limit)
    }
}
