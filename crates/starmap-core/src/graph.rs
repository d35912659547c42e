//! Topic-graph document consumed once at startup.
//!
//! The document is read-only input to the world builder. Records are
//! tagged and defaulted here so downstream code never has to probe for
//! optional fields.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Error produced while loading a topic-graph document.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("failed to parse topic graph: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("topic graph has no categories")]
    NoCategories,
}

/// Role of a node in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Sun,
    Category,
    #[default]
    Tool,
}

/// Cross-reference links of a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Connections {
    pub secondary: Vec<String>,
}

/// A single node record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub label: String,
    #[serde(default)]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub connections: Connections,
}

impl NodeRecord {
    pub fn new(label: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            label: label.into(),
            kind,
            url: None,
            description: None,
            connections: Connections::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_secondary(mut self, ids: &[&str]) -> Self {
        self.connections.secondary = ids.iter().map(|s| (*s).to_string()).collect();
        self
    }
}

/// Serialized topic graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicGraph {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub categories: Vec<String>,
    #[serde(default)]
    pub category_children: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub nodes: BTreeMap<String, NodeRecord>,
}

impl TopicGraph {
    /// Parses and sanity-checks a JSON document.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let graph: Self = serde_json::from_str(json)?;
        if graph.categories.is_empty() {
            return Err(GraphError::NoCategories);
        }
        Ok(graph)
    }

    pub fn node(&self, id: &str) -> Option<&NodeRecord> {
        self.nodes.get(id)
    }

    pub fn children(&self, category_id: &str) -> &[String] {
        self.category_children
            .get(category_id)
            .map_or(&[], Vec::as_slice)
    }
}
