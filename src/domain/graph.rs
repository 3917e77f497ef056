//! Reference graph for named schema definitions
//!
//! Nested schemas are expanded inline, so a definition that reaches itself
//! through `$ref` links can never be expanded. Uses petgraph for cycle
//! detection and ordering.

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Schema definition '{0}' references itself through a cycle")]
    CycleDetected(String),

    #[error("Schema definition not found: {0}")]
    DefinitionNotFound(String),
}

/// Directed graph of `definition -> referenced definition` edges
#[derive(Debug, Default)]
pub struct ReferenceGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
}

impl ReferenceGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Adds a definition to the graph
    pub fn add_definition(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.node_map.contains_key(&name) {
            let idx = self.graph.add_node(name.clone());
            self.node_map.insert(name, idx);
        }
    }

    /// Records that `from` refers to `to`
    pub fn add_reference(&mut self, from: &str, to: &str) -> Result<(), GraphError> {
        let from_idx = *self
            .node_map
            .get(from)
            .ok_or_else(|| GraphError::DefinitionNotFound(from.to_string()))?;
        let to_idx = *self
            .node_map
            .get(to)
            .ok_or_else(|| GraphError::DefinitionNotFound(to.to_string()))?;

        if self.graph.find_edge(from_idx, to_idx).is_none() {
            self.graph.add_edge(from_idx, to_idx, ());
        }
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.node_map.contains_key(name)
    }

    /// Returns definitions so that every definition comes after the ones it references
    pub fn dependency_order(&self) -> Result<Vec<String>, GraphError> {
        if let Some(idx) = self
            .graph
            .node_indices()
            .find(|idx| self.graph.find_edge(*idx, *idx).is_some())
        {
            return Err(GraphError::CycleDetected(self.graph[idx].clone()));
        }

        let mut order = toposort(&self.graph, None)
            .map_err(|cycle| GraphError::CycleDetected(self.graph[cycle.node_id()].clone()))?;
        order.reverse();
        Ok(order.into_iter().map(|idx| self.graph[idx].clone()).collect())
    }

    /// Fails if any definition can reach itself
    pub fn ensure_acyclic(&self) -> Result<(), GraphError> {
        self.dependency_order().map(|_| ())
    }
}
