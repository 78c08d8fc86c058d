//! In-memory pipeline graph.
//!
//! Vertices and edges live in flat, ordered collections; edges refer to
//! vertices by id only. Insertion order is kept so that exporting an
//! unchanged graph always yields the same document.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    FlowRepoError, Result,
    model::{Edge, EdgeId, Vertex, VertexId, VertexKind, vertex::normalize_config},
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineGraph {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
}

impl PipelineGraph {
    /// create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// get vertex by id
    pub fn vertex(
        &self,
        id: &str,
    ) -> Option<&Vertex> {
        self.vertices.iter().find(|v| v.id == id)
    }

    /// get edge by id
    pub fn edge(
        &self,
        id: &str,
    ) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn contains_vertex(
        &self,
        id: &str,
    ) -> bool {
        self.vertex(id).is_some()
    }

    /// add a vertex, rejecting duplicate ids
    pub fn add_vertex(
        &mut self,
        vertex: Vertex,
    ) -> Result<()> {
        if self.contains_vertex(&vertex.id) {
            return Err(FlowRepoError::Project(format!("vertex {} already exists", vertex.id)));
        }
        self.vertices.push(vertex);
        Ok(())
    }

    /// remove a vertex together with every edge touching it
    pub fn remove_vertex(
        &mut self,
        id: &str,
    ) -> Result<Vertex> {
        let idx = self.vertices.iter().position(|v| v.id == id).ok_or(FlowRepoError::NotFound(format!("vertex {}", id)))?;
        self.edges.retain(|e| e.source != id && e.target != id);
        Ok(self.vertices.remove(idx))
    }

    /// replace the configuration of a vertex; its kind follows the new shape
    pub fn update_config(
        &mut self,
        id: &str,
        config: Value,
    ) -> Result<()> {
        let vertex = self.vertices.iter_mut().find(|v| v.id == id).ok_or(FlowRepoError::NotFound(format!("vertex {}", id)))?;
        vertex.config = normalize_config(config);
        Ok(())
    }

    /// add an edge between two existing vertices
    pub fn add_edge(
        &mut self,
        edge: Edge,
    ) -> Result<()> {
        if !self.contains_vertex(&edge.source) {
            return Err(FlowRepoError::NotFound(format!("source vertex {}", edge.source)));
        }
        if !self.contains_vertex(&edge.target) {
            return Err(FlowRepoError::NotFound(format!("target vertex {}", edge.target)));
        }
        if self.edge(&edge.id).is_some() {
            return Err(FlowRepoError::Project(format!("edge {} already exists", edge.id)));
        }
        self.edges.push(edge);
        Ok(())
    }

    /// connect two vertices with a generated edge id
    pub fn connect(
        &mut self,
        source: &str,
        target: &str,
    ) -> Result<EdgeId> {
        let id = self.next_edge_id();
        self.add_edge(Edge::new(id.clone(), source, target))?;
        Ok(id)
    }

    pub fn remove_edge(
        &mut self,
        id: &str,
    ) -> Result<Edge> {
        let idx = self.edges.iter().position(|e| e.id == id).ok_or(FlowRepoError::NotFound(format!("edge {}", id)))?;
        Ok(self.edges.remove(idx))
    }

    /// set or clear the routing conditions of an edge; `null` clears them
    pub fn set_edge_conditions(
        &mut self,
        id: &str,
        conditions: Option<Value>,
    ) -> Result<()> {
        let edge = self.edges.iter_mut().find(|e| e.id == id).ok_or(FlowRepoError::NotFound(format!("edge {}", id)))?;
        edge.conditions = conditions.filter(|c| !c.is_null());
        Ok(())
    }

    /// ids of all vertices of the given kind, in graph order
    pub fn vertices_of(
        &self,
        kind: VertexKind,
    ) -> Vec<VertexId> {
        self.vertices.iter().filter(|v| v.kind() == kind).map(|v| v.id.clone()).collect()
    }

    fn next_edge_id(&self) -> EdgeId {
        (self.edges.len()..).map(|n| format!("e-{}", n)).find(|id| self.edge(id).is_none()).unwrap_or_default()
    }

    /// Output a human-readable representation of the pipeline graph
    pub fn schema(&self) -> String {
        let mut lines = Vec::new();

        lines.push("=== Pipeline Graph ===".to_string());
        lines.push(format!("Vertices: {}, Edges: {}", self.vertices.len(), self.edges.len()));
        lines.push(String::new());

        lines.push("--- Vertices ---".to_string());
        for vertex in &self.vertices {
            lines.push(format!("[{}] (kind: {})", vertex.id, vertex.kind().as_ref()));
        }
        lines.push(String::new());

        lines.push("--- Edges ---".to_string());
        for edge in &self.edges {
            let guard = if edge.conditions.is_some() {
                " [conditional]"
            } else {
                ""
            };
            lines.push(format!("{} --> {} (id: {}){}", edge.source, edge.target, edge.id, guard));
        }

        lines.join("\n")
    }

    pub(crate) fn from_parts(
        vertices: Vec<Vertex>,
        edges: Vec<Edge>,
    ) -> Self {
        Self {
            vertices,
            edges,
        }
    }
}
