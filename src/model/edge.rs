use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::VertexId;

/// Unique identifier for an edge within a graph.
pub type EdgeId = String;

/// A directed connection between two vertices.
///
/// `conditions` holds the routing predicate exactly as it appears under the
/// `conditions` key of the declarative edge record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: VertexId,
    pub target: VertexId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Value>,
}

impl Edge {
    pub fn new(
        id: impl Into<EdgeId>,
        source: impl Into<VertexId>,
        target: impl Into<VertexId>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            conditions: None,
        }
    }

    /// `null` leaves the edge unconditional.
    pub fn with_conditions(
        mut self,
        conditions: Value,
    ) -> Self {
        self.conditions = Some(conditions).filter(|c| !c.is_null());
        self
    }
}
