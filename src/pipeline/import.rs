use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::warn;

use crate::{
    FlowRepoError, Result,
    model::{Edge, PipelineGraph, Vertex, VertexKind},
};

/// Horizontal distance between two vertices in the same band.
pub const BAND_PITCH: i32 = 200;
/// X of the first vertex in every band.
pub const BAND_OFFSET: i32 = 100;

/// Default placement band of a vertex on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Band {
    Sources,
    Transforms,
    Sinks,
}

impl Band {
    pub fn y(&self) -> i32 {
        match self {
            Band::Sources => 50,
            Band::Transforms => 250,
            Band::Sinks => 450,
        }
    }

    fn of(kind: VertexKind) -> Self {
        match kind {
            VertexKind::Source => Band::Sources,
            VertexKind::Sink => Band::Sinks,
            VertexKind::Transform | VertexKind::Unclassified => Band::Transforms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// A vertex together with its default canvas placement.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedVertex {
    pub vertex: Vertex,
    pub band: Band,
    pub position: Position,
}

/// Result of parsing a pipeline document.
///
/// Placement is presentation data only; [`ImportedPipeline::into_graph`]
/// drops it and kind is re-derived from config from then on.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedPipeline {
    /// Pipeline name from `metadata.name`, if any.
    pub name: Option<String>,
    /// Vertices in document order.
    pub vertices: Vec<PlacedVertex>,
    pub edges: Vec<Edge>,
}

impl ImportedPipeline {
    pub fn into_graph(self) -> PipelineGraph {
        PipelineGraph::from_parts(self.vertices.into_iter().map(|v| v.vertex).collect(), self.edges)
    }

    pub fn placement(
        &self,
        id: &str,
    ) -> Option<Position> {
        self.vertices.iter().find(|v| v.vertex.id == id).map(|v| v.position)
    }
}

/// Parse a declarative pipeline document.
pub fn import_pipeline(text: &str) -> Result<ImportedPipeline> {
    let doc: Value = serde_yaml::from_str(text).map_err(|e| FlowRepoError::MalformedInput(format!("invalid pipeline document: {}", e)))?;

    let records = match doc.pointer("/spec/vertices") {
        Some(Value::Array(records)) => records,
        Some(_) => return Err(FlowRepoError::MalformedInput("spec.vertices must be a sequence".into())),
        None => return Err(FlowRepoError::MalformedInput("missing spec.vertices".into())),
    };

    let mut vertices = Vec::with_capacity(records.len());
    let mut seen = HashSet::new();
    let mut band_counts = [0i32; 3];
    for (idx, record) in records.iter().enumerate() {
        let vertex = parse_vertex(idx, record)?;
        if !seen.insert(vertex.id.clone()) {
            return Err(FlowRepoError::MalformedInput(format!("duplicate vertex name {}", vertex.id)));
        }

        let band = Band::of(vertex.kind());
        let slot = &mut band_counts[band as usize];
        let position = Position {
            x: *slot * BAND_PITCH + BAND_OFFSET,
            y: band.y(),
        };
        *slot += 1;

        vertices.push(PlacedVertex {
            vertex,
            band,
            position,
        });
    }

    let edge_records: &[Value] = match doc.pointer("/spec/edges") {
        Some(Value::Array(records)) => records.as_slice(),
        Some(Value::Null) | None => &[],
        Some(_) => return Err(FlowRepoError::MalformedInput("spec.edges must be a sequence".into())),
    };

    let mut edges = Vec::with_capacity(edge_records.len());
    for (idx, record) in edge_records.iter().enumerate() {
        let (from, to, conditions) = parse_edge(idx, record)?;
        if !seen.contains(&from) || !seen.contains(&to) {
            warn!("pruning edge {} -> {}: unknown vertex", from, to);
            continue;
        }
        let mut edge = Edge::new(format!("e-{}", edges.len()), from, to);
        edge.conditions = conditions;
        edges.push(edge);
    }

    let name = doc.pointer("/metadata/name").and_then(Value::as_str).map(str::to_string);

    Ok(ImportedPipeline {
        name,
        vertices,
        edges,
    })
}

fn parse_vertex(
    idx: usize,
    record: &Value,
) -> Result<Vertex> {
    let Value::Object(map) = record else {
        return Err(FlowRepoError::MalformedInput(format!("vertex #{} is not a mapping", idx)));
    };
    let name = map.get("name").and_then(Value::as_str).ok_or(FlowRepoError::MalformedInput(format!("vertex #{} has no name", idx)))?;

    let config: Map<String, Value> = map.iter().filter(|(key, _)| key.as_str() != "name").map(|(k, v)| (k.clone(), v.clone())).collect();

    Ok(Vertex::new(name, Value::Object(config)))
}

fn parse_edge(
    idx: usize,
    record: &Value,
) -> Result<(String, String, Option<Value>)> {
    let field = |key: &str| {
        record.get(key).and_then(Value::as_str).map(str::to_string).ok_or(FlowRepoError::MalformedInput(format!("edge #{} has no '{}'", idx, key)))
    };
    let from = field("from")?;
    let to = field("to")?;
    let conditions = record.get("conditions").filter(|c| !c.is_null()).cloned();

    Ok((from, to, conditions))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
apiVersion: numaflow.numaproj.io/v1alpha1
kind: Pipeline
metadata:
  name: even-odd
spec:
  vertices:
    - name: out
      sink:
        log: {}
    - name: in
      source:
        http: {}
    - name: even-or-odd
      udf:
        container:
          image: even-odd:latest
    - name: other-in
      source:
        generator: {}
  edges:
    - from: in
      to: even-or-odd
    - from: even-or-odd
      to: out
      conditions:
        tags:
          operator: or
          values:
            - even-tag
"#;

    #[test]
    fn test_import_bands_and_positions() {
        let imported = import_pipeline(DOC).unwrap();
        assert_eq!(imported.name.as_deref(), Some("even-odd"));

        let ids: Vec<_> = imported.vertices.iter().map(|v| v.vertex.id.as_str()).collect();
        assert_eq!(ids, vec!["out", "in", "even-or-odd", "other-in"]);

        assert_eq!(imported.placement("in"), Some(Position { x: 100, y: 50 }));
        assert_eq!(imported.placement("other-in"), Some(Position { x: 300, y: 50 }));
        assert_eq!(imported.placement("even-or-odd"), Some(Position { x: 100, y: 250 }));
        assert_eq!(imported.placement("out"), Some(Position { x: 100, y: 450 }));
    }

    #[test]
    fn test_import_edges() {
        let imported = import_pipeline(DOC).unwrap();
        assert_eq!(imported.edges.len(), 2);
        assert_eq!(imported.edges[0].id, "e-0");
        assert!(imported.edges[0].conditions.is_none());

        let conditional = &imported.edges[1];
        assert_eq!(conditional.id, "e-1");
        assert_eq!(conditional.conditions.as_ref().unwrap()["tags"]["values"][0], "even-tag");
    }

    #[test]
    fn test_import_strips_name_from_config() {
        let imported = import_pipeline(DOC).unwrap();
        let vertex = &imported.vertices[0].vertex;
        assert!(vertex.config.get("name").is_none());
        assert!(vertex.config.get("sink").is_some());
    }

    #[test]
    fn test_import_missing_vertices() {
        let err = import_pipeline("apiVersion: v1\nkind: Pipeline\nspec:\n  edges: []\n").unwrap_err();
        assert_eq!(err, FlowRepoError::MalformedInput("missing spec.vertices".into()));
    }

    #[test]
    fn test_import_unparsable_text() {
        let err = import_pipeline("spec: [unclosed").unwrap_err();
        assert!(matches!(err, FlowRepoError::MalformedInput(_)));
    }

    #[test]
    fn test_import_rejects_bad_records() {
        assert!(import_pipeline("spec:\n  vertices:\n    - source: {}\n").is_err());
        assert!(import_pipeline("spec:\n  vertices:\n    - name: a\n    - name: a\n").is_err());
        assert!(import_pipeline("spec:\n  vertices:\n    - name: a\n  edges:\n    - to: a\n").is_err());
    }

    #[test]
    fn test_import_prunes_dangling_edges() {
        let text = "spec:\n  vertices:\n    - name: a\n    - name: b\n  edges:\n    - from: a\n      to: ghost\n    - from: a\n      to: b\n";
        let imported = import_pipeline(text).unwrap();
        assert_eq!(imported.edges.len(), 1);
        assert_eq!(imported.edges[0].id, "e-0");
        assert_eq!(imported.edges[0].target, "b");
    }

    #[test]
    fn test_import_without_edges() {
        let imported = import_pipeline("spec:\n  vertices:\n    - name: a\n").unwrap();
        assert!(imported.edges.is_empty());
        assert!(imported.name.is_none());
        assert_eq!(imported.into_graph().vertices().len(), 1);
    }
}
