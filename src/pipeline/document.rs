use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    FlowRepoError, Result,
    model::{Edge, PipelineGraph, Vertex},
};

pub const API_VERSION: &str = "numaflow.numaproj.io/v1alpha1";
pub const PIPELINE_KIND: &str = "Pipeline";
/// Stands in for the pipeline name until the document is finally exported.
pub const NAME_PLACEHOLDER: &str = "<pipeline-name>";

/// The declarative pipeline document.
///
/// Field order here is the key order of the emitted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineDocument {
    pub api_version: String,
    pub kind: String,
    pub metadata: DocumentMetadata,
    pub spec: PipelineSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineSpec {
    /// `{name, ...config}` per vertex
    pub vertices: Vec<Map<String, Value>>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Value>,
}

impl PipelineDocument {
    /// Substitute the real pipeline name for the placeholder.
    pub fn with_name(
        mut self,
        name: &str,
    ) -> Self {
        self.metadata.name = name.to_string();
        self
    }

    pub fn is_named(&self) -> bool {
        self.metadata.name != NAME_PLACEHOLDER
    }

    /// Emit the document as YAML, keys in insertion order.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Convert a graph into a document carrying the name placeholder.
pub fn export_pipeline(graph: &PipelineGraph) -> Result<PipelineDocument> {
    let vertices = graph.vertices().iter().map(vertex_record).collect::<Result<Vec<_>>>()?;
    let edges = graph.edges().iter().map(edge_record).collect();

    Ok(PipelineDocument {
        api_version: API_VERSION.to_string(),
        kind: PIPELINE_KIND.to_string(),
        metadata: DocumentMetadata {
            name: NAME_PLACEHOLDER.to_string(),
        },
        spec: PipelineSpec {
            vertices,
            edges,
        },
    })
}

/// Export straight to text for previewing, name still unresolved.
pub fn export_pipeline_text(graph: &PipelineGraph) -> Result<String> {
    export_pipeline(graph)?.to_yaml()
}

fn vertex_record(vertex: &Vertex) -> Result<Map<String, Value>> {
    let mut record = Map::new();
    record.insert("name".to_string(), Value::String(vertex.id.clone()));

    match &vertex.config {
        Value::Object(config) => {
            for (key, value) in config {
                // the vertex id always wins over a configured name
                if key != "name" {
                    record.insert(key.clone(), value.clone());
                }
            }
        }
        Value::Null => {}
        other => {
            return Err(FlowRepoError::Convert(format!("vertex {} has a non-mapping config: {}", vertex.id, other)));
        }
    }

    Ok(record)
}

fn edge_record(edge: &Edge) -> EdgeRecord {
    EdgeRecord {
        from: edge.source.clone(),
        to: edge.target.clone(),
        conditions: edge.conditions.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_vertex_name_overrides_config_name() {
        let mut graph = PipelineGraph::new();
        graph.add_vertex(Vertex::new("real", json!({"name": "stale", "udf": {}}))).unwrap();

        let doc = export_pipeline(&graph).unwrap();
        let record = &doc.spec.vertices[0];
        assert_eq!(record["name"], "real");
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["name", "udf"]);
    }

    #[test]
    fn test_non_mapping_config_is_rejected() {
        let mut graph = PipelineGraph::new();
        graph.add_vertex(Vertex::new("bad", json!([1, 2]))).unwrap();
        assert!(matches!(export_pipeline(&graph), Err(FlowRepoError::Convert(_))));
    }

    #[test]
    fn test_placeholder_until_named() {
        let graph = PipelineGraph::new();
        let doc = export_pipeline(&graph).unwrap();
        assert!(!doc.is_named());
        assert!(doc.to_yaml().unwrap().contains(NAME_PLACEHOLDER));

        let named = doc.with_name("simple-pipeline");
        assert!(named.is_named());
        let text = named.to_yaml().unwrap();
        assert!(text.contains("name: simple-pipeline"));
        assert!(!text.contains(NAME_PLACEHOLDER));
    }

    #[test]
    fn test_key_order_is_preserved() {
        let mut graph = PipelineGraph::new();
        graph.add_vertex(Vertex::new("in", json!({"source": {"generator": {"rpu": 5, "duration": "1s"}}, "limits": {"readBatchSize": 10}}))).unwrap();

        let text = export_pipeline_text(&graph).unwrap();
        let api = text.find("apiVersion").unwrap();
        let kind = text.find("kind: Pipeline").unwrap();
        let metadata = text.find("metadata").unwrap();
        let spec = text.find("spec").unwrap();
        assert!(api < kind && kind < metadata && metadata < spec);

        let rpu = text.find("rpu").unwrap();
        let duration = text.find("duration").unwrap();
        let limits = text.find("limits").unwrap();
        assert!(rpu < duration && duration < limits);

        assert_eq!(text, export_pipeline_text(&graph).unwrap());
    }
}
