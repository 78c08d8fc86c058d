use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Vertex id, unique within a graph.
pub type VertexId = String;

/// Structural role of a vertex, derived from the shape of its configuration.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VertexKind {
    Source,
    Transform,
    Sink,
    Unclassified,
}

impl VertexKind {
    /// `source` key wins over `sink`; any other object is a transform.
    pub fn of(config: &Value) -> Self {
        match config {
            Value::Object(map) if map.contains_key("source") => VertexKind::Source,
            Value::Object(map) if map.contains_key("sink") => VertexKind::Sink,
            Value::Object(_) => VertexKind::Transform,
            _ => VertexKind::Unclassified,
        }
    }
}

/// A `null` config is stored as an empty mapping so it exports and re-imports unchanged.
pub(crate) fn normalize_config(config: Value) -> Value {
    match config {
        Value::Null => Value::Object(Map::new()),
        config => config,
    }
}

/// A pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub id: VertexId,
    #[serde(default)]
    pub config: Value,
}

impl Vertex {
    pub fn new(
        id: impl Into<VertexId>,
        config: Value,
    ) -> Self {
        Self {
            id: id.into(),
            config: normalize_config(config),
        }
    }

    /// Recomputed from `config` on every call.
    pub fn kind(&self) -> VertexKind {
        VertexKind::of(&self.config)
    }
}
