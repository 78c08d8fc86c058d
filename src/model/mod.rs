mod edge;
mod graph;
mod project;
mod script;
mod vertex;

pub use edge::{Edge, EdgeId};
pub use graph::PipelineGraph;
pub use project::{Manifest, ManifestContent, ManifestNamespace, Project, ProjectSummary};
pub use script::{Script, ScriptType};
pub use vertex::{Vertex, VertexId, VertexKind};
