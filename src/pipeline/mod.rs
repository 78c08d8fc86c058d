//! Declarative pipeline format.
//!
//! Translates between a [`PipelineGraph`](crate::PipelineGraph) and the YAML
//! pipeline document consumed by external tooling:
//!
//! ```yaml
//! apiVersion: numaflow.numaproj.io/v1alpha1
//! kind: Pipeline
//! metadata:
//!   name: <pipeline-name>
//! spec:
//!   vertices:
//!     - name: in
//!       source: { generator: {} }
//!   edges:
//!     - from: in
//!       to: out
//!       conditions: { ... }
//! ```
//!
//! Export then import reproduces vertex ids, configs, edge endpoints and
//! conditions. Edge ids and canvas positions are regenerated. A `null`
//! config or condition is normalized away when the graph is edited, so it
//! never reaches the document.

mod document;
mod import;

pub use document::{API_VERSION, DocumentMetadata, EdgeRecord, NAME_PLACEHOLDER, PIPELINE_KIND, PipelineDocument, PipelineSpec, export_pipeline, export_pipeline_text};
pub use import::{BAND_OFFSET, BAND_PITCH, Band, ImportedPipeline, PlacedVertex, Position, import_pipeline};
