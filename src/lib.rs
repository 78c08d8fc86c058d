//! # Flowrepo
//!
//! Flowrepo is the project engine behind a visual pipeline designer. It keeps
//! a pipeline project (graph, transform scripts, generated build and
//! deployment artifacts) as a versioned, exportable unit.
//!
//! ## Core Features
//!
//! - **Declarative Export**: Round-trips the pipeline graph through a YAML pipeline document
//! - **Deterministic Layout**: Expands a project into a fixed file tree with generated Dockerfiles
//! - **Version History**: Content-addressed commits over an in-memory filesystem, no empty commits
//! - **Pluggable Storage**: In-memory, local JSON files or PostgreSQL project records
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use flowrepo::{Script, ScriptType, Vertex, WorkspaceBuilder};
//!
//! let mut workspace = WorkspaceBuilder::new().build()?;
//! workspace.initialize_project("demo")?;
//!
//! let graph = workspace.graph_mut()?;
//! graph.add_vertex(Vertex::new("in", json!({"source": {"generator": {}}})))?;
//! graph.add_vertex(Vertex::new("out", json!({"sink": {"log": {}}})))?;
//! graph.connect("in", "out")?;
//! workspace.add_script(Script::from_template("cat", ScriptType::Map))?;
//!
//! let report = workspace.sync("first pipeline")?;
//! ```

pub mod artifacts;
mod builder;
mod config;
mod error;
pub mod history;
pub mod layout;
mod model;
pub mod naming;
pub mod pipeline;
pub mod store;
mod utils;
pub mod vfs;
mod workspace;

use std::sync::{Arc, RwLock};

pub use builder::WorkspaceBuilder;
pub use config::{ArtifactsConfig, Config, FileConfig, PostgresConfig, StoreConfig, StoreType};
pub use error::FlowRepoError;
pub use history::{CommitOutcome, CommitReport, StageFailure, VersionHistory};
pub use model::*;
pub use workspace::Workspace;

/// Result type alias for Flowrepo operations.
pub type Result<T> = std::result::Result<T, FlowRepoError>;

/// Thread-safe shared lock wrapper using Arc<RwLock<T>>.
pub(crate) type ShareLock<T> = Arc<RwLock<T>>;
