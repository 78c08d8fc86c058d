//! Directory structure of a project.
//!
//! Expands a [`Project`] into the logical file tree it is exported and
//! versioned as:
//!
//! ```text
//! pipeline.yaml
//! requirements.txt
//! scripts/<stem>.py
//! dockerfiles/<stem>/Dockerfile
//! manifests/<key>
//! ```

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    Result, artifacts,
    model::{ManifestContent, ManifestNamespace, Project},
    naming::ScriptName,
};

pub const PIPELINE_FILE: &str = "pipeline.yaml";
pub const SCRIPTS_DIR: &str = "scripts";
pub const DOCKERFILES_DIR: &str = "dockerfiles";
pub const MANIFESTS_DIR: &str = "manifests";

/// Content of one file in the structure.
///
/// Structured values are kept as data; they only become text in [`FileContent::to_bytes`].
#[derive(Debug, Clone, PartialEq)]
pub enum FileContent {
    Text(String),
    Structured(Value),
}

impl FileContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FileContent::Text(text) => Some(text),
            FileContent::Structured(_) => None,
        }
    }

    /// Bytes to write; structured values are rendered as YAML.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            FileContent::Text(text) => Ok(text.as_bytes().to_vec()),
            FileContent::Structured(value) => Ok(serde_yaml::to_string(value)?.into_bytes()),
        }
    }
}

impl From<&ManifestContent> for FileContent {
    fn from(content: &ManifestContent) -> Self {
        match content {
            ManifestContent::Text(text) => FileContent::Text(text.clone()),
            ManifestContent::Structured(value) => FileContent::Structured(value.clone()),
        }
    }
}

/// Relative path → content, ordered by path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectoryStructure {
    files: BTreeMap<String, FileContent>,
}

impl DirectoryStructure {
    pub fn get(
        &self,
        path: &str,
    ) -> Option<&FileContent> {
        self.files.get(path)
    }

    pub fn contains(
        &self,
        path: &str,
    ) -> bool {
        self.files.contains_key(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileContent)> {
        self.files.iter().map(|(path, content)| (path.as_str(), content))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn insert(
        &mut self,
        path: String,
        content: FileContent,
    ) {
        if self.files.insert(path.clone(), content).is_some() {
            warn!("{} was generated twice, keeping the last one", path);
        }
    }
}

pub fn script_path(script_name: &str) -> String {
    format!("{}/{}.{}", SCRIPTS_DIR, ScriptName::new(script_name).file_stem(), artifacts::SCRIPT_EXTENSION)
}

pub fn build_file_path(script_name: &str) -> String {
    format!("{}/{}/{}", DOCKERFILES_DIR, ScriptName::new(script_name).file_stem(), artifacts::BUILD_FILE)
}

fn manifest_path(
    key: &str,
    namespace: ManifestNamespace,
) -> String {
    match namespace {
        ManifestNamespace::Dockerfiles => build_file_path(key),
        ManifestNamespace::Manifests => format!("{}/{}", MANIFESTS_DIR, key),
    }
}

/// Build the file tree of a project. `None` in, `None` out.
pub fn build_directory_structure(project: Option<&Project>) -> Option<DirectoryStructure> {
    let project = project?;
    let mut structure = DirectoryStructure::default();

    structure.insert(PIPELINE_FILE.to_string(), FileContent::Text(project.pipeline.clone().unwrap_or_default()));
    structure.insert(artifacts::DEPENDENCY_MANIFEST_FILE.to_string(), FileContent::Text(artifacts::generate_dependency_manifest()));

    let mut processed = HashSet::new();
    for (name, script) in &project.scripts {
        structure.insert(script_path(name), FileContent::Text(script.body.clone()));
        structure.insert(build_file_path(name), FileContent::Text(artifacts::generate_build_file(name)));
        processed.insert(name.as_str());
    }

    for (key, manifest) in &project.manifests {
        if processed.contains(key.as_str()) {
            debug!("skipping manifest {}: generated from script of the same name", key);
            continue;
        }
        let path = manifest_path(key, manifest.namespace);
        if structure.contains(&path) {
            debug!("skipping manifest {}: {} is generated", key, path);
            continue;
        }
        structure.insert(path, FileContent::from(&manifest.content));
    }

    Some(structure)
}
