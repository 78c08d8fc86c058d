use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    FlowRepoError, Result, artifacts,
    model::{Script, ScriptType},
    naming::ScriptName,
};

/// Where a hand-provided artifact lands in the directory structure.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ManifestNamespace {
    /// `dockerfiles/<key>/Dockerfile`
    Dockerfiles,
    /// `manifests/<key>`
    #[default]
    Manifests,
}

/// Text is written as-is; structured values are serialized when written out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ManifestContent {
    Text(String),
    Structured(Value),
}

impl From<String> for ManifestContent {
    fn from(value: String) -> Self {
        ManifestContent::Text(value)
    }
}

impl From<&str> for ManifestContent {
    fn from(value: &str) -> Self {
        ManifestContent::Text(value.to_string())
    }
}

impl From<Value> for ManifestContent {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => ManifestContent::Text(s),
            other => ManifestContent::Structured(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub namespace: ManifestNamespace,
    pub content: ManifestContent,
}

impl Manifest {
    pub fn new(
        namespace: ManifestNamespace,
        content: impl Into<ManifestContent>,
    ) -> Self {
        Self {
            namespace,
            content: content.into(),
        }
    }
}

/// A named, versioned bundle of one pipeline, its scripts and extra manifests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub pipeline: Option<String>,
    #[serde(default)]
    pub scripts: BTreeMap<String, Script>,
    #[serde(default)]
    pub manifests: BTreeMap<String, Manifest>,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

/// Listing entry returned by the project store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl Project {
    /// A fresh project with no pipeline and no scripts.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            pipeline: None,
            scripts: BTreeMap::new(),
            manifests: BTreeMap::new(),
            created_at: now,
            last_modified: now,
        }
    }

    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            name: self.name.clone(),
            created_at: self.created_at,
            last_modified: self.last_modified,
        }
    }

    /// Insert a script, replacing any script with the same name.
    ///
    /// Fails when another script or Dockerfiles manifest already owns the
    /// file stem the name sanitizes to.
    pub fn add_script(
        &mut self,
        script: Script,
    ) -> Result<()> {
        if script.name.is_empty() {
            return Err(FlowRepoError::Project("script name must not be empty".into()));
        }
        self.check_stem(&script.name, None)?;
        self.scripts.insert(script.name.clone(), script);
        Ok(())
    }

    /// Scripts and Dockerfiles manifests share `dockerfiles/<stem>`; scripts also own `scripts/<stem>.py`.
    ///
    /// A manifest keyed exactly like a script is allowed, the generated files win.
    fn check_stem(
        &self,
        name: &str,
        leaving: Option<&str>,
    ) -> Result<()> {
        let stem = ScriptName::new(name).file_stem();
        let dockerfiles = self.manifests.iter().filter(|(_, m)| m.namespace == ManifestNamespace::Dockerfiles).map(|(key, _)| key);
        let taken = self
            .scripts
            .keys()
            .chain(dockerfiles)
            .find(|other| other.as_str() != name && Some(other.as_str()) != leaving && ScriptName::new(other.as_str()).file_stem() == stem);
        match taken {
            Some(other) => Err(FlowRepoError::DuplicateName(format!("{} and {} both map to {}", name, other, stem))),
            None => Ok(()),
        }
    }

    pub fn script(
        &self,
        name: &str,
    ) -> Option<&Script> {
        self.scripts.get(name)
    }

    /// Replace the body of a script, moving it to `new_name` when that differs.
    ///
    /// The old key is removed before the new one is inserted; the script type is kept.
    pub fn rename_script(
        &mut self,
        name: &str,
        new_name: &str,
        body: impl Into<String>,
    ) -> Result<()> {
        if name != new_name && self.scripts.contains_key(new_name) {
            return Err(FlowRepoError::Project(format!("script {} already exists", new_name)));
        }
        if new_name.is_empty() {
            return Err(FlowRepoError::Project("script name must not be empty".into()));
        }
        let script_type = self.scripts.get(name).ok_or(FlowRepoError::NotFound(format!("script {}", name)))?.script_type;
        self.check_stem(new_name, Some(name))?;

        self.scripts.remove(name);
        self.scripts.insert(new_name.to_string(), Script::new(new_name, script_type, body));
        Ok(())
    }

    pub fn remove_script(
        &mut self,
        name: &str,
    ) -> Result<Script> {
        self.scripts.remove(name).ok_or(FlowRepoError::NotFound(format!("script {}", name)))
    }

    /// Insert a manifest, replacing any manifest with the same key.
    ///
    /// The key is a single path segment. Dockerfiles manifests follow the
    /// same stem rule as scripts.
    pub fn add_manifest(
        &mut self,
        key: impl Into<String>,
        manifest: Manifest,
    ) -> Result<()> {
        let key = key.into();
        if key.is_empty() || key.contains(['/', '\\']) || key == "." || key == ".." {
            return Err(FlowRepoError::Project(format!("invalid manifest key '{}'", key)));
        }
        if manifest.namespace == ManifestNamespace::Dockerfiles && !self.scripts.contains_key(&key) {
            self.check_stem(&key, None)?;
        }
        self.manifests.insert(key, manifest);
        Ok(())
    }

    pub fn remove_manifest(
        &mut self,
        key: &str,
    ) -> Result<Manifest> {
        self.manifests.remove(key).ok_or(FlowRepoError::NotFound(format!("manifest {}", key)))
    }

    /// Store the workload and service descriptors of a script as structured manifests.
    ///
    /// Returns the two manifest keys.
    pub fn attach_deployment(
        &mut self,
        script_name: &str,
        namespace: Option<&str>,
    ) -> Result<(String, String)> {
        if !self.scripts.contains_key(script_name) {
            return Err(FlowRepoError::NotFound(format!("script {}", script_name)));
        }
        let resource = ScriptName::new(script_name).resource_name();
        let deployment_key = format!("{}-deployment.yaml", resource);
        let service_key = format!("{}-service.yaml", resource);

        self.add_manifest(
            deployment_key.clone(),
            Manifest::new(ManifestNamespace::Manifests, artifacts::generate_workload_descriptor(script_name, namespace)),
        )?;
        self.add_manifest(
            service_key.clone(),
            Manifest::new(ManifestNamespace::Manifests, artifacts::generate_service_descriptor(script_name, namespace)),
        )?;
        Ok((deployment_key, service_key))
    }

    /// Names of scripts of the given type.
    pub fn scripts_of(
        &self,
        script_type: ScriptType,
    ) -> Vec<&str> {
        self.scripts.values().filter(|s| s.script_type == script_type).map(|s| s.name.as_str()).collect()
    }
}
