use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    FlowRepoError, Result,
    model::{Project, ProjectSummary},
    store::{DbCollectionIden, StoreIden},
};

/// Persisted shape of a project.
///
/// Scripts and manifests are kept as JSON text; times are unix millis.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ProjectRecord {
    pub name: String,
    pub pipeline: Option<String>,
    pub scripts: String,
    pub manifests: String,
    pub create_time: i64,
    pub update_time: i64,
}

impl DbCollectionIden for ProjectRecord {
    fn iden() -> StoreIden {
        StoreIden::Projects
    }
}

fn from_millis(
    name: &str,
    millis: i64,
) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or(FlowRepoError::Convert(format!("invalid timestamp {} in project {}", millis, name)))
}

impl ProjectRecord {
    pub fn from_project(project: &Project) -> Result<Self> {
        Ok(Self {
            name: project.name.clone(),
            pipeline: project.pipeline.clone(),
            scripts: serde_json::to_string(&project.scripts)?,
            manifests: serde_json::to_string(&project.manifests)?,
            create_time: project.created_at.timestamp_millis(),
            update_time: project.last_modified.timestamp_millis(),
        })
    }

    pub fn into_project(self) -> Result<Project> {
        Ok(Project {
            scripts: serde_json::from_str(&self.scripts)?,
            manifests: serde_json::from_str(&self.manifests)?,
            created_at: from_millis(&self.name, self.create_time)?,
            last_modified: from_millis(&self.name, self.update_time)?,
            pipeline: self.pipeline,
            name: self.name,
        })
    }

    pub fn summary(&self) -> Result<ProjectSummary> {
        Ok(ProjectSummary {
            name: self.name.clone(),
            created_at: from_millis(&self.name, self.create_time)?,
            last_modified: from_millis(&self.name, self.update_time)?,
        })
    }
}
