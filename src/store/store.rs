use std::sync::Arc;

use tracing::trace;

use crate::{
    FlowRepoError, Result,
    model::{Project, ProjectSummary},
    utils,
};

use super::{DbCollection, DbStore, data::ProjectRecord};

/// Named, durable project records.
///
/// Every write replaces the whole record; concurrent saves of one name are
/// last-write-wins.
#[derive(Clone)]
pub struct ProjectStore {
    projects: Arc<dyn DbCollection<Item = ProjectRecord>>,
}

impl ProjectStore {
    /// Initialize `backend` and take its project collection.
    pub fn new(backend: &dyn DbStore) -> Result<Self> {
        backend.init()?;
        Ok(Self {
            projects: backend.projects(),
        })
    }

    /// Create and persist an empty project.
    pub fn create(
        &self,
        name: &str,
    ) -> Result<Project> {
        trace!("store::create({})", name);
        if name.is_empty() {
            return Err(FlowRepoError::Project("missing name in project".into()));
        }
        let project = Project::new(name);
        if !self.projects.create(&ProjectRecord::from_project(&project)?)? {
            return Err(FlowRepoError::DuplicateName(name.to_string()));
        }
        Ok(project)
    }

    /// Upsert the whole record.
    ///
    /// `last_modified` becomes now and `created_at` is taken from the stored
    /// record when there is one; both are written back into `project`.
    pub fn save(
        &self,
        project: &mut Project,
    ) -> Result<bool> {
        trace!("store::save({})", project.name);
        if project.name.is_empty() {
            return Err(FlowRepoError::Project("missing name in project".into()));
        }
        let now = utils::time::time_millis();
        let mut data = ProjectRecord::from_project(project)?;
        data.update_time = now;

        let saved = match self.projects.find(&project.name) {
            Ok(m) => {
                data.create_time = m.create_time;
                self.projects.update(&data)?
            }
            Err(FlowRepoError::NotFound(_)) => self.projects.create(&data)?,
            Err(err) => return Err(err),
        };

        let stored = data.into_project()?;
        project.created_at = stored.created_at;
        project.last_modified = stored.last_modified;
        Ok(saved)
    }

    /// Summaries of every stored project, most recently modified first.
    pub fn list(&self) -> Result<Vec<ProjectSummary>> {
        trace!("store::list()");
        let mut summaries = self.projects.list()?.iter().map(ProjectRecord::summary).collect::<Result<Vec<_>>>()?;
        summaries.sort_by(|a, b| b.last_modified.cmp(&a.last_modified).then_with(|| a.name.cmp(&b.name)));
        Ok(summaries)
    }

    pub fn load(
        &self,
        name: &str,
    ) -> Result<Option<Project>> {
        trace!("store::load({})", name);
        match self.projects.find(name) {
            Ok(record) => Ok(Some(record.into_project()?)),
            Err(FlowRepoError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Returns false when there was nothing to delete.
    pub fn delete(
        &self,
        name: &str,
    ) -> Result<bool> {
        trace!("store::delete({})", name);
        self.projects.delete(name)
    }

    pub fn exists(
        &self,
        name: &str,
    ) -> Result<bool> {
        self.projects.exists(name)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::{
        model::{Script, ScriptType},
        store::{FileStore, MemStore},
    };

    fn mem_store() -> ProjectStore {
        ProjectStore::new(&MemStore::new()).unwrap()
    }

    #[test]
    fn test_create_and_duplicate() {
        let store = mem_store();
        let project = store.create("demo").unwrap();
        assert_eq!(project.name, "demo");
        assert!(project.pipeline.is_none());
        assert!(project.scripts.is_empty());

        assert_eq!(store.create("demo"), Err(FlowRepoError::DuplicateName("demo".into())));
        assert!(matches!(store.create(""), Err(FlowRepoError::Project(_))));
    }

    #[test]
    fn test_save_upserts_and_keeps_created_at() {
        let store = mem_store();
        let mut project = Project::new("demo");
        project.created_at = Utc::now() - Duration::days(3);
        let created = project.created_at.timestamp_millis();

        store.save(&mut project).unwrap();
        let first = store.load("demo").unwrap().unwrap();
        assert_eq!(first.created_at.timestamp_millis(), created);

        let mut other = Project::new("demo");
        other.add_script(Script::new("a", ScriptType::Map, "pass")).unwrap();
        store.save(&mut other).unwrap();
        assert_eq!(other.created_at.timestamp_millis(), created);

        let loaded = store.load("demo").unwrap().unwrap();
        assert_eq!(loaded.created_at.timestamp_millis(), created);
        assert!(loaded.last_modified >= first.last_modified);
        assert_eq!(loaded.script("a").map(|s| s.body.as_str()), Some("pass"));
    }

    #[test]
    fn test_delete_then_list_and_load() {
        let store = mem_store();
        store.create("keep").unwrap();
        store.create("drop").unwrap();

        assert!(store.delete("drop").unwrap());
        assert!(!store.delete("drop").unwrap());

        let names: Vec<_> = store.list().unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["keep"]);
        assert_eq!(store.load("drop").unwrap(), None);
        assert!(!store.exists("drop").unwrap());
        assert!(store.exists("keep").unwrap());
    }

    #[test]
    fn test_list_newest_first() {
        let store = mem_store();
        let mut old = Project::new("old");
        store.save(&mut old).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let mut new = Project::new("new");
        store.save(&mut new).unwrap();

        let names: Vec<_> = store.list().unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["new", "old"]);
    }

    #[test]
    fn test_file_backend_survives_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let store = ProjectStore::new(&FileStore::new(tmp.path())).unwrap();
            let mut project = store.create("demo").unwrap();
            project.pipeline = Some("kind: Pipeline\n".into());
            store.save(&mut project).unwrap();
        }

        let store = ProjectStore::new(&FileStore::new(tmp.path())).unwrap();
        let project = store.load("demo").unwrap().unwrap();
        assert_eq!(project.pipeline.as_deref(), Some("kind: Pipeline\n"));
        assert!(store.delete("demo").unwrap());
        assert!(store.list().unwrap().is_empty());
    }
}
