mod collect;
mod r#impl;

use std::sync::Arc;

use crate::{
    Result,
    store::{DbCollection, DbCollectionIden, DbStore, data::*},
};
use collect::Collect;

#[derive(Debug, Clone)]
pub struct MemStore {
    projects: Arc<Collect<ProjectRecord>>,
}

trait DbDocument: Clone + Send + Sync {
    fn id(&self) -> &str;
}

impl DbStore for MemStore {
    fn init(&self) -> Result<()> {
        Ok(())
    }

    fn projects(&self) -> Arc<dyn DbCollection<Item = ProjectRecord>> {
        self.projects.clone()
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemStore {
    pub fn new() -> Self {
        let projects = Collect::new(ProjectRecord::iden().as_ref());

        Self {
            projects: Arc::new(projects),
        }
    }
}
