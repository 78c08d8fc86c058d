mod collection;

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::debug;

use crate::{
    Result,
    store::{DbCollection, DbCollectionIden, DbStore, data::*},
};
use collection::ProjectCollection;

/// Keeps every collection as a directory of JSON documents under `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    projects: Arc<ProjectCollection>,
}

impl DbStore for FileStore {
    fn init(&self) -> Result<()> {
        debug!("file store at {}", self.dir.display());
        self.projects.init()
    }

    fn projects(&self) -> Arc<dyn DbCollection<Item = ProjectRecord>> {
        self.projects.clone()
    }
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let projects = ProjectCollection::new(dir.join(ProjectRecord::iden().as_ref()));

        Self {
            dir,
            projects: Arc::new(projects),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn write_atomic(
    path: &Path,
    data: &[u8],
) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
