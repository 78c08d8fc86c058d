use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::{
    FlowRepoError, Result,
    naming::sanitize_filesystem_name,
    store::{DbCollection, data::ProjectRecord},
};

use super::write_atomic;

const EXTENSION: &str = "json";

/// One `<sanitized name>.json` document per project.
#[derive(Debug)]
pub struct ProjectCollection {
    dir: PathBuf,
}

impl ProjectCollection {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
        }
    }

    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    fn path(
        &self,
        id: &str,
    ) -> PathBuf {
        self.dir.join(format!("{}.{}", sanitize_filesystem_name(id), EXTENSION))
    }

    fn read(
        &self,
        path: &Path,
    ) -> Result<Option<ProjectRecord>> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// The stored record for `id`; a file holding another name does not count.
    fn read_id(
        &self,
        id: &str,
    ) -> Result<Option<ProjectRecord>> {
        Ok(self.read(&self.path(id))?.filter(|record| record.name == id))
    }

    fn write(
        &self,
        data: &ProjectRecord,
    ) -> Result<()> {
        write_atomic(&self.path(&data.name), &serde_json::to_vec_pretty(data)?)
    }
}

impl DbCollection for ProjectCollection {
    type Item = ProjectRecord;

    fn exists(
        &self,
        id: &str,
    ) -> Result<bool> {
        Ok(self.read_id(id)?.is_some())
    }

    fn find(
        &self,
        id: &str,
    ) -> Result<Self::Item> {
        self.read_id(id)?.ok_or(FlowRepoError::NotFound(format!("project {}", id)))
    }

    fn list(&self) -> Result<Vec<Self::Item>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut records = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_none_or(|ext| ext != EXTENSION) {
                continue;
            }
            if let Some(record) = self.read(&path)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    fn create(
        &self,
        data: &Self::Item,
    ) -> Result<bool> {
        match self.read(&self.path(&data.name))? {
            Some(stored) if stored.name == data.name => Ok(false),
            Some(stored) => Err(FlowRepoError::Store(format!("project {} collides with stored project {}", data.name, stored.name))),
            None => {
                self.write(data)?;
                Ok(true)
            }
        }
    }

    fn update(
        &self,
        data: &Self::Item,
    ) -> Result<bool> {
        if self.read_id(&data.name)?.is_none() {
            return Ok(false);
        }
        self.write(data)?;
        Ok(true)
    }

    fn delete(
        &self,
        id: &str,
    ) -> Result<bool> {
        if self.read_id(id)?.is_none() {
            return Ok(false);
        }
        fs::remove_file(self.path(id))?;
        Ok(true)
    }
}
