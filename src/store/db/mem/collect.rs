use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::{
    FlowRepoError, Result, ShareLock,
    store::{DbCollection, db::mem::DbDocument},
};

#[derive(Debug, Clone)]
pub struct Collect<T> {
    name: String,
    data: ShareLock<BTreeMap<String, T>>,
}

impl<T> Collect<T> {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            data: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, T>>> {
        self.data.read().map_err(|_| FlowRepoError::Store(format!("collection {} is poisoned", self.name)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, T>>> {
        self.data.write().map_err(|_| FlowRepoError::Store(format!("collection {} is poisoned", self.name)))
    }
}

impl<T> DbCollection for Collect<T>
where
    T: DbDocument,
{
    type Item = T;

    fn exists(
        &self,
        id: &str,
    ) -> Result<bool> {
        Ok(self.read()?.contains_key(id))
    }

    fn find(
        &self,
        id: &str,
    ) -> Result<Self::Item> {
        self.read()?.get(id).cloned().ok_or(FlowRepoError::NotFound(format!("{} in {}", id, self.name)))
    }

    fn list(&self) -> Result<Vec<Self::Item>> {
        Ok(self.read()?.values().cloned().collect())
    }

    fn create(
        &self,
        data: &Self::Item,
    ) -> Result<bool> {
        let mut items = self.write()?;
        if items.contains_key(data.id()) {
            return Ok(false);
        }
        items.insert(data.id().to_string(), data.clone());
        Ok(true)
    }

    fn update(
        &self,
        data: &Self::Item,
    ) -> Result<bool> {
        let mut items = self.write()?;
        match items.get_mut(data.id()) {
            Some(item) => {
                *item = data.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(
        &self,
        id: &str,
    ) -> Result<bool> {
        Ok(self.write()?.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::data::ProjectRecord;

    fn record(name: &str) -> ProjectRecord {
        ProjectRecord {
            name: name.to_string(),
            pipeline: None,
            scripts: "{}".into(),
            manifests: "{}".into(),
            create_time: 1,
            update_time: 1,
        }
    }

    #[test]
    fn test_collect_crud() {
        let collect = Collect::new("projects");
        assert!(collect.create(&record("a")).unwrap());
        assert!(!collect.create(&record("a")).unwrap());
        assert!(collect.exists("a").unwrap());

        let mut changed = record("a");
        changed.pipeline = Some("kind: Pipeline".into());
        assert!(collect.update(&changed).unwrap());
        assert!(!collect.update(&record("b")).unwrap());
        assert_eq!(collect.find("a").unwrap(), changed);

        assert!(collect.delete("a").unwrap());
        assert!(!collect.delete("a").unwrap());
        assert!(matches!(collect.find("a"), Err(FlowRepoError::NotFound(_))));
        assert!(collect.list().unwrap().is_empty());
    }
}
