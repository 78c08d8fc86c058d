use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};
use tracing::debug;

use crate::{
    Config, FlowRepoError, Result, StoreType, Workspace,
    store::{DbStore, FileStore, MemStore, PostgresStore, ProjectStore},
};

pub struct WorkspaceBuilder {
    config: Config,
    rt: Option<Arc<Runtime>>,
}

impl Default for WorkspaceBuilder {
    fn default() -> Self {
        Self {
            config: Config::default(),
            rt: None,
        }
    }
}

impl WorkspaceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(
        mut self,
        config: Config,
    ) -> Self {
        self.config = config;
        self
    }

    pub fn async_worker_thread_number(
        mut self,
        n: u16,
    ) -> Self {
        self.config.async_worker_thread_number = n;
        self
    }

    /// Runtime used by the postgres store instead of building one.
    pub fn runtime(
        mut self,
        runtime: Arc<Runtime>,
    ) -> Self {
        self.rt = Some(runtime);
        self
    }

    fn runtime_or_build(&self) -> Result<Arc<Runtime>> {
        if let Some(rt) = &self.rt {
            return Ok(rt.clone());
        }
        let runtime = Builder::new_multi_thread().worker_threads(self.config.async_worker_thread_number.into()).enable_all().build()?;
        Ok(Arc::new(runtime))
    }

    pub fn build(&self) -> Result<Workspace> {
        let store = &self.config.store;
        debug!("building workspace with {} store", store.store_type.as_ref());
        let db: Box<dyn DbStore> = match store.store_type {
            StoreType::Mem => Box::new(MemStore::new()),
            StoreType::File => {
                let file = store.file.as_ref().ok_or(FlowRepoError::Config("[store.file] is required when store type is file".into()))?;
                Box::new(FileStore::new(&file.dir))
            }
            StoreType::Postgres => {
                let postgres = store.postgres.as_ref().ok_or(FlowRepoError::Config("[store.postgres] is required when store type is postgres".into()))?;
                Box::new(PostgresStore::new(&postgres.database_url, self.runtime_or_build()?)?)
            }
        };

        let store = ProjectStore::new(db.as_ref())?;
        Ok(Workspace::new(store, self.config.artifacts.clone()))
    }
}
