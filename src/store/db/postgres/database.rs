use std::sync::Arc;

use tokio::runtime::Runtime;
use tracing::debug;

use crate::{
    Result,
    store::{DbCollection, DbStore, data::*, map_db_err},
};

use super::{DbInit, collection::*, synclient::SynClient};

pub struct PostgresStore {
    projects: Arc<ProjectCollection>,
}

impl DbStore for PostgresStore {
    fn init(&self) -> Result<()> {
        self.projects.init()
    }

    fn projects(&self) -> Arc<dyn DbCollection<Item = ProjectRecord>> {
        self.projects.clone()
    }
}

impl PostgresStore {
    /// Connect to `db_url`; queries run on `runtime`.
    pub fn new(
        db_url: &str,
        runtime: Arc<Runtime>,
    ) -> Result<Self> {
        let conn = Arc::new(SynClient::connect(db_url, runtime).map_err(map_db_err)?);
        debug!("connected to postgres");
        let projects = ProjectCollection::new(&conn);

        Ok(Self {
            projects: Arc::new(projects),
        })
    }
}
