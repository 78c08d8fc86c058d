use crate::store::{data::ProjectRecord, db::mem::DbDocument};

impl DbDocument for ProjectRecord {
    fn id(&self) -> &str {
        &self.name
    }
}
