mod project;

use std::sync::Arc;

pub use project::ProjectCollection;

use super::synclient::SynClient;

pub type DbConnection = Arc<SynClient>;
