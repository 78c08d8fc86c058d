//! Storage layer for persisting projects.
//!
//! Provides an abstraction over different storage backends:
//! - `MemStore`: In-memory storage for testing
//! - `FileStore`: one JSON document per project in a local directory
//! - `PostgresStore`: PostgreSQL for production persistence

pub mod data;
mod db;
mod store;

use std::{error::Error, sync::Arc};

use strum::AsRefStr;

use crate::{FlowRepoError, Result};

pub use db::{FileStore, MemStore, PostgresStore};
pub use store::ProjectStore;

/// Maps database errors to FlowRepoError.
fn map_db_err(err: impl Error) -> FlowRepoError {
    FlowRepoError::Store(err.to_string())
}

/// Identifiers for different storage collections.
#[derive(Debug, Clone, AsRefStr, PartialEq, Hash, Eq)]
pub enum StoreIden {
    /// Project records.
    #[strum(serialize = "projects")]
    Projects,
}

/// Trait for types that can identify their storage collection.
pub trait DbCollectionIden {
    /// Returns the collection identifier for this type.
    fn iden() -> StoreIden;
}

/// Trait for database collection operations.
///
/// Records are keyed by a string id and always written whole.
pub trait DbCollection: Send + Sync {
    /// The type of items stored in this collection.
    type Item;

    /// Checks if a record with the given ID exists.
    fn exists(
        &self,
        id: &str,
    ) -> Result<bool>;

    /// Finds a record by ID, failing with `NotFound` when absent.
    fn find(
        &self,
        id: &str,
    ) -> Result<Self::Item>;

    /// Every record in the collection.
    fn list(&self) -> Result<Vec<Self::Item>>;

    /// Creates a new record. Returns false when the id is taken.
    fn create(
        &self,
        data: &Self::Item,
    ) -> Result<bool>;

    /// Replaces an existing record. Returns false when it does not exist.
    fn update(
        &self,
        data: &Self::Item,
    ) -> Result<bool>;

    /// Deletes a record by ID.
    fn delete(
        &self,
        id: &str,
    ) -> Result<bool>;
}

/// Trait for database store initialization.
pub trait DbStore {
    /// Prepares the backend (tables, directories) for use.
    fn init(&self) -> Result<()>;

    /// The collection of project records.
    fn projects(&self) -> Arc<dyn DbCollection<Item = data::ProjectRecord>>;
}
