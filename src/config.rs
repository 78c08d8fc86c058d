use std::{fs, path::Path};

use serde::Deserialize;

use crate::{FlowRepoError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// store config
    #[serde(default)]
    pub store: StoreConfig,
    /// generated artifact config
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
    /// number of async worker threads used by the postgres store, defaults to 4
    #[serde(default = "default_worker_threads")]
    pub async_worker_thread_number: u16,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    /// store type
    #[serde(default)]
    pub store_type: StoreType,
    /// file store config
    pub file: Option<FileConfig>,
    /// postgres config
    pub postgres: Option<PostgresConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq, strum::AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StoreType {
    #[default]
    Mem,
    File,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileConfig {
    /// directory holding one json record per project
    pub dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostgresConfig {
    /// postgres database url
    pub database_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactsConfig {
    /// namespace used for generated deployment descriptors
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_worker_threads() -> u16 {
    4
}

fn default_namespace() -> String {
    crate::artifacts::DEFAULT_NAMESPACE.to_string()
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            artifacts: ArtifactsConfig::default(),
            async_worker_thread_number: default_worker_threads(),
        }
    }
}

impl Config {
    pub fn create<T: AsRef<Path>>(path: T) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref()).map_err(|e| FlowRepoError::Config(format!("failed to load config file {:?}: {}", path.as_ref(), e)))?;

        Self::load_from_str(data.as_str())
    }

    pub fn load_from_str(toml_str: &str) -> Result<Self> {
        let config = toml::from_str::<Config>(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.async_worker_thread_number == 0 {
            return Err(FlowRepoError::Config("async_worker_thread_number must be at least 1".into()));
        }
        match self.store.store_type {
            StoreType::File if self.store.file.is_none() => Err(FlowRepoError::Config("[store.file] is required when store type is file".into())),
            StoreType::Postgres if self.store.postgres.is_none() => {
                Err(FlowRepoError::Config("[store.postgres] is required when store type is postgres".into()))
            }
            _ => Ok(()),
        }
    }
}
