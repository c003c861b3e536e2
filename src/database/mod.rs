//! A directory of heap-file tables sharing one catalog and one buffer pool.
//!
//! Each table `name` is stored as `name.dat` (pages) next to a
//! `name.schema.json` manifest describing its fields.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::catalog::{Catalog, CatalogError, TableManifest};
use crate::config::{ConfigError, StorageConfig};
use crate::execution::{ExecError, ExecutionContext};
use crate::file::{BufferPool, FileError, HeapFile};
use crate::record::{RecordError, Schema, TableId};

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Table {0} already exists")]
    TableExists(String),

    #[error("Table {0} not found")]
    TableNotFound(String),

    #[error("Cannot read/write file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Catalog error: {0}")]
    CatalogError(#[from] CatalogError),

    #[error("Config error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Record error: {0}")]
    RecordError(#[from] RecordError),

    #[error("File error: {0}")]
    FileError(#[from] FileError),

    #[error("Execution error: {0}")]
    ExecError(#[from] ExecError),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

#[derive(Clone)]
pub struct Database {
    data_dir: PathBuf,
    config: StorageConfig,
    catalog: Arc<Catalog>,
    buffer_pool: Arc<BufferPool>,
}

impl Database {
    /// Open (creating if needed) a data directory
    pub fn new<P: AsRef<Path>>(data_dir: P, config: StorageConfig) -> DatabaseResult<Self> {
        config.validate()?;

        let data_dir = data_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;

        let catalog = Arc::new(Catalog::new());
        let buffer_pool = Arc::new(BufferPool::new(catalog.clone(), &config));

        Ok(Self {
            data_dir,
            config,
            catalog,
            buffer_pool,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn buffer_pool(&self) -> &Arc<BufferPool> {
        &self.buffer_pool
    }

    /// Resources for building operator trees over this database
    pub fn context(&self) -> ExecutionContext {
        ExecutionContext::new(self.catalog.clone(), self.buffer_pool.clone())
    }

    fn table_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{}.dat", name))
    }

    fn manifest_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{}.schema.json", name))
    }

    /// Create an empty table and its manifest, and register it
    pub fn create_table(&self, name: &str, schema: Schema) -> DatabaseResult<TableId> {
        let manifest_path = self.manifest_path(name);
        if manifest_path.exists() || self.table_path(name).exists() {
            return Err(DatabaseError::TableExists(name.to_string()));
        }

        TableManifest::new(name, &schema).save(&manifest_path)?;
        let file = HeapFile::create(self.table_path(name), schema, &self.config)?;
        let table_id = self.catalog.add_table(Arc::new(file), name)?;
        log::info!("Created table '{}'", name);
        Ok(table_id)
    }

    /// Register an existing table from its manifest. Opening a table that is
    /// already registered returns its id.
    pub fn open_table(&self, name: &str) -> DatabaseResult<TableId> {
        if let Ok(table_id) = self.catalog.table_id(name) {
            return Ok(table_id);
        }

        let manifest_path = self.manifest_path(name);
        if !manifest_path.exists() {
            return Err(DatabaseError::TableNotFound(name.to_string()));
        }

        let manifest = TableManifest::load(&manifest_path)?;
        self.add_table_file(self.table_path(name), name, manifest.schema())
    }

    /// Register an arbitrary heap file under a table name
    pub fn add_table_file<P: AsRef<Path>>(
        &self,
        path: P,
        name: &str,
        schema: Schema,
    ) -> DatabaseResult<TableId> {
        let file = HeapFile::open(path, schema, &self.config)?;
        Ok(self.catalog.add_table(Arc::new(file), name)?)
    }

    /// Write every dirty page back to disk
    pub fn flush(&self) -> DatabaseResult<()> {
        self.buffer_pool.flush_all_pages()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests;
