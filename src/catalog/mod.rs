//! Table registry: maps table ids to their backing file, name and schema.
//!
//! Also holds the JSON manifest format the command-line front end uses to
//! remember a table's schema between runs.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::file::DbFile;
use crate::record::{FieldDef, Schema, TableId};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Table {0} not found")]
    TableNotFound(String),

    #[error("Table {0} already exists")]
    TableExists(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

struct TableEntry {
    name: String,
    file: Arc<dyn DbFile>,
}

/// In-memory catalog shared by the buffer pool and operators
#[derive(Default)]
pub struct Catalog {
    tables: RwLock<HashMap<TableId, TableEntry>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file under a table name. Re-adding the same file id replaces
    /// the entry; reusing a name for a different file is an error.
    pub fn add_table(&self, file: Arc<dyn DbFile>, name: &str) -> CatalogResult<TableId> {
        let table_id = file.id();
        let mut tables = self.tables.write();

        if tables
            .iter()
            .any(|(&id, entry)| id != table_id && entry.name == name)
        {
            return Err(CatalogError::TableExists(name.to_string()));
        }

        log::debug!("Registered table '{}' as {}", name, table_id);
        tables.insert(
            table_id,
            TableEntry {
                name: name.to_string(),
                file,
            },
        );
        Ok(table_id)
    }

    /// Look up a table id by name
    pub fn table_id(&self, name: &str) -> CatalogResult<TableId> {
        self.tables
            .read()
            .iter()
            .find(|(_, entry)| entry.name == name)
            .map(|(&id, _)| id)
            .ok_or_else(|| CatalogError::TableNotFound(name.to_string()))
    }

    /// The backing file of a table, if registered
    pub fn file(&self, table_id: TableId) -> Option<Arc<dyn DbFile>> {
        self.tables
            .read()
            .get(&table_id)
            .map(|entry| entry.file.clone())
    }

    pub fn schema(&self, table_id: TableId) -> Option<Arc<Schema>> {
        self.tables
            .read()
            .get(&table_id)
            .map(|entry| entry.file.schema().clone())
    }

    pub fn table_name(&self, table_id: TableId) -> Option<String> {
        self.tables
            .read()
            .get(&table_id)
            .map(|entry| entry.name.clone())
    }

    /// All registered table ids, sorted
    pub fn table_ids(&self) -> Vec<TableId> {
        let mut ids: Vec<TableId> = self.tables.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

/// Schema manifest stored next to a table's data file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableManifest {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

impl TableManifest {
    pub fn new(name: &str, schema: &Schema) -> Self {
        Self {
            name: name.to_string(),
            fields: schema.fields().to_vec(),
        }
    }

    pub fn schema(&self) -> Schema {
        Schema::new(self.fields.clone())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> CatalogResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CatalogError::TableNotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> CatalogResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
