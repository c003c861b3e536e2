pub mod catalog;
pub mod config;
pub mod database;
pub mod execution;
pub mod file;
pub mod record;
pub mod transaction;

pub use catalog::{Catalog, CatalogError, CatalogResult, TableManifest};
pub use config::{ConfigError, ConfigResult, StorageConfig};
pub use database::{Database, DatabaseError, DatabaseResult};
pub use execution::{
    Delete, ExecError, ExecResult, ExecutionContext, Insert, OpIterator, SeqScan, Values,
};
pub use file::{
    BufferPool, DbFile, DbFileIterator, FileError, FileResult, HeapFile, HeapFileIterator,
    PageRef,
};
pub use record::{
    FieldDef, FieldType, HeapPage, PageId, RecordError, RecordId, RecordResult, Schema, TableId,
    Tuple, Value,
};
pub use transaction::{Permissions, TransactionId};
