//! Pull-based operators.
//!
//! Every operator exposes the same cursor protocol: `open` may do work (the
//! mutating operators drain their child there), `has_next`/`next` pull one
//! tuple at a time, and `rewind` restarts from the beginning. Everything runs
//! synchronously on the caller's thread.

mod delete;
mod insert;
mod seq_scan;
mod values;

use std::sync::Arc;

use thiserror::Error;

pub use delete::Delete;
pub use insert::Insert;
pub use seq_scan::SeqScan;
pub use values::Values;

use crate::catalog::Catalog;
use crate::file::{BufferPool, FileError};
use crate::record::{FieldType, RecordError, Schema, TableId, Tuple, Value};

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("File error: {0}")]
    File(#[from] FileError),

    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("No such element: {0}")]
    NoSuchElement(String),

    #[error("Unknown table: {0}")]
    UnknownTable(TableId),
}

pub type ExecResult<T> = Result<T, ExecError>;

/// Trait for all pull operators
pub trait OpIterator: Send {
    /// Prepare the operator; must be called before pulling tuples
    fn open(&mut self) -> ExecResult<()>;

    fn has_next(&mut self) -> ExecResult<bool>;

    /// The next tuple; `NoSuchElement` if there is none
    fn next(&mut self) -> ExecResult<Tuple>;

    /// Restart from the first tuple
    fn rewind(&mut self) -> ExecResult<()>;

    fn close(&mut self);

    /// Schema of the tuples this operator yields
    fn schema(&self) -> &Arc<Schema>;
}

/// Shared resources operators run against
#[derive(Clone)]
pub struct ExecutionContext {
    pub catalog: Arc<Catalog>,
    pub buffer_pool: Arc<BufferPool>,
}

impl ExecutionContext {
    pub fn new(catalog: Arc<Catalog>, buffer_pool: Arc<BufferPool>) -> Self {
        Self {
            catalog,
            buffer_pool,
        }
    }
}

/// Output schema of the mutating operators: one unnamed integer
pub(crate) fn count_schema() -> Arc<Schema> {
    Arc::new(Schema::from_types([FieldType::Int]))
}

pub(crate) fn count_tuple(schema: &Arc<Schema>, count: i32) -> ExecResult<Tuple> {
    Ok(Tuple::from_values(schema.clone(), vec![Value::Int(count)])?)
}
