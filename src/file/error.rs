use std::io;
use thiserror::Error;

use crate::record::{PageId, RecordError, TableId};

#[derive(Debug, Error)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    #[error("File already exists: {0}")]
    FileAlreadyExists(String),

    #[error("Page not found: {0}")]
    PageNotFound(PageId),

    #[error("Unknown table: {0}")]
    UnknownTable(TableId),

    #[error("Buffer pool is full: no page can be evicted")]
    BufferPoolFull,

    #[error("Invalid page size: expected {expected}, got {actual}")]
    InvalidPageSize { expected: usize, actual: usize },

    #[error("No such element: {0}")]
    NoSuchElement(String),

    /// Reserved for a lock manager; nothing raises it yet.
    #[error("Transaction aborted")]
    TransactionAborted,
}

pub type FileResult<T> = Result<T, FileError>;
