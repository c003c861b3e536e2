use thiserror::Error;

use super::record_id::PageId;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Field index {index} out of range for schema with {len} fields")]
    FieldIndexOutOfRange { index: usize, len: usize },

    #[error("Field not found: {0}")]
    FieldNotFound(String),

    #[error("Schema has no named fields")]
    NoNamedFields,

    #[error("Field {0} is unset")]
    UnsetField(usize),

    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Page full: {0}")]
    PageFull(PageId),

    #[error("Invalid slot: page={0}, slot={1}")]
    InvalidSlot(PageId, usize),

    #[error("Tuple has no record id")]
    MissingRecordId,

    #[error("Tuple belongs to {actual}, not {expected}")]
    WrongPage { expected: PageId, actual: PageId },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

pub type RecordResult<T> = Result<T, RecordError>;
