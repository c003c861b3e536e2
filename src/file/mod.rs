//! Paged storage: the `DbFile` abstraction, the heap file implementation with
//! its multi-page cursor, and the buffer pool that mediates every page access.

mod buffer_pool;
mod error;
mod heap_file;

use std::sync::Arc;

pub use buffer_pool::{BufferPool, PageRef};
pub use error::{FileError, FileResult};
pub use heap_file::{HeapFile, HeapFileIterator};

use crate::record::{HeapPage, PageId, Schema, TableId, Tuple};
use crate::transaction::TransactionId;

/// A table's backing storage, addressed page by page.
///
/// `HeapFile` is the only implementation; index files would be a second one.
/// Mutations fetch pages through the buffer pool and return the pages they
/// dirtied so the pool can mark and re-install them.
pub trait DbFile: Send + Sync {
    fn id(&self) -> TableId;

    fn schema(&self) -> &Arc<Schema>;

    /// Read one page straight from the backing store
    fn read_page(&self, pid: PageId) -> FileResult<HeapPage>;

    /// Overwrite one whole page in the backing store
    fn write_page(&self, page: &HeapPage) -> FileResult<()>;

    fn page_count(&self) -> FileResult<usize>;

    fn insert_tuple(
        &self,
        pool: &BufferPool,
        txn: TransactionId,
        tuple: &mut Tuple,
    ) -> FileResult<Vec<PageRef>>;

    fn delete_tuple(
        &self,
        pool: &BufferPool,
        txn: TransactionId,
        tuple: &Tuple,
    ) -> FileResult<Vec<PageRef>>;

    /// Lazy cursor over every live tuple, page by page through the pool
    fn iterator(self: Arc<Self>, pool: Arc<BufferPool>, txn: TransactionId)
    -> Box<dyn DbFileIterator>;
}

/// Restartable forward-only cursor over a file's tuples
pub trait DbFileIterator: Send {
    fn open(&mut self) -> FileResult<()>;

    fn has_next(&mut self) -> FileResult<bool>;

    fn next(&mut self) -> FileResult<Tuple>;

    fn rewind(&mut self) -> FileResult<()>;

    fn close(&mut self);
}
