use std::sync::Arc;

use lru::LruCache;
use parking_lot::{Mutex, RwLock};

use super::error::{FileError, FileResult};
use super::DbFile;
use crate::catalog::Catalog;
use crate::config::StorageConfig;
use crate::record::{HeapPage, PageId, TableId, Tuple};
use crate::transaction::{Permissions, TransactionId};

/// A resident page shared between the pool and its callers
pub type PageRef = Arc<RwLock<HeapPage>>;

type PageCache = LruCache<PageId, PageRef, ahash::RandomState>;

/// Bounded page cache with LRU eviction; every page access goes through here.
///
/// The recency map is the only shared state and sits behind a single mutex,
/// so lookup, admission, eviction, flush and discard are mutually exclusive.
/// Lock order is pool state, then page, then file handle.
///
/// No locking is enforced between transactions yet: `release_page`,
/// `holds_lock` and `transaction_complete` are seams for a lock manager and
/// currently do nothing.
pub struct BufferPool {
    catalog: Arc<Catalog>,
    capacity: usize,
    state: Mutex<PageCache>,
}

impl BufferPool {
    pub fn new(catalog: Arc<Catalog>, config: &StorageConfig) -> Self {
        Self {
            catalog,
            capacity: config.buffer_pool_pages,
            // Capacity is enforced by make_room so eviction can flush first
            state: Mutex::new(LruCache::unbounded_with_hasher(
                ahash::RandomState::new(),
            )),
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    fn file(&self, table_id: TableId) -> FileResult<Arc<dyn DbFile>> {
        self.catalog
            .file(table_id)
            .ok_or(FileError::UnknownTable(table_id))
    }

    /// Fetch a page, reading it from its file on a miss.
    ///
    /// A miss at capacity evicts the least recently used page first, writing
    /// it back if dirty; `BufferPoolFull` if nothing can be evicted.
    pub fn get_page(
        &self,
        txn: TransactionId,
        pid: PageId,
        perm: Permissions,
    ) -> FileResult<PageRef> {
        let mut state = self.state.lock();

        if let Some(page) = state.get(&pid) {
            log::trace!("{} hit {} ({:?})", txn, pid, perm);
            return Ok(page.clone());
        }

        log::trace!("{} miss {} ({:?})", txn, pid, perm);
        let file = self.file(pid.table_id)?;
        if pid.page_no >= file.page_count()? {
            return Err(FileError::PageNotFound(pid));
        }
        self.make_room(&mut state)?;

        let page = Arc::new(RwLock::new(file.read_page(pid)?));
        state.put(pid, page.clone());
        Ok(page)
    }

    /// Insert a tuple into a table and return the ids of the pages it dirtied
    pub fn insert_tuple(
        &self,
        txn: TransactionId,
        table_id: TableId,
        tuple: &mut Tuple,
    ) -> FileResult<Vec<PageId>> {
        let file = self.file(table_id)?;
        let pages = file.insert_tuple(self, txn, tuple)?;
        self.install_dirty(pages)
    }

    /// Delete a tuple located by its record id and return the dirtied pages
    pub fn delete_tuple(&self, txn: TransactionId, tuple: &Tuple) -> FileResult<Vec<PageId>> {
        let record_id = tuple
            .record_id()
            .ok_or(crate::record::RecordError::MissingRecordId)?;
        let file = self.file(record_id.page_id.table_id)?;
        let pages = file.delete_tuple(self, txn, tuple)?;
        self.install_dirty(pages)
    }

    /// Make sure pages a file dirtied are resident. The file marks them dirty
    /// while it still holds the page lock.
    fn install_dirty(&self, pages: Vec<PageRef>) -> FileResult<Vec<PageId>> {
        let mut state = self.state.lock();
        let mut dirtied = Vec::with_capacity(pages.len());

        for page in pages {
            let pid = page.read().id();

            if state.get(&pid).is_none() {
                // Evicted between the file's fetch and now: re-admit it
                self.make_room(&mut state)?;
                state.put(pid, page);
            }
            dirtied.push(pid);
        }

        Ok(dirtied)
    }

    /// Write a resident page back to its file and mark it clean. Not resident
    /// is not an error.
    pub fn flush_page(&self, pid: PageId) -> FileResult<()> {
        let state = self.state.lock();
        match state.peek(&pid) {
            Some(page) => self.write_back(page),
            None => Ok(()),
        }
    }

    /// Write every resident page back to disk.
    ///
    /// Dangerous: this pushes uncommitted changes to disk and breaks any
    /// no-steal assumption a recovery layer might make. Intended for tests
    /// and orderly shutdown.
    pub fn flush_all_pages(&self) -> FileResult<()> {
        let state = self.state.lock();
        for (_, page) in state.iter() {
            self.write_back(page)?;
        }
        Ok(())
    }

    /// Write back every resident page last dirtied by `txn`
    pub fn flush_pages(&self, txn: TransactionId) -> FileResult<()> {
        let state = self.state.lock();
        for (_, page) in state.iter() {
            if page.read().dirtied_by() == Some(txn) {
                self.write_back(page)?;
            }
        }
        Ok(())
    }

    /// Drop a page from the cache without writing it back
    pub fn discard_page(&self, pid: PageId) {
        if self.state.lock().pop(&pid).is_some() {
            log::debug!("Discarded {}", pid);
        }
    }

    /// Give up a page lock before the transaction ends; no-op without a lock manager
    pub fn release_page(&self, _txn: TransactionId, _pid: PageId) {}

    /// Whether `txn` holds a lock on the page; always false without a lock manager
    pub fn holds_lock(&self, _txn: TransactionId, _pid: PageId) -> bool {
        false
    }

    /// Release everything `txn` holds; equivalent to committing it
    pub fn transaction_complete(&self, txn: TransactionId) {
        self.transaction_complete_with(txn, true);
    }

    /// Commit or abort `txn`. Nothing is undone on abort yet.
    pub fn transaction_complete_with(&self, txn: TransactionId, commit: bool) {
        log::trace!("{} complete (commit: {})", txn, commit);
    }

    /// Number of resident pages
    pub fn len(&self) -> usize {
        self.state.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_cached(&self, pid: PageId) -> bool {
        self.state.lock().contains(&pid)
    }

    /// Ids of resident dirty pages, sorted
    pub fn dirty_pages(&self) -> Vec<PageId> {
        let state = self.state.lock();
        let mut dirty: Vec<PageId> = state
            .iter()
            .filter(|(_, page)| page.read().is_dirty())
            .map(|(&pid, _)| pid)
            .collect();
        dirty.sort_unstable();
        dirty
    }

    fn write_back(&self, page: &PageRef) -> FileResult<()> {
        let mut guard = page.write();
        let pid = guard.id();
        let file = self.file(pid.table_id)?;
        file.write_page(&guard)?;
        guard.mark_dirty(None);
        log::debug!("Flushed {}", pid);
        Ok(())
    }

    /// Evict until there is room for one more page
    fn make_room(&self, state: &mut PageCache) -> FileResult<()> {
        while state.len() >= self.capacity {
            self.evict_page(state)?;
        }
        Ok(())
    }

    /// Evict the least recently used page, writing it back first if dirty.
    /// A failed write-back leaves the victim resident and dirty.
    fn evict_page(&self, state: &mut PageCache) -> FileResult<()> {
        let (pid, page) = match state.peek_lru() {
            Some((&pid, page)) => (pid, page.clone()),
            None => return Err(FileError::BufferPoolFull),
        };

        if page.read().is_dirty() {
            if let Err(e) = self.write_back(&page) {
                log::error!("Failed to write back {} on eviction: {}", pid, e);
                return Err(e);
            }
        }

        state.pop(&pid);
        log::debug!("Evicted {}", pid);
        Ok(())
    }
}
