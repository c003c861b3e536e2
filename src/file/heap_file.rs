use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use super::buffer_pool::{BufferPool, PageRef};
use super::error::{FileError, FileResult};
use super::{DbFile, DbFileIterator};
use crate::config::StorageConfig;
use crate::record::{HeapPage, PageId, PageNo, RecordError, Schema, TableId, Tuple};
use crate::transaction::{Permissions, TransactionId};

/// Fixed seeds so a path always hashes to the same table id
const TABLE_ID_SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

/// A table stored as a flat sequence of fixed-size heap pages; page `n`
/// occupies bytes `[n * page_size, (n + 1) * page_size)`.
pub struct HeapFile {
    id: TableId,
    path: PathBuf,
    schema: Arc<Schema>,
    page_size: usize,
    file: Mutex<File>,
}

impl HeapFile {
    /// Create a new, empty heap file
    pub fn create<P: AsRef<Path>>(
        path: P,
        schema: Schema,
        config: &StorageConfig,
    ) -> FileResult<Self> {
        let path = path.as_ref();

        if path.exists() {
            return Err(FileError::FileAlreadyExists(path.display().to_string()));
        }

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        File::create(path)?;
        Self::open(path, schema, config)
    }

    /// Open an existing heap file
    pub fn open<P: AsRef<Path>>(
        path: P,
        schema: Schema,
        config: &StorageConfig,
    ) -> FileResult<Self> {
        let path = path.as_ref().canonicalize()?;
        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        if HeapPage::calculate_slot_count(config.page_size, schema.size()) == 0 {
            return Err(RecordError::SchemaMismatch(format!(
                "Tuple size {} does not fit in a {} byte page",
                schema.size(),
                config.page_size
            ))
            .into());
        }

        let id = Self::table_id_for(&path);
        log::debug!("Opened heap file {} as table {}", path.display(), id);

        Ok(Self {
            id,
            path,
            schema: Arc::new(schema),
            page_size: config.page_size,
            file: Mutex::new(file),
        })
    }

    /// Table id derived from the absolute path of the backing file
    fn table_id_for(path: &Path) -> TableId {
        let [k0, k1, k2, k3] = TABLE_ID_SEEDS;
        let hash = ahash::RandomState::with_seeds(k0, k1, k2, k3).hash_one(path);
        hash as TableId
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    fn page_id(&self, page_no: PageNo) -> PageId {
        PageId::new(self.id, page_no)
    }

    fn write_bytes(&self, page_no: PageNo, data: &[u8]) -> FileResult<()> {
        if data.len() != self.page_size {
            return Err(FileError::InvalidPageSize {
                expected: self.page_size,
                actual: data.len(),
            });
        }

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start((page_no * self.page_size) as u64))?;
        file.write_all(data)?;
        Ok(())
    }
}

impl DbFile for HeapFile {
    fn id(&self) -> TableId {
        self.id
    }

    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn read_page(&self, pid: PageId) -> FileResult<HeapPage> {
        if pid.table_id != self.id || pid.page_no >= self.page_count()? {
            return Err(FileError::PageNotFound(pid));
        }

        let mut buffer = vec![0u8; self.page_size];
        {
            let mut file = self.file.lock();
            file.seek(SeekFrom::Start((pid.page_no * self.page_size) as u64))?;
            file.read_exact(&mut buffer)?;
        }

        Ok(HeapPage::from_bytes(pid, self.schema.clone(), buffer)?)
    }

    fn write_page(&self, page: &HeapPage) -> FileResult<()> {
        self.write_bytes(page.id().page_no, page.page_data())
    }

    fn page_count(&self) -> FileResult<usize> {
        let file_size = self.file.lock().metadata()?.len();
        Ok(file_size.div_ceil(self.page_size as u64) as usize)
    }

    fn insert_tuple(
        &self,
        pool: &BufferPool,
        txn: TransactionId,
        tuple: &mut Tuple,
    ) -> FileResult<Vec<PageRef>> {
        if **tuple.schema() != *self.schema {
            return Err(RecordError::SchemaMismatch(format!(
                "Tuple schema ({}) does not match table schema ({})",
                tuple.schema(),
                self.schema
            ))
            .into());
        }

        let page_count = self.page_count()?;
        let mut target = None;
        for page_no in 0..page_count {
            let pid = self.page_id(page_no);
            let page = pool.get_page(txn, pid, Permissions::ReadWrite)?;
            if page.read().empty_slot_count() > 0 {
                target = Some(page);
                break;
            }
            // Scanning for space mutates nothing, so the page can be let go early
            pool.release_page(txn, pid);
        }

        let page = match target {
            Some(page) => page,
            None => {
                // Every page is full: append an empty one, then read it back
                // through the pool so the cache stays the single source of truth
                self.write_bytes(page_count, &HeapPage::empty_page_data(self.page_size))?;
                log::debug!("Allocated page {} for table {}", page_count, self.id);
                pool.get_page(txn, self.page_id(page_count), Permissions::ReadWrite)?
            }
        };

        {
            // Dirty before the guard drops so an eviction in between writes it back
            let mut guard = page.write();
            guard.insert_tuple(tuple)?;
            guard.mark_dirty(Some(txn));
        }
        Ok(vec![page])
    }

    fn delete_tuple(
        &self,
        pool: &BufferPool,
        txn: TransactionId,
        tuple: &Tuple,
    ) -> FileResult<Vec<PageRef>> {
        let record_id = tuple.record_id().ok_or(RecordError::MissingRecordId)?;
        if record_id.page_id.table_id != self.id {
            return Err(FileError::PageNotFound(record_id.page_id));
        }

        let page = pool.get_page(txn, record_id.page_id, Permissions::ReadWrite)?;
        // Only the in-memory slot is freed; the pool writes the page back later
        {
            let mut guard = page.write();
            guard.delete_tuple(tuple)?;
            guard.mark_dirty(Some(txn));
        }
        Ok(vec![page])
    }

    fn iterator(
        self: Arc<Self>,
        pool: Arc<BufferPool>,
        txn: TransactionId,
    ) -> Box<dyn DbFileIterator> {
        Box::new(HeapFileIterator::new(self, pool, txn))
    }
}

/// Cursor over every live tuple of a heap file, in page then slot order.
///
/// Pages are fetched through the buffer pool one at a time, only once the
/// previous page's tuples are exhausted.
pub struct HeapFileIterator {
    file: Arc<HeapFile>,
    pool: Arc<BufferPool>,
    txn: TransactionId,
    next_page_no: PageNo,
    current: std::vec::IntoIter<Tuple>,
    open: bool,
}

impl HeapFileIterator {
    pub fn new(file: Arc<HeapFile>, pool: Arc<BufferPool>, txn: TransactionId) -> Self {
        Self {
            file,
            pool,
            txn,
            next_page_no: 0,
            current: Vec::new().into_iter(),
            open: false,
        }
    }

    fn load_page(&mut self, page_no: PageNo) -> FileResult<()> {
        let pid = self.file.page_id(page_no);
        let page = self.pool.get_page(self.txn, pid, Permissions::ReadOnly)?;
        let tuples: Vec<Tuple> = page.read().iter().cloned().collect();
        self.next_page_no = page_no + 1;
        self.current = tuples.into_iter();
        Ok(())
    }
}

impl DbFileIterator for HeapFileIterator {
    fn open(&mut self) -> FileResult<()> {
        self.next_page_no = 0;
        self.current = Vec::new().into_iter();
        self.open = true;
        Ok(())
    }

    fn has_next(&mut self) -> FileResult<bool> {
        if !self.open {
            return Ok(false);
        }

        while self.current.as_slice().is_empty() {
            if self.next_page_no >= self.file.page_count()? {
                return Ok(false);
            }
            self.load_page(self.next_page_no)?;
        }
        Ok(true)
    }

    fn next(&mut self) -> FileResult<Tuple> {
        if !self.open {
            return Err(FileError::NoSuchElement("iterator not opened".to_string()));
        }

        if self.has_next()? {
            if let Some(tuple) = self.current.next() {
                return Ok(tuple);
            }
        }
        Err(FileError::NoSuchElement("no more tuples".to_string()))
    }

    fn rewind(&mut self) -> FileResult<()> {
        if !self.open {
            return Err(FileError::NoSuchElement("iterator not opened".to_string()));
        }
        self.open()
    }

    fn close(&mut self) {
        self.open = false;
        self.current = Vec::new().into_iter();
    }
}
