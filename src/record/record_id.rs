use std::fmt;

/// Table identifier, supplied by the catalog
pub type TableId = u32;

/// Page number within a table's file
pub type PageNo = usize;

/// Slot identifier within a page
pub type SlotId = usize;

/// Identifies one page of one table.
///
/// `Hash` is derived over both fields, so `(1, 23)` and `(12, 3)` never share
/// a key in the page table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId {
    pub table_id: TableId,
    pub page_no: PageNo,
}

impl PageId {
    pub fn new(table_id: TableId, page_no: PageNo) -> Self {
        Self { table_id, page_no }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page {}:{}", self.table_id, self.page_no)
    }
}

/// Physical location of a tuple (page + slot)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot_id: SlotId,
}

impl RecordId {
    pub fn new(page_id: PageId, slot_id: SlotId) -> Self {
        Self { page_id, slot_id }
    }
}
