use std::sync::Arc;

use super::error::{RecordError, RecordResult};
use super::record_id::{PageId, RecordId, SlotId};
use super::schema::Schema;
use super::tuple::Tuple;
use crate::transaction::TransactionId;

/// A heap page: `[occupancy bitmap][slot 0][slot 1]...` in exactly
/// `page_size` bytes.
///
/// Bit `i % 8` of bitmap byte `i / 8` is set iff slot `i` holds a tuple. The
/// raw buffer is kept as-is, so unoccupied slot bytes survive a round trip
/// untouched; occupied slots are also materialized as `Tuple`s on load.
#[derive(Debug, Clone)]
pub struct HeapPage {
    pid: PageId,
    schema: Arc<Schema>,
    data: Vec<u8>,
    slot_count: usize,
    tuples: Vec<Option<Tuple>>,
    dirtied_by: Option<TransactionId>,
}

impl HeapPage {
    /// Calculate maximum number of slots for a given page and tuple size
    pub fn calculate_slot_count(page_size: usize, tuple_size: usize) -> usize {
        if tuple_size == 0 {
            return 0;
        }

        // bitmap_size + slot_count * tuple_size <= page_size, with
        // bitmap_size = ⌈slot_count / 8⌉, i.e. each slot costs tuple_size * 8 + 1 bits
        (page_size * 8) / (tuple_size * 8 + 1)
    }

    /// Bitmap length in bytes for a slot count
    pub fn bitmap_size(slot_count: usize) -> usize {
        slot_count.div_ceil(8)
    }

    /// Raw bytes of a page with no occupied slots
    pub fn empty_page_data(page_size: usize) -> Vec<u8> {
        vec![0u8; page_size]
    }

    /// Reconstruct a page from its serialized bytes; `data.len()` is the page size
    pub fn from_bytes(pid: PageId, schema: Arc<Schema>, data: Vec<u8>) -> RecordResult<Self> {
        let slot_count = Self::calculate_slot_count(data.len(), schema.size());
        if slot_count == 0 {
            return Err(RecordError::Deserialization(format!(
                "Tuple size {} is too large for a {} byte page",
                schema.size(),
                data.len()
            )));
        }

        let mut page = Self {
            pid,
            schema,
            data,
            slot_count,
            tuples: Vec::with_capacity(slot_count),
            dirtied_by: None,
        };

        for slot_id in 0..slot_count {
            let tuple = if page.is_slot_used(slot_id) {
                let mut tuple = Tuple::from_bytes(page.schema.clone(), page.slot_bytes(slot_id))?;
                tuple.set_record_id(Some(RecordId::new(pid, slot_id)));
                Some(tuple)
            } else {
                None
            };
            page.tuples.push(tuple);
        }

        Ok(page)
    }

    /// Create a fresh page with every slot free
    pub fn empty(pid: PageId, schema: Arc<Schema>, page_size: usize) -> RecordResult<Self> {
        Self::from_bytes(pid, schema, Self::empty_page_data(page_size))
    }

    pub fn id(&self) -> PageId {
        self.pid
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Serialized page content (bitmap followed by slots, padded to page size)
    pub fn page_data(&self) -> &[u8] {
        &self.data
    }

    fn slot_range(&self, slot_id: SlotId) -> std::ops::Range<usize> {
        let tuple_size = self.schema.size();
        let start = Self::bitmap_size(self.slot_count) + slot_id * tuple_size;
        start..start + tuple_size
    }

    fn slot_bytes(&self, slot_id: SlotId) -> &[u8] {
        &self.data[self.slot_range(slot_id)]
    }

    /// Check if a slot is used
    pub fn is_slot_used(&self, slot_id: SlotId) -> bool {
        if slot_id >= self.slot_count {
            return false;
        }
        (self.data[slot_id / 8] & (1 << (slot_id % 8))) != 0
    }

    fn set_slot_used(&mut self, slot_id: SlotId, used: bool) {
        let mask = 1 << (slot_id % 8);
        if used {
            self.data[slot_id / 8] |= mask;
        } else {
            self.data[slot_id / 8] &= !mask;
        }
    }

    /// Get the number of slots in this page
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Get the number of free slots
    pub fn empty_slot_count(&self) -> usize {
        (0..self.slot_count)
            .filter(|&slot_id| !self.is_slot_used(slot_id))
            .count()
    }

    /// Find a free slot, returns None if page is full
    pub fn find_free_slot(&self) -> Option<SlotId> {
        (0..self.slot_count).find(|&slot_id| !self.is_slot_used(slot_id))
    }

    /// The tuple stored in a slot, if any
    pub fn tuple(&self, slot_id: SlotId) -> Option<&Tuple> {
        self.tuples.get(slot_id).and_then(Option::as_ref)
    }

    /// Store a tuple in the first free slot and stamp its record id
    pub fn insert_tuple(&mut self, tuple: &mut Tuple) -> RecordResult<SlotId> {
        if **tuple.schema() != *self.schema {
            return Err(RecordError::SchemaMismatch(format!(
                "Tuple schema ({}) does not match page schema ({})",
                tuple.schema(),
                self.schema
            )));
        }

        let slot_id = self.find_free_slot().ok_or(RecordError::PageFull(self.pid))?;
        let range = self.slot_range(slot_id);
        tuple.write_to(&mut self.data[range])?;
        self.set_slot_used(slot_id, true);

        let record_id = RecordId::new(self.pid, slot_id);
        tuple.set_record_id(Some(record_id));
        let mut stored = tuple.clone();
        stored.relabel(self.schema.clone());
        self.tuples[slot_id] = Some(stored);

        Ok(slot_id)
    }

    /// Free the slot a tuple occupies; the slot bytes stay until overwritten
    pub fn delete_tuple(&mut self, tuple: &Tuple) -> RecordResult<()> {
        let record_id = tuple.record_id().ok_or(RecordError::MissingRecordId)?;
        if record_id.page_id != self.pid {
            return Err(RecordError::WrongPage {
                expected: self.pid,
                actual: record_id.page_id,
            });
        }
        if !self.is_slot_used(record_id.slot_id) {
            return Err(RecordError::InvalidSlot(self.pid, record_id.slot_id));
        }

        self.set_slot_used(record_id.slot_id, false);
        self.tuples[record_id.slot_id] = None;
        Ok(())
    }

    /// Iterate over occupied slots in slot order
    pub fn iter(&self) -> HeapPageIter<'_> {
        HeapPageIter {
            tuples: self.tuples.iter(),
        }
    }

    /// Record the transaction that dirtied this page, or clear it with `None`
    pub fn mark_dirty(&mut self, txn: Option<TransactionId>) {
        self.dirtied_by = txn;
    }

    /// The transaction that last dirtied this page, if it is dirty
    pub fn dirtied_by(&self) -> Option<TransactionId> {
        self.dirtied_by
    }

    pub fn is_dirty(&self) -> bool {
        self.dirtied_by.is_some()
    }
}

/// Iterator over the live tuples of a page
pub struct HeapPageIter<'a> {
    tuples: std::slice::Iter<'a, Option<Tuple>>,
}

impl<'a> Iterator for HeapPageIter<'a> {
    type Item = &'a Tuple;

    fn next(&mut self) -> Option<Self::Item> {
        self.tuples.find_map(Option::as_ref)
    }
}

impl<'a> IntoIterator for &'a HeapPage {
    type Item = &'a Tuple;
    type IntoIter = HeapPageIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FieldDef, FieldType, Value};

    const SMALL_PAGE: usize = 32;

    fn two_int_schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            FieldDef::new("a", FieldType::Int),
            FieldDef::new("b", FieldType::Int),
        ]))
    }

    fn pair(schema: &Arc<Schema>, a: i32, b: i32) -> Tuple {
        Tuple::from_values(schema.clone(), vec![Value::Int(a), Value::Int(b)]).unwrap()
    }

    #[test]
    fn test_calculate_slot_count() {
        // 8-byte tuples on a 32-byte page: 1 bitmap byte + 3 slots
        assert_eq!(HeapPage::calculate_slot_count(SMALL_PAGE, 8), 3);
        assert_eq!(HeapPage::calculate_slot_count(4096, 8), 504);
        assert_eq!(HeapPage::calculate_slot_count(4096, 0), 0);
        assert_eq!(HeapPage::calculate_slot_count(16, 32), 0);

        for tuple_size in [1, 4, 8, 23, 132, 1000] {
            let slots = HeapPage::calculate_slot_count(4096, tuple_size);
            assert!(HeapPage::bitmap_size(slots) + slots * tuple_size <= 4096);
        }
    }

    #[test]
    fn test_empty_page() {
        let page = HeapPage::empty(PageId::new(1, 0), two_int_schema(), SMALL_PAGE).unwrap();
        assert_eq!(page.slot_count(), 3);
        assert_eq!(page.empty_slot_count(), 3);
        assert_eq!(page.iter().count(), 0);
        assert_eq!(page.page_data().len(), SMALL_PAGE);
        assert!(!page.is_dirty());
    }

    #[test]
    fn test_tuple_too_large() {
        let schema = Arc::new(Schema::from_types([FieldType::Char(64)]));
        assert!(HeapPage::empty(PageId::new(1, 0), schema, SMALL_PAGE).is_err());
    }

    #[test]
    fn test_insert_until_full() {
        let schema = two_int_schema();
        let pid = PageId::new(1, 4);
        let mut page = HeapPage::empty(pid, schema.clone(), SMALL_PAGE).unwrap();

        for i in 0..3 {
            let mut tuple = pair(&schema, i, i);
            let slot = page.insert_tuple(&mut tuple).unwrap();
            assert_eq!(slot, i as usize);
            assert_eq!(tuple.record_id(), Some(RecordId::new(pid, slot)));
        }

        assert_eq!(page.empty_slot_count(), 0);
        let mut extra = pair(&schema, 9, 9);
        assert!(matches!(
            page.insert_tuple(&mut extra),
            Err(RecordError::PageFull(_))
        ));
    }

    #[test]
    fn test_insert_schema_mismatch() {
        let mut page = HeapPage::empty(PageId::new(1, 0), two_int_schema(), SMALL_PAGE).unwrap();
        let other = Arc::new(Schema::from_types([FieldType::Int]));
        let mut tuple = Tuple::from_values(other, vec![Value::Int(1)]).unwrap();
        assert!(matches!(
            page.insert_tuple(&mut tuple),
            Err(RecordError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_delete_frees_slot_for_reuse() {
        let schema = two_int_schema();
        let mut page = HeapPage::empty(PageId::new(1, 0), schema.clone(), SMALL_PAGE).unwrap();
        let mut tuples: Vec<Tuple> = (1..=3).map(|i| pair(&schema, i, i)).collect();
        for tuple in tuples.iter_mut() {
            page.insert_tuple(tuple).unwrap();
        }

        page.delete_tuple(&tuples[1]).unwrap();
        assert!(!page.is_slot_used(1));
        assert!(page.is_slot_used(0) && page.is_slot_used(2));
        assert_eq!(page.tuple(2), Some(&tuples[2]));

        let mut replacement = pair(&schema, 8, 8);
        assert_eq!(page.insert_tuple(&mut replacement).unwrap(), 1);
    }

    #[test]
    fn test_delete_errors() {
        let schema = two_int_schema();
        let mut page = HeapPage::empty(PageId::new(1, 0), schema.clone(), SMALL_PAGE).unwrap();

        let unplaced = pair(&schema, 1, 1);
        assert!(matches!(
            page.delete_tuple(&unplaced),
            Err(RecordError::MissingRecordId)
        ));

        let mut elsewhere = pair(&schema, 1, 1);
        elsewhere.set_record_id(Some(RecordId::new(PageId::new(1, 1), 0)));
        assert!(matches!(
            page.delete_tuple(&elsewhere),
            Err(RecordError::WrongPage { .. })
        ));

        let mut empty_slot = pair(&schema, 1, 1);
        empty_slot.set_record_id(Some(RecordId::new(PageId::new(1, 0), 2)));
        assert!(matches!(
            page.delete_tuple(&empty_slot),
            Err(RecordError::InvalidSlot(_, 2))
        ));
    }

    #[test]
    fn test_serialization_round_trip() {
        let schema = Arc::new(Schema::new(vec![
            FieldDef::new("id", FieldType::Int),
            FieldDef::new("name", FieldType::Char(12)),
            FieldDef::new("score", FieldType::Float),
        ]));
        let pid = PageId::new(3, 2);
        let mut page = HeapPage::empty(pid, schema.clone(), 4096).unwrap();

        let mut inserted = Vec::new();
        for i in 0..20 {
            let mut tuple = Tuple::from_values(
                schema.clone(),
                vec![
                    Value::Int(i),
                    Value::String(format!("row{}", i)),
                    Value::Float(i as f64 / 2.0),
                ],
            )
            .unwrap();
            page.insert_tuple(&mut tuple).unwrap();
            inserted.push(tuple);
        }
        for tuple in inserted.iter().step_by(3) {
            page.delete_tuple(tuple).unwrap();
        }

        let bytes = page.page_data().to_vec();
        let restored = HeapPage::from_bytes(pid, schema, bytes.clone()).unwrap();

        assert_eq!(restored.page_data(), &bytes[..]);
        for slot_id in 0..page.slot_count() {
            assert_eq!(page.is_slot_used(slot_id), restored.is_slot_used(slot_id));
            assert_eq!(page.tuple(slot_id), restored.tuple(slot_id));
        }
        let live: Vec<&Tuple> = restored.iter().collect();
        assert_eq!(live.len(), 13);
        assert_eq!(live[0].record_id(), Some(RecordId::new(pid, 1)));
    }

    #[test]
    fn test_dirty_tracking() {
        let mut page = HeapPage::empty(PageId::new(1, 0), two_int_schema(), SMALL_PAGE).unwrap();
        let txn = TransactionId::new(7);
        page.mark_dirty(Some(txn));
        assert_eq!(page.dirtied_by(), Some(txn));
        page.mark_dirty(None);
        assert!(!page.is_dirty());
    }
}
