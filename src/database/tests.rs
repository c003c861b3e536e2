use super::*;
use crate::execution::{Delete, Insert, OpIterator, SeqScan, Values};
use crate::file::DbFile;
use crate::record::{FieldDef, FieldType, PageId, RecordId, Tuple, Value};
use crate::transaction::{Permissions, TransactionId};
use tempfile::TempDir;

// 3 two-int tuples per page
const SMALL_PAGE: usize = 32;

fn setup_test_db(pool_pages: usize) -> (TempDir, Database) {
    let _ = env_logger::builder().is_test(true).try_init();

    let temp_dir = TempDir::new().unwrap();
    let config = StorageConfig::default()
        .with_page_size(SMALL_PAGE)
        .with_buffer_pool_pages(pool_pages);
    let db = Database::new(temp_dir.path(), config).unwrap();
    (temp_dir, db)
}

fn pair_schema() -> Schema {
    Schema::new(vec![
        FieldDef::new("x", FieldType::Int),
        FieldDef::new("y", FieldType::Int),
    ])
}

fn pair(schema: &Arc<Schema>, x: i32, y: i32) -> Tuple {
    Tuple::from_values(schema.clone(), vec![Value::Int(x), Value::Int(y)]).unwrap()
}

fn ints(tuple: &Tuple) -> Vec<i32> {
    tuple
        .fields()
        .map(|v| match v {
            Some(Value::Int(i)) => *i,
            other => panic!("expected int, got {:?}", other),
        })
        .collect()
}

fn scan_all(db: &Database, txn: TransactionId, table_id: TableId) -> Vec<Tuple> {
    let mut scan = SeqScan::new(db.context(), txn, table_id, "t").unwrap();
    scan.open().unwrap();
    let mut rows = Vec::new();
    while scan.has_next().unwrap() {
        rows.push(scan.next().unwrap());
    }
    scan.close();
    rows
}

fn insert_rows(
    db: &Database,
    txn: TransactionId,
    table_id: TableId,
    rows: impl IntoIterator<Item = (i32, i32)>,
) -> Vec<Tuple> {
    let schema = db.catalog().schema(table_id).unwrap();
    rows.into_iter()
        .map(|(x, y)| {
            let mut tuple = pair(&schema, x, y);
            db.buffer_pool()
                .insert_tuple(txn, table_id, &mut tuple)
                .unwrap();
            tuple
        })
        .collect()
}

fn page_count(db: &Database, table_id: TableId) -> usize {
    db.catalog().file(table_id).unwrap().page_count().unwrap()
}

#[test]
fn test_create_and_open_table() {
    let (_temp, db) = setup_test_db(10);
    let table_id = db.create_table("pairs", pair_schema()).unwrap();

    assert!(matches!(
        db.create_table("pairs", pair_schema()),
        Err(DatabaseError::TableExists(_))
    ));
    assert_eq!(db.open_table("pairs").unwrap(), table_id);
    assert!(matches!(
        db.open_table("missing"),
        Err(DatabaseError::TableNotFound(_))
    ));
}

#[test]
fn test_three_tuples_per_page_scenario() {
    let (_temp, db) = setup_test_db(10);
    let table_id = db.create_table("t", pair_schema()).unwrap();
    let txn = TransactionId::next();

    let inserted = insert_rows(&db, txn, table_id, (1..=7).map(|i| (i, i)));
    assert_eq!(page_count(&db, table_id), 3);

    // 3 + 3 + 1
    for (i, tuple) in inserted.iter().enumerate() {
        let rid = tuple.record_id().unwrap();
        assert_eq!(rid.page_id.page_no, i / 3);
        assert_eq!(rid.slot_id, i % 3);
    }

    // Delete (4,4), the first tuple on the second page
    let four = &inserted[3];
    assert_eq!(ints(four), vec![4, 4]);
    db.buffer_pool().delete_tuple(txn, four).unwrap();

    let eight = insert_rows(&db, txn, table_id, [(8, 8)]).remove(0);
    assert_eq!(page_count(&db, table_id), 3);
    assert_eq!(
        eight.record_id(),
        Some(RecordId::new(PageId::new(table_id, 1), 0))
    );

    let rows: Vec<Vec<i32>> = scan_all(&db, txn, table_id).iter().map(ints).collect();
    let expected: Vec<Vec<i32>> = [1, 2, 3, 8, 5, 6, 7].iter().map(|&i| vec![i, i]).collect();
    assert_eq!(rows, expected);
}

#[test]
fn test_delete_retains_slots() {
    let (_temp, db) = setup_test_db(10);
    let table_id = db.create_table("t", pair_schema()).unwrap();
    let txn = TransactionId::next();

    let inserted = insert_rows(&db, txn, table_id, (0..6).map(|i| (i, i)));
    db.buffer_pool().delete_tuple(txn, &inserted[1]).unwrap();

    assert_eq!(page_count(&db, table_id), 2);
    let remaining = scan_all(&db, txn, table_id);
    assert_eq!(remaining.len(), 5);
    for row in &remaining {
        let original = inserted.iter().find(|t| *t == row).unwrap();
        assert_eq!(row.record_id(), original.record_id());
    }
}

#[test]
fn test_insert_placement_appends_one_page() {
    let (_temp, db) = setup_test_db(10);
    let table_id = db.create_table("t", pair_schema()).unwrap();
    let txn = TransactionId::next();

    for pages_before in 0..4 {
        assert_eq!(page_count(&db, table_id), pages_before);
        let first = insert_rows(&db, txn, table_id, [(pages_before as i32, 0)]).remove(0);
        assert_eq!(page_count(&db, table_id), pages_before + 1);
        assert_eq!(first.record_id().unwrap().page_id.page_no, pages_before);
        insert_rows(&db, txn, table_id, [(0, 1), (0, 2)]);
    }
}

#[test]
fn test_scan_completeness_with_small_pool() {
    let (_temp, db) = setup_test_db(2);
    let table_id = db.create_table("t", pair_schema()).unwrap();
    let txn = TransactionId::next();

    let k = 40;
    insert_rows(&db, txn, table_id, (0..k).map(|i| (i, i * i)));
    assert!(db.buffer_pool().len() <= 2);

    let mut rows: Vec<Vec<i32>> = scan_all(&db, txn, table_id).iter().map(ints).collect();
    rows.sort();
    let expected: Vec<Vec<i32>> = (0..k).map(|i| vec![i, i * i]).collect();
    assert_eq!(rows, expected);
}

#[test]
fn test_eviction_persists_latest_mutation() {
    let (_temp, db) = setup_test_db(1);
    let table_id = db.create_table("t", pair_schema()).unwrap();
    let txn = TransactionId::next();

    // Fill page 0, then a tuple on page 1 forces page 0 out
    let inserted = insert_rows(&db, txn, table_id, (0..4).map(|i| (i, i)));
    let page0 = PageId::new(table_id, 0);
    assert!(!db.buffer_pool().is_cached(page0));

    let file = db.catalog().file(table_id).unwrap();
    let on_disk = file.read_page(page0).unwrap();
    assert_eq!(on_disk.iter().cloned().collect::<Vec<_>>(), inserted[..3]);

    // Delete from page 0 (evicting page 1), then evict page 0 again
    db.buffer_pool().delete_tuple(txn, &inserted[0]).unwrap();
    db.buffer_pool()
        .get_page(txn, PageId::new(table_id, 1), Permissions::ReadOnly)
        .unwrap();
    let on_disk = file.read_page(page0).unwrap();
    assert!(!on_disk.is_slot_used(0));
    assert_eq!(on_disk.iter().count(), 2);
}

#[test]
fn test_persistence_across_reopen() {
    let (temp, db) = setup_test_db(10);
    let table_id = db.create_table("t", pair_schema()).unwrap();
    let txn = TransactionId::next();
    insert_rows(&db, txn, table_id, (0..5).map(|i| (i, -i)));
    db.flush().unwrap();
    db.buffer_pool().transaction_complete(txn);
    let config = *db.config();
    drop(db);

    let reopened = Database::new(temp.path(), config).unwrap();
    let table_id = reopened.open_table("t").unwrap();
    let rows: Vec<Vec<i32>> = scan_all(&reopened, TransactionId::next(), table_id)
        .iter()
        .map(ints)
        .collect();
    let expected: Vec<Vec<i32>> = (0..5).map(|i| vec![i, -i]).collect();
    assert_eq!(rows, expected);
}

#[test]
fn test_insert_operator_copies_table() {
    let (_temp, db) = setup_test_db(10);
    let src = db.create_table("src", pair_schema()).unwrap();
    let dst = db.create_table("dst", pair_schema()).unwrap();
    let txn = TransactionId::next();
    insert_rows(&db, txn, src, (0..7).map(|i| (i, i + 100)));

    let scan = SeqScan::new(db.context(), txn, src, "s").unwrap();
    let mut insert = Insert::new(db.context(), txn, Box::new(scan), dst).unwrap();
    insert.open().unwrap();
    assert_eq!(ints(&insert.next().unwrap()), vec![7]);
    assert!(!insert.has_next().unwrap());
    insert.close();

    assert_eq!(scan_all(&db, txn, dst).len(), 7);
    assert_eq!(page_count(&db, dst), 3);
}

#[test]
fn test_insert_rejects_mismatched_table() {
    let (_temp, db) = setup_test_db(10);
    let wide = db
        .create_table(
            "wide",
            Schema::new(vec![
                FieldDef::new("x", FieldType::Int),
                FieldDef::new("name", FieldType::Char(4)),
            ]),
        )
        .unwrap();
    let schema = Arc::new(pair_schema());
    let child = Values::new(schema.clone(), vec![pair(&schema, 1, 1)]).unwrap();

    let result = Insert::new(db.context(), TransactionId::next(), Box::new(child), wide);
    assert!(matches!(result, Err(ExecError::SchemaMismatch(_))));
}

#[test]
fn test_delete_operator_then_reinsert() {
    let (_temp, db) = setup_test_db(10);
    let table_id = db.create_table("t", pair_schema()).unwrap();
    let txn = TransactionId::next();
    insert_rows(&db, txn, table_id, (0..7).map(|i| (i, i)));

    let scan = SeqScan::new(db.context(), txn, table_id, "t").unwrap();
    let mut delete = Delete::new(db.context(), txn, Box::new(scan));
    delete.open().unwrap();
    assert_eq!(ints(&delete.next().unwrap()), vec![7]);
    delete.close();
    assert!(scan_all(&db, txn, table_id).is_empty());

    // Freed slots are reused before any new page is allocated
    insert_rows(&db, txn, table_id, (0..9).map(|i| (i, i)));
    assert_eq!(page_count(&db, table_id), 3);
    assert_eq!(db.buffer_pool().dirty_pages().len(), 3);
}
