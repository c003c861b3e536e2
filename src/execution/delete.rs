use std::sync::Arc;

use super::{ExecError, ExecResult, ExecutionContext, OpIterator, count_schema, count_tuple};
use crate::record::{Schema, Tuple};
use crate::transaction::TransactionId;

/// Deletes every tuple its child yields, located by record id.
///
/// Same contract as `Insert`: the child is drained on `open`/`rewind` and a
/// single count tuple is produced.
pub struct Delete {
    ctx: ExecutionContext,
    txn: TransactionId,
    child: Box<dyn OpIterator>,
    schema: Arc<Schema>,
    result: Option<Tuple>,
}

impl Delete {
    pub fn new(ctx: ExecutionContext, txn: TransactionId, child: Box<dyn OpIterator>) -> Self {
        Self {
            ctx,
            txn,
            child,
            schema: count_schema(),
            result: None,
        }
    }

    fn delete_all(&mut self) -> ExecResult<Tuple> {
        let mut count = 0;
        while self.child.has_next()? {
            let tuple = self.child.next()?;
            self.ctx.buffer_pool.delete_tuple(self.txn, &tuple)?;
            count += 1;
        }
        log::debug!("{} deleted {} tuples", self.txn, count);
        count_tuple(&self.schema, count)
    }

    /// The pending count tuple, or `None` once it has been taken
    pub fn fetch_next(&mut self) -> ExecResult<Option<Tuple>> {
        Ok(self.result.take())
    }
}

impl OpIterator for Delete {
    fn open(&mut self) -> ExecResult<()> {
        self.child.open()?;
        self.result = Some(self.delete_all()?);
        Ok(())
    }

    fn has_next(&mut self) -> ExecResult<bool> {
        Ok(self.result.is_some())
    }

    fn next(&mut self) -> ExecResult<Tuple> {
        self.fetch_next()?
            .ok_or_else(|| ExecError::NoSuchElement("delete count already returned".to_string()))
    }

    fn rewind(&mut self) -> ExecResult<()> {
        self.child.rewind()?;
        self.result = Some(self.delete_all()?);
        Ok(())
    }

    fn close(&mut self) {
        self.child.close();
        self.result = None;
    }

    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::test_util::{drain, int_field, pairs, two_int_table};
    use crate::execution::{SeqScan, Values};
    use crate::file::FileError;
    use crate::record::RecordError;

    #[test]
    fn test_delete_everything_scanned() {
        let t = two_int_table(10);
        let txn = TransactionId::next();
        for mut tuple in pairs(&t.schema, (0..7).map(|i| (i, i))) {
            t.ctx.buffer_pool.insert_tuple(txn, t.table_id, &mut tuple).unwrap();
        }

        let scan = SeqScan::new(t.ctx.clone(), txn, t.table_id, "t").unwrap();
        let mut delete = Delete::new(t.ctx.clone(), txn, Box::new(scan));
        delete.open().unwrap();
        assert_eq!(int_field(&delete.next().unwrap(), 0), 7);
        assert!(!delete.has_next().unwrap());
        assert!(delete.fetch_next().unwrap().is_none());

        // A second drain finds nothing left
        delete.rewind().unwrap();
        assert_eq!(int_field(&delete.next().unwrap(), 0), 0);
        delete.close();

        let mut scan = SeqScan::new(t.ctx.clone(), txn, t.table_id, "t").unwrap();
        scan.open().unwrap();
        assert!(drain(&mut scan).is_empty());
    }

    #[test]
    fn test_delete_without_record_id_fails() {
        let t = two_int_table(10);
        let child = Values::new(t.schema.clone(), pairs(&t.schema, [(1, 1)])).unwrap();
        let mut delete = Delete::new(t.ctx.clone(), TransactionId::next(), Box::new(child));
        assert!(matches!(
            delete.open(),
            Err(ExecError::File(FileError::Record(RecordError::MissingRecordId)))
        ));
    }
}
