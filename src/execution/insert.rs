use std::sync::Arc;

use super::{ExecError, ExecResult, ExecutionContext, OpIterator, count_schema, count_tuple};
use crate::record::{Schema, TableId, Tuple};
use crate::transaction::TransactionId;

/// Inserts every tuple of its child into a table.
///
/// The child is drained on `open` (and again on `rewind`); the operator then
/// yields a single one-field tuple holding the number of rows inserted.
pub struct Insert {
    ctx: ExecutionContext,
    txn: TransactionId,
    table_id: TableId,
    child: Box<dyn OpIterator>,
    schema: Arc<Schema>,
    result: Option<Tuple>,
}

impl Insert {
    pub fn new(
        ctx: ExecutionContext,
        txn: TransactionId,
        child: Box<dyn OpIterator>,
        table_id: TableId,
    ) -> ExecResult<Self> {
        let table_schema = ctx
            .catalog
            .schema(table_id)
            .ok_or(ExecError::UnknownTable(table_id))?;

        if **child.schema() != *table_schema {
            return Err(ExecError::SchemaMismatch(format!(
                "Child schema ({}) does not match table schema ({})",
                child.schema(),
                table_schema
            )));
        }

        Ok(Self {
            ctx,
            txn,
            table_id,
            child,
            schema: count_schema(),
            result: None,
        })
    }

    fn insert_all(&mut self) -> ExecResult<Tuple> {
        let mut count = 0;
        while self.child.has_next()? {
            let mut tuple = self.child.next()?;
            self.ctx
                .buffer_pool
                .insert_tuple(self.txn, self.table_id, &mut tuple)?;
            count += 1;
        }
        log::debug!("{} inserted {} tuples into {}", self.txn, count, self.table_id);
        count_tuple(&self.schema, count)
    }

    /// The pending count tuple, or `None` once it has been taken
    pub fn fetch_next(&mut self) -> ExecResult<Option<Tuple>> {
        Ok(self.result.take())
    }
}

impl OpIterator for Insert {
    fn open(&mut self) -> ExecResult<()> {
        self.child.open()?;
        self.result = Some(self.insert_all()?);
        Ok(())
    }

    fn has_next(&mut self) -> ExecResult<bool> {
        Ok(self.result.is_some())
    }

    fn next(&mut self) -> ExecResult<Tuple> {
        self.fetch_next()?
            .ok_or_else(|| ExecError::NoSuchElement("insert count already returned".to_string()))
    }

    fn rewind(&mut self) -> ExecResult<()> {
        self.child.rewind()?;
        self.result = Some(self.insert_all()?);
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
