use std::sync::Arc;

use super::{ExecError, ExecResult, ExecutionContext, OpIterator};
use crate::file::DbFileIterator;
use crate::record::{Schema, TableId, Tuple};
use crate::transaction::TransactionId;

/// Sequential scan over every tuple of one table.
///
/// Output fields are renamed `alias.field` so that two scans over the same
/// table can be told apart once their rows are combined.
pub struct SeqScan {
    ctx: ExecutionContext,
    txn: TransactionId,
    table_id: TableId,
    table_name: String,
    alias: String,
    schema: Arc<Schema>,
    iter: Box<dyn DbFileIterator>,
}

impl SeqScan {
    pub fn new(
        ctx: ExecutionContext,
        txn: TransactionId,
        table_id: TableId,
        alias: &str,
    ) -> ExecResult<Self> {
        let (table_name, schema, iter) = Self::bind(&ctx, txn, table_id, alias)?;
        Ok(Self {
            ctx,
            txn,
            table_id,
            table_name,
            alias: alias.to_string(),
            schema,
            iter,
        })
    }

    /// Scan a table under its own name
    pub fn with_table_name(
        ctx: ExecutionContext,
        txn: TransactionId,
        table_id: TableId,
    ) -> ExecResult<Self> {
        let name = ctx
            .catalog
            .table_name(table_id)
            .ok_or(ExecError::UnknownTable(table_id))?;
        Self::new(ctx, txn, table_id, &name)
    }

    fn bind(
        ctx: &ExecutionContext,
        txn: TransactionId,
        table_id: TableId,
        alias: &str,
    ) -> ExecResult<(String, Arc<Schema>, Box<dyn DbFileIterator>)> {
        let file = ctx
            .catalog
            .file(table_id)
            .ok_or(ExecError::UnknownTable(table_id))?;
        let table_name = ctx
            .catalog
            .table_name(table_id)
            .ok_or(ExecError::UnknownTable(table_id))?;
        let schema = Arc::new(file.schema().with_prefix(alias));
        let iter = file.iterator(ctx.buffer_pool.clone(), txn);
        Ok((table_name, schema, iter))
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Point the scan at another table and alias. The scan must be opened again.
    pub fn reset(&mut self, table_id: TableId, alias: &str) -> ExecResult<()> {
        let (table_name, schema, iter) = Self::bind(&self.ctx, self.txn, table_id, alias)?;
        self.iter.close();
        self.table_id = table_id;
        self.table_name = table_name;
        self.alias = alias.to_string();
        self.schema = schema;
        self.iter = iter;
        Ok(())
    }
}

impl OpIterator for SeqScan {
    fn open(&mut self) -> ExecResult<()> {
        Ok(self.iter.open()?)
    }

    fn has_next(&mut self) -> ExecResult<bool> {
        Ok(self.iter.has_next()?)
    }

    fn next(&mut self) -> ExecResult<Tuple> {
        let mut tuple = self.iter.next()?;
        tuple.relabel(self.schema.clone());
        Ok(tuple)
    }

    fn rewind(&mut self) -> ExecResult<()> {
        Ok(self.iter.rewind()?)
    }

    fn close(&mut self) {
        self.iter.close();
    }

    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }
}
