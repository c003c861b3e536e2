use std::sync::Arc;

use super::{ExecError, ExecResult, OpIterator};
use crate::record::{Schema, Tuple};

/// Operator over a fixed list of in-memory tuples
pub struct Values {
    schema: Arc<Schema>,
    tuples: Vec<Tuple>,
    position: usize,
    open: bool,
}

impl Values {
    pub fn new(schema: Arc<Schema>, tuples: Vec<Tuple>) -> ExecResult<Self> {
        if let Some(bad) = tuples.iter().find(|t| **t.schema() != *schema) {
            return Err(ExecError::SchemaMismatch(format!(
                "Tuple schema ({}) does not match ({})",
                bad.schema(),
                schema
            )));
        }

        Ok(Self {
            schema,
            tuples,
            position: 0,
            open: false,
        })
    }
}

impl OpIterator for Values {
    fn open(&mut self) -> ExecResult<()> {
        self.position = 0;
        self.open = true;
        Ok(())
    }

    fn has_next(&mut self) -> ExecResult<bool> {
        Ok(self.open && self.position < self.tuples.len())
    }

    fn next(&mut self) -> ExecResult<Tuple> {
        if !self.has_next()? {
            return Err(ExecError::NoSuchElement("no more tuples".to_string()));
        }
        let tuple = self.tuples[self.position].clone();
        self.position += 1;
        Ok(tuple)
    }

    fn rewind(&mut self) -> ExecResult<()> {
        self.position = 0;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::test_util::{drain, pairs};
    use crate::record::{FieldType, Value};

    #[test]
    fn test_yields_in_order_and_rewinds() {
        let schema = Arc::new(Schema::from_types([FieldType::Int, FieldType::Int]));
        let tuples = pairs(&schema, [(1, 2), (3, 4)]);
        let mut values = Values::new(schema, tuples.clone()).unwrap();

        assert!(!values.has_next().unwrap());
        values.open().unwrap();
        assert_eq!(drain(&mut values), tuples);
        assert!(matches!(values.next(), Err(ExecError::NoSuchElement(_))));

        values.rewind().unwrap();
        assert_eq!(values.next().unwrap(), tuples[0]);
        values.close();
        assert!(!values.has_next().unwrap());
    }

    #[test]
    fn test_rejects_foreign_schema() {
        let schema = Arc::new(Schema::from_types([FieldType::Int, FieldType::Int]));
        let other = Arc::new(Schema::from_types([FieldType::Int]));
        let tuple = Tuple::from_values(other, vec![Value::Int(1)]).unwrap();
        assert!(matches!(
            Values::new(schema, vec![tuple]),
            Err(ExecError::SchemaMismatch(_))
        ));
    }
}
