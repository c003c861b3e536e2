use std::fmt;
use std::sync::Arc;

use super::error::{RecordError, RecordResult};
use super::record_id::RecordId;
use super::schema::Schema;
use super::value::Value;

/// A single row: one (possibly unset) value per schema field, plus the
/// location it was read from or written to.
#[derive(Debug, Clone)]
pub struct Tuple {
    schema: Arc<Schema>,
    values: Vec<Option<Value>>,
    record_id: Option<RecordId>,
}

impl Tuple {
    /// Create a tuple with every field unset
    pub fn new(schema: Arc<Schema>) -> Self {
        let values = vec![None; schema.num_fields()];
        Self {
            schema,
            values,
            record_id: None,
        }
    }

    /// Create a tuple from a full set of values, checked against the schema
    pub fn from_values(schema: Arc<Schema>, values: Vec<Value>) -> RecordResult<Self> {
        if values.len() != schema.num_fields() {
            return Err(RecordError::SchemaMismatch(format!(
                "Expected {} values, got {}",
                schema.num_fields(),
                values.len()
            )));
        }

        let mut tuple = Tuple::new(schema);
        for (idx, value) in values.into_iter().enumerate() {
            tuple.set_field(idx, value)?;
        }
        Ok(tuple)
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn set_record_id(&mut self, record_id: Option<RecordId>) {
        self.record_id = record_id;
    }

    /// Set a field value; the index must be valid and the value must match the field type
    pub fn set_field(&mut self, idx: usize, value: Value) -> RecordResult<()> {
        let field_type = self.schema.field_type(idx)?;
        if !value.matches(field_type) {
            return Err(RecordError::TypeMismatch {
                expected: field_type.to_string(),
                actual: format!("{:?}", value),
            });
        }
        self.values[idx] = Some(value);
        Ok(())
    }

    /// Get a field value, `None` if it has not been set
    pub fn field(&self, idx: usize) -> RecordResult<Option<&Value>> {
        self.values
            .get(idx)
            .map(Option::as_ref)
            .ok_or(RecordError::FieldIndexOutOfRange {
                index: idx,
                len: self.values.len(),
            })
    }

    /// Iterate over all field values in schema order
    pub fn fields(&self) -> impl Iterator<Item = Option<&Value>> {
        self.values.iter().map(Option::as_ref)
    }

    /// Replace the schema and discard all field values
    pub fn reset_schema(&mut self, schema: Arc<Schema>) {
        self.values = vec![None; schema.num_fields()];
        self.schema = schema;
    }

    /// Swap in a structurally equal schema (e.g. with aliased names), keeping values
    pub(crate) fn relabel(&mut self, schema: Arc<Schema>) {
        debug_assert_eq!(*self.schema, *schema);
        self.schema = schema;
    }

    /// Serialize the tuple into `out`, which must be exactly `schema.size()` bytes
    pub fn write_to(&self, out: &mut [u8]) -> RecordResult<()> {
        if out.len() != self.schema.size() {
            return Err(RecordError::Serialization(format!(
                "Expected {} bytes, got {}",
                self.schema.size(),
                out.len()
            )));
        }

        let mut offset = 0;
        for (idx, (value, field)) in self.values.iter().zip(self.schema.iter()).enumerate() {
            let value = value.as_ref().ok_or(RecordError::UnsetField(idx))?;
            let size = field.size();
            value.write_to(&field.field_type, &mut out[offset..offset + size])?;
            offset += size;
        }
        Ok(())
    }

    /// Serialize the tuple to a new buffer
    pub fn to_bytes(&self) -> RecordResult<Vec<u8>> {
        let mut bytes = vec![0u8; self.schema.size()];
        self.write_to(&mut bytes)?;
        Ok(bytes)
    }

    /// Deserialize tuple from bytes according to schema
    pub fn from_bytes(schema: Arc<Schema>, data: &[u8]) -> RecordResult<Self> {
        if data.len() != schema.size() {
            return Err(RecordError::Deserialization(format!(
                "Expected {} bytes, got {}",
                schema.size(),
                data.len()
            )));
        }

        let mut values = Vec::with_capacity(schema.num_fields());
        let mut offset = 0;
        for field in schema.iter() {
            let size = field.size();
            values.push(Some(Value::read_from(
                &data[offset..offset + size],
                &field.field_type,
            )?));
            offset += size;
        }

        Ok(Self {
            schema,
            values,
            record_id: None,
        })
    }
}

/// Tuples compare by schema and values; the record id is location metadata.
impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema && self.values == other.values
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, "\t")?;
            }
            match value {
                Some(v) => write!(f, "{}", v)?,
                None => write!(f, "null")?,
            }
        }
        Ok(())
    }
}
