use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{RecordError, RecordResult};
use super::value::FieldType;

/// Field definition: a fixed-width type and an optional name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub field_type: FieldType,
    pub name: Option<String>,
}

impl FieldDef {
    /// Create a named field
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            field_type,
            name: Some(name.into()),
        }
    }

    /// Create an anonymous field
    pub fn unnamed(field_type: FieldType) -> Self {
        Self {
            field_type,
            name: None,
        }
    }

    /// Get the size of this field in bytes
    pub fn size(&self) -> usize {
        self.field_type.size()
    }
}

/// Ordered sequence of fixed-width fields describing a tuple.
///
/// Equality compares field types only; names are aliases and do not take part.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<FieldDef>,
    size: usize,
}

impl Schema {
    /// Create a new schema
    pub fn new(fields: Vec<FieldDef>) -> Self {
        let size = fields.iter().map(|f| f.size()).sum();
        Self { fields, size }
    }

    /// Create a schema of anonymous fields
    pub fn from_types(types: impl IntoIterator<Item = FieldType>) -> Self {
        Self::new(types.into_iter().map(FieldDef::unnamed).collect())
    }

    /// Get all fields
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldDef> {
        self.fields.iter()
    }

    /// Get field count
    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    fn field(&self, idx: usize) -> RecordResult<&FieldDef> {
        self.fields.get(idx).ok_or(RecordError::FieldIndexOutOfRange {
            index: idx,
            len: self.fields.len(),
        })
    }

    /// Get the type of a field
    pub fn field_type(&self, idx: usize) -> RecordResult<&FieldType> {
        Ok(&self.field(idx)?.field_type)
    }

    /// Get the (possibly absent) name of a field
    pub fn field_name(&self, idx: usize) -> RecordResult<Option<&str>> {
        Ok(self.field(idx)?.name.as_deref())
    }

    /// Find the index of the first field with the given name
    pub fn field_name_to_index(&self, name: &str) -> RecordResult<usize> {
        let mut any_named = false;
        for (idx, field) in self.fields.iter().enumerate() {
            if let Some(field_name) = &field.name {
                any_named = true;
                if field_name == name {
                    return Ok(idx);
                }
            }
        }

        if any_named {
            Err(RecordError::FieldNotFound(name.to_string()))
        } else {
            Err(RecordError::NoNamedFields)
        }
    }

    /// Get total tuple size in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    /// Byte offset of a field within a serialized tuple
    pub fn field_offset(&self, idx: usize) -> RecordResult<usize> {
        self.field(idx)?;
        Ok(self.fields[..idx].iter().map(|f| f.size()).sum())
    }

    /// Concatenate the fields of `a` followed by the fields of `b`
    pub fn merge(a: &Schema, b: &Schema) -> Schema {
        let fields = a.fields.iter().chain(b.fields.iter()).cloned().collect();
        Schema::new(fields)
    }

    /// Copy of this schema with every field renamed to `prefix.name`
    pub fn with_prefix(&self, prefix: &str) -> Schema {
        let fields = self
            .fields
            .iter()
            .map(|f| FieldDef {
                field_type: f.field_type,
                name: Some(format!("{}.{}", prefix, f.name.as_deref().unwrap_or("null"))),
            })
            .collect();
        Schema::new(fields)
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len()
            && self.size == other.size
            && self
                .fields
                .iter()
                .zip(&other.fields)
                .all(|(a, b)| a.field_type == b.field_type)
    }
}

impl Eq for Schema {}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(
                f,
                "{}[{}]({})",
                field.field_type,
                i,
                field.name.as_deref().unwrap_or("null")
            )?;
        }
        Ok(())
    }
}
