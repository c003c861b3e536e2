use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{RecordError, RecordResult};

/// Fixed-width field type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Int,         // 4 bytes
    Float,       // 8 bytes
    Char(usize), // n bytes (fixed length, zero padded)
}

impl FieldType {
    /// Get the size in bytes for this field type
    pub fn size(&self) -> usize {
        match self {
            FieldType::Int => 4,
            FieldType::Float => 8,
            FieldType::Char(n) => *n,
        }
    }

    /// Parse a value of this type from its textual form (used by CSV loading)
    pub fn parse_value(&self, text: &str) -> RecordResult<Value> {
        let text = text.trim();
        match self {
            FieldType::Int => text.parse::<i32>().map(Value::Int).map_err(|e| {
                RecordError::Deserialization(format!("Invalid INT '{}': {}", text, e))
            }),
            FieldType::Float => text.parse::<f64>().map(Value::Float).map_err(|e| {
                RecordError::Deserialization(format!("Invalid FLOAT '{}': {}", text, e))
            }),
            FieldType::Char(_) => Ok(Value::String(text.to_string())),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Int => write!(f, "INT"),
            FieldType::Float => write!(f, "FLOAT"),
            FieldType::Char(n) => write!(f, "CHAR({})", n),
        }
    }
}

impl FromStr for FieldType {
    type Err = RecordError;

    /// Accepts `int`, `float` and `char(n)`, case-insensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "int" => Ok(FieldType::Int),
            "float" => Ok(FieldType::Float),
            _ => {
                let len = lower
                    .strip_prefix("char(")
                    .and_then(|rest| rest.strip_suffix(')'))
                    .and_then(|n| n.parse::<usize>().ok())
                    .filter(|&n| n > 0)
                    .ok_or_else(|| {
                        RecordError::Deserialization(format!("Unknown field type: {}", s))
                    })?;
                Ok(FieldType::Char(len))
            }
        }
    }
}

/// A single field value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f64),
    String(String),
}

impl Value {
    /// Check whether this value can be stored in a field of the given type
    pub fn matches(&self, field_type: &FieldType) -> bool {
        matches!(
            (self, field_type),
            (Value::Int(_), FieldType::Int)
                | (Value::Float(_), FieldType::Float)
                | (Value::String(_), FieldType::Char(_))
        )
    }

    /// Serialize value into `out`, which must be exactly `field_type.size()` bytes
    pub fn write_to(&self, field_type: &FieldType, out: &mut [u8]) -> RecordResult<()> {
        match (self, field_type) {
            (Value::Int(i), FieldType::Int) => out.copy_from_slice(&i.to_le_bytes()),
            (Value::Float(f), FieldType::Float) => out.copy_from_slice(&f.to_le_bytes()),
            (Value::String(s), FieldType::Char(max_len)) => {
                let bytes = s.as_bytes();
                // Zero bytes are padding on disk
                if bytes.contains(&0) {
                    return Err(RecordError::Serialization(format!(
                        "String {:?} contains a NUL byte",
                        s
                    )));
                }
                if bytes.len() > *max_len {
                    return Err(RecordError::Serialization(format!(
                        "String length {} exceeds max length {}",
                        bytes.len(),
                        max_len
                    )));
                }
                out[..bytes.len()].copy_from_slice(bytes);
                out[bytes.len()..].fill(0);
            }
            _ => {
                return Err(RecordError::TypeMismatch {
                    expected: field_type.to_string(),
                    actual: format!("{:?}", self),
                });
            }
        }
        Ok(())
    }

    /// Deserialize value from bytes
    pub fn read_from(bytes: &[u8], field_type: &FieldType) -> RecordResult<Self> {
        if bytes.len() != field_type.size() {
            return Err(RecordError::Deserialization(format!(
                "Expected {} bytes for {}, got {}",
                field_type.size(),
                field_type,
                bytes.len()
            )));
        }

        match field_type {
            FieldType::Int => {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(bytes);
                Ok(Value::Int(i32::from_le_bytes(buf)))
            }
            FieldType::Float => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(bytes);
                Ok(Value::Float(f64::from_le_bytes(buf)))
            }
            FieldType::Char(_) => {
                // Trailing zero bytes are padding
                let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                let s = String::from_utf8(bytes[..end].to_vec())
                    .map_err(|e| RecordError::Deserialization(format!("Invalid UTF-8: {}", e)))?;
                Ok(Value::String(s))
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}
