//! Tuple and page data model: field types, schemas, tuples, record ids and the
//! heap page layout.

mod error;
mod page;
mod record_id;
mod schema;
mod tuple;
mod value;

pub use error::{RecordError, RecordResult};
pub use page::{HeapPage, HeapPageIter};
pub use record_id::{PageId, PageNo, RecordId, SlotId, TableId};
pub use schema::{FieldDef, Schema};
pub use tuple::Tuple;
pub use value::{FieldType, Value};
