//! Schema domain module.
//!
//! Describes the shape of the records the intake flow collects: record
//! types, field descriptors, repeating subgroups and typed field values.
//! Concrete schemas come from the `SchemaProvider` port.

mod field;
mod record_type;
mod value;

pub use field::{FieldDescriptor, FieldType, SubgroupDescriptor};
pub use record_type::RecordType;
pub use value::{FieldValue, RowData};
