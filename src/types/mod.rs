//! The non-generic type system of the IR.

pub mod field_type;
pub mod method_descriptor;

pub use field_type::{FieldType, PrimitiveType};
pub use method_descriptor::{InvalidDescriptor, MethodDescriptor, ReturnType};
