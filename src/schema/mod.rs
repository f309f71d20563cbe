//! Schema model: field descriptors, naming invariants and the builder that
//! assembles them into an ordered, validated schema for one target model.

mod builder;
mod field;
pub mod naming;

pub use builder::{BuilderError, Schema, SchemaBuilder};
pub use field::{FieldDescriptor, FieldType, PrimitiveType, RELATION_CONSTRAINT, SerializationTag};
