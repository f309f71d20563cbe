use indexmap::IndexMap;
use std::collections::BTreeSet;

use crate::error::{DiscoveryError, FieldError};
use crate::registry::ModelRegistry;
use crate::schema::field::{FieldDescriptor, FieldType, PrimitiveType};
use crate::schema::naming;

/// The validated, ordered field list for one target model.
///
/// Insertion order is the generated struct's field order.
#[derive(Debug, Clone)]
pub struct Schema {
    model_name: String,
    fields: IndexMap<String, FieldDescriptor>,
}

impl Schema {
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn fields(&self) -> impl ExactSizeIterator<Item = &FieldDescriptor> {
        self.fields.values()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Name of the paired create DTO, e.g. `CreateOrderRequest`.
    pub fn create_dto_name(&self) -> String {
        format!("Create{}Request", self.model_name)
    }

    /// Name of the paired update DTO, e.g. `UpdateOrderRequest`.
    pub fn update_dto_name(&self) -> String {
        format!("Update{}Request", self.model_name)
    }

    pub fn controller_name(&self) -> String {
        format!("{}Controller", self.model_name)
    }

    pub fn service_name(&self) -> String {
        format!("{}Service", self.model_name)
    }
}

/// Accumulates fields for one model, enforcing cross-field invariants.
#[derive(Debug)]
pub struct SchemaBuilder {
    schema: Schema,
    existing_models: BTreeSet<String>,
}

impl SchemaBuilder {
    /// Creates an empty schema for `model_name`, ingesting the registry once.
    ///
    /// The known models are frozen for the lifetime of the builder.
    pub fn new(model_name: &str, registry: &dyn ModelRegistry) -> Result<Self, BuilderError> {
        if !naming::is_valid_identifier(model_name) {
            return Err(FieldError::InvalidModelName {
                name: model_name.to_string(),
            }
            .into());
        }
        let existing_models = registry.list_known_model_names()?;
        tracing::debug!(
            model = model_name,
            known_models = existing_models.len(),
            "schema builder initialised"
        );
        Ok(Self {
            schema: Schema {
                model_name: model_name.to_string(),
                fields: IndexMap::new(),
            },
            existing_models,
        })
    }

    /// Validates and appends a field.
    ///
    /// A relation field also appends its `<model>Id: uint` companion right
    /// after it. Both descriptors are built and checked before either is
    /// inserted, so on error the schema is left exactly as it was.
    pub fn add_field(&mut self, name: &str, ty: &str) -> Result<&FieldDescriptor, FieldError> {
        let field = FieldDescriptor::new(name, ty, &self.existing_models)?;
        if self.schema.fields.contains_key(field.name()) {
            return Err(FieldError::DuplicateName {
                name: name.to_string(),
            });
        }
        naming::ensure_not_reserved(field.name())?;

        let companion = match field.field_type() {
            FieldType::Relation(model) => Some(self.relation_companion(&field, model)?),
            FieldType::Primitive(_) => None,
        };

        tracing::debug!(
            model = %self.schema.model_name,
            field = %field,
            companion = companion.as_ref().map(|c| c.name()),
            "adding field"
        );
        let index = self.schema.fields.len();
        self.schema.fields.insert(field.name().to_string(), field);
        if let Some(companion) = companion {
            self.schema
                .fields
                .insert(companion.name().to_string(), companion);
        }
        Ok(&self.schema.fields[index])
    }

    fn relation_companion(
        &self,
        field: &FieldDescriptor,
        model: &str,
    ) -> Result<FieldDescriptor, FieldError> {
        let relation_id = naming::relation_id_name(model);
        if relation_id == field.name() || self.schema.fields.contains_key(&relation_id) {
            return Err(FieldError::RelationIdCollision {
                field: field.name().to_string(),
                relation_id,
            });
        }
        FieldDescriptor::new(
            &relation_id,
            PrimitiveType::Uint.into(),
            &self.existing_models,
        )
    }

    /// Removes every field. Idempotent.
    pub fn clear_fields(&mut self) {
        self.schema.fields.clear();
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn fields(&self) -> impl ExactSizeIterator<Item = &FieldDescriptor> {
        self.schema.fields()
    }

    pub fn existing_models(&self) -> &BTreeSet<String> {
        &self.existing_models
    }

    pub fn is_known_model(&self, name: &str) -> bool {
        self.existing_models.contains(name)
    }
}

/// Construction-time failures of [`SchemaBuilder::new`].
#[derive(Debug, thiserror::Error)]
pub enum BuilderError {
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}

impl From<BuilderError> for crate::error::ScaffoldError {
    fn from(err: BuilderError) -> Self {
        match err {
            BuilderError::Field(err) => err.into(),
            BuilderError::Discovery(err) => err.into(),
        }
    }
}
