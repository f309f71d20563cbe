use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::FieldError;
use crate::schema::naming;

/// Column types every generated model may use directly.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Int,
    Float32,
    String,
    Uint,
    Bool,
}

/// Declared type of a field: a primitive or a reference to a discovered model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "type", rename_all = "lowercase")]
pub enum FieldType {
    Primitive(PrimitiveType),
    Relation(String),
}

impl FieldType {
    /// Resolves a raw type name against the primitive set and `existing_models`.
    pub fn resolve(ty: &str, existing_models: &BTreeSet<String>) -> Option<Self> {
        if let Ok(primitive) = ty.parse::<PrimitiveType>() {
            return Some(FieldType::Primitive(primitive));
        }
        existing_models
            .contains(ty)
            .then(|| FieldType::Relation(ty.to_string()))
    }

    /// Type as written into generated sources. Identity for every supported type.
    pub fn rendered(&self) -> &str {
        match self {
            FieldType::Primitive(primitive) => primitive.into(),
            FieldType::Relation(model) => model,
        }
    }

    pub fn is_relation(&self) -> bool {
        matches!(self, FieldType::Relation(_))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rendered())
    }
}

/// ORM annotation attached to relation fields so referential integrity is
/// always explicit.
pub const RELATION_CONSTRAINT: &str = "constraint:OnUpdate:CASCADE,OnDelete:SET NULL;";

/// Serialization metadata derived from a field name and type.
///
/// `key` is the decapitalized field name; relation fields additionally carry
/// [`RELATION_CONSTRAINT`]. Display renders the full struct tag, e.g.
/// `` `json:"customer" gorm:"constraint:OnUpdate:CASCADE,OnDelete:SET NULL;"` ``.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SerializationTag {
    key: String,
    relation_constraint: Option<&'static str>,
}

impl SerializationTag {
    fn derive(name: &str, field_type: &FieldType) -> Self {
        Self {
            key: naming::decapitalize(name),
            relation_constraint: field_type.is_relation().then_some(RELATION_CONSTRAINT),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn relation_constraint(&self) -> Option<&'static str> {
        self.relation_constraint
    }
}

impl fmt::Display for SerializationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.relation_constraint {
            Some(constraint) => write!(f, "`json:\"{}\" gorm:\"{}\"`", self.key, constraint),
            None => write!(f, "`json:\"{}\"`", self.key),
        }
    }
}

/// One validated schema field. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    name: String,
    field_type: FieldType,
    serialization_tag: SerializationTag,
}

impl FieldDescriptor {
    /// Validates `(name, ty)` and derives the serialization tag.
    ///
    /// Checks run in a fixed order: type known, identifier shape, reserved
    /// name, primitive keyword shadowing. The first failure is returned.
    pub fn new(
        name: &str,
        ty: &str,
        existing_models: &BTreeSet<String>,
    ) -> Result<Self, FieldError> {
        let field_type =
            FieldType::resolve(ty, existing_models).ok_or_else(|| FieldError::UnknownType {
                field: name.to_string(),
                ty: ty.to_string(),
            })?;
        naming::ensure_identifier(name)?;
        naming::ensure_not_reserved(name)?;
        naming::ensure_not_type_keyword(name)?;

        let serialization_tag = SerializationTag::derive(name, &field_type);
        Ok(Self {
            name: name.to_string(),
            field_type,
            serialization_tag,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    pub fn serialization_tag(&self) -> &SerializationTag {
        &self.serialization_tag
    }

    pub fn is_relation(&self) -> bool {
        self.field_type.is_relation()
    }
}

impl fmt::Display for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.field_type)
    }
}
