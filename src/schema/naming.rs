//! Naming invariants shared by field descriptors and the schema builder.
//!
//! Each rule is a standalone function so both layers can apply it and tests
//! can exercise it in isolation.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::FieldError;
use crate::schema::PrimitiveType;

/// Framework-managed columns (lowercased). Every model embeds them through
/// its base model, so user fields must never redeclare them.
pub const RESERVED_FIELD_NAMES: &[&str] = &["createdat", "updatedat", "deletedat", "basemodel"];

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("identifier pattern is valid"));

/// Returns true when `name` is a valid generated identifier.
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Case-insensitive membership in [`RESERVED_FIELD_NAMES`].
pub fn is_reserved_name(name: &str) -> bool {
    let lowered = name.to_ascii_lowercase();
    RESERVED_FIELD_NAMES.contains(&lowered.as_str())
}

/// Returns the primitive keyword `name` collides with, if any.
pub fn shadowed_primitive(name: &str) -> Option<PrimitiveType> {
    let lowered = name.to_ascii_lowercase();
    lowered.parse::<PrimitiveType>().ok()
}

pub fn ensure_identifier(name: &str) -> Result<(), FieldError> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(FieldError::InvalidIdentifier {
            name: name.to_string(),
        })
    }
}

/// Reserved-name guard. Called from both the descriptor and the builder.
pub fn ensure_not_reserved(name: &str) -> Result<(), FieldError> {
    if is_reserved_name(name) {
        Err(FieldError::ReservedName {
            name: name.to_string(),
        })
    } else {
        Ok(())
    }
}

pub fn ensure_not_type_keyword(name: &str) -> Result<(), FieldError> {
    match shadowed_primitive(name) {
        Some(keyword) => Err(FieldError::ShadowsType {
            name: name.to_string(),
            keyword: keyword.to_string(),
        }),
        None => Ok(()),
    }
}

/// Lowercases the first character: `MarketItem` -> `marketItem`.
pub fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Name of the foreign-key companion synthesized for a relation to `model`.
pub fn relation_id_name(model: &str) -> String {
    format!("{}Id", decapitalize(model))
}
