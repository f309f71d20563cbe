//! Error taxonomy for the scaffolding engine
//!
//! Each layer raises its own error type at the lowest point that can detect
//! the problem:
//! - [`FieldError`]: schema validation (bad identifier, reserved name,
//!   unknown type, duplicate name). Raised before any file I/O.
//! - [`DiscoveryError`]: malformed or ambiguous existing model sources.
//! - [`RenderError`]: template text that cannot carry the schema.
//! - [`EmitError`]: target path policy and file writes.
//! - [`RegistrationError`]: migration/server bootstrap insertion.
//!
//! [`ScaffoldError`] wraps all of them unchanged so the caller is the only
//! layer translating errors into operator-facing text.

use std::path::PathBuf;
use thiserror::Error;

use crate::codegen::ArtifactKind;

/// Result alias used across the engine
pub type ScaffoldResult<T> = Result<T, ScaffoldError>;

/// Validation failures for a single field or the schema it joins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("unknown type '{ty}' for field '{field}': expected a primitive or a discovered model")]
    UnknownType { field: String, ty: String },

    #[error("invalid identifier '{name}': must match [A-Za-z][A-Za-z0-9_]*")]
    InvalidIdentifier { name: String },

    #[error("field name '{name}' is reserved for framework-managed columns")]
    ReservedName { name: String },

    #[error("field name '{name}' shadows the primitive type keyword '{keyword}'")]
    ShadowsType { name: String, keyword: String },

    #[error("field '{name}' already exists in the schema")]
    DuplicateName { name: String },

    #[error(
        "relation field '{field}' needs a companion '{relation_id}' but that name is already taken"
    )]
    RelationIdCollision { field: String, relation_id: String },

    #[error("invalid model name '{name}': must match [A-Za-z][A-Za-z0-9_]*")]
    InvalidModelName { name: String },
}

/// Failures while learning the set of existing models.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("model source {file:?} has no `type <Name> struct {{` declaration")]
    MissingTypeDeclaration { file: PathBuf },

    #[error("model '{name}' is declared by both {first:?} and {second:?}")]
    DuplicateModel {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("failed to read model sources at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures while substituting the schema into template text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("template for {kind} is missing the {placeholder} placeholder")]
    MissingPlaceholder {
        kind: ArtifactKind,
        placeholder: &'static str,
    },

    #[error("cannot render {kind} for an empty schema")]
    EmptySchema { kind: ArtifactKind },
}

/// Failures while resolving or writing artifact files.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("refusing to overwrite existing {target} at {path:?}")]
    TargetExists { target: String, path: PathBuf },

    #[error("two staged writes resolve to the same path {path:?}")]
    ConflictingTargets { path: PathBuf },

    #[error("failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures while inserting the model into central registration files.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("{target}: could not find `{anchor}` in {path:?}")]
    AnchorNotFound {
        target: &'static str,
        anchor: &'static str,
        path: PathBuf,
    },

    #[error("{target}: failed to read {path:?}: {source}")]
    Io {
        target: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level error surfaced by [`crate::Scaffolder`].
#[derive(Debug, Error)]
pub enum ScaffoldError {
    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error("failed to read {kind} template {path:?}: {source}")]
    Template {
        kind: ArtifactKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("schema for '{model}' has no fields; add at least one field before generating")]
    EmptySchema { model: String },

    #[error("model '{model}' already exists in the models directory")]
    ModelExists { model: String },

    #[error("scaffold session for '{model}' is {state} and accepts no further operations")]
    SessionClosed {
        model: String,
        state: crate::SessionState,
    },
}

impl ScaffoldError {
    /// Coarse category used in logs and by front ends to pick a message style.
    pub fn category(&self) -> &'static str {
        match self {
            ScaffoldError::Field(_)
            | ScaffoldError::EmptySchema { .. }
            | ScaffoldError::ModelExists { .. } => "validation",
            ScaffoldError::Discovery(_) => "discovery",
            ScaffoldError::Render(_) | ScaffoldError::Template { .. } => "template",
            ScaffoldError::Emit(_) => "io",
            ScaffoldError::Registration(_) => "registration",
            ScaffoldError::SessionClosed { .. } => "state",
        }
    }

    /// Whether the operator can retry after correcting input, without
    /// fixing anything on disk.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ScaffoldError::Field(_) | ScaffoldError::EmptySchema { .. }
        )
    }
}
