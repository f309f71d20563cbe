//! Code generation pipeline
//!
//! ```text
//! Schema → TemplateRenderer → StagedWrite (+ registration rewrites) → ArtifactEmitter::commit
//! ```
//!
//! - **artifact**: the five artifact kinds and their template files
//! - **render**: placeholder substitution and the column-aligned field block
//! - **emit**: path policy, overwrite protection and all-or-nothing writes
//! - **registration**: idempotent insertion into migration and server files
//!
//! Nothing is written until every artifact has rendered and every
//! registration rewrite has been computed.

pub mod artifact;
pub mod emit;
pub mod registration;
pub mod render;

pub use artifact::{ArtifactKind, TemplateSet};
pub use emit::{
    ArtifactEmitter, OutputPaths, StagedWrite, WriteTarget, WrittenFile, content_hash,
};
pub use registration::{
    MigrationRegistration, PlannedRegistration, RegistrationEntry, RegistrationOutcome,
    RegistrationTarget, RouteRegistration,
};
pub use render::{FieldBlockLayout, TemplateRenderer};
