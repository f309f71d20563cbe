//! Schema-driven scaffolding for layered Go/GORM service codebases.
//!
//! Given a model name and an ordered list of typed fields, generates the
//! model struct, create/update request DTOs, controller and service, all kept
//! consistent with each other and with the models already in the codebase.
//!
//! ```no_run
//! use model_scaffold::{GenerationMode, ScaffoldConfig, Scaffolder};
//!
//! # fn main() -> Result<(), model_scaffold::ScaffoldError> {
//! let config = ScaffoldConfig::new("./api").with_mode(GenerationMode::Sandboxed);
//! let mut session = Scaffolder::new("Order", config)?;
//! session.add_field("total", "float32")?;
//! session.add_field("customer", "Customer")?;
//! let report = session.generate()?;
//! println!("{} files written", report.artifacts.len());
//! # Ok(())
//! # }
//! ```

pub mod codegen;
pub mod config;
pub mod error;
pub mod logging;
pub mod registry;
pub mod scaffold;
pub mod schema;

pub use codegen::ArtifactKind;
pub use config::{CliArgs, ConfigArgs, GenerationMode, ScaffoldConfig};
pub use error::{
    DiscoveryError, EmitError, FieldError, RegistrationError, RenderError, ScaffoldError,
    ScaffoldResult,
};
pub use logging::{LoggingConfig, init_logging};
pub use registry::{ModelRegistry, SourceScanRegistry, StaticRegistry};
pub use scaffold::{
    ArtifactRecord, GenerationReport, RegistrationRecord, Scaffolder, SessionState,
};
pub use schema::{FieldDescriptor, FieldType, PrimitiveType, Schema, SchemaBuilder};
