//! Generation session for one model.
//!
//! A [`Scaffolder`] owns the schema being built and walks a small state
//! machine:
//!
//! ```text
//! Empty ──add_field──▶ Building ──generate──▶ Generated
//!   ▲                     │  │
//!   └────clear_fields─────┘  └──generate (I/O, render, registration error)──▶ Failed
//! ```
//!
//! Validation errors never move the session; the caller fixes the input and
//! tries again. `Generated` and `Failed` are terminal.

use serde::Serialize;
use std::path::PathBuf;
use strum::{Display, IntoEnumIterator};

use crate::codegen::{
    ArtifactEmitter, ArtifactKind, MigrationRegistration, PlannedRegistration, RegistrationEntry,
    RegistrationOutcome, RegistrationTarget, RouteRegistration, StagedWrite, TemplateRenderer,
    TemplateSet, WriteTarget,
};
use crate::config::{GenerationMode, ScaffoldConfig};
use crate::error::{ScaffoldError, ScaffoldResult};
use crate::logging::generation_span;
use crate::registry::{ModelRegistry, SourceScanRegistry};
use crate::schema::{FieldDescriptor, Schema, SchemaBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Empty,
    Building,
    Generated,
    Failed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Generated | SessionState::Failed)
    }
}

/// One generated source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactRecord {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub sha256: String,
}

/// What happened to one central registration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationRecord {
    pub target: &'static str,
    pub path: PathBuf,
    pub outcome: RegistrationOutcome,
}

/// Summary of a successful `generate()`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub model_name: String,
    pub mode: GenerationMode,
    /// RFC 3339, UTC
    pub generated_at: String,
    pub artifacts: Vec<ArtifactRecord>,
    pub registrations: Vec<RegistrationRecord>,
}

impl GenerationReport {
    pub fn artifact(&self, kind: ArtifactKind) -> Option<&ArtifactRecord> {
        self.artifacts.iter().find(|a| a.kind == kind)
    }
}

pub struct Scaffolder {
    builder: SchemaBuilder,
    config: ScaffoldConfig,
    renderer: TemplateRenderer,
    state: SessionState,
}

impl Scaffolder {
    /// Starts a session, discovering existing models from `config.models_dir`.
    pub fn new(model_name: &str, config: ScaffoldConfig) -> ScaffoldResult<Self> {
        let registry =
            SourceScanRegistry::new(&config.models_dir, config.source_extension.as_str());
        Self::with_registry(model_name, config, &registry)
    }

    /// Starts a session against an explicit registry.
    pub fn with_registry(
        model_name: &str,
        config: ScaffoldConfig,
        registry: &dyn ModelRegistry,
    ) -> ScaffoldResult<Self> {
        let builder = SchemaBuilder::new(model_name, registry)?;
        tracing::info!(model = model_name, mode = %config.mode, "scaffold session started");
        Ok(Self {
            builder,
            config,
            renderer: TemplateRenderer::new(),
            state: SessionState::Empty,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn schema(&self) -> &Schema {
        self.builder.schema()
    }

    pub fn model_name(&self) -> &str {
        self.builder.schema().model_name()
    }

    pub fn config(&self) -> &ScaffoldConfig {
        &self.config
    }

    pub fn add_field(&mut self, name: &str, ty: &str) -> ScaffoldResult<&FieldDescriptor> {
        self.ensure_open()?;
        let field = self.builder.add_field(name, ty)?;
        self.state = SessionState::Building;
        Ok(field)
    }

    pub fn clear_fields(&mut self) -> ScaffoldResult<()> {
        self.ensure_open()?;
        self.builder.clear_fields();
        self.state = SessionState::Empty;
        Ok(())
    }

    /// Renders and writes all five artifacts, then registers the model.
    ///
    /// Either every file of the run is written or none is.
    pub fn generate(&mut self) -> ScaffoldResult<GenerationReport> {
        self.ensure_open()?;
        if self.builder.schema().is_empty() {
            return Err(ScaffoldError::EmptySchema {
                model: self.model_name().to_string(),
            });
        }

        let span = generation_span(self.model_name(), self.config.mode);
        let _enter = span.enter();
        match self.run() {
            Ok(report) => {
                self.state = SessionState::Generated;
                tracing::info!(
                    artifacts = report.artifacts.len(),
                    registrations = report.registrations.len(),
                    "generation complete"
                );
                Ok(report)
            }
            Err(err) => {
                self.state = SessionState::Failed;
                tracing::error!(category = err.category(), error = %err, "generation failed");
                Err(err)
            }
        }
    }

    fn run(&self) -> ScaffoldResult<GenerationReport> {
        let schema = self.builder.schema();
        let model_name = schema.model_name();
        let mode = self.config.mode;

        if mode == GenerationMode::Production && self.builder.is_known_model(model_name) {
            return Err(ScaffoldError::ModelExists {
                model: model_name.to_string(),
            });
        }

        let templates = TemplateSet::load(&self.config.templates_dir)?;
        let emitter = ArtifactEmitter::new(self.config.output_paths(), mode);
        emitter.prepare_scratch_dir()?;

        let mut writes = ArtifactKind::iter()
            .map(|kind| -> ScaffoldResult<StagedWrite> {
                let text = self.renderer.render(kind, templates.get(kind), schema)?;
                Ok(emitter.stage(kind, model_name, text))
            })
            .collect::<ScaffoldResult<Vec<_>>>()?;

        let planned = self.plan_registrations(schema)?;
        writes.extend(planned.iter().filter_map(|p| p.write.clone()));

        let written = emitter.commit(writes)?;

        let artifacts = written
            .into_iter()
            .filter_map(|file| match file.target {
                WriteTarget::Artifact(kind) => Some(ArtifactRecord {
                    kind,
                    path: file.path,
                    sha256: file.sha256,
                }),
                WriteTarget::Registration(_) => None,
            })
            .collect();
        let registrations = planned
            .into_iter()
            .map(|p| RegistrationRecord {
                target: p.target,
                path: p.path,
                outcome: p.outcome,
            })
            .collect();

        Ok(GenerationReport {
            model_name: model_name.to_string(),
            mode,
            generated_at: chrono::Utc::now().to_rfc3339(),
            artifacts,
            registrations,
        })
    }

    fn plan_registrations(&self, schema: &Schema) -> ScaffoldResult<Vec<PlannedRegistration>> {
        let targets: [Box<dyn RegistrationTarget>; 2] = [
            Box::new(MigrationRegistration::new(&self.config.migrations_file)),
            Box::new(RouteRegistration::new(&self.config.server_file)),
        ];
        let entry = RegistrationEntry::from_schema(schema);

        targets
            .iter()
            .map(|target| -> ScaffoldResult<PlannedRegistration> {
                match self.config.mode {
                    GenerationMode::Production => Ok(target.plan(&entry)?),
                    GenerationMode::Sandboxed => Ok(target.skipped()),
                }
            })
            .collect()
    }

    fn ensure_open(&self) -> ScaffoldResult<()> {
        if self.state.is_terminal() {
            return Err(ScaffoldError::SessionClosed {
                model: self.model_name().to_string(),
                state: self.state,
            });
        }
        Ok(())
    }
}
