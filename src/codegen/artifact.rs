use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::error::ScaffoldError;
use crate::schema::naming;

/// The source files produced for one model.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display, EnumIter,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    Model,
    CreateRequest,
    UpdateRequest,
    Controller,
    Service,
}

impl ArtifactKind {
    /// File name of this kind's template inside the templates directory.
    pub fn template_file_name(self) -> &'static str {
        match self {
            ArtifactKind::Model => "model.txt",
            ArtifactKind::CreateRequest => "createDto.txt",
            ArtifactKind::UpdateRequest => "updateDto.txt",
            ArtifactKind::Controller => "controller.txt",
            ArtifactKind::Service => "service.txt",
        }
    }

    /// Whether the template must carry the aligned field block.
    pub fn requires_field_block(self) -> bool {
        matches!(
            self,
            ArtifactKind::Model | ArtifactKind::CreateRequest | ArtifactKind::UpdateRequest
        )
    }

    /// Target file name without extension, derived from the model name.
    pub fn file_stem(self, model_name: &str) -> String {
        match self {
            ArtifactKind::Model => naming::decapitalize(model_name),
            ArtifactKind::CreateRequest => format!("Create{model_name}Request"),
            ArtifactKind::UpdateRequest => format!("Update{model_name}Request"),
            ArtifactKind::Controller => format!("{model_name}Controller"),
            ArtifactKind::Service => format!("{model_name}Service"),
        }
    }
}

/// Raw template text for every artifact kind, read once per generation.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    templates: BTreeMap<ArtifactKind, String>,
}

impl TemplateSet {
    /// Reads all templates from `dir`. A missing or unreadable template is
    /// fatal and names the offending file.
    pub fn load(dir: &Path) -> Result<Self, ScaffoldError> {
        let mut templates = BTreeMap::new();
        for kind in ArtifactKind::iter() {
            let path: PathBuf = dir.join(kind.template_file_name());
            let text = fs::read_to_string(&path)
                .map_err(|source| ScaffoldError::Template { kind, path, source })?;
            templates.insert(kind, text);
        }
        tracing::debug!(dir = %dir.display(), "templates loaded");
        Ok(Self { templates })
    }

    /// Builds a set from in-memory text. Kinds not supplied get an empty
    /// template.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = (ArtifactKind, S)>,
        S: Into<String>,
    {
        let mut templates: BTreeMap<ArtifactKind, String> =
            ArtifactKind::iter().map(|kind| (kind, String::new())).collect();
        for (kind, text) in texts {
            templates.insert(kind, text.into());
        }
        Self { templates }
    }

    pub fn get(&self, kind: ArtifactKind) -> &str {
        self.templates.get(&kind).map(String::as_str).unwrap_or_default()
    }
}
