//! Discovery of models that already exist in the target codebase.
//!
//! Relation fields may only point at known models, so the registry must be
//! complete and must fail loudly rather than guess: a model source file with
//! no recognisable declaration, or two files declaring the same model, abort
//! discovery with no partial result.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::DiscoveryError;

/// Source of the set of model names valid as relation types.
pub trait ModelRegistry {
    fn list_known_model_names(&self) -> Result<BTreeSet<String>, DiscoveryError>;
}

static TYPE_DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*type[ \t]+(\w+)[ \t]+struct[ \t]*\{")
        .expect("type declaration pattern is valid")
});

/// Returns the name in the first `type <Name> struct {` header of `source`.
///
/// Only the header is inspected; field bodies and later declarations are
/// ignored.
pub fn first_struct_declaration(source: &str) -> Option<&str> {
    TYPE_DECLARATION
        .captures(source)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Scans a directory of model sources, one declaration per file.
#[derive(Debug, Clone)]
pub struct SourceScanRegistry {
    models_dir: PathBuf,
    extension: String,
}

impl SourceScanRegistry {
    pub fn new(models_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            models_dir: models_dir.into(),
            extension: extension.into(),
        }
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == self.extension)
    }
}

impl ModelRegistry for SourceScanRegistry {
    fn list_known_model_names(&self) -> Result<BTreeSet<String>, DiscoveryError> {
        let mut declared: BTreeMap<String, PathBuf> = BTreeMap::new();

        let walker = WalkDir::new(&self.models_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();
        for entry in walker {
            let entry = entry.map_err(|err| DiscoveryError::Io {
                path: err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.models_dir.clone()),
                source: err.into(),
            })?;
            let path = entry.path();
            if !entry.file_type().is_file() || !self.has_extension(path) {
                continue;
            }

            let source = fs::read_to_string(path).map_err(|source| DiscoveryError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let name = first_struct_declaration(&source).ok_or_else(|| {
                DiscoveryError::MissingTypeDeclaration {
                    file: path.to_path_buf(),
                }
            })?;

            if let Some(first) = declared.get(name) {
                return Err(DiscoveryError::DuplicateModel {
                    name: name.to_string(),
                    first: first.clone(),
                    second: path.to_path_buf(),
                });
            }
            tracing::trace!(model = name, file = %path.display(), "discovered model");
            declared.insert(name.to_string(), path.to_path_buf());
        }

        tracing::debug!(
            dir = %self.models_dir.display(),
            count = declared.len(),
            "model discovery complete"
        );
        Ok(declared.into_keys().collect())
    }
}

/// Explicitly registered model names.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    models: BTreeSet<String>,
}

impl StaticRegistry {
    pub fn new<I, S>(models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            models: models.into_iter().map(Into::into).collect(),
        }
    }

    pub fn register(&mut self, model: impl Into<String>) -> &mut Self {
        self.models.insert(model.into());
        self
    }
}

impl ModelRegistry for StaticRegistry {
    fn list_known_model_names(&self) -> Result<BTreeSet<String>, DiscoveryError> {
        Ok(self.models.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    #[test]
    fn test_first_declaration_wins() {
        let source = "package models\n\ntype BaseModel struct {\n\tID int\n}\n\ntype User struct {\n\tBaseModel\n}\n";
        assert_eq!(first_struct_declaration(source), Some("BaseModel"));
    }

    #[test]
    fn test_declaration_must_start_a_line() {
        assert_eq!(first_struct_declaration("// type Ghost struct {\n"), None);
        assert_eq!(first_struct_declaration("type Alias = Other\n"), None);
        assert_eq!(
            first_struct_declaration("type MarketItem struct{\n"),
            Some("MarketItem")
        );
    }

    #[test]
    fn test_scan_collects_models_and_skips_other_extensions() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("category.go"),
            "package models\n\ntype Category struct {\n\tTitle string\n}\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("marketItem.go"),
            "package models\n\ntype MarketItem struct {\n\tBaseModel\n}\n",
        )
        .unwrap();
        fs::write(dir.path().join("README.md"), "no models here").unwrap();

        let registry = SourceScanRegistry::new(dir.path(), "go");
        let models = registry.list_known_model_names().unwrap();
        assert_eq!(
            models.into_iter().collect::<Vec<_>>(),
            ["Category", "MarketItem"]
        );
    }

    #[test]
    fn test_scan_fails_on_file_without_declaration() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.go"), "type A struct {\n}\n").unwrap();
        fs::write(dir.path().join("helpers.go"), "package models\n\nfunc X() {}\n").unwrap();

        let err = SourceScanRegistry::new(dir.path(), "go")
            .list_known_model_names()
            .unwrap_err();
        assert_matches!(err, DiscoveryError::MissingTypeDeclaration { file } if file.ends_with("helpers.go"));
    }

    #[test]
    fn test_scan_fails_on_duplicate_model() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.go"), "type Shared struct {\n}\n").unwrap();
        fs::write(dir.path().join("b.go"), "type Shared struct {\n}\n").unwrap();

        let err = SourceScanRegistry::new(dir.path(), "go")
            .list_known_model_names()
            .unwrap_err();
        assert_matches!(err, DiscoveryError::DuplicateModel { name, .. } if name == "Shared");
    }

    #[test]
    fn test_scan_missing_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = SourceScanRegistry::new(dir.path().join("missing"), "go")
            .list_known_model_names()
            .unwrap_err();
        assert_matches!(err, DiscoveryError::Io { .. });
    }

    #[test]
    fn test_static_registry() {
        let mut registry = StaticRegistry::new(["User"]);
        registry.register("Category");
        let models = registry.list_known_model_names().unwrap();
        assert!(models.contains("User"));
        assert!(models.contains("Category"));
    }
}
