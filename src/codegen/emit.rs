//! Writing rendered artifacts to disk.
//!
//! Every run is staged first and committed as a unit: all target paths are
//! checked before the first byte is written, each file is written atomically
//! (temp file + rename), and if any write fails the files touched so far are
//! removed or restored.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::codegen::ArtifactKind;
use crate::config::GenerationMode;
use crate::error::EmitError;

/// Target directories of a layered service codebase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub models_dir: PathBuf,
    pub controllers_dir: PathBuf,
    pub dtos_dir: PathBuf,
    pub services_dir: PathBuf,
    /// Scratch directory used for every artifact in sandboxed mode.
    pub out_dir: PathBuf,
    /// Source file extension without the dot, e.g. `go`.
    pub extension: String,
}

impl OutputPaths {
    fn production_dir(&self, kind: ArtifactKind) -> &Path {
        match kind {
            ArtifactKind::Model => &self.models_dir,
            ArtifactKind::Controller => &self.controllers_dir,
            ArtifactKind::CreateRequest | ArtifactKind::UpdateRequest => &self.dtos_dir,
            ArtifactKind::Service => &self.services_dir,
        }
    }
}

/// What a staged write belongs to, for reporting and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "type", content = "name")]
pub enum WriteTarget {
    Artifact(ArtifactKind),
    Registration(&'static str),
}

impl fmt::Display for WriteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteTarget::Artifact(kind) => write!(f, "{kind} artifact"),
            WriteTarget::Registration(name) => write!(f, "{name} registration"),
        }
    }
}

/// A file write prepared but not yet applied.
#[derive(Debug, Clone)]
pub struct StagedWrite {
    pub target: WriteTarget,
    pub path: PathBuf,
    pub contents: String,
    /// When set, the write fails if `path` already exists.
    pub create_new: bool,
}

/// A file written by [`ArtifactEmitter::commit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenFile {
    pub target: WriteTarget,
    pub path: PathBuf,
    pub sha256: String,
}

enum Undo {
    Remove(PathBuf),
    Restore(PathBuf, Vec<u8>),
}

/// Resolves artifact paths per mode and commits staged writes.
#[derive(Debug, Clone)]
pub struct ArtifactEmitter {
    paths: OutputPaths,
    mode: GenerationMode,
}

impl ArtifactEmitter {
    pub fn new(paths: OutputPaths, mode: GenerationMode) -> Self {
        Self { paths, mode }
    }

    pub fn mode(&self) -> GenerationMode {
        self.mode
    }

    /// Creates the scratch output directory. Idempotent, independent of mode.
    pub fn prepare_scratch_dir(&self) -> Result<(), EmitError> {
        fs::create_dir_all(&self.paths.out_dir).map_err(|source| EmitError::Io {
            path: self.paths.out_dir.clone(),
            source,
        })
    }

    /// Where `kind` for `model_name` is written in the current mode.
    pub fn resolve_target(&self, kind: ArtifactKind, model_name: &str) -> PathBuf {
        let dir = match self.mode {
            GenerationMode::Production => self.paths.production_dir(kind),
            GenerationMode::Sandboxed => &self.paths.out_dir,
        };
        dir.join(format!(
            "{}.{}",
            kind.file_stem(model_name),
            self.paths.extension
        ))
    }

    /// Stages an artifact. Production artifacts may only create new files.
    pub fn stage(&self, kind: ArtifactKind, model_name: &str, contents: String) -> StagedWrite {
        StagedWrite {
            target: WriteTarget::Artifact(kind),
            path: self.resolve_target(kind, model_name),
            contents,
            create_new: self.mode == GenerationMode::Production,
        }
    }

    /// Stages and commits a single artifact.
    pub fn emit(
        &self,
        kind: ArtifactKind,
        model_name: &str,
        contents: String,
    ) -> Result<WrittenFile, EmitError> {
        let mut written = self.commit(vec![self.stage(kind, model_name, contents)])?;
        Ok(written.remove(0))
    }

    /// Applies all writes or none of them.
    pub fn commit(&self, writes: Vec<StagedWrite>) -> Result<Vec<WrittenFile>, EmitError> {
        Self::check_targets(&writes)?;

        let mut undo_log = Vec::with_capacity(writes.len());
        let mut written = Vec::with_capacity(writes.len());
        for write in writes {
            match Self::apply(&write) {
                Ok(undo) => {
                    undo_log.push(undo);
                    tracing::info!(target_kind = %write.target, path = %write.path.display(), "wrote file");
                    written.push(WrittenFile {
                        target: write.target,
                        sha256: content_hash(&write.contents),
                        path: write.path,
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        rolled_back = undo_log.len(),
                        "write failed, rolling back this run"
                    );
                    Self::rollback(undo_log);
                    return Err(err);
                }
            }
        }
        Ok(written)
    }

    fn check_targets(writes: &[StagedWrite]) -> Result<(), EmitError> {
        for (index, write) in writes.iter().enumerate() {
            if writes[..index].iter().any(|w| w.path == write.path) {
                return Err(EmitError::ConflictingTargets {
                    path: write.path.clone(),
                });
            }
            if write.create_new && write.path.exists() {
                return Err(EmitError::TargetExists {
                    target: write.target.to_string(),
                    path: write.path.clone(),
                });
            }
        }
        Ok(())
    }

    fn apply(write: &StagedWrite) -> Result<Undo, EmitError> {
        let io_err = |source| EmitError::Io {
            path: write.path.clone(),
            source,
        };

        let previous = if write.path.exists() {
            Some(fs::read(&write.path).map_err(io_err)?)
        } else {
            None
        };

        let parent = match write.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = NamedTempFile::new_in(parent).map_err(io_err)?;
        temp.write_all(write.contents.as_bytes()).map_err(io_err)?;
        temp.flush().map_err(io_err)?;
        if write.create_new {
            temp.persist_noclobber(&write.path)
                .map_err(|err| io_err(err.error))?;
        } else {
            temp.persist(&write.path).map_err(|err| io_err(err.error))?;
        }

        Ok(match previous {
            Some(bytes) => Undo::Restore(write.path.clone(), bytes),
            None => Undo::Remove(write.path.clone()),
        })
    }

    fn rollback(undo_log: Vec<Undo>) {
        for undo in undo_log.into_iter().rev() {
            let (path, result) = match undo {
                Undo::Remove(path) => {
                    let result = fs::remove_file(&path);
                    (path, result)
                }
                Undo::Restore(path, bytes) => {
                    let result = fs::write(&path, bytes);
                    (path, result)
                }
            };
            if let Err(err) = result {
                tracing::error!(path = %path.display(), error = %err, "rollback failed");
            }
        }
    }
}

/// SHA-256 of generated text, hex encoded.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
