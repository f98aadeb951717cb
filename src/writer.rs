//! Artifact Output
//!
//! Writes compiled artifacts as `<out>/<target>/<filename>` and checks an
//! existing tree against fresh output.

use serde::Serialize;
use similar::{ChangeTag, TextDiff};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::codegen::Artifact;
use crate::error::{CompileError, Result};
use crate::loader::strip_schema_extension;

/// Where an artifact lives under an output root
pub fn artifact_path(out_dir: &Path, artifact: &Artifact) -> PathBuf {
    out_dir.join(&artifact.target).join(&artifact.filename)
}

/// Output directory per document. A single document writes straight into
/// `out_dir`; several documents each get the path relative to `input_root`
/// without its extension (`a/user.json` -> `<out>/a/user`). Two documents
/// that map to the same directory are an error.
pub fn document_dirs(out_dir: &Path, input_root: &Path, documents: &[&Path]) -> Result<Vec<PathBuf>> {
    if let [_] = documents {
        return Ok(vec![out_dir.to_path_buf()]);
    }

    let mut owners: BTreeMap<PathBuf, &Path> = BTreeMap::new();
    let mut dirs = Vec::with_capacity(documents.len());

    for document in documents {
        let relative = document.strip_prefix(input_root).unwrap_or(document);
        let name = relative.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let dir = match relative.parent() {
            Some(parent) => out_dir.join(parent).join(strip_schema_extension(&name)),
            None => out_dir.join(strip_schema_extension(&name)),
        };

        if let Some(first) = owners.insert(dir.clone(), document) {
            return Err(CompileError::OutputConflict {
                dir,
                first: first.to_path_buf(),
                second: document.to_path_buf(),
            });
        }
        dirs.push(dir);
    }

    Ok(dirs)
}

/// Write every artifact, creating directories as needed. Returns the paths written.
pub fn write_artifacts(out_dir: &Path, artifacts: &[Artifact]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(artifacts.len());

    for artifact in artifacts {
        let path = artifact_path(out_dir, artifact);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &artifact.contents)?;
        tracing::debug!(path = %path.display(), bytes = artifact.contents.len(), "wrote artifact");
        written.push(path);
    }

    Ok(written)
}

// =============================================================================
// Check
// =============================================================================

/// State of one artifact on disk compared with fresh output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ArtifactStatus {
    Fresh,
    Missing,
    Stale {
        /// Unified diff from the file on disk to the fresh output
        diff: String,
        added: usize,
        removed: usize,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactCheck {
    pub path: PathBuf,
    pub status: ArtifactStatus,
}

impl ArtifactCheck {
    pub fn is_fresh(&self) -> bool {
        self.status == ArtifactStatus::Fresh
    }
}

/// Compare artifacts with what is on disk, without writing anything
pub fn check_artifacts(out_dir: &Path, artifacts: &[Artifact]) -> Result<Vec<ArtifactCheck>> {
    let mut checks = Vec::with_capacity(artifacts.len());

    for artifact in artifacts {
        let path = artifact_path(out_dir, artifact);
        let status = if !path.exists() {
            ArtifactStatus::Missing
        } else {
            let existing = fs::read_to_string(&path)?;
            if existing == artifact.contents {
                ArtifactStatus::Fresh
            } else {
                stale(&existing, &artifact.contents, &path)
            }
        };

        tracing::debug!(path = %path.display(), status = ?status, "checked artifact");
        checks.push(ArtifactCheck { path, status });
    }

    Ok(checks)
}

fn stale(existing: &str, fresh: &str, path: &Path) -> ArtifactStatus {
    let diff = TextDiff::from_lines(existing, fresh);

    let mut added = 0;
    let mut removed = 0;
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => added += 1,
            ChangeTag::Delete => removed += 1,
            ChangeTag::Equal => {}
        }
    }

    let name = path.display().to_string();
    let unified = diff
        .unified_diff()
        .context_radius(3)
        .header(&name, &format!("{} (generated)", name))
        .to_string();

    ArtifactStatus::Stale {
        diff: unified,
        added,
        removed,
    }
}
