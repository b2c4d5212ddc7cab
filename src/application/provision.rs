// SPDX-License-Identifier: MPL-2.0
//! Model artifact cache.
//!
//! Weight files live flat in one cache directory. A file is downloaded to a
//! `.part` sibling and renamed onto its final name only once complete, so the
//! final name never refers to a partial file.

use crate::domain::{ModelArtifact, ModelKind};
use crate::error::{Error, Result};
use crate::media::download::{self, Progress};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk state of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactState {
    /// Neither the file nor a partial download exists.
    Absent,
    /// Only a `.part` file exists (stale or concurrent download).
    Downloading,
    /// The file exists and is non-empty.
    Present,
    /// The file exists but is empty.
    Corrupt,
}

impl ArtifactState {
    /// Returns `true` when the artifact can be used without downloading.
    #[must_use]
    pub fn is_usable(self) -> bool {
        self == ArtifactState::Present
    }
}

/// Inspects the state of `artifact` inside `cache_dir`.
#[must_use]
pub fn inspect(cache_dir: &Path, artifact: &ModelArtifact) -> ArtifactState {
    let target = cache_dir.join(&artifact.filename);
    match fs::metadata(&target) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => ArtifactState::Present,
        Ok(_) => ArtifactState::Corrupt,
        Err(_) if cache_dir.join(artifact.partial_filename()).exists() => {
            ArtifactState::Downloading
        }
        Err(_) => ArtifactState::Absent,
    }
}

/// Ensures model weights are available locally.
#[derive(Debug, Clone)]
pub struct ArtifactProvisioner {
    cache_dir: PathBuf,
    overrides: HashMap<ModelKind, ModelArtifact>,
}

impl ArtifactProvisioner {
    /// Creates a provisioner storing files in `cache_dir`.
    #[must_use]
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            overrides: HashMap::new(),
        }
    }

    /// Replaces the registry entry for `kind`.
    #[must_use]
    pub fn with_artifact(mut self, kind: ModelKind, artifact: ModelArtifact) -> Self {
        self.overrides.insert(kind, artifact);
        self
    }

    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the artifact used for `kind`.
    #[must_use]
    pub fn artifact(&self, kind: ModelKind) -> ModelArtifact {
        self.overrides
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| kind.default_artifact())
    }

    /// Local path of the artifact for `kind`, whether or not it exists.
    #[must_use]
    pub fn local_path(&self, kind: ModelKind) -> PathBuf {
        self.cache_dir.join(self.artifact(kind).filename)
    }

    /// Returns the on-disk state of the artifact for `kind`.
    #[must_use]
    pub fn state(&self, kind: ModelKind) -> ArtifactState {
        inspect(&self.cache_dir, &self.artifact(kind))
    }

    /// Returns the local path of the weights for `kind`, downloading them
    /// first when they are not present.
    ///
    /// A present file is returned without any network access. An empty file
    /// or a leftover `.part` file is discarded and downloaded again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the artifact is not an ONNX file,
    /// before anything is downloaded. Returns [`Error::Io`] if the cache
    /// directory cannot be prepared and
    /// [`Error::Download`] if the transfer fails; no file is left under the
    /// final name in either case.
    pub async fn ensure(
        &self,
        kind: ModelKind,
        progress_callback: impl FnMut(Progress) + Send,
    ) -> Result<PathBuf> {
        let artifact = self.artifact(kind);
        if !artifact.is_onnx() {
            return Err(Error::Configuration(format!(
                "model file {} for '{kind}' is not an ONNX export (expected .{})",
                artifact.filename,
                ModelArtifact::EXTENSION
            )));
        }
        let target = self.cache_dir.join(&artifact.filename);
        let partial = self.cache_dir.join(artifact.partial_filename());

        match inspect(&self.cache_dir, &artifact) {
            ArtifactState::Present => {
                tracing::debug!(path = %target.display(), "model already cached");
                return Ok(target);
            }
            ArtifactState::Corrupt => {
                tracing::warn!(path = %target.display(), "discarding empty model file");
                fs::remove_file(&target)?;
            }
            ArtifactState::Downloading => {
                tracing::warn!(path = %partial.display(), "discarding stale partial download");
            }
            ArtifactState::Absent => {}
        }

        fs::create_dir_all(&self.cache_dir)?;
        tracing::info!(model = %kind, url = %artifact.url, "downloading model");

        let bytes = download::download_file(&artifact.url, &partial, progress_callback).await?;
        if let Err(err) = fs::rename(&partial, &target) {
            let _ = fs::remove_file(&partial);
            return Err(Error::Io(err));
        }

        tracing::info!(path = %target.display(), bytes, "model downloaded");
        Ok(target)
    }
}
