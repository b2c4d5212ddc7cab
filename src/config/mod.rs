// SPDX-License-Identifier: MPL-2.0
//! This module handles the persistent settings, loaded from a `settings.toml`
//! file. Every value is optional; command-line arguments win over the file,
//! and the file wins over the built-in defaults.
//!
//! # Examples
//!
//! ```no_run
//! use anime_upscaler::config::{self, Settings};
//! use std::path::PathBuf;
//!
//! // Load the settings file from its default location
//! let mut settings = config::load(None);
//!
//! // Change a default
//! settings.defaults.model = Some("general".to_string());
//!
//! // Save to a specific path
//! let path = PathBuf::from("./settings.toml");
//! config::save_to_path(&settings, &path).expect("Failed to save settings");
//! ```
//!
//! A complete file looks like:
//!
//! ```toml
//! [defaults]
//! model = "anime"
//! device = "auto"
//! scale = 4
//! full_precision = false
//!
//! [inference]
//! tile_size = 512
//! tile_pad = 10
//!
//! [models.anime]
//! url = "https://example.com/RealESRGAN_x4plus_anime_6B.onnx"
//! filename = "RealESRGAN_x4plus_anime_6B.onnx"
//! ```

pub mod defaults;

use crate::domain::{ModelArtifact, ModelKind, TileConfig};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// `[defaults]` section: fallback values for command-line options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsSection {
    pub model: Option<String>,
    pub device: Option<String>,
    pub scale: Option<u32>,
    pub full_precision: Option<bool>,
}

/// `[inference]` section: tiling parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceSection {
    pub tile_size: Option<u32>,
    pub tile_pad: Option<u32>,
}

/// Per-model download override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOverride {
    pub url: Option<String>,
    pub filename: Option<String>,
}

/// `[models.*]` sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsSection {
    pub anime: Option<ModelOverride>,
    pub general: Option<ModelOverride>,
}

/// Contents of `settings.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub defaults: DefaultsSection,
    pub inference: InferenceSection,
    pub models: ModelsSection,
}

impl Settings {
    /// Returns the artifact for `kind`, with any configured override applied
    /// on top of the built-in registry entry.
    #[must_use]
    pub fn artifact_for(&self, kind: ModelKind) -> ModelArtifact {
        let mut artifact = kind.default_artifact();
        let overrides = match kind {
            ModelKind::Anime => self.models.anime.as_ref(),
            ModelKind::General => self.models.general.as_ref(),
        };
        if let Some(overrides) = overrides {
            if let Some(url) = &overrides.url {
                artifact.url.clone_from(url);
            }
            if let Some(filename) = &overrides.filename {
                artifact.filename.clone_from(filename);
            }
        }
        artifact
    }

    /// Returns the tiling parameters, falling back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the tile size exceeds
    /// [`defaults::MAX_TILE_SIZE`] or the padding is not smaller than a
    /// non-zero tile size.
    pub fn tile_config(&self) -> Result<TileConfig> {
        let size = self
            .inference
            .tile_size
            .unwrap_or(TileConfig::DEFAULT_SIZE);
        let pad = self.inference.tile_pad.unwrap_or(TileConfig::DEFAULT_PAD);

        if size > defaults::MAX_TILE_SIZE {
            return Err(Error::Configuration(format!(
                "tile_size {size} exceeds maximum of {}",
                defaults::MAX_TILE_SIZE
            )));
        }
        if size != 0 && pad >= size {
            return Err(Error::Configuration(format!(
                "tile_pad {pad} must be smaller than tile_size {size}"
            )));
        }
        Ok(TileConfig { size, pad })
    }
}

/// Loads settings from `override_path` or the default location.
///
/// A missing file yields the defaults. An unreadable or unparsable file is
/// logged and also yields the defaults, so a broken settings file never
/// blocks a run.
#[must_use]
pub fn load(override_path: Option<PathBuf>) -> Settings {
    let Some(path) = crate::paths::settings_file(override_path) else {
        return Settings::default();
    };
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no settings file, using defaults");
        return Settings::default();
    }
    match load_from_path(&path) {
        Ok(settings) => settings,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "ignoring settings file");
            Settings::default()
        }
    }
}

/// Reads and parses a settings file.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read and
/// [`Error::Configuration`] if it is not valid TOML for [`Settings`].
pub fn load_from_path(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Writes settings to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if serialization fails or the file cannot be written.
pub fn save_to_path(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(settings)?;
    fs::write(path, content)?;
    Ok(())
}
