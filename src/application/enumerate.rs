// SPDX-License-Identifier: MPL-2.0
//! Job discovery.
//!
//! Scans a directory (non-recursively) for supported images and turns each
//! one into a pending [`ImageTask`].

use crate::domain::{ImageTask, RunConfig};
use crate::error::{Error, Result};
use crate::media;
use std::path::{Path, PathBuf};

/// The tasks discovered for one run, in filesystem order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobList {
    tasks: Vec<ImageTask>,
}

impl JobList {
    /// Scans `input_dir` for supported images whose results go to `output_dir`.
    ///
    /// Only regular files directly inside `input_dir` are considered. Files
    /// whose parent directory is named `upscaled` are excluded so that a
    /// previous run's output is never picked up as input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the directory cannot be read.
    pub fn discover(input_dir: &Path, output_dir: &Path) -> Result<Self> {
        let entries = std::fs::read_dir(input_dir).map_err(|e| {
            Error::Configuration(format!(
                "cannot read input directory {}: {e}",
                input_dir.display()
            ))
        })?;

        let mut tasks = Vec::new();
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable directory entry");
                    continue;
                }
            };

            if path.is_file() && media::is_supported_image(&path) && !is_in_output_dir(&path) {
                tasks.push(ImageTask::new(path, output_dir));
            }
        }

        tracing::debug!(count = tasks.len(), dir = %input_dir.display(), "discovered images");
        Ok(Self { tasks })
    }

    /// Returns the number of tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Checks if no task was discovered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Returns the tasks.
    #[must_use]
    pub fn tasks(&self) -> &[ImageTask] {
        &self.tasks
    }

    /// Returns the source paths of all tasks.
    #[must_use]
    pub fn sources(&self) -> Vec<PathBuf> {
        self.tasks.iter().map(|t| t.source().to_path_buf()).collect()
    }
}

impl IntoIterator for JobList {
    type Item = ImageTask;
    type IntoIter = std::vec::IntoIter<ImageTask>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.into_iter()
    }
}

impl From<Vec<ImageTask>> for JobList {
    fn from(tasks: Vec<ImageTask>) -> Self {
        Self { tasks }
    }
}

/// Checks if the file's immediate parent directory is an output directory.
fn is_in_output_dir(path: &Path) -> bool {
    path.parent()
        .and_then(Path::file_name)
        .is_some_and(|name| name == RunConfig::OUTPUT_DIR_NAME)
}
