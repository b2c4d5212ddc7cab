// SPDX-License-Identifier: MPL-2.0
//! One full batch: discover, then run.

use crate::application::batch::BatchRunner;
use crate::application::enumerate::JobList;
use crate::application::port::ImageEnhancer;
use crate::domain::{RunConfig, RunSummary};
use crate::error::Result;
use indicatif::ProgressBar;

/// Discovers the images of `config.input_dir()` and upscales them into
/// `config.output_dir()`.
///
/// An input directory without candidates logs a notice and returns an empty
/// summary.
///
/// # Errors
///
/// Returns [`Error::Configuration`](crate::error::Error::Configuration) if the
/// input directory cannot be read and
/// [`Error::Write`](crate::error::Error::Write) if the output directory cannot
/// be created.
pub fn run_batch(
    config: &RunConfig,
    enhancer: &dyn ImageEnhancer,
    progress: Option<ProgressBar>,
) -> Result<RunSummary> {
    let output_dir = config.output_dir();
    let jobs = JobList::discover(config.input_dir(), &output_dir)?;

    if jobs.is_empty() {
        tracing::info!(dir = %config.input_dir().display(), "no images found");
        return Ok(RunSummary::default());
    }

    tracing::info!(
        count = jobs.len(),
        model = %config.model(),
        scale = %config.scale(),
        "processing images"
    );
    if config.face_enhance() && config.model().supports_face_enhance() {
        tracing::info!("face enhancement requested but no face restorer is available");
    }

    let mut runner = BatchRunner::new(enhancer, output_dir);
    if let Some(bar) = progress {
        runner = runner.with_progress(bar);
    }
    runner.run(jobs)
}
