// SPDX-License-Identifier: MPL-2.0
//! Sequential batch execution.
//!
//! Each task moves from pending to exactly one terminal state. A failing
//! task is logged and recorded; it never stops the remaining tasks.

use crate::application::enumerate::JobList;
use crate::application::port::{EnhanceError, ImageEnhancer};
use crate::domain::{FailureKind, ImageTask, RunSummary, TaskFailure, TaskStatus};
use crate::error::{Error, Result};
use crate::media;
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};

/// Runs tasks one after another through an enhancer.
pub struct BatchRunner<'a> {
    enhancer: &'a dyn ImageEnhancer,
    output_dir: PathBuf,
    progress: Option<ProgressBar>,
}

impl<'a> BatchRunner<'a> {
    /// Creates a runner writing results into `output_dir`.
    #[must_use]
    pub fn new(enhancer: &'a dyn ImageEnhancer, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            enhancer,
            output_dir: output_dir.into(),
            progress: None,
        }
    }

    /// Reports per-task progress on `bar`. Its length is set by [`run`](Self::run).
    #[must_use]
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Processes every task and returns the aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Inference`] if the enhancer has no loaded model and
    /// [`Error::Write`] if the output directory cannot be created.
    /// Per-task failures are recorded in the summary instead.
    pub fn run(&self, jobs: JobList) -> Result<RunSummary> {
        if !self.enhancer.is_ready() {
            return Err(Error::Inference(EnhanceError::ModelNotReady));
        }
        let caps = self.enhancer.capabilities();
        tracing::info!(
            model = caps.name,
            scale = caps.scale_factor,
            tile_size = ?caps.tile_size,
            half_precision = caps.half_precision,
            tasks = jobs.len(),
            "starting batch"
        );

        std::fs::create_dir_all(&self.output_dir).map_err(|e| {
            Error::Write(format!(
                "cannot create output directory {}: {e}",
                self.output_dir.display()
            ))
        })?;

        if let Some(bar) = &self.progress {
            bar.set_length(jobs.len() as u64);
        }

        let mut summary = RunSummary::default();
        for mut task in jobs {
            if let Some(bar) = &self.progress {
                bar.set_message(file_label(task.source()));
            }

            self.run_task(&mut task);
            summary.record(task.status());

            if let Some(bar) = &self.progress {
                bar.inc(1);
            }
        }

        if let Some(bar) = &self.progress {
            bar.finish_and_clear();
        }
        Ok(summary)
    }

    /// Drives one task to its terminal state.
    pub fn run_task(&self, task: &mut ImageTask) {
        let status = self.evaluate(task);
        match &status {
            TaskStatus::Done => {
                tracing::info!(source = %task.source().display(), "upscaled");
            }
            TaskStatus::SkippedExists => {
                tracing::info!(
                    destination = %task.destination().display(),
                    "output exists, skipping"
                );
            }
            TaskStatus::SkippedLocation => {
                tracing::debug!(source = %task.source().display(), "inside output directory, skipping");
            }
            TaskStatus::Failed(failure) => {
                tracing::warn!(
                    path = %failure.path.display(),
                    kind = %failure.kind,
                    "{}",
                    failure.message
                );
            }
            TaskStatus::Pending => {}
        }
        task.finish(status);
    }

    fn evaluate(&self, task: &ImageTask) -> TaskStatus {
        let source = task.source();
        if source.parent() == Some(self.output_dir.as_path()) {
            return TaskStatus::SkippedLocation;
        }
        if task.destination().exists() {
            return TaskStatus::SkippedExists;
        }

        let fail = |kind: FailureKind, message: String| {
            TaskStatus::Failed(TaskFailure::new(source, kind, message))
        };

        let image = match media::load_image(source) {
            Ok(image) => media::normalize_channels(image),
            Err(err) => return fail(FailureKind::Decode, err.to_string()),
        };

        let upscaled = match self.enhancer.enhance(&image) {
            Ok(upscaled) => upscaled,
            Err(err) => return fail(FailureKind::Inference, err.to_string()),
        };

        match media::save_image_atomic(upscaled, task.destination()) {
            Ok(()) => TaskStatus::Done,
            Err(err) => fail(FailureKind::Write, err.to_string()),
        }
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::port::EnhancerCapabilities;
    use image_rs::{DynamicImage, RgbImage};
    use std::fs;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Doubles the image size and records every call.
    struct RecordingEnhancer {
        calls: Mutex<usize>,
        fail: bool,
    }

    impl RecordingEnhancer {
        fn new() -> Self {
            Self {
                calls: Mutex::new(0),
                fail: false,
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    impl ImageEnhancer for RecordingEnhancer {
        fn enhance(&self, image: &DynamicImage) -> std::result::Result<DynamicImage, EnhanceError> {
            *self.calls.lock().unwrap() += 1;
            if self.fail {
                return Err(EnhanceError::InferenceFailed("out of memory".into()));
            }
            Ok(image.resize_exact(
                image.width() * 2,
                image.height() * 2,
                image_rs::imageops::FilterType::Nearest,
            ))
        }

        fn is_ready(&self) -> bool {
            true
        }

        fn capabilities(&self) -> EnhancerCapabilities {
            EnhancerCapabilities::new("recording", 2)
        }
    }

    /// Returns an empty image for 1x1 inputs, which no encoder accepts.
    struct EmptyForTinyInputs;

    impl ImageEnhancer for EmptyForTinyInputs {
        fn enhance(&self, image: &DynamicImage) -> std::result::Result<DynamicImage, EnhanceError> {
            if image.width() == 1 {
                return Ok(DynamicImage::new_rgb8(0, 0));
            }
            Ok(image.clone())
        }

        fn is_ready(&self) -> bool {
            true
        }

        fn capabilities(&self) -> EnhancerCapabilities {
            EnhancerCapabilities::new("empty", 1)
        }
    }

    struct Unloaded;

    impl ImageEnhancer for Unloaded {
        fn enhance(&self, _image: &DynamicImage) -> std::result::Result<DynamicImage, EnhanceError> {
            Err(EnhanceError::ModelNotReady)
        }

        fn is_ready(&self) -> bool {
            false
        }

        fn capabilities(&self) -> EnhancerCapabilities {
            EnhancerCapabilities::new("unloaded", 1)
        }
    }

    fn create_test_image(dir: &Path, name: &str) -> PathBuf {
        create_sized_image(dir, name, 4, 3)
    }

    fn create_sized_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
            .save(&path)
            .expect("failed to write test image");
        path
    }

    #[test]
    fn successful_task_writes_upscaled_output() {
        let dir = tempdir().expect("failed to create temp dir");
        let source = create_test_image(dir.path(), "a.png");
        let output = dir.path().join("upscaled");
        let enhancer = RecordingEnhancer::new();

        let summary = BatchRunner::new(&enhancer, &output)
            .run(JobList::from(vec![ImageTask::new(&source, &output)]))
            .expect("run should succeed");

        assert_eq!(summary.done, 1);
        let written = image_rs::open(output.join("a.png")).expect("output readable");
        assert_eq!((written.width(), written.height()), (8, 6));
    }

    #[test]
    fn existing_destination_is_skipped_without_inference() {
        let dir = tempdir().expect("failed to create temp dir");
        let source = create_test_image(dir.path(), "a.png");
        let output = dir.path().join("upscaled");
        fs::create_dir(&output).expect("failed to create output dir");
        fs::write(output.join("a.png"), b"previous").expect("failed to write output");
        let enhancer = RecordingEnhancer::new();

        let summary = BatchRunner::new(&enhancer, &output)
            .run(JobList::from(vec![ImageTask::new(&source, &output)]))
            .expect("run should succeed");

        assert_eq!(summary.skipped_exists, 1);
        assert_eq!(enhancer.calls(), 0);
        assert_eq!(fs::read(output.join("a.png")).expect("read"), b"previous");
    }

    #[test]
    fn source_inside_output_dir_is_skipped() {
        let dir = tempdir().expect("failed to create temp dir");
        let output = dir.path().join("upscaled");
        fs::create_dir(&output).expect("failed to create output dir");
        let source = create_test_image(&output, "a.png");
        let enhancer = RecordingEnhancer::new();

        let mut task = ImageTask::new(&source, &output.join("nested"));
        BatchRunner::new(&enhancer, &output).run_task(&mut task);

        assert_eq!(task.status(), &TaskStatus::SkippedLocation);
        assert_eq!(enhancer.calls(), 0);
    }

    #[test]
    fn enhancer_failure_is_recorded_and_run_continues() {
        let dir = tempdir().expect("failed to create temp dir");
        let a = create_test_image(dir.path(), "a.png");
        let b = create_test_image(dir.path(), "b.png");
        let output = dir.path().join("upscaled");
        let enhancer = RecordingEnhancer {
            calls: Mutex::new(0),
            fail: true,
        };

        let jobs = JobList::from(vec![ImageTask::new(&a, &output), ImageTask::new(&b, &output)]);
        let summary = BatchRunner::new(&enhancer, &output)
            .run(jobs)
            .expect("run should succeed");

        assert_eq!(summary.failed(), 2);
        assert_eq!(enhancer.calls(), 2);
        assert!(summary
            .failures
            .iter()
            .all(|f| f.kind == FailureKind::Inference));
        assert!(!output.join("a.png").exists());
    }

    #[test]
    fn write_failure_is_recorded_and_next_task_completes() {
        let dir = tempdir().expect("failed to create temp dir");
        let tiny = create_sized_image(dir.path(), "a.png", 1, 1);
        let normal = create_test_image(dir.path(), "b.png");
        let output = dir.path().join("upscaled");

        let jobs = JobList::from(vec![
            ImageTask::new(&tiny, &output),
            ImageTask::new(&normal, &output),
        ]);
        let summary = BatchRunner::new(&EmptyForTinyInputs, &output)
            .run(jobs)
            .expect("run should succeed");

        assert_eq!(summary.done, 1);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.failures[0].kind, FailureKind::Write);
        assert_eq!(summary.failures[0].path, tiny);

        let mut names: Vec<String> = fs::read_dir(&output)
            .expect("output dir readable")
            .map(|entry| {
                entry
                    .expect("dir entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        names.sort();
        assert_eq!(names, vec!["b.png".to_string()]);
    }

    #[test]
    fn unloaded_enhancer_stops_the_run() {
        let dir = tempdir().expect("failed to create temp dir");
        let source = create_test_image(dir.path(), "a.png");
        let output = dir.path().join("upscaled");

        let err = BatchRunner::new(&Unloaded, &output)
            .run(JobList::from(vec![ImageTask::new(&source, &output)]))
            .unwrap_err();

        assert!(matches!(err, Error::Inference(EnhanceError::ModelNotReady)));
        assert!(!output.exists());
    }

    #[test]
    fn output_dir_creation_failure_is_fatal() {
        let dir = tempdir().expect("failed to create temp dir");
        let blocker = dir.path().join("upscaled");
        fs::write(&blocker, b"a file, not a directory").expect("failed to write file");
        let enhancer = RecordingEnhancer::new();

        let err = BatchRunner::new(&enhancer, &blocker)
            .run(JobList::default())
            .unwrap_err();
        assert!(matches!(err, Error::Write(_)));
    }

    #[test]
    fn progress_bar_tracks_every_task() {
        let dir = tempdir().expect("failed to create temp dir");
        let a = create_test_image(dir.path(), "a.png");
        let output = dir.path().join("upscaled");
        let enhancer = RecordingEnhancer::new();
        let bar = ProgressBar::hidden();

        BatchRunner::new(&enhancer, &output)
            .with_progress(bar.clone())
            .run(JobList::from(vec![ImageTask::new(&a, &output)]))
            .expect("run should succeed");

        assert_eq!(bar.position(), 1);
        assert_eq!(bar.length(), Some(1));
    }
}
