// SPDX-License-Identifier: MPL-2.0
//! Per-file tasks and the run aggregate.

use std::fmt;
use std::path::{Path, PathBuf};

/// Category of a per-task failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The source file could not be read or decoded.
    Decode,
    /// The enhancer rejected or failed on the image.
    Inference,
    /// The result could not be written.
    Write,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Decode => f.write_str("decode"),
            FailureKind::Inference => f.write_str("inference"),
            FailureKind::Write => f.write_str("write"),
        }
    }
}

/// A failure recorded for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub path: PathBuf,
    pub kind: FailureKind,
    pub message: String,
}

impl TaskFailure {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} error): {}",
            self.path.display(),
            self.kind,
            self.message
        )
    }
}

/// Lifecycle of an [`ImageTask`].
///
/// Every task starts [`Pending`](TaskStatus::Pending) and ends in exactly one
/// of the other states.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TaskStatus {
    #[default]
    Pending,
    /// The destination already existed; nothing was done.
    SkippedExists,
    /// The source lives inside the output directory.
    SkippedLocation,
    /// The upscaled image was written.
    Done,
    Failed(TaskFailure),
}

impl TaskStatus {
    /// Returns `true` once the task has left the pending state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Pending)
    }
}

/// One input file and where its result goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTask {
    source: PathBuf,
    destination: PathBuf,
    status: TaskStatus,
}

impl ImageTask {
    /// Creates a pending task writing into `output_dir` under the source's
    /// file name.
    #[must_use]
    pub fn new(source: impl Into<PathBuf>, output_dir: &Path) -> Self {
        let source = source.into();
        let destination = match source.file_name() {
            Some(name) => output_dir.join(name),
            None => output_dir.to_path_buf(),
        };
        Self {
            source,
            destination,
            status: TaskStatus::Pending,
        }
    }

    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    #[must_use]
    pub fn status(&self) -> &TaskStatus {
        &self.status
    }

    /// Moves the task into its final state.
    pub fn finish(&mut self, status: TaskStatus) {
        debug_assert!(!self.status.is_terminal(), "task finished twice");
        self.status = status;
    }
}

/// Aggregate outcome of one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub done: usize,
    pub skipped_exists: usize,
    pub skipped_location: usize,
    pub failures: Vec<TaskFailure>,
}

impl RunSummary {
    /// Folds a finished task's status into the counts.
    ///
    /// Pending statuses are ignored.
    pub fn record(&mut self, status: &TaskStatus) {
        match status {
            TaskStatus::Pending => {}
            TaskStatus::SkippedExists => self.skipped_exists += 1,
            TaskStatus::SkippedLocation => self.skipped_location += 1,
            TaskStatus::Done => self.done += 1,
            TaskStatus::Failed(failure) => self.failures.push(failure.clone()),
        }
    }

    /// Total skipped tasks, regardless of reason.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped_exists + self.skipped_location
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Number of tasks accounted for.
    #[must_use]
    pub fn total(&self) -> usize {
        self.done + self.skipped() + self.failed()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} done, {} skipped, {} failed",
            self.done,
            self.skipped(),
            self.failed()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_keeps_file_name() {
        let task = ImageTask::new("/in/a.png", Path::new("/in/upscaled"));
        assert_eq!(task.destination(), Path::new("/in/upscaled/a.png"));
        assert_eq!(task.status(), &TaskStatus::Pending);
    }

    #[test]
    fn finish_sets_terminal_status() {
        let mut task = ImageTask::new("/in/a.png", Path::new("/in/upscaled"));
        task.finish(TaskStatus::Done);
        assert!(task.status().is_terminal());
    }

    #[test]
    fn summary_counts_each_status() {
        let mut summary = RunSummary::default();
        summary.record(&TaskStatus::Done);
        summary.record(&TaskStatus::Done);
        summary.record(&TaskStatus::SkippedExists);
        summary.record(&TaskStatus::SkippedLocation);
        summary.record(&TaskStatus::Failed(TaskFailure::new(
            "c.png",
            FailureKind::Decode,
            "empty file",
        )));
        summary.record(&TaskStatus::Pending);

        assert_eq!(summary.done, 2);
        assert_eq!(summary.skipped(), 2);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.total(), 5);
        assert_eq!(summary.to_string(), "2 done, 2 skipped, 1 failed");
    }

    #[test]
    fn failure_display_includes_path_and_kind() {
        let failure = TaskFailure::new("x/c.png", FailureKind::Write, "disk full");
        let text = failure.to_string();
        assert!(text.contains("c.png"));
        assert!(text.contains("write"));
        assert!(text.contains("disk full"));
    }
}
