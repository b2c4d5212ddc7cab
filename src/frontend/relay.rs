// SPDX-License-Identifier: MPL-2.0
//! Child-process relay for graphical front-ends.
//!
//! A front-end never runs the pipeline in-process. It builds a
//! [`RunRequest`], launches the command-line tool with [`spawn`] and
//! receives its output line by line. Communication is one-way: there is no
//! cancellation channel.

use crate::domain::{DevicePreference, ModelKind, ScaleFactor};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

/// Options a front-end can set for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub input_dir: PathBuf,
    pub scale: ScaleFactor,
    pub model: ModelKind,
    pub device: DevicePreference,
    pub face_enhance: bool,
    pub full_precision: bool,
    pub models_dir: Option<PathBuf>,
}

impl RunRequest {
    /// Creates a request with the command-line defaults.
    #[must_use]
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            scale: ScaleFactor::default(),
            model: ModelKind::default(),
            device: DevicePreference::default(),
            face_enhance: true,
            full_precision: false,
            models_dir: None,
        }
    }

    /// Builds the argument vector for the command-line tool.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "--input".to_string(),
            self.input_dir.to_string_lossy().into_owned(),
            "--scale".to_string(),
            self.scale.value().to_string(),
            "--model".to_string(),
            self.model.as_str().to_string(),
            "--device".to_string(),
            self.device.to_string(),
        ];
        if !self.face_enhance {
            args.push("--no-face-enhance".to_string());
        }
        if self.full_precision {
            args.push("--fp32".to_string());
        }
        if let Some(dir) = &self.models_dir {
            args.push("--models-dir".to_string());
            args.push(dir.to_string_lossy().into_owned());
        }
        args
    }
}

/// How the child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Success,
    /// Non-zero exit. `code` is `None` when the process was killed by a signal.
    Failed { code: Option<i32> },
}

/// A message from the child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    /// One line of stdout or stderr, without the line terminator.
    Line(String),
    /// The process has exited. Always the last event.
    Finished(ExitOutcome),
}

/// Launches `program` with the arguments of `request` and relays its merged
/// stdout and stderr.
///
/// Lines from the two streams arrive in the order they are read; relative
/// ordering across streams is not guaranteed. Must be called from within a
/// tokio runtime.
///
/// # Errors
///
/// Returns an I/O error if the process cannot be started.
pub fn spawn(
    program: &Path,
    request: &RunRequest,
) -> std::io::Result<mpsc::UnboundedReceiver<RelayEvent>> {
    spawn_command(Command::new(program).args(request.to_args()))
}

/// Relays an arbitrary prepared command. See [`spawn`].
///
/// # Errors
///
/// Returns an I/O error if the process cannot be started.
pub fn spawn_command(command: &mut Command) -> std::io::Result<mpsc::UnboundedReceiver<RelayEvent>> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(false)
        .spawn()?;

    let (tx, rx) = mpsc::unbounded_channel();
    let stdout = child.stdout.take().map(|s| tokio::spawn(forward_lines(s, tx.clone())));
    let stderr = child.stderr.take().map(|s| tokio::spawn(forward_lines(s, tx.clone())));

    tokio::spawn(async move {
        for reader in [stdout, stderr].into_iter().flatten() {
            let _ = reader.await;
        }
        let outcome = match child.wait().await {
            Ok(status) if status.success() => ExitOutcome::Success,
            Ok(status) => ExitOutcome::Failed {
                code: status.code(),
            },
            Err(err) => {
                tracing::warn!(error = %err, "failed to wait for child process");
                ExitOutcome::Failed { code: None }
            }
        };
        let _ = tx.send(RelayEvent::Finished(outcome));
    });

    Ok(rx)
}

/// Forwards every line of `stream` until end of file.
///
/// Invalid UTF-8 is replaced with U+FFFD. The stream is drained to the end
/// even when nobody receives the lines.
async fn forward_lines<R>(stream: R, tx: mpsc::UnboundedSender<RelayEvent>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = decode_line(&buf);
                let _ = tx.send(RelayEvent::Line(line));
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to read child output");
                break;
            }
        }
    }
}

/// Strips the line terminator and decodes lossily.
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}
