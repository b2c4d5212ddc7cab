// SPDX-License-Identifier: MPL-2.0
//! Command-line parsing.
//!
//! Options are read with `pico-args`, then merged with the settings file:
//! a value given on the command line wins over `settings.toml`, which wins
//! over the built-in defaults.

use crate::config::Settings;
use crate::domain::run_config::scale_bounds;
use crate::domain::{DevicePreference, ModelKind, Precision, RunConfig};
use crate::error::{Error, Result};
use pico_args::Arguments;
use std::ffi::OsString;
use std::path::PathBuf;

/// Usage text printed for `--help`.
pub const HELP: &str = "\
Batch upscaler for manga, manhwa and anime images

USAGE:
  anime_upscaler -i <DIR> [OPTIONS]

OPTIONS:
  -i, --input <DIR>       Directory containing the images to upscale
  -s, --scale <N>         Output scale factor, 1 or more [default: 4]
  -m, --model <MODEL>     anime | general [default: anime]
  -d, --device <DEVICE>   auto | cpu | cuda | mps [default: auto]
      --no-face-enhance   Do not request face enhancement
      --fp32              Use full precision instead of half precision
      --models-dir <DIR>  Directory where model weights are cached
      --config <FILE>     Settings file to use instead of the default one
  -h, --help              Print this help
  -V, --version           Print version

Upscaled images are written to <DIR>/upscaled. Files already present there
are skipped, so an interrupted run can be resumed by running it again.
";

/// What the user asked the binary to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(CliArgs),
    Help,
    Version,
}

/// Raw options of a run, before merging with the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub input: PathBuf,
    pub scale: Option<u32>,
    pub model: Option<String>,
    pub device: Option<String>,
    pub no_face_enhance: bool,
    pub fp32: bool,
    pub models_dir: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

/// Parses the process arguments.
///
/// # Errors
///
/// Returns [`Error::Configuration`] for missing, malformed or unknown
/// arguments.
pub fn parse_env() -> Result<Command> {
    parse(Arguments::from_env())
}

/// Parses an explicit argument list, without the program name.
///
/// # Errors
///
/// Returns [`Error::Configuration`] for missing, malformed or unknown
/// arguments.
pub fn parse_from<I, S>(args: I) -> Result<Command>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    parse(Arguments::from_vec(args.into_iter().map(Into::into).collect()))
}

fn parse(mut args: Arguments) -> Result<Command> {
    if args.contains(["-h", "--help"]) {
        return Ok(Command::Help);
    }
    if args.contains(["-V", "--version"]) {
        return Ok(Command::Version);
    }

    let no_face_enhance = args.contains("--no-face-enhance");
    let no_face_enhance_alias = args.contains("--no_face_enhance");

    let cli = CliArgs {
        input: args
            .opt_value_from_str(["-i", "--input"])
            .map_err(usage_error)?
            .ok_or_else(|| Error::Configuration("missing required option --input".to_string()))?,
        scale: args
            .opt_value_from_str(["-s", "--scale"])
            .map_err(usage_error)?,
        model: args
            .opt_value_from_str(["-m", "--model"])
            .map_err(usage_error)?,
        device: args
            .opt_value_from_str(["-d", "--device"])
            .map_err(usage_error)?,
        no_face_enhance: no_face_enhance || no_face_enhance_alias,
        fp32: args.contains("--fp32"),
        models_dir: args
            .opt_value_from_str("--models-dir")
            .map_err(usage_error)?,
        config: args.opt_value_from_str("--config").map_err(usage_error)?,
    };

    let remaining = args.finish();
    if !remaining.is_empty() {
        let unknown: Vec<String> = remaining
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        return Err(Error::Configuration(format!(
            "unexpected arguments: {}",
            unknown.join(" ")
        )));
    }

    Ok(Command::Run(cli))
}

fn usage_error(err: pico_args::Error) -> Error {
    Error::Configuration(err.to_string())
}

impl CliArgs {
    /// Merges these options with `settings` into a validated run
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an unknown model or device, an
    /// out-of-range scale, invalid tiling settings or an unusable input
    /// directory.
    pub fn resolve(&self, settings: &Settings) -> Result<RunConfig> {
        let model = match self.model.as_deref().or(settings.defaults.model.as_deref()) {
            Some(name) => name.parse::<ModelKind>()?,
            None => ModelKind::default(),
        };
        let device = match self
            .device
            .as_deref()
            .or(settings.defaults.device.as_deref())
        {
            Some(name) => name.parse::<DevicePreference>()?,
            None => DevicePreference::default(),
        };
        let scale = self
            .scale
            .or(settings.defaults.scale)
            .unwrap_or(scale_bounds::DEFAULT);
        let full_precision = self.fp32 || settings.defaults.full_precision.unwrap_or(false);

        let config = RunConfig::new(
            &self.input,
            scale,
            model,
            device,
            Precision::from_full_precision_flag(full_precision),
        )?
        .with_face_enhance(!self.no_face_enhance)
        .with_tiling(settings.tile_config()?);

        Ok(config)
    }
}
