// SPDX-License-Identifier: MPL-2.0
use anime_upscaler::application::{run_batch, ArtifactProvisioner};
use anime_upscaler::cli::{self, Command};
use anime_upscaler::config;
use anime_upscaler::domain::{device, ModelKind};
use anime_upscaler::error::{Error, Result};
use anime_upscaler::infrastructure::{OnnxUpscaleProcessor, OrtDeviceProbe};
use anime_upscaler::media::download::Progress;
use anime_upscaler::paths;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    init_tracing();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run() -> Result<()> {
    let args = match cli::parse_env()? {
        Command::Help => {
            print!("{}", cli::HELP);
            return Ok(());
        }
        Command::Version => {
            println!("anime_upscaler {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Command::Run(args) => args,
    };

    let settings = config::load(args.config.clone());
    let config = args.resolve(&settings)?;

    let device = device::resolve(config.device(), &OrtDeviceProbe);
    tracing::info!(%device, precision = %config.precision(), "selected device");

    let models_dir = paths::models_dir(args.models_dir.clone()).ok_or_else(|| {
        Error::Configuration("cannot determine the model cache directory".to_string())
    })?;
    let provisioner = ModelKind::ALL
        .into_iter()
        .fold(ArtifactProvisioner::new(models_dir), |p, kind| {
            p.with_artifact(kind, settings.artifact_for(kind))
        });

    let model_path = fetch_model(&provisioner, config.model())?;
    let enhancer = OnnxUpscaleProcessor::load(&model_path, &config, device)?;

    let summary = run_batch(&config, &enhancer, Some(batch_bar()))?;
    println!("{summary}");
    Ok(())
}

/// Makes sure the weights for `model` are cached, showing download progress.
fn fetch_model(provisioner: &ArtifactProvisioner, model: ModelKind) -> Result<PathBuf> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let bar = download_bar();
    let progress = {
        let bar = bar.clone();
        move |p: Progress| {
            if let Some(total) = p.total {
                bar.set_length(total);
            }
            bar.set_position(p.downloaded);
        }
    };

    let result = runtime.block_on(provisioner.ensure(model, progress));
    bar.finish_and_clear();
    result
}

fn download_bar() -> ProgressBar {
    let style = ProgressStyle::with_template(
        "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("=> ");
    ProgressBar::new(0)
        .with_style(style)
        .with_message("Downloading model")
}

fn batch_bar() -> ProgressBar {
    let style = ProgressStyle::with_template("[{bar:40.green/white}] {pos}/{len} ({eta}) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    ProgressBar::new(0).with_style(style)
}
