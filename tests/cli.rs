// SPDX-License-Identifier: MPL-2.0
use std::process::{Command, Output};
use tempfile::tempdir;

fn run_cli(args: &[&str]) -> Output {
    let config_dir = tempdir().expect("failed to create temp dir");
    Command::new(env!("CARGO_BIN_EXE_anime_upscaler"))
        .args(args)
        .env("ANIME_UPSCALER_CONFIG_DIR", config_dir.path())
        .env("RUST_LOG", "error")
        .output()
        .expect("failed to run binary")
}

#[test]
fn help_prints_usage_and_succeeds() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("USAGE"));
}

#[test]
fn version_prints_package_version() {
    let output = run_cli(&["--version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn missing_input_is_a_usage_error() {
    let output = run_cli(&[]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn nonexistent_input_directory_is_a_configuration_error() {
    let output = run_cli(&["-i", "/definitely/not/a/real/dir"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn unknown_model_is_a_configuration_error() {
    let dir = tempdir().expect("failed to create temp dir");
    let output = run_cli(&["-i", dir.path().to_str().expect("utf-8 path"), "-m", "photo"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("photo"));
}

#[test]
fn zero_scale_is_a_configuration_error() {
    let dir = tempdir().expect("failed to create temp dir");
    let output = run_cli(&["-i", dir.path().to_str().expect("utf-8 path"), "-s", "0"]);
    assert_eq!(output.status.code(), Some(2));
}
