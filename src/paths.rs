// SPDX-License-Identifier: MPL-2.0
//! Centralized path management for application directories.
//!
//! # Path Resolution Order
//!
//! Paths are resolved in the following priority order:
//! 1. **Explicit override** - the `--models-dir` / `--config` arguments
//! 2. **Environment variables** (`ANIME_UPSCALER_MODELS_DIR`, `ANIME_UPSCALER_CONFIG_DIR`)
//! 3. **Platform default** - via `dirs` crate
//!
//! The explicit override has highest priority because it's the most specific -
//! when the caller passes a path, it should always be respected.

use std::path::PathBuf;

/// Application name used for directory naming.
const APP_NAME: &str = "AnimeUpscaler";

/// Subdirectory of the data directory holding model weights.
const MODELS_DIR_NAME: &str = "models";

/// Settings file name inside the config directory.
const SETTINGS_FILE: &str = "settings.toml";

/// Environment variable to override the model cache directory.
pub const ENV_MODELS_DIR: &str = "ANIME_UPSCALER_MODELS_DIR";

/// Environment variable to override the config directory.
pub const ENV_CONFIG_DIR: &str = "ANIME_UPSCALER_CONFIG_DIR";

/// Reads a non-empty path from an environment variable.
fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Returns the directory where model weights are cached.
///
/// # Resolution Order
///
/// 1. `override_path` parameter (if `Some`)
/// 2. `ANIME_UPSCALER_MODELS_DIR` environment variable (if set and non-empty)
/// 3. Platform-specific data directory:
///    - Linux: `~/.local/share/AnimeUpscaler/models/`
///    - macOS: `~/Library/Application Support/AnimeUpscaler/models/`
///    - Windows: `C:\Users\<User>\AppData\Roaming\AnimeUpscaler\models\`
///
/// Returns `None` if no data directory can be determined (rare edge case).
pub fn models_dir(override_path: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = override_path {
        return Some(path);
    }

    if let Some(path) = env_path(ENV_MODELS_DIR) {
        return Some(path);
    }

    dirs::data_dir().map(|mut path| {
        path.push(APP_NAME);
        path.push(MODELS_DIR_NAME);
        path
    })
}

/// Returns the application config directory.
///
/// # Resolution Order
///
/// 1. `ANIME_UPSCALER_CONFIG_DIR` environment variable (if set and non-empty)
/// 2. Platform-specific config directory with the app name appended
pub fn config_dir() -> Option<PathBuf> {
    if let Some(path) = env_path(ENV_CONFIG_DIR) {
        return Some(path);
    }

    dirs::config_dir().map(|mut path| {
        path.push(APP_NAME);
        path
    })
}

/// Returns the path of `settings.toml`.
///
/// An explicit `override_path` names the file itself, not its directory.
pub fn settings_file(override_path: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = override_path {
        return Some(path);
    }
    config_dir().map(|dir| dir.join(SETTINGS_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to prevent parallel tests from interfering with each other's env vars
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn override_takes_priority_over_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        std::env::set_var(ENV_MODELS_DIR, "/from/env");

        let dir = models_dir(Some(PathBuf::from("/from/cli")));
        assert_eq!(dir, Some(PathBuf::from("/from/cli")));

        std::env::remove_var(ENV_MODELS_DIR);
    }

    #[test]
    fn env_var_is_used_when_no_override() {
        let _lock = ENV_MUTEX.lock().unwrap();
        std::env::set_var(ENV_MODELS_DIR, "/from/env");

        assert_eq!(models_dir(None), Some(PathBuf::from("/from/env")));

        std::env::remove_var(ENV_MODELS_DIR);
    }

    #[test]
    fn empty_env_var_falls_back_to_platform_default() {
        let _lock = ENV_MUTEX.lock().unwrap();
        std::env::set_var(ENV_MODELS_DIR, "");

        if let Some(path) = models_dir(None) {
            assert!(path.ends_with("AnimeUpscaler/models"));
        }

        std::env::remove_var(ENV_MODELS_DIR);
    }

    #[test]
    fn settings_file_uses_config_dir_from_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        std::env::set_var(ENV_CONFIG_DIR, "/cfg");

        assert_eq!(
            settings_file(None),
            Some(PathBuf::from("/cfg/settings.toml"))
        );

        std::env::remove_var(ENV_CONFIG_DIR);
    }

    #[test]
    fn settings_file_override_is_used_verbatim() {
        let path = settings_file(Some(PathBuf::from("/tmp/custom.toml")));
        assert_eq!(path, Some(PathBuf::from("/tmp/custom.toml")));
    }
}
