pub mod types;

use crate::error::{ConfigError, Result};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = ".workload-audit.toml";

/// Get the global config file path (~/.workload-audit.toml)
pub fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(CONFIG_FILE_NAME))
}

/// Get the local config file path (dir/.workload-audit.toml)
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE_NAME)
}

/// Load configuration from file or use defaults.
///
/// An explicit path must exist and parse. Otherwise the local config in
/// `dir` is tried first, then the global config.
pub fn load_config(explicit: Option<&Path>, dir: Option<&Path>) -> Result<types::Config> {
    if let Some(path) = explicit {
        return read_config(path);
    }

    let candidates = dir
        .map(local_config_path)
        .into_iter()
        .chain(global_config_path());
    for path in candidates {
        if path.exists() {
            log::debug!("Using config {}", path.display());
            return read_config(&path);
        }
    }

    Ok(types::Config::default())
}

/// Read and parse one config file.
pub fn read_config(path: &Path) -> Result<types::Config> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = toml::from_str(&content)
        .map_err(|e| ConfigError::ParsingFailed(format!("{}: {}", path.display(), e)))?;
    Ok(config)
}
