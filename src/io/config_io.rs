use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::model::config::Config;

/// Name of the directory holding a tally board
pub const DATA_DIR_NAME: &str = ".tally";
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum DataDirError {
    #[error("not a tally directory: no .tally/ found (run `tally init`)")]
    NotInitialized,
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),
}

/// Walk up from `start` looking for a `.tally/` directory.
pub fn discover_data_dir(start: &Path) -> Result<PathBuf, DataDirError> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(DATA_DIR_NAME);
        if candidate.is_dir() {
            return Ok(candidate);
        }
        if !current.pop() {
            return Err(DataDirError::NotInitialized);
        }
    }
}

/// Resolve an explicit `-C` path: either the `.tally` directory itself or a
/// directory containing one.
pub fn resolve_data_dir(path: &Path) -> Result<PathBuf, DataDirError> {
    if !path.is_dir() {
        return Err(DataDirError::NotADirectory(path.to_path_buf()));
    }
    let nested = path.join(DATA_DIR_NAME);
    if nested.is_dir() {
        return Ok(nested);
    }
    if path.file_name().is_some_and(|name| name == DATA_DIR_NAME) {
        return Ok(path.to_path_buf());
    }
    Err(DataDirError::NotInitialized)
}

/// Read `config.toml` from the data directory. A missing file means defaults.
pub fn read_config(data_dir: &Path) -> Result<Config, ConfigError> {
    let path = data_dir.join(CONFIG_FILE);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(e) => return Err(ConfigError::ReadError { path, source: e }),
    };
    toml::from_str(&text).map_err(|e| ConfigError::ParseError { path, source: e })
}
