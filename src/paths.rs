// Platform locations for the config file and the log.
use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

pub const CONFIG_ENV: &str = "NEWSHOUND_CONFIG";

pub struct AppPaths;

impl AppPaths {
    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("com", "newshound", "newshound")
            .context("Could not determine a home directory")
    }

    /// `$NEWSHOUND_CONFIG` if set, otherwise `config.toml` in the platform config dir.
    pub fn config_file() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    pub fn log_dir() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.data_local_dir().to_path_buf())
    }
}
