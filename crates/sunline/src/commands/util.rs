//! Shared helpers for command handlers.

use std::path::{Path, PathBuf};

use url::Url;

use sunline_config::{RootConfig, load_webcams_yaml};
use sunline_core::Webcam;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Catalogue read when `--config` / `SUNLINE_CONFIG` is not given.
pub const DEFAULT_CATALOGUE: &str = "webcams.yaml";

pub fn catalogue_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOGUE))
}

pub fn load_catalogue(path: &Path) -> Result<RootConfig, CliError> {
    load_webcams_yaml(path).map_err(|e| CliError::config(path.display().to_string(), e))
}

/// Gateway base URL: `--worker-url` wins over `settings.worker_base_url`.
pub fn worker_base_url(global: &GlobalOpts, config: &RootConfig) -> Result<String, CliError> {
    match global.worker_url.as_deref() {
        Some(raw) => {
            let url = Url::parse(raw).map_err(|e| CliError::Validation {
                field: "worker-url".into(),
                reason: format!("invalid URL '{raw}': {e}"),
            })?;
            Ok(url.into())
        }
        None => Ok(config.settings.worker_base_url.to_string()),
    }
}

pub fn find_webcam<'a>(config: &'a RootConfig, id: &str) -> Result<&'a Webcam, CliError> {
    config.webcam(id).ok_or_else(|| CliError::WebcamNotFound { id: id.into() })
}
