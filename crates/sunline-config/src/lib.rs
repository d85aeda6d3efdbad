//! Shared configuration for the sunline gateway and CLI.
//!
//! Two independent inputs live here: the YAML webcam catalogue
//! (`webcams.yaml`, validated into `sunline_core` types) and the gateway's
//! runtime settings (TOML file + environment, merged with figment). The
//! CLI layers its flag overrides on top of both.

mod gateway;
mod webcams;

use std::path::PathBuf;

use thiserror::Error;

pub use gateway::{
    ALLOWLIST_ENV, GatewaySettings, config_path, load_gateway_settings, parse_host_list,
};
pub use webcams::{RootConfig, Settings, load_webcams_yaml, parse_webcams_yaml};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse YAML.")]
    Parse(#[source] serde_yaml::Error),

    /// The YAML parsed but does not describe a valid catalogue. Every
    /// problem found is listed, not just the first.
    #[error("Invalid webcam configuration.")]
    Invalid { issues: Vec<String> },

    #[error("Failed to load config at {}.", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl ConfigError {
    /// Validation issues, when this is an `Invalid` error.
    pub fn issues(&self) -> &[String] {
        match self {
            Self::Invalid { issues } => issues,
            _ => &[],
        }
    }
}
