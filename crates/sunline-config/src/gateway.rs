// ── Gateway settings ──
//
// Runtime knobs for the edge image gateway. Sources, lowest priority
// first: built-in defaults, the TOML config file, `SUNLINE_GATEWAY_*`
// environment variables, then `ALLOWLIST_EXTRA`. CLI flags are applied by
// the binary after loading.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ConfigError;

/// Extra allowlisted hosts, comma or whitespace separated.
pub const ALLOWLIST_ENV: &str = "ALLOWLIST_EXTRA";

const ENV_PREFIX: &str = "SUNLINE_GATEWAY_";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GatewaySettings {
    /// Socket address the gateway binds.
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Hosts allowed in addition to the webcam catalogue's source hosts.
    #[serde(default)]
    pub allowlist_extra: Vec<String>,

    /// Upper bound for a single upstream fetch, in seconds.
    #[serde(default = "default_upstream_timeout")]
    pub upstream_timeout_secs: u64,

    /// Redirect hops followed per upstream fetch.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Webcam catalogue supplying the baseline allowlist.
    pub webcams: Option<PathBuf>,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            allowlist_extra: Vec::new(),
            upstream_timeout_secs: default_upstream_timeout(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
            webcams: None,
        }
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8787))
}
fn default_upstream_timeout() -> u64 {
    10
}
fn default_max_redirects() -> usize {
    5
}
fn default_user_agent() -> String {
    concat!("sunline-gateway/", env!("CARGO_PKG_VERSION")).into()
}

impl GatewaySettings {
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    /// Extract settings from an assembled figment and validate them.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let mut settings: Self = figment.extract()?;
        settings.allowlist_extra = normalize_hosts(settings.allowlist_extra);
        settings.validate()?;
        Ok(settings)
    }

    /// Append hosts from an `ALLOWLIST_EXTRA`-style list.
    pub fn extend_allowlist(&mut self, raw: &str) {
        let mut hosts = std::mem::take(&mut self.allowlist_extra);
        hosts.extend(parse_host_list(raw));
        self.allowlist_extra = normalize_hosts(hosts);
    }

    /// Render the effective settings as TOML, e.g. to seed a config file.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upstream_timeout_secs == 0 {
            return Err(ConfigError::Validation {
                field: "upstream_timeout_secs".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "user_agent".into(),
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

/// Split a host list on commas and whitespace, lower-casing each entry.
pub fn parse_host_list(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}

fn normalize_hosts(hosts: Vec<String>) -> Vec<String> {
    let mut hosts: Vec<String> = hosts
        .into_iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .filter(|h| !h.is_empty())
        .collect();
    hosts.sort();
    hosts.dedup();
    hosts
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the gateway config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("ch", "sunline", "sunline").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("gateway.toml");
            p
        },
        |dirs| dirs.config_dir().join("gateway.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("sunline");
    p
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load gateway settings from file + environment.
///
/// A missing config file is not an error; defaults apply.
pub fn load_gateway_settings(path: Option<&Path>) -> Result<GatewaySettings, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    debug!(path = %path.display(), "loading gateway settings");

    let figment = Figment::new()
        .merge(Serialized::defaults(GatewaySettings::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed(ENV_PREFIX));

    let mut settings = GatewaySettings::from_figment(&figment)?;
    if let Ok(extra) = std::env::var(ALLOWLIST_ENV) {
        settings.extend_allowlist(&extra);
    }
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn from_toml(toml: &str) -> Result<GatewaySettings, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(GatewaySettings::default()))
            .merge(Toml::string(toml));
        GatewaySettings::from_figment(&figment)
    }

    #[test]
    fn defaults_apply_without_file() {
        let settings = from_toml("").unwrap();
        assert_eq!(settings, GatewaySettings::default());
        assert_eq!(settings.listen.port(), 8787);
        assert_eq!(settings.upstream_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn file_values_override_defaults() {
        let settings = from_toml(
            r#"
listen = "0.0.0.0:9000"
allowlist_extra = ["Cams.Example.org", "cams.example.org", " "]
upstream_timeout_secs = 3
"#,
        )
        .unwrap();
        assert_eq!(settings.listen, "0.0.0.0:9000".parse().unwrap());
        assert_eq!(settings.allowlist_extra, vec!["cams.example.org"]);
        assert_eq!(settings.upstream_timeout_secs, 3);
        assert_eq!(settings.max_redirects, 5);
    }

    #[test]
    fn rejects_zero_timeout() {
        let err = from_toml("upstream_timeout_secs = 0").unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation { ref field, .. } if field == "upstream_timeout_secs"),
            "{err:?}"
        );
    }

    #[test]
    fn host_list_splits_on_commas_and_whitespace() {
        assert_eq!(
            parse_host_list("127.0.0.1, Example.com\nfoo.test,,"),
            vec!["127.0.0.1", "example.com", "foo.test"]
        );
        assert!(parse_host_list("  ").is_empty());
    }

    #[test]
    fn extend_allowlist_merges_and_dedups() {
        let mut settings = GatewaySettings {
            allowlist_extra: vec!["b.test".into()],
            ..GatewaySettings::default()
        };
        settings.extend_allowlist("a.test,B.test");
        assert_eq!(settings.allowlist_extra, vec!["a.test", "b.test"]);
    }

    #[test]
    fn toml_output_reloads_to_same_settings() {
        let settings = GatewaySettings {
            allowlist_extra: vec!["cams.example.org".into()],
            upstream_timeout_secs: 4,
            ..GatewaySettings::default()
        };
        let rendered = settings.to_toml().unwrap();
        assert!(rendered.contains("upstream_timeout_secs = 4"), "{rendered}");
        assert_eq!(from_toml(&rendered).unwrap(), settings);
    }
}
