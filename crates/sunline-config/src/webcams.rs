// ── Webcam catalogue ──
//
// `webcams.yaml` is parsed into a loose raw shape first, then validated
// field by field into `sunline_core` types. Validation keeps going after
// the first problem so the user sees every issue at once.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use sunline_core::{ChCoord, SourceKind, SourceUrl, Webcam, WebcamSource};

use crate::ConfigError;

// ── Validated types ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    /// Observer position used for distance and bearing.
    pub user_coord_ch2056: ChCoord,
    /// Base URL of the edge image gateway.
    pub worker_base_url: Url,
    pub refresh_minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RootConfig {
    pub settings: Settings,
    pub webcams: Vec<Webcam>,
}

impl RootConfig {
    pub fn webcam(&self, id: &str) -> Option<&Webcam> {
        self.webcams.iter().find(|w| w.id == id)
    }

    /// Hostnames of every configured source, lower-cased.
    ///
    /// This is the gateway's baseline allowlist.
    pub fn source_hosts(&self) -> BTreeSet<String> {
        self.webcams.iter().filter_map(|w| w.source.host()).collect()
    }
}

// ── Raw YAML shape ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawRoot {
    settings: Option<RawSettings>,
    webcams: Option<Vec<RawWebcam>>,
}

#[derive(Debug, Deserialize)]
struct RawSettings {
    user_coord_ch2056: Option<RawCoord>,
    worker_base_url: Option<String>,
    refresh_minutes: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawCoord {
    e: Option<f64>,
    n: Option<f64>,
}

/// Ids may be written as bare numbers in YAML.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Float(f64),
    Text(String),
}

impl RawId {
    #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
    fn into_string(self) -> String {
        match self {
            Self::Int(n) => n.to_string(),
            Self::Float(f) if f.is_finite() && f.fract() == 0.0 => (f as i64).to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawWebcam {
    id: Option<RawId>,
    name: Option<String>,
    elevation_m_asl: Option<f64>,
    coord_ch2056: Option<RawCoord>,
    source: Option<RawSource>,
    worker_bypass: Option<bool>,
    attribution: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    kind: Option<String>,
    url: Option<String>,
    page: Option<String>,
    selector: Option<String>,
}

// ── Loading ─────────────────────────────────────────────────────────

/// Parse and validate a webcam catalogue from YAML text.
pub fn parse_webcams_yaml(content: &str) -> Result<RootConfig, ConfigError> {
    let value: serde_yaml::Value = serde_yaml::from_str(content).map_err(ConfigError::Parse)?;
    let raw: RawRoot = serde_yaml::from_value(value).map_err(|e| ConfigError::Invalid {
        issues: vec![e.to_string()],
    })?;

    let mut issues = Issues::default();
    let settings = match raw.settings {
        Some(s) => validate_settings(s, &mut issues),
        None => {
            issues.push("settings", "is required");
            None
        }
    };

    let raw_webcams = raw.webcams.unwrap_or_default();
    if raw_webcams.is_empty() {
        issues.push("webcams", "must contain at least one webcam");
    }

    let mut seen = HashSet::new();
    let mut webcams = Vec::with_capacity(raw_webcams.len());
    for (index, raw) in raw_webcams.into_iter().enumerate() {
        let path = format!("webcams[{index}]");
        if let Some(webcam) = validate_webcam(raw, &path, &mut issues) {
            if !seen.insert(webcam.id.clone()) {
                issues.push(&format!("{path}.id"), &format!("duplicate id '{}'", webcam.id));
            }
            webcams.push(webcam);
        }
    }

    match settings {
        Some(settings) if !issues.any() => {
            debug!(webcams = webcams.len(), "webcam catalogue validated");
            Ok(RootConfig { settings, webcams })
        }
        _ => Err(ConfigError::Invalid {
            issues: issues.into_inner(),
        }),
    }
}

/// Read and validate a webcam catalogue from disk.
pub fn load_webcams_yaml(path: &Path) -> Result<RootConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Load {
        path: path.to_path_buf(),
        source,
    })?;
    parse_webcams_yaml(&content)
}

// ── Validation ──────────────────────────────────────────────────────

#[derive(Default)]
struct Issues(Vec<String>);

impl Issues {
    fn push(&mut self, path: &str, message: &str) {
        self.0.push(format!("{path}: {message}"));
    }

    fn any(&self) -> bool {
        !self.0.is_empty()
    }

    fn into_inner(self) -> Vec<String> {
        self.0
    }
}

fn validate_settings(raw: RawSettings, issues: &mut Issues) -> Option<Settings> {
    let coord = match raw.user_coord_ch2056 {
        Some(c) => validate_coord(c, "settings.user_coord_ch2056", issues),
        None => {
            issues.push("settings.user_coord_ch2056", "is required");
            None
        }
    };

    let worker_base_url = match raw.worker_base_url {
        Some(u) => validate_url(&u, "settings.worker_base_url", issues),
        None => {
            issues.push("settings.worker_base_url", "is required");
            None
        }
    };

    let refresh_minutes = match raw.refresh_minutes {
        Some(m) if m.is_finite() && m >= 0.0 => Some(m),
        Some(_) => {
            issues.push(
                "settings.refresh_minutes",
                "must be a finite, non-negative number",
            );
            None
        }
        None => {
            issues.push("settings.refresh_minutes", "is required");
            None
        }
    };

    Some(Settings {
        user_coord_ch2056: coord?,
        worker_base_url: worker_base_url?,
        refresh_minutes: refresh_minutes?,
    })
}

fn validate_coord(raw: RawCoord, path: &str, issues: &mut Issues) -> Option<ChCoord> {
    let mut axis = |value: Option<f64>, name: &str| match value {
        Some(v) if v.is_finite() => Some(v),
        Some(_) => {
            issues.push(&format!("{path}.{name}"), "must be a finite number");
            None
        }
        None => {
            issues.push(&format!("{path}.{name}"), "is required");
            None
        }
    };
    let e = axis(raw.e, "e");
    let n = axis(raw.n, "n");
    Some(ChCoord::new(e?, n?))
}

fn validate_url(raw: &str, path: &str, issues: &mut Issues) -> Option<Url> {
    match Url::parse(raw) {
        Ok(url) => Some(url),
        Err(e) => {
            issues.push(path, &format!("invalid URL '{raw}': {e}"));
            None
        }
    }
}

/// Source URLs keep their configured text; parsing only validates them.
fn validate_source_url(raw: &str, path: &str, issues: &mut Issues) -> Option<SourceUrl> {
    match SourceUrl::parse(raw) {
        Ok(url) => Some(url),
        Err(e) => {
            issues.push(path, &format!("invalid URL '{raw}': {e}"));
            None
        }
    }
}

fn validate_webcam(raw: RawWebcam, path: &str, issues: &mut Issues) -> Option<Webcam> {
    let id = raw.id.map(RawId::into_string).filter(|id| !id.is_empty());
    if id.is_none() {
        issues.push(&format!("{path}.id"), "must be a non-empty string or number");
    }

    let name = raw.name.filter(|n| !n.is_empty());
    if name.is_none() {
        issues.push(&format!("{path}.name"), "must be a non-empty string");
    }

    let elevation = validate_elevation(raw.elevation_m_asl, &format!("{path}.elevation_m_asl"), issues);

    let coord = match raw.coord_ch2056 {
        Some(c) => validate_coord(c, &format!("{path}.coord_ch2056"), issues),
        None => {
            issues.push(&format!("{path}.coord_ch2056"), "is required");
            None
        }
    };

    let source = match raw.source {
        Some(s) => validate_source(s, &format!("{path}.source"), issues),
        None => {
            issues.push(&format!("{path}.source"), "is required");
            None
        }
    };

    Some(Webcam {
        id: id?,
        name: name?,
        elevation_m_asl: elevation?,
        coord_ch2056: coord?,
        source: source?,
        worker_bypass: raw.worker_bypass,
        attribution: raw.attribution,
    })
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
fn validate_elevation(raw: Option<f64>, path: &str, issues: &mut Issues) -> Option<u32> {
    match raw {
        Some(v) if v.is_finite() && v.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&v) => {
            Some(v as u32)
        }
        Some(_) => {
            issues.push(path, "must be a non-negative integer");
            None
        }
        None => {
            issues.push(path, "is required");
            None
        }
    }
}

fn validate_source(raw: RawSource, path: &str, issues: &mut Issues) -> Option<WebcamSource> {
    let Some(kind) = raw.kind else {
        issues.push(&format!("{path}.kind"), "is required");
        return None;
    };
    let Ok(kind) = kind.parse::<SourceKind>() else {
        issues.push(
            &format!("{path}.kind"),
            &format!("must be one of snapshot, hls, iframe, page (got '{kind}')"),
        );
        return None;
    };

    let with_url: fn(SourceUrl) -> WebcamSource = match kind {
        SourceKind::Snapshot => |url| WebcamSource::Snapshot { url },
        SourceKind::Hls => |url| WebcamSource::Hls { url },
        SourceKind::Iframe => |url| WebcamSource::Iframe { url },
        SourceKind::Page => {
            let Some(page) = raw.page else {
                issues.push(path, "source requires page for kind=page");
                return None;
            };
            let page = validate_source_url(&page, &format!("{path}.page"), issues)?;
            return Some(WebcamSource::Page {
                page,
                selector: raw.selector,
            });
        }
    };

    let Some(url) = raw.url else {
        issues.push(path, "source requires url for kind!=page");
        return None;
    };
    validate_source_url(&url, &format!("{path}.url"), issues).map(with_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const VALID: &str = r#"
settings:
  user_coord_ch2056: { e: 2600000, n: 1200000 }
  units: metric
  worker_base_url: "http://127.0.0.1:8787"
  refresh_minutes: 5
webcams:
  - id: test
    name: Test Cam
    elevation_m_asl: 1000
    coord_ch2056: { e: 2600100, n: 1200200 }
    source:
      kind: snapshot
      url: "https://example.com/image.jpg"
    refresh: { seconds: 10 }
"#;

    fn issues_of(yaml: &str) -> Vec<String> {
        match parse_webcams_yaml(yaml) {
            Err(ConfigError::Invalid { issues }) => issues,
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn parses_valid_yaml() {
        let config = parse_webcams_yaml(VALID).unwrap();
        assert_eq!(config.webcams.len(), 1);
        assert_eq!(config.webcams[0].id, "test");
        assert_eq!(config.settings.refresh_minutes, 5.0);
        assert_eq!(
            config.settings.worker_base_url.as_str(),
            "http://127.0.0.1:8787/"
        );
        assert_eq!(
            config.webcams[0].source,
            WebcamSource::Snapshot {
                url: SourceUrl::parse("https://example.com/image.jpg").unwrap()
            }
        );
    }

    #[test]
    fn rejects_invalid_shape() {
        let issues = issues_of("settings: {}\nwebcams: []\n");
        assert!(issues.iter().any(|i| i.starts_with("settings.user_coord_ch2056")));
        assert!(issues.iter().any(|i| i.starts_with("settings.worker_base_url")));
        assert!(issues.iter().any(|i| i.starts_with("webcams:")));
    }

    #[test]
    fn rejects_unparseable_yaml() {
        let err = parse_webcams_yaml("settings: [unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert_eq!(err.to_string(), "Failed to parse YAML.");
    }

    #[test]
    fn coerces_numeric_ids() {
        let yaml = VALID.replace("id: test", "id: 42");
        let config = parse_webcams_yaml(&yaml).unwrap();
        assert_eq!(config.webcams[0].id, "42");
    }

    #[test]
    fn page_source_requires_page() {
        let yaml = VALID.replace(
            "kind: snapshot\n      url: \"https://example.com/image.jpg\"",
            "kind: page\n      selector: img.hero",
        );
        let issues = issues_of(&yaml);
        assert_eq!(
            issues,
            vec!["webcams[0].source: source requires page for kind=page".to_owned()]
        );
    }

    #[test]
    fn non_page_source_requires_url() {
        let yaml = VALID.replace("      url: \"https://example.com/image.jpg\"\n", "");
        let issues = issues_of(&yaml);
        assert_eq!(
            issues,
            vec!["webcams[0].source: source requires url for kind!=page".to_owned()]
        );
    }

    #[test]
    fn page_source_keeps_selector() {
        let yaml = VALID.replace(
            "kind: snapshot\n      url: \"https://example.com/image.jpg\"",
            "kind: page\n      page: \"https://cams.example.org/live\"\n      selector: \"#cam img\"",
        );
        let config = parse_webcams_yaml(&yaml).unwrap();
        assert_eq!(
            config.webcams[0].source,
            WebcamSource::Page {
                page: SourceUrl::parse("https://cams.example.org/live").unwrap(),
                selector: Some("#cam img".into()),
            }
        );
    }

    #[test]
    fn collects_every_issue() {
        let yaml = VALID
            .replace("elevation_m_asl: 1000", "elevation_m_asl: -3")
            .replace("name: Test Cam", "name: \"\"")
            .replace("kind: snapshot", "kind: webrtc");
        let issues = issues_of(&yaml);
        assert_eq!(issues.len(), 3, "{issues:?}");
    }

    #[test]
    fn rejects_duplicate_ids() {
        let second = r#"
  - id: test
    name: Other
    elevation_m_asl: 5
    coord_ch2056: { e: 1, n: 2 }
    source: { kind: hls, url: "https://example.com/live.m3u8" }
"#;
        let issues = issues_of(&format!("{VALID}{second}"));
        assert_eq!(issues, vec!["webcams[1].id: duplicate id 'test'".to_owned()]);
    }

    #[test]
    fn baseline_hosts_come_from_sources() {
        let second = r#"
  - id: other
    name: Other
    elevation_m_asl: 5
    coord_ch2056: { e: 1, n: 2 }
    source: { kind: page, page: "https://Cams.Example.ORG/live" }
"#;
        let config = parse_webcams_yaml(&format!("{VALID}{second}")).unwrap();
        let hosts: Vec<_> = config.source_hosts().into_iter().collect();
        assert_eq!(hosts, vec!["cams.example.org", "example.com"]);
        assert!(config.webcam("other").is_some());
        assert!(config.webcam("missing").is_none());
    }

    #[test]
    fn refresh_minutes_is_required() {
        let issues = issues_of(&VALID.replace("  refresh_minutes: 5\n", ""));
        assert_eq!(issues, vec!["settings.refresh_minutes: is required".to_owned()]);

        let issues = issues_of(&VALID.replace("refresh_minutes: 5", "refresh_minutes: -1"));
        assert_eq!(
            issues,
            vec!["settings.refresh_minutes: must be a finite, non-negative number".to_owned()]
        );
    }

    #[test]
    fn source_urls_keep_configured_text() {
        let yaml = VALID.replace("https://example.com/image.jpg", "https://Example.com");
        let config = parse_webcams_yaml(&yaml).unwrap();
        let source = &config.webcams[0].source;
        assert_eq!(source.upstream_url().as_str(), "https://Example.com");
        assert_eq!(source.host().as_deref(), Some("example.com"));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("webcams.yaml");
        let err = load_webcams_yaml(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Load { .. }));
        assert!(err.to_string().starts_with("Failed to load config at"));

        std::fs::write(&path, VALID).unwrap();
        assert_eq!(load_webcams_yaml(&path).unwrap().webcams.len(), 1);
    }
}
