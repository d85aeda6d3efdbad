use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use url::Url;

// ── Coordinates ─────────────────────────────────────────────────────

/// Planar coordinate in the Swiss LV95 grid (EPSG:2056), in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChCoord {
    /// Easting.
    pub e: f64,
    /// Northing.
    pub n: f64,
}

impl ChCoord {
    pub fn new(e: f64, n: f64) -> Self {
        Self { e, n }
    }
}

// ── Source URL ──────────────────────────────────────────────────────

/// An absolute upstream URL exactly as configured.
///
/// The configured text is what clients fetch and what goes into gateway
/// query strings, byte for byte. The parsed form is only used for host
/// lookups; its normalization (trailing `/`, lower-cased host, re-escaped
/// path) never leaks out through [`SourceUrl::as_str`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SourceUrl {
    raw: String,
    parsed: Url,
}

impl SourceUrl {
    pub fn parse(raw: impl Into<String>) -> Result<Self, url::ParseError> {
        let raw = raw.into();
        let parsed = Url::parse(&raw)?;
        Ok(Self { raw, parsed })
    }

    /// The configured text, unchanged.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn url(&self) -> &Url {
        &self.parsed
    }

    pub fn host_str(&self) -> Option<&str> {
        self.parsed.host_str()
    }
}

impl TryFrom<String> for SourceUrl {
    type Error = url::ParseError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(raw)
    }
}

impl From<SourceUrl> for String {
    fn from(url: SourceUrl) -> Self {
        url.raw
    }
}

impl fmt::Display for SourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// ── Source ──────────────────────────────────────────────────────────

/// Discriminant of a [`WebcamSource`], as written in config files.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SourceKind {
    Snapshot,
    Hls,
    Iframe,
    Page,
}

/// Where a webcam's imagery comes from.
///
/// Each variant carries exactly the fields its kind requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum WebcamSource {
    /// A URL that returns a still image directly.
    Snapshot { url: SourceUrl },
    /// An HLS playlist.
    Hls { url: SourceUrl },
    /// An embeddable player page.
    Iframe { url: SourceUrl },
    /// An HTML page containing the image; `selector` picks the element,
    /// defaulting to the first `<img>` in document order.
    Page {
        page: SourceUrl,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selector: Option<String>,
    },
}

impl WebcamSource {
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Snapshot { .. } => SourceKind::Snapshot,
            Self::Hls { .. } => SourceKind::Hls,
            Self::Iframe { .. } => SourceKind::Iframe,
            Self::Page { .. } => SourceKind::Page,
        }
    }

    /// The upstream URL this source points at (`url` or `page`).
    pub fn upstream_url(&self) -> &SourceUrl {
        match self {
            Self::Snapshot { url } | Self::Hls { url } | Self::Iframe { url } => url,
            Self::Page { page, .. } => page,
        }
    }

    /// Lower-cased hostname of the upstream URL, if it has one.
    pub fn host(&self) -> Option<String> {
        self.upstream_url().host_str().map(str::to_ascii_lowercase)
    }
}

// ── Webcam ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Webcam {
    /// Stable identifier; numeric config literals arrive already stringified.
    pub id: String,
    pub name: String,
    pub elevation_m_asl: u32,
    pub coord_ch2056: ChCoord,
    pub source: WebcamSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_bypass: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_source() -> WebcamSource {
        WebcamSource::Page {
            page: SourceUrl::parse("https://Cams.Example.org/embed.html").unwrap(),
            selector: Some("img.hero".into()),
        }
    }

    #[test]
    fn kind_matches_variant() {
        assert_eq!(page_source().kind(), SourceKind::Page);
        let hls = WebcamSource::Hls {
            url: SourceUrl::parse("https://example.com/live.m3u8").unwrap(),
        };
        assert_eq!(hls.kind(), SourceKind::Hls);
        assert_eq!(SourceKind::Iframe.to_string(), "iframe");
    }

    #[test]
    fn host_is_lowercased() {
        assert_eq!(page_source().host().as_deref(), Some("cams.example.org"));
    }

    #[test]
    fn source_serializes_with_kind_tag() {
        let json = serde_json::to_value(page_source()).unwrap();
        assert_eq!(json["kind"], "page");
        assert_eq!(json["page"], "https://Cams.Example.org/embed.html");
        assert_eq!(json["selector"], "img.hero");

        let back: WebcamSource = serde_json::from_value(json).unwrap();
        assert_eq!(back, page_source());
    }

    #[test]
    fn source_url_keeps_configured_text() {
        for raw in [
            "https://example.com",
            "https://Cams.Example.com/live.jpg",
            "https://example.com/a b.jpg",
        ] {
            let url = SourceUrl::parse(raw).unwrap();
            assert_eq!(url.as_str(), raw);
            assert_eq!(url.to_string(), raw);
        }
        let url = SourceUrl::parse("https://Cams.Example.com/live.jpg").unwrap();
        assert_eq!(url.host_str(), Some("cams.example.com"));
        assert_eq!(url.url().as_str(), "https://cams.example.com/live.jpg");
    }

    #[test]
    fn source_url_rejects_relative_text() {
        assert!(SourceUrl::parse("/live.jpg").is_err());
        assert!(serde_json::from_value::<SourceUrl>(serde_json::json!("not a url")).is_err());
    }
}
