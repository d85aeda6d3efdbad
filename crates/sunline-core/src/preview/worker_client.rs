// Gateway URL construction.
//
// The gateway's route paths and query parameter names live here so the
// resolver and the gateway cannot drift apart.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Route A: single-fetch image proxy.
pub const IMAGE_PATH: &str = "/api/image";
/// Route B: HTML page image extraction.
pub const HTML_IMAGE_PATH: &str = "/api/html-image";

/// Characters left unescaped by JavaScript's `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a single query component.
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Builds gateway URLs relative to a worker base URL.
///
/// The base is kept as a string: it may carry a path prefix, and the
/// result must be byte-for-byte what the client requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerClient {
    base_url: String,
}

impl WorkerClient {
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            base_url: base_url.as_ref().trim_end_matches('/').to_owned(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/api/image?url={upstream}`
    pub fn image_url(&self, upstream: &str) -> String {
        format!(
            "{}{IMAGE_PATH}?url={}",
            self.base_url,
            encode_component(upstream)
        )
    }

    /// `{base}/api/html-image?page={page}[&selector={selector}]`
    ///
    /// The selector parameter is omitted entirely when absent or empty.
    pub fn html_image_url(&self, page: &str, selector: Option<&str>) -> String {
        let mut url = format!(
            "{}{HTML_IMAGE_PATH}?page={}",
            self.base_url,
            encode_component(page)
        );
        if let Some(selector) = selector.filter(|s| !s.is_empty()) {
            url.push_str("&selector=");
            url.push_str(&encode_component(selector));
        }
        url
    }
}
