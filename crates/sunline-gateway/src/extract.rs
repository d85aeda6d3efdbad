// ── Image extraction ──
//
// Locates the webcam image on an HTML page: the first element matching
// the selector (`img` when none is given) that carries a usable source
// attribute. Relative sources resolve against the page's final URL.

use scraper::{Html, Selector};
use url::Url;

use crate::error::GatewayError;

const DEFAULT_SELECTOR: &str = "img";

/// Attributes probed for an image URL, in order.
const SOURCE_ATTRS: [&str; 5] = ["src", "data-src", "srcset", "content", "href"];

/// Find the first usable image URL on `html`.
///
/// Returns `Ok(None)` when nothing matches; a selector that does not parse
/// is an `InvalidSelector` error.
pub fn extract_image_src(
    html: &str,
    base: &Url,
    selector: Option<&str>,
) -> Result<Option<Url>, GatewayError> {
    let raw = selector
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SELECTOR);
    let selector = Selector::parse(raw).map_err(|_| GatewayError::InvalidSelector {
        selector: raw.to_owned(),
    })?;

    let document = Html::parse_document(html);
    Ok(document
        .select(&selector)
        .find_map(|element| image_source(element.value(), base)))
}

fn image_source(element: &scraper::node::Element, base: &Url) -> Option<Url> {
    SOURCE_ATTRS.iter().find_map(|&name| {
        let value = element.attr(name)?;
        let candidate = if name == "srcset" {
            first_srcset_candidate(value)?
        } else {
            value.trim()
        };
        resolve(candidate, base)
    })
}

/// `srcset="a.jpg 1x, b.jpg 2x"` yields `a.jpg`.
fn first_srcset_candidate(srcset: &str) -> Option<&str> {
    srcset.split(',').next()?.split_whitespace().next()
}

fn resolve(candidate: &str, base: &Url) -> Option<Url> {
    if candidate.is_empty() || candidate.starts_with("data:") {
        return None;
    }
    let url = base.join(candidate).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}
