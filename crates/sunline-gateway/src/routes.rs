// ── HTTP routes ──
//
// GET /api/image       proxy an allowlisted snapshot, streaming the body
// GET /api/html-image  find the image on an allowlisted page, 302 to /api/image
//
// Each request walks validate -> allowlist -> upstream; the first failing
// step produces the response.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::{RawQuery, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;
use url::Url;
use url::form_urlencoded;

use sunline_core::{HTML_IMAGE_PATH, IMAGE_PATH, encode_component};

use crate::Gateway;
use crate::error::GatewayError;
use crate::extract::extract_image_src;
use crate::upstream::Upstream;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Build the gateway router. CORS headers apply to every response,
/// errors and unknown paths included.
pub fn router<U: Upstream>(gateway: Arc<Gateway<U>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS]);

    Router::new()
        .route(IMAGE_PATH, get(image::<U>))
        .route(HTML_IMAGE_PATH, get(html_image::<U>))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(gateway)
}

// ── Query parsing ──

/// Decoded query pairs. Malformed encodings never fail; a missing
/// parameter is reported by the handler as a JSON error.
struct Params(Vec<(String, String)>);

impl Params {
    fn parse(raw: Option<&str>) -> Self {
        let pairs = raw
            .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        Self(pairs)
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// A required absolute http(s) URL parameter.
    fn url(&self, name: &'static str) -> Result<Url, GatewayError> {
        let raw = self
            .get(name)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(GatewayError::MissingParam { param: name })?;
        let url = Url::parse(raw).map_err(|_| GatewayError::InvalidUrl { param: name })?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(GatewayError::InvalidUrl { param: name });
        }
        Ok(url)
    }
}

// ── Handlers ──

async fn image<U: Upstream>(
    State(gateway): State<Arc<Gateway<U>>>,
    RawQuery(query): RawQuery,
) -> Result<Response, GatewayError> {
    let params = Params::parse(query.as_deref());
    let target = params.url("url")?;
    gateway.allowlist().check(&target)?;

    let image = gateway.upstream().fetch_image(&target).await?;
    let content_type = image
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
        .unwrap_or_else(|| HeaderValue::from_static(FALLBACK_CONTENT_TYPE));
    debug!(url = %target, content_type = ?content_type, "proxying image");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ),
        ],
        Body::from_stream(image.body),
    )
        .into_response())
}

async fn html_image<U: Upstream>(
    State(gateway): State<Arc<Gateway<U>>>,
    RawQuery(query): RawQuery,
) -> Result<Response, GatewayError> {
    let params = Params::parse(query.as_deref());
    let page_url = params.url("page")?;
    let selector = params.get("selector");
    gateway.allowlist().check(&page_url)?;

    let page = gateway.upstream().fetch_page(&page_url).await?;
    let image = extract_image_src(&page.html, &page.url, selector)?
        .ok_or(GatewayError::NoImageFound)?;
    debug!(page = %page.url, image = %image, "extracted image");

    Ok(image_redirect(&image))
}

/// 302 to the image route; that route applies its own allowlist check.
fn image_redirect(image: &Url) -> Response {
    let location = format!("{IMAGE_PATH}?url={}", encode_component(image.as_str()));
    match HeaderValue::from_str(&location) {
        Ok(location) => (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
        Err(_) => GatewayError::NoImageFound.into_response(),
    }
}
