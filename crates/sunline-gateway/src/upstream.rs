// Upstream fetching for the gateway routes.
//
// The routes only see the `Upstream` trait; `HttpUpstream` is the reqwest
// implementation. Every redirect hop is re-checked against the allowlist
// inside the client's redirect policy, and the final response URL is
// checked once more before anything is read from it.

use std::error::Error as StdError;
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use reqwest::redirect;
use tracing::debug;
use url::Url;

use sunline_config::GatewaySettings;

use crate::allowlist::Allowlist;
use crate::error::{FetchError, GatewayError};

/// Pages larger than this are not parsed.
pub const MAX_PAGE_BYTES: usize = 2 * 1024 * 1024;

/// A successful image fetch: content type plus a streaming body.
pub struct UpstreamImage {
    pub content_type: Option<String>,
    pub body: BoxStream<'static, Result<Bytes, io::Error>>,
}

impl std::fmt::Debug for UpstreamImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamImage")
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// A fetched HTML page and the URL it was finally served from.
#[derive(Debug, Clone)]
pub struct UpstreamPage {
    pub url: Url,
    pub html: String,
}

/// Outbound fetch capability used by the routes.
pub trait Upstream: Send + Sync + 'static {
    fn fetch_image(
        &self,
        url: &Url,
    ) -> impl Future<Output = Result<UpstreamImage, FetchError>> + Send;

    fn fetch_page(&self, url: &Url)
    -> impl Future<Output = Result<UpstreamPage, FetchError>> + Send;
}

// ── Client configuration ──

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub timeout: Duration,
    pub max_redirects: usize,
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self::from(&GatewaySettings::default())
    }
}

impl From<&GatewaySettings> for UpstreamConfig {
    fn from(settings: &GatewaySettings) -> Self {
        Self {
            timeout: settings.upstream_timeout(),
            max_redirects: settings.max_redirects,
            user_agent: settings.user_agent.clone(),
        }
    }
}

/// Redirect target rejected by the allowlist.
#[derive(Debug, thiserror::Error)]
#[error("redirect to non-allowlisted host '{host}'")]
struct BlockedRedirect {
    host: String,
}

#[derive(Debug, thiserror::Error)]
#[error("too many redirects")]
struct TooManyRedirects;

impl UpstreamConfig {
    /// Build a `reqwest::Client` whose redirect policy enforces `allowlist`.
    pub fn build_client(&self, allowlist: Arc<Allowlist>) -> Result<reqwest::Client, GatewayError> {
        let max_redirects = self.max_redirects;
        let policy = redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() > max_redirects {
                return attempt.error(TooManyRedirects);
            }
            match attempt.url().host_str() {
                Some(host) if allowlist.contains_host(host) => attempt.follow(),
                host => {
                    let host = host.unwrap_or_default().to_owned();
                    attempt.error(BlockedRedirect { host })
                }
            }
        });

        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str())
            .redirect(policy)
            .build()
            .map_err(GatewayError::Client)
    }
}

// ── reqwest implementation ──

#[derive(Debug, Clone)]
pub struct HttpUpstream {
    http: reqwest::Client,
    allowlist: Arc<Allowlist>,
}

impl HttpUpstream {
    pub fn new(config: &UpstreamConfig, allowlist: Arc<Allowlist>) -> Result<Self, GatewayError> {
        let http = config.build_client(Arc::clone(&allowlist))?;
        Ok(Self { http, allowlist })
    }

    /// Send a GET and return the response once it is known to be a 2xx
    /// from an allowlisted host.
    async fn get(&self, url: &Url) -> Result<reqwest::Response, FetchError> {
        debug!(%url, "fetching upstream");
        let resp = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(classify)?;

        if !self.allowlist.permits(resp.url()) {
            return Err(FetchError::ForbiddenRedirect {
                host: resp.url().host_str().unwrap_or_default().to_owned(),
            });
        }

        let status = resp.status();
        if !status.is_success() {
            debug!(%url, status = status.as_u16(), "upstream returned non-success");
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }
        Ok(resp)
    }
}

impl Upstream for HttpUpstream {
    async fn fetch_image(&self, url: &Url) -> Result<UpstreamImage, FetchError> {
        let resp = self.get(url).await?;
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = resp
            .bytes_stream()
            .map(|chunk| chunk.map_err(io::Error::other))
            .boxed();
        Ok(UpstreamImage { content_type, body })
    }

    async fn fetch_page(&self, url: &Url) -> Result<UpstreamPage, FetchError> {
        let resp = self.get(url).await?;
        let final_url = resp.url().clone();
        if resp
            .content_length()
            .is_some_and(|len| !usize::try_from(len).is_ok_and(|len| len <= MAX_PAGE_BYTES))
        {
            return Err(FetchError::Transport {
                reason: "page exceeds size limit".into(),
            });
        }
        let bytes = resp.bytes().await.map_err(classify)?;
        if bytes.len() > MAX_PAGE_BYTES {
            return Err(FetchError::Transport {
                reason: "page exceeds size limit".into(),
            });
        }
        Ok(UpstreamPage {
            url: final_url,
            html: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

/// Map a reqwest failure onto a fetch error, recovering the blocked host
/// when the redirect policy refused a hop.
fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::Timeout;
    }
    if err.is_redirect() {
        if let Some(blocked) = find_source::<BlockedRedirect>(&err) {
            return FetchError::ForbiddenRedirect {
                host: blocked.host.clone(),
            };
        }
    }
    FetchError::Transport {
        reason: err.to_string(),
    }
}

fn find_source<'a, T: StdError + 'static>(err: &'a (dyn StdError + 'static)) -> Option<&'a T> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(found) = e.downcast_ref::<T>() {
            return Some(found);
        }
        current = e.source();
    }
    None
}
