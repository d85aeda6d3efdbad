//! Edge image gateway for sunline webcam previews.
//!
//! Two GET routes let browsers load webcam imagery from origins that lack
//! CORS headers or only publish an HTML page:
//!
//! - `/api/image?url=` fetches an allowlisted image and streams it back
//!   with its content type and permissive CORS.
//! - `/api/html-image?page=&selector=` fetches an allowlisted page, finds
//!   the image on it, and redirects to `/api/image` for that image.
//!
//! Every outbound fetch is bounded by the host [`Allowlist`], including each
//! redirect hop. Failures are JSON `{ code, message, hint }` bodies built
//! from [`sunline_core::AppError`].

pub mod allowlist;
pub mod error;
pub mod extract;
pub mod routes;
pub mod upstream;

use std::future::Future;
use std::io;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use sunline_config::{GatewaySettings, RootConfig};

pub use allowlist::Allowlist;
pub use error::{FetchError, GatewayError};
pub use extract::extract_image_src;
pub use routes::router;
pub use upstream::{HttpUpstream, Upstream, UpstreamConfig, UpstreamImage, UpstreamPage};

/// Shared request state: the allowlist and the upstream fetcher.
#[derive(Debug)]
pub struct Gateway<U> {
    allowlist: Arc<Allowlist>,
    upstream: U,
}

impl<U: Upstream> Gateway<U> {
    pub fn new(allowlist: Arc<Allowlist>, upstream: U) -> Self {
        Self {
            allowlist,
            upstream,
        }
    }

    pub fn allowlist(&self) -> &Allowlist {
        &self.allowlist
    }

    pub fn upstream(&self) -> &U {
        &self.upstream
    }
}

impl Gateway<HttpUpstream> {
    /// Gateway backed by reqwest, allowing `allowlist` hosts only.
    pub fn http(allowlist: Allowlist, config: &UpstreamConfig) -> Result<Self, GatewayError> {
        let allowlist = Arc::new(allowlist);
        let upstream = HttpUpstream::new(config, Arc::clone(&allowlist))?;
        Ok(Self::new(allowlist, upstream))
    }

    /// Build from settings: catalogue source hosts (if a catalogue is
    /// loaded) plus `allowlist_extra`.
    pub fn from_settings(
        settings: &GatewaySettings,
        catalogue: Option<&RootConfig>,
    ) -> Result<Self, GatewayError> {
        let baseline = catalogue.map(RootConfig::source_hosts).unwrap_or_default();
        let allowlist = Allowlist::new(baseline, &settings.allowlist_extra);
        Self::http(allowlist, &UpstreamConfig::from(settings))
    }
}

/// Serve the gateway on `listener` until `shutdown` resolves.
pub async fn serve<U, F>(listener: TcpListener, gateway: Gateway<U>, shutdown: F) -> io::Result<()>
where
    U: Upstream,
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(
        %addr,
        hosts = gateway.allowlist().len(),
        "gateway listening"
    );
    let app = router(Arc::new(gateway));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("gateway stopped");
    Ok(())
}
