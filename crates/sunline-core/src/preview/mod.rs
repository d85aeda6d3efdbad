//! Preview strategy resolution.
//!
//! Decides how a client should load a webcam's preview image: straight
//! from the origin, through the gateway's image proxy, or through the
//! gateway's HTML extraction route. Everything here is pure; the only
//! time-dependent piece is the retry driver in [`retry`].

pub mod retry;
pub mod worker_client;

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

use crate::model::{Webcam, WebcamSource};
use worker_client::WorkerClient;

/// How a webcam's preview is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PreviewStrategy {
    /// Fetch the snapshot URL directly, no gateway hop.
    Direct,
    /// Fetch the snapshot through `/api/image`.
    ProxiedSnapshot,
    /// Extract an image from a page through `/api/html-image`.
    HtmlExtraction,
    /// No still-image preview exists for this source (HLS, iframe).
    Unavailable,
}

impl PreviewStrategy {
    pub fn classify(webcam: &Webcam) -> Self {
        match &webcam.source {
            WebcamSource::Snapshot { .. } if is_worker_bypass(webcam) => Self::Direct,
            WebcamSource::Snapshot { .. } => Self::ProxiedSnapshot,
            WebcamSource::Page { .. } => Self::HtmlExtraction,
            WebcamSource::Hls { .. } | WebcamSource::Iframe { .. } => Self::Unavailable,
        }
    }
}

/// Whether the client may skip the gateway for this webcam.
///
/// Only snapshot sources qualify. Page sources need server-side extraction
/// and are never bypassed, whatever their `worker_bypass` flag says.
pub fn is_worker_bypass(webcam: &Webcam) -> bool {
    webcam.worker_bypass.unwrap_or(false)
        && matches!(&webcam.source, WebcamSource::Snapshot { url } if !url.as_str().is_empty())
}

/// The URL a client should request for this webcam's preview, or `None`
/// when the source has no still-image preview.
///
/// `None` means "no preview available" and is not an error.
pub fn resolve_preview_base_url(webcam: &Webcam, worker_base_url: &str) -> Option<String> {
    match &webcam.source {
        WebcamSource::Snapshot { url } => {
            if is_worker_bypass(webcam) {
                Some(url.as_str().to_owned())
            } else {
                Some(WorkerClient::new(worker_base_url).image_url(url.as_str()))
            }
        }
        WebcamSource::Page { page, selector } => Some(
            WorkerClient::new(worker_base_url).html_image_url(page.as_str(), selector.as_deref()),
        ),
        WebcamSource::Hls { .. } | WebcamSource::Iframe { .. } => None,
    }
}
