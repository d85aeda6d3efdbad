//! Domain core shared by the sunline gateway and its clients.
//!
//! This crate owns everything both sides of the preview pipeline must agree
//! on, without touching the network or the filesystem:
//!
//! - **Domain model** ([`model`]): [`Webcam`] records carrying a tagged
//!   [`WebcamSource`] (`snapshot`, `hls`, `iframe`, `page`) and a planar
//!   [`ChCoord`] in the Swiss LV95 grid.
//!
//! - **Preview resolution** ([`preview`]): [`resolve_preview_base_url()`]
//!   decides between a direct upstream fetch and one of the two gateway
//!   routes, building the exact proxy URL the gateway expects.
//!
//! - **Retry policy** ([`preview::retry`]): the fixed backoff schedule,
//!   the explicit [`PreviewLoad`] state machine, and an async driver.
//!
//! - **Error taxonomy** ([`error`]): the closed [`ErrorCode`] set and the
//!   JSON-serializable [`AppError`] the gateway sends on failure.
//!
//! - **Geo helpers** ([`geo`]): planar distance, bearing, and 8-point
//!   compass labels between grid coordinates.

pub mod error;
pub mod geo;
pub mod model;
pub mod preview;

// ── Primary re-exports ──────────────────────────────────────────────
pub use error::{AppError, ErrorCode};
pub use geo::{Compass8, compass8_from_bearing, planar_bearing_deg, planar_distance_km};
pub use model::{ChCoord, SourceKind, SourceUrl, Webcam, WebcamSource};
pub use preview::retry::{
    LoadOutcome, PreviewLoad, RetryDecision, RetryPolicy, load_with_retry, next_retry_delay_ms,
    should_retry,
};
pub use preview::worker_client::{HTML_IMAGE_PATH, IMAGE_PATH, WorkerClient, encode_component};
pub use preview::{PreviewStrategy, is_worker_bypass, resolve_preview_base_url};
