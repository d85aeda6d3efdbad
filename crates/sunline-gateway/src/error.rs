// ── Gateway error types ──
//
// Internal failure causes, each mapped onto exactly one wire code. The
// `IntoResponse` impl is the only place a failure becomes HTTP: JSON body,
// matching status, never an upstream body or internal detail.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, warn};

use sunline_config::ALLOWLIST_ENV;
use sunline_core::{AppError, ErrorCode};

/// Why an upstream fetch did not produce a usable response.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("upstream timed out")]
    Timeout,

    #[error("upstream responded with HTTP {status}")]
    Status { status: u16 },

    /// A redirect hop, or the final response, left the allowlist.
    #[error("upstream redirected to non-allowlisted host '{host}'")]
    ForbiddenRedirect { host: String },

    #[error("upstream request failed: {reason}")]
    Transport { reason: String },
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("missing required query parameter '{param}'")]
    MissingParam { param: &'static str },

    #[error("query parameter '{param}' is not an absolute http(s) URL")]
    InvalidUrl { param: &'static str },

    #[error("host '{host}' is not allowlisted")]
    ForbiddenHost { host: String },

    #[error(transparent)]
    Upstream(#[from] FetchError),

    #[error("no image found on page")]
    NoImageFound,

    #[error("selector '{selector}' could not be parsed")]
    InvalidSelector { selector: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl GatewayError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MissingParam { .. } => ErrorCode::MissingParam,
            Self::InvalidUrl { .. } => ErrorCode::InvalidUrl,
            Self::ForbiddenHost { .. } | Self::Upstream(FetchError::ForbiddenRedirect { .. }) => {
                ErrorCode::ForbiddenHost
            }
            Self::Upstream(_) | Self::Client(_) => ErrorCode::UpstreamFailed,
            Self::NoImageFound | Self::InvalidSelector { .. } => ErrorCode::NoImageFound,
        }
    }

    /// The client-facing form of this error.
    pub fn to_app_error(&self) -> AppError {
        let code = self.code();
        match self {
            Self::MissingParam { param } => {
                AppError::new(code, format!("Missing required query parameter: {param}."))
            }
            Self::InvalidUrl { param } => AppError::new(
                code,
                format!("Parameter {param} must be an absolute http(s) URL."),
            )
            .with_hint("Percent-encode the full URL, including its scheme."),
            Self::ForbiddenHost { host } => {
                AppError::new(code, format!("Host {host} is not allowlisted."))
                    .with_hint(format!("Add the host to {ALLOWLIST_ENV} to allow it."))
            }
            Self::Upstream(FetchError::ForbiddenRedirect { .. }) => AppError::new(
                code,
                "Upstream redirected to a host that is not allowlisted.",
            ),
            Self::Upstream(FetchError::Timeout) => {
                AppError::new(code, "Upstream request timed out.")
            }
            Self::Upstream(FetchError::Status { status }) => {
                AppError::new(code, format!("Upstream responded with HTTP {status}."))
            }
            Self::Upstream(FetchError::Transport { .. }) | Self::Client(_) => {
                AppError::new(code, "Upstream request failed.")
            }
            Self::NoImageFound => AppError::new(code, "No image found on page.")
                .with_hint("Check the selector against the page markup."),
            Self::InvalidSelector { selector } => {
                AppError::new(code, "No image found on page.")
                    .with_hint(format!("Selector {selector:?} could not be parsed."))
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let app = self.to_app_error();
        if app.code == ErrorCode::UpstreamFailed {
            warn!(code = %app.code, error = %self, "request failed");
        } else {
            debug!(code = %app.code, error = %self, "request rejected");
        }
        let status = StatusCode::from_u16(app.status).unwrap_or(StatusCode::BAD_GATEWAY);
        (status, Json(app.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_maps_to_its_status() {
        let cases = [
            (GatewayError::MissingParam { param: "url" }, 400),
            (GatewayError::InvalidUrl { param: "page" }, 400),
            (
                GatewayError::ForbiddenHost {
                    host: "example.com".into(),
                },
                403,
            ),
            (
                GatewayError::Upstream(FetchError::ForbiddenRedirect {
                    host: "internal".into(),
                }),
                403,
            ),
            (GatewayError::Upstream(FetchError::Timeout), 502),
            (GatewayError::Upstream(FetchError::Status { status: 404 }), 502),
            (GatewayError::NoImageFound, 404),
            (
                GatewayError::InvalidSelector {
                    selector: "[[".into(),
                },
                404,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.to_app_error().status, status, "{err}");
            assert_eq!(err.into_response().status().as_u16(), status);
        }
    }

    #[test]
    fn transport_details_stay_internal() {
        let err = GatewayError::Upstream(FetchError::Transport {
            reason: "dns error: failed to lookup address 10.0.0.7".into(),
        });
        let app = err.to_app_error();
        assert_eq!(app.message, "Upstream request failed.");
        assert!(app.hint.is_none());
    }
}
