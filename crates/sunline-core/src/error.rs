// ── Wire error taxonomy ──
//
// The closed set of failure codes the gateway reports, and the JSON body
// that carries them. Clients match on `code`, never on `message`.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// One code per distinguishable failure cause.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
pub enum ErrorCode {
    /// A required query parameter is absent or empty.
    #[serde(rename = "E_MISSING_PARAM")]
    #[strum(serialize = "E_MISSING_PARAM")]
    MissingParam,

    /// A parameter is present but not a well-formed absolute URL.
    #[serde(rename = "E_INVALID_URL")]
    #[strum(serialize = "E_INVALID_URL")]
    InvalidUrl,

    /// The URL's host is outside the allowlist.
    #[serde(rename = "E_FORBIDDEN_HOST")]
    #[strum(serialize = "E_FORBIDDEN_HOST")]
    ForbiddenHost,

    /// Network error, timeout, or non-success response from the origin.
    #[serde(rename = "E_UPSTREAM_FAILED")]
    #[strum(serialize = "E_UPSTREAM_FAILED")]
    UpstreamFailed,

    /// The page was fetched but no image could be extracted from it.
    #[serde(rename = "E_NO_IMAGE_FOUND")]
    #[strum(serialize = "E_NO_IMAGE_FOUND")]
    NoImageFound,
}

impl ErrorCode {
    /// Default HTTP status for this code.
    pub fn status(self) -> u16 {
        match self {
            Self::MissingParam | Self::InvalidUrl => 400,
            Self::ForbiddenHost => 403,
            Self::NoImageFound => 404,
            Self::UpstreamFailed => 502,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Structured failure sent to clients as `{ code, message, hint }`.
///
/// `status` travels as the HTTP status line, not in the body. `hint` is
/// serialized as an empty string when absent so the body shape is fixed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct AppError {
    pub code: ErrorCode,
    #[serde(skip, default = "default_status")]
    pub status: u16,
    pub message: String,
    #[serde(
        default,
        serialize_with = "serialize_hint",
        deserialize_with = "deserialize_hint"
    )]
    pub hint: Option<String>,
}

fn default_status() -> u16 {
    ErrorCode::UpstreamFailed.status()
}

#[allow(clippy::ref_option)]
fn serialize_hint<S: serde::Serializer>(hint: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(hint.as_deref().unwrap_or(""))
}

fn deserialize_hint<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let raw = Option::<String>::deserialize(d)?;
    Ok(raw.filter(|h| !h.is_empty()))
}

impl AppError {
    /// Build an error carrying the code's default status.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            status: code.status(),
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Decode an error body received from the gateway.
    ///
    /// The body does not carry the status, so the caller passes the one it
    /// saw on the response line.
    pub fn from_json(body: &[u8], status: u16) -> Result<Self, serde_json::Error> {
        let mut err: Self = serde_json::from_slice(body)?;
        err.status = status;
        Ok(err)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.code,
            "message": self.message,
            "hint": self.hint.as_deref().unwrap_or(""),
        })
    }
}
