//! `probe`: load a webcam preview the way a client would, retries included.

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use sunline_core::{AppError, LoadOutcome, RetryPolicy, load_with_retry, resolve_preview_base_url};

use crate::cli::{GlobalOpts, ProbeArgs};
use crate::error::{CliError, ProbeFailure};
use crate::output;

use super::util;

#[derive(Debug, Serialize)]
struct ProbeReport {
    id: String,
    url: String,
    attempts: u32,
    status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
    bytes: usize,
}

struct Fetched {
    status: u16,
    content_type: Option<String>,
    bytes: usize,
}

pub async fn handle(args: ProbeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = util::load_catalogue(&util::catalogue_path(global))?;
    let webcam = util::find_webcam(&config, &args.id)?;
    let base = util::worker_base_url(global, &config)?;
    let url = resolve_preview_base_url(webcam, &base).ok_or_else(|| CliError::NoPreview {
        id: webcam.id.clone(),
        kind: webcam.source.kind().to_string(),
    })?;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .build()?;
    let policy = if args.no_retry {
        RetryPolicy::none()
    } else {
        RetryPolicy::default()
    };

    let outcome = load_with_retry(&policy, |attempt| {
        let http = http.clone();
        let url = url.clone();
        async move {
            debug!(attempt, %url, "probing preview");
            fetch_once(&http, &url).await
        }
    })
    .await;

    let (fetched, attempts) = match outcome {
        LoadOutcome::Loaded { value, attempts } => (value, attempts),
        LoadOutcome::Failed { error, attempts } => {
            return Err(CliError::probe(url, attempts, &error));
        }
    };

    let report = ProbeReport {
        id: webcam.id.clone(),
        url,
        attempts,
        status: fetched.status,
        content_type: fetched.content_type,
        bytes: fetched.bytes,
    };
    let out = output::render_single(
        global.output,
        &report,
        |r| {
            output::detail_lines(&[
                ("ID", r.id.clone()),
                ("URL", r.url.clone()),
                ("Status", r.status.to_string()),
                ("Type", r.content_type.clone().unwrap_or_default()),
                ("Bytes", r.bytes.to_string()),
                ("Attempts", r.attempts.to_string()),
            ])
        },
        |r| r.status.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// One GET. Non-success responses are decoded as gateway error bodies
/// when they parse as one.
async fn fetch_once(http: &reqwest::Client, url: &str) -> Result<Fetched, ProbeFailure> {
    let resp = http
        .get(url)
        .send()
        .await
        .map_err(|e| ProbeFailure::Transport(e.to_string()))?;
    let status = resp.status().as_u16();

    if !resp.status().is_success() {
        let body = resp.bytes().await.unwrap_or_default();
        return Err(AppError::from_json(&body, status)
            .map_or(ProbeFailure::Status { status }, ProbeFailure::Gateway));
    }

    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let body = resp
        .bytes()
        .await
        .map_err(|e| ProbeFailure::Transport(e.to_string()))?;
    Ok(Fetched {
        status,
        content_type,
        bytes: body.len(),
    })
}
