//! `serve`: run the edge image gateway.

use tokio::net::TcpListener;
use tracing::{info, warn};

use sunline_config::{GatewaySettings, RootConfig, config_path, load_gateway_settings};
use sunline_gateway::Gateway;

use crate::cli::{GlobalOpts, ServeArgs};
use crate::error::CliError;

use super::util;

pub async fn handle(args: ServeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let settings = resolve_settings(&args)?;
    let catalogue = load_serve_catalogue(global, &settings)?;

    let gateway = Gateway::from_settings(&settings, catalogue.as_ref())?;
    if gateway.allowlist().is_empty() {
        warn!("allowlist is empty; every fetch will be rejected");
    }
    info!(hosts = ?gateway.allowlist().hosts(), "allowlist ready");

    let listener = TcpListener::bind(settings.listen)
        .await
        .map_err(|source| CliError::Bind {
            addr: settings.listen.to_string(),
            source,
        })?;
    if !global.quiet {
        eprintln!("Gateway listening on http://{}", listener.local_addr()?);
    }

    sunline_gateway::serve(listener, gateway, shutdown_signal()).await?;
    Ok(())
}

/// File + environment settings with this invocation's flags on top.
fn resolve_settings(args: &ServeArgs) -> Result<GatewaySettings, CliError> {
    let path = args.gateway_config.clone().unwrap_or_else(config_path);
    let mut settings = load_gateway_settings(Some(path.as_path()))
        .map_err(|e| CliError::config(path.display().to_string(), e))?;

    if let Some(listen) = args.listen {
        settings.listen = listen;
    }
    if let Some(timeout) = args.timeout {
        settings.upstream_timeout_secs = timeout;
    }
    if !args.allow_hosts.is_empty() {
        settings.extend_allowlist(&args.allow_hosts.join(","));
    }
    settings
        .validate()
        .map_err(|e| CliError::config(path.display().to_string(), e))?;
    Ok(settings)
}

/// The catalogue supplying the baseline allowlist.
///
/// An explicit `--config` or `webcams` setting must load. The default
/// `webcams.yaml` is optional; without it only extra hosts are allowed.
fn load_serve_catalogue(
    global: &GlobalOpts,
    settings: &GatewaySettings,
) -> Result<Option<RootConfig>, CliError> {
    if let Some(path) = global.config.as_ref().or(settings.webcams.as_ref()) {
        return util::load_catalogue(path).map(Some);
    }
    let fallback = util::catalogue_path(global);
    if fallback.is_file() {
        util::load_catalogue(&fallback).map(Some)
    } else {
        info!(path = %fallback.display(), "no webcam catalogue; allowlist is extra hosts only");
        Ok(None)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for ctrl-c; stop the process to exit");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
