//! `validate`: check a webcam catalogue and report every issue.

use serde::Serialize;

use sunline_config::RootConfig;

use crate::cli::{GlobalOpts, ValidateArgs};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Debug, Serialize)]
struct ValidationReport {
    path: String,
    webcams: usize,
    worker_base_url: String,
    refresh_minutes: f64,
    source_hosts: Vec<String>,
}

impl ValidationReport {
    fn new(path: String, config: &RootConfig) -> Self {
        Self {
            path,
            webcams: config.webcams.len(),
            worker_base_url: config.settings.worker_base_url.to_string(),
            refresh_minutes: config.settings.refresh_minutes,
            source_hosts: config.source_hosts().into_iter().collect(),
        }
    }
}

pub fn handle(args: ValidateArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = args.path.unwrap_or_else(|| util::catalogue_path(global));
    let config = util::load_catalogue(&path)?;
    let report = ValidationReport::new(path.display().to_string(), &config);

    let out = output::render_single(
        global.output,
        &report,
        |r| {
            format!(
                "{}: OK, {} webcams, {} source hosts\n{}",
                r.path,
                r.webcams,
                r.source_hosts.len(),
                output::detail_lines(&[
                    ("Gateway", r.worker_base_url.clone()),
                    ("Refresh", format!("{} min", r.refresh_minutes)),
                    ("Hosts", r.source_hosts.join(", ")),
                ])
            )
        },
        |r| r.path.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
