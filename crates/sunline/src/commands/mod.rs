//! Command dispatch: bridges CLI args -> config/core/gateway -> output formatting.

pub mod config_cmd;
pub mod probe;
pub mod serve;
pub mod util;
pub mod validate;
pub mod webcams;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Serve(args) => serve::handle(args, global).await,
        Command::Webcams(args) => webcams::list(&args, global),
        Command::Preview(args) => webcams::preview(&args, global),
        Command::Probe(args) => probe::handle(args, global).await,
        Command::Validate(args) => validate::handle(args, global),
        Command::Config(args) => config_cmd::handle(args, global),
        // Completions is handled before dispatch
        Command::Completions(_) => Ok(()),
    }
}
