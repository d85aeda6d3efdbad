//! `config`: inspect gateway settings.

use sunline_config::{config_path, load_gateway_settings};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show { gateway_config } => {
            let path = gateway_config.unwrap_or_else(config_path);
            let display = path.display().to_string();
            let settings = load_gateway_settings(Some(path.as_path()))
                .map_err(|e| CliError::config(display.clone(), e))?;
            let toml = settings
                .to_toml()
                .map_err(|e| CliError::config(display, e))?;

            let out = output::render_single(
                global.output,
                &settings,
                |_| toml.trim_end().to_owned(),
                |s| s.listen.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config_path().display().to_string(), global.quiet);
            Ok(())
        }
    }
}
