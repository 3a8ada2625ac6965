use clap::ArgMatches;
use tracing::{error, info};

use super::helpers::load_config_with_warning;

pub(crate) fn handle_config_command(
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let json_output = matches.get_flag("json");

    info!(event = "cli.config_started", json_output = json_output);

    let config = load_config_with_warning();
    if let Err(e) = config.validate() {
        eprintln!("Configuration is invalid: {}", e);
        error!(event = "cli.config_failed", error = %e);
        idlewatch_core::events::log_app_error(&e);
        return Err(e.into());
    }

    let resolved = config.resolved();
    if json_output {
        println!("{}", serde_json::to_string_pretty(&resolved)?);
    } else {
        print!("{}", toml::to_string_pretty(&resolved)?);
    }

    info!(event = "cli.config_completed");
    Ok(())
}
