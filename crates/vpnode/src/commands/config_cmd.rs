//! `vpnode config` -- inspect the node configuration.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => show(global),
        ConfigCommand::Path => {
            let path = global
                .config
                .clone()
                .unwrap_or_else(vpnode_config::config_path);
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn show(global: &GlobalOpts) -> Result<(), CliError> {
    let mut config = vpnode_config::load_config(global.config.as_deref())?;

    // never print key material
    if config.api_key.is_some() {
        config.api_key = Some("<redacted>".into());
    }

    let rendered = vpnode_config::to_toml(&config)?;
    output::print_output(rendered.trim_end(), global.quiet);
    Ok(())
}
