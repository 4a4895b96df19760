//! `vpnode generate` -- write server configs and key material.

use owo_colors::OwoColorize;

use crate::cli::{GenerateArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::{load_node_config, provisioner};

pub async fn handle(args: GenerateArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = load_node_config(global)?;
    let provisioner = provisioner(&config, global, args.config_dir.clone())?;

    let summary = provisioner.write_profiles(args.profile.as_deref()).await?;

    if global.quiet {
        return Ok(());
    }

    let color = output::should_color(&global.color);
    for profile_id in &summary.profiles {
        if color {
            println!("{} {profile_id}", "✓".green());
        } else {
            println!("✓ {profile_id}");
        }
    }

    let dir = args
        .config_dir
        .unwrap_or_else(|| config.config_dir.clone());
    println!(
        "{} config file(s) written to {}",
        summary.files_written,
        dir.display()
    );
    Ok(())
}
