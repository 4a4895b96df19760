//! `vpnode profiles` -- inspect the portal's profile definitions.

use tabled::Tabled;

use vpnode_core::ProfileDefinition;

use crate::cli::{GlobalOpts, ProfilesArgs};
use crate::error::CliError;
use crate::output;

use super::{load_node_config, provisioner};

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "#")]
    number: u16,
    #[tabled(rename = "Inst")]
    instance: u16,
    #[tabled(rename = "Range")]
    range: String,
    #[tabled(rename = "Range (v6)")]
    range6: String,
    #[tabled(rename = "Procs")]
    processes: usize,
    #[tabled(rename = "Gateway")]
    gateway: String,
    #[tabled(rename = "NAT")]
    nat: String,
}

fn yes_no(flag: bool) -> String {
    if flag { "yes" } else { "no" }.into()
}

impl From<&ProfileDefinition> for ProfileRow {
    fn from(p: &ProfileDefinition) -> Self {
        Self {
            id: p.profile_id.clone(),
            number: p.profile_number,
            instance: p.instance_number,
            range: p.range.to_string(),
            range6: p.range6.to_string(),
            processes: p.process_count(),
            gateway: yes_no(p.default_gateway),
            nat: yes_no(p.use_nat),
        }
    }
}

pub async fn handle(args: ProfilesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = load_node_config(global)?;
    let provisioner = provisioner(&config, global, None)?;

    let mut profiles = provisioner.fetch_profiles().await?;
    if !args.all {
        profiles.retain(|p| !p.hide_profile);
    }

    let rendered = output::render_list(
        &global.output,
        &profiles,
        |p| ProfileRow::from(p),
        |p| p.profile_id.clone(),
    );
    output::print_output(&rendered, global.quiet);
    Ok(())
}
