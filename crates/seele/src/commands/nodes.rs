//! `seele nodes`: the node directory.

use seele_core::{NodeMeta, TelemetryConfig, fetch_directory};
use tabled::Tabled;

use super::util;
use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct NodeTableRow {
    #[tabled(rename = "UUID")]
    uuid: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Group")]
    group: String,
}

fn table_row(n: &NodeMeta) -> NodeTableRow {
    NodeTableRow {
        uuid: n.uuid.clone(),
        name: n.name.clone(),
        region: n.region.clone().unwrap_or_default(),
        group: n.group.clone().unwrap_or_default(),
    }
}

pub async fn handle(config: &TelemetryConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let client = config.client()?;
    let cancel = util::cancel_on_ctrl_c();
    let directory = fetch_directory(&client, &cancel).await?;

    let nodes: Vec<NodeMeta> = directory.iter().cloned().collect();
    let out = output::render_list(global.output, &nodes, table_row, |n| {
        format!("{}\t{}", n.uuid, n.name)
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
