//! `seele watch`: stream realtime traffic for every node.
//!
//! Opens a [`Dashboard`], then renders the joined rows on every new frame.
//! Connection state changes and directory warnings go to stderr so stdout
//! stays parseable in the structured formats.

use seele_core::{Dashboard, NodeRow, TelemetryConfig};
use tabled::Tabled;

use super::util;
use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct LiveTableRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Up")]
    up: String,
    #[tabled(rename = "Down")]
    down: String,
    #[tabled(rename = "Total Up")]
    total_up: String,
    #[tabled(rename = "Total Down")]
    total_down: String,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

fn table_row(row: &NodeRow, color: bool) -> LiveTableRow {
    let (up, down, total_up, total_down) = match row.network {
        Some(net) => (
            util::format_rate(net.up),
            util::format_rate(net.down),
            util::format_total(net.total_up),
            util::format_total(net.total_down),
        ),
        None => ("-".into(), "-".into(), "-".into(), "-".into()),
    };
    LiveTableRow {
        name: row.name.clone(),
        status: util::online_badge(row.is_online, color),
        up,
        down,
        total_up,
        total_down,
        region: row.region.clone().unwrap_or_default(),
        updated: util::format_time(row.updated_at),
    }
}

fn plain_line(row: &NodeRow) -> String {
    let net = row.network.unwrap_or_default();
    format!(
        "{}\t{}\t{}\t{}",
        row.uuid,
        if row.is_online { "online" } else { "offline" },
        net.up,
        net.down
    )
}

pub async fn handle(
    config: &TelemetryConfig,
    args: &WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(global.color);
    let dashboard = Dashboard::open(config)?;
    let cancel = util::cancel_on_ctrl_c();

    let mut frames = dashboard.monitor().frames();
    let mut states = dashboard.monitor().connection_state();
    let mut directory = dashboard.directory();
    let mut rendered: u64 = 0;

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *states.borrow_and_update();
                if !global.quiet {
                    eprintln!("live: {}", util::state_badge(state, color));
                }
            }

            changed = directory.changed() => {
                if changed.is_err() {
                    break;
                }
                let warning = directory.borrow_and_update().warning().map(str::to_owned);
                if let Some(warning) = warning {
                    tracing::warn!(%warning, "node directory unavailable");
                    if !global.quiet {
                        eprintln!("warning: node names unavailable: {warning}");
                    }
                }
            }

            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
                let frame = std::sync::Arc::clone(&frames.borrow_and_update());
                let rows = dashboard.rows();

                if global.output == OutputFormat::Table && !global.quiet {
                    println!(
                        "frame {}: {}/{} online, updated {}",
                        frame.sequence,
                        frame.online_count(),
                        rows.len(),
                        util::format_time(frame.updated_at),
                    );
                }
                let out = output::render_list(
                    global.output,
                    &rows,
                    |r| table_row(r, color),
                    plain_line,
                );
                output::print_output(&out, global.quiet);

                rendered += 1;
                if args.count.is_some_and(|n| rendered >= n) {
                    break;
                }
            }
        }
    }

    dashboard.shutdown().await;
    Ok(())
}
