//! `seele history <uuid>`: latency probes and their newest sample.

use seele_core::{HistoryQuery, PingHistory, TaskWithLatest, TelemetryConfig};
use tabled::Tabled;

use super::util;
use crate::cli::{GlobalOpts, HistoryArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct TaskTableRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Interval")]
    interval: String,
    #[tabled(rename = "Loss")]
    loss: String,
    #[tabled(rename = "Latency")]
    latency: String,
    #[tabled(rename = "Sampled At")]
    sampled_at: String,
}

fn table_row(t: &TaskWithLatest) -> TaskTableRow {
    TaskTableRow {
        id: t.task.id,
        name: t.task.name.clone(),
        interval: format!("{}s", t.task.interval),
        loss: format!("{:.1}%", t.task.loss),
        latency: t
            .latest
            .map_or_else(|| "-".into(), |s| format!("{:.1} ms", s.value)),
        sampled_at: util::format_time(t.latest.map(|s| s.time)),
    }
}

fn plain_line(t: &TaskWithLatest) -> String {
    let latency = t
        .latest
        .map_or_else(|| "-".into(), |s| s.value.to_string());
    format!("{}\t{}\t{latency}", t.task.id, t.task.name)
}

fn render(history: &PingHistory, format: OutputFormat) -> String {
    output::render_single(
        format,
        history,
        |h| output::render_list(OutputFormat::Table, &h.tasks, table_row, plain_line),
        |h| output::render_list(OutputFormat::Plain, &h.tasks, table_row, plain_line),
    )
}

pub async fn handle(
    config: &TelemetryConfig,
    args: HistoryArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let client = config.client()?;
    let cancel = util::cancel_on_ctrl_c();
    let mut query = HistoryQuery::new(client, args.uuid, args.hours);
    let view = query.refresh(&cancel).await?;

    // A failed query still renders the known tasks, without latency.
    if let Some(err) = &view.error {
        tracing::warn!(uuid = query.uuid(), error = %err, "ping history unavailable");
        if !global.quiet {
            eprintln!("warning: latency data unavailable: {err}");
        }
    }

    output::print_output(&render(&view.history, global.output), global.quiet);

    let footer = view
        .history
        .last_updated
        .filter(|_| global.output == OutputFormat::Table && !global.quiet);
    if footer.is_some() {
        println!("last updated {}", util::format_time(footer));
    }
    Ok(())
}
