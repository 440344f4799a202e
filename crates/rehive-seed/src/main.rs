//! rehive-seed: upserts canonical posts into Directus, keyed by slug.

mod args;
mod client;
mod seed;


use std::error::Error as _;
use std::fmt;
use std::process;

use clap::Parser;
use tracing::{Event, Level, Subscriber, info};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use args::Args;
use client::SeedError;

#[tokio::main]
async fn main() {
    init_logging();
    let args = Args::parse();

    match seed::run(&args).await {
        Ok(report) => {
            info!(
                target: "seed",
                "Summary: {} created, {} updated, {} skipped.",
                report.created,
                report.updated,
                report.skipped
            );
        }
        Err(err) => {
            report_failure(&err);
            process::exit(1);
        }
    }
}

/// Prints each event as `[<target>] <message>` on stdout.
struct TargetPrefixed;

impl<S, N> FormatEvent<S, N> for TargetPrefixed
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(writer, "[{}] ", event.metadata().target())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn init_logging() {
    let result = tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stdout)
        .event_format(TargetPrefixed)
        .try_init();
    if let Err(err) = result {
        eprintln!("[seed] logging disabled: {err}");
    }
}

fn report_failure(err: &SeedError) {
    eprintln!("[seed] Failed: {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("[seed]   caused by: {cause}");
        source = cause.source();
    }
}
