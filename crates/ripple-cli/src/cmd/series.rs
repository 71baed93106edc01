use anyhow::{Context as _, Result};
use chrono::Utc;
use clap::Args;
use std::path::Path;

use ripple_core::config::{RippleConfig, load_config, local_midnight};
use ripple_core::record::Timestamp;
use ripple_core::series::{SeriesOptions, TidyRow, shape_series};
use ripple_core::store::read_table;
use ripple_core::synthesize_origins;

use crate::output::{OutputMode, render_mode};

#[derive(Args, Debug)]
pub struct SeriesArgs {
    /// Keep only rows captured and created strictly after this instant
    /// (RFC 3339). Defaults to local midnight today.
    #[arg(long, value_name = "TIMESTAMP")]
    pub cutoff: Option<String>,
}

/// Execute `rpl series`: read the merged table, synthesize per-post zero
/// origins, filter to the window, and emit tidy rows ascending by capture
/// time. A missing or fully-filtered table yields an empty series.
pub fn run_series(args: &SeriesArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let config = load_config(project_root)?;
    let zone = config.zone()?;

    let cutoff: Timestamp = match args.cutoff.as_deref() {
        Some(raw) => Timestamp::parse_from_rfc3339(raw)
            .with_context(|| format!("invalid --cutoff '{raw}' (expected RFC 3339)"))?
            .with_timezone(&zone),
        None => local_midnight(Utc::now(), zone)
            .context("configured utc_offset produced an unrepresentable midnight")?,
    };

    let table_path = RippleConfig::resolve(project_root, &config.table_path);
    let table = read_table(&table_path)
        .with_context(|| format!("Failed to read {}", table_path.display()))?;

    let table = synthesize_origins(table);
    let rows = shape_series(&table, &SeriesOptions { zone, cutoff });

    render_mode(
        output,
        &rows,
        |rows, w| {
            for row in rows.iter() {
                writeln!(
                    w,
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    row.capture_time,
                    row.post_id,
                    row.author,
                    row.like_count,
                    row.repost_count,
                    row.engagement_total
                )?;
            }
            Ok(())
        },
        |rows, w| {
            if rows.is_empty() {
                writeln!(w, "No rows after the cutoff.")?;
                return Ok(());
            }
            for row in rows.iter() {
                writeln!(w, "{}", pretty_row(row))?;
            }
            Ok(())
        },
    )
}

fn pretty_row(row: &TidyRow) -> String {
    format!(
        "{}  {:<20} @{:<16} likes {:>6}  reposts {:>5}  total {:>6}",
        row.capture_time,
        row.post_id,
        row.author,
        row.like_count,
        row.repost_count,
        row.engagement_total
    )
}
