use anyhow::{Context as _, Result};
use chrono::DateTime;
use clap::Args;
use serde_json::Value;
use std::path::PathBuf;

use ripple_core::usage::{UsageEntry, consumed_categories};

use crate::output::{OutputMode, render_mode};

#[derive(Args, Debug)]
pub struct UsageArgs {
    /// Path of a quota-status JSON tree saved from the retrieval layer.
    pub file: PathBuf,
}

/// Execute `rpl usage`: report only the quota categories that have been
/// partially consumed, sorted by category path.
pub fn run_usage(args: &UsageArgs, output: OutputMode) -> Result<()> {
    let content = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let status: Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", args.file.display()))?;

    let entries = consumed_categories(&status);

    render_mode(
        output,
        &entries,
        |entries, w| {
            for entry in entries.iter() {
                writeln!(
                    w,
                    "{}\t{}\t{}",
                    entry.category_path, entry.remaining, entry.limit
                )?;
            }
            Ok(())
        },
        |entries, w| {
            if entries.is_empty() {
                writeln!(w, "No quota categories consumed.")?;
                return Ok(());
            }
            for entry in entries.iter() {
                writeln!(w, "{}", pretty_entry(entry))?;
            }
            Ok(())
        },
    )
}

fn pretty_entry(entry: &UsageEntry) -> String {
    let reset = entry
        .reset
        .and_then(|epoch| DateTime::from_timestamp(epoch, 0))
        .map_or_else(String::new, |at| {
            format!("  resets {}", at.format("%Y-%m-%d %H:%M:%S"))
        });
    format!(
        "{:<40} {:>6} / {:<6}{reset}",
        entry.category_path, entry.remaining, entry.limit
    )
}
