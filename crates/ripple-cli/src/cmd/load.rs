use anyhow::{Context as _, Result};
use chrono::Utc;
use clap::Args;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

use ripple_core::config::{RippleConfig, load_config};
use ripple_core::record::Timestamp;
use ripple_core::snapshot::load_batch;
use ripple_core::store::{SnapshotKey, SnapshotStore};

use crate::output::{OutputMode, pretty_kv, render_mode};

#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Source identifier the pull came from (account handle or query name).
    pub source: String,

    /// Path of the raw pull: a JSON array of post objects.
    pub file: PathBuf,

    /// Capture instant of the pull (RFC 3339). Defaults to now.
    #[arg(long, value_name = "TIMESTAMP")]
    pub captured_at: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoadSummary {
    source: String,
    captured_at: String,
    records: usize,
    snapshot: String,
}

/// Execute `rpl load`: validate one raw pull and store it as a snapshot.
///
/// The whole pull is normalized first — a single malformed element rejects
/// the batch before anything is written, so the store only ever holds
/// batches that will merge cleanly.
pub fn run_load(args: &LoadArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let config = load_config(project_root)?;
    let zone = config.zone()?;

    let captured_at: Timestamp = match args.captured_at.as_deref() {
        Some(raw) => Timestamp::parse_from_rfc3339(raw)
            .with_context(|| format!("invalid --captured-at '{raw}' (expected RFC 3339)"))?
            .with_timezone(&zone),
        None => Utc::now().with_timezone(&zone),
    };

    let content = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let raw: Vec<Value> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of post objects", args.file.display()))?;

    // Validate before persisting: fail-fast, no partial batch.
    let batch = load_batch(args.source.clone(), &raw, captured_at)
        .with_context(|| format!("rejecting pull {}", args.file.display()))?;

    let store = SnapshotStore::new(RippleConfig::resolve(project_root, &config.data_dir));
    store.ensure_dirs()?;
    let key = SnapshotKey {
        source: args.source.clone(),
        captured_at: captured_at.naive_local(),
    };
    let path = store.write_snapshot(&key, &raw)?;

    let summary = LoadSummary {
        source: batch.source,
        captured_at: captured_at.to_rfc3339(),
        records: batch.records.len(),
        snapshot: path.display().to_string(),
    };

    render_mode(
        output,
        &summary,
        |s, w| writeln!(w, "{}\t{}\t{}", s.source, s.captured_at, s.records),
        |s, w| {
            pretty_kv(w, "source", &s.source)?;
            pretty_kv(w, "captured_at", &s.captured_at)?;
            pretty_kv(w, "records", s.records.to_string())?;
            pretty_kv(w, "snapshot", &s.snapshot)
        },
    )
}
