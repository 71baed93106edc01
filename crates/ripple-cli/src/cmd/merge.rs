use anyhow::{Context as _, Result};
use clap::Args;
use serde::Serialize;
use std::path::Path;
use tracing::warn;

use ripple_core::config::{RippleConfig, load_config};
use ripple_core::merge::{Anomaly, merge_batches};
use ripple_core::snapshot::{Batch, load_batch};
use ripple_core::store::{SnapshotStore, write_table};

use crate::output::{OutputMode, pretty_kv, pretty_rule, render_mode};

#[derive(Args, Debug)]
pub struct MergeArgs {}

#[derive(Debug, Serialize)]
struct SkippedBatch {
    snapshot: String,
    reason: String,
}

#[derive(Debug, Serialize)]
struct MergeSummary {
    batches: usize,
    records: usize,
    posts: usize,
    skipped: Vec<SkippedBatch>,
    anomalies: Vec<String>,
    table: String,
}

/// Execute `rpl merge`: load every stored snapshot, merge them into one
/// chronological table, and replace the merged-table artifact.
///
/// A snapshot that cannot be read, parsed, or normalized is reported by
/// identity and skipped whole — no partial batch ever reaches the table,
/// and the other batches are unaffected. Advisory anomalies (inconsistent creation
/// times, decreasing counts) are surfaced in the summary, never fatal.
pub fn run_merge(_args: &MergeArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let config = load_config(project_root)?;
    let zone = config.zone()?;
    let store = SnapshotStore::new(RippleConfig::resolve(project_root, &config.data_dir));

    let mut batches: Vec<Batch> = Vec::new();
    let mut skipped: Vec<SkippedBatch> = Vec::new();

    for key in store.list_snapshots()? {
        let captured_at = key
            .captured_at
            .and_local_timezone(zone)
            .single()
            .with_context(|| format!("snapshot stamp out of range: {}", key.file_name()))?;

        let raw = match store.read_snapshot(&key) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(snapshot = %key.file_name(), %err, "skipping unreadable snapshot file");
                skipped.push(SkippedBatch {
                    snapshot: key.file_name(),
                    reason: err.to_string(),
                });
                continue;
            }
        };
        match load_batch(key.source.clone(), &raw, captured_at) {
            Ok(batch) => batches.push(batch),
            Err(err) => {
                warn!(snapshot = %key.file_name(), %err, "skipping malformed snapshot batch");
                skipped.push(SkippedBatch {
                    snapshot: key.file_name(),
                    reason: err.to_string(),
                });
            }
        }
    }

    let batch_count = batches.len();
    let outcome = merge_batches(batches);

    let mut posts: Vec<&str> = outcome.table.iter().map(|r| r.post_id.as_str()).collect();
    posts.sort_unstable();
    posts.dedup();

    let table_path = RippleConfig::resolve(project_root, &config.table_path);
    write_table(&table_path, &outcome.table)
        .with_context(|| format!("Failed to write {}", table_path.display()))?;

    let summary = MergeSummary {
        batches: batch_count,
        records: outcome.table.len(),
        posts: posts.len(),
        skipped,
        anomalies: outcome.anomalies.iter().map(describe_anomaly).collect(),
        table: table_path.display().to_string(),
    };

    render_mode(
        output,
        &summary,
        |s, w| {
            writeln!(
                w,
                "batches={}\trecords={}\tposts={}\tskipped={}\tanomalies={}",
                s.batches,
                s.records,
                s.posts,
                s.skipped.len(),
                s.anomalies.len()
            )
        },
        |s, w| {
            pretty_kv(w, "batches", s.batches.to_string())?;
            pretty_kv(w, "records", s.records.to_string())?;
            pretty_kv(w, "posts", s.posts.to_string())?;
            pretty_kv(w, "table", &s.table)?;
            if !s.skipped.is_empty() {
                pretty_rule(w)?;
                for skip in &s.skipped {
                    writeln!(w, "skipped {}: {}", skip.snapshot, skip.reason)?;
                }
            }
            if !s.anomalies.is_empty() {
                pretty_rule(w)?;
                for anomaly in &s.anomalies {
                    writeln!(w, "anomaly: {anomaly}")?;
                }
            }
            Ok(())
        },
    )
}

fn describe_anomaly(anomaly: &Anomaly) -> String {
    match anomaly {
        Anomaly::InconsistentCreationTime {
            post_id,
            kept,
            discarded,
        } => format!(
            "post {post_id}: created_time disagreement, kept {kept}, discarded {discarded}"
        ),
        Anomaly::NonMonotonicCount {
            post_id,
            metric,
            at,
            previous,
            current,
        } => format!("post {post_id}: {metric} decreased {previous} -> {current} at {at}"),
    }
}
