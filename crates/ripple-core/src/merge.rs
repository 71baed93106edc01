//! Timeline merger: all loaded batches → one chronological table.
//!
//! Concatenates every batch and stable-sorts the combined table by
//! `capture_time` ascending, so records with equal capture times retain
//! their relative input order. The merger does **not** deduplicate
//! `post_id` × `capture_time` pairs — two overlapping pulls observing the
//! same post at the same instant both survive. This is intentional
//! raw-data preservation; display-level shaping happens downstream.
//!
//! The merger also runs the advisory data-quality checks. Neither check
//! ever fails the merge:
//!
//! - `created_time` must be constant per post. A disagreement is a source
//!   defect (clock skew happens); the earliest-observed value is kept, the
//!   later records are reconciled to it, and the defect is logged and
//!   reported as an [`Anomaly`].
//! - like/repost counts should be non-decreasing per post over capture
//!   time. Decreases are flagged, never corrected.

use std::collections::HashMap;

use tracing::warn;

use crate::record::{PostRecord, Timestamp};
use crate::snapshot::Batch;

/// An advisory data-quality finding from the merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anomaly {
    /// A post's `created_time` differed across snapshots. The value from
    /// the earliest observation was kept.
    InconsistentCreationTime {
        post_id: String,
        kept: Timestamp,
        discarded: Timestamp,
    },
    /// An engagement count decreased between consecutive observations.
    NonMonotonicCount {
        post_id: String,
        metric: &'static str,
        at: Timestamp,
        previous: u64,
        current: u64,
    },
}

/// The merged table plus everything the advisory checks flagged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// All records from all batches, sorted by `capture_time` ascending.
    pub table: Vec<PostRecord>,
    pub anomalies: Vec<Anomaly>,
}

/// Merge all loaded batches into a single chronological table.
///
/// Batch discovery order is irrelevant: the same set of batches yields the
/// same table regardless of the order they are supplied in (up to ties in
/// `capture_time`, which retain supplied order). Zero batches produce an
/// empty table, not an error.
#[must_use]
pub fn merge_batches(batches: Vec<Batch>) -> MergeOutcome {
    let mut table: Vec<PostRecord> = batches.into_iter().flat_map(|b| b.records).collect();
    table.sort_by_key(|r| r.capture_time);

    let mut anomalies = reconcile_creation_times(&mut table);
    anomalies.extend(check_monotonic_counts(&table));

    MergeOutcome { table, anomalies }
}

/// Enforce the earliest-seen `created_time` per post.
///
/// Later records that disagree are rewritten to the kept value so the rest
/// of the pipeline sees a single creation instant per post. Never silent:
/// each rewrite is logged and reported.
fn reconcile_creation_times(table: &mut [PostRecord]) -> Vec<Anomaly> {
    let mut kept: HashMap<String, Timestamp> = HashMap::new();
    let mut anomalies = Vec::new();

    for record in table.iter_mut() {
        match kept.get(&record.post_id) {
            None => {
                kept.insert(record.post_id.clone(), record.created_time);
            }
            Some(&kept_time) if kept_time == record.created_time => {}
            Some(&kept_time) => {
                warn!(
                    post_id = %record.post_id,
                    kept = %kept_time,
                    discarded = %record.created_time,
                    "inconsistent created_time across snapshots, keeping earliest-seen"
                );
                anomalies.push(Anomaly::InconsistentCreationTime {
                    post_id: record.post_id.clone(),
                    kept: kept_time,
                    discarded: record.created_time,
                });
                record.created_time = kept_time;
            }
        }
    }

    anomalies
}

/// Flag engagement counts that decrease between consecutive observations
/// of the same post. Assumes `table` is sorted by `capture_time`.
fn check_monotonic_counts(table: &[PostRecord]) -> Vec<Anomaly> {
    let mut last_seen: HashMap<&str, (u64, u64)> = HashMap::new();
    let mut anomalies = Vec::new();

    for record in table {
        if let Some(&(likes, reposts)) = last_seen.get(record.post_id.as_str()) {
            for (metric, previous, current) in [
                ("like_count", likes, record.like_count),
                ("repost_count", reposts, record.repost_count),
            ] {
                if current < previous {
                    warn!(
                        post_id = %record.post_id,
                        metric,
                        previous,
                        current,
                        at = %record.capture_time,
                        "engagement count decreased between observations"
                    );
                    anomalies.push(Anomaly::NonMonotonicCount {
                        post_id: record.post_id.clone(),
                        metric,
                        at: record.capture_time,
                        previous,
                        current,
                    });
                }
            }
        }
        last_seen.insert(
            record.post_id.as_str(),
            (record.like_count, record.repost_count),
        );
    }

    anomalies
}
