//! ripple-core: snapshot aggregation and timeline reconstruction engine.
//!
//! Tracks how a set of social-media posts accumulate engagement (likes,
//! reposts) over time by repeatedly snapshotting the same posts and
//! reconstructing a per-post time series from the snapshots.
//!
//! Pipeline, in stage order:
//!
//! 1. [`snapshot`] loads one raw pull into an atomic batch, normalizing
//!    every record via [`normalize`] and tagging it with the capture
//!    instant.
//! 2. [`merge`] concatenates all batches into one chronological table and
//!    runs the advisory data-quality checks.
//! 3. [`origin`] synthesizes a zero-engagement record per post at its
//!    creation time, so timelines start at a true zero baseline.
//! 4. [`series`] filters to the configured window, drops replies, derives
//!    the plotting columns, and emits timezone-naive tidy rows.
//!
//! [`usage`] is an independent utility over the retrieval layer's quota
//! status; [`store`] owns the on-disk snapshot and merged-table layout;
//! [`config`] is the explicit configuration passed into the stages.
//!
//! Every stage is a pure synchronous transformation with by-value
//! handoff — no stage mutates its input table.

pub mod config;
pub mod merge;
pub mod normalize;
pub mod origin;
pub mod record;
pub mod series;
pub mod snapshot;
pub mod store;
pub mod usage;

pub use merge::{Anomaly, MergeOutcome, merge_batches};
pub use normalize::{MalformedRecord, normalize_post};
pub use origin::synthesize_origins;
pub use record::{PostRecord, Timestamp};
pub use series::{SeriesOptions, TidyRow, shape_series};
pub use snapshot::{Batch, BatchError, load_batch};
pub use usage::{UsageEntry, consumed_categories};
