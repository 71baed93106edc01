//! Series filter & shaper: merged table → tidy rows ready for charting.
//!
//! One row per (post, capture instant), ascending by capture time, with
//! derived `engagement_total` and `display_label` columns. All instants
//! are converted to a single configured zone before filtering and then
//! stripped of zone information for output — the downstream plotting layer
//! renders naive timestamps, and a consistent conversion keeps the sort
//! order computed before stripping valid afterwards.

use chrono::{FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::record::{PostRecord, Timestamp};

/// Separator used to stack the label lines in hover text.
const LABEL_SEPARATOR: &str = "<br />";

/// Caller-supplied shaping options.
///
/// Passed explicitly rather than read from ambient state so tests can
/// inject a fixed zone and cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesOptions {
    /// The local zone every instant is converted to before filtering.
    pub zone: FixedOffset,
    /// Rows are kept only when both `capture_time` and `created_time` fall
    /// strictly after this instant. Defaults to local midnight "today" at
    /// the call site (see [`crate::config::local_midnight`]).
    pub cutoff: Timestamp,
}

/// One timezone-naive output row, keyed for plotting: one series per post,
/// x = `capture_time`, y = engagement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TidyRow {
    pub post_id: String,
    pub capture_time: NaiveDateTime,
    pub created_time: NaiveDateTime,
    pub author: String,
    pub text: String,
    pub like_count: u64,
    pub repost_count: u64,
    pub engagement_total: u64,
    pub display_label: String,

    pub is_quote: bool,
    pub quoted_post_id: Option<String>,
    pub quoted_author: Option<String>,
    pub quoted_text: Option<String>,
    pub quoted_repost_count: Option<u64>,
    pub quoted_like_count: Option<u64>,

    pub is_repost: bool,
    pub reposted_post_id: Option<String>,
    pub reposted_author: Option<String>,
    pub reposted_text: Option<String>,
    pub reposted_repost_count: Option<u64>,
    pub reposted_like_count: Option<u64>,

    pub reply_to_post_id: Option<String>,
    pub reply_to_author: Option<String>,
}

/// Shape the merged-and-synthesized table into tidy rows.
///
/// - keeps rows where both instants fall strictly after the cutoff;
/// - drops replies (excluded from engagement tracking by policy);
/// - derives `engagement_total` and the hover `display_label`;
/// - converts to the configured zone, then emits naive timestamps.
///
/// A cutoff past all data degrades to an empty output, never an error.
#[must_use]
pub fn shape_series(table: &[PostRecord], options: &SeriesOptions) -> Vec<TidyRow> {
    let mut rows: Vec<&PostRecord> = table.iter().collect();
    rows.sort_by_key(|r| r.capture_time);

    rows.into_iter()
        .filter(|r| r.capture_time > options.cutoff && r.created_time > options.cutoff)
        .filter(|r| !r.is_reply)
        .map(|r| tidy_row(r, options.zone))
        .collect()
}

fn tidy_row(record: &PostRecord, zone: FixedOffset) -> TidyRow {
    let capture_local = record.capture_time.with_timezone(&zone);
    let created_local = record.created_time.with_timezone(&zone);

    let display_label = format!(
        "{}{LABEL_SEPARATOR}{}{LABEL_SEPARATOR}{}",
        record.author,
        record.text,
        created_local.naive_local(),
    );

    TidyRow {
        post_id: record.post_id.clone(),
        capture_time: capture_local.naive_local(),
        created_time: created_local.naive_local(),
        author: record.author.clone(),
        text: record.text.clone(),
        like_count: record.like_count,
        repost_count: record.repost_count,
        engagement_total: record.engagement_total(),
        display_label,
        is_quote: record.is_quote,
        quoted_post_id: record.quoted_post_id.clone(),
        quoted_author: record.quoted_author.clone(),
        quoted_text: record.quoted_text.clone(),
        quoted_repost_count: record.quoted_repost_count,
        quoted_like_count: record.quoted_like_count,
        is_repost: record.is_repost,
        reposted_post_id: record.reposted_post_id.clone(),
        reposted_author: record.reposted_author.clone(),
        reposted_text: record.reposted_text.clone(),
        reposted_repost_count: record.reposted_repost_count,
        reposted_like_count: record.reposted_like_count,
        reply_to_post_id: record.reply_to_post_id.clone(),
        reply_to_author: record.reply_to_author.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::{SeriesOptions, shape_series};
    use crate::record::{PostRecord, Timestamp};
    use chrono::FixedOffset;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse_from_rfc3339(s).expect("valid test timestamp")
    }

    fn chicago() -> FixedOffset {
        FixedOffset::west_opt(5 * 3600).expect("valid offset")
    }

    fn options(cutoff: &str) -> SeriesOptions {
        SeriesOptions {
            zone: chicago(),
            cutoff: ts(cutoff),
        }
    }

    fn record(post_id: &str, captured: &str, created: &str, likes: u64, reposts: u64) -> PostRecord {
        PostRecord {
            post_id: post_id.to_string(),
            capture_time: ts(captured),
            created_time: ts(created),
            author: "chaosbird".to_string(),
            text: format!("post {post_id}"),
            repost_count: reposts,
            like_count: likes,
            is_quote: false,
            quoted_post_id: None,
            quoted_author: None,
            quoted_text: None,
            quoted_repost_count: None,
            quoted_like_count: None,
            is_repost: false,
            reposted_post_id: None,
            reposted_author: None,
            reposted_text: None,
            reposted_repost_count: None,
            reposted_like_count: None,
            is_reply: false,
            reply_to_post_id: None,
            reply_to_author: None,
        }
    }

    #[test]
    fn derives_engagement_total_and_label() {
        let table = vec![record(
            "a",
            "2026-08-29T10:00:00-05:00",
            "2026-08-29T08:00:00-05:00",
            3,
            1,
        )];
        let rows = shape_series(&table, &options("2026-08-29T00:00:00-05:00"));

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].engagement_total, 4);
        assert_eq!(
            rows[0].display_label,
            "chaosbird<br />post a<br />2026-08-29 08:00:00"
        );
    }

    #[test]
    fn rows_at_or_before_cutoff_are_dropped() {
        let cutoff = "2026-08-29T10:00:00-05:00";
        let table = vec![
            // capture exactly at the cutoff: dropped (strictly-after bound).
            record("at", cutoff, "2026-08-29T10:00:00-05:00", 1, 0),
            // created before the cutoff: dropped even though captured after.
            record("old", "2026-08-29T11:00:00-05:00", "2026-08-29T09:00:00-05:00", 1, 0),
            // both after: kept.
            record("new", "2026-08-29T12:00:00-05:00", "2026-08-29T10:30:00-05:00", 1, 0),
        ];

        let rows = shape_series(&table, &options(cutoff));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].post_id, "new");
    }

    #[test]
    fn replies_are_excluded() {
        let mut reply = record(
            "r",
            "2026-08-29T10:00:00-05:00",
            "2026-08-29T09:00:00-05:00",
            2,
            0,
        );
        reply.is_reply = true;
        reply.reply_to_post_id = Some("parent".to_string());
        let keep = record(
            "k",
            "2026-08-29T10:00:00-05:00",
            "2026-08-29T09:00:00-05:00",
            2,
            0,
        );

        let rows = shape_series(&[reply, keep], &options("2026-08-29T00:00:00-05:00"));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].post_id, "k");
    }

    #[test]
    fn output_is_naive_in_the_configured_zone() {
        // Record carries a UTC offset; output must be local-naive.
        let table = vec![record(
            "a",
            "2026-08-29T15:00:00+00:00",
            "2026-08-29T13:00:00+00:00",
            1,
            0,
        )];
        let rows = shape_series(&table, &options("2026-08-29T00:00:00-05:00"));

        assert_eq!(rows[0].capture_time.to_string(), "2026-08-29 10:00:00");
        assert_eq!(rows[0].created_time.to_string(), "2026-08-29 08:00:00");
    }

    #[test]
    fn output_stays_ascending_by_capture_time() {
        let created = "2026-08-29T08:00:00-05:00";
        let table = vec![
            record("b", "2026-08-29T12:00:00-05:00", created, 5, 0),
            record("a", "2026-08-29T10:00:00-05:00", created, 3, 0),
            record("c", "2026-08-29T11:00:00-05:00", created, 4, 0),
        ];

        let rows = shape_series(&table, &options("2026-08-29T00:00:00-05:00"));
        let ids: Vec<&str> = rows.iter().map(|r| r.post_id.as_str()).collect();
        assert_eq!(ids, ["a", "c", "b"]);
    }

    #[test]
    fn cutoff_past_all_data_yields_empty_output() {
        let table = vec![record(
            "a",
            "2026-08-29T10:00:00-05:00",
            "2026-08-29T08:00:00-05:00",
            3,
            1,
        )];
        let rows = shape_series(&table, &options("2026-08-30T00:00:00-05:00"));
        assert!(rows.is_empty());
    }
}
