//! Snapshot loader: one raw pull → one atomic batch of records.
//!
//! A snapshot is the result of pulling a bounded set of posts at one
//! instant. Every record in the batch carries the same `capture_time`, and
//! the batch is atomic: a single malformed element rejects the whole pull,
//! because downstream merging assumes a batch either happened entirely at
//! its capture instant or not at all.

use serde_json::Value;

use crate::normalize::{MalformedRecord, normalize_post};
use crate::record::{PostRecord, Timestamp};

/// One loaded snapshot: the records from a single pull of a single source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Identifier of the account/query the pull came from.
    pub source: String,
    /// The instant the pull was performed.
    pub captured_at: Timestamp,
    /// Normalized records, in pull order, all tagged with `captured_at`.
    pub records: Vec<PostRecord>,
}

/// A batch that failed normalization, identified by the offending element.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("record {index} in batch is malformed: {source}")]
pub struct BatchError {
    /// Zero-based position of the offending raw object in the pull.
    pub index: usize,
    #[source]
    pub source: MalformedRecord,
}

/// Normalize an ordered collection of raw post objects pulled at
/// `captured_at`.
///
/// Output order matches input order. Duplicate post IDs within the batch
/// are preserved as-is; cross-batch handling is the merger's job. An empty
/// pull is an empty batch, not an error.
///
/// # Errors
///
/// Fails fast with [`BatchError`] on the first malformed element — no
/// partial batch is ever accepted.
pub fn load_batch(
    source: impl Into<String>,
    raw: &[Value],
    captured_at: Timestamp,
) -> Result<Batch, BatchError> {
    let mut records = Vec::with_capacity(raw.len());
    for (index, object) in raw.iter().enumerate() {
        let record =
            normalize_post(object, captured_at).map_err(|source| BatchError { index, source })?;
        records.push(record);
    }
    Ok(Batch {
        source: source.into(),
        captured_at,
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::{load_batch, Batch};
    use crate::normalize::MalformedRecord;
    use crate::record::Timestamp;
    use serde_json::{Value, json};

    fn capture() -> Timestamp {
        Timestamp::parse_from_rfc3339("2026-08-29T12:00:00-05:00").expect("valid")
    }

    fn raw_post(id: u64, likes: u64) -> Value {
        json!({
            "id": id,
            "created_at": "2026-08-29T08:30:00-05:00",
            "user": { "screen_name": "chaosbird" },
            "text": format!("post {id}"),
            "favorite_count": likes,
            "retweet_count": 1,
            "is_quote_status": false,
            "in_reply_to_status_id": null
        })
    }

    #[test]
    fn every_record_carries_the_batch_capture_time() {
        let raw = vec![raw_post(1, 10), raw_post(2, 20), raw_post(3, 30)];
        let batch = load_batch("chaosbird", &raw, capture()).expect("load");

        assert_eq!(batch.records.len(), 3);
        for record in &batch.records {
            assert_eq!(record.capture_time, capture());
        }
        // Pull order is preserved.
        let ids: Vec<&str> = batch.records.iter().map(|r| r.post_id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3"]);
    }

    #[test]
    fn one_malformed_element_fails_the_whole_batch() {
        let mut bad = raw_post(2, 20);
        bad.as_object_mut().expect("object").remove("text");
        let raw = vec![raw_post(1, 10), bad, raw_post(3, 30)];

        let err = load_batch("chaosbird", &raw, capture()).expect_err("must fail");
        assert_eq!(err.index, 1);
        assert_eq!(err.source, MalformedRecord::MissingField("text"));
    }

    #[test]
    fn empty_pull_is_an_empty_batch() {
        let batch = load_batch("chaosbird", &[], capture()).expect("load");
        assert_eq!(
            batch,
            Batch {
                source: "chaosbird".to_string(),
                captured_at: capture(),
                records: Vec::new(),
            }
        );
    }

    #[test]
    fn duplicate_ids_within_a_batch_are_preserved() {
        let raw = vec![raw_post(7, 10), raw_post(7, 10)];
        let batch = load_batch("chaosbird", &raw, capture()).expect("load");
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.records[0].post_id, batch.records[1].post_id);
    }
}
