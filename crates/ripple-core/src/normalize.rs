//! Record normalizer: one raw post object → one [`PostRecord`].
//!
//! Raw post objects are the nested, sparse, platform-shaped JSON the
//! retrieval layer hands us. Normalization flattens them into the fixed
//! schema, failing with [`MalformedRecord`] when a required field is absent
//! or has the wrong primitive type, and modeling absent optional nested
//! data (quoted post, reposted post, reply target) as null fields rather
//! than failures.
//!
//! Normalization is pure: no I/O, no shared state, and the output order of
//! a batch matches its input order.

use serde_json::Value;

use crate::record::{PostRecord, Timestamp};

/// The platform's legacy creation-timestamp layout
/// (`Wed Oct 10 20:19:24 +0000 2018`).
const PLATFORM_TIME_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// A raw post object that cannot be normalized.
///
/// Any of these fails the entire containing batch — a partially-normalized
/// batch would break the invariant that `created_time` is stable per post.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedRecord {
    /// A required field is absent.
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    /// A required field is present but has the wrong primitive type.
    #[error("field '{field}' has wrong type, expected {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    /// The creation timestamp string could not be parsed.
    #[error("unparseable timestamp in '{field}': '{raw}'")]
    BadTimestamp { field: &'static str, raw: String },
}

/// Normalize one raw post object into a [`PostRecord`] tagged with the
/// capture instant of the batch it was pulled in.
///
/// # Errors
///
/// Returns [`MalformedRecord`] if any required field (`id`, `created_at`,
/// `user.screen_name`, `text`, `favorite_count`, `retweet_count`) is
/// absent or of the wrong primitive type.
pub fn normalize_post(raw: &Value, capture_time: Timestamp) -> Result<PostRecord, MalformedRecord> {
    let post_id = require_id(raw, "id")?;
    let created_time = parse_created_at(require_str(raw, "created_at")?)?;
    let author = require_str(
        raw.get("user").unwrap_or(&Value::Null),
        "user.screen_name",
    )?;
    let text = require_str(raw, "text")?;
    let like_count = require_count(raw, "favorite_count")?;
    let repost_count = require_count(raw, "retweet_count")?;

    // The quote flag comes from the source; the nested quoted object may
    // still be unresolvable (deleted or protected target). The flag alone
    // records the relationship, with nulled details.
    let is_quote = raw.get("is_quote_status").and_then(Value::as_bool) == Some(true);
    let quoted = if is_quote {
        raw.get("quoted_status").and_then(nested_summary)
    } else {
        None
    };

    // Repost status has no source flag; it is derived from presence.
    let reposted_status = raw.get("retweeted_status").filter(|v| v.is_object());
    let is_repost = reposted_status.is_some();
    let reposted = reposted_status.and_then(nested_summary);

    let reply_to_post_id = raw
        .get("in_reply_to_status_id")
        .filter(|v| !v.is_null())
        .and_then(id_string);
    let is_reply = reply_to_post_id.is_some();
    let reply_to_author = if is_reply {
        raw.get("in_reply_to_screen_name")
            .and_then(Value::as_str)
            .map(str::to_string)
    } else {
        None
    };

    let (quoted_post_id, quoted_author, quoted_text, quoted_repost_count, quoted_like_count) =
        split_summary(quoted);
    let (
        reposted_post_id,
        reposted_author,
        reposted_text,
        reposted_repost_count,
        reposted_like_count,
    ) = split_summary(reposted);

    Ok(PostRecord {
        post_id,
        capture_time,
        created_time,
        author,
        text,
        repost_count,
        like_count,
        is_quote,
        quoted_post_id,
        quoted_author,
        quoted_text,
        quoted_repost_count,
        quoted_like_count,
        is_repost,
        reposted_post_id,
        reposted_author,
        reposted_text,
        reposted_repost_count,
        reposted_like_count,
        is_reply,
        reply_to_post_id,
        reply_to_author,
    })
}

/// The five fields extracted from a nested quoted/reposted post object.
struct NestedSummary {
    post_id: String,
    author: String,
    text: String,
    repost_count: u64,
    like_count: u64,
}

/// Extract the referenced-post summary from a nested object.
///
/// Returns `None` when the nested object lacks any of the needed fields —
/// the referencing flag is still recorded, only the details stay null.
fn nested_summary(nested: &Value) -> Option<NestedSummary> {
    Some(NestedSummary {
        post_id: nested.get("id").and_then(id_string)?,
        author: nested
            .get("user")
            .and_then(|u| u.get("screen_name"))
            .and_then(Value::as_str)
            .map(str::to_string)?,
        text: nested.get("text").and_then(Value::as_str).map(str::to_string)?,
        repost_count: nested.get("retweet_count").and_then(Value::as_u64)?,
        like_count: nested.get("favorite_count").and_then(Value::as_u64)?,
    })
}

type SummaryFields = (
    Option<String>,
    Option<String>,
    Option<String>,
    Option<u64>,
    Option<u64>,
);

fn split_summary(summary: Option<NestedSummary>) -> SummaryFields {
    summary.map_or((None, None, None, None, None), |s| {
        (
            Some(s.post_id),
            Some(s.author),
            Some(s.text),
            Some(s.repost_count),
            Some(s.like_count),
        )
    })
}

/// Render a post identifier to its opaque string form.
///
/// The platform serializes IDs as integers; defensively accept strings too
/// since `id_str` variants exist in the wild.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn require_id(raw: &Value, field: &'static str) -> Result<String, MalformedRecord> {
    let value = raw.get(field).ok_or(MalformedRecord::MissingField(field))?;
    id_string(value).ok_or(MalformedRecord::WrongType {
        field,
        expected: "integer or string",
    })
}

fn require_str(raw: &Value, field: &'static str) -> Result<String, MalformedRecord> {
    // `field` may be a dotted path label for a nested lookup; only the last
    // segment is the actual key on `raw`.
    let key = field.rsplit('.').next().unwrap_or(field);
    let value = raw.get(key).ok_or(MalformedRecord::MissingField(field))?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or(MalformedRecord::WrongType {
            field,
            expected: "string",
        })
}

fn require_count(raw: &Value, field: &'static str) -> Result<u64, MalformedRecord> {
    let value = raw.get(field).ok_or(MalformedRecord::MissingField(field))?;
    value.as_u64().ok_or(MalformedRecord::WrongType {
        field,
        expected: "non-negative integer",
    })
}

fn parse_created_at(raw: String) -> Result<Timestamp, MalformedRecord> {
    Timestamp::parse_from_str(&raw, PLATFORM_TIME_FORMAT)
        .or_else(|_| Timestamp::parse_from_rfc3339(&raw))
        .map_err(|_| MalformedRecord::BadTimestamp {
            field: "created_at",
            raw,
        })
}

#[cfg(test)]
mod tests {
    use super::{MalformedRecord, normalize_post};
    use crate::record::Timestamp;
    use serde_json::{Value, json};

    fn capture() -> Timestamp {
        Timestamp::parse_from_rfc3339("2026-08-29T12:00:00-05:00").expect("valid")
    }

    fn base_post() -> Value {
        json!({
            "id": 1_048_577_029_000_001_u64,
            "created_at": "Sat Aug 29 08:30:00 -0500 2026",
            "user": { "screen_name": "chaosbird" },
            "text": "the timeline is a flat circle",
            "favorite_count": 17,
            "retweet_count": 3,
            "is_quote_status": false,
            "in_reply_to_status_id": null
        })
    }

    #[test]
    fn required_fields_roundtrip_exactly() {
        let record = normalize_post(&base_post(), capture()).expect("normalize");
        assert_eq!(record.post_id, "1048577029000001");
        assert_eq!(record.author, "chaosbird");
        assert_eq!(record.text, "the timeline is a flat circle");
        assert_eq!(record.like_count, 17);
        assert_eq!(record.repost_count, 3);
        assert_eq!(record.capture_time, capture());
        assert_eq!(
            record.created_time,
            Timestamp::parse_from_rfc3339("2026-08-29T08:30:00-05:00").expect("valid")
        );
    }

    #[test]
    fn plain_post_has_no_relationships() {
        let record = normalize_post(&base_post(), capture()).expect("normalize");
        assert!(!record.is_quote);
        assert!(!record.is_repost);
        assert!(!record.is_reply);
        assert!(record.quoted_post_id.is_none());
        assert!(record.reposted_post_id.is_none());
        assert!(record.reply_to_post_id.is_none());
    }

    #[test]
    fn missing_required_field_is_malformed() {
        let mut raw = base_post();
        raw.as_object_mut().expect("object").remove("text");
        assert_eq!(
            normalize_post(&raw, capture()),
            Err(MalformedRecord::MissingField("text"))
        );
    }

    #[test]
    fn wrong_count_type_is_malformed() {
        let mut raw = base_post();
        raw["favorite_count"] = json!("seventeen");
        assert!(matches!(
            normalize_post(&raw, capture()),
            Err(MalformedRecord::WrongType {
                field: "favorite_count",
                ..
            })
        ));
    }

    #[test]
    fn negative_count_is_malformed() {
        let mut raw = base_post();
        raw["retweet_count"] = json!(-1);
        assert!(matches!(
            normalize_post(&raw, capture()),
            Err(MalformedRecord::WrongType {
                field: "retweet_count",
                ..
            })
        ));
    }

    #[test]
    fn missing_author_reports_nested_path() {
        let mut raw = base_post();
        raw["user"] = json!({});
        assert_eq!(
            normalize_post(&raw, capture()),
            Err(MalformedRecord::MissingField("user.screen_name"))
        );
    }

    #[test]
    fn bad_timestamp_is_malformed() {
        let mut raw = base_post();
        raw["created_at"] = json!("last tuesday");
        assert!(matches!(
            normalize_post(&raw, capture()),
            Err(MalformedRecord::BadTimestamp { .. })
        ));
    }

    #[test]
    fn rfc3339_created_at_is_accepted() {
        let mut raw = base_post();
        raw["created_at"] = json!("2026-08-29T08:30:00-05:00");
        let record = normalize_post(&raw, capture()).expect("normalize");
        assert_eq!(
            record.created_time,
            Timestamp::parse_from_rfc3339("2026-08-29T08:30:00-05:00").expect("valid")
        );
    }

    #[test]
    fn resolvable_quote_populates_details() {
        let mut raw = base_post();
        raw["is_quote_status"] = json!(true);
        raw["quoted_status"] = json!({
            "id": 999,
            "user": { "screen_name": "quarry" },
            "text": "original take",
            "retweet_count": 40,
            "favorite_count": 200
        });

        let record = normalize_post(&raw, capture()).expect("normalize");
        assert!(record.is_quote);
        assert_eq!(record.quoted_post_id.as_deref(), Some("999"));
        assert_eq!(record.quoted_author.as_deref(), Some("quarry"));
        assert_eq!(record.quoted_text.as_deref(), Some("original take"));
        assert_eq!(record.quoted_repost_count, Some(40));
        assert_eq!(record.quoted_like_count, Some(200));
    }

    #[test]
    fn unresolvable_quote_keeps_flag_with_null_details() {
        let mut raw = base_post();
        raw["is_quote_status"] = json!(true);
        // No quoted_status object at all: target deleted or protected.

        let record = normalize_post(&raw, capture()).expect("normalize");
        assert!(record.is_quote);
        assert!(record.quoted_post_id.is_none());
        assert!(record.quoted_author.is_none());
        assert!(record.quoted_text.is_none());
        assert!(record.quoted_repost_count.is_none());
        assert!(record.quoted_like_count.is_none());
    }

    #[test]
    fn repost_flag_derives_from_presence() {
        let mut raw = base_post();
        raw["retweeted_status"] = json!({
            "id": 777,
            "user": { "screen_name": "origin_author" },
            "text": "the post being boosted",
            "retweet_count": 1200,
            "favorite_count": 5000
        });

        let record = normalize_post(&raw, capture()).expect("normalize");
        assert!(record.is_repost);
        assert_eq!(record.reposted_post_id.as_deref(), Some("777"));
        assert_eq!(record.reposted_author.as_deref(), Some("origin_author"));
        assert_eq!(record.reposted_repost_count, Some(1200));
        assert_eq!(record.reposted_like_count, Some(5000));
    }

    #[test]
    fn reply_derives_from_non_null_target() {
        let mut raw = base_post();
        raw["in_reply_to_status_id"] = json!(4242);
        raw["in_reply_to_screen_name"] = json!("parent_author");

        let record = normalize_post(&raw, capture()).expect("normalize");
        assert!(record.is_reply);
        assert_eq!(record.reply_to_post_id.as_deref(), Some("4242"));
        assert_eq!(record.reply_to_author.as_deref(), Some("parent_author"));
    }

    #[test]
    fn repost_and_quote_flags_are_independent() {
        let mut raw = base_post();
        raw["is_quote_status"] = json!(true);
        raw["retweeted_status"] = json!({
            "id": 777,
            "user": { "screen_name": "origin_author" },
            "text": "a repost of a quote",
            "retweet_count": 9,
            "favorite_count": 12
        });

        let record = normalize_post(&raw, capture()).expect("normalize");
        assert!(record.is_quote);
        assert!(record.is_repost);
        // Quote target itself was not resolvable here.
        assert!(record.quoted_post_id.is_none());
        assert!(record.reposted_post_id.is_some());
    }

    #[test]
    fn string_ids_are_accepted() {
        let mut raw = base_post();
        raw["id"] = json!("1048577029000001");
        let record = normalize_post(&raw, capture()).expect("normalize");
        assert_eq!(record.post_id, "1048577029000001");
    }
}
