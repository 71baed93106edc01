use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Zone-aware instant used throughout the pipeline.
///
/// Records stay zone-aware until the final shaping stage, which converts
/// everything to one configured zone and then strips the offset for output.
pub type Timestamp = DateTime<FixedOffset>;

/// One post as observed at one capture instant.
///
/// `post_id` is unique per underlying post, not per record: the same post
/// shows up once per snapshot it was captured in. `created_time` is
/// invariant across all records sharing a `post_id`; the merger treats a
/// disagreement as a source defect and reconciles it (see
/// [`crate::merge`]).
///
/// The quote/repost/reply relationships are flat flag-gated nullable field
/// groups rather than subtypes. The flags are independent (a repost can
/// itself be a quote), and each group's fields are populated only when its
/// flag is true. A quote whose target could not be resolved keeps
/// `is_quote = true` with all `quoted_*` fields null — the relationship is
/// still recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    pub post_id: String,
    pub capture_time: Timestamp,
    pub created_time: Timestamp,
    pub author: String,
    pub text: String,
    pub repost_count: u64,
    pub like_count: u64,

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

    pub is_reply: bool,
    pub reply_to_post_id: Option<String>,
    pub reply_to_author: Option<String>,
}

impl PostRecord {
    /// Combined engagement at this observation.
    #[must_use]
    pub const fn engagement_total(&self) -> u64 {
        self.like_count + self.repost_count
    }

    /// Derive the synthetic origin record for this post.
    ///
    /// The origin is anchored at `created_time` with both counts forced to
    /// zero, independent of whatever the first real observation's counts
    /// were. This is a deliberate synthetic baseline so growth curves start
    /// at zero at the moment of posting, not a correction of observed data.
    /// All other fields are copied as-is.
    #[must_use]
    pub fn origin_record(&self) -> Self {
        Self {
            capture_time: self.created_time,
            like_count: 0,
            repost_count: 0,
            ..self.clone()
        }
    }
}
