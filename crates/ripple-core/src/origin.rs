//! Origin synthesizer: one synthetic zero-engagement record per post.
//!
//! Engagement plots must visually originate at zero at the moment of
//! posting, not at the first (already-nonzero) observation, so growth
//! curves are comparable across posts observed at different delays after
//! creation. For each distinct post the earliest observation serves as the
//! template for the time-invariant fields (author, text, relationship
//! flags); the synthetic record anchors at `created_time` with both counts
//! forced to zero.

use std::collections::HashMap;

use crate::record::PostRecord;

/// Insert one synthetic origin record per distinct post into the table.
///
/// The earliest record per post (by ascending `capture_time`; first wins
/// on ties) is the template. Origins are placed ahead of real records so
/// that after the stable re-sort an origin whose `created_time` coincides
/// exactly with a real `capture_time` sorts before the real observation —
/// both rows are kept, the synthetic one distinguished only by its zero
/// counts. An empty table stays empty.
#[must_use]
pub fn synthesize_origins(table: Vec<PostRecord>) -> Vec<PostRecord> {
    // Index of the earliest observation per post, in first-appearance order.
    let mut earliest: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();

    for (idx, record) in table.iter().enumerate() {
        let best = earliest.get(record.post_id.as_str()).copied();
        match best {
            None => {
                earliest.insert(record.post_id.as_str(), idx);
                order.push(record.post_id.as_str());
            }
            Some(best) if table[best].capture_time > record.capture_time => {
                earliest.insert(record.post_id.as_str(), idx);
            }
            Some(_) => {}
        }
    }

    let origins: Vec<PostRecord> = order
        .iter()
        .filter_map(|post_id| earliest.get(post_id).copied())
        .map(|idx| table[idx].origin_record())
        .collect();

    let mut combined = origins;
    combined.extend(table);
    combined.sort_by_key(|r| r.capture_time);
    combined
}
