//! Weak entity tags for conditional reads of a single review.
//!
//! A tag is derived only from the record id and its `updated_at` value, so it
//! is stable across reads of an unchanged record and changes with every
//! successful update.

use chrono::NaiveDateTime;

use crate::models::review::{format_timestamp, Review};

/// Marks a tag as a weak validator.
pub const WEAK_PREFIX: &str = "W/";

/// Compute the weak entity tag for `(id, updated_at)`.
pub fn weak_etag(id: i64, updated_at: &NaiveDateTime) -> String {
    let digest = md5::compute(format!("{}{}", id, format_timestamp(updated_at)));
    format!("{}\"{:x}\"", WEAK_PREFIX, digest)
}

pub fn review_etag(review: &Review) -> String {
    weak_etag(review.id, &review.updated_at)
}

/// Case-sensitive exact comparison against a client-supplied `If-None-Match`.
pub fn matches(current: &str, if_none_match: Option<&str>) -> bool {
    if_none_match.map_or(false, |candidate| candidate == current)
}
