// src/models/review.rs
use chrono::{Duration, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Fixed-width rendering used for storage, JSON and entity tags alike.
/// Every timestamp has the same length, so text order is time order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub id: i64,             // Assigned by the store, never reused
    pub movie_id: i64,       // ID of the reviewed movie
    pub user_id: i64,        // ID of the author
    pub rating: i32,         // 1 (worst) to 5 (best)
    pub comment: String,     // Free text
    #[serde(with = "timestamp")]
    pub created_at: NaiveDateTime,
    #[serde(with = "timestamp")]
    pub updated_at: NaiveDateTime,
}

/// Current UTC time truncated to the stored precision.
///
/// Truncating here keeps in-memory values equal to what a later read
/// returns, which the entity tag depends on.
pub fn now() -> NaiveDateTime {
    truncate(Utc::now().naive_utc())
}

/// Next `updated_at` for a record last touched at `previous`.
/// Always strictly later, even when the clock has not moved.
pub fn next_update_time(previous: NaiveDateTime) -> NaiveDateTime {
    let now = now();
    let floor = previous + Duration::microseconds(1);
    if now > floor {
        now
    } else {
        floor
    }
}

fn truncate(ts: NaiveDateTime) -> NaiveDateTime {
    let nanos = ts.nanosecond() / 1_000 * 1_000;
    ts.with_nanosecond(nanos).unwrap_or(ts)
}

/// Round up to the stored precision, for inclusive lower bounds.
pub fn ceil_to_micros(ts: NaiveDateTime) -> NaiveDateTime {
    let floor = truncate(ts);
    if floor < ts {
        floor + Duration::microseconds(1)
    } else {
        floor
    }
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
}

pub mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_render_at_fixed_width() {
        let ts = NaiveDateTime::parse_from_str("2025-10-01 20:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(format_timestamp(&ts), "2025-10-01T20:00:00.000000");
        assert_eq!(parse_timestamp("2025-10-01T20:00:00.000000").unwrap(), ts);
    }

    #[test]
    fn now_survives_a_format_round_trip() {
        let ts = now();
        assert_eq!(parse_timestamp(&format_timestamp(&ts)).unwrap(), ts);
    }

    #[test]
    fn ceil_rounds_only_sub_microsecond_values() {
        let exact = parse_timestamp("2025-10-01T20:00:00.000001").unwrap();
        assert_eq!(ceil_to_micros(exact), exact);

        let finer = exact + Duration::nanoseconds(100);
        assert_eq!(
            format_timestamp(&ceil_to_micros(finer)),
            "2025-10-01T20:00:00.000002"
        );
    }

    #[test]
    fn next_update_time_is_strictly_later() {
        let future = now() + Duration::seconds(60);
        let next = next_update_time(future);
        assert_eq!(next, future + Duration::microseconds(1));

        let past = now() - Duration::seconds(60);
        assert!(next_update_time(past) > past);
    }
}
