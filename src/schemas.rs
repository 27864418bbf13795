//! Request and response shapes for the review endpoints, and the field checks
//! applied to them before anything reaches the store.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::review::Review;
use crate::query::{Page, ReviewFilter, ReviewPage};

pub const RATING_MIN: i64 = 1;
pub const RATING_MAX: i64 = 5;
pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// One failed field check, rendered as `{"loc": [...], "msg": ..., "type": ...}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl FieldError {
    pub fn new(loc: &[&str], msg: impl Into<String>, kind: &str) -> Self {
        FieldError {
            loc: loc.iter().map(|s| s.to_string()).collect(),
            msg: msg.into(),
            kind: kind.to_string(),
        }
    }

    fn missing(loc: &[&str]) -> Self {
        FieldError::new(loc, "Field required", "missing")
    }

    fn null(loc: &[&str]) -> Self {
        FieldError::new(loc, "Field may not be null", "null")
    }

    fn out_of_range(loc: &[&str], min: i64, max: i64) -> Self {
        FieldError::new(
            loc,
            format!("Input should be between {} and {}", min, max),
            "range",
        )
    }
}

/// Every field check that failed for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn push(&mut self, err: FieldError) {
        self.0.push(err);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl From<FieldError> for ValidationErrors {
    fn from(err: FieldError) -> Self {
        ValidationErrors(vec![err])
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.loc.join("."), e.msg))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// A field in a partial update: left out, sent as `null`, or sent with a value.
///
/// Use with `#[serde(default)]` so that a missing key becomes `Absent`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Patch::Value(value),
            None => Patch::Null,
        })
    }
}

fn check_rating(rating: i64, loc: &[&str], errors: &mut ValidationErrors) -> i32 {
    if !(RATING_MIN..=RATING_MAX).contains(&rating) {
        errors.push(FieldError::out_of_range(loc, RATING_MIN, RATING_MAX));
    }
    rating as i32
}

/// Body of `POST /reviews`.
///
/// Fields are optional at the serde level so that every missing one can be
/// reported at once instead of failing on the first.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ReviewCreate {
    #[serde(default)]
    pub movie_id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub rating: Option<i64>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// A create request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub movie_id: i64,
    pub user_id: i64,
    pub rating: i32,
    pub comment: String,
}

impl ReviewCreate {
    pub fn validate(self) -> Result<NewReview, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let movie_id = required(self.movie_id, &["body", "movie_id"], &mut errors);
        let user_id = required(self.user_id, &["body", "user_id"], &mut errors);
        let rating = required(self.rating, &["body", "rating"], &mut errors)
            .map(|r| check_rating(r, &["body", "rating"], &mut errors));
        let comment = required(self.comment, &["body", "comment"], &mut errors);

        match (movie_id, user_id, rating, comment) {
            (Some(movie_id), Some(user_id), Some(rating), Some(comment)) => {
                errors.into_result(|| NewReview {
                    movie_id,
                    user_id,
                    rating,
                    comment,
                })
            }
            _ => Err(errors),
        }
    }
}

fn required<T>(value: Option<T>, loc: &[&str], errors: &mut ValidationErrors) -> Option<T> {
    if value.is_none() {
        errors.push(FieldError::missing(loc));
    }
    value
}

/// Body of `PUT /reviews/{id}`; only fields present in the payload change.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ReviewUpdate {
    #[serde(default)]
    pub rating: Patch<i64>,
    #[serde(default)]
    pub comment: Patch<String>,
}

/// The validated set of changes to apply to a stored review.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewChanges {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

impl ReviewUpdate {
    pub fn validate(self) -> Result<ReviewChanges, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let rating = match self.rating {
            Patch::Absent => None,
            Patch::Null => {
                errors.push(FieldError::null(&["body", "rating"]));
                None
            }
            Patch::Value(r) => Some(check_rating(r, &["body", "rating"], &mut errors)),
        };

        let comment = match self.comment {
            Patch::Absent => None,
            Patch::Null => {
                errors.push(FieldError::null(&["body", "comment"]));
                None
            }
            Patch::Value(c) => Some(c),
        };

        errors.into_result(|| ReviewChanges { rating, comment })
    }
}

impl ReviewChanges {
    /// Merge into `review`, leaving fields that were not supplied untouched.
    pub fn apply_to(self, review: &mut Review) {
        if let Some(rating) = self.rating {
            review.rating = rating;
        }
        if let Some(comment) = self.comment {
            review.comment = comment;
        }
    }
}

/// Query string of `GET /reviews`.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ReviewListParams {
    pub movie_id: Option<i64>,
    pub user_id: Option<i64>,
    pub rating_min: Option<i64>,
    pub rating_max: Option<i64>,
    pub created_after: Option<String>,
    pub created_before: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl ReviewListParams {
    pub fn validate(self) -> Result<(ReviewFilter, Page), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let rating_min = self
            .rating_min
            .map(|r| check_rating(r, &["query", "rating_min"], &mut errors));
        let rating_max = self
            .rating_max
            .map(|r| check_rating(r, &["query", "rating_max"], &mut errors));
        let created_after = self.created_after.as_deref().and_then(|raw| {
            datetime_param(raw, DayEdge::Start, &["query", "created_after"], &mut errors)
        });
        let created_before = self.created_before.as_deref().and_then(|raw| {
            datetime_param(raw, DayEdge::End, &["query", "created_before"], &mut errors)
        });

        let page = self.page.unwrap_or(DEFAULT_PAGE);
        if page < 1 {
            errors.push(FieldError::new(
                &["query", "page"],
                "Input should be greater than or equal to 1",
                "greater_than_equal",
            ));
        } else if u32::try_from(page).is_err() {
            errors.push(FieldError::new(
                &["query", "page"],
                format!("Input should be less than or equal to {}", u32::MAX),
                "less_than_equal",
            ));
        }
        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            errors.push(FieldError::out_of_range(
                &["query", "page_size"],
                1,
                MAX_PAGE_SIZE,
            ));
        }

        errors.into_result(|| {
            (
                ReviewFilter {
                    movie_id: self.movie_id,
                    user_id: self.user_id,
                    rating_min,
                    rating_max,
                    created_after,
                    created_before,
                },
                Page {
                    page: page as u32,
                    page_size: page_size as u32,
                },
            )
        })
    }
}

/// Which end of the day a date-only bound stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayEdge {
    Start,
    End,
}

/// Accepts RFC 3339, a naive ISO-8601 date-time (taken as UTC) or a plain date.
/// A plain date means midnight at the start of that day.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    parse_datetime_bound(raw, DayEdge::Start)
}

/// Like `parse_datetime`, but a plain date resolves to the given end of the
/// day, so `created_before=2025-10-01` still includes reviews from that day.
pub fn parse_datetime_bound(raw: &str, edge: DayEdge) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    match edge {
        DayEdge::Start => date.and_hms_opt(0, 0, 0),
        DayEdge::End => date.and_hms_micro_opt(23, 59, 59, 999_999),
    }
}

fn datetime_param(
    raw: &str,
    edge: DayEdge,
    loc: &[&str],
    errors: &mut ValidationErrors,
) -> Option<NaiveDateTime> {
    let parsed = parse_datetime_bound(raw, edge);
    if parsed.is_none() {
        errors.push(FieldError::new(
            loc,
            "Input should be a valid datetime",
            "datetime_parsing",
        ));
    }
    parsed
}

/// Pagination envelope returned by `GET /reviews`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ReviewListResponse {
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub items: Vec<Review>,
}

impl From<ReviewPage> for ReviewListResponse {
    fn from(result: ReviewPage) -> Self {
        ReviewListResponse {
            total: result.total,
            page: result.page.page,
            page_size: result.page.page_size,
            items: result.items,
        }
    }
}
