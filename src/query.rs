//! Filtered, ordered and paginated reads over the `reviews` table.
//!
//! The count and the page fetch are built from the same `WHERE` clause and run
//! on the same transaction, so `total` always agrees with `items`.

use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

use crate::db::{review_from_row, StoreError, REVIEW_COLUMNS};
use crate::models::review::{ceil_to_micros, format_timestamp, Review};

/// Optional filters, combined with AND. Bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewFilter {
    pub movie_id: Option<i64>,
    pub user_id: Option<i64>,
    pub rating_min: Option<i32>,
    pub rating_max: Option<i32>,
    pub created_after: Option<NaiveDateTime>,
    pub created_before: Option<NaiveDateTime>,
}

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Page {
    fn default() -> Self {
        Page {
            page: 1,
            page_size: 10,
        }
    }
}

impl Page {
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}

/// One page of matches plus the size of the whole match set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewPage {
    pub total: i64,
    pub page: Page,
    pub items: Vec<Review>,
}

impl ReviewFilter {
    /// Render as a `WHERE` clause (empty when no filter is set) and its
    /// positional parameters.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut clauses: Vec<&'static str> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        if let Some(movie_id) = self.movie_id {
            clauses.push("movie_id = ?");
            params.push(Value::Integer(movie_id));
        }
        if let Some(user_id) = self.user_id {
            clauses.push("user_id = ?");
            params.push(Value::Integer(user_id));
        }
        if let Some(min) = self.rating_min {
            clauses.push("rating >= ?");
            params.push(Value::Integer(i64::from(min)));
        }
        if let Some(max) = self.rating_max {
            clauses.push("rating <= ?");
            params.push(Value::Integer(i64::from(max)));
        }
        // Timestamps are fixed-width text, so string comparison is time order.
        // Bounds finer than a microsecond round inward: up for the lower
        // bound, down (by formatting) for the upper one.
        if let Some(after) = &self.created_after {
            clauses.push("created_at >= ?");
            params.push(Value::Text(format_timestamp(&ceil_to_micros(*after))));
        }
        if let Some(before) = &self.created_before {
            clauses.push("created_at <= ?");
            params.push(Value::Text(format_timestamp(before)));
        }

        if clauses.is_empty() {
            (String::new(), params)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), params)
        }
    }
}

/// Count all matches, then fetch the requested page newest first.
/// Ties on `created_at` fall back to `id DESC` so pages never overlap.
pub fn find_reviews(
    conn: &Connection,
    filter: &ReviewFilter,
    page: Page,
) -> Result<ReviewPage, StoreError> {
    let (where_clause, params) = filter.to_sql();

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM reviews{}", where_clause),
        params_from_iter(params.iter()),
        |row| row.get(0),
    )?;

    let mut paged = params;
    paged.push(Value::Integer(page.limit()));
    paged.push(Value::Integer(page.offset()));

    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM reviews{} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        REVIEW_COLUMNS, where_clause
    ))?;
    let rows = stmt.query_map(params_from_iter(paged.iter()), review_from_row)?;

    let mut items = Vec::new();
    for row in rows {
        items.push(row?);
    }

    tracing::debug!(
        total,
        returned = items.len(),
        page = page.page,
        page_size = page.page_size,
        "listed reviews"
    );
    Ok(ReviewPage { total, page, items })
}
