use crate::models::review::{format_timestamp, now, parse_timestamp, Review};
use crate::schemas::NewReview;
use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Column list matching the field order of `review_from_row`.
pub const REVIEW_COLUMNS: &str = "id, movie_id, user_id, rating, comment, created_at, updated_at";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("storage task failed: {0}")]
    Task(String),

    #[error("unsupported connection string: {0}")]
    ConnectionString(String),
}

// Define a struct to represent a database connection
#[derive(Debug, Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    // Open a database file, or ":memory:" for a private in-memory store
    pub fn new(db_path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path)?;
        tracing::info!(path = db_path, "database connection established");
        Ok(Database {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    // Open the database a connection string points at
    pub fn connect(url: &str) -> Result<Self, StoreError> {
        Database::new(sqlite_path(url)?)
    }

    // Create the database schema
    pub async fn create_schema(&self) -> Result<(), StoreError> {
        self.session(|tx| {
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS reviews (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    movie_id INTEGER NOT NULL,
                    user_id INTEGER NOT NULL,
                    rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                    comment TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    CHECK (updated_at >= created_at)
                );
                CREATE INDEX IF NOT EXISTS ix_reviews_movie_id ON reviews (movie_id);
                CREATE INDEX IF NOT EXISTS ix_reviews_user_id ON reviews (user_id);
                CREATE INDEX IF NOT EXISTS ix_reviews_created_at ON reviews (created_at, id);",
            )
            .map_err(|e| {
                tracing::error!(error = %e, "failed creating reviews table");
                StoreError::from(e)
            })
        })
        .await?;
        tracing::info!("schema ready");
        Ok(())
    }

    /// Run `f` inside one transaction on the blocking pool.
    ///
    /// The transaction commits only when `f` returns `Ok`. Any error, from
    /// `f` or from the commit itself, drops it uncommitted, which rolls back.
    /// The connection lock is released when the task ends either way.
    pub async fn session<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || -> Result<T, E> {
            let mut conn = conn.blocking_lock();
            let tx = conn.transaction().map_err(StoreError::from)?;
            let out = f(&tx)?;
            tx.commit().map_err(StoreError::from)?;
            Ok(out)
        })
        .await
        .map_err(|e| E::from(StoreError::Task(e.to_string())))?
    }
}

/// Resolve a connection string to a path `Connection::open` understands.
///
/// Accepts `sqlite://<path>`, `sqlite:<path>`, `sqlite::memory:`, `:memory:`
/// and bare paths. Any other scheme is rejected.
pub fn sqlite_path(url: &str) -> Result<&str, StoreError> {
    let path = if let Some(rest) = url.strip_prefix("sqlite://") {
        rest
    } else if let Some(rest) = url.strip_prefix("sqlite:") {
        rest
    } else if url.contains("://") {
        return Err(StoreError::ConnectionString(url.to_string()));
    } else {
        url
    };

    match path {
        "" => Err(StoreError::ConnectionString(url.to_string())),
        ":memory:" | "memory:" => Ok(":memory:"),
        path => Ok(path),
    }
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Map a row selected with `REVIEW_COLUMNS`.
pub fn review_from_row(row: &Row<'_>) -> rusqlite::Result<Review> {
    Ok(Review {
        id: row.get(0)?,
        movie_id: row.get(1)?,
        user_id: row.get(2)?,
        rating: row.get(3)?,
        comment: row.get(4)?,
        created_at: timestamp_column(row, 5)?,
        updated_at: timestamp_column(row, 6)?,
    })
}

pub fn get_review(conn: &Connection, id: i64) -> Result<Option<Review>, StoreError> {
    let review = conn
        .query_row(
            &format!("SELECT {} FROM reviews WHERE id = ?", REVIEW_COLUMNS),
            [id],
            review_from_row,
        )
        .optional()?;
    Ok(review)
}

// Insert a review stamped with the current time
pub fn insert_review(conn: &Connection, review: &NewReview) -> Result<Review, StoreError> {
    insert_review_at(conn, review, now())
}

/// Insert with both timestamps set to `at`; the store assigns the id.
pub fn insert_review_at(
    conn: &Connection,
    review: &NewReview,
    at: NaiveDateTime,
) -> Result<Review, StoreError> {
    conn.execute(
        "INSERT INTO reviews (movie_id, user_id, rating, comment, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![
            review.movie_id,
            review.user_id,
            review.rating,
            &review.comment,
            format_timestamp(&at)
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::debug!(review_id = id, movie_id = review.movie_id, "review inserted");

    Ok(Review {
        id,
        movie_id: review.movie_id,
        user_id: review.user_id,
        rating: review.rating,
        comment: review.comment.clone(),
        created_at: at,
        updated_at: at,
    })
}

/// Persist the mutable fields of an existing review.
pub fn save_review(conn: &Connection, review: &Review) -> Result<(), StoreError> {
    let changed = conn.execute(
        "UPDATE reviews SET rating = ?1, comment = ?2, updated_at = ?3 WHERE id = ?4",
        params![
            review.rating,
            &review.comment,
            format_timestamp(&review.updated_at),
            review.id
        ],
    )?;
    tracing::debug!(review_id = review.id, changed, "review saved");
    Ok(())
}

// Returns false when no review had this id
pub fn delete_review(conn: &Connection, id: i64) -> Result<bool, StoreError> {
    let deleted = conn.execute("DELETE FROM reviews WHERE id = ?", [id])?;
    tracing::debug!(review_id = id, deleted, "review delete executed");
    Ok(deleted > 0)
}
