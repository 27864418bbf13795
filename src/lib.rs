//! Review record service: create/read/update/delete over a single `reviews`
//! table with filtered pagination and weak-ETag conditional reads.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod etag;
pub mod models;
pub mod query;
pub mod schemas;
