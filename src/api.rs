use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::json;

use crate::db::{self, Database};
use crate::error::{ApiError, ApiResult};
use crate::etag;
use crate::models::review::next_update_time;
use crate::query;
use crate::schemas::{
    FieldError, ReviewCreate, ReviewListParams, ReviewListResponse, ReviewUpdate,
};

/// Register every route plus the extractor configs that turn malformed
/// bodies, query strings and path ids into 422 responses.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .route("/", web::get().to(index))
        .route("/health", web::get().to(health))
        .service(
            web::resource("/reviews")
                .route(web::get().to(list_reviews))
                .route(web::post().to(create_review)),
        )
        .service(
            web::resource("/reviews/{review_id}")
                .route(web::get().to(get_review))
                .route(web::put().to(update_review))
                .route(web::patch().to(update_review))
                .route(web::delete().to(delete_review)),
        );
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        tracing::debug!(error = %err, "rejected request body");
        ApiError::from(FieldError::new(&["body"], err.to_string(), "json_invalid")).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        tracing::debug!(error = %err, "rejected query string");
        ApiError::from(FieldError::new(&["query"], err.to_string(), "query_invalid")).into()
    })
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        tracing::debug!(error = %err, "rejected path");
        ApiError::from(FieldError::new(
            &["path", "review_id"],
            "Input should be a valid integer",
            "int_parsing",
        ))
        .into()
    })
}

pub async fn index() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "message": "Welcome to the Review API. See /reviews to list reviews."
    }))
}

pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

pub async fn create_review(
    db: web::Data<Database>,
    body: web::Json<ReviewCreate>,
) -> ApiResult<HttpResponse> {
    let new_review = body.into_inner().validate()?;
    let review = db
        .session(move |tx| db::insert_review(tx, &new_review))
        .await?;

    tracing::info!(review_id = review.id, movie_id = review.movie_id, "review created");
    Ok(HttpResponse::Created().json(review))
}

pub async fn list_reviews(
    db: web::Data<Database>,
    params: web::Query<ReviewListParams>,
) -> ApiResult<web::Json<ReviewListResponse>> {
    let (filter, page) = params.into_inner().validate()?;
    let result = db
        .session(move |tx| query::find_reviews(tx, &filter, page))
        .await?;
    Ok(web::Json(result.into()))
}

/// Single read with conditional-get support.
///
/// A matching `If-None-Match` short-circuits to 304 before the record is
/// serialized. Either way the current tag goes out in `ETag`.
pub async fn get_review(
    db: web::Data<Database>,
    path: web::Path<i64>,
    req: HttpRequest,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let review = db
        .session(move |tx| db::get_review(tx, id))
        .await?
        .ok_or(ApiError::NotFound(id))?;

    let tag = etag::review_etag(&review);
    let if_none_match = req
        .headers()
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok());

    if etag::matches(&tag, if_none_match) {
        tracing::debug!(review_id = id, "review not modified");
        return Ok(HttpResponse::NotModified()
            .insert_header((header::ETAG, tag))
            .finish());
    }

    Ok(HttpResponse::Ok()
        .insert_header((header::ETAG, tag))
        .json(review))
}

/// Partial update: only supplied fields change, `updated_at` always advances.
pub async fn update_review(
    db: web::Data<Database>,
    path: web::Path<i64>,
    body: web::Json<ReviewUpdate>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let changes = body.into_inner().validate()?;

    let review = db
        .session(move |tx| {
            let mut review = db::get_review(tx, id)?.ok_or(ApiError::NotFound(id))?;
            changes.apply_to(&mut review);
            review.updated_at = next_update_time(review.updated_at);
            db::save_review(tx, &review)?;
            Ok::<_, ApiError>(review)
        })
        .await?;

    tracing::info!(review_id = id, "review updated");
    Ok(HttpResponse::Ok().json(review))
}

pub async fn delete_review(
    db: web::Data<Database>,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    db.session(move |tx| {
        if db::get_review(tx, id)?.is_none() {
            return Err(ApiError::NotFound(id));
        }
        db::delete_review(tx, id)?;
        Ok(())
    })
    .await?;

    tracing::info!(review_id = id, "review deleted");
    Ok(HttpResponse::NoContent().finish())
}
