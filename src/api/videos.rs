use crate::config::AppConfig;
use crate::db::DbPool;
use crate::services::catalog::{self, NewVideo};
use crate::services::storage::ObjectStorage;
use actix_multipart::Multipart;
use actix_web::{web, Error, HttpResponse};
use futures::TryStreamExt;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/videos")
            .route("", web::post().to(create_video))
            .route("", web::get().to(list_videos))
            .route("/{id}", web::patch().to(update_video_title))
            .route("/{id}", web::delete().to(delete_video)),
    );
}

#[derive(Debug, Deserialize)]
pub struct ListQueryParams {
    /// 0-based page index.
    pub page: Option<usize>,
}

fn page_count(total: usize, per_page: usize) -> usize {
    total.div_ceil(per_page)
}

fn page_slice<T>(items: &[T], page: usize, per_page: usize) -> &[T] {
    let start = page.saturating_mul(per_page).min(items.len());
    let end = (start + per_page).min(items.len());
    &items[start..end]
}

pub async fn list_videos(
    query: web::Query<ListQueryParams>,
    pool: web::Data<DbPool>,
    storage: web::Data<ObjectStorage>,
    config: web::Data<Arc<AppConfig>>,
) -> Result<HttpResponse, Error> {
    let conn = &mut pool.get().await.expect("Failed to get DB connection");

    let all_videos = catalog::fetch_videos(conn, &storage).await.map_err(|e| {
        log::error!("Error fetching videos: {:#}", e);
        actix_web::error::ErrorInternalServerError("Database error")
    })?;

    let page = query.page.unwrap_or(0);
    let per_page = config.pagination.page_size.max(1);
    let total = all_videos.len();

    Ok(HttpResponse::Ok().json(json!({
        "videos": page_slice(&all_videos, page, per_page),
        "meta": {
            "total": total,
            "page": page,
            "per_page": per_page,
            "page_count": page_count(total, per_page),
        }
    })))
}

pub async fn create_video(
    payload: Multipart,
    pool: web::Data<DbPool>,
    storage: web::Data<ObjectStorage>,
) -> Result<HttpResponse, Error> {
    let mut title = String::new();
    let mut video_url = String::new();
    let mut sort_order: Option<i32> = None;
    let mut rating: Option<f64> = None;
    let mut tag_names: Vec<String> = Vec::new();
    let mut thumbnail_files: Vec<(String, Vec<u8>, String)> = Vec::new();

    let mut payload = payload;
    while let Ok(Some(mut field)) = payload.try_next().await {
        let content_disposition = field
            .content_disposition()
            .expect("Failed to get content disposition");
        let field_name = content_disposition
            .get_name()
            .ok_or_else(|| actix_web::error::ErrorBadRequest("No field name"))?;

        match field_name {
            "thumbnail" => {
                let file_name = content_disposition
                    .get_filename()
                    .ok_or_else(|| actix_web::error::ErrorBadRequest("No filename"))?
                    .to_owned();
                let content_type = field
                    .content_type()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());

                let mut data = Vec::new();
                while let Some(chunk) = field.try_next().await? {
                    data.extend_from_slice(&chunk);
                }
                thumbnail_files.push((file_name, data, content_type));
            }
            "title" => {
                title = read_text_field(&mut field).await?;
            }
            "video_url" => {
                video_url = read_text_field(&mut field).await?;
            }
            "sort_order" => {
                let text = read_text_field(&mut field).await?;
                sort_order = Some(text.trim().parse().map_err(|_| {
                    actix_web::error::ErrorBadRequest("sort_order must be an integer")
                })?);
            }
            "rating" => {
                let text = read_text_field(&mut field).await?;
                rating = Some(text.trim().parse().map_err(|_| {
                    actix_web::error::ErrorBadRequest("rating must be a number")
                })?);
            }
            "tags" => {
                let text = read_text_field(&mut field).await?;
                tag_names = catalog::parse_tag_names(&text);
            }
            _ => {
                // Skip unknown fields
                while (field.try_next().await?).is_some() {}
            }
        }
    }

    if title.is_empty() || video_url.is_empty() {
        return Err(actix_web::error::ErrorBadRequest(
            "title and video_url are required",
        ));
    }
    if let Some(r) = rating {
        if !(0.0..=5.0).contains(&r) {
            return Err(actix_web::error::ErrorBadRequest(
                "rating must be between 0.0 and 5.0",
            ));
        }
    }

    let conn = &mut pool.get().await.expect("Failed to get DB connection");
    let video = catalog::create_video(
        conn,
        &storage,
        NewVideo {
            title,
            video_url,
            sort_order,
            rating,
            tag_names,
            thumbnail_files,
        },
    )
    .await
    .map_err(|e| {
        log::error!("Error adding new video: {:#}", e);
        actix_web::error::ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Created().json(video))
}

async fn read_text_field(field: &mut actix_multipart::Field) -> Result<String, Error> {
    let mut value = String::new();
    while let Some(chunk) = field.try_next().await? {
        value.push_str(std::str::from_utf8(&chunk)?);
    }
    Ok(value)
}

#[derive(Debug, Deserialize)]
pub struct UpdateTitleRequest {
    pub title: String,
}

pub async fn update_video_title(
    path: web::Path<Uuid>,
    body: web::Json<UpdateTitleRequest>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, Error> {
    if body.title.is_empty() {
        return Err(actix_web::error::ErrorBadRequest("title is required"));
    }

    let conn = &mut pool.get().await.expect("Failed to get DB connection");
    let updated = catalog::update_video_title(conn, *path, &body.title)
        .await
        .map_err(|e| {
            log::error!("Error updating video title: {:#}", e);
            actix_web::error::ErrorInternalServerError("Database error")
        })?;

    match updated {
        Some(video) => Ok(HttpResponse::Ok().json(video)),
        None => Err(actix_web::error::ErrorNotFound("Video not found")),
    }
}

pub async fn delete_video(
    path: web::Path<Uuid>,
    pool: web::Data<DbPool>,
    storage: web::Data<ObjectStorage>,
) -> Result<HttpResponse, Error> {
    let conn = &mut pool.get().await.expect("Failed to get DB connection");
    catalog::delete_video(conn, &storage, *path)
        .await
        .map_err(|e| {
            log::error!("Error deleting video {}: {:#}", *path, e);
            actix_web::error::ErrorInternalServerError("Delete failed")
        })?;

    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page_count(0, 30), 0);
        assert_eq!(page_count(30, 30), 1);
        assert_eq!(page_count(31, 30), 2);
        assert_eq!(page_count(90, 30), 3);
    }

    #[test]
    fn first_page_holds_the_first_page_size_items() {
        let items: Vec<usize> = (0..75).collect();
        assert_eq!(page_slice(&items, 0, 30), (0..30).collect::<Vec<_>>());
        assert_eq!(page_slice(&items, 1, 30), (30..60).collect::<Vec<_>>());
        assert_eq!(page_slice(&items, 2, 30), (60..75).collect::<Vec<_>>());
    }

    #[test]
    fn out_of_range_page_is_empty() {
        let items: Vec<usize> = (0..5).collect();
        assert!(page_slice(&items, 3, 30).is_empty());
        assert!(page_slice(&items, usize::MAX, 30).is_empty());
    }
}
