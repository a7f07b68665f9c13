// src/services/catalog.rs
use anyhow::{Context, Result};
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use futures::future::join_all;
use uuid::Uuid;

use crate::db::models::{SignedThumbnail, Tag, Thumbnail, Video, VideoTag, VideoWithMeta};
use crate::db::schema::{tags, thumbnails, video_tags, videos};
use crate::services::storage::ObjectStorage;

/// Splits a comma-separated tag field into distinct, trimmed names.
pub fn parse_tag_names(input: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for raw in input.split(',') {
        let name = raw.trim();
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Loads the full catalog ordered by sort_order, with tags and signed
/// thumbnails attached. Tag objects come from a second pass over the join
/// rows, since the join carries only tag ids.
pub async fn fetch_videos(
    conn: &mut AsyncPgConnection,
    storage: &ObjectStorage,
) -> Result<Vec<VideoWithMeta>> {
    let video_list = videos::table
        .order_by(videos::sort_order.asc())
        .load::<Video>(conn)
        .await
        .context("loading videos")?;

    let video_ids: Vec<Uuid> = video_list.iter().map(|v| v.id).collect();

    let links = video_tags::table
        .filter(video_tags::video_id.eq_any(video_ids.clone()))
        .load::<VideoTag>(conn)
        .await
        .context("loading video_tags")?;

    let tag_ids: Vec<Uuid> = links.iter().map(|l| l.tag_id).collect();
    let tag_list = tags::table
        .filter(tags::id.eq_any(tag_ids))
        .load::<Tag>(conn)
        .await
        .context("loading tags")?;

    let thumbnail_list = thumbnails::table
        .filter(thumbnails::video_id.eq_any(video_ids))
        .load::<Thumbnail>(conn)
        .await
        .context("loading thumbnails")?;

    // Sign all thumbnail URLs concurrently; a failed signature becomes an
    // empty string rather than dropping the thumbnail.
    let signed: Vec<SignedThumbnail> = join_all(thumbnail_list.into_iter().map(|t| async move {
        let signed_url = storage.signed_url(&t.thumbnail_path).await.unwrap_or_default();
        SignedThumbnail {
            thumbnail: t,
            signed_url,
        }
    }))
    .await;

    let result = video_list
        .into_iter()
        .map(|video| {
            let video_tag_ids: Vec<Uuid> = links
                .iter()
                .filter(|l| l.video_id == video.id)
                .map(|l| l.tag_id)
                .collect();
            VideoWithMeta {
                tags: tag_list
                    .iter()
                    .filter(|t| video_tag_ids.contains(&t.id))
                    .cloned()
                    .collect(),
                thumbnails: signed
                    .iter()
                    .filter(|t| t.thumbnail.video_id == video.id)
                    .cloned()
                    .collect(),
                video,
            }
        })
        .collect();

    Ok(result)
}

pub struct NewVideo {
    pub title: String,
    pub video_url: String,
    pub sort_order: Option<i32>,
    pub rating: Option<f64>,
    pub tag_names: Vec<String>,
    /// (original file name, bytes, content type)
    pub thumbnail_files: Vec<(String, Vec<u8>, String)>,
}

/// Multi-step creation: video row, then tag relations, then uploads, then
/// thumbnail rows. Steps after the video insert log their failures and keep
/// going — a partially constructed video is accepted, there is no rollback.
pub async fn create_video(
    conn: &mut AsyncPgConnection,
    storage: &ObjectStorage,
    input: NewVideo,
) -> Result<Video> {
    let now = Utc::now().naive_utc();
    let video = Video {
        id: Uuid::new_v4(),
        title: input.title,
        video_url: input.video_url,
        sort_order: input.sort_order.unwrap_or(0),
        rating: input.rating,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(videos::table)
        .values(&video)
        .execute(conn)
        .await
        .context("inserting video")?;

    for name in &input.tag_names {
        if let Err(e) = attach_tag(conn, video.id, name).await {
            log::error!("Error creating tag relation for {:?}: {}", name, e);
        }
    }

    let uploads = input.thumbnail_files.into_iter().map(|(file_name, data, content_type)| {
        let key = ObjectStorage::thumbnail_key(video.id, &file_name);
        async move {
            match storage.upload(&key, data, &content_type).await {
                Ok(()) => Some(key),
                Err(e) => {
                    log::error!("Failed to upload thumbnail {}: {}", key, e);
                    None
                }
            }
        }
    });
    let uploaded_keys: Vec<String> = join_all(uploads).await.into_iter().flatten().collect();

    if !uploaded_keys.is_empty() {
        let rows: Vec<Thumbnail> = uploaded_keys
            .into_iter()
            .map(|key| Thumbnail {
                id: Uuid::new_v4(),
                video_id: video.id,
                thumbnail_path: key,
                created_at: now,
                updated_at: now,
            })
            .collect();

        if let Err(e) = diesel::insert_into(thumbnails::table)
            .values(&rows)
            .execute(conn)
            .await
        {
            log::error!("Error inserting thumbnail records: {}", e);
        }
    }

    Ok(video)
}

// Atomic insert-or-get on the unique tag name, then the join row. ON CONFLICT
// DO NOTHING keeps two concurrent flows from creating duplicate tags.
async fn attach_tag(conn: &mut AsyncPgConnection, video_id: Uuid, name: &str) -> Result<()> {
    let now = Utc::now().naive_utc();
    diesel::insert_into(tags::table)
        .values(&Tag {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        })
        .on_conflict(tags::name)
        .do_nothing()
        .execute(conn)
        .await
        .context("upserting tag")?;

    let tag_id: Uuid = tags::table
        .filter(tags::name.eq(name))
        .select(tags::id)
        .first(conn)
        .await
        .context("resolving tag id")?;

    diesel::insert_into(video_tags::table)
        .values(&VideoTag { video_id, tag_id })
        .execute(conn)
        .await
        .context("inserting video_tag relation")?;

    Ok(())
}

pub async fn update_video_title(
    conn: &mut AsyncPgConnection,
    video_id: Uuid,
    title: &str,
) -> Result<Option<Video>> {
    let updated = diesel::update(videos::table.filter(videos::id.eq(video_id)))
        .set((
            videos::title.eq(title),
            videos::updated_at.eq(Utc::now().naive_utc()),
        ))
        .get_result::<Video>(conn)
        .await
        .optional()
        .context("updating video title")?;

    Ok(updated)
}

/// Multi-step deletion: join rows, storage objects, thumbnail rows, then the
/// video itself. Each step is gated on the previous one succeeding; a failure
/// aborts the rest and can leave the record set partially deleted.
pub async fn delete_video(
    conn: &mut AsyncPgConnection,
    storage: &ObjectStorage,
    video_id: Uuid,
) -> Result<()> {
    diesel::delete(video_tags::table.filter(video_tags::video_id.eq(video_id)))
        .execute(conn)
        .await
        .context("deleting video_tags")?;

    // The bucket has no folder delete, so list the keys and remove them one
    // by one.
    let keys = storage
        .list_keys(&ObjectStorage::thumbnail_prefix(video_id))
        .await
        .context("listing thumbnail objects")?;
    for key in keys {
        storage
            .delete(&key)
            .await
            .with_context(|| format!("deleting object {}", key))?;
    }

    diesel::delete(thumbnails::table.filter(thumbnails::video_id.eq(video_id)))
        .execute(conn)
        .await
        .context("deleting thumbnail records")?;

    diesel::delete(videos::table.filter(videos::id.eq(video_id)))
        .execute(conn)
        .await
        .context("deleting video")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_tags() {
        assert_eq!(parse_tag_names("x, y, z"), vec!["x", "y", "z"]);
    }

    #[test]
    fn drops_empty_entries_and_whitespace() {
        assert_eq!(parse_tag_names(" a ,, b ,"), vec!["a", "b"]);
        assert!(parse_tag_names("").is_empty());
        assert!(parse_tag_names(" , ,").is_empty());
    }

    #[test]
    fn collapses_duplicate_names() {
        // One join row per distinct name, even if the field repeats it.
        assert_eq!(parse_tag_names("a, b, a"), vec!["a", "b"]);
    }
}
