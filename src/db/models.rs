use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Queryable, Insertable, Clone)]
#[diesel(table_name = crate::db::schema::videos)]
pub struct Video {
    pub id: Uuid,
    pub title: String,
    pub video_url: String,
    pub sort_order: i32,
    pub rating: Option<f64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize, Queryable, Insertable, Clone)]
#[diesel(table_name = crate::db::schema::tags)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize, Queryable, Insertable, Clone)]
#[diesel(table_name = crate::db::schema::video_tags)]
pub struct VideoTag {
    pub video_id: Uuid,
    pub tag_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, Queryable, Insertable, Clone)]
#[diesel(table_name = crate::db::schema::thumbnails)]
pub struct Thumbnail {
    pub id: Uuid,
    pub video_id: Uuid,
    pub thumbnail_path: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Thumbnail row plus the ephemeral signed URL attached on read. The URL is
/// derived per request and never persisted; an empty string means signing
/// failed for this object.
#[derive(Debug, Serialize, Clone)]
pub struct SignedThumbnail {
    #[serde(flatten)]
    pub thumbnail: Thumbnail,
    pub signed_url: String,
}

#[derive(Debug, Serialize)]
pub struct VideoWithMeta {
    #[serde(flatten)]
    pub video: Video,
    pub tags: Vec<Tag>,
    pub thumbnails: Vec<SignedThumbnail>,
}
