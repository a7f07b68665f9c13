diesel::table! {
    videos (id) {
        id -> Uuid,
        title -> Varchar,
        video_url -> Varchar,
        sort_order -> Int4,
        rating -> Nullable<Float8>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    tags (id) {
        id -> Uuid,
        name -> Varchar,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    video_tags (video_id, tag_id) {
        video_id -> Uuid,
        tag_id -> Uuid,
    }
}

diesel::table! {
    thumbnails (id) {
        id -> Uuid,
        video_id -> Uuid,
        thumbnail_path -> Varchar,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::joinable!(video_tags -> videos (video_id));
diesel::joinable!(video_tags -> tags (tag_id));
diesel::joinable!(thumbnails -> videos (video_id));

diesel::allow_tables_to_appear_in_same_query!(videos, tags, video_tags, thumbnails,);
