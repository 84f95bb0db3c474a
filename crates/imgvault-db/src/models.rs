//! Database row types. These map directly to SQLite rows.
//! Ids are UUID strings; the API layer parses them.

use imgvault_types::models::ImageContentType;

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: String,
}

pub struct ImageRow {
    pub id: String,
    pub owner_id: String,
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
    pub created_at: String,
}

/// An image about to be written. The owner is fixed here and never changes.
pub struct NewImage {
    pub id: String,
    pub owner_id: String,
    pub filename: String,
    pub content_type: ImageContentType,
    pub data: Vec<u8>,
}
