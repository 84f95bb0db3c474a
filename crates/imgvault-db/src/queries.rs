use crate::models::{ImageRow, NewImage, UserRow};
use crate::{Database, DbError, Result};
use rusqlite::{Connection, OptionalExtension, Row, ffi};

const IMAGE_COLUMNS: &str = "id, owner_id, filename, content_type, data, created_at";

impl Database {
    // -- Users --

    /// Insert a user. A taken username surfaces as `DbError::DuplicateUsername`.
    pub fn create_user(&self, id: &str, username: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password_hash) VALUES (?1, ?2, ?3)",
                (id, username, password_hash),
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(ref err, _)
                    if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
                {
                    DbError::DuplicateUsername
                }
                other => other.into(),
            })?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    /// Ids of everything the user has uploaded, oldest first.
    pub fn get_owned_upload_ids(&self, user_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT image_id FROM user_uploads WHERE user_id = ?1 ORDER BY position",
            )?;
            let ids = stmt
                .query_map([user_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(ids)
        })
    }

    // -- Images --

    /// Store an image and append it to its owner's upload list. Both writes
    /// commit together or not at all.
    pub fn insert_image(&self, image: &NewImage) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO images (id, owner_id, filename, content_type, data)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    image.id,
                    image.owner_id,
                    image.filename,
                    image.content_type.as_mime(),
                    image.data,
                ],
            )?;
            tx.execute(
                "INSERT INTO user_uploads (user_id, image_id, position)
                 SELECT ?1, ?2, COALESCE(MAX(position), 0) + 1
                 FROM user_uploads WHERE user_id = ?1",
                (&image.owner_id, &image.id),
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    /// Up to `limit` distinct images owned by `owner_id`, in random order.
    pub fn sample_images(&self, owner_id: &str, limit: u32) -> Result<Vec<ImageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {IMAGE_COLUMNS} FROM images WHERE owner_id = ?1 ORDER BY RANDOM() LIMIT ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![owner_id, limit], image_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Every image owned by `owner_id`, in upload order.
    pub fn get_images(&self, owner_id: &str) -> Result<Vec<ImageRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {IMAGE_COLUMNS} FROM images WHERE owner_id = ?1 ORDER BY seq");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([owner_id], image_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// One page of `owner_id`'s images in upload order, plus the owner's total
    /// image count. `page` is 1-based. Both are read under one lock so the
    /// count matches the page.
    pub fn get_image_page(
        &self,
        owner_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<(Vec<ImageRow>, u64)> {
        let offset = i64::from(page.saturating_sub(1)) * i64::from(page_size);

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {IMAGE_COLUMNS} FROM images WHERE owner_id = ?1
                 ORDER BY seq LIMIT ?2 OFFSET ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![owner_id, page_size, offset], image_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let total = count_images(conn, owner_id)?;
            Ok((rows, total))
        })
    }

    pub fn count_images(&self, owner_id: &str) -> Result<u64> {
        self.with_conn(|conn| count_images(conn, owner_id))
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT id, username, password_hash, created_at FROM users WHERE {column} = ?1"
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password_hash: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn count_images(conn: &Connection, owner_id: &str) -> Result<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM images WHERE owner_id = ?1",
        [owner_id],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

fn image_from_row(row: &Row<'_>) -> rusqlite::Result<ImageRow> {
    Ok(ImageRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        filename: row.get(2)?,
        content_type: row.get(3)?,
        data: row.get(4)?,
        created_at: row.get(5)?,
    })
}
