use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (users, images, user_uploads)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE users (
                id              TEXT PRIMARY KEY,
                username        TEXT NOT NULL UNIQUE,
                password_hash   TEXT NOT NULL,
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- seq gives uploads a stable order independent of clock resolution
            CREATE TABLE images (
                seq             INTEGER PRIMARY KEY AUTOINCREMENT,
                id              TEXT NOT NULL UNIQUE,
                owner_id        TEXT NOT NULL REFERENCES users(id),
                filename        TEXT NOT NULL,
                content_type    TEXT NOT NULL
                    CHECK (content_type IN ('image/jpeg', 'image/png', 'image/gif')),
                data            BLOB NOT NULL,
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_images_owner
                ON images(owner_id, seq);

            CREATE TABLE user_uploads (
                user_id     TEXT NOT NULL REFERENCES users(id),
                image_id    TEXT NOT NULL UNIQUE REFERENCES images(id),
                position    INTEGER NOT NULL,
                PRIMARY KEY (user_id, position)
            );

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
