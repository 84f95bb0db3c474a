use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use imgvault_db::models::ImageRow;
use imgvault_types::api::{ImageResponse, PageResponse};
use imgvault_types::models::Identity;

use crate::error::ApiError;
use crate::state::{AppState, blocking};

pub const PAGE_SIZE: u32 = 10;

/// Upper bound on `count` for random multi-fetch.
pub const MAX_SAMPLE: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct SampleQuery {
    pub count: Option<String>,
}

/// GET /fetch: one random image owned by the caller.
pub async fn fetch_random(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ImageResponse>, ApiError> {
    let rows = sample(&state, identity.id, 1).await?;

    rows.into_iter()
        .next()
        .map(|row| Json(to_response(row)))
        .ok_or(ApiError::NotFound("No files found."))
}

/// GET /fetch/multiple?count=N: up to N distinct random images.
pub async fn fetch_multiple(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<SampleQuery>,
) -> Result<Json<Vec<ImageResponse>>, ApiError> {
    let count = parse_count(query.count.as_deref());
    let rows = sample(&state, identity.id, count).await?;

    if rows.is_empty() {
        return Err(ApiError::NotFound("No files found."));
    }

    Ok(Json(rows.into_iter().map(to_response).collect()))
}

/// GET /fetch/all: every image owned by the caller, in upload order.
pub async fn fetch_all(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<ImageResponse>>, ApiError> {
    let db = state.clone();
    let owner = identity.id.to_string();
    let rows = blocking(move || Ok(db.db.get_images(&owner)?)).await?;

    if rows.is_empty() {
        return Err(ApiError::NotFound("No files found."));
    }

    Ok(Json(rows.into_iter().map(to_response).collect()))
}

/// GET /fetch/all/pages/{index}: 1-based pages of `PAGE_SIZE` images.
pub async fn fetch_page(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(index): Path<String>,
) -> Result<Json<PageResponse>, ApiError> {
    let page = parse_page_index(&index)?;

    let db = state.clone();
    let owner = identity.id.to_string();
    let (rows, total) = blocking(move || Ok(db.db.get_image_page(&owner, page, PAGE_SIZE)?)).await?;

    if rows.is_empty() {
        return Err(ApiError::NotFound("Page not found."));
    }

    Ok(Json(PageResponse {
        page,
        total_pages: total.div_ceil(u64::from(PAGE_SIZE)) as u32,
        files: rows.into_iter().map(to_response).collect(),
    }))
}

async fn sample(state: &AppState, owner: Uuid, count: u32) -> Result<Vec<ImageRow>, ApiError> {
    let db = state.clone();
    let owner = owner.to_string();
    blocking(move || Ok(db.db.sample_images(&owner, count)?)).await
}

/// Absent, unparseable or non-positive counts fall back to 1; large values
/// are clamped to `MAX_SAMPLE`.
fn parse_count(raw: Option<&str>) -> u32 {
    raw.and_then(|raw| raw.trim().parse::<i64>().ok())
        .filter(|&count| count >= 1)
        .map_or(1, |count| count.min(i64::from(MAX_SAMPLE)) as u32)
}

/// Strict: "2abc" or "1.5" is a bad index, not page 2 or 1.
fn parse_page_index(raw: &str) -> Result<u32, ApiError> {
    raw.parse::<u32>()
        .ok()
        .filter(|&page| page >= 1)
        .ok_or_else(|| ApiError::Validation("Invalid page index.".into()))
}

fn to_response(row: ImageRow) -> ImageResponse {
    ImageResponse {
        id: row.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt image id '{}': {}", row.id, e);
            Uuid::default()
        }),
        owner_id: row.owner_id.parse().unwrap_or_else(|e| {
            warn!("Corrupt owner_id '{}' on image '{}': {}", row.owner_id, row.id, e);
            Uuid::default()
        }),
        filename: row.filename,
        content_type: row.content_type,
        image_buffer: B64.encode(&row.data),
        created_at: row
            .created_at
            .parse::<chrono::DateTime<chrono::Utc>>()
            .or_else(|_| {
                // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
                // Parse as naive UTC and convert.
                chrono::NaiveDateTime::parse_from_str(&row.created_at, "%Y-%m-%d %H:%M:%S")
                    .map(|ndt| ndt.and_utc())
            })
            .unwrap_or_else(|e| {
                warn!("Corrupt created_at '{}' on image '{}': {}", row.created_at, row.id, e);
                chrono::DateTime::default()
            }),
    }
}
