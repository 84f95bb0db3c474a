use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use imgvault_types::models::Identity;

use crate::error::ApiError;
use crate::state::{AppState, blocking};

/// Auth gate for every owner-scoped route.
///
/// Missing or malformed `Authorization` is 401. A token that fails
/// verification, or whose user no longer exists, is 403. Otherwise the
/// resolved `Identity` is inserted into the request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())?;

    let claims = state.tokens.verify(token).map_err(|e| {
        warn!("Rejected bearer token: {}", e);
        ApiError::Forbidden("Invalid or expired token")
    })?;

    let db = state.clone();
    let user_id = claims.sub.to_string();
    let user = blocking(move || Ok(db.db.get_user_by_id(&user_id)?))
        .await?
        .ok_or_else(|| {
            warn!("Valid token for unknown user {}", claims.sub);
            ApiError::Forbidden("Invalid or expired token")
        })?;

    req.extensions_mut().insert(Identity {
        id: claims.sub,
        username: user.username,
    });
    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(ApiError::Unauthenticated("Missing Authorization header"))?;

    value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::Unauthenticated("Malformed Authorization header"))
}
