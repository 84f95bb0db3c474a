use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::{error, info};
use uuid::Uuid;

use imgvault_types::api::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::credentials;
use crate::error::ApiError;
use crate::extract::Payload;
use crate::state::{AppState, blocking};

/// POST /register: JSON or form-encoded credentials.
pub async fn register(
    State(state): State<AppState>,
    Payload(req): Payload<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let username = req.username.clone();
    let user_id =
        blocking(move || Ok(credentials::register(&db.db, &req.username, &req.password)?)).await?;

    info!("Registered user {} ({})", username, user_id);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { user_id, username }),
    ))
}

/// POST /login: returns a bearer token valid for one hour.
pub async fn login(
    State(state): State<AppState>,
    Payload(req): Payload<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let user =
        blocking(move || Ok(credentials::authenticate(&db.db, &req.username, &req.password)?))
            .await?;

    let user_id: Uuid = user.id.parse().map_err(|e| {
        error!("Corrupt user id '{}': {}", user.id, e);
        ApiError::Storage("Error logging in")
    })?;

    let token = state.tokens.issue(user_id, &user.username).map_err(|e| {
        error!("Failed to issue token for {}: {}", user.username, e);
        ApiError::Storage("Error logging in")
    })?;

    info!("User {} logged in", user.username);

    Ok(Json(LoginResponse {
        user_id,
        username: user.username,
        token,
    }))
}
