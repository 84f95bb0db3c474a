use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};

use crate::auth;
use crate::fetch;
use crate::middleware::require_auth;
use crate::state::AppState;
use crate::uploads::{self, BATCH_UPLOAD_BODY_LIMIT, SINGLE_UPLOAD_BODY_LIMIT};

/// The full route table. Registration and login are public; every upload and
/// fetch route sits behind `require_auth`.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/health", get(health));

    let protected_routes = Router::new()
        .route(
            "/upload/single",
            post(uploads::upload_single).layer(DefaultBodyLimit::max(SINGLE_UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/upload/multiple",
            post(uploads::upload_multiple).layer(DefaultBodyLimit::max(BATCH_UPLOAD_BODY_LIMIT)),
        )
        .route("/fetch", get(fetch::fetch_random))
        .route("/fetch/multiple", get(fetch::fetch_multiple))
        .route("/fetch/all", get(fetch::fetch_all))
        .route("/fetch/all/pages/{index}", get(fetch::fetch_page))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
