use axum::{
    Form, Json,
    extract::{
        FromRequest, Request,
        rejection::{FormRejection, JsonRejection},
    },
    http::{HeaderMap, header::CONTENT_TYPE},
};
use tracing::warn;

use crate::error::ApiError;

/// Body extractor for the credential routes. HTML forms post
/// `application/x-www-form-urlencoded`; everything else is read as JSON.
/// Either rejection becomes a 400 with a JSON error body.
#[derive(Debug)]
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    Form<T>: FromRequest<S, Rejection = FormRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_form(req.headers()) {
            let Form(value) = Form::<T>::from_request(req, state).await.map_err(|e| {
                warn!("Rejected form body: {}", e.body_text());
                ApiError::Validation(e.body_text())
            })?;
            Ok(Payload(value))
        } else {
            let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
                warn!("Rejected JSON body: {}", e.body_text());
                ApiError::Validation(e.body_text())
            })?;
            Ok(Payload(value))
        }
    }
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| {
            value
                .trim_start()
                .to_ascii_lowercase()
                .starts_with("application/x-www-form-urlencoded")
        })
}
