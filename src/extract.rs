use axum::extract::FromRequest;

use crate::error::ApiError;

/// `axum::Json` whose body rejections (bad syntax, wrong field types, missing
/// content type) come back as `ApiError::Validation` with a JSON body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);
