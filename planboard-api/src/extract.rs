/// Request extractors whose rejections render as [`ApiError`]
///
/// Drop-in replacements for `axum::Json`, `axum::extract::Query` and
/// `axum::extract::Path`. A malformed body, an unknown enum value or a
/// non-UUID path segment comes back as the usual `{ error, message }` JSON
/// instead of axum's plain-text rejection.
///
/// | Rejection                         | Status |
/// |-----------------------------------|--------|
/// | JSON body with wrong field types  | 422    |
/// | Unparseable JSON, no content type | 400    |
/// | Bad query string                  | 400    |
/// | Bad path segment                  | 400    |

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};

use crate::error::{ApiError, ValidationErrorDetail};

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Json<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct Query<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct Path<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => ApiError::ValidationError(vec![
                ValidationErrorDetail::new("body", err.body_text()),
            ]),
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
