//! HTTP handlers, one module per resource. Handlers only translate between HTTP and
//! the services: extract, delegate, wrap the result in the response envelope.

pub mod auth;
pub mod category;
pub mod content;
pub mod user;

use axum::{Json, extract::rejection::PathRejection, extract::Path};

use crate::{error::AppError, models::ApiResponse};

pub(crate) const SUCCESS: &str = "Success";

pub(crate) type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

/// Unwraps a numeric path id, reporting a bad one in the error envelope.
pub(crate) fn path_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
    let Path(id) = path?;
    Ok(id)
}
