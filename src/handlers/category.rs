use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};

use super::{ApiResult, SUCCESS, path_id};
use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{ApiResponse, CategoryRequest, CategoryResponse, ErrorResponse},
    services::CategoryService,
};

/// get_categories
///
/// [Admin Route] Lists every category, newest first.
#[utoipa::path(
    get,
    path = "/api/admin/categories",
    responses(
        (status = 200, description = "Categories wrapped in the envelope", body = [CategoryResponse]),
        (status = 404, description = "Data Not Found", body = ErrorResponse)
    )
)]
pub async fn get_categories(
    _user: CurrentUser,
    State(categories): State<CategoryService>,
) -> ApiResult<Vec<CategoryResponse>> {
    list(categories).await
}

/// get_public_categories
///
/// [Public Route] Same listing as the admin panel, without authentication.
#[utoipa::path(
    get,
    path = "/api/fe/categories",
    responses(
        (status = 200, description = "Categories wrapped in the envelope", body = [CategoryResponse]),
        (status = 404, description = "Data Not Found", body = ErrorResponse)
    )
)]
pub async fn get_public_categories(
    State(categories): State<CategoryService>,
) -> ApiResult<Vec<CategoryResponse>> {
    list(categories).await
}

async fn list(categories: CategoryService) -> ApiResult<Vec<CategoryResponse>> {
    let rows = categories.list().await?;
    Ok(Json(ApiResponse::ok(
        SUCCESS,
        rows.into_iter().map(CategoryResponse::from).collect(),
    )))
}

/// get_category
#[utoipa::path(
    get,
    path = "/api/admin/categories/{id}",
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category wrapped in the envelope", body = CategoryResponse),
        (status = 404, description = "Data Not Found", body = ErrorResponse)
    )
)]
pub async fn get_category(
    _user: CurrentUser,
    State(categories): State<CategoryService>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<CategoryResponse> {
    let id = path_id(path)?;
    let category = categories.get(id).await?;
    Ok(Json(ApiResponse::ok(SUCCESS, category.into())))
}

/// create_category
///
/// [Admin Route] Creates a category. The slug is derived from the title and
/// suffixed (`-2`, `-3`, ...) when already taken.
#[utoipa::path(
    post,
    path = "/api/admin/categories",
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Created", body = CategoryResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse)
    )
)]
pub async fn create_category(
    user: CurrentUser,
    State(categories): State<CategoryService>,
    payload: Result<Json<CategoryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponse>>), AppError> {
    let Json(req) = payload?;
    req.validate().map_err(AppError::BadRequest)?;

    let category = categories.create(&req.title, user.id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(SUCCESS, category.into())),
    ))
}

/// update_category
///
/// [Admin Route] Renames a category. The slug only changes when the title does.
#[utoipa::path(
    put,
    path = "/api/admin/categories/{id}",
    params(("id" = i64, Path, description = "Category id")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Updated", body = CategoryResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Data Not Found", body = ErrorResponse)
    )
)]
pub async fn update_category(
    user: CurrentUser,
    State(categories): State<CategoryService>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<CategoryRequest>, JsonRejection>,
) -> ApiResult<CategoryResponse> {
    let id = path_id(path)?;
    let Json(req) = payload?;
    req.validate().map_err(AppError::BadRequest)?;

    let category = categories.update(id, &req.title, user.id).await?;
    Ok(Json(ApiResponse::ok(SUCCESS, category.into())))
}

/// delete_category
///
/// [Admin Route] Refused with 409 while contents still reference the category.
#[utoipa::path(
    delete,
    path = "/api/admin/categories/{id}",
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Data Not Found", body = ErrorResponse),
        (status = 409, description = "Category still has contents", body = ErrorResponse)
    )
)]
pub async fn delete_category(
    _user: CurrentUser,
    State(categories): State<CategoryService>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<()> {
    let id = path_id(path)?;
    categories.delete(id).await?;
    Ok(Json(ApiResponse::message(SUCCESS)))
}
