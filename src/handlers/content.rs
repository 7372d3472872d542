use axum::{
    Json,
    extract::{
        Multipart, Path, Query, State,
        multipart::MultipartRejection,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};

use super::{ApiResult, SUCCESS, path_id};
use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{
        ApiResponse, ContentQuery, ContentRequest, ContentResponse, ErrorResponse,
        STATUS_PUBLISH, UploadImageResponse,
    },
    services::{
        ContentService,
        content::{ADMIN_PAGE_SIZE, PUBLIC_PAGE_SIZE, filter_from_query},
    },
};

/// get_contents
///
/// [Admin Route] Paginated listing over every status.
#[utoipa::path(
    get,
    path = "/api/admin/contents",
    params(ContentQuery),
    responses(
        (status = 200, description = "Contents and pagination wrapped in the envelope", body = [ContentResponse]),
        (status = 400, description = "Invalid query parameter", body = ErrorResponse)
    )
)]
pub async fn get_contents(
    _user: CurrentUser,
    State(contents): State<ContentService>,
    Query(query): Query<ContentQuery>,
) -> ApiResult<Vec<ContentResponse>> {
    let filter = filter_from_query(&query, ADMIN_PAGE_SIZE, None)?;
    let (rows, pagination) = contents.list(&filter).await?;
    Ok(Json(ApiResponse::paginated(SUCCESS, rows, pagination)))
}

/// get_public_contents
///
/// [Public Route] Paginated listing restricted to published contents.
#[utoipa::path(
    get,
    path = "/api/fe/contents",
    params(ContentQuery),
    responses(
        (status = 200, description = "Published contents and pagination", body = [ContentResponse]),
        (status = 400, description = "Invalid query parameter", body = ErrorResponse)
    )
)]
pub async fn get_public_contents(
    State(contents): State<ContentService>,
    Query(query): Query<ContentQuery>,
) -> ApiResult<Vec<ContentResponse>> {
    let filter = filter_from_query(&query, PUBLIC_PAGE_SIZE, Some(STATUS_PUBLISH))?;
    let (rows, pagination) = contents.list(&filter).await?;
    Ok(Json(ApiResponse::paginated(SUCCESS, rows, pagination)))
}

/// get_content
#[utoipa::path(
    get,
    path = "/api/admin/contents/{id}",
    params(("id" = i64, Path, description = "Content id")),
    responses(
        (status = 200, description = "Content wrapped in the envelope", body = ContentResponse),
        (status = 404, description = "Data Not Found", body = ErrorResponse)
    )
)]
pub async fn get_content(
    _user: CurrentUser,
    State(contents): State<ContentService>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<ContentResponse> {
    let id = path_id(path)?;
    let content = contents.get(id, None).await?;
    Ok(Json(ApiResponse::ok(SUCCESS, content)))
}

/// get_public_content
///
/// [Public Route] Detail page. Drafts are indistinguishable from missing rows.
#[utoipa::path(
    get,
    path = "/api/fe/contents/{id}",
    params(("id" = i64, Path, description = "Content id")),
    responses(
        (status = 200, description = "Content wrapped in the envelope", body = ContentResponse),
        (status = 404, description = "Data Not Found", body = ErrorResponse)
    )
)]
pub async fn get_public_content(
    State(contents): State<ContentService>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<ContentResponse> {
    let id = path_id(path)?;
    let content = contents.get(id, Some(STATUS_PUBLISH)).await?;
    Ok(Json(ApiResponse::ok(SUCCESS, content)))
}

/// create_content
#[utoipa::path(
    post,
    path = "/api/admin/contents",
    request_body = ContentRequest,
    responses(
        (status = 201, description = "Created", body = ContentResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Unknown category", body = ErrorResponse)
    )
)]
pub async fn create_content(
    user: CurrentUser,
    State(contents): State<ContentService>,
    payload: Result<Json<ContentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ContentResponse>>), AppError> {
    let Json(req) = payload?;
    req.validate().map_err(AppError::BadRequest)?;

    let content = contents.create(&req, user.id).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(SUCCESS, content))))
}

/// update_content
#[utoipa::path(
    put,
    path = "/api/admin/contents/{id}",
    params(("id" = i64, Path, description = "Content id")),
    request_body = ContentRequest,
    responses(
        (status = 200, description = "Updated", body = ContentResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Data Not Found", body = ErrorResponse)
    )
)]
pub async fn update_content(
    user: CurrentUser,
    State(contents): State<ContentService>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ContentRequest>, JsonRejection>,
) -> ApiResult<ContentResponse> {
    let id = path_id(path)?;
    let Json(req) = payload?;
    req.validate().map_err(AppError::BadRequest)?;

    let content = contents.update(id, &req, user.id).await?;
    Ok(Json(ApiResponse::ok(SUCCESS, content)))
}

/// delete_content
#[utoipa::path(
    delete,
    path = "/api/admin/contents/{id}",
    params(("id" = i64, Path, description = "Content id")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Data Not Found", body = ErrorResponse)
    )
)]
pub async fn delete_content(
    _user: CurrentUser,
    State(contents): State<ContentService>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<()> {
    let id = path_id(path)?;
    contents.delete(id).await?;
    Ok(Json(ApiResponse::message(SUCCESS)))
}

/// upload_image
///
/// [Admin Route] Accepts a multipart form with an `image` file part and pushes it
/// to object storage from memory. Returns the public URL to put in `image`.
#[utoipa::path(
    post,
    path = "/api/admin/contents/upload-image",
    request_body(content_type = "multipart/form-data", description = "Form with an `image` file part"),
    responses(
        (status = 201, description = "Uploaded", body = UploadImageResponse),
        (status = 400, description = "Missing image part", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn upload_image(
    user: CurrentUser,
    State(contents): State<ContentService>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<ApiResponse<UploadImageResponse>>), AppError> {
    let mut multipart = multipart?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("image") {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let body = field.bytes().await?.to_vec();

        let url_image = contents
            .upload_image(user.id, file_name.as_deref(), &content_type, body)
            .await?;

        return Ok((
            StatusCode::CREATED,
            Json(ApiResponse::ok(SUCCESS, UploadImageResponse { url_image })),
        ));
    }

    Err(AppError::bad_request("Field image is required"))
}
