use axum::{Json, extract::State, extract::rejection::JsonRejection};

use super::{ApiResult, SUCCESS};
use crate::{
    auth::CurrentUser,
    models::{ApiResponse, ErrorResponse, UpdatePasswordRequest, UserResponse},
    services::UserService,
};

/// get_profile
///
/// [Admin Route] Identity of the token holder. The password hash is never included.
#[utoipa::path(
    get,
    path = "/api/admin/users/profile",
    responses(
        (status = 200, description = "Profile wrapped in the envelope", body = UserResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn get_profile(
    user: CurrentUser,
    State(users): State<UserService>,
) -> ApiResult<UserResponse> {
    let profile = users.profile(user.id).await?;
    Ok(Json(ApiResponse::ok(SUCCESS, profile.into())))
}

/// update_password
#[utoipa::path(
    put,
    path = "/api/admin/users/update-password",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password updated"),
        (status = 400, description = "Validation failed or passwords do not match", body = ErrorResponse)
    )
)]
pub async fn update_password(
    user: CurrentUser,
    State(users): State<UserService>,
    payload: Result<Json<UpdatePasswordRequest>, JsonRejection>,
) -> ApiResult<()> {
    let Json(req) = payload?;
    users.update_password(user.id, &req).await?;
    Ok(Json(ApiResponse::message(SUCCESS)))
}
