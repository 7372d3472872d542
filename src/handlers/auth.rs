use axum::{Json, extract::State, extract::rejection::JsonRejection};

use crate::{
    error::AppError,
    models::{ErrorResponse, LoginRequest, LoginResponse, Meta},
    services::AuthService,
};

/// login
///
/// [Public Route] Verifies email/password and returns a 24h access token.
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login Successful", body = LoginResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Invalid Password", body = ErrorResponse),
        (status = 404, description = "User Not Found", body = ErrorResponse)
    )
)]
pub async fn login(
    State(auth): State<AuthService>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(req) = payload?;
    req.validate().map_err(AppError::BadRequest)?;

    let (access_token, expires_at) = auth.login(&req).await?;

    Ok(Json(LoginResponse {
        meta: Meta {
            status: true,
            message: "Login Successful".to_string(),
        },
        access_token,
        expires_at,
    }))
}
