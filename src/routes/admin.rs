use crate::{AppState, handlers};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};

// Upper bound for a single uploaded image.
const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Admin Router Module
///
/// Everything the admin panel calls. Paths are relative: the router is nested at
/// `/api/admin` and wrapped in the Auth Gate as a `route_layer`, so an unmatched
/// path still 404s instead of 401ing.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET/POST /api/admin/categories
        .route(
            "/categories",
            get(handlers::category::get_categories).post(handlers::category::create_category),
        )
        // GET/PUT/DELETE /api/admin/categories/{id}
        // DELETE is refused while contents still point at the category.
        .route(
            "/categories/{id}",
            get(handlers::category::get_category)
                .put(handlers::category::update_category)
                .delete(handlers::category::delete_category),
        )
        // GET/POST /api/admin/contents
        .route(
            "/contents",
            get(handlers::content::get_contents).post(handlers::content::create_content),
        )
        // POST /api/admin/contents/upload-image
        // Multipart upload; the static segment wins over `{id}` below.
        .route(
            "/contents/upload-image",
            post(handlers::content::upload_image).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES)),
        )
        // GET/PUT/DELETE /api/admin/contents/{id}
        .route(
            "/contents/{id}",
            get(handlers::content::get_content)
                .put(handlers::content::update_content)
                .delete(handlers::content::delete_content),
        )
        // GET /api/admin/users/profile
        .route("/users/profile", get(handlers::user::get_profile))
        // PUT /api/admin/users/update-password
        .route(
            "/users/update-password",
            put(handlers::user::update_password),
        )
}
