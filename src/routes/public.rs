use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that need no token: the login gateway and the read-only views used by
/// the news front end. Content reads here are pinned to `status = PUBLISH` in the handlers.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers. Touches nothing.
        .route("/health", get(|| async { "ok" }))
        // POST /api/login
        // Exchanges email/password for a bearer token valid 24 hours.
        .route("/api/login", post(handlers::auth::login))
        // GET /api/fe/categories
        .route(
            "/api/fe/categories",
            get(handlers::category::get_public_categories),
        )
        // GET /api/fe/contents?page=&limit=&orderBy=&orderType=&search=&categoryID=
        // Published contents only, 6 per page unless `limit` says otherwise.
        .route(
            "/api/fe/contents",
            get(handlers::content::get_public_contents),
        )
        // GET /api/fe/contents/{id}
        .route(
            "/api/fe/contents/{id}",
            get(handlers::content::get_public_content),
        )
}
