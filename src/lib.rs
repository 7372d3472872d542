use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod services;
pub mod slug;
pub mod storage;

// Module for routing segregation (Public, Admin).
pub mod routes;
use routes::{admin, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the main application entry point (main.rs).
pub use auth::TokenCodec;
pub use config::{AppConfig, Env};
pub use error::AppError;
pub use repository::{PostgresRepository, RepositoryState};
pub use services::{AuthService, CategoryService, ContentService, UserService};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// Auto-generates the OpenAPI document served at `/api-docs/openapi.json`. It
/// aggregates every handler decorated with `#[utoipa::path]` and the schemas they use.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login,
        handlers::category::get_categories, handlers::category::get_public_categories,
        handlers::category::get_category, handlers::category::create_category,
        handlers::category::update_category, handlers::category::delete_category,
        handlers::content::get_contents, handlers::content::get_public_contents,
        handlers::content::get_content, handlers::content::get_public_content,
        handlers::content::create_content, handlers::content::update_content,
        handlers::content::delete_content, handlers::content::upload_image,
        handlers::user::get_profile, handlers::user::update_password,
    ),
    components(
        schemas(
            models::LoginRequest, models::LoginResponse, models::CategoryRequest,
            models::CategoryResponse, models::ContentRequest, models::ContentResponse,
            models::UpdatePasswordRequest, models::UserResponse, models::UploadImageResponse,
            models::Meta, models::Pagination, models::ErrorResponse,
        )
    ),
    tags(
        (name = "trustnews", description = "TrustNews CMS API")
    )
)]
pub struct ApiDoc;

/// AppState
///
/// Implements the **Unified State Pattern**: one cloneable container for every
/// shared dependency. Handlers never see it whole; they pull the one service they
/// need through the `FromRef` impls below.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: Abstracts database access via the PgPool connection.
    pub repo: RepositoryState,
    /// Storage Layer: Abstracts R2/MinIO uploads.
    pub storage: StorageState,
    /// Configuration: The loaded, immutable environment configuration.
    pub config: AppConfig,
    /// Signs and verifies access tokens with the configured secret and issuer.
    pub tokens: TokenCodec,
    pub auth: AuthService,
    pub categories: CategoryService,
    pub contents: ContentService,
    pub users: UserService,
}

impl AppState {
    /// new
    ///
    /// Wires the services to their dependencies. Nothing here touches the network.
    pub fn new(repo: RepositoryState, storage: StorageState, config: AppConfig) -> Self {
        let tokens = TokenCodec::new(&config.jwt_secret, &config.jwt_issuer);

        Self {
            auth: AuthService::new(repo.clone(), tokens.clone()),
            categories: CategoryService::new(repo.clone()),
            contents: ContentService::new(repo.clone(), storage.clone()),
            users: UserService::new(repo.clone()),
            repo,
            storage,
            config,
            tokens,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

// Each impl lets a handler or middleware take `State<T>` for a single component.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for TokenCodec {
    fn from_ref(app_state: &AppState) -> TokenCodec {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for AuthService {
    fn from_ref(app_state: &AppState) -> AuthService {
        app_state.auth.clone()
    }
}

impl FromRef<AppState> for CategoryService {
    fn from_ref(app_state: &AppState) -> CategoryService {
        app_state.categories.clone()
    }
}

impl FromRef<AppState> for ContentService {
    fn from_ref(app_state: &AppState) -> ContentService {
        app_state.contents.clone()
    }
}

impl FromRef<AppState> for UserService {
    fn from_ref(app_state: &AppState) -> UserService {
        app_state.users.clone()
    }
}

/// create_router
///
/// Assembles the application's entire routing structure, applies global and scoped middleware,
/// and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let mut base_router = Router::new()
        // Public Routes: No middleware applied.
        .merge(public::public_routes())
        // Admin Routes: every request must pass the Auth Gate. `route_layer` keeps
        // the gate off unmatched paths.
        .nest(
            "/api/admin",
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::auth_gate,
            )),
        );

    // Documentation is not exposed in production.
    if state.config.env != Env::Production {
        base_router = base_router
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    // 3. Observability and Correlation Layers (Applied outermost/first)
    base_router
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: wraps the request/response lifecycle in a span
                // carrying the generated request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: echoes x-request-id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Used by `TraceLayer` to build the per-request span. Pulls the `x-request-id`
/// header (if present) into the span next to the HTTP method and URI, so every
/// log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
