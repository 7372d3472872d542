use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// A row of the `users` table. Only the seeded administrator and accounts created
/// out-of-band exist; there is no registration endpoint.
#[derive(Debug, Clone, FromRow, Default)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    // bcrypt hash. Never serialized.
    pub password: String,
}

/// Category
///
/// A row of the `categories` table joined with the name of the user who last wrote it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct Category {
    pub id: i64,
    pub title: String,
    // Unique across all categories.
    pub slug: String,
    pub created_by_id: i64,
    #[sqlx(default)]
    pub created_by_name: String,
    pub created_at: DateTime<Utc>,
}

/// Content
///
/// A row of the `contents` table plus the joined category title/slug and author name.
/// Tags are stored as a single comma-joined column.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct Content {
    pub id: i64,
    pub title: String,
    pub excerpt: String,
    pub description: String,
    pub image: String,
    pub tags: String,
    pub status: String,
    pub category_id: i64,
    pub created_by_id: i64,
    pub created_at: DateTime<Utc>,
    #[sqlx(default)]
    pub category_title: String,
    #[sqlx(default)]
    pub category_slug: String,
    #[sqlx(default)]
    pub author: String,
}

/// Publication states a content row may be in.
pub const STATUS_PUBLISH: &str = "PUBLISH";
pub const STATUS_DRAFT: &str = "DRAFT";

/// Splits the stored comma-joined tags column; an empty column means no tags.
pub fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn join_tags(tags: &[String]) -> String {
    tags.join(",")
}

// --- Request Payloads (Input Schemas) ---

/// LoginRequest
///
/// Input payload for POST /api/login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    #[schema(example = "admin@gmail.com")]
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();
        if !is_email(&self.email) {
            errors.push("Invalid email format".to_string());
        }
        if self.password.is_empty() {
            errors.push("Field password is required".to_string());
        }
        into_validation_result(errors)
    }
}

/// CategoryRequest
///
/// Input payload for creating or renaming a category. The slug is always derived.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CategoryRequest {
    #[schema(example = "Breaking News")]
    pub title: String,
}

impl CategoryRequest {
    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push("Field title is required".to_string());
        }
        into_validation_result(errors)
    }
}

/// ContentRequest
///
/// Input payload for creating or updating a content item. `tags` is a comma-separated string.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ContentRequest {
    pub title: String,
    pub excerpt: String,
    pub description: String,
    // Public URL previously returned by the upload-image endpoint.
    pub image: String,
    #[schema(example = "politics,economy")]
    pub tags: String,
    #[schema(example = "PUBLISH")]
    pub status: String,
    pub category_id: i64,
}

impl ContentRequest {
    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();
        for (field, value) in [
            ("title", &self.title),
            ("excerpt", &self.excerpt),
            ("description", &self.description),
            ("image", &self.image),
            ("tags", &self.tags),
        ] {
            if value.trim().is_empty() {
                errors.push(format!("Field {} is required", field));
            }
        }
        if self.status != STATUS_PUBLISH && self.status != STATUS_DRAFT {
            errors.push("Field status must be PUBLISH or DRAFT".to_string());
        }
        if self.category_id <= 0 {
            errors.push("Field category_id is required".to_string());
        }
        into_validation_result(errors)
    }
}

/// UpdatePasswordRequest
///
/// Input payload for PUT /api/admin/users/update-password.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdatePasswordRequest {
    pub new_password: String,
    pub confirm_password: String,
}

impl UpdatePasswordRequest {
    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();
        if self.new_password.chars().count() < 8 {
            errors.push("Password must be at least 8 characters".to_string());
        }
        if self.confirm_password.is_empty() {
            errors.push("Field confirm_password is required".to_string());
        }
        into_validation_result(errors)
    }
}

/// ContentQuery
///
/// Raw listing parameters. Kept as strings so bad numbers surface as our own 400
/// envelope instead of the extractor's plain-text rejection.
#[derive(Debug, Clone, Deserialize, Default, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ContentQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    #[serde(rename = "orderBy")]
    pub order_by: Option<String>,
    #[serde(rename = "orderType")]
    pub order_type: Option<String>,
    pub search: Option<String>,
    #[serde(rename = "categoryID")]
    pub category_id: Option<String>,
    pub status: Option<String>,
}

fn is_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

fn into_validation_result(errors: Vec<String>) -> Result<(), String> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(format!("Validation failed: {}", errors.join(", ")))
    }
}

// --- Response Envelope (Output Schemas) ---

/// Meta
///
/// Status block present on every JSON response, success or failure.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Meta {
    pub status: bool,
    pub message: String,
}

/// Pagination
///
/// Attached to list responses that support paging.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct Pagination {
    pub total_records: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(total_records: i64, page: i64, per_page: i64) -> Self {
        // Ceiling division without the `total + per_page - 1` overflow.
        // `per_page` is validated to be >= 1 upstream.
        let total_pages =
            total_records / per_page + i64::from(total_records % per_page != 0);
        Self {
            total_records,
            page,
            per_page,
            total_pages,
        }
    }
}

/// ApiResponse
///
/// The success envelope: `{"meta": {...}, "data": ..., "pagination": ...}`.
/// `data` and `pagination` are omitted when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub meta: Meta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            meta: Meta {
                status: true,
                message: message.into(),
            },
            data: Some(data),
            pagination: None,
        }
    }

    pub fn paginated(message: impl Into<String>, data: T, pagination: Pagination) -> Self {
        Self {
            pagination: Some(pagination),
            ..Self::ok(message, data)
        }
    }
}

impl ApiResponse<()> {
    /// Success without a payload.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            meta: Meta {
                status: true,
                message: message.into(),
            },
            data: None,
            pagination: None,
        }
    }
}

/// ErrorResponse
///
/// The failure envelope: only the `meta` block, with `status: false`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ErrorResponse {
    pub meta: Meta,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            meta: Meta {
                status: false,
                message: message.into(),
            },
        }
    }
}

/// LoginResponse
///
/// Output of a successful login. `expires_at` is in unix seconds.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginResponse {
    pub meta: Meta,
    pub access_token: String,
    pub expires_at: i64,
}

/// CategoryResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CategoryResponse {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub created_by_name: String,
}

impl From<Category> for CategoryResponse {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            title: c.title,
            slug: c.slug,
            created_by_name: c.created_by_name,
        }
    }
}

/// ContentResponse
///
/// A content item as served to both the admin panel and the public front end.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ContentResponse {
    pub id: i64,
    pub title: String,
    pub excerpt: String,
    pub description: String,
    pub image: String,
    pub tags: Vec<String>,
    pub status: String,
    pub category_id: i64,
    pub created_by_id: i64,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    pub category_name: String,
    pub author: String,
}

impl From<Content> for ContentResponse {
    fn from(c: Content) -> Self {
        Self {
            tags: split_tags(&c.tags),
            id: c.id,
            title: c.title,
            excerpt: c.excerpt,
            description: c.description,
            image: c.image,
            status: c.status,
            category_id: c.category_id,
            created_by_id: c.created_by_id,
            created_at: c.created_at,
            category_name: c.category_title,
            author: c.author,
        }
    }
}

/// UserResponse
///
/// Profile of the authenticated user. The password hash never leaves the repository layer.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
        }
    }
}

/// UploadImageResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UploadImageResponse {
    #[serde(rename = "urlImage")]
    pub url_image: String,
}
