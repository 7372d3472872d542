//! Business logic between the handlers and the persistence/storage layers.
//!
//! Each service receives its collaborators through its constructor as trait objects,
//! so tests can hand in in-memory implementations.

pub mod auth;
pub mod category;
pub mod content;
pub mod user;

pub use auth::AuthService;
pub use category::CategoryService;
pub use content::ContentService;
pub use user::UserService;

use crate::{auth::password, error::AppError};

/// Runs bcrypt off the async executor; it is deliberately slow.
pub(crate) async fn hash_password(plain: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || password::hash_password(&plain))
        .await
        .map_err(AppError::internal)?
        .map_err(AppError::internal)
}

pub(crate) async fn verify_password(plain: String, hashed: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || password::verify_password(&plain, &hashed))
        .await
        .map_err(AppError::internal)?
        .map_err(AppError::internal)
}
