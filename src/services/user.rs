use crate::{error::AppError, models::{UpdatePasswordRequest, User}, repository::RepositoryState};

/// UserService
#[derive(Clone)]
pub struct UserService {
    repo: RepositoryState,
}

impl UserService {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    pub async fn profile(&self, user_id: i64) -> Result<User, AppError> {
        Ok(self.repo.get_user(user_id).await?)
    }

    /// Validates the pair, then stores the bcrypt hash of the new password.
    pub async fn update_password(
        &self,
        user_id: i64,
        req: &UpdatePasswordRequest,
    ) -> Result<(), AppError> {
        req.validate().map_err(AppError::BadRequest)?;
        if req.new_password != req.confirm_password {
            return Err(AppError::bad_request("passwords do not match"));
        }

        let hashed = super::hash_password(req.new_password.clone()).await?;
        self.repo.update_password(user_id, &hashed).await.map_err(|e| {
            tracing::error!(code = "[SERVICE] UpdatePassword - 1", user_id, error = %e);
            e.into()
        })
    }
}
