use crate::{
    auth::TokenCodec,
    error::AppError,
    models::LoginRequest,
    repository::{RepositoryError, RepositoryState},
};

/// AuthService
///
/// Exchanges email/password credentials for an access token.
#[derive(Clone)]
pub struct AuthService {
    repo: RepositoryState,
    tokens: TokenCodec,
}

impl AuthService {
    pub fn new(repo: RepositoryState, tokens: TokenCodec) -> Self {
        Self { repo, tokens }
    }

    /// login
    ///
    /// Returns the signed token and its expiry (unix seconds).
    pub async fn login(&self, req: &LoginRequest) -> Result<(String, i64), AppError> {
        let user = match self.repo.find_user_by_email(&req.email).await {
            Ok(user) => user,
            Err(RepositoryError::NotFound) => {
                tracing::info!(code = "[SERVICE] Login - 1", email = %req.email, "unknown email");
                return Err(AppError::NotFound("User Not Found".to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        if !super::verify_password(req.password.clone(), user.password.clone()).await? {
            tracing::info!(code = "[SERVICE] Login - 2", user_id = user.id, "password mismatch");
            return Err(AppError::Unauthorized("Invalid Password".to_string()));
        }

        self.tokens.mint(user.id).map_err(|e| {
            tracing::error!(code = "[SERVICE] Login - 3", error = %e);
            AppError::internal(e)
        })
    }

    /// Seeds the administrator account if no user owns `email` yet.
    pub async fn seed_admin(&self, email: &str, password: &str) -> Result<bool, AppError> {
        let hashed = super::hash_password(password.to_string()).await?;
        Ok(self.repo.ensure_user("Admin", email, &hashed).await?)
    }
}
