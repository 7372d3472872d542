use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use super::token::{Claims, TokenCodec, TokenError};
use crate::error::AppError;

/// GateError
///
/// Reasons the Auth Gate turns a request away. All of them end as a 401; only
/// the missing-header case gets its own client-facing message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("authorization header is missing")]
    MissingHeader,
    #[error("authorization header is not a Bearer credential")]
    MalformedHeader,
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl From<GateError> for AppError {
    fn from(e: GateError) -> Self {
        match e {
            GateError::MissingHeader => {
                AppError::Unauthorized("Missing Authorization Header".to_string())
            }
            GateError::MalformedHeader | GateError::Token(_) => {
                AppError::Unauthorized("Invalid Token".to_string())
            }
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

/// authenticate
///
/// Pulls the `Authorization: Bearer <token>` credential out of the headers and
/// runs it through the codec. Pure: no state is touched on either path.
pub fn authenticate(headers: &HeaderMap, codec: &TokenCodec) -> Result<Claims, GateError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(GateError::MissingHeader)?;

    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(GateError::MalformedHeader)?;

    Ok(codec.verify(token)?)
}

/// auth_gate
///
/// Middleware guarding the admin group. On success the verified `Claims` are
/// stored in the request extensions and the request continues down the chain;
/// on failure the chain is cut here with a 401 and the specific reason is only logged.
pub async fn auth_gate(
    State(codec): State<TokenCodec>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(request.headers(), &codec) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            tracing::warn!(
                code = "[MIDDLEWARE] CheckToken - 1",
                reason = %e,
                "rejected unauthenticated request"
            );
            e.into_response()
        }
    }
}

/// CurrentUser
///
/// Typed accessor for the identity the Auth Gate attached to the request.
/// Handlers take it as an argument instead of digging through extensions.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub claims: Claims,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Absent claims mean the route was mounted outside the gate.
        let claims = parts
            .extensions
            .get::<Claims>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Unauthorized Access".to_string()))?;

        if claims.user_id == 0 {
            return Err(AppError::Unauthorized("Unauthorized Access".to_string()));
        }

        Ok(CurrentUser {
            id: claims.user_id,
            claims,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn codec() -> TokenCodec {
        TokenCodec::new("gate-test-secret", "trustnews")
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(
            authenticate(&HeaderMap::new(), &codec()),
            Err(GateError::MissingHeader)
        );
    }

    #[test]
    fn test_header_without_bearer_prefix() {
        let (token, _) = codec().mint(5).unwrap();
        assert_eq!(
            authenticate(&headers_with(&format!("Token {}", token)), &codec()),
            Err(GateError::MalformedHeader)
        );
        assert_eq!(
            authenticate(&headers_with(&token), &codec()),
            Err(GateError::MalformedHeader)
        );
    }

    #[test]
    fn test_bad_token_is_reported_by_kind() {
        assert_eq!(
            authenticate(&headers_with("Bearer nonsense"), &codec()),
            Err(GateError::Token(TokenError::Malformed))
        );
    }

    #[test]
    fn test_valid_bearer_token() {
        let (token, _) = codec().mint(5).unwrap();
        let claims = authenticate(&headers_with(&format!("Bearer {}", token)), &codec()).unwrap();
        assert_eq!(claims.user_id, 5);
    }

    #[test]
    fn test_client_message_is_generic() {
        let expired: AppError = GateError::Token(TokenError::Expired).into();
        let mismatch: AppError = GateError::Token(TokenError::SignatureMismatch).into();
        assert_eq!(expired.to_string(), "Invalid Token");
        assert_eq!(mismatch.to_string(), "Invalid Token");
    }
}
