use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Lifetime of every access token: 24 hours.
pub const TOKEN_LIFETIME_SECS: i64 = 24 * 60 * 60;

/// Claims
///
/// The signed identity payload carried inside an access token. Never persisted
/// server-side; the token itself is the only copy and dies at `exp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Numeric id of the authenticated user (`users.id`).
    pub user_id: i64,
    /// Issuer, taken from `JWT_ISSUER`.
    pub iss: String,
    /// Expiration time (seconds since epoch).
    pub exp: i64,
    /// Not-before time (seconds since epoch). Equal to the mint time.
    pub nbf: i64,
}

/// TokenError
///
/// Every way minting or verification can fail. The variants are for logs only;
/// clients always receive the same generic 401.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Signing(String),
    #[error("token is malformed")]
    Malformed,
    #[error("token signature does not match")]
    SignatureMismatch,
    #[error("token declares a non-HMAC algorithm")]
    WrongAlgorithm,
    #[error("token has expired")]
    Expired,
    #[error("token is not valid yet")]
    NotYetValid,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature => TokenError::SignatureMismatch,
            ErrorKind::InvalidAlgorithm => TokenError::WrongAlgorithm,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::ImmatureSignature => TokenError::NotYetValid,
            _ => TokenError::Malformed,
        }
    }
}

/// TokenCodec
///
/// Mints and verifies HS256 access tokens. Pure apart from reading the wall clock
/// in `mint`/`verify`; the `*_at` variants take the clock as an argument.
#[derive(Clone)]
pub struct TokenCodec {
    issuer: String,
    // An empty HMAC key signs nothing meaningful; minting with one is refused.
    key_is_empty: bool,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenCodec {
    pub fn new(signing_key: &str, issuer: &str) -> Self {
        Self {
            issuer: issuer.to_string(),
            key_is_empty: signing_key.is_empty(),
            encoding_key: EncodingKey::from_secret(signing_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(signing_key.as_bytes()),
        }
    }

    /// Mints a token for `user_id`, returning it with its expiry in unix seconds.
    pub fn mint(&self, user_id: i64) -> Result<(String, i64), TokenError> {
        self.mint_at(user_id, Utc::now().timestamp())
    }

    pub fn mint_at(&self, user_id: i64, now: i64) -> Result<(String, i64), TokenError> {
        if self.key_is_empty {
            return Err(TokenError::Signing("signing key is empty".to_string()));
        }

        let claims = Claims {
            user_id,
            iss: self.issuer.clone(),
            exp: now + TOKEN_LIFETIME_SECS,
            nbf: now,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok((token, claims.exp))
    }

    /// Verifies signature, algorithm family and validity window against the current time.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// verify_at
    ///
    /// Any HMAC variant (HS256/384/512) is accepted; anything else is rejected as
    /// `WrongAlgorithm` before the signature is even looked at, which closes the
    /// algorithm-substitution hole. Time checks are done here, without leeway,
    /// against the supplied `now`.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims =
            HashSet::from(["exp".to_string(), "nbf".to_string()]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| match TokenError::from(e) {
                TokenError::Malformed if declares_foreign_algorithm(token) => {
                    TokenError::WrongAlgorithm
                }
                other => other,
            })?
            .claims;

        if now > claims.exp {
            return Err(TokenError::Expired);
        }
        if now < claims.nbf {
            return Err(TokenError::NotYetValid);
        }

        Ok(claims)
    }
}

/// True when the header segment is readable JSON whose `alg` is outside the HMAC
/// family. jsonwebtoken refuses to deserialize values it has no variant for
/// (`none`, `HS999`), so those would otherwise surface as `Malformed`.
fn declares_foreign_algorithm(token: &str) -> bool {
    let Some(segment) = token.split('.').next() else {
        return false;
    };
    let Ok(bytes) = URL_SAFE_NO_PAD.decode(segment.trim_end_matches('=')) else {
        return false;
    };
    let Ok(header) = serde_json::from_slice::<serde_json::Value>(&bytes) else {
        return false;
    };

    match header.get("alg").and_then(|alg| alg.as_str()) {
        Some(alg) => !matches!(alg, "HS256" | "HS384" | "HS512"),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-for-testing";
    const NOW: i64 = 1_700_000_000;

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, "trustnews")
    }

    #[test]
    fn test_mint_and_verify_roundtrip() {
        let codec = codec();
        let (token, expires_at) = codec.mint_at(42, NOW).unwrap();

        assert_eq!(token.split('.').count(), 3);
        assert_eq!(expires_at, NOW + TOKEN_LIFETIME_SECS);

        let claims = codec.verify_at(&token, NOW + 60).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.iss, "trustnews");
        assert_eq!(claims.nbf, NOW);
        assert_eq!(claims.exp, expires_at);
    }

    #[test]
    fn test_verify_with_wall_clock() {
        let codec = codec();
        let (token, _) = codec.mint(7).unwrap();
        assert_eq!(codec.verify(&token).unwrap().user_id, 7);
    }

    #[test]
    fn test_wrong_key_is_signature_mismatch() {
        let (token, _) = codec().mint_at(1, NOW).unwrap();
        let other = TokenCodec::new("another-secret", "trustnews");

        assert_eq!(
            other.verify_at(&token, NOW),
            Err(TokenError::SignatureMismatch)
        );
    }

    #[test]
    fn test_expired_after_24_hours() {
        let codec = codec();
        let (token, _) = codec.mint_at(1, NOW).unwrap();

        // Still valid on the last second.
        assert!(codec.verify_at(&token, NOW + TOKEN_LIFETIME_SECS).is_ok());
        assert_eq!(
            codec.verify_at(&token, NOW + TOKEN_LIFETIME_SECS + 1),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_not_yet_valid() {
        let codec = codec();
        let (token, _) = codec.mint_at(1, NOW).unwrap();

        assert_eq!(
            codec.verify_at(&token, NOW - 1),
            Err(TokenError::NotYetValid)
        );
    }

    #[test]
    fn test_garbage_is_malformed() {
        let codec = codec();
        assert_eq!(codec.verify_at("not-a-token", NOW), Err(TokenError::Malformed));
        assert_eq!(codec.verify_at("", NOW), Err(TokenError::Malformed));
        assert_eq!(codec.verify_at("a.b.c", NOW), Err(TokenError::Malformed));
    }

    #[test]
    fn test_non_hmac_algorithm_is_rejected() {
        // {"alg":"RS256","typ":"JWT"} . {} . "sig"
        let token = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9.e30.c2ln";
        assert_eq!(
            codec().verify_at(token, NOW),
            Err(TokenError::WrongAlgorithm)
        );
    }

    #[test]
    fn test_alg_none_is_wrong_algorithm() {
        // {"alg":"none","typ":"JWT"} . {} . (no signature)
        let token = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.e30.";
        assert_eq!(
            codec().verify_at(token, NOW),
            Err(TokenError::WrongAlgorithm)
        );

        // Unsigned token carrying otherwise valid claims.
        let claims = URL_SAFE_NO_PAD.encode(format!(
            r#"{{"user_id":1,"iss":"trustnews","exp":{},"nbf":{}}}"#,
            NOW + 100,
            NOW
        ));
        let token = format!("eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.{}.", claims);
        assert_eq!(
            codec().verify_at(&token, NOW),
            Err(TokenError::WrongAlgorithm)
        );
    }

    #[test]
    fn test_unknown_algorithm_name_is_wrong_algorithm() {
        // {"alg":"HS999","typ":"JWT"} . {} . "sig"
        let token = "eyJhbGciOiJIUzk5OSIsInR5cCI6IkpXVCJ9.e30.c2ln";
        assert_eq!(
            codec().verify_at(token, NOW),
            Err(TokenError::WrongAlgorithm)
        );
    }

    #[test]
    fn test_other_hmac_variants_are_accepted() {
        let claims = Claims {
            user_id: 9,
            iss: "trustnews".to_string(),
            exp: NOW + 100,
            nbf: NOW,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(codec().verify_at(&token, NOW).unwrap(), claims);
    }

    #[test]
    fn test_empty_key_cannot_sign() {
        let codec = TokenCodec::new("", "trustnews");
        assert!(matches!(codec.mint_at(1, NOW), Err(TokenError::Signing(_))));
    }
}
