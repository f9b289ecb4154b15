//! HS256 session tokens.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Payload of an admin session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

/// Signs a token for `email` issued at `now` and valid for `ttl_hours`.
pub fn issue_token(
    email: &str,
    secret: &[u8],
    ttl_hours: i64,
    now: i64,
) -> Result<String, AuthError> {
    let exp = ttl_hours
        .checked_mul(3600)
        .and_then(|ttl| now.checked_add(ttl))
        .ok_or(AuthError::InvalidTtl(ttl_hours))?;
    let claims = Claims {
        email: email.to_string(),
        iat: now,
        exp,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(AuthError::Signing)
}

/// Checks the signature and expiry of `token`.
pub fn decode_token(token: &str, secret: &[u8]) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::InvalidToken(e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    #[test]
    fn issued_token_decodes_to_same_claims() {
        let now = chrono::Utc::now().timestamp();
        let token = issue_token("admin@example.com", SECRET, 24, now).expect("should sign");

        let claims = decode_token(&token, SECRET).expect("should verify");
        assert_eq!(claims.email, "admin@example.com");
        assert_eq!(claims.iat, now);
        assert_eq!(claims.exp, now + 24 * 3600);
    }

    #[test]
    fn expired_token_is_rejected() {
        let two_days_ago = chrono::Utc::now().timestamp() - 48 * 3600;
        let token = issue_token("admin@example.com", SECRET, 24, two_days_ago)
            .expect("should sign");

        assert!(matches!(
            decode_token(&token, SECRET),
            Err(AuthError::Expired)
        ));
    }

    #[test]
    fn oversized_lifetime_is_an_error() {
        let now = chrono::Utc::now().timestamp();

        assert!(matches!(
            issue_token("admin@example.com", SECRET, i64::MAX, now),
            Err(AuthError::InvalidTtl(i64::MAX))
        ));
        assert!(matches!(
            issue_token("admin@example.com", SECRET, i64::MAX / 3600, now),
            Err(AuthError::InvalidTtl(_))
        ));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let now = chrono::Utc::now().timestamp();
        let token = issue_token("admin@example.com", SECRET, 1, now).expect("should sign");

        assert!(matches!(
            decode_token(&token, b"other-secret"),
            Err(AuthError::InvalidToken(_))
        ));
        assert!(matches!(
            decode_token("not.a.jwt", SECRET),
            Err(AuthError::InvalidToken(_))
        ));
    }
}
