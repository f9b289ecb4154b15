use subtle::ConstantTimeEq;

use crate::config::AuthSettings;
use crate::error::AuthError;
use crate::store::TokenStore;
use crate::token::{decode_token, issue_token, Claims};

/// Checks admin credentials and issues, verifies and revokes tokens.
#[derive(Debug)]
pub struct Authenticator {
    settings: AuthSettings,
    store: TokenStore,
}

impl Authenticator {
    pub fn new(settings: AuthSettings, store: TokenStore) -> Self {
        if settings.admin_password.is_empty() {
            tracing::warn!("admin password is not configured, login is disabled");
        }
        if settings.jwt_secret.is_empty() {
            tracing::warn!("jwt secret is not configured, every token will be rejected");
        }
        Self { settings, store }
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    /// Returns a fresh token when `email` and `password` match the admin
    /// account. Both are trimmed; the email match ignores case.
    ///
    /// # Errors
    ///
    /// `AuthError::NotConfigured` when no signing secret is set.
    pub fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let secret = self.secret()?;
        let email = email.trim();
        let password = password.trim();

        let email_ok = email.eq_ignore_ascii_case(self.settings.admin_email.trim());
        let password_ok: bool = password
            .as_bytes()
            .ct_eq(self.settings.admin_password.as_bytes())
            .into();

        if !email_ok || !password_ok || self.settings.admin_password.is_empty() {
            tracing::info!(email, "rejected admin login");
            return Err(AuthError::InvalidCredentials);
        }

        let token = issue_token(
            email,
            secret,
            self.settings.token_ttl_hours,
            chrono::Utc::now().timestamp(),
        )?;
        self.store.insert(&token)?;

        tracing::info!(email, "admin logged in");
        Ok(token)
    }

    /// Checks a bearer token. Nothing verifies while the secret is empty.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = decode_token(token, self.secret()?)?;
        if self.settings.enforce_token_store && !self.store.contains(token) {
            return Err(AuthError::Revoked);
        }
        Ok(claims)
    }

    fn secret(&self) -> Result<&[u8], AuthError> {
        if self.settings.jwt_secret.is_empty() {
            return Err(AuthError::NotConfigured);
        }
        Ok(self.settings.jwt_secret.as_bytes())
    }

    /// Drops `token` from the store. Unknown tokens are ignored.
    pub fn logout(&self, token: &str) -> Result<(), AuthError> {
        if self.store.remove(token)? {
            tracing::info!("admin token revoked");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticator(dir: &std::path::Path, enforce: bool) -> Authenticator {
        let settings = AuthSettings {
            admin_email: "Superadm@starkeST.com".to_string(),
            admin_password: "s3cret".to_string(),
            jwt_secret: "signing-key".to_string(),
            enforce_token_store: enforce,
            ..Default::default()
        };
        Authenticator::new(settings, TokenStore::new(dir.join("tokens.json")))
    }

    #[test]
    fn login_ignores_email_case_and_surrounding_whitespace() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let auth = authenticator(dir.path(), false);

        let token = auth
            .login("  superadm@starkest.com ", " s3cret ")
            .expect("login should succeed");
        let claims = auth.verify(&token).expect("token should verify");
        assert_eq!(claims.email, "superadm@starkest.com");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn wrong_password_is_rejected() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let auth = authenticator(dir.path(), false);

        assert!(matches!(
            auth.login("Superadm@starkeST.com", "S3cret"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("someone@else.com", "s3cret"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn empty_configured_password_disables_login() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let auth = Authenticator::new(
            AuthSettings {
                jwt_secret: "signing-key".to_string(),
                ..Default::default()
            },
            TokenStore::new(dir.path().join("tokens.json")),
        );

        assert!(matches!(
            auth.login("Superadm@starkeST.com", ""),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn empty_secret_rejects_login_and_forged_tokens() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let auth = Authenticator::new(
            AuthSettings {
                admin_password: "s3cret".to_string(),
                ..Default::default()
            },
            TokenStore::new(dir.path().join("tokens.json")),
        );

        let now = chrono::Utc::now().timestamp();
        let forged = issue_token("attacker@example.com", b"", 24, now).expect("should sign");

        assert!(matches!(auth.verify(&forged), Err(AuthError::NotConfigured)));
        assert!(matches!(
            auth.login("Superadm@starkeST.com", "s3cret"),
            Err(AuthError::NotConfigured)
        ));
    }

    #[test]
    fn logout_revokes_only_when_store_is_enforced() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let lenient = authenticator(dir.path(), false);
        let strict = authenticator(dir.path(), true);

        let token = strict
            .login("Superadm@starkeST.com", "s3cret")
            .expect("login should succeed");
        strict.verify(&token).expect("fresh token should verify");

        strict.logout(&token).expect("logout should succeed");
        assert!(matches!(strict.verify(&token), Err(AuthError::Revoked)));
        lenient
            .verify(&token)
            .expect("signature alone is enough when the store is not enforced");

        strict.logout("never-issued").expect("unknown token is ignored");
    }
}
