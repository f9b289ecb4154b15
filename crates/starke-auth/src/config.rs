use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

fn default_admin_email() -> String {
    "Superadm@starkeST.com".to_string()
}

fn default_token_ttl_hours() -> i64 {
    24
}

/// Credentials and token policy for the admin account.
///
/// `token_file` has no default of its own; the server fills it in from the
/// scratch directory when the config leaves it empty.
#[derive(Clone, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "default_admin_email")]
    pub admin_email: String,
    /// An empty password disables login.
    #[serde(default)]
    pub admin_password: String,
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    #[serde(default)]
    pub token_file: Option<PathBuf>,
    /// When set, a token must also be present in the token store to verify.
    #[serde(default)]
    pub enforce_token_store: bool,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            admin_email: default_admin_email(),
            admin_password: String::new(),
            jwt_secret: String::new(),
            token_ttl_hours: default_token_ttl_hours(),
            token_file: None,
            enforce_token_store: false,
        }
    }
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("admin_email", &self.admin_email)
            .field("admin_password", &"[REDACTED]")
            .field("jwt_secret", &"[REDACTED]")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("token_file", &self.token_file)
            .field("enforce_token_store", &self.enforce_token_store)
            .finish()
    }
}
