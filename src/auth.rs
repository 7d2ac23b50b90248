use std::fmt;

use md5::{Digest, Md5};

/// Login of a provider customer.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    user_id: String,
    password: String,
}

impl Credentials {
    pub fn new(user_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            password: password.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Proof of the password for one session, also the key of the report query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationId(String);

impl AuthorizationId {
    /// `md5(md5(password) + token)`, both hashes as lowercase hex text.
    pub fn derive(password: &str, token: &str) -> Self {
        let password_hash = md5_hex(password);
        Self(md5_hex(&format!("{password_hash}{token}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthorizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn md5_hex(input: &str) -> String {
    hex::encode(Md5::digest(input.as_bytes()))
}
