//! Long-lived application secrets
//!
//! The bundle is sourced outside the core and handed to the publish workflow
//! as an explicit argument.

use std::fmt;

use crate::error::{Error, Result};

pub const APP_KEY_VAR: &str = "APP_KEY";
pub const APP_SECRET_VAR: &str = "APP_SECRET";
pub const REFRESH_TOKEN_VAR: &str = "REFRESH_TOKEN";

/// App key, app secret and refresh token for the storage provider
#[derive(Clone, PartialEq, Eq)]
pub struct SecretBundle {
    pub app_key: String,
    pub app_secret: String,
    pub refresh_token: String,
}

impl SecretBundle {
    pub fn new(
        app_key: impl Into<String>,
        app_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            app_key: app_key.into(),
            app_secret: app_secret.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Build the bundle from a variable lookup
    ///
    /// Missing or blank values are reported by variable name.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| -> Result<String> {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| Error::Config(format!("{name} is not set")))
        };

        Ok(Self {
            app_key: read(APP_KEY_VAR)?,
            app_secret: read(APP_SECRET_VAR)?,
            refresh_token: read(REFRESH_TOKEN_VAR)?,
        })
    }
}

impl fmt::Debug for SecretBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretBundle")
            .field("app_key", &self.app_key)
            .field("app_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}
