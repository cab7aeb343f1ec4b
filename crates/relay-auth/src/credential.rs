//! The persisted session credential
//!
//! Stored in Google's "authorized user" JSON layout so a token produced by
//! other Google tooling can be dropped in place.

use crate::error::{AuthError, Result};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Scope required by the business profile APIs
pub const BUSINESS_MANAGE_SCOPE: &str = "https://www.googleapis.com/auth/business.manage";

/// Google OAuth token URL
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// A credential expiring within this window is treated as expired
const REFRESH_SAFETY_WINDOW_SECS: i64 = 60;

/// Bearer credential used to call the directory APIs on the operator's behalf
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// OAuth access token
    #[serde(rename = "token", default)]
    pub access_token: String,

    /// Refresh token, absent when the provider did not grant offline access
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Token endpoint used for refreshes
    #[serde(default = "default_token_uri")]
    pub token_uri: String,

    /// OAuth client id the credential was issued to
    #[serde(default)]
    pub client_id: String,

    /// OAuth client secret the credential was issued to
    #[serde(default)]
    pub client_secret: String,

    /// Granted scopes
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Access token expiry; `None` means the provider gave no lifetime
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

impl Credential {
    /// True when the access token is expired (or about to be) at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry.is_some_and(|expiry| {
            now + TimeDelta::seconds(REFRESH_SAFETY_WINDOW_SECS) >= expiry
        })
    }

    /// True when the access token is expired (or about to be)
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// True when the credential can be used as-is
    pub fn is_valid(&self) -> bool {
        !self.access_token.is_empty() && !self.is_expired()
    }

    /// True when an expired credential can be renewed without the operator
    pub fn can_refresh(&self) -> bool {
        self.refresh_token
            .as_deref()
            .is_some_and(|token| !token.is_empty())
    }

    /// Read a persisted credential
    ///
    /// A missing file is `Ok(None)`.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(AuthError::CredentialUnreadable {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| AuthError::CorruptCredential {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Overwrite the persisted credential
    ///
    /// Writes a sibling temp file and renames it over `path`, creating parent
    /// directories when needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        let persist_err = |source| AuthError::Persist {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(persist_err)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(persist_err)?;
        std::fs::rename(&tmp, path).map_err(persist_err)?;
        Ok(())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("token_uri", &self.token_uri)
            .field("client_id", &self.client_id)
            .field("scopes", &self.scopes)
            .field("expiry", &self.expiry)
            .finish_non_exhaustive()
    }
}
