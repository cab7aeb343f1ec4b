//! Wire types of the business profile APIs
//!
//! Only the fields the relay reads are modelled; everything else in the
//! responses is ignored. `name` is required wherever it is modelled so a
//! malformed response fails at decoding instead of producing empty ids.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Language tag sent with every post
pub const POST_LANGUAGE: &str = "en";

/// Topic type sent with every post
pub const POST_TOPIC_TYPE: &str = "STANDARD";

/// Full resource name of one listing, `accounts/{a}/locations/{l}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(String);

impl LocationId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Build the id for a location listed under `account`
    ///
    /// The location listing returns `locations/{l}`, the post endpoint wants
    /// the name qualified with its account. Already qualified names are kept.
    pub fn qualified(account: &str, location: &str) -> Self {
        if location.starts_with("accounts/") {
            Self::new(location)
        } else {
            Self(format!(
                "{}/{}",
                account.trim_end_matches('/'),
                location.trim_start_matches('/')
            ))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LocationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Body of a local post creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRequest {
    pub language_code: String,
    pub summary: String,
    pub topic_type: String,
}

impl PostRequest {
    /// A standard English update carrying `text`
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            language_code: POST_LANGUAGE.to_string(),
            summary: text.into(),
            topic_type: POST_TOPIC_TYPE.to_string(),
        }
    }
}

/// A business account
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// `accounts/{id}`
    pub name: String,
    #[serde(default)]
    pub account_name: Option<String>,
}

/// A listing under an account
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Location {
    /// `locations/{id}`
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// A created local post
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalPost {
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub search_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListAccountsResponse {
    #[serde(default)]
    pub accounts: Vec<Account>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListLocationsResponse {
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}
