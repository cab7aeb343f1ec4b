//! OAuth credential store for profile-relay
//!
//! Keeps one persisted Google credential usable:
//!
//! - A valid persisted credential is returned as-is
//! - An expired one is renewed with its refresh token and written back
//! - Otherwise the operator is sent through the browser consent flow, with a
//!   one-shot local listener receiving the redirect
//!
//! # Example
//!
//! ```rust,ignore
//! use relay_auth::{CredentialStore, SessionProvider, StoreConfig};
//!
//! let store = CredentialStore::new(StoreConfig::default())?;
//! let credential = store.ensure_valid_session().await?;
//! ```

pub mod callback;
pub mod credential;
pub mod error;
pub mod flow;
pub mod prompt;
pub mod secrets;
pub mod store;

pub use credential::{BUSINESS_MANAGE_SCOPE, Credential};
pub use error::{AuthError, Result};
pub use prompt::{BrowserPrompt, ConsentPrompt};
pub use secrets::ClientSecrets;
pub use store::{CredentialStore, SessionHealth, SessionProvider, StoreConfig};
