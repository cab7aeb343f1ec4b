//! The directory seam used by the command dispatcher

use crate::error::Result;
use crate::types::LocationId;
use async_trait::async_trait;
use relay_auth::Credential;

/// Enumerates listings and publishes posts to them
#[async_trait]
pub trait Directory: Send + Sync {
    /// All locations of the session's first account, in listing order
    ///
    /// No account or no locations is an empty list, not an error.
    async fn list_locations(&self, session: &Credential) -> Result<Vec<LocationId>>;

    /// Publish `text` to one location
    ///
    /// Every failure is logged and reported as `false`.
    async fn post(&self, location: &LocationId, text: &str, session: &Credential) -> bool;
}
