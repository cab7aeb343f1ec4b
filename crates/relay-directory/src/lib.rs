//! Google Business Profile directory client for profile-relay
//!
//! Lists the locations of the operator's first business account and
//! publishes standard text updates ("local posts") to them.
//!
//! # Example
//!
//! ```rust,ignore
//! use relay_directory::{BusinessProfileClient, Directory};
//!
//! let directory = BusinessProfileClient::new()?;
//! let locations = directory.list_locations(&credential).await?;
//! if let Some(first) = locations.first() {
//!     directory.post(first, "Open late today", &credential).await;
//! }
//! ```

pub mod client;
pub mod directory;
pub mod error;
pub mod types;

pub use client::{BusinessProfileClient, DirectoryConfig};
pub use directory::Directory;
pub use error::{DirectoryError, Result};
pub use types::{Account, LocalPost, Location, LocationId, PostRequest};
