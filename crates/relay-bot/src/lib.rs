//! Telegram relay for Google Business Profile updates
//!
//! Chat commands:
//!
//! - `/start` shows usage
//! - `/post <text>` posts to the first business location
//! - `/allpost <text>` posts to every business location
//!
//! # Architecture
//!
//! - [`platforms::telegram`] long-polls the Bot API and sends replies
//! - [`bot::Dispatcher`] runs one command at a time against two seams:
//!   [`relay_auth::SessionProvider`] for the OAuth session and
//!   [`relay_directory::Directory`] for the listings
//! - [`config::RelayConfig`] is built once at startup from the environment
//!
//! # Example
//!
//! ```rust,ignore
//! use relay_bot::{Dispatcher, RelayConfig, TelegramBot, TelegramClient, TelegramConfig};
//! use relay_auth::CredentialStore;
//! use relay_directory::BusinessProfileClient;
//! use std::sync::Arc;
//!
//! let config = RelayConfig::from_env()?;
//! let store = CredentialStore::new(config.store_config())?;
//! let directory = BusinessProfileClient::with_config(config.directory_config())?;
//! let dispatcher = Dispatcher::new(Arc::new(store), Arc::new(directory));
//!
//! let client = TelegramClient::new(TelegramConfig::new(config.telegram_token()?))?;
//! let bot = TelegramBot::connect(client, dispatcher).await?;
//! bot.run_until(tokio::signal::ctrl_c().map(|_| ())).await?;
//! ```

pub mod bot;
pub mod config;
pub mod error;
pub mod platforms;

#[cfg(test)]
mod testing;

pub use bot::{Command, Dispatcher, Reply};
pub use config::RelayConfig;
pub use error::{RelayError, Result};
pub use platforms::{TelegramBot, TelegramClient, TelegramConfig};
