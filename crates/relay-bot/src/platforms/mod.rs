//! Chat platform integrations

pub mod telegram;

pub use telegram::{TelegramBot, TelegramClient, TelegramConfig};
