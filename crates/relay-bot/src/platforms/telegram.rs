//! Telegram Bot API transport
//!
//! Long polling over `getUpdates`, one update at a time. Only the handful
//! of Bot API methods the relay needs are wrapped. An update counts as
//! handled once a later `getUpdates` carries an offset past it.

use crate::bot::{Command, Dispatcher, commands};
use crate::error::{RelayError, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Seconds the Bot API holds a `getUpdates` request open
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

/// Pause after a failed `getUpdates` before polling again
const POLL_ERROR_PAUSE: Duration = Duration::from_secs(5);

/// Telegram bot configuration
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot token from BotFather
    pub token: String,

    /// Bot API base URL
    pub api_base: String,

    /// Long poll timeout in seconds
    pub poll_timeout_secs: u64,

    /// Timeout of non-polling requests
    pub request_timeout: Duration,
}

impl TelegramConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_base: crate::config::DEFAULT_TELEGRAM_API_BASE.to_string(),
            poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Set Bot API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set long poll timeout in seconds
    pub fn with_poll_timeout(mut self, secs: u64) -> Self {
        self.poll_timeout_secs = secs;
        self
    }

    /// Set request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Envelope of every Bot API response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BotCommand {
    pub command: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
struct GetUpdates<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct SetMyCommands<'a> {
    commands: &'a [BotCommand],
}

/// Minimal Bot API client
#[derive(Debug, Clone)]
pub struct TelegramClient {
    client: Client,
    config: TelegramConfig,
}

impl TelegramClient {
    pub fn new(config: TelegramConfig) -> Result<Self> {
        if config.token.trim().is_empty() {
            return Err(RelayError::Config("TELEGRAM_BOT_TOKEN not set".to_string()));
        }

        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self { client, config })
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.token,
            method
        )
    }

    async fn call<B, T>(&self, method: &'static str, body: &B, timeout: Option<Duration>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.client.post(self.method_url(method)).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        let envelope: ApiResponse<T> =
            serde_json::from_str(&body).map_err(|e| RelayError::Telegram {
                method,
                description: format!("HTTP {status}: undecodable response ({e})"),
            })?;

        match envelope {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse {
                error_code: Some(401),
                ..
            } => Err(RelayError::Config("bot token rejected by Telegram".to_string())),
            ApiResponse { description, .. } => Err(RelayError::Telegram {
                method,
                description: description.unwrap_or_else(|| format!("HTTP {status}")),
            }),
        }
    }

    /// The bot's own account; also checks the token
    pub async fn get_me(&self) -> Result<User> {
        self.call("getMe", &serde_json::json!({}), None).await
    }

    /// Register the chat menu commands
    pub async fn set_my_commands(&self, commands: &[BotCommand]) -> Result<()> {
        let _: bool = self
            .call("setMyCommands", &SetMyCommands { commands }, None)
            .await?;
        Ok(())
    }

    /// Long poll for message updates after `offset`
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>> {
        let body = GetUpdates {
            offset,
            limit: None,
            timeout: self.config.poll_timeout_secs,
            allowed_updates: &["message"],
        };
        let timeout = self.config.request_timeout + Duration::from_secs(self.config.poll_timeout_secs);
        self.call("getUpdates", &body, Some(timeout)).await
    }

    /// Confirm every update before `offset` without waiting for new ones
    ///
    /// Telegram only forgets handled updates when it sees a later offset.
    /// Anything returned here stays unconfirmed and is delivered again.
    pub async fn acknowledge(&self, offset: i64) -> Result<()> {
        let body = GetUpdates {
            offset: Some(offset),
            limit: Some(1),
            timeout: 0,
            allowed_updates: &["message"],
        };
        let _: Vec<Update> = self.call("getUpdates", &body, None).await?;
        Ok(())
    }

    /// Send a plain text message
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<Message> {
        self.call("sendMessage", &SendMessage { chat_id, text }, None)
            .await
    }
}

/// Serves chat commands from Telegram
pub struct TelegramBot {
    client: TelegramClient,
    dispatcher: Dispatcher,
    username: Option<String>,
}

impl TelegramBot {
    /// Verify the token and register the command menu
    ///
    /// A rejected token is fatal; a failed menu registration is only logged.
    pub async fn connect(client: TelegramClient, dispatcher: Dispatcher) -> Result<Self> {
        let me = client.get_me().await?;
        info!(
            bot_id = me.id,
            username = me.username.as_deref().unwrap_or_default(),
            "Connected to Telegram"
        );

        let menu: Vec<BotCommand> = commands::MENU
            .iter()
            .map(|(command, description)| BotCommand {
                command: (*command).to_string(),
                description: (*description).to_string(),
            })
            .collect();
        if let Err(e) = client.set_my_commands(&menu).await {
            warn!("Could not register bot commands: {}", e);
        }

        Ok(Self {
            client,
            dispatcher,
            username: me.username,
        })
    }

    /// Handle one update to completion
    ///
    /// Messages that are not our commands are ignored without a reply.
    #[instrument(skip(self, update), fields(update_id = update.update_id))]
    pub async fn handle_update(&self, update: Update) {
        let Some(message) = update.message else {
            return;
        };
        let Some(text) = message.text.as_deref() else {
            return;
        };
        let Some(command) = Command::parse(text, self.username.as_deref()) else {
            debug!("Ignoring non-command message");
            return;
        };

        let chat_id = message.chat.id;
        info!(chat_id, command = command.name(), "Received command");

        let reply = self.dispatcher.dispatch(command).await;
        if let Err(e) = self.client.send_message(chat_id, &reply.to_string()).await {
            error!(chat_id, "Failed to send reply: {}", e);
        }
    }

    /// Poll and serve until `shutdown` resolves
    ///
    /// A command in progress is finished before shutting down, and the
    /// handled updates are confirmed so a restart does not run them again.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut offset: Option<i64> = None;
        info!("🤖 Telegram bot started");

        loop {
            let polled = tokio::select! {
                () = &mut shutdown => break,
                polled = self.client.get_updates(offset) => polled,
            };

            match polled {
                Ok(updates) => {
                    for update in updates {
                        offset = Some(update.update_id + 1);
                        self.handle_update(update).await;
                    }
                }
                Err(RelayError::Config(reason)) => return Err(RelayError::Config(reason)),
                Err(e) => {
                    warn!("getUpdates failed: {}", e);
                    tokio::select! {
                        () = &mut shutdown => break,
                        () = tokio::time::sleep(POLL_ERROR_PAUSE) => {}
                    }
                }
            }
        }

        if let Some(offset) = offset {
            match self.client.acknowledge(offset).await {
                Ok(()) => debug!(offset, "Confirmed handled updates"),
                Err(e) => warn!(offset, "Could not confirm handled updates: {}", e),
            }
        }

        info!("Telegram bot stopped");
        Ok(())
    }
}
