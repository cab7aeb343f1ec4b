//! Profile relay bot
//!
//! Serves `/start`, `/post` and `/allpost` from Telegram and publishes the
//! text to Google Business Profile locations.
//!
//! # Usage
//!
//! ```bash
//! # Set up environment variables (or put them in .env)
//! export TELEGRAM_BOT_TOKEN="123456:ABC..."
//!
//! # Authorize once, ahead of time
//! cargo run --bin relay-bot -- login
//!
//! # Serve commands
//! cargo run --bin relay-bot
//! ```

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use relay_auth::{BrowserPrompt, CredentialStore, SessionProvider};
use relay_bot::{Dispatcher, RelayConfig, TelegramBot, TelegramClient, TelegramConfig};
use relay_directory::BusinessProfileClient;
use relay_utils::{LogFormat, LoggingConfig, init_tracing, load_dotenv};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Parser)]
#[command(name = "relay-bot", version, about = "Relay Telegram commands to Google Business Profile posts")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Persisted credential file [env: GOOGLE_TOKEN_PATH]
    #[arg(long, global = true)]
    token_path: Option<PathBuf>,

    /// OAuth client secrets file [env: GOOGLE_CLIENT_SECRETS]
    #[arg(long, global = true)]
    client_secrets: Option<PathBuf>,

    /// Local port for the OAuth redirect [env: OAUTH_CALLBACK_PORT]
    #[arg(long, global = true)]
    callback_port: Option<u16>,

    /// Print the consent URL without opening a browser
    #[arg(long, global = true)]
    no_browser: bool,

    /// Log output format, pretty or json [env: RELAY_LOG_FORMAT]
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve chat commands (default)
    Run,
    /// Authorize against Google now instead of on the first command
    Login,
    /// Show the state of the stored credential
    Status,
}

impl Cli {
    fn apply(&self, config: &mut RelayConfig) {
        if let Some(path) = &self.token_path {
            config.token_path.clone_from(path);
        }
        if let Some(path) = &self.client_secrets {
            config.client_secrets_path.clone_from(path);
        }
        if let Some(port) = self.callback_port {
            config.callback_port = port;
        }
        if self.no_browser {
            config.open_browser = false;
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
    }
}

fn credential_store(config: &RelayConfig) -> anyhow::Result<CredentialStore> {
    let store = CredentialStore::new(config.store_config())?
        .with_prompt(Arc::new(BrowserPrompt::new(config.open_browser)));
    Ok(store)
}

async fn run(config: &RelayConfig) -> anyhow::Result<()> {
    let token = config.telegram_token()?;

    let store = credential_store(config)?;
    let directory = BusinessProfileClient::with_config(config.directory_config())?;
    let dispatcher = Dispatcher::new(Arc::new(store), Arc::new(directory));

    let client = TelegramClient::new(
        TelegramConfig::new(token)
            .with_api_base(config.telegram_api_base.clone())
            .with_request_timeout(config.request_timeout),
    )?;
    let bot = TelegramBot::connect(client, dispatcher)
        .await
        .context("Failed to connect to Telegram")?;

    bot.run_until(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl-C, shutting down"),
            Err(e) => warn!("Could not listen for Ctrl-C: {}", e),
        }
    })
    .await?;

    Ok(())
}

async fn login(config: &RelayConfig) -> anyhow::Result<()> {
    let store = credential_store(config)?;
    let credential = store
        .ensure_valid_session()
        .await
        .context("Authorization failed")?;

    println!("Authorized. Credential stored at {}", config.token_path.display());
    if let Some(expiry) = credential.expiry {
        println!("  Access token expires: {expiry}");
    }
    Ok(())
}

fn status(config: &RelayConfig) -> anyhow::Result<()> {
    let store = credential_store(config)?;
    let health = store.inspect()?;

    println!("Credential file: {}", health.token_path.display());
    if !health.present {
        println!("  No credential stored; run `relay-bot login`");
        return Ok(());
    }

    let state = if health.valid {
        "valid"
    } else if health.refreshable {
        "expired, will refresh on next use"
    } else {
        "expired, needs `relay-bot login`"
    };
    println!("  State: {state}");
    match health.expiry {
        Some(expiry) => println!("  Expires: {expiry}"),
        None => println!("  Expires: unknown"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = load_dotenv();
    let cli = Cli::parse();

    let mut config = RelayConfig::from_env()?;
    cli.apply(&mut config);
    config.validate()?;

    init_tracing(&LoggingConfig::default().with_format(config.log_format));
    if let Some(path) = dotenv {
        debug!("Loaded environment from {}", path.display());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(&config).await,
        Commands::Login => login(&config).await,
        Commands::Status => status(&config),
    }
}
