//! Process configuration
//!
//! Built once at startup from the environment (a `.env` file is loaded
//! beforehand by the binary), then overridden by command line flags.

use crate::error::{RelayError, Result};
use relay_auth::StoreConfig;
use relay_directory::DirectoryConfig;
use relay_utils::LogFormat;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Bot API base URL
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Relay configuration
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Bot token from BotFather; only the `run` command needs it
    pub telegram_token: Option<String>,

    /// Bot API base URL
    pub telegram_api_base: String,

    /// OAuth client registration file
    pub client_secrets_path: PathBuf,

    /// Persisted credential file
    pub token_path: PathBuf,

    /// Local port receiving the OAuth redirect
    pub callback_port: u16,

    /// Upper bound on waiting for interactive consent
    pub consent_timeout: Duration,

    /// Open the consent URL in a browser
    pub open_browser: bool,

    /// HTTP request timeout
    pub request_timeout: Duration,

    /// Log output format
    pub log_format: LogFormat,
}

impl Default for RelayConfig {
    fn default() -> Self {
        let store = StoreConfig::default();
        Self {
            telegram_token: None,
            telegram_api_base: DEFAULT_TELEGRAM_API_BASE.to_string(),
            client_secrets_path: store.client_secrets_path,
            token_path: store.token_path,
            callback_port: store.callback_port,
            consent_timeout: store.consent_timeout,
            open_browser: true,
            request_timeout: store.request_timeout,
            log_format: LogFormat::default(),
        }
    }
}

impl RelayConfig {
    /// Create a new configuration builder
    pub fn builder() -> RelayConfigBuilder {
        RelayConfigBuilder::default()
    }

    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable lookup
    ///
    /// Unset and empty variables fall back to defaults; malformed values are
    /// configuration errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            telegram_token: var("TELEGRAM_BOT_TOKEN").map(|token| token.trim().to_string()),
            telegram_api_base: defaults.telegram_api_base,
            client_secrets_path: var("GOOGLE_CLIENT_SECRETS")
                .map_or(defaults.client_secrets_path, PathBuf::from),
            token_path: var("GOOGLE_TOKEN_PATH").map_or(defaults.token_path, PathBuf::from),
            callback_port: parse_var(&var, "OAUTH_CALLBACK_PORT")?
                .unwrap_or(defaults.callback_port),
            consent_timeout: parse_var(&var, "OAUTH_CONSENT_TIMEOUT_SECS")?
                .map_or(defaults.consent_timeout, Duration::from_secs),
            open_browser: parse_var(&var, "OAUTH_OPEN_BROWSER")?
                .unwrap_or(defaults.open_browser),
            request_timeout: parse_var(&var, "RELAY_REQUEST_TIMEOUT_SECS")?
                .map_or(defaults.request_timeout, Duration::from_secs),
            log_format: parse_var(&var, "RELAY_LOG_FORMAT")?
                .unwrap_or(defaults.log_format),
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.consent_timeout.is_zero() {
            return Err(RelayError::Config(
                "OAUTH_CONSENT_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(RelayError::Config(
                "RELAY_REQUEST_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }

        if self.telegram_token.as_deref().is_some_and(|t| t.contains(char::is_whitespace)) {
            return Err(RelayError::Config(
                "TELEGRAM_BOT_TOKEN must not contain whitespace".to_string(),
            ));
        }

        Ok(())
    }

    /// The bot token, required to serve commands
    pub fn telegram_token(&self) -> Result<&str> {
        self.telegram_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| RelayError::Config("TELEGRAM_BOT_TOKEN not set".to_string()))
    }

    /// Settings of the credential store
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            token_path: self.token_path.clone(),
            client_secrets_path: self.client_secrets_path.clone(),
            callback_port: self.callback_port,
            consent_timeout: self.consent_timeout,
            request_timeout: self.request_timeout,
        }
    }

    /// Settings of the directory client
    pub fn directory_config(&self) -> DirectoryConfig {
        DirectoryConfig::default().with_timeout(self.request_timeout.as_secs())
    }
}

/// Look up and parse an optional variable, naming it in the error
fn parse_var<T, F>(var: F, key: &str) -> Result<Option<T>>
where
    T: ParseSetting,
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .map(|raw| {
            T::parse_setting(raw.trim())
                .ok_or_else(|| RelayError::Config(format!("invalid value for {key}: '{raw}'")))
        })
        .transpose()
}

trait ParseSetting: Sized {
    fn parse_setting(raw: &str) -> Option<Self>;
}

impl ParseSetting for u16 {
    fn parse_setting(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

impl ParseSetting for u64 {
    fn parse_setting(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

impl ParseSetting for LogFormat {
    fn parse_setting(raw: &str) -> Option<Self> {
        LogFormat::from_str(raw).ok()
    }
}

impl ParseSetting for bool {
    fn parse_setting(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        }
    }
}

/// Builder for RelayConfig
#[derive(Debug, Default)]
pub struct RelayConfigBuilder {
    telegram_token: Option<String>,
    telegram_api_base: Option<String>,
    client_secrets_path: Option<PathBuf>,
    token_path: Option<PathBuf>,
    callback_port: Option<u16>,
    consent_timeout: Option<Duration>,
    open_browser: Option<bool>,
    request_timeout: Option<Duration>,
    log_format: Option<LogFormat>,
}

impl RelayConfigBuilder {
    /// Set bot token
    pub fn telegram_token(mut self, token: impl Into<String>) -> Self {
        self.telegram_token = Some(token.into());
        self
    }

    /// Set Bot API base URL
    pub fn telegram_api_base(mut self, base: impl Into<String>) -> Self {
        self.telegram_api_base = Some(base.into());
        self
    }

    /// Set client secrets path
    pub fn client_secrets_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.client_secrets_path = Some(path.into());
        self
    }

    /// Set credential path
    pub fn token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = Some(path.into());
        self
    }

    /// Set callback port
    pub fn callback_port(mut self, port: u16) -> Self {
        self.callback_port = Some(port);
        self
    }

    /// Set consent timeout
    pub fn consent_timeout(mut self, timeout: Duration) -> Self {
        self.consent_timeout = Some(timeout);
        self
    }

    /// Set whether to open a browser for consent
    pub fn open_browser(mut self, open: bool) -> Self {
        self.open_browser = Some(open);
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set log format
    pub fn log_format(mut self, format: LogFormat) -> Self {
        self.log_format = Some(format);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<RelayConfig> {
        let defaults = RelayConfig::default();

        let config = RelayConfig {
            telegram_token: self.telegram_token.or(defaults.telegram_token),
            telegram_api_base: self.telegram_api_base.unwrap_or(defaults.telegram_api_base),
            client_secrets_path: self.client_secrets_path.unwrap_or(defaults.client_secrets_path),
            token_path: self.token_path.unwrap_or(defaults.token_path),
            callback_port: self.callback_port.unwrap_or(defaults.callback_port),
            consent_timeout: self.consent_timeout.unwrap_or(defaults.consent_timeout),
            open_browser: self.open_browser.unwrap_or(defaults.open_browser),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            log_format: self.log_format.unwrap_or(defaults.log_format),
        };

        config.validate()?;
        Ok(config)
    }
}
