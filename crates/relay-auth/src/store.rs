//! Credential store: load, refresh or interactively obtain a session

use crate::callback::CallbackListener;
use crate::credential::{BUSINESS_MANAGE_SCOPE, Credential};
use crate::error::{AuthError, Result};
use crate::flow::{self, ConsentClient};
use crate::prompt::{BrowserPrompt, ConsentPrompt};
use crate::secrets::ClientSecrets;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default persisted credential path
pub const DEFAULT_TOKEN_PATH: &str = "token.json";

/// Default OAuth client registration path
pub const DEFAULT_CLIENT_SECRETS_PATH: &str = "credentials.json";

/// Default port of the local consent callback
pub const DEFAULT_CALLBACK_PORT: u16 = 8080;

/// Anything that can hand out a usable session
///
/// The command dispatcher only depends on this seam.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Return a non-expired credential, refreshing or re-authorizing as needed
    async fn ensure_valid_session(&self) -> Result<Credential>;
}

/// Settings of the credential store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Where the credential is persisted
    pub token_path: PathBuf,
    /// OAuth client registration, read only for interactive consent
    pub client_secrets_path: PathBuf,
    /// Local port receiving the provider redirect
    pub callback_port: u16,
    /// Upper bound on waiting for the operator to consent
    pub consent_timeout: Duration,
    /// Timeout of token endpoint requests
    pub request_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
            client_secrets_path: PathBuf::from(DEFAULT_CLIENT_SECRETS_PATH),
            callback_port: DEFAULT_CALLBACK_PORT,
            consent_timeout: Duration::from_secs(300),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Snapshot of the persisted credential, for status reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHealth {
    pub token_path: PathBuf,
    pub present: bool,
    pub valid: bool,
    pub refreshable: bool,
    pub expiry: Option<DateTime<Utc>>,
}

/// File-backed credential store
pub struct CredentialStore {
    config: StoreConfig,
    http: reqwest::Client,
    prompt: Arc<dyn ConsentPrompt>,
}

impl CredentialStore {
    /// Create a store that opens the consent URL in a browser
    pub fn new(config: StoreConfig) -> Result<Self> {
        let http = flow::http_client(config.request_timeout)?;
        Ok(Self {
            config,
            http,
            prompt: Arc::new(BrowserPrompt::default()),
        })
    }

    /// Replace the way the consent URL is shown
    pub fn with_prompt(mut self, prompt: Arc<dyn ConsentPrompt>) -> Self {
        self.prompt = prompt;
        self
    }

    /// Store settings
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Describe the persisted credential without touching it
    pub fn inspect(&self) -> Result<SessionHealth> {
        let credential = Credential::load(&self.config.token_path)?;
        Ok(SessionHealth {
            token_path: self.config.token_path.clone(),
            present: credential.is_some(),
            valid: credential.as_ref().is_some_and(Credential::is_valid),
            refreshable: credential.as_ref().is_some_and(Credential::can_refresh),
            expiry: credential.and_then(|c| c.expiry),
        })
    }

    /// Read the persisted credential, treating an unreadable file as absent
    fn load_persisted(&self) -> Option<Credential> {
        match Credential::load(&self.config.token_path) {
            Ok(credential) => credential,
            Err(e) => {
                warn!("Ignoring persisted credential: {}", e);
                None
            }
        }
    }

    fn persist(&self, credential: &Credential) -> Result<()> {
        credential.save(&self.config.token_path)?;
        debug!("Credential written to {:?}", self.config.token_path);
        Ok(())
    }

    /// Run the browser consent flow and return the issued credential
    pub async fn authorize_interactively(&self) -> Result<Credential> {
        let secrets = ClientSecrets::from_file(&self.config.client_secrets_path)?;
        let listener = CallbackListener::bind(self.config.callback_port).await?;
        let client = ConsentClient::new(&secrets, &listener.redirect_url(), self.http.clone())?;

        let consent = client.authorization_url(&[BUSINESS_MANAGE_SCOPE]);
        self.prompt.present(&consent.url);

        let response = listener.wait(self.config.consent_timeout).await?;
        if response.state != consent.csrf_token {
            return Err(AuthError::CsrfMismatch);
        }

        client
            .exchange_code(&response.code, &consent.pkce_verifier, &[BUSINESS_MANAGE_SCOPE])
            .await
    }
}

#[async_trait]
impl SessionProvider for CredentialStore {
    async fn ensure_valid_session(&self) -> Result<Credential> {
        let persisted = self.load_persisted();

        let credential = match persisted {
            Some(credential) if credential.is_valid() => {
                debug!("Using persisted credential");
                return Ok(credential);
            }
            Some(credential) if credential.is_expired() && credential.can_refresh() => {
                info!("Access token expired, refreshing");
                flow::refresh(&self.http, &credential).await?
            }
            _ => {
                info!("No usable credential, starting interactive authorization");
                self.authorize_interactively().await?
            }
        };

        self.persist(&credential)?;
        Ok(credential)
    }
}
