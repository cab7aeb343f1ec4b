//! HTTP client for the Google Business Profile APIs
//!
//! Three APIs are involved:
//! - Account Management v1 for the account list
//! - Business Information v1 for the location list
//! - My Business v4 for local posts

use crate::directory::Directory;
use crate::error::{DirectoryError, Result};
use crate::types::{
    ListAccountsResponse, ListLocationsResponse, LocalPost, LocationId, PostRequest,
};
use async_trait::async_trait;
use relay_auth::Credential;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

const DEFAULT_ACCOUNTS_API_BASE: &str = "https://mybusinessaccountmanagement.googleapis.com/v1";
const DEFAULT_LOCATIONS_API_BASE: &str = "https://mybusinessbusinessinformation.googleapis.com/v1";
const DEFAULT_POSTS_API_BASE: &str = "https://mybusiness.googleapis.com/v4";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Fields requested from the location listing
const LOCATION_READ_MASK: &str = "name,title";
const LOCATION_PAGE_SIZE: &str = "100";

/// Endpoints and timeouts of the directory client
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// Account Management API base
    pub accounts_api_base: String,
    /// Business Information API base
    pub locations_api_base: String,
    /// My Business v4 API base
    pub posts_api_base: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl DirectoryConfig {
    /// Point all three APIs at one base URL, for local mock servers
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        self.accounts_api_base.clone_from(&base);
        self.locations_api_base.clone_from(&base);
        self.posts_api_base = base;
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            accounts_api_base: DEFAULT_ACCOUNTS_API_BASE.to_string(),
            locations_api_base: DEFAULT_LOCATIONS_API_BASE.to_string(),
            posts_api_base: DEFAULT_POSTS_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Business profile directory over HTTPS
pub struct BusinessProfileClient {
    client: Client,
    config: DirectoryConfig,
}

impl BusinessProfileClient {
    /// Create a client with custom configuration
    pub fn with_config(config: DirectoryConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a client against the production endpoints
    pub fn new() -> Result<Self> {
        Self::with_config(DirectoryConfig::default())
    }

    /// Get the current configuration
    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        api: &'static str,
        url: &str,
        query: &[(&str, &str)],
        session: &Credential,
    ) -> Result<T> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(&session.access_token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(DirectoryError::from_status(api, status, body));
        }

        serde_json::from_str(&body).map_err(|source| DirectoryError::UnexpectedResponse { api, source })
    }

    /// Name of the session's first account, if any
    async fn first_account(&self, session: &Credential) -> Result<Option<String>> {
        let url = format!("{}/accounts", self.config.accounts_api_base);
        let response: ListAccountsResponse = self.get_json("accounts", &url, &[], session).await?;
        Ok(response.accounts.into_iter().next().map(|account| account.name))
    }

    /// Create a local post and return the created resource
    pub async fn create_post(
        &self,
        location: &LocationId,
        text: &str,
        session: &Credential,
    ) -> Result<LocalPost> {
        let url = format!("{}/{}/localPosts", self.config.posts_api_base, location);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&session.access_token)
            .json(&PostRequest::new(text))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(DirectoryError::from_status("localPosts", status, body));
        }

        serde_json::from_str(&body).map_err(|source| DirectoryError::UnexpectedResponse {
            api: "localPosts",
            source,
        })
    }
}

#[async_trait]
impl Directory for BusinessProfileClient {
    #[instrument(skip(self, session))]
    async fn list_locations(&self, session: &Credential) -> Result<Vec<LocationId>> {
        let Some(account) = self.first_account(session).await? else {
            info!("No business accounts visible to this credential");
            return Ok(Vec::new());
        };

        let url = format!("{}/{}/locations", self.config.locations_api_base, account);
        let mut locations = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("readMask", LOCATION_READ_MASK),
                ("pageSize", LOCATION_PAGE_SIZE),
            ];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }

            let page: ListLocationsResponse =
                self.get_json("locations", &url, &query, session).await?;

            locations.extend(
                page.locations
                    .iter()
                    .map(|location| LocationId::qualified(&account, &location.name)),
            );

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(account = %account, count = locations.len(), "Listed locations");
        Ok(locations)
    }

    #[instrument(skip(self, text, session), fields(location = %location))]
    async fn post(&self, location: &LocationId, text: &str, session: &Credential) -> bool {
        match self.create_post(location, text, session).await {
            Ok(post) => {
                info!(post = %post.name, "Posted update");
                true
            }
            Err(e) => {
                error!("Error posting to {}: {}", location, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session() -> Credential {
        Credential {
            access_token: "access".to_string(),
            refresh_token: None,
            token_uri: "https://oauth2.example.com/token".to_string(),
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            scopes: Vec::new(),
            expiry: None,
        }
    }

    fn client(server: &MockServer) -> BusinessProfileClient {
        BusinessProfileClient::with_config(
            DirectoryConfig::default()
                .with_api_base(server.uri())
                .with_timeout(5),
        )
        .unwrap()
    }

    async fn mount_accounts(server: &MockServer, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/accounts"))
            .and(header("authorization", "Bearer access"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[test]
    fn test_default_config() {
        let config = DirectoryConfig::default();
        assert_eq!(config.accounts_api_base, DEFAULT_ACCOUNTS_API_BASE);
        assert_eq!(config.posts_api_base, DEFAULT_POSTS_API_BASE);
        assert_eq!(config.timeout_secs, 30);
    }

    #[tokio::test]
    async fn test_list_locations_follows_pages() {
        let server = MockServer::start().await;
        mount_accounts(
            &server,
            serde_json::json!({"accounts": [{"name": "accounts/1"}, {"name": "accounts/2"}]}),
        )
        .await;

        Mock::given(method("GET"))
            .and(path("/accounts/1/locations"))
            .and(query_param("readMask", "name,title"))
            .and(query_param("pageToken", "p2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "locations": [{"name": "locations/c"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/accounts/1/locations"))
            .and(query_param("readMask", "name,title"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "locations": [
                    {"name": "locations/a", "title": "Downtown"},
                    {"name": "locations/b"}
                ],
                "nextPageToken": "p2"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let locations = client(&server).list_locations(&session()).await.unwrap();
        assert_eq!(
            locations,
            vec![
                LocationId::new("accounts/1/locations/a"),
                LocationId::new("accounts/1/locations/b"),
                LocationId::new("accounts/1/locations/c"),
            ]
        );
    }

    #[tokio::test]
    async fn test_no_accounts_is_empty() {
        let server = MockServer::start().await;
        mount_accounts(&server, serde_json::json!({})).await;

        let locations = client(&server).list_locations(&session()).await.unwrap();
        assert!(locations.is_empty());
    }

    #[tokio::test]
    async fn test_account_without_locations_is_empty() {
        let server = MockServer::start().await;
        mount_accounts(&server, serde_json::json!({"accounts": [{"name": "accounts/1"}]})).await;
        Mock::given(method("GET"))
            .and(path("/accounts/1/locations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let locations = client(&server).list_locations(&session()).await.unwrap();
        assert!(locations.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_credential() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/accounts"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client(&server).list_locations(&session()).await.unwrap_err();
        assert!(matches!(err, DirectoryError::AuthenticationFailed { .. }));
    }

    #[tokio::test]
    async fn test_malformed_listing() {
        let server = MockServer::start().await;
        mount_accounts(&server, serde_json::json!({"accounts": [{"accountName": "x"}]})).await;

        let err = client(&server).list_locations(&session()).await.unwrap_err();
        assert!(matches!(err, DirectoryError::UnexpectedResponse { api: "accounts", .. }));
    }

    #[tokio::test]
    async fn test_post_sends_standard_update() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/accounts/1/locations/a/localPosts"))
            .and(header("authorization", "Bearer access"))
            .and(body_json(serde_json::json!({
                "languageCode": "en",
                "summary": "Open late today",
                "topicType": "STANDARD"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "accounts/1/locations/a/localPosts/42",
                "state": "LIVE"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let posted = client(&server)
            .post(
                &LocationId::new("accounts/1/locations/a"),
                "Open late today",
                &session(),
            )
            .await;
        assert!(posted);
    }

    #[tokio::test]
    async fn test_post_failure_is_false() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/accounts/1/locations/a/localPosts"))
            .respond_with(ResponseTemplate::new(403).set_body_string("PERMISSION_DENIED"))
            .mount(&server)
            .await;

        let location = LocationId::new("accounts/1/locations/a");
        let client = client(&server);
        assert!(!client.post(&location, "hello", &session()).await);

        let err = client.create_post(&location, "hello", &session()).await;
        tokio_test::assert_err!(err);
    }

    #[tokio::test]
    async fn test_post_unreachable_is_false() {
        let client = BusinessProfileClient::with_config(
            DirectoryConfig::default()
                .with_api_base("http://127.0.0.1:9")
                .with_timeout(2),
        )
        .unwrap();

        let posted = client
            .post(&LocationId::new("accounts/1/locations/a"), "hello", &session())
            .await;
        assert!(!posted);
    }
}
