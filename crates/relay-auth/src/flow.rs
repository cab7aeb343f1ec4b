//! OAuth 2.0 exchanges against the identity provider
//!
//! - Authorization URL with PKCE for the interactive consent
//! - Authorization code exchange
//! - Refresh token exchange

use crate::credential::Credential;
use crate::error::{AuthError, Result};
use crate::secrets::ClientSecrets;
use chrono::{TimeDelta, Utc};
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, RefreshToken, Scope, TokenResponse, TokenUrl,
    basic::{BasicClient, BasicTokenResponse},
};
use std::time::Duration;
use tracing::debug;

/// Everything needed to finish a consent once the provider redirects back
#[derive(Debug, Clone)]
pub struct ConsentRequest {
    /// URL the operator opens in a browser
    pub url: String,
    /// State we expect back on the callback
    pub csrf_token: String,
    /// PKCE verifier matching the challenge in `url`
    pub pkce_verifier: String,
}

/// Build the HTTP client used for token exchanges
///
/// Redirects are disabled so a misconfigured token endpoint cannot bounce
/// the client secret elsewhere.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(timeout)
        .build()?)
}

/// Installed-app OAuth client bound to one redirect URL
#[derive(Debug, Clone)]
pub struct ConsentClient {
    client_id: ClientId,
    client_secret: ClientSecret,
    auth_url: AuthUrl,
    token_url: TokenUrl,
    redirect_url: RedirectUrl,
    http: reqwest::Client,
}

impl ConsentClient {
    /// Create a client from the registration and the local redirect URL
    pub fn new(secrets: &ClientSecrets, redirect_url: &str, http: reqwest::Client) -> Result<Self> {
        let auth_url = AuthUrl::new(secrets.auth_uri.clone())
            .map_err(|e| AuthError::ConfigError(format!("invalid auth URL: {e}")))?;
        let token_url = TokenUrl::new(secrets.token_uri.clone())
            .map_err(|e| AuthError::ConfigError(format!("invalid token URL: {e}")))?;
        let redirect_url = RedirectUrl::new(redirect_url.to_string())
            .map_err(|e| AuthError::ConfigError(format!("invalid redirect URL: {e}")))?;

        Ok(Self {
            client_id: ClientId::new(secrets.client_id.clone()),
            client_secret: ClientSecret::new(secrets.client_secret.clone()),
            auth_url,
            token_url,
            redirect_url,
            http,
        })
    }

    /// Generate the consent URL for `scopes`
    pub fn authorization_url(&self, scopes: &[&str]) -> ConsentRequest {
        let client = BasicClient::new(self.client_id.clone())
            .set_client_secret(self.client_secret.clone())
            .set_auth_uri(self.auth_url.clone())
            .set_redirect_uri(self.redirect_url.clone());

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut auth_request = client
            .authorize_url(CsrfToken::new_random)
            .set_pkce_challenge(pkce_challenge);

        for scope in scopes {
            auth_request = auth_request.add_scope(Scope::new((*scope).to_string()));
        }

        // Offline access plus forced consent so a refresh token is always issued
        auth_request = auth_request
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent");

        let (url, csrf_token) = auth_request.url();

        ConsentRequest {
            url: url.to_string(),
            csrf_token: csrf_token.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
        }
    }

    /// Exchange the authorization code for a credential
    pub async fn exchange_code(
        &self,
        code: &str,
        pkce_verifier: &str,
        scopes: &[&str],
    ) -> Result<Credential> {
        let client = BasicClient::new(self.client_id.clone())
            .set_client_secret(self.client_secret.clone())
            .set_auth_type(AuthType::RequestBody)
            .set_token_uri(self.token_url.clone())
            .set_redirect_uri(self.redirect_url.clone());

        debug!("Exchanging authorization code at {}", &*self.token_url);

        let response = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| AuthError::TokenExchange(e.to_string()))?;

        let template = Credential {
            access_token: String::new(),
            refresh_token: None,
            token_uri: self.token_url.to_string(),
            client_id: self.client_id.to_string(),
            client_secret: self.client_secret.secret().clone(),
            scopes: scopes.iter().map(|s| (*s).to_string()).collect(),
            expiry: None,
        };
        Ok(apply_token_response(template, &response))
    }
}

/// Renew an expired credential with its refresh token
///
/// The credential carries its own token endpoint and client registration, so
/// no client secrets file is needed.
pub async fn refresh(http: &reqwest::Client, credential: &Credential) -> Result<Credential> {
    let refresh_token = credential
        .refresh_token
        .clone()
        .ok_or_else(|| AuthError::Refresh("credential has no refresh token".to_string()))?;

    let token_url = TokenUrl::new(credential.token_uri.clone())
        .map_err(|e| AuthError::ConfigError(format!("invalid token URL: {e}")))?;

    let client = BasicClient::new(ClientId::new(credential.client_id.clone()))
        .set_client_secret(ClientSecret::new(credential.client_secret.clone()))
        .set_auth_type(AuthType::RequestBody)
        .set_token_uri(token_url);

    debug!("Refreshing access token at {}", credential.token_uri);

    let response = client
        .exchange_refresh_token(&RefreshToken::new(refresh_token))
        .request_async(http)
        .await
        .map_err(|e| AuthError::Refresh(e.to_string()))?;

    Ok(apply_token_response(credential.clone(), &response))
}

/// Fold a token response into an existing credential
///
/// Providers usually omit the refresh token and scopes on refresh; the
/// previous values are kept in that case.
fn apply_token_response(mut credential: Credential, response: &BasicTokenResponse) -> Credential {
    credential.access_token = response.access_token().secret().clone();

    if let Some(token) = response.refresh_token() {
        credential.refresh_token = Some(token.secret().clone());
    }

    if let Some(scopes) = response.scopes() {
        credential.scopes = scopes.iter().map(|s| s.to_string()).collect();
    }

    credential.expiry = response
        .expires_in()
        .and_then(|lifetime| TimeDelta::from_std(lifetime).ok())
        .map(|lifetime| Utc::now() + lifetime);

    credential
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::BUSINESS_MANAGE_SCOPE;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn secrets(token_uri: &str) -> ClientSecrets {
        ClientSecrets {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            auth_uri: "https://accounts.example.com/o/oauth2/auth".to_string(),
            token_uri: token_uri.to_string(),
        }
    }

    fn expired_credential(token_uri: &str) -> Credential {
        Credential {
            access_token: "stale".to_string(),
            refresh_token: Some("refresh-1".to_string()),
            token_uri: token_uri.to_string(),
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            scopes: vec![BUSINESS_MANAGE_SCOPE.to_string()],
            expiry: Some(Utc::now() - TimeDelta::hours(1)),
        }
    }

    #[test]
    fn test_authorization_url_carries_offline_consent() {
        let client = ConsentClient::new(
            &secrets("https://oauth2.example.com/token"),
            "http://localhost:8080/",
            reqwest::Client::new(),
        )
        .unwrap();

        let consent = client.authorization_url(&[BUSINESS_MANAGE_SCOPE]);
        let url = url::Url::parse(&consent.url).unwrap();
        let query: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(query.get("client_id").map(String::as_str), Some("client-id"));
        assert_eq!(query.get("access_type").map(String::as_str), Some("offline"));
        assert_eq!(query.get("prompt").map(String::as_str), Some("consent"));
        assert_eq!(
            query.get("redirect_uri").map(String::as_str),
            Some("http://localhost:8080/")
        );
        assert_eq!(query.get("scope").map(String::as_str), Some(BUSINESS_MANAGE_SCOPE));
        assert_eq!(
            query.get("state").map(String::as_str),
            Some(consent.csrf_token.as_str())
        );
        assert_eq!(
            query.get("code_challenge_method").map(String::as_str),
            Some("S256")
        );
    }

    #[test]
    fn test_rejects_invalid_redirect() {
        let err = ConsentClient::new(
            &secrets("https://oauth2.example.com/token"),
            "not a url",
            reqwest::Client::new(),
        )
        .unwrap_err();
        assert!(matches!(err, AuthError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_refresh_keeps_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=refresh-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "fresh",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let credential = expired_credential(&format!("{}/token", server.uri()));
        let refreshed = refresh(&reqwest::Client::new(), &credential).await.unwrap();

        assert_eq!(refreshed.access_token, "fresh");
        assert_eq!(refreshed.refresh_token.as_deref(), Some("refresh-1"));
        assert_eq!(refreshed.scopes, vec![BUSINESS_MANAGE_SCOPE]);
        assert!(refreshed.is_valid());
    }

    #[tokio::test]
    async fn test_refresh_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Token has been expired or revoked."
            })))
            .mount(&server)
            .await;

        let credential = expired_credential(&format!("{}/token", server.uri()));
        let err = refresh(&reqwest::Client::new(), &credential).await.unwrap_err();
        assert!(matches!(err, AuthError::Refresh(_)));
    }

    #[tokio::test]
    async fn test_exchange_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=the-code"))
            .and(body_string_contains("code_verifier=the-verifier"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "access",
                "refresh_token": "refresh",
                "expires_in": 3599,
                "scope": BUSINESS_MANAGE_SCOPE,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ConsentClient::new(
            &secrets(&format!("{}/token", server.uri())),
            "http://localhost:8080/",
            reqwest::Client::new(),
        )
        .unwrap();

        let credential = client
            .exchange_code("the-code", "the-verifier", &[BUSINESS_MANAGE_SCOPE])
            .await
            .unwrap();

        assert_eq!(credential.access_token, "access");
        assert_eq!(credential.refresh_token.as_deref(), Some("refresh"));
        assert_eq!(credential.client_id, "client-id");
        assert_eq!(credential.client_secret, "client-secret");
        assert!(credential.token_uri.ends_with("/token"));
        assert!(credential.is_valid());
    }
}
