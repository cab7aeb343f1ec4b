//! Mocks of the dispatcher seams

use async_trait::async_trait;
use mockall::mock;
use relay_auth::{Credential, SessionProvider};
use relay_directory::{Directory, LocationId};

mock! {
    pub Sessions {}

    #[async_trait]
    impl SessionProvider for Sessions {
        async fn ensure_valid_session(&self) -> relay_auth::Result<Credential>;
    }
}

mock! {
    pub Locations {}

    #[async_trait]
    impl Directory for Locations {
        async fn list_locations(&self, session: &Credential) -> relay_directory::Result<Vec<LocationId>>;
        async fn post(&self, location: &LocationId, text: &str, session: &Credential) -> bool;
    }
}

pub fn credential() -> Credential {
    Credential {
        access_token: "access".to_string(),
        refresh_token: Some("refresh".to_string()),
        token_uri: "https://oauth2.example.com/token".to_string(),
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        scopes: vec![relay_auth::BUSINESS_MANAGE_SCOPE.to_string()],
        expiry: None,
    }
}

/// A session provider that always succeeds
pub fn signed_in() -> MockSessions {
    let mut sessions = MockSessions::new();
    sessions
        .expect_ensure_valid_session()
        .returning(|| Ok(credential()));
    sessions
}

pub fn locations(names: &[&str]) -> Vec<LocationId> {
    names.iter().map(|name| LocationId::new(*name)).collect()
}
