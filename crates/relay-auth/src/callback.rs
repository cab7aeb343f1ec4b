//! One-shot local HTTP listener for the OAuth redirect
//!
//! Bound before the consent URL is shown, torn down as soon as the first
//! request to `/` arrives (or the wait times out).

use crate::error::{AuthError, Result};
use axum::{
    Router,
    extract::{Query, State},
    response::Html,
    routing::get,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, warn};

const SUCCESS_PAGE: &str =
    "<html><body>The authentication flow has completed. You may close this window.</body></html>";

const FAILURE_PAGE: &str =
    "<html><body>Authorization did not complete. You may close this window.</body></html>";

/// Time allowed for the callback page to be delivered after the flow ends
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// The provider's redirect, reduced to what the token exchange needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationResponse {
    pub code: String,
    pub state: String,
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

type Outcome = Result<AuthorizationResponse>;

#[derive(Clone)]
struct CallbackState {
    sender: Arc<Mutex<Option<oneshot::Sender<Outcome>>>>,
}

/// A bound, not yet serving, callback listener
#[derive(Debug)]
pub struct CallbackListener {
    listener: TcpListener,
    addr: SocketAddr,
}

impl CallbackListener {
    /// Bind on the loopback interface
    ///
    /// Port 0 picks a free port, which tests rely on.
    pub async fn bind(port: u16) -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .map_err(|source| AuthError::CallbackListener { port, source })?;
        let addr = listener
            .local_addr()
            .map_err(|source| AuthError::CallbackListener { port, source })?;
        debug!("OAuth callback listener bound on {}", addr);
        Ok(Self { listener, addr })
    }

    /// Redirect URI registered with the provider for this listener
    pub fn redirect_url(&self) -> String {
        format!("http://localhost:{}/", self.addr.port())
    }

    /// Port actually bound
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Serve until the first callback arrives or `timeout` elapses
    pub async fn wait(self, timeout: Duration) -> Result<AuthorizationResponse> {
        let (tx, rx) = oneshot::channel();
        let state = CallbackState {
            sender: Arc::new(Mutex::new(Some(tx))),
        };

        let app = Router::new()
            .route("/", get(handle_callback))
            .with_state(state);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            axum::serve(self.listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        let outcome = match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(AuthError::MissingCode),
            Err(_) => Err(AuthError::ConsentTimedOut(timeout)),
        };

        let _ = shutdown_tx.send(());
        match tokio::time::timeout(SHUTDOWN_GRACE, server).await {
            Ok(Ok(Err(e))) => warn!("OAuth callback server error: {}", e),
            Ok(Err(e)) => warn!("OAuth callback server task failed: {}", e),
            Err(_) => warn!("OAuth callback server did not shut down in time"),
            Ok(Ok(Ok(()))) => {}
        }

        outcome
    }
}

async fn handle_callback(
    State(callback): State<CallbackState>,
    Query(query): Query<CallbackQuery>,
) -> Html<&'static str> {
    let outcome = match query {
        CallbackQuery {
            error: Some(error), ..
        } => Err(AuthError::ConsentDenied(error)),
        CallbackQuery {
            code: Some(code),
            state: Some(state),
            ..
        } => Ok(AuthorizationResponse { code, state }),
        _ => Err(AuthError::MissingCode),
    };

    let page = if outcome.is_ok() {
        SUCCESS_PAGE
    } else {
        FAILURE_PAGE
    };

    let sender = callback.sender.lock().ok().and_then(|mut slot| slot.take());
    match sender {
        Some(sender) => {
            let _ = sender.send(outcome);
        }
        None => debug!("Ignoring repeated OAuth callback"),
    }

    Html(page)
}
