//! Presenting the consent URL to the operator

use tracing::{info, warn};

/// Shows the operator where to grant consent
pub trait ConsentPrompt: Send + Sync {
    /// Called once per interactive flow, after the callback listener is up
    fn present(&self, url: &str);
}

/// Logs the consent URL and, when enabled, opens it in the default browser
#[derive(Debug, Clone, Copy)]
pub struct BrowserPrompt {
    open_browser: bool,
}

impl BrowserPrompt {
    pub fn new(open_browser: bool) -> Self {
        Self { open_browser }
    }
}

impl Default for BrowserPrompt {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConsentPrompt for BrowserPrompt {
    fn present(&self, url: &str) {
        info!("Please visit this URL to authorize profile-relay: {}", url);
        if self.open_browser && !try_open_browser(url) {
            warn!("Could not open a browser; open the URL above manually");
        }
    }
}

/// Best-effort browser launcher; does not wait for the browser to exit.
pub fn try_open_browser(url: &str) -> bool {
    #[cfg(target_os = "macos")]
    {
        return std::process::Command::new("open").arg(url).spawn().is_ok();
    }
    #[cfg(target_os = "windows")]
    {
        return std::process::Command::new("cmd")
            .args(["/C", "start", "", url])
            .spawn()
            .is_ok();
    }
    #[cfg(all(unix, not(target_os = "macos")))]
    {
        return std::process::Command::new("xdg-open").arg(url).spawn().is_ok();
    }
    #[allow(unreachable_code)]
    false
}
