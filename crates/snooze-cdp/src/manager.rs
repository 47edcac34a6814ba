//! Browser manager: finds or launches Chrome and attaches to the mail tab.
//!
//! Chrome is launched with a persistent profile so the mail session stays
//! logged in between runs.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::process::{Child, Command};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cdp::{CdpClient, CdpError};
use crate::document::CdpDocument;

/// Browser manager errors.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("No mail tab open at {0}")]
    MailTabNotFound(String),

    #[error("Action failed: {0}")]
    ActionFailed(String),

    #[error("Browser not connected")]
    NotConnected,

    #[error("Chrome not found. Please install Google Chrome.")]
    ChromeNotFound,

    #[error("Failed to launch Chrome: {0}")]
    LaunchFailed(String),
}

impl From<CdpError> for BrowserError {
    fn from(e: CdpError) -> Self {
        match e {
            CdpError::ConnectionFailed(msg) => BrowserError::ConnectionFailed(msg),
            CdpError::ChromeNotAvailable(msg) => BrowserError::ConnectionFailed(msg),
            CdpError::JavaScript(msg) => BrowserError::ActionFailed(format!("JS error: {}", msg)),
            CdpError::Timeout(msg) => BrowserError::ActionFailed(format!("Timeout: {}", msg)),
            CdpError::SessionClosed => BrowserError::NotConnected,
            _ => BrowserError::ActionFailed(e.to_string()),
        }
    }
}

/// Browser configuration.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Chrome debugging port.
    pub debug_port: u16,
    /// Profile directory for persistent login state.
    /// Default: ~/.snooze-nl/browser-profile
    pub profile_dir: Option<PathBuf>,
    /// Whether to launch Chrome headless.
    pub headless: bool,
    /// URL prefix of the mail tab.
    pub mail_url_prefix: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            debug_port: 9222,
            profile_dir: None,
            headless: false,
            mail_url_prefix: "https://mail.google.com/".to_string(),
        }
    }
}

impl BrowserConfig {
    /// Get the profile directory, creating default if not specified.
    pub fn get_profile_dir(&self) -> PathBuf {
        self.profile_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".snooze-nl")
                .join("browser-profile")
        })
    }

    /// Get the CDP endpoint URL.
    pub fn endpoint(&self) -> String {
        format!("http://localhost:{}", self.debug_port)
    }

    /// Whether `url` belongs to the mail client.
    pub fn is_mail_url(&self, url: &str) -> bool {
        url.starts_with(&self.mail_url_prefix)
    }
}

/// Connects to Chrome and hands out mail-tab documents.
pub struct BrowserManager {
    config: BrowserConfig,
    client: RwLock<Option<Arc<CdpClient>>>,
    /// Chrome process handle (if we launched it).
    chrome_process: RwLock<Option<Child>>,
}

impl BrowserManager {
    /// Create a new browser manager.
    pub fn new(config: BrowserConfig) -> Self {
        Self {
            config,
            client: RwLock::new(None),
            chrome_process: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    /// Find Chrome executable path.
    pub fn find_chrome() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        let paths: &[&str] = &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
        ];

        #[cfg(target_os = "linux")]
        let paths: &[&str] = &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
        ];

        #[cfg(target_os = "windows")]
        let paths: &[&str] = &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ];

        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        let paths: &[&str] = &[];

        paths.iter().map(|p| PathBuf::from(*p)).find(|p| p.exists())
    }

    /// Check if Chrome is already running on the debug port.
    async fn is_chrome_running(&self) -> bool {
        reqwest::get(&format!("{}/json/version", self.config.endpoint()))
            .await
            .is_ok()
    }

    /// Launch Chrome with remote debugging enabled.
    async fn launch_chrome(&self) -> Result<Child, BrowserError> {
        let chrome_path = Self::find_chrome().ok_or(BrowserError::ChromeNotFound)?;
        let profile_dir = self.config.get_profile_dir();

        if let Err(e) = std::fs::create_dir_all(&profile_dir) {
            warn!("Failed to create profile directory: {}", e);
        }

        info!("Launching Chrome with profile at: {}", profile_dir.display());

        let mut cmd = Command::new(&chrome_path);
        cmd.arg(format!("--remote-debugging-port={}", self.config.debug_port))
            .arg(format!("--user-data-dir={}", profile_dir.display()))
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-sync")
            .arg("--disable-translate")
            .arg(&self.config.mail_url_prefix)
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        if self.config.headless {
            cmd.arg("--headless=new");
        }

        let child = cmd
            .spawn()
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        info!("Chrome launched with PID: {:?}", child.id());
        Ok(child)
    }

    /// Connect to the browser, launching it if necessary.
    pub async fn connect(&self) -> Result<(), BrowserError> {
        if self.client.read().await.is_some() {
            return Ok(());
        }

        if !self.is_chrome_running().await {
            info!("Chrome not running on port {}, launching...", self.config.debug_port);

            let child = self.launch_chrome().await?;
            *self.chrome_process.write().await = Some(child);

            let mut attempts = 0;
            let max_attempts = 30;
            while attempts < max_attempts {
                tokio::time::sleep(Duration::from_millis(200)).await;
                if self.is_chrome_running().await {
                    break;
                }
                attempts += 1;
            }

            if attempts >= max_attempts {
                return Err(BrowserError::LaunchFailed(
                    "Chrome failed to start within timeout".to_string(),
                ));
            }
        } else {
            info!("Chrome already running on port {}", self.config.debug_port);
        }

        let client = CdpClient::connect(&self.config.endpoint()).await?;
        *self.client.write().await = Some(Arc::new(client));

        info!("Connected to Chrome at {}", self.config.endpoint());
        Ok(())
    }

    async fn client(&self) -> Result<Arc<CdpClient>, BrowserError> {
        self.client
            .read()
            .await
            .clone()
            .ok_or(BrowserError::NotConnected)
    }

    /// Attach to the first open mail tab, or open one when `open_if_missing`.
    pub async fn mail_document(&self, open_if_missing: bool) -> Result<CdpDocument, BrowserError> {
        self.connect().await?;
        let client = self.client().await?;

        let pages = client.list_pages().await?;
        let tab = pages
            .iter()
            .find(|p| p.page_type == "page" && self.config.is_mail_url(&p.url));

        let session = match tab {
            Some(page) => {
                debug!("Attaching to mail tab {} ({})", page.id, page.title);
                client.attach_page(&page.id).await?
            }
            None if open_if_missing => {
                info!("No mail tab open, opening {}", self.config.mail_url_prefix);
                client.new_page(&self.config.mail_url_prefix).await?
            }
            None => return Err(BrowserError::MailTabNotFound(self.config.mail_url_prefix.clone())),
        };

        Ok(CdpDocument::attach(Arc::new(session)).await?)
    }

    /// Close the browser connection.
    pub async fn close(&self) {
        let _ = self.client.write().await.take();
        info!("Browser connection closed");
    }

    /// Shutdown Chrome if we launched it.
    pub async fn shutdown_chrome(&self) {
        self.close().await;
        if let Some(mut child) = self.chrome_process.write().await.take() {
            info!("Shutting down Chrome...");
            let _ = child.kill().await;
        }
    }
}
