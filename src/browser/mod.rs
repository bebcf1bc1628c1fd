//! Browser capability abstraction.
//!
//! The workflow consumes the browser engine as an opaque capability set:
//! a [`BrowserLauncher`] produces one exclusively-owned [`BrowserSession`]
//! per run, and the session exposes the handful of page operations the
//! pipeline needs. Implementations:
//! - [`chrome::ChromeLauncher`] drives headless Chrome over CDP
//! - [`stub::StubLauncher`] replays a scripted page for tests

pub mod chrome;
pub mod stub;

pub use chrome::ChromeLauncher;
pub use stub::{StubLauncher, StubLog, StubScript};

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

/// Result type for browser operations
pub type BrowserResult<T> = Result<T, BrowserError>;

/// Errors that can occur while driving the browser
#[derive(Debug)]
pub enum BrowserError {
    /// Browser process could not be started
    Launch(String),

    /// Navigation failed before the timeout
    Navigation(String),

    /// A bounded wait ran out
    Timeout {
        /// What was being waited for
        what: String,
        /// How long the wait lasted
        waited: Duration,
    },

    /// No element matched the selector
    ElementNotFound(String),

    /// DevTools protocol or evaluation failure
    Protocol(String),
}

impl std::fmt::Display for BrowserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BrowserError::Launch(msg) => write!(f, "browser launch failed: {}", msg),
            BrowserError::Navigation(msg) => write!(f, "navigation failed: {}", msg),
            BrowserError::Timeout { what, waited } => {
                write!(f, "timed out after {}ms waiting for {}", waited.as_millis(), what)
            }
            BrowserError::ElementNotFound(selector) => {
                write!(f, "no element matches selector '{}'", selector)
            }
            BrowserError::Protocol(msg) => write!(f, "browser protocol error: {}", msg),
        }
    }
}

impl std::error::Error for BrowserError {}

/// Configuration for one browser session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Viewport width (pixels)
    pub viewport_width: u32,
    /// Viewport height (pixels)
    pub viewport_height: u32,
    /// User-agent string applied to the page
    pub user_agent: String,
    /// Chrome executable path (None = autodetect)
    pub executable: Option<PathBuf>,
    /// Browser user-data directory
    pub user_data_dir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let defaults = crate::config::BrowserSettings::defaults();
        Self {
            viewport_width: defaults.viewport_width,
            viewport_height: defaults.viewport_height,
            user_agent: defaults.user_agent,
            executable: None,
            user_data_dir: None,
        }
    }
}

impl SessionConfig {
    /// Build a session config from the browser settings
    pub fn from_settings(settings: &crate::config::BrowserSettings) -> Self {
        Self {
            viewport_width: settings.viewport_width,
            viewport_height: settings.viewport_height,
            user_agent: settings.user_agent.clone(),
            executable: settings.chrome_path.as_ref().map(PathBuf::from),
            user_data_dir: Some(crate::scratch::user_data_dir(std::path::Path::new(
                &settings.scratch_dir,
            ))),
        }
    }

    /// Set the viewport dimensions
    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set the user-agent string
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the Chrome executable path
    pub fn executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }
}

/// A located element, reusable for capture after resolution
#[async_trait]
pub trait ElementProbe: Send + Sync {
    /// Render a PNG scoped to this element's bounding box
    async fn screenshot(&self) -> BrowserResult<Vec<u8>>;

    /// The selector this element was resolved from
    fn selector(&self) -> &str;
}

/// One browser process with one page, exclusively owned by a run.
///
/// Acquired once per run through a [`BrowserLauncher`] and closed exactly
/// once on every exit path; close failures never override the run outcome.
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigate to `url`, waiting for document parse, bounded by `timeout`
    async fn goto(&self, url: &str, timeout: Duration) -> BrowserResult<()>;

    /// Poll until the element matching `selector` is present and visible,
    /// bounded by `timeout`
    async fn wait_for_visible(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> BrowserResult<Box<dyn ElementProbe>>;

    /// Whether the element matching `selector` is enabled (interactable)
    async fn is_enabled(&self, selector: &str) -> BrowserResult<bool>;

    /// Shut the browser down
    async fn close(&mut self) -> BrowserResult<()>;

    /// Backend identifier (e.g., "chrome", "stub")
    fn source_type(&self) -> &str;
}

/// Factory for browser sessions
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Launch one browser process and open its page
    async fn launch(&self, config: &SessionConfig) -> BrowserResult<Box<dyn BrowserSession>>;
}
