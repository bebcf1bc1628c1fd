//! Scripted stub browser for tests.
//!
//! Implements the production browser traits over a fixed script: which
//! selectors are visible, which are disabled, whether navigation or capture
//! fails, and how long each operation pretends to take. A shared [`StubLog`]
//! records launch and close counts so tests can assert the session was
//! released exactly once.

use async_trait::async_trait;
use image::{ImageBuffer, RgbImage};
use std::collections::HashSet;
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{BrowserError, BrowserLauncher, BrowserResult, BrowserSession, ElementProbe, SessionConfig};

/// Script describing how the stub page behaves
#[derive(Debug, Clone, Default)]
pub struct StubScript {
    /// Fail the launch itself with this message
    pub fail_launch: Option<String>,
    /// Fail navigation with this message
    pub fail_navigation: Option<String>,
    /// Selectors that never become visible
    pub unavailable: HashSet<String>,
    /// Selectors that are visible but not enabled
    pub disabled: HashSet<String>,
    /// Fail element capture with this message
    pub fail_screenshot: Option<String>,
    /// Fail session close with this message (close is still counted)
    pub fail_close: Option<String>,
    /// Simulated navigation latency
    pub nav_delay: Duration,
    /// Simulated element resolution latency
    pub locate_delay: Duration,
}

impl StubScript {
    /// A script where every operation succeeds
    pub fn all_green() -> Self {
        Self::default()
    }

    /// Mark a selector as never becoming visible
    pub fn unavailable(mut self, selector: impl Into<String>) -> Self {
        self.unavailable.insert(selector.into());
        self
    }

    /// Mark a selector as visible but not enabled
    pub fn disabled(mut self, selector: impl Into<String>) -> Self {
        self.disabled.insert(selector.into());
        self
    }

    /// Fail navigation with the given message
    pub fn failing_navigation(mut self, message: impl Into<String>) -> Self {
        self.fail_navigation = Some(message.into());
        self
    }

    /// Fail element capture with the given message
    pub fn failing_screenshot(mut self, message: impl Into<String>) -> Self {
        self.fail_screenshot = Some(message.into());
        self
    }

    /// Simulate latencies for navigation and element resolution
    pub fn with_delays(mut self, nav: Duration, locate: Duration) -> Self {
        self.nav_delay = nav;
        self.locate_delay = locate;
        self
    }
}

/// Counters shared between a launcher and the tests observing it
#[derive(Debug, Default)]
pub struct StubLog {
    launches: AtomicUsize,
    closes: AtomicUsize,
}

impl StubLog {
    /// Number of sessions launched
    pub fn launch_count(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    /// Number of sessions closed
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

/// Launcher producing scripted stub sessions
#[derive(Debug, Default)]
pub struct StubLauncher {
    script: StubScript,
    log: Arc<StubLog>,
}

impl StubLauncher {
    /// Create a launcher for the given script
    pub fn new(script: StubScript) -> Self {
        Self {
            script,
            log: Arc::new(StubLog::default()),
        }
    }

    /// Shared counters for launch/close assertions
    pub fn log(&self) -> Arc<StubLog> {
        Arc::clone(&self.log)
    }
}

#[async_trait]
impl BrowserLauncher for StubLauncher {
    async fn launch(&self, _config: &SessionConfig) -> BrowserResult<Box<dyn BrowserSession>> {
        if let Some(msg) = &self.script.fail_launch {
            return Err(BrowserError::Launch(msg.clone()));
        }
        self.log.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StubSession {
            script: self.script.clone(),
            log: Arc::clone(&self.log),
        }))
    }
}

/// A scripted browser session
pub struct StubSession {
    script: StubScript,
    log: Arc<StubLog>,
}

#[async_trait]
impl BrowserSession for StubSession {
    async fn goto(&self, url: &str, timeout: Duration) -> BrowserResult<()> {
        tokio::time::sleep(self.script.nav_delay).await;
        if let Some(msg) = &self.script.fail_navigation {
            return Err(BrowserError::Navigation(format!("{}: {}", msg, url)));
        }
        if self.script.nav_delay > timeout {
            return Err(BrowserError::Timeout {
                what: format!("navigation to {}", url),
                waited: timeout,
            });
        }
        Ok(())
    }

    async fn wait_for_visible(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> BrowserResult<Box<dyn ElementProbe>> {
        tokio::time::sleep(self.script.locate_delay).await;
        if self.script.unavailable.contains(selector) {
            return Err(BrowserError::Timeout {
                what: format!("element '{}' to become visible", selector),
                waited: timeout,
            });
        }
        Ok(Box::new(StubElement {
            selector: selector.to_string(),
            fail_screenshot: self.script.fail_screenshot.clone(),
        }))
    }

    async fn is_enabled(&self, selector: &str) -> BrowserResult<bool> {
        if self.script.unavailable.contains(selector) {
            return Err(BrowserError::ElementNotFound(selector.to_string()));
        }
        Ok(!self.script.disabled.contains(selector))
    }

    async fn close(&mut self) -> BrowserResult<()> {
        self.log.closes.fetch_add(1, Ordering::SeqCst);
        if let Some(msg) = &self.script.fail_close {
            return Err(BrowserError::Protocol(msg.clone()));
        }
        Ok(())
    }

    fn source_type(&self) -> &str {
        "stub"
    }
}

/// A scripted element probe
pub struct StubElement {
    selector: String,
    fail_screenshot: Option<String>,
}

#[async_trait]
impl ElementProbe for StubElement {
    async fn screenshot(&self) -> BrowserResult<Vec<u8>> {
        if let Some(msg) = &self.fail_screenshot {
            return Err(BrowserError::Protocol(msg.clone()));
        }
        fixture_png(64, 32)
    }

    fn selector(&self) -> &str {
        &self.selector
    }
}

/// Encode a small solid-gray PNG to stand in for a real capture
fn fixture_png(width: u32, height: u32) -> BrowserResult<Vec<u8>> {
    let img: RgbImage = ImageBuffer::from_pixel(width, height, image::Rgb([128, 128, 128]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| BrowserError::Protocol(format!("fixture PNG encode failed: {}", e)))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_all_green_session() {
        let launcher = StubLauncher::new(StubScript::all_green());
        let log = launcher.log();

        let mut session = launcher.launch(&SessionConfig::default()).await.unwrap();
        session
            .goto("https://example.com", Duration::from_secs(1))
            .await
            .unwrap();

        let element = session
            .wait_for_visible("#widget", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(element.selector(), "#widget");

        let png = element.screenshot().await.unwrap();
        assert_eq!(&png[0..4], &[0x89, 0x50, 0x4E, 0x47]);

        assert!(session.is_enabled("#widget button").await.unwrap());
        session.close().await.unwrap();

        assert_eq!(log.launch_count(), 1);
        assert_eq!(log.close_count(), 1);
    }

    #[tokio::test]
    async fn test_scripted_failures() {
        let script = StubScript::all_green()
            .unavailable("#widget .missing")
            .disabled("#widget button.search-submit");
        let launcher = StubLauncher::new(script);
        let session = launcher.launch(&SessionConfig::default()).await.unwrap();

        let err = session
            .wait_for_visible("#widget .missing", Duration::from_millis(50))
            .await
            .err()
            .expect("unavailable selector should time out");
        assert!(matches!(err, BrowserError::Timeout { .. }));

        assert!(!session
            .is_enabled("#widget button.search-submit")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_failed_launch_is_not_counted() {
        let mut script = StubScript::all_green();
        script.fail_launch = Some("no executable".to_string());
        let launcher = StubLauncher::new(script);
        let log = launcher.log();

        assert!(launcher.launch(&SessionConfig::default()).await.is_err());
        assert_eq!(log.launch_count(), 0);
        assert_eq!(log.close_count(), 0);
    }
}
