//! Headless Chrome session over the DevTools protocol.
//!
//! Launches one Chrome process with a flag set tuned for constrained,
//! sandboxed execution (no GPU, no /dev/shm, no OS sandbox, single
//! process), opens one page with the configured viewport and user-agent,
//! and exposes the page operations the workflow needs.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

use super::{BrowserError, BrowserLauncher, BrowserResult, BrowserSession, ElementProbe, SessionConfig};

/// Flag set for constrained, sandboxed, single-process execution
const LAUNCH_FLAGS: [&str; 6] = [
    "--disable-gpu",
    "--disable-dev-shm-usage",
    "--no-sandbox",
    "--single-process",
    "--no-zygote",
    "--ignore-certificate-errors",
];

/// Interval between element polls
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Launcher for headless Chrome sessions
#[derive(Debug, Default)]
pub struct ChromeLauncher;

impl ChromeLauncher {
    /// Create a new launcher
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self, config: &SessionConfig) -> BrowserResult<Box<dyn BrowserSession>> {
        let mut builder = BrowserConfig::builder()
            .window_size(config.viewport_width, config.viewport_height)
            .viewport(Viewport {
                width: config.viewport_width,
                height: config.viewport_height,
                device_scale_factor: None,
                emulating_mobile: false,
                is_landscape: false,
                has_touch: false,
            });

        for flag in LAUNCH_FLAGS {
            builder = builder.arg(flag);
        }
        if let Some(path) = &config.executable {
            builder = builder.chrome_executable(path);
        }
        if let Some(dir) = &config.user_data_dir {
            builder = builder.user_data_dir(dir);
        }

        let browser_config = builder
            .build()
            .map_err(BrowserError::Launch)?;

        log::info!("launching headless Chrome");
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        // The handler task pumps CDP messages for the whole session; it ends
        // when the browser's websocket closes.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    log::debug!("CDP handler loop ended");
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        page.set_user_agent(config.user_agent.clone())
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        Ok(Box::new(ChromeSession {
            browser,
            page,
            handler_task,
        }))
    }
}

/// One headless Chrome process and its single page
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl ChromeSession {
    async fn eval_bool(&self, expression: &str) -> BrowserResult<bool> {
        self.page
            .evaluate(expression)
            .await
            .map_err(|e| BrowserError::Protocol(e.to_string()))?
            .into_value::<bool>()
            .map_err(|e| BrowserError::Protocol(e.to_string()))
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn goto(&self, url: &str, timeout: Duration) -> BrowserResult<()> {
        // `goto` resolves once the document is parsed, not when every
        // subresource has finished loading.
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Err(_) => Err(BrowserError::Timeout {
                what: format!("navigation to {}", url),
                waited: timeout,
            }),
            Ok(Err(e)) => Err(BrowserError::Navigation(e.to_string())),
            Ok(Ok(_)) => Ok(()),
        }
    }

    async fn wait_for_visible(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> BrowserResult<Box<dyn ElementProbe>> {
        let deadline = Instant::now() + timeout;

        loop {
            if let Ok(element) = self.page.find_element(selector).await {
                if self.eval_bool(&visibility_expr(selector)?).await? {
                    return Ok(Box::new(ChromeElement {
                        selector: selector.to_string(),
                        element,
                    }));
                }
            }

            if Instant::now() >= deadline {
                return Err(BrowserError::Timeout {
                    what: format!("element '{}' to become visible", selector),
                    waited: timeout,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn is_enabled(&self, selector: &str) -> BrowserResult<bool> {
        if self.page.find_element(selector).await.is_err() {
            return Err(BrowserError::ElementNotFound(selector.to_string()));
        }
        self.eval_bool(&enabled_expr(selector)?).await
    }

    async fn close(&mut self) -> BrowserResult<()> {
        self.browser
            .close()
            .await
            .map_err(|e| BrowserError::Protocol(e.to_string()))?;
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        Ok(())
    }

    fn source_type(&self) -> &str {
        "chrome"
    }
}

/// A resolved element on the Chrome page
pub struct ChromeElement {
    selector: String,
    element: Element,
}

#[async_trait]
impl ElementProbe for ChromeElement {
    async fn screenshot(&self) -> BrowserResult<Vec<u8>> {
        self.element
            .screenshot(CaptureScreenshotFormat::Png)
            .await
            .map_err(|e| BrowserError::Protocol(e.to_string()))
    }

    fn selector(&self) -> &str {
        &self.selector
    }
}

/// JS expression: element exists, is not display:none/hidden, and has a
/// non-empty bounding box
fn visibility_expr(selector: &str) -> BrowserResult<String> {
    let quoted = quote_selector(selector)?;
    Ok(format!(
        "(function() {{ \
            const el = document.querySelector({quoted}); \
            if (!el) return false; \
            const style = window.getComputedStyle(el); \
            if (style.display === 'none' || style.visibility === 'hidden') return false; \
            const rect = el.getBoundingClientRect(); \
            return rect.width > 0 && rect.height > 0; \
        }})()"
    ))
}

/// JS expression: element exists and is not disabled
fn enabled_expr(selector: &str) -> BrowserResult<String> {
    let quoted = quote_selector(selector)?;
    Ok(format!(
        "(function() {{ \
            const el = document.querySelector({quoted}); \
            return !!el && !el.disabled; \
        }})()"
    ))
}

/// JSON-quote a selector so it embeds safely in an evaluated expression
fn quote_selector(selector: &str) -> BrowserResult<String> {
    serde_json::to_string(selector).map_err(|e| BrowserError::Protocol(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_expr_quotes_selector() {
        let expr = visibility_expr("#widget input[name=\"origin\"]").unwrap();
        assert!(expr.contains("querySelector(\"#widget input[name=\\\"origin\\\"]\")"));
        assert!(expr.contains("getBoundingClientRect"));
    }

    #[test]
    fn test_enabled_expr() {
        let expr = enabled_expr("button.search-submit").unwrap();
        assert!(expr.contains("querySelector(\"button.search-submit\")"));
        assert!(expr.contains("!el.disabled"));
    }

    #[test]
    fn test_launch_flags_cover_constrained_environment() {
        assert!(LAUNCH_FLAGS.contains(&"--no-sandbox"));
        assert!(LAUNCH_FLAGS.contains(&"--single-process"));
        assert!(LAUNCH_FLAGS.contains(&"--no-zygote"));
        assert!(LAUNCH_FLAGS.contains(&"--disable-dev-shm-usage"));
    }
}
