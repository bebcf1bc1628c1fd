//! Configuration management with environment variable support.
//!
//! This module provides centralized configuration for Web Vision, supporting:
//! - Environment variables for all configurable values
//! - Sensible defaults for local and sandboxed execution
//! - Overrides before a run starts (the config is immutable afterwards)
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `WEB_VISION_TARGET_URL` | Page to navigate to | `https://booking.example.com/flights` |
//! | `WEB_VISION_COMPONENT_SELECTOR` | CSS selector of the component under test | `#flight-search-widget` |
//! | `WEB_VISION_NAV_TIMEOUT_MS` | Navigation timeout in milliseconds | `30000` |
//! | `WEB_VISION_SELECTOR_TIMEOUT_MS` | Element wait timeout in milliseconds | `10000` |
//! | `WEB_VISION_VIEWPORT` | Viewport size as `WxH` | `1366x768` |
//! | `WEB_VISION_USER_AGENT` | User-agent string for the browsing context | desktop Chrome UA |
//! | `WEB_VISION_CHROME_PATH` | Chrome/Chromium executable path | autodetected |
//! | `WEB_VISION_SCRATCH_DIR` | Base directory for browser scratch space | `/tmp/web-vision` |
//! | `WEB_VISION_STORAGE_REGION` | Object storage region | `us-east-1` |
//! | `WEB_VISION_STORAGE_BUCKET` | Object storage bucket | `web-vision-artifacts` |
//! | `WEB_VISION_ARTIFACT_PREFIX` | Key prefix for uploaded captures | `component-captures` |
//!
//! # Example
//!
//! ```bash
//! # Point the run at a staging page
//! export WEB_VISION_TARGET_URL="https://staging.booking.example.com/flights"
//! export WEB_VISION_STORAGE_BUCKET="web-vision-staging"
//! ```

use std::env;
use std::sync::OnceLock;

// ============================================================================
// Default Values
// ============================================================================

/// Default page to navigate to
pub const DEFAULT_TARGET_URL: &str = "https://booking.example.com/flights";

/// Default CSS selector of the component under test
pub const DEFAULT_COMPONENT_SELECTOR: &str = "#flight-search-widget";

/// Default navigation timeout (milliseconds)
pub const DEFAULT_NAV_TIMEOUT_MS: u64 = 30_000;

/// Default element wait timeout (milliseconds)
pub const DEFAULT_SELECTOR_TIMEOUT_MS: u64 = 10_000;

/// Default viewport preset
pub const DEFAULT_VIEWPORT: &str = "1366x768";

/// Default viewport width (pixels)
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1366;

/// Default viewport height (pixels)
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 768;

/// Default user-agent string for the browsing context
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Default base directory for browser scratch space
pub const DEFAULT_SCRATCH_DIR: &str = "/tmp/web-vision";

/// Default object storage region
pub const DEFAULT_STORAGE_REGION: &str = "us-east-1";

/// Default object storage bucket
pub const DEFAULT_STORAGE_BUCKET: &str = "web-vision-artifacts";

/// Default key prefix for uploaded captures
pub const DEFAULT_ARTIFACT_PREFIX: &str = "component-captures";

// ============================================================================
// Environment Variable Names
// ============================================================================

/// Environment variable for the target URL
pub const ENV_TARGET_URL: &str = "WEB_VISION_TARGET_URL";

/// Environment variable for the component selector
pub const ENV_COMPONENT_SELECTOR: &str = "WEB_VISION_COMPONENT_SELECTOR";

/// Environment variable for the navigation timeout
pub const ENV_NAV_TIMEOUT_MS: &str = "WEB_VISION_NAV_TIMEOUT_MS";

/// Environment variable for the element wait timeout
pub const ENV_SELECTOR_TIMEOUT_MS: &str = "WEB_VISION_SELECTOR_TIMEOUT_MS";

/// Environment variable for the viewport size
pub const ENV_VIEWPORT: &str = "WEB_VISION_VIEWPORT";

/// Environment variable for the user-agent string
pub const ENV_USER_AGENT: &str = "WEB_VISION_USER_AGENT";

/// Environment variable for the Chrome executable path
pub const ENV_CHROME_PATH: &str = "WEB_VISION_CHROME_PATH";

/// Environment variable for the scratch base directory
pub const ENV_SCRATCH_DIR: &str = "WEB_VISION_SCRATCH_DIR";

/// Environment variable for the storage region
pub const ENV_STORAGE_REGION: &str = "WEB_VISION_STORAGE_REGION";

/// Environment variable for the storage bucket
pub const ENV_STORAGE_BUCKET: &str = "WEB_VISION_STORAGE_BUCKET";

/// Environment variable for the artifact key prefix
pub const ENV_ARTIFACT_PREFIX: &str = "WEB_VISION_ARTIFACT_PREFIX";

// ============================================================================
// Configuration Getters (with caching)
// ============================================================================

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration (initialized from environment on first access)
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Centralized configuration for Web Vision
#[derive(Debug, Clone)]
pub struct Config {
    /// Target page and component settings
    pub target: TargetSettings,
    /// Browser session settings
    pub browser: BrowserSettings,
    /// Object storage settings
    pub storage: StorageSettings,
}

/// Target page and component settings
#[derive(Debug, Clone)]
pub struct TargetSettings {
    /// Page to navigate to
    pub url: String,
    /// CSS selector of the component under test
    pub component_selector: String,
    /// Navigation timeout (milliseconds)
    pub nav_timeout_ms: u64,
    /// Element wait timeout (milliseconds)
    pub selector_timeout_ms: u64,
}

/// Browser session settings
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    /// Viewport width (pixels)
    pub viewport_width: u32,
    /// Viewport height (pixels)
    pub viewport_height: u32,
    /// User-agent string applied to the browsing context
    pub user_agent: String,
    /// Chrome executable path (None = let the launcher autodetect)
    pub chrome_path: Option<String>,
    /// Base directory for browser scratch space
    pub scratch_dir: String,
}

/// Object storage settings
#[derive(Debug, Clone)]
pub struct StorageSettings {
    /// Storage region
    pub region: String,
    /// Storage bucket
    pub bucket: String,
    /// Key prefix for uploaded captures
    pub prefix: String,
}

impl Config {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            target: TargetSettings::from_env(),
            browser: BrowserSettings::from_env(),
            storage: StorageSettings::from_env(),
        }
    }

    /// Create configuration with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self {
            target: TargetSettings::defaults(),
            browser: BrowserSettings::defaults(),
            storage: StorageSettings::defaults(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

impl TargetSettings {
    /// Create target settings from environment variables
    pub fn from_env() -> Self {
        Self {
            url: env::var(ENV_TARGET_URL).unwrap_or_else(|_| DEFAULT_TARGET_URL.to_string()),
            component_selector: env::var(ENV_COMPONENT_SELECTOR)
                .unwrap_or_else(|_| DEFAULT_COMPONENT_SELECTOR.to_string()),
            nav_timeout_ms: env::var(ENV_NAV_TIMEOUT_MS)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_NAV_TIMEOUT_MS),
            selector_timeout_ms: env::var(ENV_SELECTOR_TIMEOUT_MS)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SELECTOR_TIMEOUT_MS),
        }
    }

    /// Create target settings with defaults
    pub fn defaults() -> Self {
        Self {
            url: DEFAULT_TARGET_URL.to_string(),
            component_selector: DEFAULT_COMPONENT_SELECTOR.to_string(),
            nav_timeout_ms: DEFAULT_NAV_TIMEOUT_MS,
            selector_timeout_ms: DEFAULT_SELECTOR_TIMEOUT_MS,
        }
    }
}

impl BrowserSettings {
    /// Create browser settings from environment variables
    pub fn from_env() -> Self {
        let viewport = env::var(ENV_VIEWPORT).unwrap_or_else(|_| DEFAULT_VIEWPORT.to_string());
        let (width, height) =
            parse_viewport(&viewport).unwrap_or((DEFAULT_VIEWPORT_WIDTH, DEFAULT_VIEWPORT_HEIGHT));

        Self {
            viewport_width: width,
            viewport_height: height,
            user_agent: env::var(ENV_USER_AGENT).unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            chrome_path: env::var(ENV_CHROME_PATH).ok(),
            scratch_dir: env::var(ENV_SCRATCH_DIR)
                .unwrap_or_else(|_| DEFAULT_SCRATCH_DIR.to_string()),
        }
    }

    /// Create browser settings with defaults
    pub fn defaults() -> Self {
        Self {
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            chrome_path: None,
            scratch_dir: DEFAULT_SCRATCH_DIR.to_string(),
        }
    }
}

impl StorageSettings {
    /// Create storage settings from environment variables
    pub fn from_env() -> Self {
        Self {
            region: env::var(ENV_STORAGE_REGION)
                .unwrap_or_else(|_| DEFAULT_STORAGE_REGION.to_string()),
            bucket: env::var(ENV_STORAGE_BUCKET)
                .unwrap_or_else(|_| DEFAULT_STORAGE_BUCKET.to_string()),
            prefix: env::var(ENV_ARTIFACT_PREFIX)
                .unwrap_or_else(|_| DEFAULT_ARTIFACT_PREFIX.to_string()),
        }
    }

    /// Create storage settings with defaults
    pub fn defaults() -> Self {
        Self {
            region: DEFAULT_STORAGE_REGION.to_string(),
            bucket: DEFAULT_STORAGE_BUCKET.to_string(),
            prefix: DEFAULT_ARTIFACT_PREFIX.to_string(),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Parse a viewport string into (width, height)
/// Supports `WxH` (e.g., "1366x768")
pub fn parse_viewport(viewport: &str) -> Option<(u32, u32)> {
    let parts: Vec<&str> = viewport.split('x').collect();
    if parts.len() == 2 {
        let w = parts[0].parse().ok()?;
        let h = parts[1].parse().ok()?;
        Some((w, h))
    } else {
        None
    }
}

/// Get the target URL (convenience function)
pub fn target_url() -> String {
    get().target.url.clone()
}

/// Get the component selector (convenience function)
pub fn component_selector() -> String {
    get().target.component_selector.clone()
}

/// Get the storage bucket (convenience function)
pub fn storage_bucket() -> String {
    get().storage.bucket.clone()
}
