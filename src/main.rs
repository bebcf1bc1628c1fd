use clap::Parser;
use std::error::Error;
use std::io::Read;
use std::path::PathBuf;

use web_vision::browser::ChromeLauncher;
use web_vision::config::Config;
use web_vision::store::HttpObjectStore;

/// Web Vision - single-shot web component capture and validation
#[derive(Parser, Debug)]
#[command(
    name = "web-vision",
    about = "Capture a page component with headless Chrome, upload it, and validate its sub-elements",
    after_help = "ENVIRONMENT VARIABLES:\n\
        WEB_VISION_TARGET_URL           Page to navigate to\n\
        WEB_VISION_COMPONENT_SELECTOR   CSS selector of the component under test\n\
        WEB_VISION_NAV_TIMEOUT_MS       Navigation timeout (ms)\n\
        WEB_VISION_SELECTOR_TIMEOUT_MS  Element wait timeout (ms)\n\
        WEB_VISION_VIEWPORT             Viewport size as WxH\n\
        WEB_VISION_USER_AGENT           User-agent string\n\
        WEB_VISION_CHROME_PATH          Chrome/Chromium executable path\n\
        WEB_VISION_SCRATCH_DIR          Base directory for browser scratch space\n\
        WEB_VISION_STORAGE_REGION       Object storage region\n\
        WEB_VISION_STORAGE_BUCKET       Object storage bucket\n\
        WEB_VISION_ARTIFACT_PREFIX      Key prefix for uploaded captures"
)]
struct Args {
    /// Invocation event JSON: a file path, or "-" for stdin (omitted = {})
    #[arg(short, long)]
    event: Option<PathBuf>,

    /// Target page URL (overrides the environment)
    #[arg(long)]
    url: Option<String>,

    /// Component CSS selector (overrides the environment)
    #[arg(long)]
    selector: Option<String>,

    /// Object storage bucket (overrides the environment)
    #[arg(long)]
    bucket: Option<String>,

    /// Pretty-print the response JSON
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut config = Config::from_env();
    if let Some(url) = args.url {
        config.target.url = url;
    }
    if let Some(selector) = args.selector {
        config.target.component_selector = selector;
    }
    if let Some(bucket) = args.bucket {
        config.storage.bucket = bucket;
    }

    let event = read_event(args.event.as_deref())?;

    let launcher = ChromeLauncher::new();
    let store = HttpObjectStore::new(&config.storage.region, &config.storage.bucket);

    let response = web_vision::runner::run(&config, &launcher, &store, event).await;

    let output = if args.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{}", output);

    Ok(())
}

/// Read the invocation event payload: file, stdin, or an empty object
fn read_event(path: Option<&std::path::Path>) -> Result<serde_json::Value, Box<dyn Error>> {
    let raw = match path {
        None => return Ok(serde_json::json!({})),
        Some(p) if p.as_os_str() == "-" => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
        Some(p) => std::fs::read_to_string(p)?,
    };
    Ok(serde_json::from_str(&raw)?)
}
