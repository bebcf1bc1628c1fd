//! The run-one-workflow orchestrator.
//!
//! Drives one invocation through the pipeline: scratch preparation →
//! browser launch → navigation → component resolution → capture/upload →
//! validation battery → report assembly, with the session released on every
//! exit path. Stage failures are fatal and short-circuit the remaining
//! stages (the battery still runs after a capture-stage failure, since
//! capture and validation are independent concerns over the same located
//! component); individual check failures stay isolated inside the battery.

use chrono::Utc;
use std::time::{Duration, Instant};

use crate::browser::{BrowserError, BrowserLauncher, BrowserSession, ElementProbe, SessionConfig};
use crate::checks;
use crate::config::Config;
use crate::report::{InvocationResponse, RunReport, StepResult};
use crate::scratch;
use crate::store::{self, ArtifactStore, StoreError, IMAGE_CONTENT_TYPE};

/// Step name for scratch-directory preparation
pub const STEP_ENV_PREP: &str = "Prepare environment";

/// Step name for page navigation
pub const STEP_NAVIGATE: &str = "Navigate to page";

/// Step name for component resolution
pub const STEP_LOCATE: &str = "Locate component";

/// Step name for capture and upload
pub const STEP_CAPTURE: &str = "Capture and upload screenshot";

/// Step name of the terminal record appended on a fatal failure
pub const STEP_FATAL: &str = "Fatal error";

/// A failure that aborts the pipeline (as opposed to an isolated check
/// failure inside the validation battery)
#[derive(Debug)]
pub enum FatalError {
    /// Browser could not be launched
    Launch(BrowserError),
    /// Page navigation failed or timed out
    Navigation(BrowserError),
    /// The component never became visible
    Locate(BrowserError),
    /// Element capture failed
    Capture(BrowserError),
    /// Artifact upload failed
    Upload(StoreError),
}

impl std::fmt::Display for FatalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FatalError::Launch(err) => write!(f, "browser session could not be acquired: {}", err),
            FatalError::Navigation(err) => write!(f, "page navigation failed: {}", err),
            FatalError::Locate(err) => write!(f, "component could not be located: {}", err),
            FatalError::Capture(err) => write!(f, "component capture failed: {}", err),
            FatalError::Upload(err) => write!(f, "artifact upload failed: {}", err),
        }
    }
}

impl std::error::Error for FatalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FatalError::Launch(err)
            | FatalError::Navigation(err)
            | FatalError::Locate(err)
            | FatalError::Capture(err) => Some(err),
            FatalError::Upload(err) => Some(err),
        }
    }
}

/// Execute one complete workflow invocation.
///
/// Always returns a well-formed response: 200 with a "Success" message when
/// every pipeline stage completed, 500 with the fatal error embedded in the
/// message otherwise. The step sequence accounts for every attempted stage
/// and check; the inbound `event` is echoed inside the report.
pub async fn run(
    config: &Config,
    launcher: &dyn BrowserLauncher,
    store: &dyn ArtifactStore,
    event: serde_json::Value,
) -> InvocationResponse {
    let started = Instant::now();
    let mut steps: Vec<StepResult> = Vec::new();
    let mut artifact_url: Option<String> = None;

    // Scratch preparation never aborts the run; warnings ride along in the
    // step details.
    let warnings = scratch::prepare(std::path::Path::new(&config.browser.scratch_dir));
    steps.push(if warnings.is_empty() {
        StepResult::success(STEP_ENV_PREP, None)
    } else {
        StepResult::success_with_details(STEP_ENV_PREP, warnings.join("; "), None)
    });

    let session_config = SessionConfig::from_settings(&config.browser);
    let fatal = match launcher.launch(&session_config).await {
        Err(err) => Some(FatalError::Launch(err)),
        Ok(mut session) => {
            log::info!("browser session acquired ({})", session.source_type());
            let outcome = drive(
                session.as_ref(),
                config,
                store,
                &mut steps,
                &mut artifact_url,
            )
            .await;

            // Release is unconditional; a close failure is logged and never
            // overrides the run's outcome.
            if let Err(err) = session.close().await {
                log::warn!("browser close failed after run: {}", err);
            }

            outcome.err()
        }
    };

    if let Some(err) = &fatal {
        log::error!("workflow aborted: {}", err);
        steps.push(StepResult::failure(STEP_FATAL, err.to_string(), None));
    }

    let (status_code, message) = match &fatal {
        None => (200, "Success".to_string()),
        Some(err) => (500, format!("Workflow failed: {}", err)),
    };

    let report = RunReport {
        message,
        completed_at: Utc::now(),
        artifact_url,
        total_elapsed_ms: started.elapsed().as_millis() as u64,
        steps,
        event,
    };

    InvocationResponse::from_report(status_code, &report)
}

/// Pipeline stages that need a live session
async fn drive(
    session: &dyn BrowserSession,
    config: &Config,
    store: &dyn ArtifactStore,
    steps: &mut Vec<StepResult>,
    artifact_url: &mut Option<String>,
) -> Result<(), FatalError> {
    let nav_timeout = Duration::from_millis(config.target.nav_timeout_ms);
    let selector_timeout = Duration::from_millis(config.target.selector_timeout_ms);

    let started = Instant::now();
    session
        .goto(&config.target.url, nav_timeout)
        .await
        .map_err(FatalError::Navigation)?;
    steps.push(StepResult::success(STEP_NAVIGATE, elapsed_ms(started)));
    log::info!("navigated to {}", config.target.url);

    let started = Instant::now();
    let component = session
        .wait_for_visible(&config.target.component_selector, selector_timeout)
        .await
        .map_err(FatalError::Locate)?;
    steps.push(StepResult::success(STEP_LOCATE, elapsed_ms(started)));
    log::info!("located component {}", config.target.component_selector);

    // Capture failure is fatal to the run status, but validation still gets
    // its chance against the already-located component.
    let capture_failure = match capture_and_store(component.as_ref(), config, store).await {
        Ok((url, elapsed)) => {
            steps.push(StepResult::success_with_details(
                STEP_CAPTURE,
                url.clone(),
                elapsed,
            ));
            *artifact_url = Some(url);
            None
        }
        Err(err) => Some(err),
    };

    steps.extend(
        checks::run_battery(session, &config.target.component_selector, selector_timeout).await,
    );

    match capture_failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Screenshot the component and persist the bytes
async fn capture_and_store(
    element: &dyn ElementProbe,
    config: &Config,
    store_backend: &dyn ArtifactStore,
) -> Result<(String, Option<u64>), FatalError> {
    let started = Instant::now();

    let bytes = element.screenshot().await.map_err(FatalError::Capture)?;
    let key = store::artifact_key(&config.storage.prefix, Utc::now());
    let url = store_backend
        .put(&key, bytes, IMAGE_CONTENT_TYPE)
        .await
        .map_err(FatalError::Upload)?;

    log::info!("uploaded capture to {}", url);
    Ok((url, elapsed_ms(started)))
}

fn elapsed_ms(started: Instant) -> Option<u64> {
    Some(started.elapsed().as_millis() as u64)
}
