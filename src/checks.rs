//! Validation battery: fixed, ordered presence/state checks against the
//! component's sub-elements.
//!
//! Checks run strictly sequentially in declared order. Fault isolation is
//! the core contract here: a failing check becomes a FAILURE step and the
//! loop moves on, so one broken sub-element never hides the state of its
//! siblings. The battery always finishes with a synthetic completion step.

use std::time::{Duration, Instant};

use crate::browser::BrowserSession;
use crate::report::StepResult;

/// What a check asserts about its sub-element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    /// Present and visible within the selector timeout
    Visible,
    /// Present, visible, and interactable
    Enabled,
}

/// One named probe against a sub-element of the component
#[derive(Debug, Clone, Copy)]
pub struct Check {
    /// Step name recorded in the report
    pub name: &'static str,
    /// Selector relative to the component root
    pub selector: &'static str,
    /// What the probe asserts
    pub kind: CheckKind,
}

/// The declared battery, in execution order
pub const BATTERY: [Check; 8] = [
    Check {
        name: "Trip type selector",
        selector: ".trip-type-select",
        kind: CheckKind::Visible,
    },
    Check {
        name: "Passenger and class selector",
        selector: ".passenger-class-select",
        kind: CheckKind::Visible,
    },
    Check {
        name: "Origin field",
        selector: "input.origin",
        kind: CheckKind::Visible,
    },
    Check {
        name: "Destination field",
        selector: "input.destination",
        kind: CheckKind::Visible,
    },
    Check {
        name: "Departure date field",
        selector: "input.departure-date",
        kind: CheckKind::Visible,
    },
    Check {
        name: "Return date field",
        selector: "input.return-date",
        kind: CheckKind::Visible,
    },
    Check {
        name: "Search button visibility",
        selector: "button.search-submit",
        kind: CheckKind::Visible,
    },
    Check {
        name: "Search button enabled",
        selector: "button.search-submit",
        kind: CheckKind::Enabled,
    },
];

/// Name of the synthetic completion step appended after every battery
pub const BATTERY_COMPLETE_STEP: &str = "Validation battery complete";

/// Run every check in [`BATTERY`] against sub-elements of `root`.
///
/// Returns one step per check plus the completion step. The completion step
/// is always SUCCESS: it records that the battery ran to the end, not that
/// every check passed.
pub async fn run_battery(
    session: &dyn BrowserSession,
    root: &str,
    timeout: Duration,
) -> Vec<StepResult> {
    let mut steps = Vec::with_capacity(BATTERY.len() + 1);

    for check in &BATTERY {
        let started = Instant::now();
        let outcome = probe(session, root, check, timeout).await;
        let elapsed = Some(started.elapsed().as_millis() as u64);

        steps.push(match outcome {
            Ok(()) => {
                log::debug!("check passed: {}", check.name);
                StepResult::success(check.name, elapsed)
            }
            Err(message) => {
                log::warn!("check failed: {}: {}", check.name, message);
                StepResult::failure(check.name, message, elapsed)
            }
        });
    }

    steps.push(StepResult::success(BATTERY_COMPLETE_STEP, None));
    steps
}

/// Run one check, collapsing any browser error into a message
async fn probe(
    session: &dyn BrowserSession,
    root: &str,
    check: &Check,
    timeout: Duration,
) -> Result<(), String> {
    let selector = format!("{} {}", root, check.selector);

    match check.kind {
        CheckKind::Visible => session
            .wait_for_visible(&selector, timeout)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string()),
        CheckKind::Enabled => {
            session
                .wait_for_visible(&selector, timeout)
                .await
                .map_err(|e| e.to_string())?;
            if session
                .is_enabled(&selector)
                .await
                .map_err(|e| e.to_string())?
            {
                Ok(())
            } else {
                Err(format!("element '{}' is not enabled", selector))
            }
        }
    }
}
